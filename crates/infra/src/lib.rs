//! Infrastructure layer: configuration, storage adapters and the
//! fetch-then-build pagination flow.

pub mod config;
pub mod query;
pub mod read_model;


pub use config::{ConfigError, PaginationConfig};
pub use query::{PaginateError, paginate};
pub use read_model::{InMemoryKeysetStore, KeysetRepository, RepositoryError};
