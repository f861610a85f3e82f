//! `keyset-core` — shared domain primitives.
//!
//! Pure types only: error model, identifiers and the value-object marker.
//! Nothing in here performs I/O.

pub mod error;
pub mod id;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::{RecordId, TenantId};
pub use value_object::ValueObject;
