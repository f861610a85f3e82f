//! `keyset-pagination` — opaque-cursor, bidirectional keyset pagination.
//!
//! Two pieces do the work:
//! - [`CursorCodec`] turns a `(key, direction)` pair into a URL-safe token and back.
//! - [`PageBuilder`] turns an over-fetched (`limit + 1`) batch into a [`Page`]
//!   with navigation flags and cursors.
//!
//! Fetching the batch is left to the caller: resolve a [`KeysetQuery`] from the
//! [`PaginationRequest`], fetch up to `fetch_limit` records in the query's
//! direction, then hand the batch to the builder.
//!
//! Everything here is pure and synchronous.

pub mod cursor;
pub mod direction;
pub mod key;
pub mod page;
pub mod request;

pub use cursor::{Cursor, CursorCodec, CursorError, CursorToken};
pub use direction::Direction;
pub use key::{IntegerKey, KeyCodec, RecordIdKey, StringKey, TimestampKey, UuidKey};
pub use page::{Page, PageBuilder, PageInfo};
pub use request::{CursorPolicy, KeysetQuery, PageLimit, PageParams, PaginationRequest};
