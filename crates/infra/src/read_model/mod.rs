//! Storage adapters that serve keyset batches.
//!
//! Each storage engine implements [`KeysetRepository`] on its own; the page
//! builder only ever sees the `Vec` a repository returns.

use std::sync::Arc;

use thiserror::Error;

use keyset_core::TenantId;
use keyset_pagination::KeysetQuery;

pub mod in_memory;

pub use in_memory::InMemoryKeysetStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The store cannot serve reads right now (poisoned lock, lost connection).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend reported an error while executing the fetch.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Narrow read interface needed for keyset pagination.
///
/// `fetch` returns at most `query.fetch_limit` records of `tenant_id` whose key
/// lies past `query.anchor`, ordered ascending for forward queries and
/// descending for backward ones. The result must come from one consistent
/// snapshot.
pub trait KeysetRepository<T, K>: Send + Sync {
    fn fetch(&self, tenant_id: TenantId, query: &KeysetQuery<K>) -> Result<Vec<T>, RepositoryError>;
}

impl<T, K, S> KeysetRepository<T, K> for Arc<S>
where
    S: KeysetRepository<T, K> + ?Sized,
{
    fn fetch(&self, tenant_id: TenantId, query: &KeysetQuery<K>) -> Result<Vec<T>, RepositoryError> {
        (**self).fetch(tenant_id, query)
    }
}
