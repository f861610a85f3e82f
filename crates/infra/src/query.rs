//! Fetch-then-build pagination flow.

use thiserror::Error;

use keyset_core::{DomainError, TenantId};
use keyset_pagination::{CursorPolicy, KeyCodec, Page, PageBuilder, PaginationRequest};

use crate::read_model::{KeysetRepository, RepositoryError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaginateError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl PaginateError {
    /// Whether the failure should be reported back as a bad request.
    pub fn is_client_error(&self) -> bool {
        match self {
            PaginateError::Domain(e) => e.is_client_error(),
            PaginateError::Repository(_) => false,
        }
    }
}

/// Serve one page of `tenant_id`'s records from `repo`.
///
/// The request's cursor is checked against `policy` first, then the resolved
/// keyset query (`limit + 1` records past the cursor) goes to the repository
/// and the batch is handed to `builder`.
pub fn paginate<T, C, F, R>(
    repo: &R,
    builder: &PageBuilder<T, C, F>,
    tenant_id: TenantId,
    request: PaginationRequest,
    policy: CursorPolicy,
) -> Result<Page<T>, PaginateError>
where
    C: KeyCodec,
    F: Fn(&T) -> C::Key,
    R: KeysetRepository<T, C::Key> + ?Sized,
{
    let span = tracing::info_span!(
        "paginate",
        tenant_id = %tenant_id,
        limit = request.limit().get(),
        direction = tracing::field::Empty
    );
    let _guard = span.enter();

    let (request, query) = request.resolve(builder.codec(), policy)?;
    span.record("direction", tracing::field::display(query.direction));

    let batch = repo.fetch(tenant_id, &query).inspect_err(|e| {
        tracing::warn!(error = %e, "keyset fetch failed");
    })?;

    if batch.len() > query.fetch_limit {
        tracing::error!(
            returned = batch.len(),
            fetch_limit = query.fetch_limit,
            "repository returned more records than requested"
        );
        return Err(DomainError::invariant(format!(
            "repository returned {} records for a fetch limit of {}",
            batch.len(),
            query.fetch_limit
        ))
        .into());
    }

    let page = builder.build_for(batch, &request, &query);
    tracing::debug!(
        count = page.count(),
        has_next_page = page.has_next_page(),
        has_prev_page = page.has_prev_page(),
        "page served"
    );

    Ok(page)
}
