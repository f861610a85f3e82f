//! Walks a seeded in-memory catalog page by page, forward to the end and then
//! back to the start, logging each page as it would be returned to a client.

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use keyset_core::{RecordId, TenantId};
use keyset_infra::{InMemoryKeysetStore, PaginationConfig, paginate};
use keyset_pagination::{CursorCodec, CursorToken, Page, PageBuilder, TimestampKey};

const PRODUCT_COUNT: i64 = 53;

#[derive(Debug, Clone, Serialize)]
struct Product {
    id: RecordId,
    sku: String,
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ProductSummary {
    id: String,
    sku: String,
    name: String,
}

fn seed(store: &InMemoryKeysetStore<DateTime<Utc>, Product>, tenant_id: TenantId) -> anyhow::Result<()> {
    let start = Utc::now() - Duration::days(30);
    for n in 1..=PRODUCT_COUNT {
        store.upsert(
            tenant_id,
            Product {
                id: RecordId::new(),
                sku: format!("SKU-{n:04}"),
                name: format!("Product {n}"),
                created_at: start + Duration::hours(n),
            },
        )?;
    }
    Ok(())
}

fn log_page(label: &str, number: usize, page: Page<Product>) -> anyhow::Result<Page<ProductSummary>> {
    let page = page.map(|p| ProductSummary {
        id: p.id.to_string(),
        sku: p.sku,
        name: p.name,
    });
    let body = serde_json::to_string(&page).context("serializing page")?;
    tracing::info!(label, number, count = page.count(), body = %body, "page");
    Ok(page)
}

fn main() -> anyhow::Result<()> {
    let config = PaginationConfig::from_env().context("loading pagination config")?;
    keyset_observability::init_with(&config.log_settings());

    let tenant_id = TenantId::new();
    let store = InMemoryKeysetStore::new(|p: &Product| p.created_at);
    seed(&store, tenant_id).context("seeding catalog")?;
    let products = store.len(tenant_id)?;
    tracing::info!(%tenant_id, products, "catalog seeded");

    let builder = PageBuilder::new(CursorCodec::new(TimestampKey), |p: &Product| p.created_at);

    let mut cursor: Option<CursorToken> = None;
    let mut number = 0;
    let last = loop {
        number += 1;
        let request = config.request(None, cursor.map(CursorToken::into_string))?;
        let page = paginate(&store, &builder, tenant_id, request, config.invalid_cursor)?;
        let page = log_page("forward", number, page)?;
        match page.next_cursor() {
            Some(next) => cursor = Some(next.clone()),
            None => break page,
        }
    };

    let mut cursor = last.prev_cursor().cloned();
    let mut step = 0;
    while let Some(token) = cursor {
        step += 1;
        let request = config.request(None, Some(token.into_string()))?;
        let page = paginate(&store, &builder, tenant_id, request, config.invalid_cursor)?;
        let page = log_page("backward", step, page)?;
        cursor = page.prev_cursor().cloned();
    }

    tracing::info!("walk complete");
    Ok(())
}
