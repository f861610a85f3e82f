//! Page assembly from an over-fetched batch.

use core::marker::PhantomData;
use serde::Serialize;

use crate::cursor::{CursorCodec, CursorToken};
use crate::direction::Direction;
use crate::key::KeyCodec;
use crate::request::{KeysetQuery, PaginationRequest};

/// Navigation metadata of a page.
///
/// Serialized as `{ nextCursor, prevCursor, hasNextPage, hasPrevPage, count }`
/// with absent cursors as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub next_cursor: Option<CursorToken>,
    pub prev_cursor: Option<CursorToken>,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub count: usize,
}

impl PageInfo {
    fn empty() -> Self {
        Self {
            next_cursor: None,
            prev_cursor: None,
            has_next_page: false,
            has_prev_page: false,
            count: 0,
        }
    }
}

/// One window of an ordered collection, always in ascending key order.
///
/// Invariant: `pagination().count == data().len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    data: Vec<T>,
    pagination: PageInfo,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            pagination: PageInfo::empty(),
        }
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn pagination(&self) -> &PageInfo {
        &self.pagination
    }

    pub fn next_cursor(&self) -> Option<&CursorToken> {
        self.pagination.next_cursor.as_ref()
    }

    pub fn prev_cursor(&self) -> Option<&CursorToken> {
        self.pagination.prev_cursor.as_ref()
    }

    pub fn has_next_page(&self) -> bool {
        self.pagination.has_next_page
    }

    pub fn has_prev_page(&self) -> bool {
        self.pagination.has_prev_page
    }

    pub fn count(&self) -> usize {
        self.pagination.count
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_parts(self) -> (Vec<T>, PageInfo) {
        (self.data, self.pagination)
    }

    /// Convert every record (e.g. into a response DTO), keeping the
    /// navigation metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Builds [`Page`]s for records of type `T`.
///
/// `key_of` extracts the pagination key of a record; it is bound once per
/// entity type and must agree with the order the batch was fetched in.
pub struct PageBuilder<T, C, F> {
    codec: CursorCodec<C>,
    key_of: F,
    _record: PhantomData<fn(&T)>,
}

impl<T, C, F> PageBuilder<T, C, F>
where
    C: KeyCodec,
    F: Fn(&T) -> C::Key,
{
    pub fn new(codec: CursorCodec<C>, key_of: F) -> Self {
        Self {
            codec,
            key_of,
            _record: PhantomData,
        }
    }

    pub fn codec(&self) -> &CursorCodec<C> {
        &self.codec
    }

    pub fn key_of(&self, record: &T) -> C::Key {
        (self.key_of)(record)
    }

    /// Turn a batch fetched for `request` into a page.
    ///
    /// `entities` holds up to `limit + 1` records in the order of the
    /// request's effective direction (descending for backward requests).
    /// The extra record only signals that more data exists and is dropped.
    ///
    /// The flag facing away from the over-fetch (`has_prev_page` going
    /// forward, `has_next_page` going backward) means "a cursor was supplied";
    /// it does not query storage, so it can be `true` next to an empty page.
    pub fn build(&self, entities: Vec<T>, request: &PaginationRequest) -> Page<T> {
        self.assemble(entities, request, request.effective_direction(&self.codec))
    }

    /// Like [`build`](Self::build), for a batch fetched with `query`
    /// (from [`PaginationRequest::resolve`]); the cursor is not decoded again.
    pub fn build_for(
        &self,
        entities: Vec<T>,
        request: &PaginationRequest,
        query: &KeysetQuery<C::Key>,
    ) -> Page<T> {
        self.assemble(entities, request, query.direction)
    }

    fn assemble(&self, entities: Vec<T>, request: &PaginationRequest, direction: Direction) -> Page<T> {
        let limit = request.limit().as_usize();

        let mut data = entities;
        let has_more = data.len() > limit;
        data.truncate(limit);
        if direction.is_backward() {
            data.reverse();
        }

        if data.is_empty() {
            tracing::trace!(%direction, "built empty page");
            return Page::empty();
        }

        let cursor_supplied = request.has_cursor();
        let (has_next_page, has_prev_page) = match direction {
            Direction::Forward => (has_more, cursor_supplied),
            Direction::Backward => (cursor_supplied, has_more),
        };

        let next_cursor = if has_next_page {
            data.last()
                .map(|last| self.codec.encode(&self.key_of(last), Direction::Forward))
        } else {
            None
        };
        let prev_cursor = if has_prev_page {
            data.first()
                .map(|first| self.codec.encode(&self.key_of(first), Direction::Backward))
        } else {
            None
        };

        let count = data.len();
        tracing::trace!(%direction, count, has_next_page, has_prev_page, "built page");

        Page {
            data,
            pagination: PageInfo {
                next_cursor,
                prev_cursor,
                has_next_page,
                has_prev_page,
                count,
            },
        }
    }
}

impl<T, C: core::fmt::Debug, F> core::fmt::Debug for PageBuilder<T, C, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PageBuilder")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Cursor;
    use crate::key::{IntegerKey, StringKey};
    use crate::request::{CursorPolicy, PageLimit};
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    struct Row {
        id: String,
    }

    fn rows(range: core::ops::RangeInclusive<u32>) -> Vec<Row> {
        range.map(|i| Row { id: format!("id-{i}") }).collect()
    }

    fn ids(page: &Page<Row>) -> Vec<String> {
        page.data().iter().map(|r| r.id.clone()).collect()
    }

    fn builder() -> PageBuilder<Row, StringKey, impl Fn(&Row) -> String> {
        PageBuilder::new(CursorCodec::new(StringKey), |row: &Row| row.id.clone())
    }

    fn request(limit: u32) -> PaginationRequest {
        PaginationRequest::first(PageLimit::new(limit).unwrap())
    }

    fn decode(token: Option<&CursorToken>) -> Option<Cursor<String>> {
        token.and_then(|t| CursorCodec::new(StringKey).decode_token(t))
    }

    #[test]
    fn first_page_with_more_data() {
        let page = builder().build(rows(1..=21), &request(20));

        assert_eq!(ids(&page), ids_of(1..=20));
        assert!(page.has_next_page());
        assert!(!page.has_prev_page());
        assert_eq!(page.count(), 20);
        assert_eq!(
            decode(page.next_cursor()),
            Some(Cursor::new("id-20".to_string(), Direction::Forward))
        );
        assert!(page.prev_cursor().is_none());
    }

    #[test]
    fn short_first_page() {
        let page = builder().build(rows(1..=15), &request(20));

        assert_eq!(page.count(), 15);
        assert_eq!(page.data().len(), 15);
        assert!(!page.has_next_page());
        assert!(page.next_cursor().is_none());
        assert!(!page.has_prev_page());
    }

    #[test]
    fn forward_page_with_cursor_has_both_directions() {
        let b = builder();
        let token = b.codec().encode(&"id-0".to_string(), Direction::Forward);
        let page = b.build(rows(1..=21), &request(20).with_cursor(token));

        assert!(page.has_next_page());
        assert!(page.has_prev_page());
        assert_eq!(
            decode(page.next_cursor()),
            Some(Cursor::new("id-20".to_string(), Direction::Forward))
        );
        assert_eq!(
            decode(page.prev_cursor()),
            Some(Cursor::new("id-1".to_string(), Direction::Backward))
        );
    }

    #[test]
    fn empty_batch_yields_empty_page() {
        let page = builder().build(Vec::new(), &request(20));
        assert_eq!(page, Page::empty());
        assert_eq!(page.count(), 0);
        assert!(!page.has_next_page());
        assert!(!page.has_prev_page());
    }

    #[test]
    fn empty_batch_with_cursor_still_has_no_navigation() {
        let b = builder();
        let token = b.codec().encode(&"id-99".to_string(), Direction::Forward);
        let page = b.build(Vec::new(), &request(20).with_cursor(token));
        assert_eq!(page, Page::empty());
    }

    #[test]
    fn backward_page_is_presented_ascending() {
        let b = builder();
        let token = b.codec().encode(&"id-30".to_string(), Direction::Backward);
        // Fetched descending: id-29 .. id-9.
        let mut batch = rows(9..=29);
        batch.reverse();

        let page = b.build(batch, &request(20).with_cursor(token));

        assert_eq!(ids(&page), ids_of(10..=29));
        assert!(page.has_next_page());
        assert!(page.has_prev_page());
        assert_eq!(
            decode(page.next_cursor()),
            Some(Cursor::new("id-29".to_string(), Direction::Forward))
        );
        assert_eq!(
            decode(page.prev_cursor()),
            Some(Cursor::new("id-10".to_string(), Direction::Backward))
        );
    }

    #[test]
    fn build_for_resolved_query_matches_build() {
        let b = builder();
        let token = b.codec().encode(&"id-30".to_string(), Direction::Backward);
        let (req, query) = request(20)
            .with_cursor(token)
            .resolve(b.codec(), CursorPolicy::Reject)
            .unwrap();
        let mut batch = rows(9..=29);
        batch.reverse();

        assert_eq!(query.direction, Direction::Backward);
        assert_eq!(b.build_for(batch.clone(), &req, &query), b.build(batch, &req));
    }

    #[test]
    fn backward_page_reaching_the_start() {
        let b = builder();
        let token = b.codec().encode(&"id-6".to_string(), Direction::Backward);
        let mut batch = rows(1..=5);
        batch.reverse();

        let page = b.build(batch, &request(20).with_cursor(token));

        assert_eq!(ids(&page), ids_of(1..=5));
        assert!(page.has_next_page());
        assert!(!page.has_prev_page());
        assert!(page.prev_cursor().is_none());
        assert!(page.next_cursor().is_some());
    }

    #[test]
    fn default_backward_direction_without_cursor() {
        let mut batch = rows(1..=4);
        batch.reverse();
        let req = request(3).with_default_direction(Direction::Backward);

        let page = builder().build(batch, &req);

        // Newest three, oldest first.
        assert_eq!(ids(&page), ids_of(2..=4));
        assert!(!page.has_next_page());
        assert!(page.has_prev_page());
        assert_eq!(
            decode(page.prev_cursor()),
            Some(Cursor::new("id-2".to_string(), Direction::Backward))
        );
    }

    #[test]
    fn invalid_cursor_falls_back_to_default_direction_but_counts_as_supplied() {
        let req = request(20).with_cursor(CursorToken::new("not-valid-base64!!"));
        let page = builder().build(rows(1..=3), &req);

        assert_eq!(ids(&page), ids_of(1..=3));
        assert!(!page.has_next_page());
        assert!(page.has_prev_page());
    }

    #[test]
    fn serializes_to_response_shape() {
        let page = builder().build(rows(1..=2), &request(1));
        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(json["data"], serde_json::json!([{ "id": "id-1" }]));
        let info = &json["pagination"];
        assert!(info["nextCursor"].is_string());
        assert!(info["prevCursor"].is_null());
        assert_eq!(info["hasNextPage"], true);
        assert_eq!(info["hasPrevPage"], false);
        assert_eq!(info["count"], 1);
    }

    #[test]
    fn map_keeps_navigation() {
        let page = builder().build(rows(1..=21), &request(20));
        let next = page.next_cursor().cloned();
        let mapped = page.map(|row| row.id.len());
        assert_eq!(mapped.count(), 20);
        assert_eq!(mapped.next_cursor().cloned(), next);
    }

    fn ids_of(range: core::ops::RangeInclusive<u32>) -> Vec<String> {
        range.map(|i| format!("id-{i}")).collect()
    }

    proptest! {
        #[test]
        fn windowing_respects_limit(len in 0usize..=120, limit in PageLimit::MIN..=PageLimit::MAX, backward in any::<bool>()) {
            let direction = if backward { Direction::Backward } else { Direction::Forward };
            let builder = PageBuilder::new(CursorCodec::new(IntegerKey), |n: &i64| *n);
            let batch: Vec<i64> = if backward {
                (0..len as i64).rev().collect()
            } else {
                (0..len as i64).collect()
            };
            let req = PaginationRequest::first(PageLimit::new(limit).unwrap())
                .with_default_direction(direction);

            let page = builder.build(batch, &req);
            let limit = limit as usize;
            let has_more = len > limit;

            prop_assert_eq!(page.count(), page.data().len());
            prop_assert_eq!(page.count(), len.min(limit));
            prop_assert!(page.data().windows(2).all(|w| w[0] < w[1]));
            match direction {
                Direction::Forward => {
                    prop_assert_eq!(page.has_next_page(), has_more);
                    prop_assert!(!page.has_prev_page());
                }
                Direction::Backward => {
                    prop_assert_eq!(page.has_prev_page(), has_more);
                    prop_assert!(!page.has_next_page());
                }
            }
            prop_assert_eq!(page.next_cursor().is_some(), page.has_next_page());
            prop_assert_eq!(page.prev_cursor().is_some(), page.has_prev_page());
        }

        #[test]
        fn backward_output_reverses_input(len in 1usize..=50) {
            let builder = PageBuilder::new(CursorCodec::new(IntegerKey), |n: &i64| *n);
            let batch: Vec<i64> = (0..len as i64).rev().collect();
            let req = PaginationRequest::first(PageLimit::new(PageLimit::MAX).unwrap())
                .with_default_direction(Direction::Backward);

            let page = builder.build(batch.clone(), &req);
            let mut expected = batch;
            expected.reverse();
            prop_assert_eq!(page.data(), expected.as_slice());
        }
    }
}
