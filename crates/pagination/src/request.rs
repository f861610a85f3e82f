//! Pagination request: validated limit, optional cursor, default direction.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use keyset_core::{DomainError, DomainResult};

use crate::cursor::{Cursor, CursorCodec, CursorToken};
use crate::direction::Direction;
use crate::key::KeyCodec;

/// Page size, bounded to `[PageLimit::MIN, PageLimit::MAX]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageLimit(u32);

impl PageLimit {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 100;
    pub const DEFAULT: PageLimit = PageLimit(20);

    pub fn new(limit: u32) -> DomainResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&limit) {
            Ok(Self(limit))
        } else {
            Err(DomainError::validation(format!(
                "limit must be between {} and {} (got {limit})",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Number of records to fetch: one more than the page holds, so the
    /// builder can tell whether more data exists without a count query.
    pub const fn fetch_size(self) -> usize {
        self.as_usize() + 1
    }
}

impl Default for PageLimit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for PageLimit {
    type Error = DomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageLimit> for u32 {
    fn from(value: PageLimit) -> Self {
        value.0
    }
}

/// What to do with a cursor that does not decode.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorPolicy {
    /// Drop it and serve the first page in the default direction.
    #[default]
    Ignore,
    /// Fail the request with a validation error.
    Reject,
}

impl FromStr for CursorPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ignore" => Ok(CursorPolicy::Ignore),
            "reject" => Ok(CursorPolicy::Reject),
            other => Err(DomainError::validation(format!(
                "cursor policy must be one of: ignore, reject (got {other:?})"
            ))),
        }
    }
}

/// Raw query-string parameters (`?limit=20&cursor=...`) before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl PageParams {
    pub fn into_request(self) -> DomainResult<PaginationRequest> {
        PaginationRequest::new(self.limit, self.cursor)
    }
}

/// Options a page was (or will be) fetched with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationRequest {
    limit: PageLimit,
    cursor: Option<CursorToken>,
    default_direction: Direction,
}

impl PaginationRequest {
    /// Validate raw parameters. A missing limit means [`PageLimit::DEFAULT`];
    /// an empty cursor string means no cursor.
    pub fn new(limit: Option<u32>, cursor: Option<String>) -> DomainResult<Self> {
        let limit = limit.map(PageLimit::new).transpose()?.unwrap_or_default();
        let cursor = cursor
            .filter(|c| !c.trim().is_empty())
            .map(CursorToken::new);

        Ok(Self {
            limit,
            cursor,
            default_direction: Direction::Forward,
        })
    }

    /// First page with the given size.
    pub fn first(limit: PageLimit) -> Self {
        Self {
            limit,
            cursor: None,
            default_direction: Direction::Forward,
        }
    }

    pub fn with_cursor(mut self, cursor: CursorToken) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn with_default_direction(mut self, direction: Direction) -> Self {
        self.default_direction = direction;
        self
    }

    pub fn limit(&self) -> PageLimit {
        self.limit
    }

    pub fn cursor(&self) -> Option<&CursorToken> {
        self.cursor.as_ref()
    }

    pub fn has_cursor(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn default_direction(&self) -> Direction {
        self.default_direction
    }

    /// Direction of the decoded cursor, or the default when there is no
    /// usable cursor.
    pub fn effective_direction<C: KeyCodec>(&self, codec: &CursorCodec<C>) -> Direction {
        self.cursor
            .as_ref()
            .and_then(|token| codec.decode_token(token))
            .map(|cursor| cursor.direction())
            .unwrap_or(self.default_direction)
    }

    /// Apply `policy` to a cursor that does not decode.
    ///
    /// After `Ignore`, the request behaves exactly like one that never had a
    /// cursor, including for the builder's "cursor was supplied" flags.
    pub fn sanitize<C: KeyCodec>(
        self,
        codec: &CursorCodec<C>,
        policy: CursorPolicy,
    ) -> DomainResult<Self> {
        self.resolve(codec, policy).map(|(request, _)| request)
    }

    /// Resolve what the caller has to fetch for this request.
    pub fn keyset_query<C: KeyCodec>(&self, codec: &CursorCodec<C>) -> KeysetQuery<C::Key> {
        let decoded = self.cursor.as_ref().and_then(|token| codec.decode_token(token));
        self.query_from(decoded)
    }

    /// [`sanitize`](Self::sanitize) and [`keyset_query`](Self::keyset_query)
    /// in one step, decoding the cursor only once.
    pub fn resolve<C: KeyCodec>(
        mut self,
        codec: &CursorCodec<C>,
        policy: CursorPolicy,
    ) -> DomainResult<(Self, KeysetQuery<C::Key>)> {
        let decoded = match self.cursor.as_ref().map(|token| codec.try_decode(token.as_str())) {
            None => None,
            Some(Ok(cursor)) => Some(cursor),
            Some(Err(err)) => match policy {
                CursorPolicy::Ignore => {
                    tracing::debug!(error = %err, "ignoring invalid cursor; serving first page");
                    self.cursor = None;
                    None
                }
                CursorPolicy::Reject => {
                    tracing::debug!(error = %err, "rejecting invalid cursor");
                    return Err(err.into());
                }
            },
        };

        let query = self.query_from(decoded);
        Ok((self, query))
    }

    fn query_from<K>(&self, decoded: Option<Cursor<K>>) -> KeysetQuery<K> {
        let (direction, anchor) = match decoded {
            Some(cursor) => (cursor.direction(), Some(cursor.into_value())),
            None => (self.default_direction, None),
        };

        KeysetQuery {
            direction,
            anchor,
            fetch_limit: self.limit.fetch_size(),
        }
    }
}

impl Default for PaginationRequest {
    fn default() -> Self {
        Self::first(PageLimit::DEFAULT)
    }
}

/// Fetch instruction for a storage adapter.
///
/// Forward: keys strictly greater than `anchor`, ascending.
/// Backward: keys strictly less than `anchor`, descending.
/// No anchor: start from the respective end of the collection.
/// At most `fetch_limit` records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysetQuery<K> {
    pub direction: Direction,
    pub anchor: Option<K>,
    pub fetch_limit: usize,
}

impl<K: Ord> KeysetQuery<K> {
    /// Whether `key` lies past the anchor in the query's direction.
    pub fn admits(&self, key: &K) -> bool {
        match (&self.anchor, self.direction) {
            (None, _) => true,
            (Some(anchor), Direction::Forward) => key > anchor,
            (Some(anchor), Direction::Backward) => key < anchor,
        }
    }
}
