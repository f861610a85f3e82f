//! Key serialization strategies.
//!
//! A [`KeyCodec`] decides how the comparison key of a record is written into a
//! cursor token. Pick the one matching the field the collection is ordered by,
//! or implement the trait for a custom key type.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use keyset_core::RecordId;

use crate::cursor::CursorError;

/// Strategy for turning a pagination key into text and back.
///
/// Implementations must round-trip: `decode_key(&encode_key(k)) == Ok(k)`.
pub trait KeyCodec {
    /// The comparison key. Ordering must match the order of the underlying collection.
    type Key: Clone + Ord + core::fmt::Debug;

    fn encode_key(&self, key: &Self::Key) -> String;

    fn decode_key(&self, raw: &str) -> Result<Self::Key, CursorError>;
}

impl<C: KeyCodec + ?Sized> KeyCodec for &C {
    type Key = C::Key;

    fn encode_key(&self, key: &Self::Key) -> String {
        (**self).encode_key(key)
    }

    fn decode_key(&self, raw: &str) -> Result<Self::Key, CursorError> {
        (**self).decode_key(raw)
    }
}

/// String identifiers, stored as-is.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct StringKey;

impl KeyCodec for StringKey {
    type Key = String;

    fn encode_key(&self, key: &String) -> String {
        key.clone()
    }

    fn decode_key(&self, raw: &str) -> Result<String, CursorError> {
        Ok(raw.to_owned())
    }
}

/// UTC timestamps, stored as ISO-8601 / RFC 3339 text (`2024-05-01T12:00:00.250Z`).
///
/// Sub-second digits are written only as far as needed, so the value survives
/// the round trip at full (nanosecond) precision. Any offset is accepted on
/// decode and normalized to UTC.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TimestampKey;

impl KeyCodec for TimestampKey {
    type Key = DateTime<Utc>;

    fn encode_key(&self, key: &DateTime<Utc>) -> String {
        key.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    // Years outside 0000..=9999 carry a sign (`+10000-01-01T00:00:00Z`),
    // which strict RFC 3339 parsing refuses.
    fn decode_key(&self, raw: &str) -> Result<DateTime<Utc>, CursorError> {
        raw.parse::<DateTime<Utc>>()
            .map_err(|e| CursorError::key(format!("timestamp {raw:?}: {e}")))
    }
}

/// UUID keys in hyphenated form.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct UuidKey;

impl KeyCodec for UuidKey {
    type Key = Uuid;

    fn encode_key(&self, key: &Uuid) -> String {
        key.hyphenated().to_string()
    }

    fn decode_key(&self, raw: &str) -> Result<Uuid, CursorError> {
        Uuid::parse_str(raw).map_err(|e| CursorError::key(format!("uuid {raw:?}: {e}")))
    }
}

/// [`RecordId`] keys. UUIDv7 ids sort by creation time, so this gives
/// "oldest first" pages without a separate timestamp column.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RecordIdKey;

impl KeyCodec for RecordIdKey {
    type Key = RecordId;

    fn encode_key(&self, key: &RecordId) -> String {
        UuidKey.encode_key(key.as_uuid())
    }

    fn decode_key(&self, raw: &str) -> Result<RecordId, CursorError> {
        UuidKey.decode_key(raw).map(RecordId::from_uuid)
    }
}

/// Signed integer keys (sequence numbers, auto-increment ids).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct IntegerKey;

impl KeyCodec for IntegerKey {
    type Key = i64;

    fn encode_key(&self, key: &i64) -> String {
        key.to_string()
    }

    fn decode_key(&self, raw: &str) -> Result<i64, CursorError> {
        raw.parse()
            .map_err(|e| CursorError::key(format!("integer {raw:?}: {e}")))
    }
}
