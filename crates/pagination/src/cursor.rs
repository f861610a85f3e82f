//! Cursor values and the opaque token codec.
//!
//! Wire format of a token:
//!
//! ```text
//! base64url_nopad( {"d":"forward"|"backward","v":"<encoded key>"} )
//! ```
//!
//! Tokens are obfuscated, not signed: a client can craft one. Decoding never
//! trusts the payload beyond "it names a direction and a parseable key".

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use keyset_core::{DomainError, ValueObject};

use crate::direction::Direction;
use crate::key::KeyCodec;

/// URL-safe alphabet, no padding on output, padding tolerated on input.
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A pagination position: the key to continue from and the direction to walk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor<K> {
    value: K,
    direction: Direction,
}

impl<K> Cursor<K> {
    pub fn new(value: K, direction: Direction) -> Self {
        Self { value, direction }
    }

    pub fn value(&self) -> &K {
        &self.value
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn into_value(self) -> K {
        self.value
    }
}

impl<K: Clone + PartialEq + core::fmt::Debug> ValueObject for Cursor<K> {}

/// Opaque, URL-safe string form of a [`Cursor`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CursorToken(String);

impl CursorToken {
    /// Wrap a token received from a client. No validation happens here.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl core::fmt::Display for CursorToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CursorToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for CursorToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CursorToken {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Why a token failed to decode.
///
/// Only surfaced by [`CursorCodec::try_decode`]; [`CursorCodec::decode`] folds
/// every variant into `None`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("cursor is not valid base64url: {0}")]
    Encoding(String),

    #[error("cursor payload is malformed: {0}")]
    Payload(String),

    #[error("cursor key could not be decoded: {0}")]
    Key(String),
}

impl CursorError {
    pub fn key(msg: impl Into<String>) -> Self {
        Self::Key(msg.into())
    }
}

impl From<CursorError> for DomainError {
    fn from(value: CursorError) -> Self {
        DomainError::validation(format!("invalid cursor: {value}"))
    }
}

/// Decoded token record. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct CursorPayload {
    v: String,
    d: Direction,
}

/// Reversible mapping between [`Cursor`]s and [`CursorToken`]s.
///
/// Stateless apart from the key strategy; `encode` is a pure function of its
/// inputs.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CursorCodec<C> {
    keys: C,
}

impl<C: KeyCodec> CursorCodec<C> {
    pub const fn new(keys: C) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &C {
        &self.keys
    }

    pub fn encode(&self, value: &C::Key, direction: Direction) -> CursorToken {
        let payload = serde_json::json!({
            "d": direction.as_str(),
            "v": self.keys.encode_key(value),
        });
        CursorToken(TOKEN_ENGINE.encode(payload.to_string()))
    }

    pub fn encode_cursor(&self, cursor: &Cursor<C::Key>) -> CursorToken {
        self.encode(cursor.value(), cursor.direction())
    }

    /// Decode a token, reporting which step rejected it.
    pub fn try_decode(&self, token: &str) -> Result<Cursor<C::Key>, CursorError> {
        let bytes = TOKEN_ENGINE
            .decode(token)
            .map_err(|e| CursorError::Encoding(e.to_string()))?;

        let record: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| CursorError::Payload(e.to_string()))?;
        if !record.is_object() {
            return Err(CursorError::Payload("expected a JSON object".to_string()));
        }
        let payload: CursorPayload =
            serde_json::from_value(record).map_err(|e| CursorError::Payload(e.to_string()))?;

        let value = self.keys.decode_key(&payload.v)?;
        Ok(Cursor::new(value, payload.d))
    }

    /// Decode a token; any malformed input yields `None`.
    pub fn decode(&self, token: &str) -> Option<Cursor<C::Key>> {
        match self.try_decode(token) {
            Ok(cursor) => Some(cursor),
            Err(err) => {
                tracing::debug!(error = %err, "discarding invalid cursor");
                None
            }
        }
    }

    pub fn decode_token(&self, token: &CursorToken) -> Option<Cursor<C::Key>> {
        self.decode(token.as_str())
    }
}
