//! Configuration loading.
//!
//! All settings come from environment variables and all are optional:
//!
//! | variable | values | default |
//! |---|---|---|
//! | `KEYSET_DEFAULT_LIMIT` | `1..=100` | `20` |
//! | `KEYSET_DEFAULT_DIRECTION` | `forward`, `backward` | `forward` |
//! | `KEYSET_INVALID_CURSOR` | `ignore`, `reject` | `ignore` |
//! | `KEYSET_LOG_FORMAT` | `json`, `pretty` | `json` |

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use keyset_core::DomainResult;
use keyset_observability::{LogFormat, LogSettings};
use keyset_pagination::{CursorPolicy, Direction, PageLimit, PaginationRequest};

pub const DEFAULT_LIMIT_VAR: &str = "KEYSET_DEFAULT_LIMIT";
pub const DEFAULT_DIRECTION_VAR: &str = "KEYSET_DEFAULT_DIRECTION";
pub const INVALID_CURSOR_VAR: &str = "KEYSET_INVALID_CURSOR";
pub const LOG_FORMAT_VAR: &str = "KEYSET_LOG_FORMAT";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Pagination defaults applied to incoming requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: PageLimit,
    pub default_direction: Direction,
    pub invalid_cursor: CursorPolicy,
    pub log_format: LogFormat,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: PageLimit::DEFAULT,
            default_direction: Direction::Forward,
            invalid_cursor: CursorPolicy::Ignore,
            log_format: LogFormat::Json,
        }
    }
}

impl PaginationConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (tests, layered sources).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let default_limit = match lookup(DEFAULT_LIMIT_VAR) {
            Some(raw) => {
                let n: u32 = parse(DEFAULT_LIMIT_VAR, &raw)?;
                PageLimit::new(n).map_err(|e| invalid(DEFAULT_LIMIT_VAR, &raw, e))?
            }
            None => defaults.default_limit,
        };

        Ok(Self {
            default_limit,
            default_direction: optional(&lookup, DEFAULT_DIRECTION_VAR)?
                .unwrap_or(defaults.default_direction),
            invalid_cursor: optional(&lookup, INVALID_CURSOR_VAR)?
                .unwrap_or(defaults.invalid_cursor),
            log_format: optional(&lookup, LOG_FORMAT_VAR)?.unwrap_or(defaults.log_format),
        })
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            format: self.log_format,
            ..LogSettings::default()
        }
    }

    /// Build a request from raw parameters, filling in the configured
    /// defaults. An explicit `limit` still has to be within bounds.
    pub fn request(&self, limit: Option<u32>, cursor: Option<String>) -> DomainResult<PaginationRequest> {
        let limit = limit.unwrap_or(self.default_limit.get());
        Ok(PaginationRequest::new(Some(limit), cursor)?
            .with_default_direction(self.default_direction))
    }
}

fn optional<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    lookup(key).map(|raw| parse(key, &raw)).transpose()
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    raw.trim().parse().map_err(|e| invalid(key, raw, e))
}

fn invalid(key: &'static str, raw: &str, reason: impl core::fmt::Display) -> ConfigError {
    tracing::warn!(key, value = raw, "rejecting configuration value");
    ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: reason.to_string(),
    }
}
