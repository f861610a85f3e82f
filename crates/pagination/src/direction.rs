//! Traversal direction.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use keyset_core::DomainError;

/// Direction a page is walked in.
///
/// `Forward` walks keys in ascending order, `Backward` in descending order.
/// Pages are always presented in ascending order regardless.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    /// Wire literal used inside cursor tokens.
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }

    pub const fn is_backward(self) -> bool {
        matches!(self, Direction::Backward)
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forward" => Ok(Direction::Forward),
            "backward" => Ok(Direction::Backward),
            other => Err(DomainError::validation(format!(
                "direction must be one of: forward, backward (got {other:?})"
            ))),
        }
    }
}
