//! Process-wide tracing/logging setup.

pub mod tracing;

pub use crate::tracing::{LogFormat, LogSettings};

/// Initialize logging with defaults (JSON, `RUST_LOG` or `info`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(&LogSettings::default());
}

/// Initialize logging with explicit settings.
pub fn init_with(settings: &LogSettings) {
    tracing::init(settings);
}
