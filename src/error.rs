//! Errors raised by the runtime itself.
//!
//! Futures and streams carry their own error type `E`; nothing in the
//! combinator engine converts or wraps it. The types here only describe why
//! driving the runtime stopped before a result was available.

use std::time::Duration;
use thiserror::Error;

/// Why [`Runtime::block_on`](crate::runtime::Runtime::block_on) or
/// [`Runtime::run`](crate::runtime::Runtime::run) gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RunError {
    /// Nothing is queued, armed or in flight, yet the future has not
    /// settled. It never will.
    #[error("runtime stalled: no pending work can settle the future")]
    Stalled,
    /// Only cross-thread completions were outstanding and none arrived
    /// within the configured stall timeout.
    #[error("runtime waited {waited:?} for a completion without progress")]
    TimedOut {
        /// How long the runtime was parked without progress.
        waited: Duration,
    },
}

impl RunError {
    /// Returns true if the runtime could prove the future will never settle.
    #[must_use]
    pub const fn is_stalled(&self) -> bool {
        matches!(self, Self::Stalled)
    }
}

/// Errors from building a [`RuntimeConfig`](crate::config::RuntimeConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `max_turn_callbacks` was zero.
    #[error("max_turn_callbacks must be at least 1")]
    ZeroTurnBudget,
    /// `stall_timeout_ms` was zero.
    #[error("stall_timeout_ms must be at least 1 when set")]
    ZeroStallTimeout,
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that was being read.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The config file is not valid TOML for this schema.
    #[cfg(feature = "config-file")]
    #[error("invalid runtime config: {0}")]
    Parse(#[from] toml::de::Error),
}
