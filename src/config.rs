//! Runtime configuration.
//!
//! [`RuntimeConfig`] is plain data with serde support so it can be embedded
//! in an application's own config. With the `config-file` feature it can
//! also be loaded from a standalone TOML file:
//!
//! ```toml
//! max_turn_callbacks = 512
//! stall_timeout_ms = 30000
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of deferred callbacks run per turn.
pub const DEFAULT_MAX_TURN_CALLBACKS: usize = 1024;

/// Tunables for [`Runtime`](crate::runtime::Runtime).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Upper bound on deferred callbacks run before timers and injected
    /// completions get another look.
    pub max_turn_callbacks: usize,
    /// How long to park waiting for a cross-thread completion before giving
    /// up with [`RunError::TimedOut`](crate::error::RunError::TimedOut).
    /// `None` waits forever.
    pub stall_timeout_ms: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_turn_callbacks: DEFAULT_MAX_TURN_CALLBACKS,
            stall_timeout_ms: None,
        }
    }
}

impl RuntimeConfig {
    /// Checks the invariants the runtime relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_turn_callbacks == 0 {
            return Err(ConfigError::ZeroTurnBudget);
        }
        if self.stall_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroStallTimeout);
        }
        Ok(())
    }

    /// The stall timeout as a [`Duration`].
    #[must_use]
    pub fn stall_timeout(&self) -> Option<Duration> {
        self.stall_timeout_ms.map(Duration::from_millis)
    }

    /// Parses and validates a TOML document.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}
