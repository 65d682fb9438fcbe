//! The single-threaded host runtime.
//!
//! The combinator engine needs exactly one service from its host: a way to
//! run a callback "later", on a fresh stack. This module provides it per
//! thread, together with deadline timers and a channel through which other
//! threads hand results back:
//!
//! - [`defer`] / [`cancel`]: a FIFO of cancellable callbacks.
//! - [`schedule_at`] / [`cancel_timer`]: a deadline heap.
//! - [`completion`]: a [`Completer`] another thread uses to deliver a value.
//!
//! Nothing runs until a [`Runtime`] drives the thread:
//!
//! ```
//! use tether::future;
//! use tether::runtime::Runtime;
//!
//! let runtime = Runtime::new();
//! let sum = future::ok::<u32, ()>(20).map(|n| n + 22);
//! assert_eq!(runtime.block_on(sum), Ok(Ok(42)));
//! ```

mod context;
mod injector;
mod queue;
mod timer;

pub use context::{
    CompletionToken, cancel, cancel_timer, completion, defer, schedule_at,
};
pub use injector::Completer;
pub use queue::DeferToken;
pub use timer::TimerToken;

use crate::config::RuntimeConfig;
use crate::error::{ConfigError, RunError};
use crate::future::Future;
use crate::tracing_compat::{debug, trace};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Drives the deferred callbacks, timers and completions of the current
/// thread.
///
/// A `Runtime` is a cheap handle: all queues live in thread-local storage,
/// so futures built anywhere on the thread are driven by any runtime on it.
/// It is neither `Send` nor `Sync`.
#[derive(Debug, Clone)]
pub struct Runtime {
    config: RuntimeConfig,
    _local: PhantomData<Rc<()>>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Creates a runtime with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            _local: PhantomData,
        }
    }

    /// Starts building a runtime.
    #[must_use]
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// The configuration this runtime was built with.
    #[must_use]
    pub const fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Runs everything that is runnable right now, including callbacks queued
    /// by those callbacks, without waiting for timers or completions. Returns
    /// how many callbacks ran.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        loop {
            let ran = self.turn();
            if ran == 0 {
                return total;
            }
            total += ran;
        }
    }

    /// Runs until no callbacks, timers or pending completions remain.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::TimedOut`] if a completion does not arrive within
    /// the configured stall timeout.
    pub fn run(&self) -> Result<(), RunError> {
        let mut parked_since = None;
        loop {
            if self.turn() > 0 {
                parked_since = None;
                continue;
            }
            if context::outstanding().is_idle() {
                return Ok(());
            }
            self.wait(&mut parked_since)?;
        }
    }

    /// Starts `future` and drives the thread until it settles.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Stalled`] when nothing left on the thread can
    /// settle the future, or [`RunError::TimedOut`] when the stall timeout
    /// elapses waiting on a completion. The future is aborted in both cases.
    pub fn block_on<T: 'static, E: 'static>(
        &self,
        future: Future<T, E>,
    ) -> Result<Result<T, E>, RunError> {
        let slot: Rc<RefCell<Option<Result<T, E>>>> = Rc::default();
        let out = Rc::clone(&slot);
        future.end(move |result| *out.borrow_mut() = Some(result));
        future.start();

        let mut parked_since = None;
        loop {
            let settled = slot.borrow_mut().take();
            if let Some(result) = settled {
                return Ok(result);
            }
            if self.turn() > 0 {
                parked_since = None;
                continue;
            }
            if let Err(err) = self.wait(&mut parked_since) {
                debug!(error = %err, "block_on gave up");
                future.abort();
                return Err(err);
            }
        }
    }

    /// One scheduling turn: injected completions, expired timers, then up to
    /// `max_turn_callbacks` deferred callbacks.
    fn turn(&self) -> usize {
        let mut ran = context::drain_injected();

        let expired = context::pop_expired(Instant::now());
        ran += expired.len();
        for callback in expired {
            callback();
        }

        let mut deferred = 0;
        while deferred < self.config.max_turn_callbacks {
            let Some(callback) = context::pop_deferred() else {
                break;
            };
            callback();
            deferred += 1;
        }
        ran += deferred;

        if ran > 0 {
            trace!(ran, "runtime turn");
        }
        ran
    }

    /// Blocks until something may have become runnable.
    fn wait(&self, parked_since: &mut Option<Instant>) -> Result<(), RunError> {
        let outstanding = context::outstanding();
        if outstanding.deferred > 0 || outstanding.injected {
            return Ok(());
        }
        let now = Instant::now();
        match (outstanding.next_deadline, outstanding.completions) {
            (None, 0) => Err(RunError::Stalled),
            (Some(deadline), _) => {
                if deadline > now {
                    context::park(Some(deadline - now));
                }
                Ok(())
            }
            (None, _) => {
                let since = *parked_since.get_or_insert(now);
                let waited = now - since;
                match self.config.stall_timeout() {
                    Some(limit) if waited >= limit => Err(RunError::TimedOut { waited }),
                    Some(limit) => {
                        context::park(Some(limit - waited));
                        Ok(())
                    }
                    None => {
                        context::park(None);
                        Ok(())
                    }
                }
            }
        }
    }
}

/// Builder for [`Runtime`].
#[derive(Debug, Clone, Default)]
pub struct RuntimeBuilder {
    config: RuntimeConfig,
}

impl RuntimeBuilder {
    /// A builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Bounds the deferred callbacks run per turn.
    #[must_use]
    pub const fn max_turn_callbacks(mut self, max: usize) -> Self {
        self.config.max_turn_callbacks = max;
        self
    }

    /// Gives up waiting for cross-thread completions after `timeout` without
    /// progress.
    #[must_use]
    pub fn stall_timeout(mut self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.config.stall_timeout_ms = Some(millis.max(1));
        self
    }

    /// Loads the configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[cfg(feature = "config-file")]
    pub fn config_file(self, path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        Ok(self.config(RuntimeConfig::from_toml_file(path)?))
    }

    /// Validates the configuration and builds the runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn build(self) -> Result<Runtime, ConfigError> {
        self.config.validate()?;
        Ok(Runtime {
            config: self.config,
            _local: PhantomData,
        })
    }
}
