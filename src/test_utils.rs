//! Test helpers: logging setup, phase markers and a runtime driver.
//!
//! Tests follow one shape:
//!
//! ```ignore
//! fn init_test(name: &str) {
//!     init_test_logging();
//!     crate::test_phase!(name);
//! }
//! ```
//!
//! and report assertions through [`assert_with_log!`](crate::assert_with_log)
//! so that a failing run shows what was expected next to what was seen.
//! Set `RUST_LOG=tether=trace` to see engine internals.

use crate::future::Future;
use crate::runtime::Runtime;
use std::fmt::Debug;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Installs a test-writer subscriber once per process. Later calls are
/// no-ops, as is a call when another subscriber is already installed.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

#[doc(hidden)]
pub fn log_phase(name: &str) {
    tracing::info!(test = name, "test phase");
}

#[doc(hidden)]
pub fn log_complete(name: &str) {
    tracing::info!(test = name, "test complete");
}

#[doc(hidden)]
pub fn log_assertion<E: Debug + ?Sized, A: Debug + ?Sized>(
    passed: bool,
    label: &str,
    expected: &E,
    actual: &A,
) {
    if passed {
        tracing::debug!(label, expected = ?expected, actual = ?actual, "assertion passed");
    } else {
        tracing::error!(label, expected = ?expected, actual = ?actual, "assertion failed");
    }
}

/// Drives `future` to completion on a fresh runtime handle.
///
/// Returns `None` when the runtime stalled or timed out before the future
/// settled.
pub fn settle<T: 'static, E: 'static>(future: Future<T, E>) -> Option<Result<T, E>> {
    Runtime::new().block_on(future).ok()
}

/// Marks the start of a test.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        $crate::test_utils::log_phase($name)
    };
}

/// Marks the successful end of a test.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        $crate::test_utils::log_complete($name)
    };
}

/// Asserts `cond`, logging the label with the expected and actual values
/// either way.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $label:expr, $expected:expr, $actual:expr $(,)?) => {{
        let passed: bool = $cond;
        let expected = &$expected;
        let actual = &$actual;
        $crate::test_utils::log_assertion(passed, $label, expected, actual);
        assert!(
            passed,
            "{}: expected {:?}, got {:?}",
            $label, expected, actual
        );
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::future;

    #[test]
    fn settle_returns_outcome() {
        init_test_logging();
        crate::test_phase!("settle_returns_outcome");
        let outcome = settle(future::ok::<u8, ()>(3));
        crate::assert_with_log!(outcome == Some(Ok(3)), "outcome", Some(Ok::<u8, ()>(3)), outcome);
        crate::test_complete!("settle_returns_outcome");
    }

    #[test]
    fn settle_reports_stall_as_none() {
        init_test_logging();
        crate::test_phase!("settle_reports_stall_as_none");
        let outcome = settle(future::never::<u8, ()>());
        crate::assert_with_log!(outcome.is_none(), "stalled", "None", outcome);
        crate::test_complete!("settle_reports_stall_as_none");
    }
}
