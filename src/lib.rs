//! Tether: lazy, cancel-correct future and stream combinators.
//!
//! # Overview
//!
//! Tether models asynchronous values as explicit channels instead of polled
//! state machines. A producer handle writes, a consumer handle reads, and
//! nothing happens until the consumer says so:
//!
//! - **Lazy**: a [`Future`] or [`Stream`] does no work before `start()`.
//! - **Single delivery**: a future delivers once; a stream delivers once per
//!   `start()`, which is its whole backpressure story.
//! - **Cancel-correct**: `abort()` reaches every producer still running in a
//!   combinator graph, and no callback fires on an aborted channel.
//! - **Flat stacks**: a result produced while its producer is being started
//!   is handed over on a later runtime turn, so chains of any length never
//!   recurse.
//!
//! # Module Structure
//!
//! - [`future`]: the single-value channel and its combinators
//! - [`stream`]: the multi-value channel, its combinators and sink adapters
//! - [`runtime`]: the per-thread deferred queue, timers and completions
//! - [`time`]: delays and timeouts
//! - [`either`]: the symmetric two-variant sum type
//! - [`config`]: runtime configuration
//! - [`error`](mod@error): runtime and configuration errors
//! - [`tracing_compat`]: optional tracing integration (`tracing-integration` feature)
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tether::runtime::Runtime;
//! use tether::{stream, time};
//!
//! let total = stream::iter::<_, &str>(1..=4)
//!     .and_then(|n| time::delay_result(Duration::from_millis(1), Ok(n * n)))
//!     .fold(0, |acc, n| tether::future::ok(acc + n));
//! assert_eq!(Runtime::new().block_on(total), Ok(Ok(30)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::type_complexity)]

pub mod config;
pub mod either;
pub mod error;
pub mod future;
pub(crate) mod guard;
pub mod runtime;
pub mod stream;
pub mod time;
pub mod tracing_compat;

// ── Test-only modules ───────────────────────────────────────────────────
#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

pub use config::RuntimeConfig;
pub use either::Either;
pub use error::{ConfigError, RunError};
pub use future::{Future, Task};
pub use runtime::{Runtime, RuntimeBuilder};
pub use stream::{Delivery, Sink, Stream};
