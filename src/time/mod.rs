//! Timer futures.
//!
//! Timers are backed by the runtime's deadline heap. Starting a delay arms
//! one timer; aborting it before the deadline disarms it, so an aborted
//! delay never keeps [`Runtime::run`](crate::runtime::Runtime::run) waiting.

mod delay;

pub use delay::{delay, delay_result, timeout};
