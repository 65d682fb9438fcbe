//! Optional tracing integration.
//!
//! With the `tracing-integration` feature the usual `tracing` macros are
//! re-exported from here. Without it the same names resolve to macros that
//! expand to nothing, so call sites never need their own `cfg` gates.
//!
//! ```ignore
//! use crate::tracing_compat::trace;
//!
//! trace!(items = 3, "stream drained");
//! ```

#[cfg(feature = "tracing-integration")]
pub use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "tracing-integration"))]
mod noop {
    #[doc(hidden)]
    #[macro_export]
    macro_rules! __tether_noop_log {
        ($($arg:tt)*) => {};
    }

    pub use crate::__tether_noop_log as debug;
    pub use crate::__tether_noop_log as error;
    pub use crate::__tether_noop_log as info;
    pub use crate::__tether_noop_log as trace;
    pub use crate::__tether_noop_log as warn;
}

#[cfg(not(feature = "tracing-integration"))]
pub use noop::{debug, error, info, trace, warn};
