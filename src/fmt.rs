// Logging shim: `defmt` or `log` when enabled, otherwise the macros only evaluate their arguments.

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        pub(crate) use defmt::{debug, trace, warn};
    } else if #[cfg(feature = "log")] {
        pub(crate) use log::{debug, trace, warn};
    } else {
        macro_rules! noop_trace {
            ($($arg:tt)*) => {{ let _ = ($($arg)*); }};
        }
        macro_rules! noop_debug {
            ($($arg:tt)*) => {{ let _ = ($($arg)*); }};
        }
        macro_rules! noop_warn {
            ($($arg:tt)*) => {{ let _ = ($($arg)*); }};
        }
        pub(crate) use {noop_debug as debug, noop_trace as trace, noop_warn as warn};
    }
}
