// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Console logging for the target generators.
//!
//! Target generation runs once per training image, so per-call summaries are
//! only printed when verbose output has been switched on with [`set_verbose`].
//! Warnings about malformed annotations are always printed.

use std::sync::atomic::{AtomicBool, Ordering};

#[doc(hidden)]
pub use colored;

/// Global verbosity flag.
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set the global verbosity flag.
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

/// Check if verbose output is enabled.
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Macro for warning messages.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        use $crate::logging::colored::Colorize;
        eprintln!("{} {}", "WARNING ⚠️".yellow().bold(), format!($($arg)*));
    }};
}

/// Macro for verbose messages.
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)*) => {{
        if $crate::logging::is_verbose() {
            use $crate::logging::colored::Colorize;
            println!("{} {}", "targets:".cyan(), format!($($arg)*));
        }
    }};
}
