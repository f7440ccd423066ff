//! Logging infrastructure for Ember.
//!
//! Ember uses `tracing` for structured logging. All events use target "ember"
//! and include an `event` field for filtering.
//!
//! Ember never initializes a global subscriber; embedding applications
//! configure tracing themselves.
//!
//! ## Conventions
//!
//! - `event`: snake_case event name (required)
//! - `component`: subsystem (e.g., "query", "link_list", "db")
//! - Use `%` for Display, `?` for Debug formatting

/// Target for all Ember log events.
pub(crate) const EMBER_TARGET: &str = "ember";

/// Macro for info-level log events.
///
/// # Example
/// ```ignore
/// log_info!(
///     component = "db",
///     event = "db_opened",
///     name = %option.name,
/// );
/// ```
macro_rules! log_info {
    ($($field:tt)*) => {
        ::tracing::info!(target: $crate::observability::EMBER_TARGET, $($field)*)
    };
}

/// Macro for debug-level log events.
macro_rules! log_debug {
    ($($field:tt)*) => {
        ::tracing::debug!(target: $crate::observability::EMBER_TARGET, $($field)*)
    };
}

/// Macro for warn-level log events.
macro_rules! log_warn {
    ($($field:tt)*) => {
        ::tracing::warn!(target: $crate::observability::EMBER_TARGET, $($field)*)
    };
}

pub(crate) use log_debug;
pub(crate) use log_info;
pub(crate) use log_warn;
