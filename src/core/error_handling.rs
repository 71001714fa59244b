//! Generic error handling utilities
//!
//! Provides unified fatal-error reporting that works across the error types of
//! each subsystem while keeping their domain-specific messages.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)` with a helpful, actionable message. When it returns `false`,
/// `user_message()` returns `None`.
pub trait ContextualError: std::error::Error {
    /// Returns true if this error carries a message the user can act on directly
    ///
    /// User-actionable: contradictory flags, unknown team, missing SSH key.
    /// System: network failures, unexpected API responses, IO failures.
    fn is_user_actionable(&self) -> bool;

    /// Returns the specific user message if this is a user-actionable error
    fn user_message(&self) -> Option<&str>;
}

/// Log a fatal error with a detail level that matches its specificity
///
/// User-actionable errors print their own message; system errors print the
/// operation context plus the error text. Full debug output is always
/// available at debug level.
///
/// # Examples
/// ```rust,no_run
/// # use secretsweep::core::error_handling::log_error_with_context;
/// # use secretsweep::app::cli::validation::ValidationError;
/// let err = ValidationError::new("Can't have a team name without an org");
/// log_error_with_context(&err, "Argument validation");
/// // Logs: "FATAL: Can't have a team name without an org"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => {
            log::error!("FATAL: {}", user_msg);
        }
        _ => {
            log::error!("FATAL: {}: {}", operation_context, error);
        }
    }
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
