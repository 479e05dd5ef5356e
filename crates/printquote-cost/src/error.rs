//! Error types for print settings validation.

use thiserror::Error;

/// A print setting outside the range the shop accepts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// Numeric setting outside its allowed range (or not a number).
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        /// Name of the offending setting.
        field: &'static str,
        /// Value supplied.
        value: f64,
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },

    /// Setting that must be a positive finite number.
    #[error("{field} must be greater than zero (got {value})")]
    NotPositive {
        /// Name of the offending setting.
        field: &'static str,
        /// Value supplied.
        value: f64,
    },

    /// Support material is always printed.
    #[error("support material cannot be disabled")]
    SupportDisabled,
}

/// Result type for settings validation.
pub type Result<T> = std::result::Result<T, SettingsError>;
