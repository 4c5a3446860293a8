use thiserror::Error;

/// Error outputs from `GuardKit`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuardError {
    /// A confirmation record carried a zero in a field that must be positive.
    #[error("invalid_confirmation: {field} must be non-zero")]
    InvalidConfirmationField {
        /// Name of the offending field.
        field: &'static str,
    },
    /// The process-wide configuration blob could not be parsed.
    #[error("invalid_config: {0}")]
    InvalidConfig(String),
}
