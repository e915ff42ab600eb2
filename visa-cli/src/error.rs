//! CLI Error Types

use thiserror::Error;
use visa_client::ClientError;
use visa_core::{ValidationErrors, VisaError};

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Step payload failed local validation
    #[error("Validation failed: {0}")]
    ValidationError(ValidationErrors),

    /// Backend boundary error
    #[error("{0}")]
    ClientError(#[from] ClientError),

    /// Domain rule violation
    #[error("{0}")]
    CoreError(#[from] VisaError),

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub fn config(message: impl Into<String>) -> Self {
        CliError::ConfigError {
            message: message.into(),
        }
    }

    pub fn invalid_arg(message: impl Into<String>) -> Self {
        CliError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Text shown to the operator
    pub fn user_message(&self) -> String {
        match self {
            CliError::ClientError(e) => format!("{} ({})", e.user_message(), e),
            other => other.to_string(),
        }
    }

    /// Get exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::ConfigError { .. } => 1,
            CliError::InvalidArgument { .. } => 2,
            CliError::ValidationError(_) => 3,
            CliError::ClientError(e) => match e {
                ClientError::Validation(_) => 3,
                ClientError::Network { .. } => 4,
                ClientError::Unauthorized { .. } | ClientError::SessionExpired | ClientError::NotSignedIn => 5,
                ClientError::Forbidden { .. } => 6,
                ClientError::NotFound { .. } => 7,
                ClientError::Unprocessable { .. } => 8,
                ClientError::RateLimited { .. } | ClientError::Server { .. } => 9,
                ClientError::PollTimeout { .. } => 10,
                ClientError::Core(_) => 12,
                _ => 11,
            },
            CliError::CoreError(_) => 12,
            CliError::IoError(_) => 13,
            CliError::JsonError(_) => 14,
        }
    }
}

impl From<ValidationErrors> for CliError {
    fn from(errors: ValidationErrors) -> Self {
        CliError::ValidationError(errors)
    }
}
