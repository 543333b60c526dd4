//! Error types module
//!
//! `AppError` is the error every pipeline entry point returns. Storage and vault
//! crates convert their own error enums into it at the service boundary.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Warning level - for failures isolated to one item
    Warn,
    /// Error level - for failures that abort a whole run
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upload of {file} failed after {attempts} attempt(s): {message}")]
    UploadExhausted {
        file: String,
        attempts: u32,
        message: String,
    },

    #[error("Remote scan failed: {0}")]
    Scan(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Vault error: {0}")]
    Vault(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// Machine-readable error code (e.g., "CONFIGURATION_ERROR")
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::UploadExhausted { .. } => "UPLOAD_EXHAUSTED",
            AppError::Scan(_) => "SCAN_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Vault(_) => "VAULT_ERROR",
            AppError::InvalidInput(_) => "INVALID_INPUT",
        }
    }

    /// Whether re-running the same command may succeed without operator action.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Configuration(_) | AppError::InvalidInput(_) => false,
            AppError::UploadExhausted { .. }
            | AppError::Scan(_)
            | AppError::Storage(_)
            | AppError::Vault(_) => true,
        }
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            AppError::UploadExhausted { .. } | AppError::InvalidInput(_) => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}
