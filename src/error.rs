//! Error types for homekeep
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown task, rejected import)
//! - 4: Operation failed (storage, serialization, lock timeout)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the homekeep CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Reasons an external backup document is refused.
///
/// The live state is never touched when one of these is returned.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("document is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("document must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Main error type for homekeep operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Import rejected: {0}")]
    Import(#[from] ImportError),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("No data directory available; pass --data-dir or set HOMEKEEP_DIR")]
    DataDirUnavailable,
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_)
            | Error::InvalidConfig(_)
            | Error::TaskNotFound(_)
            | Error::Import(_) => exit_codes::USER_ERROR,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::LockFailed(_)
            | Error::DataDirUnavailable => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured context for machine-readable output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::InvalidArgument(message) | Error::InvalidConfig(message) => {
                Some(serde_json::json!({ "message": message }))
            }
            Error::TaskNotFound(id) => Some(serde_json::json!({ "id": id })),
            Error::Import(err) => Some(serde_json::json!({
                "reason": match err {
                    ImportError::Malformed(_) => "malformed",
                    ImportError::NotAnObject(_) => "not_an_object",
                },
            })),
            Error::LockFailed(path) => Some(serde_json::json!({
                "path": path.to_string_lossy(),
            })),
            _ => None,
        }
    }
}

/// Result type alias for homekeep operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
