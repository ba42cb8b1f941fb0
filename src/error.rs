//! Error types for herald
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown task, uninitialized data dir)
//! - 4: Operation failed (store write, lock contention)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the herald CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for herald operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Data directory not initialized at {0} (run `herald init`)")]
    NotInitialized(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Notification not found: {0}")]
    NotificationNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Deal not found: {0}")]
    DealNotFound(String),

    #[error("Unknown status: {0} (expected todo, in_progress, or done)")]
    UnknownStatus(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Notification write failed: {0}")]
    NotificationWriteFailed(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::NotInitialized(_)
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::TaskNotFound(_)
            | Error::NotificationNotFound(_)
            | Error::UserNotFound(_)
            | Error::CustomerNotFound(_)
            | Error::DealNotFound(_)
            | Error::UnknownStatus(_) => exit_codes::USER_ERROR,

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::NotificationWriteFailed(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for JSON error envelopes, when available.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::TaskNotFound(id) => Some(serde_json::json!({ "task_id": id })),
            Error::NotificationNotFound(id) => {
                Some(serde_json::json!({ "notification_id": id }))
            }
            Error::LockFailed(path) => {
                Some(serde_json::json!({ "path": path.to_string_lossy() }))
            }
            _ => None,
        }
    }
}

/// Result type alias for herald operations
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
