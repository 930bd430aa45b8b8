//! Error types for tasktable
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, invalid config)
//! - 4: Operation failed (source unreadable, terminal error)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the tasktable CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for tasktable operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task source not found: {0}")]
    SourceNotFound(PathBuf),

    // Operation failures (exit code 4)
    #[error("Task source is malformed: {0}")]
    SourceFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidConfig(_) | Error::InvalidArgument(_) | Error::SourceNotFound(_) => {
                exit_codes::USER_ERROR
            }

            Error::SourceFormat(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Stable machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidConfig(_) => "invalid_config",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::SourceNotFound(_) => "source_not_found",
            Error::SourceFormat(_) => "source_format",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::TomlParse(_) | Error::TomlSerialize(_) => "toml",
            Error::OperationFailed(_) => "operation_failed",
        }
    }

    /// What the user can do about it.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::SourceNotFound(_) => Some("pass --source <file.json> or set source.path"),
            Error::SourceFormat(_) => {
                Some("expected a JSON array of {id, content, done, done_time}")
            }
            Error::InvalidConfig(_) | Error::TomlParse(_) => {
                Some("fix .tasktable.toml then retry")
            }
            _ => None,
        }
    }

    /// Structured details for JSON error output, when the error carries any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::SourceNotFound(path) => Some(serde_json::json!({
                "path": path.to_string_lossy(),
            })),
            _ => None,
        }
    }
}

/// Result type alias for tasktable operations
pub type Result<T> = std::result::Result<T, Error>;

/// The `error` object of a JSON error envelope.
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub message: String,
    pub code: i32,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            message: err.to_string(),
            code: err.exit_code(),
            kind: err.kind(),
            hint: err.hint(),
            details: err.details(),
        }
    }
}
