//! Error types for vcconv.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=settings state, 3=not_found, 4=validation, 7=config, 8=io)
//! - Recovery hints for the common mistakes
//! - Structured JSON output for piped / non-TTY consumers
//!
//! The conversion core never fails; every error here comes from the
//! wrapper around it (files, settings, arguments).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for vcconv operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Settings state (exit 2)
    AlreadyInitialized,

    // Not Found (exit 3)
    InputNotFound,

    // Validation (exit 4)
    InvalidInput,
    InvalidArgument,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::InputNotFound => "INPUT_NOT_FOUND",
            Self::InvalidInput => "INVALID_INPUT",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::AlreadyInitialized => 2,
            Self::InputNotFound => 3,
            Self::InvalidInput | Self::InvalidArgument => 4,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in vcconv operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Settings already exist at {}", path.display())]
    AlreadyInitialized { path: PathBuf },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::InputNotFound { .. } => ErrorCode::InputNotFound,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Recovery hint for the user.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::InputNotFound { path } => Some(format!(
                "Export your contacts from Apple Contacts first:\n  \
                 1. Open the Contacts app on your Mac\n  \
                 2. Select the contacts you want to export\n  \
                 3. Choose File > Export > Export vCard...\n  \
                 4. Save it as '{}' or pass its path: vcconv convert <FILE>",
                path.display()
            )),

            Self::AlreadyInitialized { path } => Some(format!(
                "Settings already exist at {}. Use `--force` to overwrite, \
                 or `vcconv config set` to change one value.",
                path.display()
            )),

            Self::InvalidInput(_) => Some(
                "The input must be a UTF-8 text file. Re-export the contacts \
                 from Apple Contacts as vCard."
                    .to_string(),
            ),

            Self::InvalidArgument(msg) => {
                if msg.contains("boolean") {
                    Some("Use yes/no, true/false, on/off or 1/0".to_string())
                } else if msg.contains("settings key") {
                    Some("List the current settings with `vcconv config show`".to_string())
                } else if msg.contains("org_detection") {
                    Some("Valid values: auto, empty-name, show-as-company, never".to_string())
                } else {
                    None
                }
            }

            Self::Config(_) => Some(
                "Check the settings file with `vcconv config path`, \
                 or start over with `vcconv config reset`."
                    .to_string(),
            ),

            Self::Io(_) | Self::Json(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_not_found() {
        let err = Error::InputNotFound {
            path: PathBuf::from("contacts.vcf"),
        };
        assert_eq!(err.to_string(), "Input file not found: contacts.vcf");
        assert_eq!(err.exit_code(), 3);
        assert!(err.hint().unwrap().contains("Export vCard"));
    }

    #[test]
    fn test_structured_json() {
        let err = Error::InvalidArgument("'x' is not a valid org_detection".to_string());
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "INVALID_ARGUMENT");
        assert_eq!(json["error"]["exit_code"], 4);
        assert!(json["error"]["hint"].as_str().unwrap().contains("show-as-company"));
    }

    #[test]
    fn test_io_error_has_no_hint() {
        let err: Error = std::io::Error::other("disk full").into();
        assert_eq!(err.error_code(), ErrorCode::IoError);
        assert_eq!(err.exit_code(), 8);
        assert!(err.hint().is_none());
        assert!(err.to_structured_json()["error"].get("hint").is_none());
    }
}
