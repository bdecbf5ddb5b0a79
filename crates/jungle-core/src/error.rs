//! Error types for the jungle library.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! carries enough context (file, line, field) to point at the offending input.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the jungle library.
#[derive(Debug, Error)]
pub enum JungleError {
    // File system errors
    #[error("IO error{}: {message}", location_suffix(.path, &None))]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    // Serialization errors
    #[error("JSON error{}: {message}", location_suffix(.path, .line))]
    Json {
        message: String,
        path: Option<PathBuf>,
        /// 1-based line number within `path`
        line: Option<usize>,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // Validation errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Engines disagree on: {}", .analyses.join(", "))]
    EngineMismatch { analyses: Vec<String> },
}

fn location_suffix(path: &Option<PathBuf>, line: &Option<usize>) -> String {
    match (path, line) {
        (Some(path), Some(line)) => format!(" at {}:{}", path.display(), line),
        (Some(path), None) => format!(" in {}", path.display()),
        (None, Some(line)) => format!(" at line {}", line),
        (None, None) => String::new(),
    }
}

/// Result type alias for jungle operations.
pub type Result<T> = std::result::Result<T, JungleError>;

// Conversion implementations for common error types

impl From<std::io::Error> for JungleError {
    fn from(err: std::io::Error) -> Self {
        JungleError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for JungleError {
    fn from(err: serde_json::Error) -> Self {
        JungleError::Json {
            message: err.to_string(),
            path: None,
            line: None,
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for JungleError {
    fn from(err: rusqlite::Error) -> Self {
        JungleError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl JungleError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        JungleError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a JSON error pointing at a line of an input file.
    pub fn json_at(err: serde_json::Error, path: impl Into<PathBuf>, line: usize) -> Self {
        JungleError::Json {
            message: err.to_string(),
            path: Some(path.into()),
            line: Some(line),
            source: Some(err),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        JungleError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Convert to a process exit code.
    ///
    /// - 2: bad input data (JSON or validation)
    /// - 3: input not found or unreadable
    /// - 4: database failure
    /// - 5: engines disagree
    pub fn exit_code(&self) -> i32 {
        match self {
            JungleError::Json { .. } | JungleError::Validation { .. } => 2,
            JungleError::Io { .. } | JungleError::FileNotFound(_) => 3,
            JungleError::Database { .. } => 4,
            JungleError::EngineMismatch { .. } => 5,
        }
    }

    /// Whether the error is about the content of a single input record.
    ///
    /// Such errors can be skipped when reading leniently.
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            JungleError::Json { .. } | JungleError::Validation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = JungleError::validation("end_date", "precedes start_date");
        assert_eq!(
            err.to_string(),
            "Validation error for end_date: precedes start_date"
        );
    }

    #[test]
    fn test_json_error_display_includes_location() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = JungleError::json_at(source, "data/sample.jsonl", 7);
        assert!(err.to_string().starts_with("JSON error at data/sample.jsonl:7: "));
    }

    #[test]
    fn test_io_error_display_with_and_without_path() {
        let err: JungleError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(err.to_string(), "IO error: denied");

        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = JungleError::io_with_path(source, "data/locked.jsonl");
        assert_eq!(err.to_string(), "IO error in data/locked.jsonl: denied");
    }

    #[test]
    fn test_mismatch_display() {
        let err = JungleError::EngineMismatch {
            analyses: vec!["species_population".into(), "flatten".into()],
        };
        assert_eq!(
            err.to_string(),
            "Engines disagree on: species_population, flatten"
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(JungleError::validation("x", "y").exit_code(), 2);
        assert_eq!(JungleError::FileNotFound("missing".into()).exit_code(), 3);
        assert_eq!(
            JungleError::EngineMismatch { analyses: vec![] }.exit_code(),
            5
        );
        assert_eq!(
            JungleError::Database {
                message: "locked".into(),
                source: None
            }
            .exit_code(),
            4
        );
    }

    #[test]
    fn test_record_errors() {
        assert!(JungleError::validation("x", "y").is_record_error());
        assert!(!JungleError::FileNotFound("missing".into()).is_record_error());
    }
}
