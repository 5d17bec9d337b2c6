//! Error types for docmerge.
//!
//! Library crates use [`DocMergeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docmerge operations.
#[derive(Debug, thiserror::Error)]
pub enum DocMergeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The safety copy of the document tree could not be created.
    #[error("backup failed at {path:?}: {message}")]
    Backup { path: PathBuf, message: String },

    /// Walking the document tree failed.
    #[error("scan error: {0}")]
    Scan(String),

    /// A theme group could not be merged.
    #[error("merge error for theme '{theme}': {message}")]
    Merge { theme: String, message: String },

    /// Data validation error (bad path, invalid document name, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocMergeError>;

impl DocMergeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a merge error scoped to one theme.
    pub fn merge(theme: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Merge {
            theme: theme.into(),
            message: msg.into(),
        }
    }

    /// Create a backup error for the given destination.
    pub fn backup(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Backup {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = DocMergeError::config("name_weight must exceed path_weight");
        assert_eq!(
            err.to_string(),
            "config error: name_weight must exceed path_weight"
        );

        let err = DocMergeError::merge("预算管理", "disk full");
        assert!(err.to_string().contains("预算管理"));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn io_error_keeps_path() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = DocMergeError::io("/docs/a.md", source);
        assert!(err.to_string().contains("/docs/a.md"));
    }
}
