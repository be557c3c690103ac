//! Error types for context analysis.
//!
//! Most failures here are recovered close to where they happen (one manifest,
//! one directory level). Only the entry points the caller asked for directly
//! hand a `ContextError` back.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContextError {
    /// Listing or reading failed
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content is not valid UTF-8
    #[error("{} is not valid UTF-8 text", path.display())]
    Decode { path: PathBuf },

    /// Manifest or config syntax error
    #[error("Parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid settings: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

pub type Result<T> = std::result::Result<T, ContextError>;

impl ContextError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        ContextError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn parse(path: impl AsRef<Path>, message: impl ToString) -> Self {
        ContextError::Parse {
            path: path.as_ref().to_path_buf(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mentions_path() {
        let err = ContextError::io(
            "/missing/dir",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        let message = err.to_string();
        assert!(message.contains("/missing/dir"));
        assert!(message.contains("not found"));
    }

    #[test]
    fn test_parse_error_display() {
        let err = ContextError::parse("package.json", "expected value at line 1");
        assert_eq!(
            err.to_string(),
            "Parse error in package.json: expected value at line 1"
        );
    }
}
