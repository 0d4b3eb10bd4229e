//! Error types for the folio core library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types for folio.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration loading or parsing error.
    #[error("configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Front matter could not be read as a key/value mapping.
    #[error("front matter error in {path}: {message}")]
    Frontmatter { path: PathBuf, message: String },

    /// A non-empty date string that no known format accepts.
    #[error("unrecognized date: {0:?}")]
    Date(String),

    /// File system I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CoreError {
    /// Create a new configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source.
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new front matter error.
    pub fn frontmatter(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Frontmatter {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CoreError::config("site.yml not found");
        assert!(err.to_string().contains("configuration error"));
        assert!(err.to_string().contains("site.yml not found"));
    }

    #[test]
    fn test_frontmatter_error_names_file() {
        let err = CoreError::frontmatter("content/post.md", "expected a mapping");
        assert!(err.to_string().contains("content/post.md"));
        assert!(err.to_string().contains("expected a mapping"));
    }

    #[test]
    fn test_date_error() {
        let err = CoreError::Date("next tuesday-ish".to_string());
        assert!(err.to_string().contains("next tuesday-ish"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CoreError = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }
}
