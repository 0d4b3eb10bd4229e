//! folio parser library
//!
//! Front matter splitting, Markdown rendering and content file parsing.

pub mod content;
pub mod frontmatter;
pub mod markdown;

pub use content::{ContentParser, DATED_TEMPLATE, Field};
pub use markdown::MarkdownRenderer;
use thiserror::Error;

/// Parser errors.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Reading the source file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Front matter or field normalization failed.
    #[error(transparent)]
    Core(#[from] folio_core::CoreError),
}

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, ParseError>;
