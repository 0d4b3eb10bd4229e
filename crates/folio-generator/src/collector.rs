//! Content discovery.
//!
//! Walks the content directory, parses every file with a content extension
//! and registers the resulting pages.

use std::path::{Path, PathBuf};

use folio_parser::{ContentParser, ParseError};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::registry::{PageRegistry, RegistryError};

/// Collector errors.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Directory walk error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A content file could not be parsed.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// A parsed page clashed with an existing one.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result type for collector operations.
pub type Result<T> = std::result::Result<T, CollectorError>;

/// Content collector that walks a directory and parses files.
#[derive(Debug)]
pub struct ContentCollector {
    parser: ContentParser,
    content_dir: PathBuf,
    extensions: Vec<String>,
}

impl ContentCollector {
    /// Create a collector for files with one of `extensions` (without dot).
    #[must_use]
    pub fn new(content_dir: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            parser: ContentParser::new(),
            content_dir: content_dir.into(),
            extensions,
        }
    }

    /// Whether a file has a content extension. A dot-file such as `.md` has none.
    pub fn is_content(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    /// Files to parse, in file-name order.
    pub fn find_content_files(&self) -> Result<Vec<PathBuf>> {
        if !self.content_dir.is_dir() {
            debug!(dir = %self.content_dir.display(), "content directory does not exist");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.content_dir).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && self.is_content(entry.path()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Parse every content file into a fresh registry.
    pub fn collect(&self) -> Result<PageRegistry> {
        info!(dir = %self.content_dir.display(), "collecting content");

        let files = self.find_content_files()?;
        info!(count = files.len(), "found content files");

        let mut registry = PageRegistry::new();
        for path in files {
            let page = self
                .parser
                .parse_file(&path)
                .map_err(|source| CollectorError::Parse {
                    path: path.clone(),
                    source,
                })?;
            debug!(id = %page.meta.id, path = %path.display(), "parsed page");
            registry.add(page)?;
        }

        Ok(registry)
    }
}
