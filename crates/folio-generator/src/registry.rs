//! Page registry.
//!
//! Owns every page of the site, content and archive alike, keyed by id.
//! Ids are unique: a second page with a known id is rejected, never merged.

use std::collections::{BTreeMap, BTreeSet};

use folio_core::{ContentPage, Page};
use thiserror::Error;
use tracing::debug;

/// Registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two pages resolved to the same id.
    #[error("duplicate page id: {0}")]
    DuplicateId(String),

    /// A referenced page does not exist.
    #[error("page not found: {0}")]
    NotFound(String),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Filter and ordering for [`PageRegistry::select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Keep at most this many pages.
    pub limit: Option<usize>,

    /// Only pages with an origin date.
    pub dated: bool,

    /// Oldest first instead of newest first.
    pub chronological: bool,

    /// Sort by origin date rather than publish date. Follows
    /// `chronological` when unset.
    pub sort_by_origin: Option<bool>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            limit: None,
            dated: true,
            chronological: false,
            sort_by_origin: None,
        }
    }
}

/// All pages of the site.
#[derive(Debug, Default)]
pub struct PageRegistry {
    pages: BTreeMap<String, Page>,
}

impl PageRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page. Fails if a page with the same id is already present.
    pub fn add(&mut self, page: impl Into<Page>) -> Result<()> {
        let page = page.into();
        let id = page.id().to_string();

        if self.pages.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }

        debug!(id = %id, "registered page");
        self.pages.insert(id, page);
        Ok(())
    }

    /// Look up a page by id.
    pub fn get(&self, id: &str) -> Result<&Page> {
        self.pages
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Mutable access to a content page, used to wire neighbour links.
    pub fn content_mut(&mut self, id: &str) -> Option<&mut ContentPage> {
        match self.pages.get_mut(id) {
            Some(Page::Content(page)) => Some(page),
            _ => None,
        }
    }

    /// Whether a page with this id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.pages.contains_key(id)
    }

    /// Number of pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the registry holds no pages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Pages in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }

    /// Every page, oldest first, by origin date or by publish date.
    pub fn all(&self, by_origin: bool) -> Vec<&Page> {
        let mut pages: Vec<&Page> = self.pages.values().collect();
        pages.sort_by(|a, b| a.sort_key(by_origin).cmp(&b.sort_key(by_origin)));
        pages
    }

    /// Filtered, ordered view used by templates to list pages.
    pub fn select(&self, selection: &Selection) -> Vec<&Page> {
        let by_origin = selection.sort_by_origin.unwrap_or(selection.chronological);

        let mut pages = self.all(by_origin);
        if !selection.chronological {
            pages.reverse();
        }
        if selection.dated {
            pages.retain(|page| page.is_dated());
        }
        if let Some(limit) = selection.limit {
            pages.truncate(limit);
        }
        pages
    }

    /// Directory components of every page id, sorted and deduplicated.
    pub fn dirs(&self) -> BTreeSet<&str> {
        self.pages
            .values()
            .filter_map(|page| page.meta().id_dir())
            .collect()
    }
}
