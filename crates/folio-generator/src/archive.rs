//! Archive derivation.
//!
//! Groups dated content pages by year (and optionally by month), registers
//! one archive page per group and links each page to its chronological
//! neighbours within the same year.

use std::collections::BTreeMap;

use chrono::Datelike;
use folio_core::{ArchivePage, Page, normalize::timestamp};
use tracing::{debug, info};

use crate::registry::{PageRegistry, Result};

/// One dated page as seen by the archive pass.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Dated {
    timestamp: i64,
    id: String,
    month: u32,
}

/// Derives archive pages and previous/next links from the registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveBuilder {
    months: bool,
}

impl ArchiveBuilder {
    /// Create a builder; `months` also emits one archive page per month.
    #[must_use]
    pub fn new(months: bool) -> Self {
        Self { months }
    }

    /// Add archive pages to the registry and wire neighbour links.
    ///
    /// Returns the years that have dated content, ascending.
    pub fn derive(&self, registry: &mut PageRegistry) -> Result<Vec<i32>> {
        let mut years: BTreeMap<i32, Vec<Dated>> = BTreeMap::new();

        for page in registry.iter() {
            if let Page::Content(content) = page
                && let Some(date) = content.meta.date
            {
                years.entry(date.year()).or_default().push(Dated {
                    timestamp: timestamp(Some(date)),
                    id: content.meta.id.clone(),
                    month: date.month(),
                });
            }
        }

        for (&year, posts) in &mut years {
            posts.sort();
            let ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();

            registry.add(ArchivePage::new(ids.clone(), year, None))?;
            debug!(year, entries = ids.len(), "added year archive");

            if self.months {
                self.add_months(registry, year, posts)?;
            }

            link_neighbours(registry, &ids);
        }

        info!(years = years.len(), "archives derived");
        Ok(years.into_keys().collect())
    }

    fn add_months(&self, registry: &mut PageRegistry, year: i32, posts: &[Dated]) -> Result<()> {
        let mut months: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        for post in posts {
            months.entry(post.month).or_default().push(post.id.clone());
        }

        for (month, ids) in months {
            registry.add(ArchivePage::new(ids, year, Some(month)))?;
            debug!(year, month, "added month archive");
        }
        Ok(())
    }
}

/// `[a, b, c]` becomes `(None, a, b)`, `(a, b, c)`, `(b, c, None)`.
pub fn neighbours<T>(items: &[T]) -> impl Iterator<Item = (Option<&T>, &T, Option<&T>)> {
    items.iter().enumerate().map(|(i, item)| {
        let prev = i.checked_sub(1).and_then(|p| items.get(p));
        (prev, item, items.get(i + 1))
    })
}

fn link_neighbours(registry: &mut PageRegistry, ids: &[String]) {
    for (prev, id, next) in neighbours(ids) {
        if let Some(page) = registry.content_mut(id) {
            page.prevpost = prev.cloned();
            page.nextpost = next.cloned();
        }
    }
}
