//! Page data model.
//!
//! Every page shares a [`PageMeta`] header. Content pages come from source
//! files; archive pages are derived from dated content pages. Cross-page
//! links (archive entries, previous/next post) are stored as page ids and
//! resolved through the page registry when rendering.

use std::{collections::BTreeMap, path::PathBuf};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde_yaml::Value;

use crate::normalize::{join_path, timestamp};

/// Fields common to every page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMeta {
    /// URL path segment, unique across the site (`"2019/my-post"`, `"index"`).
    pub id: String,

    /// Page title, possibly empty.
    pub title: String,

    /// Origin date.
    pub date: Option<NaiveDateTime>,

    /// Publish date. Falls back to `date` for ordering.
    pub posted: Option<NaiveDateTime>,

    /// Template name; empty means the site default.
    pub template: String,

    /// Front-matter keys without a dedicated field.
    pub extra: BTreeMap<String, Value>,
}

impl PageMeta {
    /// Create a header with just an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sort key by origin date, ties broken by id.
    pub fn origin_key(&self) -> (i64, &str) {
        (timestamp(self.date), &self.id)
    }

    /// Sort key by publish date (origin date if unpublished), ties broken by id.
    pub fn posted_key(&self) -> (i64, &str) {
        (timestamp(self.posted.or(self.date)), &self.id)
    }

    /// Directory component of the id, if any.
    pub fn id_dir(&self) -> Option<&str> {
        self.id.rsplit_once('/').map(|(dir, _)| dir).filter(|d| !d.is_empty())
    }
}

/// A page parsed from a content file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentPage {
    pub meta: PageMeta,

    /// Source file the page was read from.
    pub source: PathBuf,

    /// Last write time of the source file.
    pub modified: Option<NaiveDateTime>,

    /// Normalized tag tokens, in authored order.
    pub tags: Vec<String>,

    /// Normalized category tokens, in authored order.
    pub category: Vec<String>,

    /// Excerpt as HTML.
    pub summary: String,

    /// Full body as HTML.
    pub content: String,

    /// Id of the previous dated page of the same year.
    pub prevpost: Option<String>,

    /// Id of the next dated page of the same year.
    pub nextpost: Option<String>,
}

impl ContentPage {
    /// Full English month name of the origin date.
    pub fn month_name(&self) -> Option<String> {
        self.meta.date.map(|d| d.format("%B").to_string())
    }
}

/// A generated page listing the dated content of one year or one month.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivePage {
    pub meta: PageMeta,
    pub year: i32,
    pub month: Option<u32>,

    /// Ids of the listed content pages, oldest first.
    pub entries: Vec<String>,
}

impl ArchivePage {
    /// Build the archive page for `year`, or for one month of it.
    pub fn new(entries: Vec<String>, year: i32, month: Option<u32>) -> Self {
        let month_part = month.map(|m| format!("{m:02}")).unwrap_or_default();
        let id = join_path(&[year.to_string(), month_part], false, false);

        let (template, title) = match month {
            Some(m) => {
                let title = NaiveDate::from_ymd_opt(year, m, 1)
                    .map(|d| d.format("%B %Y").to_string())
                    .unwrap_or_else(|| format!("{m:02}/{year}"));
                ("archive_month", title)
            }
            None => ("archive_year", year.to_string()),
        };

        Self {
            meta: PageMeta {
                id,
                title,
                template: template.to_string(),
                ..PageMeta::default()
            },
            year,
            month,
            entries,
        }
    }
}

/// Any page known to the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Content(ContentPage),
    Archive(ArchivePage),
}

impl Page {
    /// Shared header.
    pub fn meta(&self) -> &PageMeta {
        match self {
            Self::Content(page) => &page.meta,
            Self::Archive(page) => &page.meta,
        }
    }

    /// Page id.
    pub fn id(&self) -> &str {
        &self.meta().id
    }

    /// Whether the page has an origin date.
    pub fn is_dated(&self) -> bool {
        self.meta().date.is_some()
    }

    /// Sort key for the requested ordering.
    pub fn sort_key(&self, by_origin: bool) -> (i64, &str) {
        if by_origin {
            self.meta().origin_key()
        } else {
            self.meta().posted_key()
        }
    }

    /// Content page view, if this is one.
    pub fn as_content(&self) -> Option<&ContentPage> {
        match self {
            Self::Content(page) => Some(page),
            Self::Archive(_) => None,
        }
    }

    /// Year of the origin date.
    pub fn year(&self) -> Option<i32> {
        self.meta().date.map(|d| d.year())
    }
}

impl From<ContentPage> for Page {
    fn from(page: ContentPage) -> Self {
        Self::Content(page)
    }
}

impl From<ArchivePage> for Page {
    fn from(page: ArchivePage) -> Self {
        Self::Archive(page)
    }
}
