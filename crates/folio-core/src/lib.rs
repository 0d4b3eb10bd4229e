//! folio core library
//!
//! Core types, site configuration, field normalization and error handling
//! for the folio static site generator.

pub mod config;
pub mod error;
pub mod normalize;
pub mod page;

pub use config::{DirsConfig, SiteConfig};
pub use error::{CoreError, Result};
pub use page::{ArchivePage, ContentPage, Page, PageMeta};
