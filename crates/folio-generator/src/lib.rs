//! folio generator library
//!
//! Static site generation engine for folio.
//!
//! # Modules
//!
//! - [`registry`] - Page registry and page selection
//! - [`archive`] - Year/month archives and previous/next links
//! - [`assets`] - Static file synchronization and transforms
//! - [`collector`] - Content discovery
//! - [`template`] - Template engine adapter
//! - [`context`] - Render context construction
//! - [`html`] - Page rendering
//! - [`build`] - Build orchestration

pub mod archive;
pub mod assets;
pub mod build;
pub mod collector;
pub mod context;
pub mod html;
pub mod registry;
pub mod template;

pub use archive::ArchiveBuilder;
pub use assets::{AssetSynchronizer, SyncStats, Transform};
pub use build::{BuildError, BuildStats, Builder};
pub use collector::ContentCollector;
pub use context::{Context, RenderContextBuilder, SiteContext};
pub use html::HtmlRenderer;
pub use registry::{PageRegistry, Selection};
pub use template::TemplateRegistry;
