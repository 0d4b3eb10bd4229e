//! Build orchestration.
//!
//! Runs the whole pipeline for one site root: configuration, deploy
//! directory, static files, content, archives, then rendering. The first
//! error aborts the build.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use folio_core::{CoreError, SiteConfig};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    archive::ArchiveBuilder,
    assets::{AssetError, AssetSynchronizer},
    collector::{CollectorError, ContentCollector},
    context::SiteContext,
    html::{HtmlRenderer, RenderError},
    registry::RegistryError,
    template::TemplateRegistry,
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The site root is not a directory.
    #[error("site root is not a directory: {0}")]
    InvalidRoot(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] CoreError),

    /// Content collection error.
    #[error("content error: {0}")]
    Collector(#[from] CollectorError),

    /// Archive derivation error.
    #[error("archive error: {0}")]
    Registry(#[from] RegistryError),

    /// Static file error.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    /// Rendering error.
    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of pages rendered, archives included.
    pub pages: usize,

    /// Number of archive pages derived.
    pub archives: usize,

    /// Number of static files copied or transformed.
    pub assets: usize,

    /// Number of static files already up to date.
    pub assets_skipped: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Site builder that orchestrates the build process.
#[derive(Debug)]
pub struct Builder {
    site_root: PathBuf,
    clean: bool,
}

impl Builder {
    /// Create a builder for the site rooted at `site_root`.
    #[must_use]
    pub fn new(site_root: impl Into<PathBuf>) -> Self {
        Self {
            site_root: site_root.into(),
            clean: false,
        }
    }

    /// Wipe the deploy directory before building.
    #[must_use]
    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    /// Execute the full build process.
    pub fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();
        let mut stats = BuildStats::default();

        if !self.site_root.is_dir() {
            return Err(BuildError::InvalidRoot(self.site_root.clone()));
        }

        info!(root = %self.site_root.display(), "starting build");

        // 1. Configuration
        let config = SiteConfig::load(&self.site_root)?;
        let deploy_dir = self.site_root.join(&config.dirs.deploy);

        // 2. Deploy directory
        self.prepare_deploy(&deploy_dir)?;

        // 3. Static files
        let files_dir = self.site_root.join(&config.dirs.files);
        let sync = AssetSynchronizer::from_config(&config)?.sync(&files_dir, &deploy_dir)?;
        stats.assets = sync.processed;
        stats.assets_skipped = sync.up_to_date;

        // 4. Content
        let collector = ContentCollector::new(
            self.site_root.join(&config.dirs.content),
            config.content_exts(),
        );
        let mut registry = collector.collect()?;
        let content_pages = registry.len();

        // 5. Archives and neighbour links
        let years = ArchiveBuilder::new(config.archive_months).derive(&mut registry)?;
        stats.archives = registry.len() - content_pages;

        // 6. Render
        let templates = TemplateRegistry::from_dir(self.site_root.join(&config.dirs.templates));
        let site = SiteContext::new(config, registry, years);
        let renderer = HtmlRenderer::new(site, templates, &deploy_dir)?;
        renderer.scaffold()?;
        stats.pages = renderer.render_all()?;

        stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            pages = stats.pages,
            archives = stats.archives,
            assets = stats.assets,
            assets_skipped = stats.assets_skipped,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Create the deploy directory, emptying it first on a clean build.
    fn prepare_deploy(&self, deploy_dir: &Path) -> Result<()> {
        if self.clean && deploy_dir.exists() {
            debug!(dir = %deploy_dir.display(), "cleaning deploy directory");
            fs::remove_dir_all(deploy_dir)?;
        }
        fs::create_dir_all(deploy_dir)?;
        Ok(())
    }
}
