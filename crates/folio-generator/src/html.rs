//! Page rendering.
//!
//! Renders every registered page through its template and writes the result
//! to `{deploy}/{id}.html`.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use folio_core::{CoreError, Page};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    context::{RenderContextBuilder, SiteContext},
    template::{TemplateError, TemplateRegistry},
};

/// Rendering errors.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Template error.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// IO error.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Site values could not be prepared.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for rendering.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Renders pages to HTML files.
#[derive(Debug)]
pub struct HtmlRenderer {
    templates: TemplateRegistry,
    contexts: RenderContextBuilder,
    deploy_dir: PathBuf,
}

impl HtmlRenderer {
    /// Create a renderer over the finished site model.
    pub fn new(
        site: Arc<SiteContext>,
        templates: TemplateRegistry,
        deploy_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            templates,
            contexts: RenderContextBuilder::new(site)?,
            deploy_dir: deploy_dir.into(),
        })
    }

    fn site(&self) -> &SiteContext {
        self.contexts.site()
    }

    /// Output file of a page.
    #[must_use]
    pub fn output_path(&self, page: &Page) -> PathBuf {
        self.deploy_dir.join(format!("{}.html", page.id()))
    }

    /// Create every directory a page id implies. Returns how many were needed.
    pub fn scaffold(&self) -> Result<usize> {
        let dirs = self.site().registry().dirs();
        for dir in &dirs {
            let path = self.deploy_dir.join(dir);
            fs::create_dir_all(&path).map_err(|source| RenderError::Write { path, source })?;
        }
        debug!(count = dirs.len(), "scaffolded output directories");
        Ok(dirs.len())
    }

    /// Render one page to a string.
    pub fn render_page(&self, page: &Page) -> Result<String> {
        let template = self.site().template_for(page);
        let context = self.contexts.build(page, &self.templates)?;
        Ok(self.templates.render(template, &context)?)
    }

    /// Render and write every page, in id order. Returns the page count.
    pub fn render_all(&self) -> Result<usize> {
        let mut count = 0;
        for page in self.site().registry().iter() {
            info!("{:>14} : /{}", self.site().template_for(page), page.id());
            let html = self.render_page(page)?;
            write_page(&self.output_path(page), &html)?;
            count += 1;
        }
        Ok(count)
    }
}

fn write_page(path: &Path, html: &str) -> Result<()> {
    fs::write(path, html).map_err(|source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "wrote page");
    Ok(())
}
