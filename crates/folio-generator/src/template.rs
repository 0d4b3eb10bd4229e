//! Template engine adapter.
//!
//! Templates live in the site's templates directory as `<name>.html` and are
//! rendered with a flat context. Referencing a variable that is not in the
//! context is an error, never an empty string.

use std::{fmt::Write, path::Path};

use folio_core::normalize::parse_time;
use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior, path_loader};
use thiserror::Error;

use crate::context::Context;

/// File suffix of template files.
pub const TEMPLATE_SUFFIX: &str = ".html";

/// Template errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template referenced a variable missing from its context.
    #[error("undefined variable in template {template}: {message}")]
    UndefinedVariable { template: String, message: String },

    /// No template file with this name.
    #[error("template not found: {0}")]
    NotFound(String),

    /// Syntax or evaluation error.
    #[error("error in template {template}: {message}")]
    Render { template: String, message: String },
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

impl TemplateError {
    fn from_engine(template: &str, err: &minijinja::Error) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::UndefinedError => Self::UndefinedVariable {
                template: template.to_string(),
                message,
            },
            ErrorKind::TemplateNotFound => Self::NotFound(template.to_string()),
            _ => Self::Render {
                template: template.to_string(),
                message,
            },
        }
    }
}

/// Registry of named templates backed by a template engine.
#[derive(Debug)]
pub struct TemplateRegistry {
    env: Environment<'static>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRegistry {
    /// Create a registry with no templates.
    #[must_use]
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_filter("strftime", strftime);
        Self { env }
    }

    /// Create a registry that loads `<name>.html` files from `dir` on demand.
    #[must_use]
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let mut registry = Self::new();
        registry
            .env
            .set_loader(path_loader(dir.as_ref().to_path_buf()));
        registry
    }

    /// Register a template from source.
    pub fn register(&mut self, name: &str, source: impl Into<String>) -> Result<()> {
        let file = template_file(name);
        self.env
            .add_template_owned(file.clone(), source.into())
            .map_err(|e| TemplateError::from_engine(&file, &e))
    }

    /// Render the named template. Surrounding whitespace is trimmed.
    pub fn render(&self, name: &str, context: &Context) -> Result<String> {
        let file = template_file(name);
        let template = self
            .env
            .get_template(&file)
            .map_err(|e| TemplateError::from_engine(&file, &e))?;

        template
            .render(context)
            .map(|out| out.trim().to_string())
            .map_err(|e| TemplateError::from_engine(&file, &e))
    }

    /// Render an inline template string, as used for `title_format`.
    pub fn render_str(&self, source: &str, context: &Context) -> Result<String> {
        self.env
            .render_str(source, context)
            .map(|out| out.trim().to_string())
            .map_err(|e| TemplateError::from_engine("<inline>", &e))
    }
}

fn template_file(name: &str) -> String {
    format!("{name}{TEMPLATE_SUFFIX}")
}

/// `{{ date | strftime("%d %B %Y") }}`
fn strftime(value: &str, format: &str) -> std::result::Result<String, minijinja::Error> {
    let invalid = |detail: String| minijinja::Error::new(ErrorKind::InvalidOperation, detail);

    let Some(time) = parse_time(value).map_err(|e| invalid(e.to_string()))? else {
        return Ok(String::new());
    };

    let mut out = String::new();
    write!(out, "{}", time.format(format))
        .map_err(|_| invalid(format!("invalid date format {format:?}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use minijinja::Value;

    use super::*;

    fn context(pairs: &[(&str, &str)]) -> Context {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), Value::from(*v)))
            .collect()
    }

    #[test]
    fn test_render_registered() {
        let mut registry = TemplateRegistry::new();
        registry
            .register("page", "\n<h1>{{ title }}</h1>\n")
            .unwrap();

        let html = registry
            .render("page", &context(&[("title", "Hello")]))
            .unwrap();
        assert_eq!(html, "<h1>Hello</h1>");
    }

    #[test]
    fn test_undefined_variable_names_template() {
        let mut registry = TemplateRegistry::new();
        registry.register("page", "{{ missing }}").unwrap();

        let err = registry.render("page", &Context::new()).unwrap_err();
        assert!(matches!(
            err,
            TemplateError::UndefinedVariable { ref template, .. } if template == "page.html"
        ));
        assert!(err.to_string().contains("page.html"));
    }

    #[test]
    fn test_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TemplateRegistry::from_dir(dir.path());

        let err = registry.render("nope", &Context::new()).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(ref name) if name == "nope.html"));
    }

    #[test]
    fn test_loads_from_dir_with_inheritance() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("base.html"),
            "<title>{% block title %}{% endblock %}</title>",
        )
        .unwrap();
        fs::write(
            dir.path().join("page.html"),
            "{% extends \"base.html\" %}{% block title %}{{ title }}{% endblock %}",
        )
        .unwrap();

        let registry = TemplateRegistry::from_dir(dir.path());
        let html = registry
            .render("page", &context(&[("title", "Hi")]))
            .unwrap();
        assert_eq!(html, "<title>Hi</title>");
    }

    #[test]
    fn test_html_is_not_escaped() {
        let mut registry = TemplateRegistry::new();
        registry.register("page", "{{ content }}").unwrap();

        let html = registry
            .render("page", &context(&[("content", "<p>a & b</p>")]))
            .unwrap();
        assert_eq!(html, "<p>a & b</p>");
    }

    #[test]
    fn test_render_str() {
        let registry = TemplateRegistry::new();
        let ctx = context(&[("title", "Post"), ("site_title", "Blog")]);
        let out = registry
            .render_str("{{ title }} | {{ site_title }}", &ctx)
            .unwrap();
        assert_eq!(out, "Post | Blog");
    }

    #[test]
    fn test_strftime_filter() {
        let registry = TemplateRegistry::new();
        let ctx = context(&[("date", "2019-03-14T09:30:00")]);
        let out = registry
            .render_str("{{ date | strftime('%d %B %Y') }}", &ctx)
            .unwrap();
        assert_eq!(out, "14 March 2019");
    }

    #[test]
    fn test_syntax_error() {
        let mut registry = TemplateRegistry::new();
        let result = registry.register("broken", "{% if %}");
        assert!(matches!(result, Err(TemplateError::Render { .. })));
    }
}
