//! Content file parsing.
//!
//! Turns one source file into a [`ContentPage`]: provisional id from the file
//! name, front matter normalized key by key, body rendered to HTML with an
//! optional `<summary>` excerpt, and the dated-page id/template rewrite.

use std::{fs, path::Path, time::SystemTime};

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use folio_core::{
    ContentPage, CoreError, PageMeta,
    normalize::{join_path, norm_key, norm_tags, norm_time},
};
use serde_yaml::Value;
use tracing::debug;

use crate::{
    Result,
    frontmatter::{parse_frontmatter, split_frontmatter},
    markdown::{MarkdownRenderer, first_paragraph},
};

/// Template assigned to dated pages that do not name one.
pub const DATED_TEMPLATE: &str = "entry";

const SUMMARY_OPEN: &str = "<summary>";
const SUMMARY_CLOSE: &str = "</summary>";

/// A normalized front-matter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Time(Option<NaiveDateTime>),
    Tokens(Vec<String>),
    Html(String),
    Raw(Value),
}

impl Field {
    fn into_value(self) -> Value {
        match self {
            Self::Time(t) => t.map_or(Value::Null, |t| Value::String(t.to_string())),
            Self::Tokens(tokens) => {
                Value::Sequence(tokens.into_iter().map(Value::String).collect())
            }
            Self::Html(html) => Value::String(html),
            Self::Raw(value) => value,
        }
    }
}

type Normalizer = fn(&Value, &MarkdownRenderer) -> folio_core::Result<Field>;

/// Per-key normalizers; keys not listed pass through as [`Field::Raw`].
const NORMALIZERS: &[(&str, Normalizer)] = &[
    ("date", time_field),
    ("posted", time_field),
    ("tags", token_field),
    ("category", token_field),
    ("summary", summary_field),
];

fn time_field(value: &Value, _: &MarkdownRenderer) -> folio_core::Result<Field> {
    Ok(Field::Time(norm_time(value)?))
}

fn token_field(value: &Value, _: &MarkdownRenderer) -> folio_core::Result<Field> {
    Ok(Field::Tokens(norm_tags(value)))
}

fn summary_field(value: &Value, markdown: &MarkdownRenderer) -> folio_core::Result<Field> {
    Ok(Field::Html(markdown.render(&scalar_string(value))))
}

fn raw_field(value: &Value, _: &MarkdownRenderer) -> folio_core::Result<Field> {
    Ok(Field::Raw(value.clone()))
}

/// Look up the normalizer registered for a canonical key.
pub fn normalizer_for(key: &str) -> Normalizer {
    NORMALIZERS
        .iter()
        .find(|(name, _)| *name == key)
        .map_or(raw_field as Normalizer, |(_, f)| *f)
}

/// Text of a scalar value; non-scalars become their YAML form.
fn scalar_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Parser for content files.
#[derive(Debug, Default)]
pub struct ContentParser {
    markdown: MarkdownRenderer,
}

impl ContentParser {
    /// Create a parser with the default Markdown renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse a file from disk, taking its last write time as `modified`.
    pub fn parse_file(&self, path: &Path) -> Result<ContentPage> {
        let text = fs::read_to_string(path)?;
        let modified = fs::metadata(path)?.modified().ok().map(system_time);
        self.parse(path, &text, modified)
    }

    /// Parse file contents. `path` supplies the provisional id and error context.
    pub fn parse(
        &self,
        path: &Path,
        text: &str,
        modified: Option<NaiveDateTime>,
    ) -> Result<ContentPage> {
        debug!(path = %path.display(), "parsing content");

        let basename = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let text = text.replace("\r\n", "\n");
        let (head, body) = split_frontmatter(&text);
        let frontmatter = parse_frontmatter(head, path)?;

        let mut page = ContentPage {
            meta: PageMeta::new(basename.clone()),
            source: path.to_path_buf(),
            modified,
            ..ContentPage::default()
        };

        for (key, value) in &frontmatter {
            let key = norm_key(&scalar_string(key));
            let field = normalizer_for(&key)(value, &self.markdown)
                .map_err(|e| CoreError::frontmatter(path, format!("{key}: {e}")))?;
            assign(&mut page, &key, field);
        }

        let (body, marked_summary) = unwrap_summary(body);
        page.content = self.markdown.render(body.trim());

        if let Some(summary) = marked_summary {
            page.summary = self.markdown.render(&summary);
        } else if page.summary.is_empty() {
            page.summary = first_paragraph(&page.content)
                .unwrap_or_default()
                .to_string();
        }

        if let Some(date) = page.meta.date {
            page.meta.id = join_path(&[date.year().to_string(), basename], false, false);
            if page.meta.template.is_empty() {
                page.meta.template = DATED_TEMPLATE.to_string();
            }
        }

        Ok(page)
    }
}

/// Store a normalized field on the page under its canonical key.
fn assign(page: &mut ContentPage, key: &str, field: Field) {
    match (key, field) {
        ("date", Field::Time(t)) => page.meta.date = t,
        ("posted", Field::Time(t)) => page.meta.posted = t,
        ("tags", Field::Tokens(t)) => page.tags = t,
        ("category", Field::Tokens(t)) => page.category = t,
        ("summary", Field::Html(html)) => page.summary = html,
        ("title", Field::Raw(v)) => page.meta.title = scalar_string(&v),
        ("template", Field::Raw(v)) => page.meta.template = scalar_string(&v),
        ("id", Field::Raw(v)) if !scalar_string(&v).is_empty() => {
            page.meta.id = scalar_string(&v);
        }
        (_, field) => {
            page.meta.extra.insert(key.to_string(), field.into_value());
        }
    }
}

/// Replace each `<summary>…</summary>` with its trimmed text. Also returns
/// the text of the last marker. An unclosed marker is left as is.
fn unwrap_summary(body: &str) -> (String, Option<String>) {
    let mut out = String::with_capacity(body.len());
    let mut summary = None;
    let mut rest = body;

    while let Some(start) = rest.find(SUMMARY_OPEN) {
        let inner_start = start + SUMMARY_OPEN.len();
        let Some(len) = rest[inner_start..].find(SUMMARY_CLOSE) else {
            break;
        };
        let inner = rest[inner_start..inner_start + len].trim();

        out.push_str(&rest[..start]);
        out.push_str(inner);
        summary = Some(inner.to_string());
        rest = &rest[inner_start + len + SUMMARY_CLOSE.len()..];
    }

    out.push_str(rest);
    (out, summary)
}

fn system_time(time: SystemTime) -> NaiveDateTime {
    DateTime::<Utc>::from(time).naive_utc()
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;

    use super::*;
    use crate::ParseError;

    fn parse(name: &str, text: &str) -> ContentPage {
        ContentParser::new()
            .parse(Path::new(name), text, None)
            .unwrap()
    }

    #[test]
    fn test_undated_page() {
        let page = parse("content/about.md", "title: About\n\nHello there.");

        assert_eq!(page.meta.id, "about");
        assert_eq!(page.meta.title, "About");
        assert!(page.meta.template.is_empty());
        assert_eq!(page.content.trim(), "<p>Hello there.</p>");
    }

    #[test]
    fn test_dated_page_id_and_template() {
        let page = parse("content/my-post.md", "title: Post\ndate: 2019-03-14\n\nBody");

        assert_eq!(page.meta.id, "2019/my-post");
        assert_eq!(page.meta.template, "entry");
        assert!(page.meta.posted.is_none());
        assert_eq!(page.month_name().as_deref(), Some("March"));
    }

    #[test]
    fn test_dated_page_keeps_explicit_template() {
        let page = parse("post.md", "date: 2019-03-14\ntemplate: photo\n\nBody");
        assert_eq!(page.meta.id, "2019/post");
        assert_eq!(page.meta.template, "photo");
    }

    #[test]
    fn test_keys_are_canonicalized() {
        let page = parse("p.md", "Title: Hi\nPosted: 2020-02-02 10:30\nCover-Image: x.png\n\nB");

        assert_eq!(page.meta.title, "Hi");
        assert_eq!(page.meta.posted.map(|p| p.hour()), Some(10));
        assert_eq!(
            page.meta.extra.get("cover_image"),
            Some(&Value::String("x.png".to_string()))
        );
    }

    #[test]
    fn test_tags_and_category() {
        let page = parse("p.md", "tags: rust, web,, rust\ncategory: notes misc\n\nB");

        assert_eq!(page.tags, vec!["rust", "web", "rust"]);
        assert_eq!(page.category, vec!["notes", "misc"]);
    }

    #[test]
    fn test_summary_marker() {
        let text = "title: T\n\nIntro <summary>The *gist*.</summary> and more.";
        let page = parse("p.md", text);

        assert_eq!(page.summary.trim(), "<p>The <em>gist</em>.</p>");
        assert!(!page.content.contains("<summary>"));
        assert!(page.content.contains("The <em>gist</em>. and more."));
    }

    #[test]
    fn test_unwrap_summary() {
        let (body, summary) = unwrap_summary("a <summary> one </summary> b <summary>two</summary>");
        assert_eq!(body, "a one b two");
        assert_eq!(summary.as_deref(), Some("two"));

        let (body, summary) = unwrap_summary("open <summary>never closed");
        assert_eq!(body, "open <summary>never closed");
        assert!(summary.is_none());
    }

    #[test]
    fn test_frontmatter_summary() {
        let page = parse("p.md", "summary: Short **one**\n\nLong body.");
        assert_eq!(page.summary.trim(), "<p>Short <strong>one</strong></p>");
    }

    #[test]
    fn test_derived_summary() {
        let page = parse("p.md", "title: T\n\nFirst.\n\nSecond.");
        assert_eq!(page.summary, "<p>First.</p>");
    }

    #[test]
    fn test_no_blank_line_means_no_frontmatter() {
        let page = parse("note.md", "title: not front matter");
        assert!(page.meta.title.is_empty());
        assert!(page.content.contains("title: not front matter"));
    }

    #[test]
    fn test_frontmatter_id_override() {
        let page = parse("home.md", "id: index\n\nWelcome");
        assert_eq!(page.meta.id, "index");
    }

    #[test]
    fn test_crlf_line_endings() {
        let page = parse("p.md", "title: Win\r\n\r\nBody\r\n");
        assert_eq!(page.meta.title, "Win");
        assert_eq!(page.content.trim(), "<p>Body</p>");
    }

    #[test]
    fn test_malformed_frontmatter_is_error() {
        let result = ContentParser::new().parse(Path::new("bad.md"), "- a\n- b\n\nbody", None);
        assert!(matches!(result, Err(ParseError::Core(_))));
        assert!(result.unwrap_err().to_string().contains("bad.md"));
    }

    #[test]
    fn test_bad_date_is_error() {
        let result = ContentParser::new().parse(Path::new("p.md"), "date: whenever\n\nB", None);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("p.md"));
        assert!(message.contains("whenever"));
    }

    #[test]
    fn test_parse_file_records_modified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.md");
        fs::write(&path, "title: Hello\n\nWorld").unwrap();

        let page = ContentParser::new().parse_file(&path).unwrap();
        assert_eq!(page.meta.id, "hello");
        assert!(page.modified.is_some());
        assert_eq!(page.source, path);
    }

    #[test]
    fn test_normalizer_table() {
        let markdown = MarkdownRenderer::new();
        let value = Value::String("a b".to_string());

        assert_eq!(
            normalizer_for("tags")(&value, &markdown).unwrap(),
            Field::Tokens(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(
            normalizer_for("subtitle")(&value, &markdown).unwrap(),
            Field::Raw(value.clone())
        );
    }
}
