//! Markdown rendering using pulldown-cmark.

use pulldown_cmark::{Options, Parser, html};

/// Markdown to HTML renderer with the site's extension set enabled.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    /// Create a new renderer with default options.
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self { options }
    }

    /// Render Markdown text to an HTML fragment.
    pub fn render(&self, text: &str) -> String {
        let parser = Parser::new_ext(text, self.options);
        let mut out = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

/// The first `<p>…</p>` block of an HTML fragment, if there is one.
pub fn first_paragraph(html: &str) -> Option<&str> {
    let start = html.find("<p>")?;
    let end = html[start..].find("</p>")? + start + "</p>".len();
    Some(&html[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_paragraph() {
        let html = MarkdownRenderer::new().render("Hello *world*");
        assert_eq!(html.trim(), "<p>Hello <em>world</em></p>");
    }

    #[test]
    fn test_render_heading_and_list() {
        let html = MarkdownRenderer::new().render("# Title\n\n- a\n- b\n");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<li>a</li>"));
    }

    #[test]
    fn test_render_table() {
        let html = MarkdownRenderer::new().render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_render_passes_inline_html() {
        let html = MarkdownRenderer::new().render("a <span>b</span>");
        assert!(html.contains("<span>b</span>"));
    }

    #[test]
    fn test_first_paragraph() {
        let html = "<h1>x</h1>\n<p>one</p>\n<p>two</p>\n";
        assert_eq!(first_paragraph(html), Some("<p>one</p>"));
        assert_eq!(first_paragraph("<h1>x</h1>"), None);
    }
}
