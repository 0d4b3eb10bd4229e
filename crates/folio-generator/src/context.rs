//! Render context construction.
//!
//! A page is rendered with one flat mapping: the site configuration and
//! derived site values first, then the page's own attributes on top. Pages
//! referenced from a context (archive entries, previous/next links, helper
//! results) are handles that look their attributes up in the registry when a
//! template reads them, so cross-page links never need to be materialized.

use std::{collections::BTreeMap, sync::Arc};

use folio_core::{CoreError, Page, SiteConfig};
use minijinja::{
    Error, ErrorKind, Value,
    value::{Enumerator, Kwargs, Object, Rest},
};

use crate::{
    registry::{PageRegistry, Selection},
    template::{Result, TemplateRegistry},
};

/// Flat template context.
pub type Context = BTreeMap<String, Value>;

/// Attributes every page has.
const COMMON_KEYS: &[&str] = &["id", "title", "date", "posted", "template", "url"];

/// Attributes only content pages have.
const CONTENT_KEYS: &[&str] = &[
    "modified",
    "tags",
    "category",
    "summary",
    "content",
    "prevpost",
    "nextpost",
    "month_name",
];

/// Attributes only archive pages have.
const ARCHIVE_KEYS: &[&str] = &["entries", "year", "month"];

/// The finished site model, shared read-only by every render.
#[derive(Debug)]
pub struct SiteContext {
    config: SiteConfig,
    registry: PageRegistry,
    years: Vec<i32>,
}

impl SiteContext {
    /// Freeze the configuration and the fully derived registry.
    #[must_use]
    pub fn new(config: SiteConfig, registry: PageRegistry, years: Vec<i32>) -> Arc<Self> {
        Arc::new(Self {
            config,
            registry,
            years,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn registry(&self) -> &PageRegistry {
        &self.registry
    }

    /// Years with dated content, ascending.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Template a page renders with.
    pub fn template_for<'a>(&'a self, page: &'a Page) -> &'a str {
        let template = &page.meta().template;
        if template.is_empty() {
            &self.config.default_template
        } else {
            template
        }
    }
}

/// A page as seen from a template.
#[derive(Debug)]
struct PageHandle {
    site: Arc<SiteContext>,
    id: String,
}

impl Object for PageHandle {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let page = self.site.registry.get(&self.id).ok()?;
        page_attribute(&self.site, page, key.as_str()?)
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        match self.site.registry.get(&self.id) {
            Ok(page) => Enumerator::Values(page_keys(page).into_iter().map(Value::from).collect()),
            Err(_) => Enumerator::Empty,
        }
    }
}

fn page_ref(site: &Arc<SiteContext>, id: &str) -> Value {
    Value::from_object(PageHandle {
        site: Arc::clone(site),
        id: id.to_string(),
    })
}

fn link(site: &Arc<SiteContext>, id: Option<&str>) -> Value {
    id.map_or_else(|| Value::from(()), |id| page_ref(site, id))
}

fn time_value(time: Option<chrono::NaiveDateTime>) -> Value {
    time.map_or_else(
        || Value::from(()),
        |t| Value::from(t.format("%Y-%m-%dT%H:%M:%S").to_string()),
    )
}

/// Names of every attribute a page exposes.
fn page_keys(page: &Page) -> Vec<String> {
    let specific = match page {
        Page::Content(_) => CONTENT_KEYS,
        Page::Archive(_) => ARCHIVE_KEYS,
    };

    let mut keys: Vec<String> = page.meta().extra.keys().cloned().collect();
    for key in COMMON_KEYS.iter().chain(specific) {
        if !keys.iter().any(|k| k == key) {
            keys.push((*key).to_string());
        }
    }
    keys
}

/// One page attribute. Derived attributes shadow front-matter keys of the
/// same name.
fn page_attribute(site: &Arc<SiteContext>, page: &Page, key: &str) -> Option<Value> {
    let meta = page.meta();
    let value = match (key, page) {
        ("id", _) => Value::from(meta.id.as_str()),
        ("title", _) => Value::from(meta.title.as_str()),
        ("date", _) => time_value(meta.date),
        ("posted", _) => time_value(meta.posted.or(meta.date)),
        ("template", _) => Value::from(site.template_for(page)),
        ("url", _) => Value::from(site.config.page_url(&meta.id)),

        ("modified", Page::Content(p)) => time_value(p.modified),
        ("tags", Page::Content(p)) => Value::from(p.tags.clone()),
        ("category", Page::Content(p)) => Value::from(p.category.clone()),
        ("summary", Page::Content(p)) => Value::from(p.summary.as_str()),
        ("content", Page::Content(p)) => Value::from(p.content.as_str()),
        ("prevpost", Page::Content(p)) => link(site, p.prevpost.as_deref()),
        ("nextpost", Page::Content(p)) => link(site, p.nextpost.as_deref()),
        ("month_name", Page::Content(p)) => {
            p.month_name().map_or_else(|| Value::from(()), Value::from)
        }

        ("entries", Page::Archive(a)) => {
            Value::from(a.entries.iter().map(|id| page_ref(site, id)).collect::<Vec<_>>())
        }
        ("year", Page::Archive(a)) => Value::from(a.year),
        ("month", Page::Archive(a)) => Value::from(a.month.unwrap_or(0)),

        _ => return meta.extra.get(key).map(Value::from_serialize),
    };
    Some(value)
}

fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidOperation, message.into())
}

/// Builds the context each page is rendered with.
#[derive(Debug)]
pub struct RenderContextBuilder {
    site: Arc<SiteContext>,
    base: Context,
}

impl RenderContextBuilder {
    /// Prepare the site-wide part of every context.
    pub fn new(site: Arc<SiteContext>) -> std::result::Result<Self, CoreError> {
        let mut base = Context::new();

        if let serde_yaml::Value::Mapping(mapping) = serde_yaml::to_value(site.config())? {
            for (key, value) in &mapping {
                if let Some(key) = key.as_str() {
                    base.insert(key.to_string(), Value::from_serialize(value));
                }
            }
        }

        let config = site.config();
        base.insert("root".into(), Value::from(config.root()));
        base.insert("domain".into(), Value::from(config.domain()));
        base.insert("head_title".into(), Value::from(config.site_title.as_str()));
        base.insert("years".into(), Value::from(site.years().to_vec()));
        base.insert(
            "default_template".into(),
            Value::from(config.default_template.as_str()),
        );

        base.insert("get".into(), get_function(&site));
        base.insert("pages".into(), pages_function(&site));
        base.insert("join_url".into(), join_url_function(&site));

        Ok(Self { site, base })
    }

    pub fn site(&self) -> &Arc<SiteContext> {
        &self.site
    }

    /// Context for one page: site values, then page attributes, then the
    /// page's `head_title` when it has a title.
    pub fn build(&self, page: &Page, templates: &TemplateRegistry) -> Result<Context> {
        let mut context = self.base.clone();

        for key in page_keys(page) {
            if let Some(value) = page_attribute(&self.site, page, &key) {
                context.insert(key, value);
            }
        }

        if !page.meta().title.is_empty() {
            let head_title = templates.render_str(&self.site.config.title_format, &context)?;
            context.insert("head_title".into(), Value::from(head_title));
        }

        Ok(context)
    }
}

/// `get(id)`: the page with this id.
fn get_function(site: &Arc<SiteContext>) -> Value {
    let site = Arc::clone(site);
    Value::from_function(move |id: String| -> std::result::Result<Value, Error> {
        site.registry
            .get(&id)
            .map(|_| page_ref(&site, &id))
            .map_err(|e| invalid(e.to_string()))
    })
}

/// `pages(limit, dated, chronological, sort_by_origin)`: a page listing.
/// Arguments may be given by position or by keyword.
fn pages_function(site: &Arc<SiteContext>) -> Value {
    let site = Arc::clone(site);
    Value::from_function(
        move |limit: Option<usize>,
              dated: Option<bool>,
              chronological: Option<bool>,
              sort_by_origin: Option<bool>,
              kwargs: Kwargs|
              -> std::result::Result<Value, Error> {
            let selection = Selection {
                limit: either(limit, kwargs.get("limit")?, "limit")?,
                dated: either(dated, kwargs.get("dated")?, "dated")?.unwrap_or(true),
                chronological: either(
                    chronological,
                    kwargs.get("chronological")?,
                    "chronological",
                )?
                .unwrap_or(false),
                sort_by_origin: either(
                    sort_by_origin,
                    kwargs.get("sort_by_origin")?,
                    "sort_by_origin",
                )?,
            };
            kwargs.assert_all_used()?;

            let pages: Vec<Value> = site
                .registry
                .select(&selection)
                .into_iter()
                .map(|page| page_ref(&site, page.id()))
                .collect();
            Ok(Value::from(pages))
        },
    )
}

/// A helper argument given by position or by keyword, not both.
fn either<T>(
    positional: Option<T>,
    keyword: Option<T>,
    name: &str,
) -> std::result::Result<Option<T>, Error> {
    match (positional, keyword) {
        (Some(_), Some(_)) => Err(invalid(format!("argument {name} given twice"))),
        (positional, keyword) => Ok(positional.or(keyword)),
    }
}

/// `join_url(*parts, ext=true)`: a site URL. Empty parts are skipped.
fn join_url_function(site: &Arc<SiteContext>) -> Value {
    let site = Arc::clone(site);
    Value::from_function(
        move |parts: Rest<Value>, kwargs: Kwargs| -> std::result::Result<String, Error> {
            let ext = kwargs.get::<Option<bool>>("ext")?.unwrap_or(true);
            kwargs.assert_all_used()?;

            let parts: Vec<String> = parts
                .iter()
                .filter(|part| part.is_true())
                .map(ToString::to_string)
                .collect();
            Ok(site.config.join_url(&parts, ext))
        },
    )
}

#[cfg(test)]
mod tests {
    use folio_core::{ArchivePage, ContentPage, PageMeta, normalize::parse_time};

    use super::*;
    use crate::archive::ArchiveBuilder;

    fn post(id: &str, title: &str, date: &str) -> ContentPage {
        ContentPage {
            meta: PageMeta {
                title: title.to_string(),
                date: parse_time(date).unwrap(),
                template: "entry".to_string(),
                ..PageMeta::new(id)
            },
            content: format!("<p>{title}</p>"),
            ..ContentPage::default()
        }
    }

    fn site(yaml: &str) -> Arc<SiteContext> {
        let config = SiteConfig::from_yaml(yaml).unwrap();
        let mut registry = PageRegistry::new();
        registry.add(post("2020/a", "Alpha", "2020-01-01")).unwrap();
        registry.add(post("2020/b", "Beta", "2020-02-01")).unwrap();
        registry.add(post("2020/c", "Gamma", "2020-03-01")).unwrap();

        let mut about = ContentPage {
            meta: PageMeta::new("about"),
            ..ContentPage::default()
        };
        about
            .meta
            .extra
            .insert("subtitle".to_string(), serde_yaml::Value::from("Me"));
        registry.add(about).unwrap();

        let years = ArchiveBuilder::new(false).derive(&mut registry).unwrap();
        SiteContext::new(config, registry, years)
    }

    fn render(site: &Arc<SiteContext>, id: &str, source: &str) -> String {
        let mut templates = TemplateRegistry::new();
        templates.register("t", source).unwrap();
        let builder = RenderContextBuilder::new(Arc::clone(site)).unwrap();
        let page = site.registry().get(id).unwrap();
        let context = builder.build(page, &templates).unwrap();
        templates.render("t", &context).unwrap()
    }

    #[test]
    fn test_site_values() {
        let site = site("site_title: Blog\ndomain: https://example.com/\nauthor: Ada\n");
        let out = render(
            &site,
            "about",
            "{{ site_title }}|{{ domain }}|{{ root }}|{{ author }}|{{ years }}",
        );
        assert_eq!(out, "Blog|https://example.com|/|Ada|[2020]");
    }

    #[test]
    fn test_page_values_override_site() {
        let site = site("title: Site Level\n");
        let out = render(&site, "2020/a", "{{ title }}");
        assert_eq!(out, "Alpha");
    }

    #[test]
    fn test_extra_frontmatter_keys() {
        let site = site("");
        let out = render(&site, "about", "{{ subtitle }} {{ template }}");
        assert_eq!(out, "Me page");
    }

    #[test]
    fn test_head_title() {
        let site = site("site_title: Blog\n");
        assert_eq!(render(&site, "2020/a", "{{ head_title }}"), "Alpha | Blog");
        assert_eq!(render(&site, "about", "{{ head_title }}"), "Blog");
    }

    #[test]
    fn test_prev_next_links() {
        let site = site("");
        let source = "{{ prevpost.title if prevpost else '-' }} {{ nextpost.url if nextpost else '-' }}";
        assert_eq!(render(&site, "2020/a", source), "- /2020/b.html");
        assert_eq!(render(&site, "2020/b", source), "Alpha /2020/c.html");
        assert_eq!(render(&site, "2020/c", source), "Beta -");
    }

    #[test]
    fn test_archive_entries() {
        let site = site("");
        let out = render(
            &site,
            "2020",
            "{{ year }}/{{ month }}:{% for e in entries %} {{ e.title }}{% endfor %}",
        );
        assert_eq!(out, "2020/0: Alpha Beta Gamma");
    }

    #[test]
    fn test_get_function() {
        let site = site("");
        assert_eq!(render(&site, "about", "{{ get('2020/b').content }}"), "<p>Beta</p>");

        let mut templates = TemplateRegistry::new();
        templates.register("t", "{{ get('missing').title }}").unwrap();
        let builder = RenderContextBuilder::new(Arc::clone(&site)).unwrap();
        let context = builder
            .build(site.registry().get("about").unwrap(), &templates)
            .unwrap();
        let err = templates.render("t", &context).unwrap_err();
        assert!(err.to_string().contains("page not found"));
    }

    #[test]
    fn test_pages_function() {
        let site = site("");
        let newest = render(
            &site,
            "about",
            "{% for p in pages(limit=2) %}{{ p.id }} {% endfor %}",
        );
        assert_eq!(newest, "2020/c 2020/b");

        let oldest = render(
            &site,
            "about",
            "{% for p in pages(chronological=true) %}{{ p.id }} {% endfor %}",
        );
        assert_eq!(oldest, "2020/a 2020/b 2020/c");
    }

    #[test]
    fn test_pages_positional_arguments() {
        let site = site("");
        assert_eq!(
            render(&site, "about", "{% for p in pages(1) %}{{ p.id }}{% endfor %}"),
            "2020/c"
        );
        assert_eq!(
            render(
                &site,
                "about",
                "{% for p in pages(2, true, true) %}{{ p.id }} {% endfor %}"
            ),
            "2020/a 2020/b"
        );
        assert_eq!(
            render(
                &site,
                "about",
                "{% for p in pages(none, false, chronological=true) %}{{ p.id }} {% endfor %}"
            ),
            "2020 about 2020/a 2020/b 2020/c"
        );
    }

    #[test]
    fn test_pages_argument_given_twice() {
        let site = site("");
        let mut templates = TemplateRegistry::new();
        templates.register("t", "{{ pages(1, limit=2) }}").unwrap();
        let builder = RenderContextBuilder::new(Arc::clone(&site)).unwrap();
        let context = builder
            .build(site.registry().get("about").unwrap(), &templates)
            .unwrap();

        let err = templates.render("t", &context).unwrap_err();
        assert!(err.to_string().contains("limit given twice"));
    }

    #[test]
    fn test_join_url_function() {
        let site = site("root: /blog/\n");
        assert_eq!(
            render(&site, "about", "{{ join_url('tags', 'rust') }}"),
            "/blog/tags/rust.html"
        );
        assert_eq!(
            render(&site, "about", "{{ join_url('feed.xml', ext=false) }}"),
            "/blog/feed.xml"
        );
    }

    #[test]
    fn test_clean_urls() {
        let site = site("clean_urls: true\n");
        assert_eq!(render(&site, "2020/a", "{{ url }}"), "/2020/a");
    }

    #[test]
    fn test_page_handle_enumerates_keys() {
        let site = site("");
        let out = render(
            &site,
            "about",
            "{% for key in get('2020') %}{% if key == 'entries' %}yes{% endif %}{% endfor %}",
        );
        assert_eq!(out, "yes");
    }

    #[test]
    fn test_template_for_default() {
        let site = site("default_template: plain\n");
        let about = site.registry().get("about").unwrap();
        assert_eq!(site.template_for(about), "plain");

        let archive = Page::from(ArchivePage::new(Vec::new(), 2021, None));
        assert_eq!(site.template_for(&archive), "archive_year");
    }
}
