//! Site configuration management.
//!
//! Configuration is built from embedded defaults overlaid by the site's
//! `site.yml`. Top-level keys are canonicalized with [`norm_key`]; nested
//! mappings merge key by key, everything else overwrites.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use crate::{
    error::{CoreError, Result},
    normalize::{join_path, norm_key},
};

/// Name of the configuration file at the site root.
pub const CONFIG_FILE: &str = "site.yml";

/// Built-in defaults every site starts from.
pub const DEFAULT_CONFIG: &str = r#"
clean_urls: false
content_extensions: [text, markdown, mkdn, md]
dirs:
  content: content
  deploy: deploy
  files: files
  templates: templates
files_exclude: "(^\\.|~$)"
files_include: "^\\.htaccess$"
files_rename:
  .less: .css
files_transform:
  .less: "lessc {src} {dest}"
"#;

/// Static site configuration, read-only for the rest of the build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Omit `.html` from page URLs.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub clean_urls: bool,

    /// Extensions (without dot) of files treated as content.
    pub content_extensions: Vec<String>,

    /// Site directory layout.
    pub dirs: DirsConfig,

    /// Asset file names matching this pattern from their first character
    /// are skipped...
    pub files_exclude: String,

    /// ...unless they also match this one.
    pub files_include: String,

    /// Destination extension substitutions, e.g. `.less` to `.css`.
    #[serde(default)]
    pub files_rename: BTreeMap<String, String>,

    /// External commands keyed by source extension. `{src}` and `{dest}`
    /// are replaced with the file paths.
    #[serde(default)]
    pub files_transform: BTreeMap<String, String>,

    /// URL prefix every page lives under.
    #[serde(default = "default_root")]
    pub root: String,

    /// Public host of the site, e.g. `https://example.com`.
    #[serde(default)]
    pub domain: String,

    /// Site title, also the fallback `head_title`.
    #[serde(default)]
    pub site_title: String,

    /// Template string used to derive `head_title` for titled pages.
    #[serde(default = "default_title_format")]
    pub title_format: String,

    /// Template used by pages that do not name one.
    #[serde(default = "default_template")]
    pub default_template: String,

    /// Generate one archive page per month besides the yearly ones.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub archive_months: bool,

    /// Every other key, handed to templates unchanged.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Directory layout, relative to the site root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirsConfig {
    pub content: PathBuf,
    pub deploy: PathBuf,
    pub files: PathBuf,
    pub templates: PathBuf,
}

fn default_root() -> String {
    "/".to_string()
}

fn default_title_format() -> String {
    "{{ title }} | {{ site_title }}".to_string()
}

fn default_template() -> String {
    "page".to_string()
}

/// Accept YAML 1.1 style switches (`yes`, `no`, `on`, `off`) as well as booleans.
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Null => Ok(false),
        Value::String(s) => match s.to_lowercase().as_str() {
            "yes" | "y" | "on" | "true" => Ok(true),
            "no" | "n" | "off" | "false" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!("not a yes/no value: {other}"))),
        },
        other => Err(serde::de::Error::custom(format!(
            "not a yes/no value: {other:?}"
        ))),
    }
}

/// Compile a file-name pattern.
pub fn file_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| CoreError::config_with_source(format!("invalid pattern {pattern:?}"), e))
}

/// Overlay `overlay` onto `base`. Mappings merge recursively, anything else replaces.
fn merge_value(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Canonicalize the top-level keys of a config mapping.
fn canonical_keys(mapping: Mapping) -> Mapping {
    let mut out = Mapping::with_capacity(mapping.len());
    for (key, value) in mapping {
        match key {
            Value::String(key) => {
                out.insert(Value::String(norm_key(&key)), value);
            }
            other => warn!(key = ?other, "ignoring non-string config key"),
        }
    }
    out
}

impl SiteConfig {
    /// Load `site.yml` from the site root on top of the defaults.
    pub fn load(site_root: &Path) -> Result<Self> {
        let path = site_root.join(CONFIG_FILE);
        if !path.is_file() {
            return Err(CoreError::config(format!("{} not found", path.display())));
        }

        debug!(path = %path.display(), "loading site config");
        let content = fs::read_to_string(&path)?;
        Self::from_yaml(&content).map_err(|e| match e {
            CoreError::Yaml(source) => CoreError::config_with_source(
                format!("failed to parse {}: {source}", path.display()),
                source,
            ),
            other => other,
        })
    }

    /// Build a configuration from YAML text overlaid on the defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let mut merged: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        match serde_yaml::from_str::<Value>(text)? {
            Value::Mapping(overlay) => {
                merge_value(&mut merged, Value::Mapping(canonical_keys(overlay)));
            }
            Value::Null => {}
            other => {
                return Err(CoreError::config(format!(
                    "{CONFIG_FILE} must be a mapping, found {other:?}"
                )));
            }
        }

        let config: SiteConfig = serde_yaml::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    /// The configuration with nothing but the defaults.
    pub fn defaults() -> Result<Self> {
        Self::from_yaml("")
    }

    fn validate(&self) -> Result<()> {
        file_pattern(&self.files_exclude)?;
        file_pattern(&self.files_include)?;

        if self.default_template.is_empty() {
            return Err(CoreError::config("default_template cannot be empty"));
        }

        if self.domain.ends_with('/') {
            debug!("domain has a trailing slash, it will be trimmed");
        }

        Ok(())
    }

    /// URL prefix with exactly one leading slash.
    pub fn root(&self) -> String {
        format!("/{}", self.root.trim_start_matches('/'))
    }

    /// Domain without trailing slash.
    pub fn domain(&self) -> &str {
        self.domain.trim_end_matches('/')
    }

    /// Join path segments under the site root, honouring clean URLs.
    pub fn join_url<S: AsRef<str>>(&self, parts: &[S], ext: bool) -> String {
        let root = self.root();
        let mut all: Vec<&str> = Vec::with_capacity(parts.len() + 1);
        all.push(&root);
        all.extend(parts.iter().map(AsRef::as_ref));
        join_path(&all, ext, self.clean_urls)
    }

    /// Public URL of the page with the given id. The `index` page is the root.
    pub fn page_url(&self, id: &str) -> String {
        if id == "index" {
            self.root()
        } else {
            self.join_url(&[id], true)
        }
    }

    /// Content extensions without a leading dot, whichever way they were written.
    pub fn content_exts(&self) -> Vec<String> {
        self.content_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SiteConfig::defaults().unwrap();

        assert!(!config.clean_urls);
        assert_eq!(config.content_extensions, vec!["text", "markdown", "mkdn", "md"]);
        assert_eq!(config.dirs.deploy, PathBuf::from("deploy"));
        assert_eq!(config.files_rename.get(".less").map(String::as_str), Some(".css"));
        assert_eq!(config.root(), "/");
        assert_eq!(config.default_template, "page");
        assert!(!config.archive_months);
    }

    #[test]
    fn test_nested_mapping_merges() {
        let config = SiteConfig::from_yaml("dirs:\n  deploy: public\n").unwrap();

        assert_eq!(config.dirs.deploy, PathBuf::from("public"));
        assert_eq!(config.dirs.content, PathBuf::from("content"));
        assert_eq!(config.dirs.templates, PathBuf::from("templates"));
    }

    #[test]
    fn test_scalar_overwrites_and_keys_normalize() {
        let yaml = "Site Title: My Site\nclean-urls: yes\ncontent_extensions: [md]\n";
        let config = SiteConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.site_title, "My Site");
        assert!(config.clean_urls);
        assert_eq!(config.content_extensions, vec!["md"]);
    }

    #[test]
    fn test_extra_keys_kept() {
        let config = SiteConfig::from_yaml("Author Name: Ada\n").unwrap();
        assert_eq!(
            config.extra.get("author_name"),
            Some(&Value::String("Ada".to_string()))
        );
    }

    #[test]
    fn test_non_mapping_rejected() {
        let result = SiteConfig::from_yaml("- a\n- b\n");
        assert!(matches!(result, Err(CoreError::Config { .. })));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let result = SiteConfig::from_yaml("files_exclude: '(unclosed'\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_site_root() {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(dir.path().join(CONFIG_FILE), "domain: https://example.com/\n")
            .expect("write");

        let config = SiteConfig::load(dir.path()).expect("load config");
        assert_eq!(config.domain(), "https://example.com");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let result = SiteConfig::load(dir.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_join_url_clean_and_verbose() {
        let verbose = SiteConfig::defaults().unwrap();
        assert_eq!(verbose.join_url(&["blog", "post"], true), "/blog/post.html");
        assert_eq!(verbose.join_url(&["blog", "post"], false), "/blog/post");

        let clean = SiteConfig::from_yaml("clean_urls: yes").unwrap();
        assert_eq!(clean.join_url(&["blog", "post"], true), "/blog/post");
    }

    #[test]
    fn test_page_url() {
        let config = SiteConfig::from_yaml("root: blog").unwrap();
        assert_eq!(config.root(), "/blog");
        assert_eq!(config.page_url("index"), "/blog");
        assert_eq!(config.page_url("2019/post"), "/blog/2019/post.html");
    }

    #[test]
    fn test_content_exts_strip_dot() {
        let config = SiteConfig::from_yaml("content_extensions: [.md, text]\n").unwrap();
        assert_eq!(config.content_exts(), vec!["md", "text"]);
    }

    #[test]
    fn test_file_pattern() {
        let exclude = file_pattern("(^\\.|~$)").unwrap();
        assert!(exclude.is_match(".htaccess"));
        assert!(exclude.is_match("notes.txt~"));
        assert!(!exclude.is_match("style.css"));
    }
}
