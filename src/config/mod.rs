//! Site configuration management for `config.yaml`.
//!
//! # Sections
//!
//! | Key           | Purpose                                                 |
//! |---------------|---------------------------------------------------------|
//! | `languages`   | Ordered language list (required)                        |
//! | `dataSources` | Per-language data merged into every page (required)     |
//! | `collections` | Per-language item groups, one page per item             |
//! | `bundles`     | Language-agnostic files written to the output root      |
//! | `build`       | Directory layout                                        |
//! | `serve`       | Development server (port, interface, watch)             |
//!
//! # Example
//!
//! ```yaml
//! languages:
//!   - code: en
//!     name: English
//!   - code: fr
//!     name: Français
//!
//! dataSources:
//!   index:
//!     file: ${lang}.index.yaml
//!     fallback:
//!       title: Untitled
//!
//! bundles:
//!   - 404.html
//! ```
//!
//! A `.toml` config file is read with the same schema.

mod build;
pub mod defaults;
mod error;
mod serve;
mod site;

pub use error::ConfigError;
pub use site::{Collection, DataSource, Language, localize};

use build::BuildConfig;
use serve::ServeConfig;

use crate::cli::{Cli, Commands};
use crate::utils::path::normalize_path;
use educe::Educe;
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Directory under the output root that holds processed assets.
pub const ASSETS_OUTPUT_DIR: &str = "assets";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing config.yaml.
///
/// Loaded once per process, then shared as `&'static SiteConfig`.
/// Unknown top-level keys are ignored.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Languages, in declaration order.
    #[serde(default)]
    pub languages: Vec<Language>,

    /// Data sources, in declaration order. Order decides key shadowing.
    #[serde(default, rename = "dataSources")]
    pub data_sources: IndexMap<String, DataSource>,

    /// Collections, in declaration order.
    #[serde(default)]
    pub collections: IndexMap<String, Collection>,

    /// Bundle file patterns, relative to the source directory.
    #[serde(default)]
    pub bundles: Vec<String>,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from a YAML string (no validation).
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse configuration from a TOML string (no validation).
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a config file; the extension picks the format.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content)?,
            _ => Self::from_yaml(&content)?,
        };
        config.config_path = normalize_path(path);
        Ok(config)
    }

    /// Read, parse and validate a config file.
    ///
    /// This is the only way a build obtains its configuration; any error
    /// here aborts the process before output is touched.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::from_path(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Language codes in declaration order.
    pub fn language_codes(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(|l| l.code.as_str())
    }

    /// Output directory of one language.
    pub fn lang_output(&self, lang: &str) -> PathBuf {
        self.build.output.join(lang)
    }

    /// Output directory for processed assets.
    pub fn assets_output(&self) -> PathBuf {
        self.build.output.join(ASSETS_OUTPUT_DIR)
    }

    /// Update configuration with CLI arguments and normalize all paths.
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let mut root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());

        Self::update_option(&mut self.build.source, cli.source.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        match &cli.command {
            Commands::Build { build_args } => self.build.prod = build_args.prod,
            Commands::Serve {
                build_args,
                interface,
                port,
                watch,
            } => {
                self.build.prod = build_args.prod;
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.watch, watch.as_ref());
            }
            Commands::Init { name, .. } => {
                if let Some(name) = name {
                    root = root.join(name);
                }
            }
        }

        self.update_path_with_root(&root);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve every directory against the root and make it absolute.
    pub fn update_path_with_root(&mut self, root: &Path) {
        let root = normalize_path(root);
        self.set_root(&root);

        let build = &mut self.build;
        build.source = normalize_path(&root.join(&build.source));
        build.output = normalize_path(&root.join(&build.output));
        build.templates = normalize_path(&build.source.join(&build.templates));
        build.data = normalize_path(&build.source.join(&build.data));
        build.assets = normalize_path(&build.source.join(&build.assets));
    }

    /// Validate the declarations every build depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.languages.is_empty() {
            return Err(ConfigError::Missing("languages"));
        }
        if self.data_sources.is_empty() {
            return Err(ConfigError::Missing("dataSources"));
        }

        let mut codes = FxHashSet::default();
        for lang in &self.languages {
            if lang.code.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "[languages] entries need a non-empty `code`".into(),
                ));
            }
            if !codes.insert(lang.code.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "[languages] duplicate language `{}`",
                    lang.code
                )));
            }
        }

        for (name, collection) in &self.collections {
            if !is_single_component(name) {
                return Err(ConfigError::Validation(format!(
                    "[collections] `{name}` must be a plain directory name"
                )));
            }
            if collection.data_file.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "[collections.{name}.dataFile] must not be empty"
                )));
            }
            let mut slugs = FxHashSet::default();
            for item in &collection.items {
                if item.slug.trim().is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "[collections.{name}.items] entries need a non-empty `slug`"
                    )));
                }
                if !is_single_component(&item.slug) {
                    return Err(ConfigError::Validation(format!(
                        "[collections.{name}.items] slug `{}` must be a plain file name",
                        item.slug
                    )));
                }
                if !slugs.insert(item.slug.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "[collections.{name}.items] duplicate slug `{}`",
                        item.slug
                    )));
                }
            }
        }

        // Bundles land in the output root next to the language directories
        for pattern in &self.bundles {
            let name = Path::new(pattern)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            if name == ASSETS_OUTPUT_DIR || codes.contains(name) {
                return Err(ConfigError::Validation(format!(
                    "[bundles] `{pattern}` collides with an output directory"
                )));
            }
        }

        if self.serve.port == 0 {
            return Err(ConfigError::Validation("[serve.port] must not be 0".into()));
        }

        Ok(())
    }
}

/// Output names must stay inside their parent directory.
fn is_single_component(name: &str) -> bool {
    !name.contains(['/', '\\']) && name != "." && name != ".."
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;

    const MINIMAL: &str = r#"
languages:
  - code: en
    name: English
  - code: fr
    name: Français
dataSources:
  index:
    file: ${lang}.index.yaml
    fallback:
      title: Untitled
  nav: {}
"#;

    #[test]
    fn test_from_yaml() {
        let config = SiteConfig::from_yaml(MINIMAL).unwrap();

        assert_eq!(config.language_codes().collect::<Vec<_>>(), ["en", "fr"]);
        assert_eq!(config.languages[1].name, "Français");
        assert_eq!(
            config.data_sources.keys().collect::<Vec<_>>(),
            ["index", "nav"]
        );
        assert_eq!(config.data_sources["index"].fallback, json!({"title": "Untitled"}));
        assert!(config.collections.is_empty());
        assert!(config.bundles.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = SiteConfig::from_toml(
            r#"
bundles = ["404.html"]

[[languages]]
code = "en"

[dataSources.index]
file = "${lang}.index.yaml"
fallback = { title = "Untitled" }
"#,
        )
        .unwrap();

        assert_eq!(config.language_codes().collect::<Vec<_>>(), ["en"]);
        assert_eq!(config.bundles, ["404.html"]);
        assert_eq!(config.data_sources["index"].fallback, json!({"title": "Untitled"}));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_declaration_order_is_kept() {
        let config = SiteConfig::from_yaml(
            r#"
languages: [{code: en}]
dataSources:
  zeta: {}
  alpha: {}
  mid: {}
"#,
        )
        .unwrap();
        assert_eq!(
            config.data_sources.keys().collect::<Vec<_>>(),
            ["zeta", "alpha", "mid"]
        );
    }

    #[test]
    fn test_from_yaml_invalid() {
        let result = SiteConfig::from_yaml("languages: [code: en");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_unknown_top_level_keys_are_ignored() {
        let config = format!("{MINIMAL}\npages:\n  old: {{}}\n");
        assert!(SiteConfig::from_yaml(&config).is_ok());
    }

    #[test]
    fn test_missing_languages() {
        let config = SiteConfig::from_yaml("dataSources:\n  index: {}\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("languages"))));
    }

    #[test]
    fn test_missing_data_sources() {
        let config = SiteConfig::from_yaml("languages:\n  - code: en\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("dataSources"))));
    }

    #[test]
    fn test_empty_languages() {
        let config = SiteConfig::from_yaml("languages: []\ndataSources:\n  a: {}\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("languages"))));
    }

    #[test]
    fn test_duplicate_language() {
        let config = SiteConfig::from_yaml(
            "languages: [{code: en}, {code: en}]\ndataSources:\n  a: {}\n",
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_duplicate_item_slug() {
        let config = SiteConfig::from_yaml(
            r#"
languages: [{code: en}]
dataSources: {a: {}}
collections:
  posts:
    dataFile: ${lang}.posts.yaml
    items:
      - {slug: one, file: one.md}
      - {slug: one, file: two.md}
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate slug `one`"));
    }

    #[test]
    fn test_slug_must_stay_in_collection_dir() {
        for slug in ["../index", "../../../escape", "a/b", "a\\\\b", ".."] {
            let yaml = format!(
                r#"
languages: [{{code: en}}]
dataSources: {{a: {{}}}}
collections:
  posts:
    dataFile: ${{lang}}.posts.yaml
    items:
      - {{slug: "{slug}", file: one.md}}
"#
            );
            let config = SiteConfig::from_yaml(&yaml).unwrap();
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("plain file name"), "{slug}");
        }
    }

    #[test]
    fn test_collection_name_must_be_plain() {
        let config = SiteConfig::from_yaml(
            r#"
languages: [{code: en}]
dataSources: {a: {}}
collections:
  "../posts":
    dataFile: ${lang}.posts.yaml
"#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_bundle_colliding_with_language_dir() {
        let config = SiteConfig::from_yaml(
            "languages: [{code: en}]\ndataSources: {a: {}}\nbundles: [en]\n",
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = SiteConfig::load(&dir.path().join("config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io(..))));
    }

    #[test]
    fn test_load_sets_config_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, MINIMAL).unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.config_path, path.canonicalize().unwrap());
    }

    #[test]
    fn test_load_rejects_missing_required() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "languages:\n  - code: en\n").unwrap();

        assert!(matches!(
            SiteConfig::load(&path),
            Err(ConfigError::Missing("dataSources"))
        ));
    }

    #[test]
    fn test_update_with_cli_paths() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let cli = Cli::parse_from([
            "polyglot",
            "--root",
            root.to_str().unwrap(),
            "--output",
            "public",
            "build",
            "--prod",
        ]);

        let mut config = SiteConfig::from_yaml(MINIMAL).unwrap();
        config.update_with_cli(&cli);

        assert_eq!(config.get_root(), root);
        assert_eq!(config.build.source, root.join("src"));
        assert_eq!(config.build.output, root.join("public"));
        assert_eq!(config.build.templates, root.join("src/templates"));
        assert_eq!(config.build.data, root.join("src/data"));
        assert_eq!(config.build.assets, root.join("src/assets"));
        assert_eq!(config.lang_output("fr"), root.join("public/fr"));
        assert_eq!(config.assets_output(), root.join("public/assets"));
        assert!(config.build.prod);
    }

    #[test]
    fn test_update_with_cli_serve_overrides() {
        let cli = Cli::parse_from([
            "polyglot", "serve", "--port", "8080", "--interface", "0.0.0.0", "--watch", "false",
        ]);

        let mut config = SiteConfig::from_yaml(MINIMAL).unwrap();
        config.update_with_cli(&cli);

        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.interface, "0.0.0.0");
        assert!(!config.serve.watch);
        assert!(!config.build.prod);
    }

    #[test]
    fn test_update_with_cli_init_name() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let cli = Cli::parse_from(["polyglot", "--root", root.to_str().unwrap(), "init", "blog"]);

        let mut config = SiteConfig::default();
        config.update_with_cli(&cli);

        assert_eq!(config.get_root(), root.join("blog"));
        assert_eq!(config.build.source, root.join("blog/src"));
    }

    #[test]
    fn test_site_config_default() {
        let config = SiteConfig::default();

        assert_eq!(config.config_path, PathBuf::new());
        assert_eq!(config.get_root(), Path::new("./"));
        assert!(config.languages.is_empty());
        assert_eq!(config.serve.port, 3000);
        assert!(!config.build.prod);
    }
}
