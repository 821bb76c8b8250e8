//! `build` section configuration.
//!
//! Contains the directory layout of a site and the production switch.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `build` section in config.yaml - directory layout.
///
/// `templates`, `data` and `assets` are relative to `source`; `source` and
/// `output` are relative to the project root. After loading, every path is
/// normalized to an absolute path.
///
/// # Example
/// ```yaml
/// build:
///   source: src        # src/templates, src/data, src/assets
///   output: dist
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Source directory holding templates, data, assets and bundles.
    #[serde(default = "defaults::build::source")]
    #[educe(Default = defaults::build::source())]
    pub source: PathBuf,

    /// Build output directory. Removed at the start of every build.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Page templates (`*.html`), relative to `source`.
    #[serde(default = "defaults::build::templates")]
    #[educe(Default = defaults::build::templates())]
    pub templates: PathBuf,

    /// Data sources, collection metadata and item files, relative to `source`.
    #[serde(default = "defaults::build::data")]
    #[educe(Default = defaults::build::data())]
    pub data: PathBuf,

    /// Stylesheets, scripts, images and other static files, relative to `source`.
    #[serde(default = "defaults::build::assets")]
    #[educe(Default = defaults::build::assets())]
    pub assets: PathBuf,

    /// Production mode: minify pages and stylesheets.
    ///
    /// Only ever set from the `--prod` CLI flag.
    #[serde(skip)]
    pub prod: bool,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use std::path::PathBuf;

    const REQUIRED: &str = r#"
languages:
  - code: en
dataSources:
  index:
    fallback: {}
"#;

    #[test]
    fn test_build_config_defaults() {
        let config = SiteConfig::from_yaml(REQUIRED).unwrap();

        assert_eq!(config.build.source, PathBuf::from("src"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert_eq!(config.build.templates, PathBuf::from("templates"));
        assert_eq!(config.build.data, PathBuf::from("data"));
        assert_eq!(config.build.assets, PathBuf::from("assets"));
        assert!(!config.build.prod);
    }

    #[test]
    fn test_build_config_custom_layout() {
        let config = format!(
            "{REQUIRED}
build:
  source: site
  output: public
  data: content
"
        );
        let config = SiteConfig::from_yaml(&config).unwrap();

        assert_eq!(config.build.source, PathBuf::from("site"));
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert_eq!(config.build.data, PathBuf::from("content"));
        assert_eq!(config.build.templates, PathBuf::from("templates"));
    }

    #[test]
    fn test_prod_is_not_read_from_file() {
        let config = format!(
            "{REQUIRED}
build:
  prod: true
"
        );
        assert!(SiteConfig::from_yaml(&config).is_err());
    }
}
