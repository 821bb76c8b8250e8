//! `serve` section configuration.
//!
//! Contains development server settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `serve` section in config.yaml - development server settings.
///
/// # Example
/// ```yaml
/// serve:
///   interface: 0.0.0.0   # Listen on all interfaces
///   port: 8080
///   watch: true          # Auto-rebuild on file changes
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    #[serde(default = "defaults::serve::interface")]
    #[educe(Default = defaults::serve::interface())]
    pub interface: String,

    /// HTTP port number (default: 3000).
    #[serde(default = "defaults::serve::port")]
    #[educe(Default = defaults::serve::port())]
    pub port: u16,

    /// Enable file watcher for rebuilds on changes.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub watch: bool,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    const REQUIRED: &str = r#"
languages:
  - code: en
dataSources:
  index:
    fallback: {}
"#;

    #[test]
    fn test_serve_config() {
        let config = format!(
            "{REQUIRED}
serve:
  interface: 0.0.0.0
  port: 8080
  watch: false
"
        );
        let config = SiteConfig::from_yaml(&config).unwrap();

        assert_eq!(config.serve.interface, "0.0.0.0");
        assert_eq!(config.serve.port, 8080);
        assert!(!config.serve.watch);
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = SiteConfig::from_yaml(REQUIRED).unwrap();

        assert_eq!(config.serve.interface, "127.0.0.1");
        assert_eq!(config.serve.port, 3000);
        assert!(config.serve.watch);
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = format!(
            "{REQUIRED}
serve:
  port: 8080
  livereload: true
"
        );
        assert!(SiteConfig::from_yaml(&config).is_err());
    }
}
