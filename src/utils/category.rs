//! File category classification for watch mode.
//!
//! # File Categories
//!
//! | Category  | Rebuild scope | Example Files                     |
//! |-----------|---------------|-----------------------------------|
//! | Config    | Pages         | `config.yaml`                     |
//! | Template  | Pages         | `src/templates/*.html`            |
//! | Data      | Pages         | `src/data/en.index.yaml`          |
//! | Bundle    | Pages         | `src/404.html` (listed in config) |
//! | Styles    | Styles        | `src/assets/scss/*.scss`          |
//! | Assets    | Assets        | `src/assets/js/app.js`            |
//! | Unknown   | Ignored       | Files outside watched dirs        |

use crate::{build::Scope, compiler::styles::SCSS_DIR, config::SiteConfig};
use crate::utils::path::normalize_path;
use std::path::Path;

/// Category of a changed file, used to determine rebuild scope in watch mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    /// Site configuration file
    Config,
    /// Page, item or partial template
    Template,
    /// Data source, collection metadata or item content
    Data,
    /// File copied to the output root
    Bundle,
    /// SCSS/Sass source
    Styles,
    /// Any other file under the assets directory
    Assets,
    /// File outside watched directories
    Unknown,
}

impl FileCategory {
    /// Generating branches to re-run after a change; `None` means ignore.
    pub const fn scope(self) -> Option<Scope> {
        match self {
            Self::Config | Self::Template | Self::Data | Self::Bundle => Some(Scope::Pages),
            Self::Styles => Some(Scope::Styles),
            Self::Assets => Some(Scope::Assets),
            Self::Unknown => None,
        }
    }
}

/// Categorize a file path to determine how changes should be handled.
pub fn categorize_path(path: &Path, config: &SiteConfig) -> FileCategory {
    let path = normalize_path(path);
    let build = &config.build;

    if path == config.config_path {
        FileCategory::Config
    } else if path.starts_with(&build.templates) {
        FileCategory::Template
    } else if path.starts_with(&build.data) {
        FileCategory::Data
    } else if path.starts_with(build.assets.join(SCSS_DIR)) {
        FileCategory::Styles
    } else if path.starts_with(&build.assets) {
        FileCategory::Assets
    } else if is_bundle(&path, config) {
        FileCategory::Bundle
    } else {
        FileCategory::Unknown
    }
}

/// Whether `path` matches one of the `bundles` patterns (or lies inside a
/// bundled directory).
fn is_bundle(path: &Path, config: &SiteConfig) -> bool {
    let source = &config.build.source;
    config.bundles.iter().any(|pattern| {
        let full = source.join(pattern);
        path.starts_with(&full)
            || glob::Pattern::new(&full.to_string_lossy()).is_ok_and(|p| p.matches_path(path))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, SiteConfig) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let config_path = root.join("config.yaml");
        fs::write(&config_path, "").unwrap();

        let mut config = SiteConfig::from_yaml("bundles: ['404.html', 'errors/*.html']").unwrap();
        config.update_path_with_root(&root);
        config.config_path = config_path;
        (dir, config)
    }

    #[test]
    fn test_categorize_config() {
        let (_dir, config) = setup();
        let path = config.config_path.clone();
        assert_eq!(categorize_path(&path, &config), FileCategory::Config);
    }

    #[test]
    fn test_categorize_source_dirs() {
        let (_dir, config) = setup();
        let src = &config.build.source;

        let cases = [
            ("templates/index.html", FileCategory::Template),
            ("templates/partials/nav.html", FileCategory::Template),
            ("data/en.index.yaml", FileCategory::Data),
            ("data/posts/en/a.md", FileCategory::Data),
            ("assets/scss/main.scss", FileCategory::Styles),
            ("assets/css/site.css", FileCategory::Assets),
            ("assets/img/logo.png", FileCategory::Assets),
            ("404.html", FileCategory::Bundle),
            ("errors/500.html", FileCategory::Bundle),
            ("notes.txt", FileCategory::Unknown),
        ];
        for (rel, expected) in cases {
            assert_eq!(categorize_path(&src.join(rel), &config), expected, "{rel}");
        }
    }

    #[test]
    fn test_categorize_outside_root() {
        let (_dir, config) = setup();
        assert_eq!(
            categorize_path(Path::new("/definitely/elsewhere.html"), &config),
            FileCategory::Unknown
        );
    }

    #[test]
    fn test_scope() {
        assert_eq!(FileCategory::Data.scope(), Some(Scope::Pages));
        assert_eq!(FileCategory::Config.scope(), Some(Scope::Pages));
        assert_eq!(FileCategory::Styles.scope(), Some(Scope::Styles));
        assert_eq!(FileCategory::Assets.scope(), Some(Scope::Assets));
        assert_eq!(FileCategory::Unknown.scope(), None);
    }
}
