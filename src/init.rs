//! Site initialization module.
//!
//! Scaffolds a new site: directory layout, a starter config with one
//! language, a page template with its data file, and the two bundled error
//! pages the config declares.

use crate::config::{DataSource, Language, SiteConfig};
use crate::log;
use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::json;
use std::{fs, path::Path};

/// Ignore patterns written to a new site's `.gitignore`
const GITIGNORE: &str = "node_modules/\ndist/\n.DS_Store\n.env\n";

/// Subdirectories of the assets directory
const ASSET_DIRS: &[&str] = &["scss", "css", "js", "img", "fonts"];

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{ langs[0].code }}">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{{ title }}</title>
    <link rel="stylesheet" href="/assets/css/main.css">
</head>
<body>
    <nav>
        {% for l in langs %}<a href="/{{ l.code }}/">{{ l.name }}</a> {% endfor %}
    </nav>
    <h1>{{ heading }}</h1>
    <p>{{ content }}</p>
</body>
</html>
"#;

const INDEX_DATA: &str = "title: Home\nheading: Hello\ncontent: Edit src/data/en.index.yaml to change this text.\n";

const MAIN_SCSS: &str = "$text: #222;\n\nbody {\n  color: $text;\n  font-family: system-ui, sans-serif;\n}\n";

const ERROR_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{status}</title></head>
<body><h1>{status}</h1><p><a href="/">Back to the home page</a></p></body>
</html>
"#;

/// The part of the config a new site starts with.
///
/// `bundles` comes first so TOML output keeps plain values ahead of tables.
#[derive(Serialize)]
struct StarterConfig {
    bundles: Vec<String>,
    languages: Vec<Language>,
    #[serde(rename = "dataSources")]
    data_sources: IndexMap<String, DataSource>,
}

impl StarterConfig {
    fn new() -> Self {
        let mut data_sources = IndexMap::new();
        data_sources.insert(
            "index".to_owned(),
            DataSource {
                file: Some("${lang}.index.yaml".to_owned()),
                fallback: json!({
                    "title": "Error",
                    "heading": "Page Not Found",
                    "content": "Index data missing.",
                }),
            },
        );

        Self {
            languages: vec![Language {
                code: "en".to_owned(),
                name: "English".to_owned(),
                extra: serde_json::Map::new(),
            }],
            data_sources,
            bundles: vec!["404.html".to_owned(), "50x.html".to_owned()],
        }
    }

    /// Serialize in the format the config file's extension asks for.
    fn render(&self, path: &Path) -> Result<String> {
        Ok(match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::to_string_pretty(self)?,
            _ => serde_yaml::to_string(self)?,
        })
    }
}

/// Create a new site at the config's root.
///
/// Refuses to touch a directory that already has a config file. Existing
/// files other than the config are left as they are.
pub fn new_site(config: &SiteConfig, description: Option<&str>) -> Result<()> {
    let root = config.get_root();
    let config_path = &config.config_path;

    if config_path.exists() {
        bail!(
            "Config file `{}` already exists. Remove it manually or init in a different path.",
            config_path.display()
        );
    }

    init_site_structure(config)?;

    fs::write(config_path, StarterConfig::new().render(config_path)?)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    let name = root
        .file_name()
        .map_or_else(|| "site".to_owned(), |n| n.to_string_lossy().into_owned());
    let readme = format!(
        "# {name}\n\n{}\n\n## Getting Started\n\nRun `polyglot serve` to preview the site and `polyglot build --prod` to produce `dist/`.\n",
        description.unwrap_or_default()
    );

    let build = &config.build;
    let files = [
        (root.join("README.md"), readme),
        (root.join(".gitignore"), GITIGNORE.to_owned()),
        (build.templates.join("index.html"), INDEX_TEMPLATE.to_owned()),
        (build.data.join("en.index.yaml"), INDEX_DATA.to_owned()),
        (build.assets.join("scss/main.scss"), MAIN_SCSS.to_owned()),
        (build.source.join("404.html"), ERROR_PAGE.replace("{status}", "404 Not Found")),
        (build.source.join("50x.html"), ERROR_PAGE.replace("{status}", "Server Error")),
    ];
    for (path, content) in files {
        write_if_missing(&path, &content)?;
    }

    log!("init"; "created site at {}", root.display());
    Ok(())
}

/// Create source directories; the output directory is left to the first build.
fn init_site_structure(config: &SiteConfig) -> Result<()> {
    let build = &config.build;
    let dirs = [build.templates.clone(), build.data.clone()]
        .into_iter()
        .chain(ASSET_DIRS.iter().map(|d| build.assets.join(d)));

    for path in dirs {
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
