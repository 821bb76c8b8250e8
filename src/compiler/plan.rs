//! Page fan-out.
//!
//! Turns resolved per-language contexts into the full list of files a build
//! writes. Planning touches no files; [`SiteSources::discover`] does the
//! directory scanning up front.
//!
//! ```text
//! for lang in languages
//!     for template in page templates        → <out>/<lang>/<template>
//!     for collection, item in collections   → <out>/<lang>/<collection>/<slug>.html
//! for file in bundles (once)                → <out>/<file name>
//! ```

use crate::{
    compiler::collect_all_files,
    config::{ASSETS_OUTPUT_DIR, SiteConfig},
    data::{
        PageContext,
        types::find_item,
    },
    log,
};
use rustc_hash::FxHashSet;
use serde_json::Value;
use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};

/// Template files starting with this prefix are partials (layouts, includes).
pub const PARTIAL_PREFIX: char = '_';

/// Extension of page templates.
const TEMPLATE_EXT: &str = "html";

// ============================================================================
// Types
// ============================================================================

/// What a task does with its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// Render a page template once per language.
    Page { template: String },
    /// Render a collection's item template once per item and language.
    Item { template: String },
    /// Copy a file to the output root.
    Bundle { source: PathBuf },
}

/// One output file.
#[derive(Debug, Clone)]
pub struct RenderTask {
    pub output: PathBuf,
    pub kind: TaskKind,
    /// Empty for bundles.
    pub context: PageContext,
}

impl RenderTask {
    /// Template name, if this task renders one.
    pub fn template(&self) -> Option<&str> {
        match &self.kind {
            TaskKind::Page { template } | TaskKind::Item { template } => Some(template),
            TaskKind::Bundle { .. } => None,
        }
    }
}

/// Template and bundle files found on disk.
#[derive(Debug, Clone, Default)]
pub struct SiteSources {
    /// Page template names, sorted.
    pub templates: Vec<String>,
    /// Bundle files, in pattern order.
    pub bundles: Vec<PathBuf>,
}

impl SiteSources {
    pub fn discover(config: &SiteConfig) -> Self {
        Self {
            templates: page_templates(&config.build.templates),
            bundles: bundle_files(config),
        }
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// Top-level `*.html` files in the templates directory, partials excluded.
pub fn page_templates(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        log!("warn"; "templates directory `{}` not found", dir.display());
        return Vec::new();
    };

    let mut templates: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| is_page_template(name))
        .collect();
    templates.sort();
    templates
}

fn is_page_template(name: &str) -> bool {
    !name.starts_with(PARTIAL_PREFIX)
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(TEMPLATE_EXT))
}

/// Files matched by the `bundles` patterns under the source directory.
///
/// A pattern matching nothing is logged and skipped. Directories are
/// expanded to the files they contain.
pub fn bundle_files(config: &SiteConfig) -> Vec<PathBuf> {
    let source = &config.build.source;
    let mut files = Vec::new();

    for pattern in &config.bundles {
        let full = source.join(pattern);
        let matches: Vec<PathBuf> = match glob::glob(&full.to_string_lossy()) {
            Ok(paths) => paths.filter_map(Result::ok).collect(),
            Err(err) => {
                log!("warn"; "invalid bundle pattern `{pattern}`: {err}");
                continue;
            }
        };

        if matches.is_empty() {
            log!("warn"; "bundle `{pattern}` matched no files");
        }
        for path in matches {
            if path.is_dir() {
                files.extend(collect_all_files(&path));
            } else if !files.contains(&path) {
                files.push(path);
            }
        }
    }
    files
}

// ============================================================================
// Planning
// ============================================================================

/// Compute every output file of a build.
///
/// `contexts` holds one resolved context per language, in language order.
pub fn plan(
    config: &SiteConfig,
    sources: &SiteSources,
    contexts: &[(String, PageContext)],
) -> Vec<RenderTask> {
    let mut tasks = Vec::new();

    for (lang, ctx) in contexts {
        let lang_dir = config.lang_output(lang);

        for template in &sources.templates {
            tasks.push(RenderTask {
                output: lang_dir.join(template),
                kind: TaskKind::Page {
                    template: template.clone(),
                },
                context: page_context(ctx, template),
            });
        }

        for (name, collection) in &config.collections {
            let Some(item_template) = &collection.item_template else {
                if !collection.items.is_empty() {
                    log!("warn"; "collection `{name}` has no item_template, skipping items for {lang}");
                }
                continue;
            };

            let collection_dir = lang_dir.join(name);
            for item in &collection.items {
                tasks.push(RenderTask {
                    output: collection_dir.join(format!("{}.{TEMPLATE_EXT}", item.slug)),
                    kind: TaskKind::Item {
                        template: item_template.clone(),
                    },
                    context: item_context(ctx, lang, name, &item.slug),
                });
            }
        }
    }

    let mut taken: FxHashSet<&OsStr> = config.language_codes().map(OsStr::new).collect();
    taken.insert(OsStr::new(ASSETS_OUTPUT_DIR));

    for source in &sources.bundles {
        let Some(file_name) = source.file_name() else {
            continue;
        };
        if !taken.insert(file_name) {
            log!(
                "warn";
                "bundle `{}` would overwrite `{}` in the output root, skipped",
                source.display(),
                file_name.to_string_lossy()
            );
            continue;
        }
        tasks.push(RenderTask {
            output: config.build.output.join(file_name),
            kind: TaskKind::Bundle {
                source: source.clone(),
            },
            context: PageContext::new(),
        });
    }

    tasks
}

/// `{...pageData, activePage}`; `activePage` is the template's file stem.
fn page_context(ctx: &PageContext, template: &str) -> PageContext {
    let stem = Path::new(template)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(template);

    let mut context = ctx.clone();
    context.insert("activePage".into(), Value::String(stem.to_owned()));
    context
}

/// `{...pageData, lang, article, collection}`; `article` is left out when no
/// resolved item carries the declared slug.
fn item_context(ctx: &PageContext, lang: &str, collection: &str, slug: &str) -> PageContext {
    let article = ctx.get(collection).and_then(|c| find_item(c, slug)).cloned();

    let mut context = ctx.clone();
    context.insert("lang".into(), Value::String(lang.to_owned()));
    match article {
        Some(article) => {
            context.insert("article".into(), article);
        }
        None => {
            context.remove("article");
        }
    }
    context.insert("collection".into(), Value::String(collection.to_owned()));
    context
}
