//! Per-language page data resolution.
//!
//! ```text
//! resolve(lang)
//!     │
//!     ├── { langs }                       global language list
//!     ├── dataSources (declared order)    load → merge, or fallback + warn
//!     └── collections (declared order)    { ...metadata, items: [...] }
//! ```
//!
//! Missing or broken data never fails the build: every [`LoadError`] is
//! logged with file and language, and the declared fallback takes its place.

use super::{
    loader::{self, LoadError},
    types::{
        ITEMS_KEY, PageContext, base_context, collection_item, empty_collection,
        merge_contribution,
    },
};
use crate::{
    config::{Collection, DataSource, SiteConfig, localize},
    log,
};
use rayon::prelude::*;
use serde_json::Value;
use std::path::Path;

/// Data source key whose file holds one value per language.
pub const SHARED_KEY: &str = "shared";

/// Build the full page context for one language.
pub fn resolve(lang: &str, config: &SiteConfig) -> PageContext {
    let data_dir = &config.build.data;
    let mut ctx = base_context(&config.languages);

    for (key, source) in &config.data_sources {
        let file_name = source.file_name(key, lang);
        let path = data_dir.join(&file_name);

        match loader::load(&path) {
            Ok(value) if key == SHARED_KEY => {
                let contribution = shared_value(value, lang, source, &file_name);
                merge_contribution(&mut ctx, key, contribution, &source.fallback);
            }
            Ok(value) => merge_contribution(&mut ctx, key, value, &source.fallback),
            Err(err) => {
                warn_fallback(&err, &file_name, lang);
                ctx.insert(key.clone(), source.fallback.clone());
            }
        }
    }

    ctx.extend(resolve_collections(lang, config));
    ctx
}

/// Resolve every language in parallel, keeping declaration order.
pub fn resolve_all(config: &SiteConfig) -> Vec<(String, PageContext)> {
    config
        .languages
        .par_iter()
        .map(|lang| (lang.code.clone(), resolve(&lang.code, config)))
        .collect()
}

/// Resolve every collection for one language.
///
/// Returns `collection name → { ...metadata, items: [...] }`.
pub fn resolve_collections(lang: &str, config: &SiteConfig) -> PageContext {
    config
        .collections
        .iter()
        .map(|(name, collection)| (name.clone(), resolve_collection(lang, collection, config)))
        .collect()
}

fn resolve_collection(lang: &str, collection: &Collection, config: &SiteConfig) -> Value {
    let data_dir = &config.build.data;
    let file_name = localize(&collection.data_file, lang);

    let mut resolved = match load_metadata(&data_dir.join(&file_name)) {
        Ok(metadata) => metadata,
        Err(err) => {
            warn_fallback(&err, &file_name, lang);
            return empty_collection();
        }
    };

    let items = collection
        .items
        .iter()
        .map(|item| {
            let file_name = item.file_name(lang);
            match loader::load(&data_dir.join(&file_name)) {
                Ok(value) => collection_item(&item.slug, value),
                Err(err) => {
                    warn_fallback(&err, &file_name, lang);
                    collection_item(&item.slug, item.fallback.clone())
                }
            }
        })
        .collect();

    resolved.insert(ITEMS_KEY.into(), Value::Array(items));
    Value::Object(resolved)
}

/// Collection metadata must decode to a mapping (or nothing at all).
fn load_metadata(path: &Path) -> Result<PageContext, LoadError> {
    match loader::load(path)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(PageContext::new()),
        _ => Err(LoadError::Parse {
            path: path.to_path_buf(),
            message: "collection metadata is not a mapping".into(),
        }),
    }
}

/// Pick the value for `lang` out of a `shared` file.
fn shared_value(value: Value, lang: &str, source: &DataSource, file_name: &str) -> Value {
    match value {
        Value::Object(mut by_lang) => match by_lang.remove(lang) {
            Some(inner) if !inner.is_null() => inner,
            _ => {
                log!("warn"; "{file_name} has no `{lang}` entry, using fallback");
                source.fallback.clone()
            }
        },
        _ => {
            log!("warn"; "{file_name} is not keyed by language, using fallback for {lang}");
            source.fallback.clone()
        }
    }
}

fn warn_fallback(err: &LoadError, file_name: &str, lang: &str) {
    log!(err.policy().log_module(); "missing or invalid {file_name} for {lang}, using fallback: {err}");
}
