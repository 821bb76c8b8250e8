//! Page context building blocks.
//!
//! A [`PageContext`] is the flat JSON object handed to one render. It is
//! assembled by [`super::resolve`] in a fixed order, using the helpers here.

use super::loader::CONTENT_FIELD;
use crate::config::Language;
use serde_json::{Map, Value};

/// Fully merged data available to one render.
///
/// Key order follows insertion order (`serde_json` `preserve_order`).
pub type PageContext = Map<String, Value>;

/// Key holding the global language list.
pub const LANGS_KEY: &str = "langs";
/// Key holding the item list of a resolved collection.
pub const ITEMS_KEY: &str = "items";
/// Key holding an item's slug.
pub const SLUG_KEY: &str = "slug";

/// Start a context with `langs` set to the full language list.
pub fn base_context(languages: &[Language]) -> PageContext {
    let langs = languages.iter().map(language_value).collect();
    let mut ctx = PageContext::new();
    ctx.insert(LANGS_KEY.into(), Value::Array(langs));
    ctx
}

fn language_value(lang: &Language) -> Value {
    let mut map = Map::new();
    map.insert("code".into(), Value::String(lang.code.clone()));
    map.insert("name".into(), Value::String(lang.name.clone()));
    for (k, v) in &lang.extra {
        map.entry(k.clone()).or_insert_with(|| v.clone());
    }
    Value::Object(map)
}

/// Merge one data source's contribution into the context.
///
/// A mapping is shallow-merged (later keys win). Anything else is stored
/// under `key`. If `key` is still absent afterwards, `fallback` is stored
/// under it so every declared source key exists in every context.
pub fn merge_contribution(ctx: &mut PageContext, key: &str, contribution: Value, fallback: &Value) {
    match contribution {
        Value::Object(map) => ctx.extend(map),
        other => {
            ctx.insert(key.to_owned(), other);
        }
    }
    if !ctx.contains_key(key) {
        ctx.insert(key.to_owned(), fallback.clone());
    }
}

/// Build a collection item: `slug` first, then the decoded fields.
///
/// Decoded fields may shadow `slug`. A non-mapping value is stored under
/// `content`; `null` contributes nothing.
pub fn collection_item(slug: &str, value: Value) -> Value {
    let mut item = Map::new();
    item.insert(SLUG_KEY.into(), Value::String(slug.to_owned()));
    match value {
        Value::Object(fields) => item.extend(fields),
        Value::Null => {}
        other => {
            item.insert(CONTENT_FIELD.into(), other);
        }
    }
    Value::Object(item)
}

/// Resolved collection for a metadata file that failed to load.
pub fn empty_collection() -> Value {
    let mut map = Map::new();
    map.insert(ITEMS_KEY.into(), Value::Array(Vec::new()));
    Value::Object(map)
}

/// Find the item whose `slug` field equals `slug` in a resolved collection.
pub fn find_item<'a>(collection: &'a Value, slug: &str) -> Option<&'a Value> {
    collection
        .get(ITEMS_KEY)?
        .as_array()?
        .iter()
        .find(|item| item.get(SLUG_KEY).and_then(Value::as_str) == Some(slug))
}
