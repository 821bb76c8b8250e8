//! Site declarations: languages, data sources, collections.
//!
//! These are the parts of config.yaml that drive page fan-out. File patterns
//! may contain a `${lang}` placeholder which is replaced with the language
//! code being built.

use super::defaults::{self, site::LANG_PLACEHOLDER};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Substitute every `${lang}` placeholder in a file pattern.
///
/// ```ignore
/// localize("${lang}.index.yaml", "fr") // → "fr.index.yaml"
/// ```
pub fn localize(pattern: &str, lang: &str) -> String {
    pattern.replace(LANG_PLACEHOLDER, lang)
}

/// One entry of `languages:`.
///
/// The whole list is exposed to every page as `langs`, so any extra fields
/// (flags, locale names, ...) are kept and passed through to templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,

    #[serde(default)]
    pub name: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of `dataSources:`.
///
/// Keys other than the ones below are ignored, as in every site
/// declaration.
///
/// # Example
/// ```yaml
/// dataSources:
///   index:
///     file: ${lang}.index.yaml
///     fallback:
///       title: Untitled
///   nav: {}                 # → <lang>.nav.yaml, fallback null
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    /// File pattern relative to the data directory.
    #[serde(default)]
    pub file: Option<String>,

    /// Value used when the file cannot be loaded.
    #[serde(default = "defaults::site::fallback")]
    pub fallback: Value,
}

impl DataSource {
    /// Data file name for `key` in language `lang`.
    ///
    /// Without a declared pattern the name is `<lang>.<key>.yaml`.
    pub fn file_name(&self, key: &str, lang: &str) -> String {
        match &self.file {
            Some(pattern) => localize(pattern, lang),
            None => format!("{lang}.{key}.{}", defaults::site::DEFAULT_DATA_EXT),
        }
    }
}

/// One entry of `collections:`.
///
/// # Example
/// ```yaml
/// collections:
///   articles:
///     dataFile: ${lang}.articles.yaml
///     template: articles.html
///     item_template: article.html
///     items:
///       - slug: hello
///         file: articles/${lang}/hello.md
///         fallback:
///           title: Coming soon
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection-level metadata file pattern.
    #[serde(rename = "dataFile")]
    pub data_file: String,

    /// Listing template. Listing pages are ordinary page templates; this is
    /// kept so templates can link to it.
    #[serde(default)]
    pub template: Option<String>,

    /// Template rendered once per item.
    #[serde(default)]
    pub item_template: Option<String>,

    #[serde(default)]
    pub items: Vec<ItemDecl>,
}

/// One declared item inside a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDecl {
    /// Output file basename and lookup key.
    pub slug: String,

    /// Content file pattern; the extension selects the decoder.
    pub file: String,

    #[serde(default = "defaults::site::fallback")]
    pub fallback: Value,
}

impl ItemDecl {
    pub fn file_name(&self, lang: &str) -> String {
        localize(&self.file, lang)
    }
}
