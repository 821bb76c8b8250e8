//! Content decoding for data sources, collection metadata and items.
//!
//! The decoder is chosen by file extension:
//!
//! | Extension              | Decoder                                        |
//! |------------------------|------------------------------------------------|
//! | `yaml`, `yml`, `toml`  | structured data → nested mapping               |
//! | `md`, `markdown`       | front-matter fields + `content` (rendered HTML) |
//! | `json`                 | strict JSON                                    |
//!
//! Errors are returned, never swallowed: the resolver decides the fallback.

use pulldown_cmark::{Options, Parser, html};
use serde_json::{Map, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Field holding rendered HTML of a prose document.
pub const CONTENT_FIELD: &str = "content";

/// Failure to produce a value from a content file.
///
/// Every variant is recoverable: callers substitute a declared fallback.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse `{}`: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("unsupported file type `{ext}` for `{}`", path.display())]
    UnsupportedType { path: PathBuf, ext: String },
}

impl LoadError {
    fn parse(path: &Path, message: impl ToString) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

/// Declared type of a content file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// YAML document
    Yaml,
    /// TOML document
    Toml,
    /// Strict JSON document
    Json,
    /// Markdown with optional front-matter
    Markdown,
}

impl ContentType {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "md" | "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| LoadError::UnsupportedType {
            path: path.to_path_buf(),
            ext: ext.to_owned(),
        })
    }
}

/// Read and decode a content file.
pub fn load(path: &Path) -> Result<Value, LoadError> {
    let content_type = ContentType::from_path(path)?;
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&text, content_type, path)
}

/// Decode file text; `path` is only used in error messages.
pub fn decode(text: &str, content_type: ContentType, path: &Path) -> Result<Value, LoadError> {
    match content_type {
        ContentType::Yaml => decode_yaml(text, path),
        ContentType::Toml => toml::from_str(text).map_err(|e| LoadError::parse(path, e)),
        ContentType::Json => serde_json::from_str(text).map_err(|e| LoadError::parse(path, e)),
        ContentType::Markdown => decode_prose(text, path),
    }
}

fn decode_yaml(text: &str, path: &Path) -> Result<Value, LoadError> {
    // An empty document is a valid, empty data file
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml::from_str(text).map_err(|e| LoadError::parse(path, e))
}

// ============================================================================
// Prose
// ============================================================================

/// Front-matter block delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrontMatter {
    /// `---` ... `---`
    Yaml,
    /// `+++` ... `+++`
    Toml,
}

impl FrontMatter {
    const fn delimiter(self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }
}

/// Split a leading front-matter block from the body.
///
/// The opening and closing delimiters must sit on their own lines.
/// Returns `None` when the text has no (complete) front-matter block.
fn split_front_matter(text: &str) -> Option<(FrontMatter, &str, &str)> {
    let text = text.trim_start_matches('\u{feff}');
    let first_line_end = text.find('\n').unwrap_or(text.len());
    let format = match text[..first_line_end].trim_end() {
        "---" => FrontMatter::Yaml,
        "+++" => FrontMatter::Toml,
        _ => return None,
    };

    let rest = text.get(first_line_end + 1..)?;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == format.delimiter() {
            let meta = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((format, meta, body));
        }
        offset += line.len();
    }
    None
}

fn decode_prose(text: &str, path: &Path) -> Result<Value, LoadError> {
    let (mut fields, body) = match split_front_matter(text) {
        Some((format, meta, body)) => (parse_front_matter(format, meta, path)?, body),
        None => (Map::new(), text),
    };
    fields.insert(CONTENT_FIELD.into(), Value::String(markdown_to_html(body)));
    Ok(Value::Object(fields))
}

fn parse_front_matter(format: FrontMatter, meta: &str, path: &Path) -> Result<Map<String, Value>, LoadError> {
    if meta.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = match format {
        FrontMatter::Yaml => serde_yaml::from_str(meta).map_err(|e| LoadError::parse(path, e))?,
        FrontMatter::Toml => toml::from_str(meta).map_err(|e| LoadError::parse(path, e))?,
    };
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(LoadError::parse(path, "front-matter is not a mapping")),
    }
}

/// Render markdown to HTML.
///
/// Also backs the `markdown` template filter.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
