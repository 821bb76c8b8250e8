//! Template rendering.
//!
//! The build only needs "template name + context → HTML", expressed by the
//! [`Renderer`] trait. [`TeraRenderer`] implements it over every `*.html`
//! file in the templates directory, so layouts and partials in
//! subdirectories can be extended and included.
//!
//! # Filters
//!
//! | Filter     | Effect                                  |
//! |------------|-----------------------------------------|
//! | `markdown` | render a markdown string to HTML        |
//! | `tojson`   | pretty-printed JSON of any value        |
//!
//! Tera's builtins (`date`, `slugify`, `truncate`, ...) are available too.

use crate::{compiler::collect_all_files, data::PageContext, data::loader::markdown_to_html};
use std::{collections::HashMap, error::Error as _, io, path::{Path, PathBuf}};
use tera::{Context, Tera, Value};
use thiserror::Error;

/// Failure to produce one output file. Sibling tasks are unaffected.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template `{name}`: {message}")]
    Template { name: String, message: String },

    #[error("cannot read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Render a named template with a page context.
pub trait Renderer: Sync {
    fn render(&self, template: &str, context: &PageContext) -> Result<String, RenderError>;
}

/// [`Renderer`] backed by `tera`.
pub struct TeraRenderer {
    tera: Tera,
}

impl TeraRenderer {
    /// Load every `*.html` file under `dir`, named by its path relative to `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, RenderError> {
        let files: Vec<(PathBuf, Option<String>)> = collect_all_files(dir)
            .into_iter()
            .filter(|p| p.extension().is_some_and(|e| e == "html"))
            .filter_map(|p| {
                let name = p.strip_prefix(dir).ok()?.to_str()?.replace('\\', "/");
                Some((p, Some(name)))
            })
            .collect();

        let mut tera = Tera::default();
        tera.add_template_files(files)
            .map_err(|err| template_error(&dir.display().to_string(), &err))?;
        Ok(Self::with_tera(tera))
    }

    /// Templates given as `(name, source)` pairs.
    #[cfg(test)]
    pub fn from_raw(templates: &[(&str, &str)]) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(templates.iter().copied())
            .map_err(|err| template_error("<raw>", &err))?;
        Ok(Self::with_tera(tera))
    }

    fn with_tera(mut tera: Tera) -> Self {
        tera.register_filter("markdown", markdown_filter);
        tera.register_filter("tojson", tojson_filter);
        Self { tera }
    }
}

impl Renderer for TeraRenderer {
    fn render(&self, template: &str, context: &PageContext) -> Result<String, RenderError> {
        let context =
            Context::from_serialize(context).map_err(|err| template_error(template, &err))?;
        self.tera
            .render(template, &context)
            .map_err(|err| template_error(template, &err))
    }
}

fn markdown_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    match value {
        Value::Null => Ok(Value::String(String::new())),
        Value::String(s) => Ok(Value::String(markdown_to_html(s))),
        other => Err(tera::Error::msg(format!(
            "`markdown` expects a string, got {other}"
        ))),
    }
}

fn tojson_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    serde_json::to_string_pretty(value)
        .map(Value::String)
        .map_err(tera::Error::msg)
}

/// Flatten a tera error chain; the useful part is usually in `source()`.
fn template_error(name: &str, err: &tera::Error) -> RenderError {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    RenderError::Template {
        name: name.to_owned(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn ctx(value: Value) -> PageContext {
        match value {
            Value::Object(map) => map,
            _ => panic!("context must be an object"),
        }
    }

    #[test]
    fn test_render_context() {
        let renderer = TeraRenderer::from_raw(&[("index.html", "<h1>{{ title }}</h1>")]).unwrap();
        let html = renderer
            .render("index.html", &ctx(json!({"title": "Hello"})))
            .unwrap();
        assert_eq!(html, "<h1>Hello</h1>");
    }

    #[test]
    fn test_markdown_filter() {
        let renderer =
            TeraRenderer::from_raw(&[("a.html", "{{ body | markdown | safe }}")]).unwrap();
        let html = renderer.render("a.html", &ctx(json!({"body": "*hi*"}))).unwrap();
        assert_eq!(html, "<p><em>hi</em></p>\n");
    }

    #[test]
    fn test_tojson_filter() {
        let renderer = TeraRenderer::from_raw(&[("a.html", "{{ data | tojson | safe }}")]).unwrap();
        let html = renderer
            .render("a.html", &ctx(json!({"data": {"a": 1}})))
            .unwrap();
        assert_eq!(html, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_builtin_filters() {
        let renderer =
            TeraRenderer::from_raw(&[("a.html", "{{ name | slugify }}")]).unwrap();
        let html = renderer
            .render("a.html", &ctx(json!({"name": "Hello World"})))
            .unwrap();
        assert_eq!(html, "hello-world");
    }

    #[test]
    fn test_missing_template() {
        let renderer = TeraRenderer::from_raw(&[]).unwrap();
        let err = renderer.render("nope.html", &PageContext::new()).unwrap_err();
        assert!(matches!(err, RenderError::Template { ref name, .. } if name == "nope.html"));
    }

    #[test]
    fn test_undefined_variable_is_an_error() {
        let renderer = TeraRenderer::from_raw(&[("a.html", "{{ missing.field }}")]).unwrap();
        assert!(renderer.render("a.html", &PageContext::new()).is_err());
    }

    #[test]
    fn test_from_dir_with_layout() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("_base.html"),
            "<main>{% block body %}{% endblock %}</main>",
        )
        .unwrap();
        fs::create_dir(dir.path().join("partials")).unwrap();
        fs::write(dir.path().join("partials/nav.html"), "<nav></nav>").unwrap();
        fs::write(
            dir.path().join("index.html"),
            "{% extends \"_base.html\" %}{% block body %}{% include \"partials/nav.html\" %}{{ activePage }}{% endblock %}",
        )
        .unwrap();

        let renderer = TeraRenderer::from_dir(dir.path()).unwrap();
        let html = renderer
            .render("index.html", &ctx(json!({"activePage": "index"})))
            .unwrap();
        assert_eq!(html, "<main><nav></nav>index</main>");
    }

    #[test]
    fn test_from_dir_syntax_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "{% if %}").unwrap();
        assert!(matches!(
            TeraRenderer::from_dir(dir.path()),
            Err(RenderError::Template { .. })
        ));
    }
}
