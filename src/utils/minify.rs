//! Minification for production builds.
//!
//! Provides a unified `minify` function for pages, stylesheets, scripts and
//! PNG images, enabled only when the build runs with `--prod`.

use crate::config::SiteConfig;
use std::borrow::Cow;

// ============================================================================
// Types
// ============================================================================

/// Content type for minification.
pub enum MinifyType<'a> {
    /// Rendered page or bundle
    Html(&'a [u8]),
    /// Plain stylesheet
    Css(&'a [u8]),
    /// Script, treated as a classic (non-module) script
    Js(&'a [u8]),
    /// PNG image, recompressed losslessly
    Png(&'a [u8]),
}

// ============================================================================
// Unified Minify Function
// ============================================================================

/// Minify content based on type and config.
///
/// Returns `Cow::Borrowed` if minify is disabled (or the input cannot be
/// parsed), `Cow::Owned` if minified.
pub fn minify<'a>(content: MinifyType<'a>, config: &SiteConfig) -> Cow<'a, [u8]> {
    match content {
        MinifyType::Html(html) if config.build.prod => Cow::Owned(minify_html_inner(html)),
        MinifyType::Css(css) if config.build.prod => {
            minify_css_inner(css).map_or(Cow::Borrowed(css), Cow::Owned)
        }
        MinifyType::Js(js) if config.build.prod => {
            minify_js_inner(js).map_or(Cow::Borrowed(js), Cow::Owned)
        }
        MinifyType::Png(png) if config.build.prod => {
            optimize_png_inner(png).map_or(Cow::Borrowed(png), Cow::Owned)
        }
        MinifyType::Html(raw)
        | MinifyType::Css(raw)
        | MinifyType::Js(raw)
        | MinifyType::Png(raw) => Cow::Borrowed(raw),
    }
}

// ============================================================================
// Internal Implementation
// ============================================================================

/// Minify HTML content using `minify_html` crate.
fn minify_html_inner(html: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    minify_html::minify(html, &cfg)
}

/// Re-emit CSS through `grass` in compressed style.
///
/// Plain CSS is valid SCSS, so the compiler doubles as a minifier.
fn minify_css_inner(css: &[u8]) -> Option<Vec<u8>> {
    let source = std::str::from_utf8(css).ok()?;
    let options = grass::Options::default().style(grass::OutputStyle::Compressed);
    grass::from_string(source.to_owned(), &options)
        .ok()
        .map(String::into_bytes)
}

/// Minify a script using `minify_js`.
fn minify_js_inner(js: &[u8]) -> Option<Vec<u8>> {
    let session = minify_js::Session::new();
    let mut out = Vec::with_capacity(js.len());
    minify_js::minify(&session, minify_js::TopLevelMode::Global, js, &mut out).ok()?;
    Some(out)
}

/// Recompress a PNG with `oxipng`; keeps the original unless the result is smaller.
fn optimize_png_inner(png: &[u8]) -> Option<Vec<u8>> {
    oxipng::optimize_from_memory(png, &oxipng::Options::default())
        .ok()
        .filter(|out| out.len() < png.len())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_prod(prod: bool) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.build.prod = prod;
        config
    }

    #[test]
    fn test_minify_html_basic() {
        let html = b"<html>\n  <head>\n  </head>\n  <body>\n    <p>Hello</p>\n  </body>\n</html>";
        let result = minify(MinifyType::Html(html), &config_with_prod(true));
        let result_str = String::from_utf8_lossy(&result);

        assert!(!result_str.contains("\n  "));
        assert!(result_str.contains("<p>Hello</p>"));
    }

    #[test]
    fn test_minify_html_removes_comments() {
        let html = b"<p>Hi</p><!-- note -->";
        let result = minify(MinifyType::Html(html), &config_with_prod(true));
        assert!(!String::from_utf8_lossy(&result).contains("note"));
    }

    #[test]
    fn test_minify_html_toggle() {
        let html = b"<html>\n  <body>\n  </body>\n</html>";

        let minified = minify(MinifyType::Html(html), &config_with_prod(true));
        let not_minified = minify(MinifyType::Html(html), &config_with_prod(false));

        assert!(minified.len() < not_minified.len());
        assert!(matches!(not_minified, Cow::Borrowed(_)));
        assert_eq!(&*not_minified, html);
    }

    #[test]
    fn test_minify_css() {
        let css = b"body {\n  color: red;\n}\n\na {\n  color: blue;\n}\n";
        let result = minify(MinifyType::Css(css), &config_with_prod(true));
        let result_str = String::from_utf8_lossy(&result);

        assert!(!result_str.contains('\n') || result_str.trim_end().lines().count() == 1);
        assert!(result_str.contains("body{color:red}"));
    }

    #[test]
    fn test_minify_css_disabled() {
        let css = b"body {\n  color: red;\n}\n";
        let result = minify(MinifyType::Css(css), &config_with_prod(false));
        assert_eq!(&*result, css);
    }

    #[test]
    fn test_minify_css_invalid_is_kept() {
        let css = b"body { color: red;";
        let result = minify(MinifyType::Css(css), &config_with_prod(true));
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(&*result, css);
    }

    #[test]
    fn test_minify_js() {
        let js = b"function greet(name) {\n    // say hello\n    return 'Hello, ' + name;\n}\ngreet('x');\n";
        let minified = minify(MinifyType::Js(js), &config_with_prod(true));
        let plain = minify(MinifyType::Js(js), &config_with_prod(false));

        assert!(minified.len() < plain.len());
        assert!(!String::from_utf8_lossy(&minified).contains("say hello"));
        assert_eq!(&*plain, js);
    }

    #[test]
    fn test_minify_js_invalid_is_kept() {
        let js = b"function (";
        let result = minify(MinifyType::Js(js), &config_with_prod(true));
        assert!(matches!(result, Cow::Borrowed(_)));
    }

    #[test]
    fn test_png_not_an_image_is_kept() {
        let data = b"not a png";
        let result = minify(MinifyType::Png(data), &config_with_prod(true));
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(&*result, data);
    }
}
