//! SCSS/Sass compilation.
//!
//! Every non-partial stylesheet under `<assets>/scss` is compiled with
//! `grass` to `<out>/assets/css/<relative>.css`. Production builds emit
//! compressed CSS, development builds expanded CSS.
//!
//! A stylesheet that fails to compile is reported and skipped.

use crate::{
    compiler::{collect_all_files, plan::PARTIAL_PREFIX},
    config::SiteConfig,
    log,
    utils::path::rel_display,
};
use anyhow::{Context, Result, anyhow};
use grass::{Options, OutputStyle};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Stylesheet source directory, relative to the assets directory.
pub const SCSS_DIR: &str = "scss";
/// Compiled stylesheet directory, relative to the assets output directory.
pub const CSS_DIR: &str = "css";

/// Non-partial `*.scss` / `*.sass` files under `<assets>/scss`.
pub fn style_sources(config: &SiteConfig) -> Vec<PathBuf> {
    let mut files: Vec<_> = collect_all_files(&config.build.assets.join(SCSS_DIR))
        .into_iter()
        .filter(|p| is_entry_stylesheet(p))
        .collect();
    files.sort();
    files
}

/// Partials (`_name.scss`) are only reachable through `@use`/`@import`.
fn is_entry_stylesheet(path: &Path) -> bool {
    let is_sass = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e, "scss" | "sass"));
    let is_partial = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(PARTIAL_PREFIX));
    is_sass && !is_partial
}

/// Compile stylesheets; returns how many were written.
pub fn compile_styles(files: &[PathBuf], config: &SiteConfig, on_progress: impl Fn()) -> usize {
    let root = config.get_root();
    let mut written = 0;

    for file in files {
        match compile_style(file, config) {
            Ok(_) => written += 1,
            Err(err) => log!("warn"; "{}: {err:#}", rel_display(file, root)),
        }
        on_progress();
    }
    written
}

/// Compile one stylesheet and write it; returns the output path.
pub fn compile_style(source: &Path, config: &SiteConfig) -> Result<PathBuf> {
    let scss_dir = config.build.assets.join(SCSS_DIR);
    let output = css_output_path(source, config)?;

    let style = if config.build.prod {
        OutputStyle::Compressed
    } else {
        OutputStyle::Expanded
    };
    let options = Options::default().load_path(&scss_dir).style(style);

    let css = grass::from_path(source, &options).map_err(|e| anyhow!("{e}"))?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, css).with_context(|| format!("cannot write {}", output.display()))?;
    Ok(output)
}

/// `<assets>/scss/a/b.scss` → `<out>/assets/css/a/b.css`
pub fn css_output_path(source: &Path, config: &SiteConfig) -> Result<PathBuf> {
    let rel = source
        .strip_prefix(config.build.assets.join(SCSS_DIR))
        .with_context(|| format!("{} is outside the scss directory", source.display()))?;
    Ok(config
        .assets_output()
        .join(CSS_DIR)
        .join(rel)
        .with_extension("css"))
}
