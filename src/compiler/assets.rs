//! Static asset processing.
//!
//! | Source                 | Output                  | Production       |
//! |------------------------|-------------------------|------------------|
//! | `css/**/*.css`         | `assets/css/...`        | minified         |
//! | `js/**/*.js`           | `assets/js/...`         | minified         |
//! | `img/**/*.png`         | `assets/img/...`        | recompressed     |
//! | `img/**/*`             | `assets/img/...`        | copied           |
//! | anything else          | `assets/...`            | copied           |
//!
//! `scss/` belongs to [`super::styles`] and is skipped here.

use super::styles::SCSS_DIR;
use crate::{
    compiler::collect_all_files,
    config::SiteConfig,
    log,
    utils::{
        minify::{MinifyType, minify},
        path::rel_display,
    },
};
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// How an asset is turned into its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Plain stylesheet, minified in production.
    Stylesheet,
    /// Script, minified in production.
    Script,
    /// PNG image, losslessly recompressed in production.
    Png,
    /// Copied byte for byte.
    Verbatim,
}

impl AssetKind {
    /// Classify a path relative to the assets directory.
    pub fn of(rel: &Path) -> Self {
        let ext = rel.extension().and_then(|e| e.to_str()).unwrap_or_default();
        match (rel.iter().next().and_then(|d| d.to_str()), ext) {
            (Some("css"), "css") => Self::Stylesheet,
            (Some("js"), "js") => Self::Script,
            (Some("img"), e) if e.eq_ignore_ascii_case("png") => Self::Png,
            _ => Self::Verbatim,
        }
    }
}

/// Every file under the assets directory except stylesheet sources.
pub fn asset_sources(config: &SiteConfig) -> Vec<PathBuf> {
    let assets = &config.build.assets;
    let scss = assets.join(SCSS_DIR);
    let mut files: Vec<_> = collect_all_files(assets)
        .into_iter()
        .filter(|p| !p.starts_with(&scss))
        .collect();
    files.sort();
    files
}

/// Process assets; returns how many were written. Failures are logged.
pub fn process_assets(files: &[PathBuf], config: &SiteConfig, on_progress: impl Fn()) -> usize {
    let root = config.get_root();
    let mut written = 0;

    for file in files {
        match process_asset(file, config) {
            Ok(_) => written += 1,
            Err(err) => log!("error"; "{}: {err:#}", rel_display(file, root)),
        }
        on_progress();
    }
    written
}

/// Process one asset; returns the output path.
pub fn process_asset(source: &Path, config: &SiteConfig) -> Result<PathBuf> {
    let rel = source
        .strip_prefix(&config.build.assets)
        .with_context(|| format!("{} is outside the assets directory", source.display()))?;
    let dest = config.assets_output().join(rel);

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let wrap: fn(&[u8]) -> MinifyType<'_> = match AssetKind::of(rel) {
        AssetKind::Stylesheet => |b| MinifyType::Css(b),
        AssetKind::Script => |b| MinifyType::Js(b),
        AssetKind::Png => |b| MinifyType::Png(b),
        AssetKind::Verbatim => {
            fs::copy(source, &dest)?;
            return Ok(dest);
        }
    };
    let content = fs::read(source)?;
    fs::write(&dest, &*minify(wrap(&content), config))?;
    Ok(dest)
}
