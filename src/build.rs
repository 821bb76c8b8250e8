//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── Cleaning     remove output directory
//!     │
//!     ├── Generating   rayon::join ─┬── pages    resolve → plan → render
//!     │                             ├── styles   scss → css
//!     │                             └── assets   copy / minify
//!     │
//!     ├── Finalizing   size report, raw and gzip (after all branches joined)
//!     │
//!     └── Done         (Failed from any state on error)
//! ```
//!
//! Watch mode calls [`rebuild`] to re-enter `Generating` for a subset of
//! branches without cleaning.

use crate::{
    compiler::{
        assets::{asset_sources, process_assets},
        pages::{RenderSummary, plan_site, render_tasks},
        plan::RenderTask,
        styles::{compile_styles, style_sources},
    },
    config::SiteConfig,
    log,
    logger::{Branch, Progress},
};
use anyhow::{Context, Result, bail};
use flate2::{Compression, write::GzEncoder};
use std::{
    fmt,
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

// ============================================================================
// Types
// ============================================================================

/// Build lifecycle. Every transition is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    Cleaning,
    Generating,
    Finalizing,
    Done,
    Failed,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Cleaning => "cleaning",
            Self::Generating => "generating",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

/// Tracks the current [`BuildState`] and logs transitions.
#[derive(Debug)]
struct StateMachine {
    state: BuildState,
}

impl StateMachine {
    const fn new() -> Self {
        Self {
            state: BuildState::Idle,
        }
    }

    fn enter(&mut self, next: BuildState) {
        if next == BuildState::Failed {
            log!("error"; "build failed while {}", self.state);
        } else {
            log!("build"; "{next}");
        }
        self.state = next;
    }
}

/// Which generating branches a rebuild runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Pages,
    Styles,
    Assets,
    All,
}

impl Scope {
    const fn pages(self) -> bool {
        matches!(self, Self::Pages | Self::All)
    }
    const fn styles(self) -> bool {
        matches!(self, Self::Styles | Self::All)
    }
    const fn assets(self) -> bool {
        matches!(self, Self::Assets | Self::All)
    }
}

/// Result of the `Generating` phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Generated {
    pub pages: RenderSummary,
    pub styles: usize,
    pub assets: usize,
}

/// One file of the build output.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct OutputFile {
    /// Relative to the output dir
    pub path: PathBuf,
    pub bytes: u64,
    /// Size after gzip at the default level
    pub gzip_bytes: u64,
}

/// Result of a full build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub state: BuildState,
    pub generated: Generated,
    /// Sorted by path.
    pub files: Vec<OutputFile>,
    pub total_bytes: u64,
    pub total_gzip_bytes: u64,
}

// ============================================================================
// Public API
// ============================================================================

/// Clean the output directory and build the whole site.
///
/// Render failures do not fail the build; they are counted in
/// `report.generated.pages.failed` for the caller to act on.
pub fn build_site(config: &SiteConfig) -> Result<BuildReport> {
    let mut machine = StateMachine::new();
    let result = run_build(config, &mut machine);
    if result.is_err() {
        machine.enter(BuildState::Failed);
    }
    result
}

/// Re-run a subset of the generating branches without cleaning.
pub fn rebuild(config: &SiteConfig, scope: Scope) -> Generated {
    generate(config, scope)
}

// ============================================================================
// Phases
// ============================================================================

fn run_build(config: &SiteConfig, machine: &mut StateMachine) -> Result<BuildReport> {
    let output = &config.build.output;

    machine.enter(BuildState::Cleaning);
    clean_output(config)?;

    machine.enter(BuildState::Generating);
    let generated = generate(config, Scope::All);

    machine.enter(BuildState::Finalizing);
    let files = output_sizes(output)?;
    let total_bytes = files.iter().map(|f| f.bytes).sum();
    let total_gzip_bytes = files.iter().map(|f| f.gzip_bytes).sum();
    log_sizes(&files);

    if files.is_empty() {
        log!("warn"; "output is empty, check the templates directory");
    }
    log!(
        "build";
        "{} pages, {} stylesheets, {} assets",
        generated.pages.written, generated.styles, generated.assets
    );
    if !generated.pages.is_ok() {
        log!("error"; "{} pages failed to render", generated.pages.failed);
    }

    machine.enter(BuildState::Done);
    Ok(BuildReport {
        state: machine.state,
        generated,
        files,
        total_bytes,
        total_gzip_bytes,
    })
}

/// Remove the output directory. A missing directory is fine.
fn clean_output(config: &SiteConfig) -> Result<()> {
    let output = &config.build.output;
    if config.build.source.starts_with(output) {
        bail!(
            "output directory {} contains the sources, refusing to clean it",
            output.display()
        );
    }
    if output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    Ok(())
}

/// Run the selected branches concurrently and wait for all of them.
fn generate(config: &SiteConfig, scope: Scope) -> Generated {
    let tasks: Vec<RenderTask> = if scope.pages() { plan_site(config) } else { Vec::new() };
    let style_files = if scope.styles() { style_sources(config) } else { Vec::new() };
    let asset_files = if scope.assets() { asset_sources(config) } else { Vec::new() };

    let progress = Progress::start(tasks.len(), style_files.len(), asset_files.len());
    let tick = |branch| {
        if let Some(progress) = &progress {
            progress.tick(branch);
        }
    };

    let (pages, (styles, assets)) = rayon::join(
        || render_tasks(&tasks, config, || tick(Branch::Pages)),
        || {
            rayon::join(
                || compile_styles(&style_files, config, || tick(Branch::Styles)),
                || process_assets(&asset_files, config, || tick(Branch::Assets)),
            )
        },
    );

    // Clears the progress line
    drop(progress);

    Generated {
        pages,
        styles,
        assets,
    }
}

/// Every file under `output` with its sizes, sorted by relative path.
fn output_sizes(output: &Path) -> Result<Vec<OutputFile>> {
    if !output.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(output) {
        let entry = entry.with_context(|| format!("cannot walk {}", output.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        files.push(OutputFile {
            path: entry.path().strip_prefix(output)?.to_path_buf(),
            bytes: entry.metadata()?.len(),
            gzip_bytes: gzip_size(entry.path())?,
        });
    }
    files.sort();
    Ok(files)
}

/// Size of a file once gzipped.
fn gzip_size(path: &Path) -> Result<u64> {
    let mut file = File::open(path).with_context(|| format!("cannot read {}", path.display()))?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    io::copy(&mut file, &mut encoder)?;
    Ok(encoder.finish()?.len() as u64)
}

fn log_sizes(files: &[OutputFile]) {
    for file in files {
        log!(
            "size";
            "{:>10}  {:>10} gzip  {}",
            format_size(file.bytes),
            format_size(file.gzip_bytes),
            file.path.display()
        );
    }
}

/// Human readable byte count.
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

// ============================================================================
// Tests
// ============================================================================
