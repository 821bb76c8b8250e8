//! File system watcher for live rebuilds.
//!
//! Monitors the source directory and config file and re-runs the affected
//! generating branches.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                         Event Loop                             │
//! │                                                                │
//! │  ┌──────────┐    ┌──────────┐    ┌──────────────────────────┐  │
//! │  │ notify   │───▶│ Debouncer│───▶│ plan_rebuild()           │  │
//! │  │ events   │    │ (300ms)  │    │   categorize → Scope set │  │
//! │  └──────────┘    └──────────┘    └────────────┬─────────────┘  │
//! │                                               ▼                │
//! │                                  build::rebuild(config, scope) │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The configuration is loaded once per process. Editing it only re-runs
//! the pages branch with the old settings; a restart picks up the change.

use crate::{
    build::{Generated, Scope, rebuild},
    config::SiteConfig,
    log,
    logger::WatchStatus,
    utils::{
        category::{FileCategory, categorize_path},
        path::rel_display,
    },
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::mpsc::{self, RecvTimeoutError},
    time::{Duration, Instant},
};

// =============================================================================
// Constants
// =============================================================================

const DEBOUNCE_MS: u64 = 300;

// =============================================================================
// Path Utilities
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
        }
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        let mut paths: Vec<_> = self.pending.drain().collect();
        paths.sort();
        paths
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

// =============================================================================
// Rebuild Planning
// =============================================================================

/// What a batch of changes requires.
#[derive(Debug, Default, PartialEq, Eq)]
struct RebuildPlan {
    /// Branches to re-run; a single `Scope::All` when every branch is hit.
    scopes: Vec<Scope>,
    config_changed: bool,
    /// Changed paths that matter, relative to the root.
    triggers: Vec<String>,
}

fn plan_rebuild(paths: &[PathBuf], config: &SiteConfig) -> RebuildPlan {
    let root = config.get_root();
    let mut plan = RebuildPlan::default();
    let mut scopes = FxHashSet::default();

    for path in paths {
        let category = categorize_path(path, config);
        let Some(scope) = category.scope() else {
            continue;
        };
        if category == FileCategory::Config {
            plan.config_changed = true;
        }
        scopes.insert(scope);
        plan.triggers.push(rel_display(path, root));
    }

    plan.scopes = if scopes.len() == 3 {
        vec![Scope::All]
    } else {
        [Scope::Pages, Scope::Styles, Scope::Assets]
            .into_iter()
            .filter(|s| scopes.contains(s))
            .collect()
    };
    plan
}

const fn scope_name(scope: Scope) -> &'static str {
    match scope {
        Scope::Pages => "pages",
        Scope::Styles => "styles",
        Scope::Assets => "assets",
        Scope::All => "site",
    }
}

// =============================================================================
// Event Handler
// =============================================================================

fn handle_changes(paths: &[PathBuf], config: &SiteConfig, status: &mut WatchStatus) {
    let plan = plan_rebuild(paths, config);
    if plan.scopes.is_empty() {
        if let Some(path) = paths.first() {
            status.unchanged(&rel_display(path, config.get_root()));
        }
        return;
    }

    if plan.config_changed {
        log!("watch"; "config changed, restart to apply new settings");
    }

    let mut failed = 0;
    for &scope in &plan.scopes {
        let Generated { pages, .. } = rebuild(config, scope);
        failed += pages.failed;
    }

    let names: Vec<_> = plan.scopes.iter().map(|&s| scope_name(s)).collect();
    let trigger = plan.triggers.join(", ");
    if failed == 0 {
        status.success(&format!("rebuilt {}: {trigger}", names.join(", ")));
    } else {
        status.error(
            &format!("{failed} pages failed after {trigger} changed"),
            "see the errors above",
        );
    }
}

// =============================================================================
// Watcher Setup
// =============================================================================

fn setup_watchers(watcher: &mut impl Watcher, config: &SiteConfig) -> Result<()> {
    let root = config.get_root();
    let source = &config.build.source;

    watcher
        .watch(source, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", source.display()))?;

    if config.config_path.exists() {
        watcher
            .watch(&config.config_path, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", config.config_path.display()))?;
    }

    log!(
        "watch";
        "watching {}/ and {}",
        rel_display(source, root),
        rel_display(&config.config_path, root)
    );
    Ok(())
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Public API
// =============================================================================

/// Start blocking file watcher with debouncing and live rebuild.
pub fn watch_for_changes_blocking(config: &'static SiteConfig) -> Result<()> {
    if !config.serve.watch {
        return Ok(());
    }

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    setup_watchers(&mut watcher, config)?;

    let mut debouncer = Debouncer::new();
    let mut status = WatchStatus::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event),
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => {
                handle_changes(&debouncer.take(), config, &mut status);
            }
            Err(RecvTimeoutError::Disconnected) => break,
            // Irrelevant events, timeout without pending changes
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, SiteConfig) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let config_path = root.join("config.yaml");
        fs::write(&config_path, "").unwrap();

        let mut config = SiteConfig::default();
        config.update_path_with_root(&root);
        config.config_path = config_path;
        (dir, config)
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("src/data/en.index.yaml~")));
        assert!(is_temp_file(Path::new("src/templates/.index.html.swp")));
        assert!(is_temp_file(Path::new("src/a.tmp")));
        assert!(!is_temp_file(Path::new("src/templates/index.html")));
    }

    #[test]
    fn test_plan_data_change() {
        let (_dir, config) = setup();
        let paths = [config.build.data.join("en.index.yaml")];

        let plan = plan_rebuild(&paths, &config);
        assert_eq!(plan.scopes, [Scope::Pages]);
        assert!(!plan.config_changed);
        assert_eq!(plan.triggers, ["src/data/en.index.yaml"]);
    }

    #[test]
    fn test_plan_merges_scopes() {
        let (_dir, config) = setup();
        let paths = [
            config.build.templates.join("index.html"),
            config.build.data.join("en.index.yaml"),
            config.build.assets.join("scss/main.scss"),
        ];

        let plan = plan_rebuild(&paths, &config);
        assert_eq!(plan.scopes, [Scope::Pages, Scope::Styles]);
    }

    #[test]
    fn test_plan_all_branches() {
        let (_dir, config) = setup();
        let paths = [
            config.build.templates.join("index.html"),
            config.build.assets.join("scss/main.scss"),
            config.build.assets.join("js/app.js"),
        ];
        assert_eq!(plan_rebuild(&paths, &config).scopes, [Scope::All]);
    }

    #[test]
    fn test_plan_config_change() {
        let (_dir, config) = setup();
        let paths = [config.config_path.clone()];

        let plan = plan_rebuild(&paths, &config);
        assert!(plan.config_changed);
        assert_eq!(plan.scopes, [Scope::Pages]);
    }

    #[test]
    fn test_plan_ignores_unknown() {
        let (_dir, config) = setup();
        let paths = [config.get_root().join("README.md")];
        assert_eq!(plan_rebuild(&paths, &config), RebuildPlan::default());
    }

    #[test]
    fn test_debouncer_batches_paths() {
        let mut debouncer = Debouncer::new();
        assert!(!debouncer.ready());
        assert_eq!(debouncer.timeout(), Duration::from_secs(60));

        let event = Event::new(EventKind::Any)
            .add_path(PathBuf::from("/b.html"))
            .add_path(PathBuf::from("/a.html"))
            .add_path(PathBuf::from("/a.html~"));
        debouncer.add(event);

        assert_eq!(debouncer.timeout(), Duration::from_millis(DEBOUNCE_MS));
        assert_eq!(
            debouncer.take(),
            [PathBuf::from("/a.html"), PathBuf::from("/b.html")]
        );
        assert!(!debouncer.ready());
    }
}
