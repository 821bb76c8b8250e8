//! Page rendering and writing.
//!
//! Executes the tasks produced by [`super::plan`] in parallel. A failing
//! task is logged and counted; it never stops its siblings.

use super::{
    plan::{RenderTask, SiteSources, TaskKind, plan},
    render::{RenderError, Renderer, TeraRenderer},
};
use crate::{
    config::SiteConfig,
    data::resolve_all,
    log,
    utils::{
        minify::{MinifyType, minify},
        path::rel_display,
    },
};
use rayon::prelude::*;
use std::{
    borrow::Cow,
    fs,
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Outcome of a render run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub written: usize,
    pub failed: usize,
}

impl RenderSummary {
    pub const fn is_ok(&self) -> bool {
        self.failed == 0
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Resolve data for every language and plan every output file.
pub fn plan_site(config: &SiteConfig) -> Vec<RenderTask> {
    let contexts = resolve_all(config);
    let sources = SiteSources::discover(config);
    plan(config, &sources, &contexts)
}

/// Render and write all tasks with templates loaded from the templates dir.
///
/// When the template set itself fails to load, every templated task fails
/// with that error; bundles are still copied.
pub fn render_tasks(
    tasks: &[RenderTask],
    config: &SiteConfig,
    on_progress: impl Fn() + Sync,
) -> RenderSummary {
    let renderer = TeraRenderer::from_dir(&config.build.templates);
    if let Err(err) = &renderer {
        log!("error"; "{err}");
    }

    let renderer: Option<&dyn Renderer> = renderer.as_ref().ok().map(|r| r as &dyn Renderer);
    execute_tasks(tasks, renderer, config, on_progress)
}

/// Render and write all tasks with the given renderer.
pub fn execute_tasks(
    tasks: &[RenderTask],
    renderer: Option<&dyn Renderer>,
    config: &SiteConfig,
    on_progress: impl Fn() + Sync,
) -> RenderSummary {
    let written = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let root = config.get_root();

    tasks.par_iter().for_each(|task| {
        match execute_task(task, renderer, config) {
            Ok(()) => {
                written.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                failed.fetch_add(1, Ordering::Relaxed);
                log!("error"; "{}: {err}", rel_display(&task.output, root));
            }
        }
        on_progress();
    });

    RenderSummary {
        written: written.into_inner(),
        failed: failed.into_inner(),
    }
}

// ============================================================================
// Internal
// ============================================================================

fn execute_task(
    task: &RenderTask,
    renderer: Option<&dyn Renderer>,
    config: &SiteConfig,
) -> Result<(), RenderError> {
    let content = match &task.kind {
        TaskKind::Page { template } | TaskKind::Item { template } => {
            let renderer = renderer.ok_or_else(|| RenderError::Template {
                name: template.clone(),
                message: "templates failed to load".into(),
            })?;
            renderer.render(template, &task.context)?.into_bytes()
        }
        TaskKind::Bundle { source } => fs::read(source).map_err(|source_err| RenderError::Read {
            path: source.clone(),
            source: source_err,
        })?,
    };

    let content = if is_html(task) {
        minify(MinifyType::Html(&content), config)
    } else {
        Cow::Borrowed(content.as_slice())
    };
    write_file(&task.output, &content)
}

/// Rendered pages are HTML; bundles only when their extension says so.
fn is_html(task: &RenderTask) -> bool {
    let html_bundle = |source: &Path| {
        source
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
    };
    task.template().is_some()
        || matches!(&task.kind, TaskKind::Bundle { source } if html_bundle(source))
}

fn write_file(path: &Path, content: &[u8]) -> Result<(), RenderError> {
    let write_err = |source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, content).map_err(write_err)
}
