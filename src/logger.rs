//! Terminal output: colored log lines, build progress, watch status.
//!
//! While a build runs, the bottom terminal line shows one progress line for
//! the three generating branches:
//!
//! ```text
//! [build] [████████░░░░░░░░] pages 12/30  styles 1/1  assets 3/9
//! ```
//!
//! Log lines are printed above it and the progress line is redrawn below
//! each of them.

use colored::{ColoredString, Colorize};
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{StdoutLock, Write, stdout},
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
    time::SystemTime,
};

/// Cached terminal width
static TERMINAL_WIDTH: OnceLock<usize> = OnceLock::new();

/// Progress line currently on screen, if a build is running.
static PROGRESS_LINE: Mutex<Option<String>> = Mutex::new(None);

const MIN_BAR_WIDTH: usize = 10;
const MAX_BAR_WIDTH: usize = 40;

fn terminal_width() -> usize {
    *TERMINAL_WIDTH.get_or_init(|| size().map_or(120, |(w, _)| usize::from(w)))
}

/// Move to the start of the current line and clear it.
fn clear_line(stdout: &mut StdoutLock<'_>) {
    execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
}

// ============================================================================
// Log
// ============================================================================

/// Log a message with a colored module prefix.
///
/// ```ignore
/// log!("warn"; "missing {} for {}", file, lang);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Print `[module] message`, truncated to the terminal width unless it spans
/// several lines.
pub fn log(module: &str, message: &str) {
    let progress = PROGRESS_LINE.lock().ok();
    let mut stdout = stdout().lock();
    clear_line(&mut stdout);

    let message = if message.contains('\n') {
        message
    } else {
        truncate_str(message, terminal_width().saturating_sub(module.len() + 3))
    };
    writeln!(stdout, "{} {message}", colorize_prefix(module)).ok();

    if let Some(line) = progress.as_deref().and_then(Option::as_deref) {
        write!(stdout, "{line}").ok();
    }
    stdout.flush().ok();
}

fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module {
        "serve" => prefix.bright_blue().bold(),
        "watch" => prefix.bright_green().bold(),
        "error" => prefix.bright_red().bold(),
        "warn" => prefix.bright_magenta().bold(),
        "size" => prefix.bright_cyan().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Cut `s` to at most `max_len` bytes on a char boundary.
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============================================================================
// Build Progress
// ============================================================================

/// A generating branch of the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Pages,
    Styles,
    Assets,
}

impl Branch {
    const ALL: [Self; 3] = [Self::Pages, Self::Styles, Self::Assets];

    const fn name(self) -> &'static str {
        match self {
            Self::Pages => "pages",
            Self::Styles => "styles",
            Self::Assets => "assets",
        }
    }
}

/// Progress of one build, shared by the branch threads.
///
/// Dropping it removes the progress line.
pub struct Progress {
    totals: [usize; 3],
    done: [AtomicUsize; 3],
}

impl Progress {
    /// Start showing progress for the given per-branch totals.
    ///
    /// Returns `None` when there is at most one item overall.
    pub fn start(pages: usize, styles: usize, assets: usize) -> Option<Self> {
        if pages + styles + assets <= 1 {
            return None;
        }
        let progress = Self {
            totals: [pages, styles, assets],
            done: Default::default(),
        };
        progress.draw();
        Some(progress)
    }

    /// Count one finished item of `branch`.
    pub fn tick(&self, branch: Branch) {
        self.done[branch as usize].fetch_add(1, Ordering::Relaxed);
        self.draw();
    }

    fn draw(&self) {
        let line = self.line(terminal_width());
        let Ok(mut shown) = PROGRESS_LINE.lock() else {
            return;
        };
        let mut stdout = stdout().lock();
        clear_line(&mut stdout);
        write!(stdout, "{line}").ok();
        stdout.flush().ok();
        *shown = Some(line);
    }

    /// `pages 3/10  assets 0/4`, leaving out branches with nothing to do.
    fn counts(&self) -> String {
        Branch::ALL
            .iter()
            .filter(|b| self.totals[**b as usize] > 0)
            .map(|b| {
                let i = *b as usize;
                format!("{} {}/{}", b.name(), self.done[i].load(Ordering::Relaxed), self.totals[i])
            })
            .collect::<Vec<_>>()
            .join("  ")
    }

    fn line(&self, width: usize) -> String {
        let counts = self.counts();
        let total: usize = self.totals.iter().sum();
        let done: usize = self.done.iter().map(|d| d.load(Ordering::Relaxed)).sum();

        // "[build] [" + "] " + counts
        let room = width.saturating_sub("[build] [] ".len() + counts.len());
        let bar = bar(done, total, room.clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH));
        format!("{} [{bar}] {counts}", colorize_prefix("build"))
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        let shown = PROGRESS_LINE.lock();
        let mut stdout = stdout().lock();
        clear_line(&mut stdout);
        stdout.flush().ok();
        if let Ok(mut shown) = shown {
            *shown = None;
        }
    }
}

/// A `width` wide bar filled in proportion to `done / total`.
fn bar(done: usize, total: usize, width: usize) -> String {
    let filled = if total == 0 { 0 } else { (done.min(total) * width) / total };
    "█".repeat(filled) + &"░".repeat(width - filled)
}

// ============================================================================
// Watch Status
// ============================================================================

/// `HH:MM:SS` (UTC) of a unix timestamp.
fn clock(secs: u64) -> String {
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

fn now() -> String {
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    clock(secs)
}

/// Timestamped rebuild results in watch mode.
///
/// An `unchanged` line is replaced by whatever comes next; rebuilds and
/// errors stay on screen.
pub struct WatchStatus {
    replace_last: bool,
}

impl WatchStatus {
    pub const fn new() -> Self {
        Self { replace_last: false }
    }

    pub fn success(&mut self, message: &str) {
        self.print(&format!("{} {message}", "✓".green()), false);
    }

    pub fn unchanged(&mut self, path: &str) {
        self.print(&format!("unchanged: {path}").dimmed().to_string(), true);
    }

    /// `summary` on the status line, `detail` (if any) below it.
    pub fn error(&mut self, summary: &str, detail: &str) {
        self.print(&format!("{} {summary}", "✗".red()), false);
        if !detail.is_empty() {
            let mut stdout = stdout().lock();
            writeln!(stdout, "{detail}").ok();
            stdout.flush().ok();
        }
    }

    fn print(&mut self, line: &str, transient: bool) {
        let mut stdout = stdout().lock();
        if self.replace_last {
            execute!(stdout, cursor::MoveUp(1)).ok();
        }
        clear_line(&mut stdout);
        writeln!(stdout, "{} {line}", format!("[{}]", now()).dimmed()).ok();
        stdout.flush().ok();
        self.replace_last = transient;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 5), "hello");
        assert_eq!(truncate_str("hello", 0), "");
        // "é" is 2 bytes; cutting inside it backs off to the boundary
        assert_eq!(truncate_str("café", 4), "caf");
        assert_eq!(truncate_str("a€b", 3), "a");
    }

    #[test]
    fn test_clock() {
        assert_eq!(clock(0), "00:00:00");
        assert_eq!(clock(3600 + 61), "01:01:01");
        assert_eq!(clock(86_400 + 59), "00:00:59");
    }

    #[test]
    fn test_bar() {
        assert_eq!(bar(0, 4, 4), "░░░░");
        assert_eq!(bar(1, 4, 4), "█░░░");
        assert_eq!(bar(4, 4, 4), "████");
        assert_eq!(bar(9, 4, 4), "████");
        assert_eq!(bar(0, 0, 2), "░░");
    }

    #[test]
    fn test_progress_needs_more_than_one_item() {
        assert!(Progress::start(0, 0, 0).is_none());
        assert!(Progress::start(0, 1, 0).is_none());
        assert!(Progress::start(1, 1, 0).is_some());
    }

    #[test]
    fn test_progress_counts_skip_idle_branches() {
        let progress = Progress::start(4, 0, 2).unwrap();
        progress.tick(Branch::Assets);
        progress.tick(Branch::Assets);
        progress.tick(Branch::Pages);

        assert_eq!(progress.counts(), "pages 1/4  assets 2/2");
    }

    #[test]
    fn test_progress_line_fits_width() {
        let progress = Progress::start(30, 1, 9).unwrap();
        let line = progress.line(120);
        assert!(line.contains(&format!("[{}]", "░".repeat(MAX_BAR_WIDTH))));
        assert!(line.ends_with("pages 0/30  styles 0/1  assets 0/9"));

        let narrow = progress.line(20);
        assert!(narrow.contains(&format!("[{}]", "░".repeat(MIN_BAR_WIDTH))));
    }

    #[test]
    fn test_watch_status_replaces_only_unchanged() {
        let mut status = WatchStatus::new();
        status.unchanged("src/notes.txt");
        assert!(status.replace_last);

        status.error("1 page failed", "template `post.html`:\nunknown variable");
        assert!(!status.replace_last);

        status.success("rebuilt pages");
        assert!(!status.replace_last);
    }
}
