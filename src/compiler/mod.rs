//! Output generation.
//!
//! - **plan**: turn per-language contexts into render tasks (no I/O)
//! - **render**: template engine behind the `Renderer` trait
//! - **pages**: execute render tasks in parallel and write HTML
//! - **styles**: compile SCSS/Sass
//! - **assets**: copy and minify static files
//!
//! # Build Flow
//!
//! ```text
//! resolve_all() ──► plan() ──► render_tasks()      pages + bundles
//!                              compile_styles()    assets/css
//!                              process_assets()    assets/*
//! ```

pub mod assets;
pub mod pages;
pub mod plan;
pub mod render;
pub mod styles;

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// Collect all files from a directory recursively.
///
/// A missing directory yields an empty list.
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_all_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/c.txt"), "").unwrap();
        fs::write(dir.path().join("top.txt"), "").unwrap();
        fs::write(dir.path().join(".DS_Store"), "").unwrap();

        let mut files = collect_all_files(dir.path());
        files.sort();
        assert_eq!(
            files,
            [dir.path().join("a/b/c.txt"), dir.path().join("top.txt")]
        );
    }

    #[test]
    fn test_collect_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_all_files(&dir.path().join("nope")).is_empty());
    }
}
