//! Path helpers shared by config, build and watch.

use std::{
    env,
    path::{Path, PathBuf},
};

/// Normalize a path to absolute form for reliable comparison.
///
/// Uses `canonicalize` when the path exists; otherwise joins it onto the
/// current directory.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Display `path` relative to `root` for log lines.
///
/// `/proj/src/data/en.index.yaml` → `src/data/en.index.yaml`
pub fn rel_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let normalized = normalize_path(dir.path());
        assert_eq!(normalized, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_normalize_missing_relative_path() {
        let normalized = normalize_path(Path::new("surely/not/here"));
        assert!(normalized.is_absolute());
        assert!(normalized.ends_with("surely/not/here"));
    }

    #[test]
    fn test_normalize_missing_absolute_path() {
        let path = Path::new("/surely/not/here");
        assert_eq!(normalize_path(path), path);
    }

    #[test]
    fn test_rel_display() {
        let root = Path::new("/proj");
        assert_eq!(rel_display(Path::new("/proj/src/a.yaml"), root), "src/a.yaml");
        assert_eq!(rel_display(Path::new("/other/a.yaml"), root), "/other/a.yaml");
    }
}
