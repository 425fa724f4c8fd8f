use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::IoError;

/// Directories never descended into, on top of any configured ones.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &["target", "build", "out", ".git"];

/// Collects every file under `root` with the given extension, sorted by
/// path so that discovery order does not depend on the filesystem.
pub fn walk_source_files(
    root: &Path,
    extension: &str,
    excluded_dirs: &[String],
    exclude_hidden: bool,
) -> Result<Vec<PathBuf>, IoError> {
    if !root.is_dir() {
        return Err(IoError::directory_not_found(root));
    }

    let is_excluded = |name: &str| {
        DEFAULT_EXCLUDED_DIRS.contains(&name) || excluded_dirs.iter().any(|d| d == name)
    };

    let mut files = Vec::new();
    let walker = WalkDir::new(root).into_iter().filter_entry(|e| {
        // The root itself is always walked, even when it is named `build`.
        if e.depth() == 0 || !e.file_type().is_dir() {
            return true;
        }
        let name = e.file_name().to_string_lossy();
        if exclude_hidden && name.starts_with('.') {
            return false;
        }
        !is_excluded(&name)
    });

    for entry in walker {
        let entry = entry.map_err(|e| IoError::scan_error(root, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if exclude_hidden && entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if entry.path().extension().is_some_and(|ext| ext == extension) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}
