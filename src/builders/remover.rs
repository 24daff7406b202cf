use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};
use tracing::{debug, info, warn};

use crate::builders::validator::check_path;

/// Outcome of a batch delete, one entry per requested path.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DeleteReport {
    /// Paths that are gone, including every descendant of a directory.
    pub removed: Vec<PathBuf>,
    /// Paths that were invalid (missing, hidden, blank) when their turn came.
    pub skipped: Vec<PathBuf>,
    /// Paths left behind, possibly partially emptied.
    pub failed: Vec<PathBuf>,
}

impl DeleteReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Deletes a single file. Returns `true` only if the file existed and was removed.
///
/// A symbolic link is removed itself; its target is never touched. Directories
/// are refused.
pub fn delete_file(path: &Path) -> bool {
    let Ok(metadata) = fs::symlink_metadata(path) else {
        return false;
    };
    if metadata.is_dir() {
        return false;
    }

    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "deleted file");
            true
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to delete file");
            false
        }
    }
}

/// One directory being emptied: the children not yet visited.
struct Frame {
    dir: PathBuf,
    children: std::vec::IntoIter<PathBuf>,
}

impl Frame {
    fn open(dir: PathBuf) -> Option<Self> {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "failed to list directory for deletion");
                return None;
            }
        };

        let mut children = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => children.push(entry.path()),
                Err(err) => {
                    warn!(dir = %dir.display(), error = %err, "failed to read directory entry");
                    return None;
                }
            }
        }

        Some(Self {
            dir,
            children: children.into_iter(),
        })
    }
}

/// Deletes a directory and everything beneath it, children before parents.
///
/// Fail-fast: the first child that cannot be removed (or a subdirectory that
/// cannot be listed) stops the whole operation. The directory containing the
/// failure and every ancestor up to `path` are left in place; siblings not yet
/// visited are left untouched. Nothing already removed is restored.
///
/// Returns `false` if `path` is not an existing directory. A symbolic link to
/// a directory is not a directory here.
pub fn delete_directory(path: &Path) -> bool {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => {}
        _ => return false,
    }

    let Some(root) = Frame::open(with_trailing_separator(path)) else {
        return false;
    };
    let mut stack = vec![root];

    loop {
        let Some(frame) = stack.last_mut() else {
            return true;
        };

        match frame.children.next() {
            Some(child) => {
                let is_dir = fs::symlink_metadata(&child)
                    .map(|metadata| metadata.is_dir())
                    .unwrap_or(false);
                if is_dir {
                    match Frame::open(with_trailing_separator(&child)) {
                        Some(next) => stack.push(next),
                        None => return false,
                    }
                } else if !delete_file(&child) {
                    return false;
                }
            }
            None => {
                let dir = frame.dir.clone();
                stack.pop();
                if let Err(err) = fs::remove_dir(&dir) {
                    warn!(dir = %dir.display(), error = %err, "failed to delete directory");
                    return false;
                }
                debug!(dir = %dir.display(), "deleted directory");
            }
        }
    }
}

/// Deletes every path in `paths`, each independently.
///
/// Each top-level path is validated first and then removed as a directory or
/// as a file. A failure is recorded and the loop moves on; the batch as a
/// whole is not atomic.
pub fn delete_paths(paths: &[PathBuf]) -> DeleteReport {
    let mut report = DeleteReport::default();

    for path in paths {
        if !check_path(path) {
            debug!(path = %path.display(), "skipping invalid path");
            report.skipped.push(path.clone());
            continue;
        }

        let is_dir = fs::symlink_metadata(path)
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false);
        let removed = if is_dir {
            delete_directory(path)
        } else {
            delete_file(path)
        };

        if removed {
            info!(path = %path.display(), "removed");
            report.removed.push(path.clone());
        } else {
            warn!(path = %path.display(), "could not be fully removed");
            report.failed.push(path.clone());
        }
    }

    report
}

/// Appends the platform separator unless `path` already ends with one.
fn with_trailing_separator(path: &Path) -> PathBuf {
    let raw = path.as_os_str();
    if raw.to_string_lossy().ends_with(MAIN_SEPARATOR_STR) {
        return path.to_path_buf();
    }
    let mut normalized = OsString::from(raw);
    normalized.push(MAIN_SEPARATOR_STR);
    PathBuf::from(normalized)
}
