use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::builders::patterns::{NameMatcher, NamePattern};
use crate::builders::validator::{check_path, is_hidden};
use crate::core::config::WalkSettings;

/// A directory whose contents could not be listed during a walk.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ListingFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// The result of one traversal.
///
/// `paths` is in depth-first pre-order. A directory that could not be listed
/// contributes nothing to `paths` and is recorded in `unreadable` instead, so
/// callers can tell an empty subtree from an inaccessible one.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct WalkReport {
    pub paths: Vec<PathBuf>,
    pub unreadable: Vec<ListingFailure>,
}

impl WalkReport {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Dir,
}

/// What a traversal collects.
#[derive(Clone, Copy)]
enum Selection<'a> {
    AllFiles,
    Files(&'a NamePattern),
    /// Matching directories are collected and not descended into.
    Dirs(&'a NamePattern),
}

/// Enumerates files or directories beneath a root.
///
/// Built on [`WalkDir`], which keeps its own stack of open directories, so
/// nesting depth is limited by memory rather than by the call stack.
#[derive(Debug, Clone, Default)]
pub struct TreeWalker {
    settings: WalkSettings,
}

impl TreeWalker {
    pub fn new(settings: WalkSettings) -> Self {
        Self { settings }
    }

    /// Every file reachable under `root`. A file root yields just itself.
    /// Returns `None` when `root` fails [`check_path`].
    pub fn find_all(&self, root: &Path) -> Option<WalkReport> {
        self.walk(root, Selection::AllFiles)
    }

    /// Files under `root` whose name satisfies `pattern`. Directories are
    /// always descended, whatever their name.
    pub fn match_files(&self, root: &Path, pattern: &NamePattern) -> Option<WalkReport> {
        debug!(root = %root.display(), %pattern, "matching files");
        self.walk(root, Selection::Files(pattern))
    }

    /// Directories under `root` (including `root` itself) whose name satisfies
    /// `pattern`. Descent stops at a matching directory, so none of its
    /// descendants are reported.
    pub fn match_dirs(&self, root: &Path, pattern: &NamePattern) -> Option<WalkReport> {
        debug!(root = %root.display(), %pattern, "matching directories");
        self.walk(root, Selection::Dirs(pattern))
    }

    fn walk(&self, root: &Path, selection: Selection<'_>) -> Option<WalkReport> {
        if !check_path(root) {
            debug!(root = %root.display(), "skipping walk of invalid root");
            return None;
        }

        // The root is always resolved through links; descendants follow the settings.
        let mut walker = WalkDir::new(root)
            .follow_root_links(true)
            .follow_links(self.settings.follow_symlinks);
        if self.settings.sort_entries {
            walker = walker.sort_by_file_name();
        }
        let include_hidden = self.settings.include_hidden;
        let mut entries = walker.into_iter().filter_entry(move |entry| {
            include_hidden || entry.depth() == 0 || !is_hidden(entry.path())
        });

        let mut report = WalkReport::default();
        while let Some(next) = entries.next() {
            let entry = match next {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(root).to_path_buf();
                    let reason = match err.io_error() {
                        Some(io) => io.to_string(),
                        None => err.to_string(),
                    };
                    warn!(dir = %path.display(), error = %reason, "failed to list directory");
                    report.unreadable.push(ListingFailure { path, reason });
                    continue;
                }
            };

            let Some(kind) = classify(&entry) else {
                continue;
            };

            match (kind, selection) {
                (EntryKind::File, Selection::AllFiles) => report.paths.push(entry.into_path()),
                (EntryKind::File, Selection::Files(pattern)) => {
                    if pattern.matches(&entry_name(&entry)) {
                        report.paths.push(entry.into_path());
                    }
                }
                (EntryKind::File, Selection::Dirs(_)) => {}
                (EntryKind::Dir, Selection::Dirs(pattern)) => {
                    if pattern.matches(&entry_name(&entry)) {
                        report.paths.push(entry.into_path());
                        entries.skip_current_dir();
                    }
                }
                (EntryKind::Dir, _) => {}
            }
        }

        debug!(
            root = %root.display(),
            found = report.paths.len(),
            unreadable = report.unreadable.len(),
            "walk finished"
        );
        Some(report)
    }
}

/// Resolves what kind of entry was visited. An unfollowed link counts as a
/// file when its target is a regular file; a link to a directory is only
/// descended when it is the root. Special files (sockets, fifos, devices) and
/// dangling links are neither and are left out of every walk.
fn classify(entry: &DirEntry) -> Option<EntryKind> {
    let file_type = entry.file_type();
    if file_type.is_dir() {
        return Some(EntryKind::Dir);
    }
    if file_type.is_file() {
        return Some(EntryKind::File);
    }
    if file_type.is_symlink() {
        let target = fs::metadata(entry.path()).ok()?;
        if target.is_file() {
            return Some(EntryKind::File);
        }
        if target.is_dir() && entry.depth() == 0 {
            return Some(EntryKind::Dir);
        }
    }
    None
}

fn entry_name(entry: &DirEntry) -> String {
    entry.file_name().to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{Builder, TempDir};

    fn visible_tempdir() -> TempDir {
        Builder::new().prefix("walk").tempdir().unwrap()
    }

    /// Builds:
    /// root/a.txt, root/b/pom.xml, root/b/c/POM.XML, root/b/target/x.txt,
    /// root/target/y.txt, root/target/target/z.txt, root/.git/config, root/empty/
    fn sample_tree() -> TempDir {
        let dir = visible_tempdir();
        let root = dir.path();
        for sub in ["b/c", "b/target", "target/target", ".git", "empty"] {
            fs::create_dir_all(root.join(sub)).unwrap();
        }
        for file in [
            "a.txt",
            "b/pom.xml",
            "b/c/POM.XML",
            "b/target/x.txt",
            "target/y.txt",
            "target/target/z.txt",
            ".git/config",
        ] {
            fs::write(root.join(file), file).unwrap();
        }
        dir
    }

    fn relative(report: &WalkReport, root: &Path) -> Vec<String> {
        report
            .paths
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_find_all_lists_files_in_pre_order() {
        let dir = sample_tree();
        let report = TreeWalker::default().find_all(dir.path()).unwrap();
        assert_eq!(
            relative(&report, dir.path()),
            vec![
                "a.txt",
                "b/c/POM.XML",
                "b/pom.xml",
                "b/target/x.txt",
                "target/target/z.txt",
                "target/y.txt",
            ]
        );
        assert!(report.unreadable.is_empty());
    }

    #[test]
    fn test_find_all_on_file_root() {
        let dir = sample_tree();
        let file = dir.path().join("a.txt");
        let report = TreeWalker::default().find_all(&file).unwrap();
        assert_eq!(report.paths, vec![file]);
    }

    #[test]
    fn test_invalid_roots_yield_none() {
        let dir = sample_tree();
        let walker = TreeWalker::default();
        assert!(walker.find_all(Path::new("")).is_none());
        assert!(walker.find_all(&dir.path().join("missing")).is_none());
        assert!(walker.find_all(&dir.path().join(".git")).is_none());
    }

    #[test]
    fn test_include_hidden_reaches_dot_entries() {
        let dir = sample_tree();
        let walker = TreeWalker::new(WalkSettings {
            include_hidden: true,
            ..WalkSettings::default()
        });
        let report = walker.find_all(dir.path()).unwrap();
        assert!(relative(&report, dir.path()).contains(&".git/config".to_string()));
    }

    #[test]
    fn test_match_files_by_name_is_case_insensitive() {
        let dir = sample_tree();
        let pattern = NamePattern::exact("pom.xml").unwrap();
        let report = TreeWalker::default()
            .match_files(dir.path(), &pattern)
            .unwrap();
        assert_eq!(
            relative(&report, dir.path()),
            vec!["b/c/POM.XML", "b/pom.xml"]
        );
    }

    #[test]
    fn test_match_files_regex_full_match() {
        let dir = sample_tree();
        let pattern = NamePattern::regex(r"[xyz]\.txt").unwrap();
        let report = TreeWalker::default()
            .match_files(dir.path(), &pattern)
            .unwrap();
        assert_eq!(
            relative(&report, dir.path()),
            vec!["b/target/x.txt", "target/target/z.txt", "target/y.txt"]
        );
    }

    #[test]
    fn test_match_files_on_file_root_applies_pattern() {
        let dir = sample_tree();
        let file = dir.path().join("a.txt");
        let walker = TreeWalker::default();
        assert!(walker
            .match_files(&file, &NamePattern::exact("other.txt").unwrap())
            .unwrap()
            .is_empty());
        assert_eq!(
            walker
                .match_files(&file, &NamePattern::exact("A.TXT").unwrap())
                .unwrap()
                .paths,
            vec![file]
        );
    }

    #[test]
    fn test_match_dirs_prunes_at_match() {
        let dir = sample_tree();
        let report = TreeWalker::default()
            .match_dirs(dir.path(), &NamePattern::exact("target").unwrap())
            .unwrap();
        assert_eq!(relative(&report, dir.path()), vec!["b/target", "target"]);
    }

    #[test]
    fn test_match_dirs_includes_matching_root() {
        let dir = sample_tree();
        let root = dir.path().join("target");
        let report = TreeWalker::default()
            .match_dirs(&root, &NamePattern::exact("target").unwrap())
            .unwrap();
        assert_eq!(report.paths, vec![root]);
    }

    #[test]
    fn test_match_dirs_never_reports_files() {
        let dir = sample_tree();
        let report = TreeWalker::default()
            .match_dirs(dir.path(), &NamePattern::regex(".*").unwrap())
            .unwrap();
        assert_eq!(report.paths, vec![dir.path().to_path_buf()]);

        let report = TreeWalker::default()
            .match_dirs(&dir.path().join("a.txt"), &NamePattern::exact("a.txt").unwrap())
            .unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let dir = visible_tempdir();
        let mut deep = dir.path().to_path_buf();
        for _ in 0..200 {
            deep.push("d");
        }
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("leaf.txt"), "leaf").unwrap();

        let report = TreeWalker::default().find_all(dir.path()).unwrap();
        assert_eq!(report.paths, vec![deep.join("leaf.txt")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_reported() {
        use std::os::unix::fs::PermissionsExt;

        let dir = sample_tree();
        let locked = dir.path().join("b");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let readable = fs::read_dir(&locked).is_ok();
        let report = TreeWalker::default().find_all(dir.path()).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if readable {
            eprintln!(
                "SKIPPED test_unreadable_directory_is_reported: permission bits are not enforced for this user"
            );
            return;
        }
        assert_eq!(report.unreadable.len(), 1);
        assert_eq!(report.unreadable[0].path, locked);
        assert_eq!(
            relative(&report, dir.path()),
            vec!["a.txt", "target/target/z.txt", "target/y.txt"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_link_loop_is_reported_as_listing_failure() {
        let dir = sample_tree();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("b/back")).unwrap();

        let report = TreeWalker::new(WalkSettings {
            follow_symlinks: true,
            ..WalkSettings::default()
        })
        .find_all(dir.path())
        .unwrap();

        assert_eq!(report.unreadable.len(), 1);
        assert_eq!(report.unreadable[0].path, dir.path().join("b/back"));
        assert!(!report.unreadable[0].reason.is_empty());
        assert_eq!(relative(&report, dir.path()).len(), 6);
    }

    #[cfg(unix)]
    #[test]
    fn test_unfollowed_link_to_file_counts_as_file() {
        let dir = visible_tempdir();
        let root = dir.path();
        fs::write(root.join("real.txt"), "real").unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub/inner.txt"), "inner").unwrap();
        std::os::unix::fs::symlink(root.join("real.txt"), root.join("pom.xml")).unwrap();
        std::os::unix::fs::symlink(root.join("sub"), root.join("linked")).unwrap();
        std::os::unix::fs::symlink(root.join("gone"), root.join("dangling")).unwrap();

        let walker = TreeWalker::default();
        let all = walker.find_all(root).unwrap();
        assert_eq!(
            relative(&all, root),
            vec!["pom.xml", "real.txt", "sub/inner.txt"]
        );

        let poms = walker
            .match_files(root, &NamePattern::exact("POM.xml").unwrap())
            .unwrap();
        assert_eq!(poms.paths, vec![root.join("pom.xml")]);

        let dirs = walker
            .match_dirs(root, &NamePattern::exact("linked").unwrap())
            .unwrap();
        assert!(dirs.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_follow_settings() {
        let dir = sample_tree();
        std::os::unix::fs::symlink(dir.path().join("target"), dir.path().join("link")).unwrap();

        let plain = TreeWalker::default().find_all(dir.path()).unwrap();
        assert!(!relative(&plain, dir.path()).iter().any(|p| p.starts_with("link")));

        let following = TreeWalker::new(WalkSettings {
            follow_symlinks: true,
            ..WalkSettings::default()
        })
        .find_all(dir.path())
        .unwrap();
        assert!(relative(&following, dir.path()).contains(&"link/y.txt".to_string()));
    }
}
