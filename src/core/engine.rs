use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::builders::patterns::{LineRewrite, NamePattern};
use crate::builders::remover::{self, DeleteReport};
use crate::builders::validator::check_path;
use crate::builders::rewriter::{ContentRewriter, RewriteReport, RewriteSummary};
use crate::builders::walker::{TreeWalker, WalkReport};
use crate::core::config::{ConfigManager, SweepConfig};

/// Entry point for every traversal, deletion and rewrite operation.
///
/// The engine holds only the immutable settings it was built with. Every call
/// re-reads the filesystem; nothing is cached between calls. Operations given
/// an invalid root (blank, missing or hidden) return `None` instead of failing.
/// The root is checked before any expression is compiled, so an invalid root
/// yields `None` even when the expression is malformed too.
#[derive(Debug, Clone, Default)]
pub struct SweepEngine {
    walker: TreeWalker,
    rewriter: ContentRewriter,
}

impl SweepEngine {
    pub fn new(config: &SweepConfig) -> Self {
        Self {
            walker: TreeWalker::new(config.walk),
            rewriter: ContentRewriter::new(config.rewrite.clone()),
        }
    }

    /// Builds an engine from a validated configuration file.
    pub fn from_manager(config_manager: &ConfigManager) -> Result<Self> {
        let config = config_manager.load_validated()?;
        Ok(Self::new(&config))
    }

    pub fn find_all(&self, root: impl AsRef<Path>) -> Option<WalkReport> {
        self.walker.find_all(root.as_ref())
    }

    /// Files whose name equals `name`, ignoring case.
    pub fn match_files_by_name(
        &self,
        root: impl AsRef<Path>,
        name: &str,
    ) -> Result<Option<WalkReport>> {
        let root = root.as_ref();
        if !check_path(root) {
            return Ok(None);
        }
        let pattern = NamePattern::exact(name)?;
        Ok(self.walker.match_files(root, &pattern))
    }

    /// Files whose whole name matches the regular expression `pattern`.
    pub fn match_files_use_regular(
        &self,
        root: impl AsRef<Path>,
        pattern: &str,
    ) -> Result<Option<WalkReport>> {
        let root = root.as_ref();
        if !check_path(root) {
            return Ok(None);
        }
        let pattern = NamePattern::regex(pattern)?;
        Ok(self.walker.match_files(root, &pattern))
    }

    pub fn match_files(&self, root: impl AsRef<Path>, pattern: &NamePattern) -> Option<WalkReport> {
        self.walker.match_files(root.as_ref(), pattern)
    }

    /// Outermost directories whose name equals `name`, ignoring case.
    pub fn match_dirs_by_name(
        &self,
        root: impl AsRef<Path>,
        name: &str,
    ) -> Result<Option<WalkReport>> {
        let root = root.as_ref();
        if !check_path(root) {
            return Ok(None);
        }
        let pattern = NamePattern::exact(name)?;
        Ok(self.walker.match_dirs(root, &pattern))
    }

    /// Outermost directories whose whole name matches the regular expression `pattern`.
    pub fn match_dirs_use_regular(
        &self,
        root: impl AsRef<Path>,
        pattern: &str,
    ) -> Result<Option<WalkReport>> {
        let root = root.as_ref();
        if !check_path(root) {
            return Ok(None);
        }
        let pattern = NamePattern::regex(pattern)?;
        Ok(self.walker.match_dirs(root, &pattern))
    }

    pub fn match_dirs(&self, root: impl AsRef<Path>, pattern: &NamePattern) -> Option<WalkReport> {
        self.walker.match_dirs(root.as_ref(), pattern)
    }

    /// Best-effort removal of a mixed list of files and directories.
    pub fn delete_files(&self, paths: &[PathBuf]) -> DeleteReport {
        remover::delete_paths(paths)
    }

    /// Rewrites one file. All three expressions are compiled before the file
    /// is opened, so a malformed expression never touches the file.
    pub fn replace_file_content(
        &self,
        path: impl AsRef<Path>,
        line_selector: &str,
        replace_from: &str,
        replace_to: &str,
    ) -> Result<Option<RewriteSummary>> {
        let path = path.as_ref();
        if !check_path(path) {
            return Ok(None);
        }
        let rewrite = LineRewrite::new(line_selector, replace_from, replace_to)?;
        self.rewriter.rewrite_file(path, &rewrite)
    }

    /// Rewrites every file under `root` whose name satisfies `name_filter`.
    /// Per-file failures are collected in the report, not returned as errors.
    pub fn replace_files_content(
        &self,
        root: impl AsRef<Path>,
        name_filter: &NamePattern,
        line_selector: &str,
        replace_from: &str,
        replace_to: &str,
    ) -> Result<Option<RewriteReport>> {
        let root = root.as_ref();
        if !check_path(root) {
            return Ok(None);
        }
        let rewrite = LineRewrite::new(line_selector, replace_from, replace_to)?;
        Ok(self
            .rewriter
            .rewrite_files(&self.walker, root, name_filter, &rewrite))
    }
}
