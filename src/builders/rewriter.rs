use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::builders::patterns::{LineRewrite, NamePattern};
use crate::builders::validator::check_path;
use crate::builders::walker::{ListingFailure, TreeWalker};
use crate::core::config::RewriteSettings;

/// Line counts for one rewritten file.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct RewriteSummary {
    /// Lines read (and written back).
    pub lines: usize,
    /// Lines whose text differs after the rewrite.
    pub changed: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileRewrite {
    pub path: PathBuf,
    #[serde(flatten)]
    pub summary: RewriteSummary,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RewriteFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Per-file outcomes of rewriting every matching file under a directory.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RewriteReport {
    pub rewritten: Vec<FileRewrite>,
    pub failed: Vec<RewriteFailure>,
    /// Directories that could not be listed while collecting candidates.
    pub unreadable: Vec<ListingFailure>,
}

/// Applies a [`LineRewrite`] to files, one at a time.
///
/// A file is read completely into memory before anything is written, so a
/// read error never leaves a half-rewritten file behind.
#[derive(Debug, Clone, Default)]
pub struct ContentRewriter {
    settings: RewriteSettings,
}

impl ContentRewriter {
    pub fn new(settings: RewriteSettings) -> Self {
        Self { settings }
    }

    /// Rewrites the selected lines of one file in place.
    ///
    /// # Returns
    /// `Ok(None)` if `path` fails [`check_path`] (nothing is touched),
    /// `Ok(Some(summary))` once the new content has been written, or an error
    /// if the file could not be read as UTF-8 text or written back.
    pub fn rewrite_file(&self, path: &Path, rewrite: &LineRewrite) -> Result<Option<RewriteSummary>> {
        if !check_path(path) {
            debug!(path = %path.display(), "skipping rewrite of invalid path");
            return Ok(None);
        }

        let (content, summary) = self.transform(path, rewrite)?;
        self.write_back(path, &content)?;

        debug!(
            path = %path.display(),
            lines = summary.lines,
            changed = summary.changed,
            "rewrote file"
        );
        Ok(Some(summary))
    }

    /// Rewrites every file under `root` whose name satisfies `name_pattern`.
    ///
    /// Files are processed sequentially and independently: a failure is logged,
    /// recorded in the report, and the next file is processed.
    /// Returns `None` if `root` fails [`check_path`].
    pub fn rewrite_files(
        &self,
        walker: &TreeWalker,
        root: &Path,
        name_pattern: &NamePattern,
        rewrite: &LineRewrite,
    ) -> Option<RewriteReport> {
        let candidates = walker.match_files(root, name_pattern)?;
        let mut report = RewriteReport {
            unreadable: candidates.unreadable,
            ..RewriteReport::default()
        };

        for path in candidates.paths {
            match self.rewrite_file(&path, rewrite) {
                Ok(Some(summary)) => {
                    info!(path = %path.display(), changed = summary.changed, "rewrote file");
                    report.rewritten.push(FileRewrite { path, summary });
                }
                Ok(None) => {
                    debug!(path = %path.display(), "file vanished before rewrite");
                }
                Err(err) => {
                    let reason = format!("{err:#}");
                    warn!(path = %path.display(), error = %reason, "rewrite failed");
                    report.failed.push(RewriteFailure { path, reason });
                }
            }
        }

        Some(report)
    }

    fn transform(&self, path: &Path, rewrite: &LineRewrite) -> Result<(String, RewriteSummary)> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {} as UTF-8 text", path.display()))?;
        let terminator = self.settings.line_ending.as_str();

        let mut content = String::with_capacity(text.len());
        let mut summary = RewriteSummary::default();
        for line in split_lines(&text) {
            let rewritten = rewrite.apply(line);
            if rewritten != line {
                summary.changed += 1;
            }
            content.push_str(&rewritten);
            content.push_str(terminator);
            summary.lines += 1;
        }

        Ok((content, summary))
    }

    fn write_back(&self, path: &Path, content: &str) -> Result<()> {
        if !self.settings.atomic_write {
            return fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()));
        }

        // Replace the link target, not the link.
        let target = fs::canonicalize(path)
            .with_context(|| format!("Failed to resolve {}", path.display()))?;
        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        let permissions = fs::metadata(&target)
            .with_context(|| format!("Failed to stat {}", target.display()))?
            .permissions();

        let mut staged = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        staged
            .write_all(content.as_bytes())
            .context("Failed to write temporary file")?;
        staged
            .as_file()
            .sync_all()
            .context("Failed to flush temporary file")?;
        fs::set_permissions(staged.path(), permissions)
            .context("Failed to copy permissions to temporary file")?;
        staged
            .persist(&target)
            .map_err(|err| err.error)
            .with_context(|| format!("Failed to replace {}", target.display()))?;

        Ok(())
    }
}

/// Splits on `\n`, `\r\n` or a lone `\r`. A terminator at the very end does
/// not start another line.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let Some(at) = rest.find(['\r', '\n']) else {
            return Some(std::mem::take(&mut rest));
        };
        let line = &rest[..at];
        let width = if rest[at..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[at + width..];
        Some(line)
    })
}
