//! treesweep: find, purge and rewrite files across a directory tree.
//!
//! Three operations share one traversal discipline:
//! - enumerate files, or the outermost matching directories, by exact name or
//!   full-match regular expression;
//! - delete matched entries, removing directory contents before the directory;
//! - rewrite the lines of matched files that satisfy a line selector, using a
//!   find/replace regular expression, and persist the result.
//!
//! [`SweepEngine`] is the entry point for all of them.

pub mod builders;
pub mod core;

pub use crate::builders::patterns::{LineRewrite, MatchMode, NameMatcher, NamePattern};
pub use crate::builders::remover::DeleteReport;
pub use crate::builders::rewriter::{RewriteReport, RewriteSummary};
pub use crate::builders::walker::{ListingFailure, WalkReport};
pub use crate::core::config::{ConfigManager, ConfigProvider, SweepConfig};
pub use crate::core::engine::SweepEngine;
