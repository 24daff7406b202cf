use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use crate::builders::remover::DeleteReport;
use crate::builders::rewriter::{RewriteReport, RewriteSummary};
use crate::builders::walker::WalkReport;

/// How results are written to standard output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One path per line, with a colored summary on stderr.
    #[default]
    Text,
    Json,
    Yaml,
    Toml,
}

/// The `Reporter` trait turns engine results into user-facing output.
pub trait Reporter {
    fn report_walk(&self, report: &WalkReport) -> Result<()>;
    fn report_delete(&self, report: &DeleteReport) -> Result<()>;
    fn report_rewrite(&self, report: &RewriteReport) -> Result<()>;
    fn report_file_rewrite(&self, path: &Path, summary: &RewriteSummary) -> Result<()>;
    /// Called when an operation was given a blank, missing or hidden root.
    fn report_invalid(&self, path: &Path);
}

/// Prints results to stdout and human-oriented notes to stderr, so that
/// stdout stays machine readable in every format.
pub struct ConsoleReporter {
    format: OutputFormat,
}

impl ConsoleReporter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Serializes `value` in the configured structured format.
    /// Returns `None` for the text format, which each report renders itself.
    pub fn render<T: Serialize>(&self, value: &T) -> Result<Option<String>> {
        let rendered = match self.format {
            OutputFormat::Text => return Ok(None),
            OutputFormat::Json => {
                serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?
            }
            OutputFormat::Yaml => serde_yaml::to_string(value).context("Failed to serialize to YAML")?,
            OutputFormat::Toml => {
                toml::to_string_pretty(value).context("Failed to serialize to TOML")?
            }
        };
        Ok(Some(rendered))
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        match self.render(value)? {
            Some(rendered) => println!("{}", rendered.trim_end()),
            None => {
                let text = text();
                if !text.is_empty() {
                    println!("{text}");
                }
            }
        }
        Ok(())
    }
}

fn path_lines<'a>(paths: impl IntoIterator<Item = &'a std::path::PathBuf>) -> String {
    paths
        .into_iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl Reporter for ConsoleReporter {
    fn report_walk(&self, report: &WalkReport) -> Result<()> {
        self.emit(report, || path_lines(&report.paths))?;

        if self.format == OutputFormat::Text {
            for failure in &report.unreadable {
                eprintln!(
                    "{} {} ({})",
                    "⚠️  unreadable:".yellow(),
                    failure.path.display(),
                    failure.reason
                );
            }
            eprintln!("{}", format!("{} path(s) found", report.paths.len()).green());
        }
        Ok(())
    }

    fn report_delete(&self, report: &DeleteReport) -> Result<()> {
        self.emit(report, || path_lines(&report.removed))?;

        if self.format == OutputFormat::Text {
            for path in &report.skipped {
                eprintln!("{} {}", "skipped:".yellow(), path.display());
            }
            for path in &report.failed {
                eprintln!("{} {}", "failed:".red().bold(), path.display());
            }
            eprintln!(
                "{}",
                format!(
                    "Removed {}, skipped {}, failed {}",
                    report.removed.len(),
                    report.skipped.len(),
                    report.failed.len()
                )
                .bold()
            );
        }
        Ok(())
    }

    fn report_rewrite(&self, report: &RewriteReport) -> Result<()> {
        self.emit(report, || {
            report
                .rewritten
                .iter()
                .map(|file| {
                    format!(
                        "{} ({}/{} lines changed)",
                        file.path.display(),
                        file.summary.changed,
                        file.summary.lines
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        })?;

        if self.format == OutputFormat::Text {
            for failure in &report.failed {
                eprintln!(
                    "{} {} ({})",
                    "failed:".red().bold(),
                    failure.path.display(),
                    failure.reason
                );
            }
            for failure in &report.unreadable {
                eprintln!(
                    "{} {} ({})",
                    "⚠️  unreadable:".yellow(),
                    failure.path.display(),
                    failure.reason
                );
            }
            eprintln!(
                "{}",
                format!(
                    "Rewrote {} file(s), {} failed",
                    report.rewritten.len(),
                    report.failed.len()
                )
                .bold()
            );
        }
        Ok(())
    }

    fn report_file_rewrite(&self, path: &Path, summary: &RewriteSummary) -> Result<()> {
        #[derive(Serialize)]
        struct Single<'a> {
            path: &'a Path,
            #[serde(flatten)]
            summary: &'a RewriteSummary,
        }

        self.emit(&Single { path, summary }, || {
            format!(
                "{} ({}/{} lines changed)",
                path.display(),
                summary.changed,
                summary.lines
            )
        })
    }

    fn report_invalid(&self, path: &Path) {
        eprintln!(
            "{} {}",
            "Nothing to do, not an existing visible path:".yellow(),
            path.display()
        );
    }
}
