use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};

use treesweep::SweepEngine;
use treesweep::builders::patterns::NamePattern;
use treesweep::builders::reporter::Reporter;
use treesweep::core::config::ConfigManager;

pub fn initialize_config(config_manager: &ConfigManager) -> Result<()> {
    if config_manager.initialize()? {
        println!(
            "✓ Wrote default configuration to {}",
            config_manager.config_path().display()
        );
    } else {
        println!(
            "Configuration already exists at {}",
            config_manager.config_path().display()
        );
    }
    Ok(())
}

pub fn check_config(config_manager: &ConfigManager) -> Result<()> {
    let issues = config_manager.validate_config()?;

    if issues.is_empty() {
        println!("✓ Configuration is valid.");
        Ok(())
    } else {
        println!("⚠️  Found issues in configuration:");
        for issue in issues {
            println!("  - {issue}");
        }
        anyhow::bail!("Configuration validation failed.");
    }
}

pub fn find(engine: &SweepEngine, reporter: &dyn Reporter, root: &Path) -> Result<()> {
    match engine.find_all(root) {
        Some(report) => reporter.report_walk(&report),
        None => {
            reporter.report_invalid(root);
            Ok(())
        }
    }
}

pub fn match_files(
    engine: &SweepEngine,
    reporter: &dyn Reporter,
    root: &Path,
    pattern: &NamePattern,
) -> Result<()> {
    match engine.match_files(root, pattern) {
        Some(report) => reporter.report_walk(&report),
        None => {
            reporter.report_invalid(root);
            Ok(())
        }
    }
}

pub fn match_dirs(
    engine: &SweepEngine,
    reporter: &dyn Reporter,
    root: &Path,
    pattern: &NamePattern,
) -> Result<()> {
    match engine.match_dirs(root, pattern) {
        Some(report) => reporter.report_walk(&report),
        None => {
            reporter.report_invalid(root);
            Ok(())
        }
    }
}

pub fn delete(engine: &SweepEngine, reporter: &dyn Reporter, paths: &[PathBuf]) -> Result<()> {
    let report = engine.delete_files(paths);
    reporter.report_delete(&report)
}

/// Finds the outermost directories matching `pattern` under `root` and deletes
/// them, or only lists them when `dry_run` is set.
pub fn purge(
    engine: &SweepEngine,
    reporter: &dyn Reporter,
    root: &Path,
    pattern: &NamePattern,
    dry_run: bool,
) -> Result<()> {
    let Some(found) = engine.match_dirs(root, pattern) else {
        reporter.report_invalid(root);
        return Ok(());
    };

    if dry_run {
        reporter.report_walk(&found)?;
        eprintln!("{}", "Dry run mode: nothing was deleted.".bright_blue());
        return Ok(());
    }

    let report = engine.delete_files(&found.paths);
    reporter.report_delete(&report)
}

pub fn replace(
    engine: &SweepEngine,
    reporter: &dyn Reporter,
    path: &Path,
    line: &str,
    from: &str,
    to: &str,
) -> Result<()> {
    match engine.replace_file_content(path, line, from, to)? {
        Some(summary) => reporter.report_file_rewrite(path, &summary),
        None => {
            reporter.report_invalid(path);
            Ok(())
        }
    }
}

pub fn replace_all(
    engine: &SweepEngine,
    reporter: &dyn Reporter,
    root: &Path,
    name: &NamePattern,
    line: &str,
    from: &str,
    to: &str,
) -> Result<()> {
    match engine.replace_files_content(root, name, line, from, to)? {
        Some(report) => reporter.report_rewrite(&report),
        None => {
            reporter.report_invalid(root);
            Ok(())
        }
    }
}
