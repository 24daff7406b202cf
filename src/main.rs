//! treesweep walks a directory tree and does one of three things with what it
//! finds: lists it, deletes it, or rewrites lines inside it.
//!
//! The typical use is clearing build output (`purge . target`) or bumping a
//! placeholder across every `pom.xml` of a multi-module project (`replace-all`).
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use treesweep::SweepEngine;
use treesweep::builders::patterns::NamePattern;
use treesweep::builders::reporter::{ConsoleReporter, OutputFormat};
use treesweep::core::config::ConfigManager;

mod utils;

#[derive(Parser)]
#[command(name = "treesweep", version)]
#[command(about = "Find, purge and rewrite files across a directory tree")]
struct Cli {
    /// Configuration file (defaults to ./.treesweep.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log each file and directory as it is processed
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Validate the configuration file
    CheckConfig,
    /// List every file under a root
    Find { root: PathBuf },
    /// List files whose name matches
    MatchFiles {
        root: PathBuf,
        name: String,
        /// Treat NAME as a regular expression matched against the whole name
        #[arg(long)]
        regex: bool,
    },
    /// List the outermost directories whose name matches
    MatchDirs {
        root: PathBuf,
        name: String,
        /// Treat NAME as a regular expression matched against the whole name
        #[arg(long)]
        regex: bool,
    },
    /// Delete files and directory trees
    Delete {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Delete the outermost directories whose name matches
    Purge {
        root: PathBuf,
        name: String,
        #[arg(long)]
        regex: bool,
        /// List what would be deleted without deleting it
        #[arg(long)]
        dry_run: bool,
    },
    /// Rewrite the selected lines of one file
    Replace {
        path: PathBuf,
        /// Regex a whole line must match to be rewritten
        #[arg(long, allow_hyphen_values = true)]
        line: String,
        /// Regex replaced inside a selected line
        #[arg(long, allow_hyphen_values = true)]
        from: String,
        /// Replacement text ($1 / ${name} group references, \ escapes)
        #[arg(long, allow_hyphen_values = true)]
        to: String,
    },
    /// Rewrite the selected lines of every matching file under a root
    ReplaceAll {
        root: PathBuf,
        /// File name to match
        #[arg(long)]
        name: String,
        #[arg(long)]
        regex: bool,
        #[arg(long, allow_hyphen_values = true)]
        line: String,
        #[arg(long, allow_hyphen_values = true)]
        from: String,
        #[arg(long, allow_hyphen_values = true)]
        to: String,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_manager = match cli.config {
        Some(path) => ConfigManager::new_at(path),
        None => ConfigManager::new()?,
    };

    match &cli.command {
        Commands::Init => return utils::initialize_config(&config_manager),
        Commands::CheckConfig => return utils::check_config(&config_manager),
        _ => {}
    }

    let engine = SweepEngine::from_manager(&config_manager)?;
    let reporter = ConsoleReporter::new(cli.format);

    match cli.command {
        Commands::Init | Commands::CheckConfig => Ok(()),
        Commands::Find { root } => utils::find(&engine, &reporter, &root),
        Commands::MatchFiles { root, name, regex } => {
            let pattern = NamePattern::new(name, regex)?;
            utils::match_files(&engine, &reporter, &root, &pattern)
        }
        Commands::MatchDirs { root, name, regex } => {
            let pattern = NamePattern::new(name, regex)?;
            utils::match_dirs(&engine, &reporter, &root, &pattern)
        }
        Commands::Delete { paths } => utils::delete(&engine, &reporter, &paths),
        Commands::Purge {
            root,
            name,
            regex,
            dry_run,
        } => {
            let pattern = NamePattern::new(name, regex)?;
            utils::purge(&engine, &reporter, &root, &pattern, dry_run)
        }
        Commands::Replace {
            path,
            line,
            from,
            to,
        } => utils::replace(&engine, &reporter, &path, &line, &from, &to),
        Commands::ReplaceAll {
            root,
            name,
            regex,
            line,
            from,
            to,
        } => {
            let pattern = NamePattern::new(name, regex)?;
            utils::replace_all(&engine, &reporter, &root, &pattern, &line, &from, &to)
        }
    }
}
