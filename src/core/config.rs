use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::builders::validator::{ConfigValidator, StandardValidator};

/// File name looked up in the current directory when no explicit path is given.
pub const CONFIG_FILE_NAME: &str = ".treesweep.toml";

/// Settings that shape how directory trees are enumerated.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct WalkSettings {
    /// Descend into and report entries whose names start with a dot.
    pub include_hidden: bool,
    /// Resolve symbolic links below the root instead of leaving them out.
    pub follow_symlinks: bool,
    /// Visit siblings in file-name order rather than raw listing order.
    pub sort_entries: bool,
}

impl Default for WalkSettings {
    fn default() -> Self {
        Self {
            include_hidden: false,
            follow_symlinks: false,
            sort_entries: true,
        }
    }
}

/// Line terminator appended after every line of a rewritten file.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    Platform,
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Platform if cfg!(windows) => "\r\n",
            LineEnding::Platform => "\n",
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}

/// Settings for the line-oriented content rewriter.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RewriteSettings {
    /// Text encoding of rewritten files. Only UTF-8 is supported.
    pub encoding: String,
    pub line_ending: LineEnding,
    /// Write through a sibling temporary file and rename it over the original.
    pub atomic_write: bool,
}

impl Default for RewriteSettings {
    fn default() -> Self {
        Self {
            encoding: "utf-8".to_string(),
            line_ending: LineEnding::Platform,
            atomic_write: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SweepConfig {
    pub version: String,
    pub walk: WalkSettings,
    pub rewrite: RewriteSettings,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            walk: WalkSettings::default(),
            rewrite: RewriteSettings::default(),
        }
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Uses `.treesweep.toml` in the current working directory.
    pub fn new() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to resolve current directory")?;
        Ok(Self {
            config_path: current_dir.join(CONFIG_FILE_NAME),
        })
    }

    pub fn new_at(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Writes the default configuration unless a file already exists.
    /// Returns `true` when a new file was created.
    pub fn initialize(&self) -> Result<bool> {
        if self.config_path.exists() {
            return Ok(false);
        }

        self.save_config(&SweepConfig::default())?;
        Ok(true)
    }

    /// Loads the configuration and returns every issue the validator finds.
    pub fn validate_config(&self) -> Result<Vec<String>> {
        let config = self.load_config()?;
        StandardValidator::new().validate_config(&config)
    }

    /// Loads the configuration and fails if it has any validation issue.
    pub fn load_validated(&self) -> Result<SweepConfig> {
        let config = self.load_config()?;
        let issues = StandardValidator::new().validate_config(&config)?;
        if !issues.is_empty() {
            anyhow::bail!(
                "Invalid configuration in {}: {}",
                self.config_path.display(),
                issues.join("; ")
            );
        }
        Ok(config)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

pub trait ConfigProvider {
    fn load_config(&self) -> Result<SweepConfig>;
    fn save_config(&self, config: &SweepConfig) -> Result<()>;
}

impl ConfigProvider for ConfigManager {
    fn load_config(&self) -> Result<SweepConfig> {
        if !self.config_path.exists() {
            return Ok(SweepConfig::default());
        }

        let content =
            fs::read_to_string(&self.config_path).context("Failed to read config file")?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    fn save_config(&self, config: &SweepConfig) -> Result<()> {
        let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(&self.config_path, content).context("Failed to write config file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new_at(dir.path().join(CONFIG_FILE_NAME));
        assert_eq!(manager.load_config().unwrap(), SweepConfig::default());
    }

    #[test]
    fn test_initialize_then_round_trip() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new_at(dir.path().join(CONFIG_FILE_NAME));
        assert!(manager.initialize().unwrap());
        assert!(!manager.initialize().unwrap());

        let mut config = manager.load_config().unwrap();
        config.walk.include_hidden = true;
        config.rewrite.line_ending = LineEnding::Crlf;
        manager.save_config(&config).unwrap();

        assert_eq!(manager.load_config().unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[rewrite]\natomic_write = false\n").unwrap();

        let config = ConfigManager::new_at(path).load_config().unwrap();
        assert!(!config.rewrite.atomic_write);
        assert_eq!(config.rewrite.encoding, "utf-8");
        assert!(config.walk.sort_entries);
        assert_eq!(config.version, "1.0");
    }

    #[test]
    fn test_unsupported_encoding_fails_validation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[rewrite]\nencoding = \"gbk\"\n").unwrap();

        let manager = ConfigManager::new_at(path);
        assert_eq!(manager.validate_config().unwrap().len(), 1);
        assert!(manager.load_validated().is_err());
    }
}
