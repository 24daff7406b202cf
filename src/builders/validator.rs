use anyhow::Result;
use std::path::Path;

use crate::core::config;

/// Returns `true` when `path` names an existing, non-hidden filesystem entry.
///
/// Blank input, a path that does not exist (including a dangling symbolic
/// link) and a hidden entry all fail the check. Every traversal, deletion and
/// rewrite entry point calls this first and treats `false` as "not applicable"
/// rather than as an error.
pub fn check_path(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    if path.as_os_str().to_string_lossy().trim().is_empty() {
        return false;
    }
    path.exists() && !is_hidden(path)
}

/// Reports whether the final component of `path` is a hidden entry.
///
/// `.` and `..` are not names, so a path ending in either is never hidden.
pub fn is_hidden(path: &Path) -> bool {
    let dot_name = path
        .file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'));
    dot_name || has_hidden_attribute(path)
}

#[cfg(windows)]
fn has_hidden_attribute(path: &Path) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;

    std::fs::symlink_metadata(path)
        .map(|metadata| metadata.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
        .unwrap_or(false)
}

#[cfg(not(windows))]
fn has_hidden_attribute(_path: &Path) -> bool {
    false
}

/// The `ConfigValidator` trait defines the public interface for validating the
/// tool's configuration.
pub trait ConfigValidator {
    /// Performs a full validation of the `SweepConfig` and returns a list of
    /// issues found. An empty list means the configuration is usable.
    fn validate_config(&self, config: &config::SweepConfig) -> Result<Vec<String>>;
}

/// The `StandardValidator` checks the version and the settings the engine
/// cannot honour.
pub struct StandardValidator;

impl StandardValidator {
    pub fn new() -> Self {
        Self
    }

    fn check_encoding(&self, encoding: &str) -> Option<String> {
        match encoding.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => None,
            other => Some(format!(
                "Unsupported encoding '{other}', only utf-8 is supported"
            )),
        }
    }
}

impl Default for StandardValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidator for StandardValidator {
    fn validate_config(&self, config: &config::SweepConfig) -> Result<Vec<String>> {
        let mut issues = Vec::new();

        if config.version != "1.0" {
            issues.push(format!("Unsupported config version: {}", config.version));
        }

        issues.extend(self.check_encoding(&config.rewrite.encoding));

        Ok(issues)
    }
}
