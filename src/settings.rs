//! # Settings
//!
//! Optional YAML settings layered over the built-in defaults. Two files are
//! consulted, later layers overriding earlier ones:
//!
//! 1. the user file from [`defaults::user_settings_path`]
//! 2. the project file `.groot.yaml` at the root of the superproject
//!
//! ```yaml
//! default_branch: main
//! default_remote: upstream
//! pull:
//!   auto_commit: false
//! color: never
//! ```
//!
//! Command-line flags win over both files; that merge happens in the CLI.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::defaults;
use crate::error::{Error, Result};

/// Effective settings after all layers have been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Preferred branch for submodules that do not declare one.
    pub default_branch: String,
    /// Preferred remote for submodules that do not declare one.
    pub default_remote: String,
    /// Whether `pull` records advanced submodules in a root commit.
    pub pull_auto_commit: bool,
    /// Colour preference (`auto`, `always`, `never`), if a file set one.
    pub color: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_branch: defaults::DEFAULT_BRANCH.to_string(),
            default_remote: defaults::DEFAULT_REMOTE.to_string(),
            pull_auto_commit: true,
            color: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsFile {
    default_branch: Option<String>,
    default_remote: Option<String>,
    pull: PullSection,
    color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PullSection {
    auto_commit: Option<bool>,
}

impl Settings {
    /// Load the user layer and, when a root is known, the project layer.
    pub fn load(root: Option<&Path>) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(path) = defaults::user_settings_path() {
            settings.apply_file(&path)?;
        }
        if let Some(root) = root {
            settings.apply_file(&root.join(defaults::PROJECT_SETTINGS_FILENAME))?;
        }

        Ok(settings)
    }

    fn apply_file(&mut self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Ok(());
        }
        log::debug!("# Reading settings {}", path.display());
        let content = fs::read_to_string(path)?;
        self.apply_yaml(&content).map_err(|e| Error::Settings {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply one YAML layer on top of the current values.
    pub fn apply_yaml(&mut self, content: &str) -> Result<()> {
        let has_content = content
            .lines()
            .map(str::trim)
            .any(|line| !line.is_empty() && !line.starts_with('#'));
        if !has_content {
            return Ok(());
        }

        let file: SettingsFile = serde_yaml::from_str(content)?;
        if let Some(branch) = file.default_branch {
            self.default_branch = branch;
        }
        if let Some(remote) = file.default_remote {
            self.default_remote = remote;
        }
        if let Some(auto_commit) = file.pull.auto_commit {
            self.pull_auto_commit = auto_commit;
        }
        if file.color.is_some() {
            self.color = file.color;
        }
        Ok(())
    }
}
