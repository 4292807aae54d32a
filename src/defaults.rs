//! Default values for groot.
//!
//! This module centralizes the built-in defaults and well-known file names
//! used across the library and the commands, so they stay consistent.

use std::path::PathBuf;

/// Name of the git control directory inside a work tree.
pub const GIT_DIR_NAME: &str = ".git";

/// Name of the submodule declaration file at the root of a superproject.
pub const GITMODULES_FILENAME: &str = ".gitmodules";

/// Per-project settings file, looked up at the root of the superproject.
pub const PROJECT_SETTINGS_FILENAME: &str = ".groot.yaml";

/// Preferred branch of a submodule whose declaration does not name one.
pub const DEFAULT_BRANCH: &str = "master";

/// Preferred remote of a submodule whose declaration does not name one.
pub const DEFAULT_REMOTE: &str = "origin";

/// Prefix of the correlation token embedded in stash messages.
pub const STASH_TAG_PREFIX: &str = "groot-";

/// Length of the random part of a stash correlation token.
pub const STASH_TAG_LEN: usize = 6;

/// Prefix of the marker file forced into the root when it has nothing to stash.
pub const STASH_MARKER_PREFIX: &str = ".groot-stash-";

/// Returns the user-level settings file path.
///
/// Uses the platform configuration directory:
/// - Linux: `~/.config/groot/config.yaml` (XDG Base Directory)
/// - macOS: `~/Library/Application Support/groot/config.yaml`
/// - Windows: `{FOLDERID_RoamingAppData}\groot\config.yaml`
///
/// Returns `None` when the platform directory cannot be determined.
pub fn user_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("groot").join("config.yaml"))
}
