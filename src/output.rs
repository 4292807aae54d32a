//! # Output Configuration
//!
//! This module decides how user-facing output looks: whether banners are
//! coloured, and whether a progress tick is shown while groot walks through
//! submodules that have nothing to say.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals

use std::env;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output configuration for controlling colors and progress ticks.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors should be used in output.
    pub use_color: bool,
    /// Whether stdout is attached to an interactive terminal.
    pub is_terminal: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stdout is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self {
            use_color,
            is_terminal: stdout_is_terminal(),
        }
    }

    /// Detect whether color output is supported based on environment.
    fn detect_color_support() -> bool {
        // The presence of NO_COLOR (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// A configuration for non-interactive use with colors disabled.
    pub fn plain() -> Self {
        Self {
            use_color: false,
            is_terminal: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Whether the controlling process's stdout is a real terminal.
pub fn stdout_is_terminal() -> bool {
    console::Term::stdout().is_term()
}

/// Format the per-repository banner line.
///
/// ```text
/// # ---[ lib/foo ]---
/// ```
pub fn banner(config: &OutputConfig, path: &str) -> String {
    if config.use_color {
        format!("# ---[ {} ]---", style(path).bold().cyan())
    } else {
        format!("# ---[ {} ]---", path)
    }
}

/// Prefix a warning line.
pub fn warning(config: &OutputConfig, msg: &str) -> String {
    if config.use_color {
        format!("{} {}", style("-W-").yellow().bold(), msg)
    } else {
        format!("-W- {}", msg)
    }
}

/// Prefix an error line.
pub fn error(config: &OutputConfig, msg: &str) -> String {
    if config.use_color {
        format!("{} {}", style("-E-").red().bold(), msg)
    } else {
        format!("-E- {}", msg)
    }
}

/// Spinner shown while quiet submodules are being visited.
///
/// Only ever draws on a terminal; otherwise every call is a no-op.
pub struct Ticker {
    bar: Option<ProgressBar>,
}

impl Ticker {
    pub fn new(enabled: bool) -> Self {
        let bar = enabled.then(|| {
            let bar = ProgressBar::new_spinner();
            if let Ok(tick_style) = ProgressStyle::with_template("{spinner} {msg}") {
                bar.set_style(tick_style);
            }
            bar
        });
        Self { bar }
    }

    /// Advance the spinner, labelled with the repository being visited.
    pub fn tick(&self, label: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(label.to_string());
            bar.tick();
        }
    }

    /// Run `f` with the spinner hidden so printed lines are not mangled.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        match &self.bar {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }

    /// Remove the spinner from the screen.
    pub fn clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
