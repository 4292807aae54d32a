//! # Error Handling
//!
//! This module defines the centralized error type for `groot`. It uses the
//! `thiserror` library to build one `Error` enum covering every failure the
//! orchestration engine can hit while driving git across a superproject.
//!
//! ## Taxonomy
//!
//! - **`Usage`**: malformed invocation, nothing has been touched yet.
//! - **`RepoNotFound`**: no enclosing superproject.
//! - **`Structure`**: on-disk git metadata (HEAD, a branch ref) is missing or
//!   unreadable. Fatal for the repository in question.
//! - **`BranchNotFound`**: a named branch does not exist. Checkout and merge
//!   reconciliation catch this one and downgrade it to a per-submodule error.
//! - **`GitCommand`**: git exited with a status the caller did not accept.
//! - **`GitOutput`**: git printed something the parsers do not recognise.
//! - **`NotClean`**: a protocol precondition refused to start.
//!
//! The `Result` alias is used across the library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for groot operations
#[derive(Error, Debug)]
pub enum Error {
    /// The command line was malformed.
    #[error("Invalid usage: {message}")]
    Usage { message: String },

    /// No superproject could be found from the starting directory.
    #[error("groot-based git repository not found (searched from {})", start.display())]
    RepoNotFound { start: PathBuf },

    /// Expected git metadata is missing or has unexpected contents.
    #[error("Unexpected repository layout: {message}")]
    Structure { message: String },

    /// A branch that was asked for does not exist.
    #[error("Branch not found: {branch}")]
    BranchNotFound { branch: String },

    /// A git subprocess exited with an unexpected status.
    ///
    /// Carries everything needed to reproduce the failure by hand.
    #[error("git command failed in {}: {} (exit code {}){}", path.display(), quote_argv(argv), code.map_or_else(|| "none".to_string(), |c| c.to_string()), format_stderr(stderr))]
    GitCommand {
        path: PathBuf,
        argv: Vec<String>,
        stdout: String,
        stderr: String,
        code: Option<i32>,
    },

    /// Git output did not match the shape a parser expects.
    #[error("Unrecognized git output from '{command}': {output}")]
    GitOutput { command: String, output: String },

    /// A repository has local changes that block the operation.
    #[error("Repository not clean: {path}")]
    NotClean { path: String },

    /// A settings file could not be loaded.
    #[error("Settings error in {}: {message}", path.display())]
    Settings { path: PathBuf, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Whether this error is the catchable "branch does not exist" condition.
    pub fn is_branch_not_found(&self) -> bool {
        matches!(self, Error::BranchNotFound { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Render an argv the way a user could paste it back into a shell.
pub fn quote_argv(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| {
            if !arg.is_empty()
                && arg
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "-_./=:@,+%^{}".contains(c))
            {
                arg.clone()
            } else {
                format!("'{}'", arg.replace('\'', r"'\''"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_stderr(stderr: &str) -> String {
    let stderr = stderr.trim_end();
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\n{}", stderr)
    }
}
