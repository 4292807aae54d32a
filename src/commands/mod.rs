//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `groot`
//! command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the opened
//!   superproject (or the global options, for commands that do not need one)
//!   and calls into the `groot` library.
//!
//! Commands that merely forward to git take their arguments verbatim, hyphens
//! included, so that git's own options keep working.

pub mod add;
pub mod checkout;
pub mod clone;
pub mod commit;
pub mod completions;
pub mod diff;
pub mod in_submodule;
pub mod info;
pub mod init;
pub mod log;
pub mod merge;
pub mod pull;
pub mod push;
pub mod root;
pub mod start;
pub mod stash;
pub mod status;
