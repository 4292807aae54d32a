//! # Commit Command Implementation
//!
//! Commits in every submodule with something staged (or with routed paths),
//! then in the root. Submodules that advanced past their preferred branch
//! tip are staged in the root on the way; when no message is given, the root
//! commit message lists their new commits.

use anyhow::Result;
use clap::Args;

use groot::ops::{self, CommitOptions};
use groot::superproject::Superproject;

/// Commit in submodules, then in the root
#[derive(Args, Debug, Default)]
pub struct CommitArgs {
    /// Commit message
    #[arg(short, long, value_name = "MSG")]
    pub message: Option<String>,

    /// Take the commit message from a file
    #[arg(short = 'F', long, value_name = "FILE")]
    pub file: Option<String>,

    /// Reuse the message of a commit
    #[arg(short = 'C', long, value_name = "COMMIT")]
    pub reuse_message: Option<String>,

    /// Reuse and edit the message of a commit
    #[arg(short = 'c', long, value_name = "COMMIT")]
    pub reedit_message: Option<String>,

    /// Override the commit author
    #[arg(long, value_name = "AUTHOR")]
    pub author: Option<String>,

    /// Override the author date
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,

    /// Stage modified and deleted files first
    #[arg(short, long)]
    pub all: bool,

    /// Commit only the given paths
    #[arg(short, long)]
    pub only: bool,

    /// Stage the given paths in addition to the index
    #[arg(short, long)]
    pub include: bool,

    /// Passed to git commit
    #[arg(short, long)]
    pub quiet: bool,

    /// Passed to git commit
    #[arg(short, long)]
    pub verbose: bool,

    /// Paths to commit
    #[arg(value_name = "PATHS")]
    pub paths: Vec<String>,
}

impl From<CommitArgs> for CommitOptions {
    fn from(args: CommitArgs) -> Self {
        CommitOptions {
            message: args.message,
            file: args.file,
            reuse_message: args.reuse_message,
            reedit_message: args.reedit_message,
            author: args.author,
            date: args.date,
            all: args.all,
            only: args.only,
            include: args.include,
            quiet: args.quiet,
            verbose: args.verbose,
            paths: args.paths,
        }
    }
}

pub fn execute(args: CommitArgs, sp: &Superproject) -> Result<()> {
    let report = ops::commit(sp, &args.into())?;
    if !report.advanced.is_empty() {
        log::info!("Advanced submodules: {}", report.advanced.join(", "));
    }
    Ok(())
}
