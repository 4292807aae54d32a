//! # Push Command Implementation
//!
//! Submodules on a branch are pushed to their preferred remote first; the
//! root goes last, so it never refers to commits nobody else can fetch.

use anyhow::Result;
use clap::Args;

use groot::ops::{self, PushOptions};
use groot::superproject::Superproject;

/// Push every submodule on a branch, then the root
#[derive(Args, Debug, Default)]
pub struct PushArgs {
    /// Passed to git push
    #[arg(short, long)]
    pub quiet: bool,

    /// Passed to git push
    #[arg(short, long)]
    pub verbose: bool,

    /// Push all branches
    #[arg(short, long)]
    pub all: bool,

    /// Mirror all refs
    #[arg(long)]
    pub mirror: bool,

    /// Delete the refs
    #[arg(long)]
    pub delete: bool,

    /// Push tags too
    #[arg(long)]
    pub tags: bool,

    /// Do everything except send the updates
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Machine-readable output
    #[arg(long)]
    pub porcelain: bool,

    /// Force progress reporting
    #[arg(long)]
    pub progress: bool,

    /// Force updates
    #[arg(short, long)]
    pub force: bool,
}

impl PushArgs {
    fn git_options(&self) -> Vec<String> {
        [
            ("--quiet", self.quiet),
            ("--verbose", self.verbose),
            ("--all", self.all),
            ("--mirror", self.mirror),
            ("--delete", self.delete),
            ("--tags", self.tags),
            ("--dry-run", self.dry_run),
            ("--porcelain", self.porcelain),
            ("--progress", self.progress),
            ("--force", self.force),
        ]
        .iter()
        .filter(|(_, on)| *on)
        .map(|(flag, _)| flag.to_string())
        .collect()
    }
}

pub fn execute(args: PushArgs, sp: &Superproject) -> Result<()> {
    let options = PushOptions {
        options: args.git_options(),
    };
    ops::push(sp, &options)?;
    Ok(())
}
