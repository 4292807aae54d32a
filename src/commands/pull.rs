//! # Pull Command Implementation
//!
//! Refuses to run unless every repository is clean. Pulls each submodule
//! from its upstream, then the root, and records advanced submodules in a
//! root commit unless `--no-commit` is given or the `pull.auto_commit`
//! setting is off.

use anyhow::Result;
use clap::Args;

use groot::ops::{self, PullOptions};
use groot::superproject::Superproject;

/// Pull every submodule and the root, recording advanced submodules
#[derive(Args, Debug, Default)]
pub struct PullArgs {
    /// Passed to git pull
    #[arg(short, long)]
    pub quiet: bool,

    /// Passed to git pull
    #[arg(short, long)]
    pub verbose: bool,

    /// Fetch from all remotes
    #[arg(long)]
    pub all: bool,

    /// Rebase instead of merging
    #[arg(long)]
    pub rebase: bool,

    /// Do not commit advanced submodules in the root
    #[arg(long)]
    pub no_commit: bool,
}

pub fn execute(args: PullArgs, sp: &Superproject) -> Result<()> {
    let options = PullOptions {
        quiet: args.quiet,
        verbose: args.verbose,
        all: args.all,
        rebase: args.rebase,
        auto_commit: !args.no_commit && sp.ctx().settings().pull_auto_commit,
    };
    let report = ops::pull(sp, &options)?;
    if !report.advanced.is_empty() && !report.root_committed {
        sp.ctx().log(format!(
            "# Advanced but not committed: {}",
            report.advanced.join(", ")
        ));
    }
    Ok(())
}
