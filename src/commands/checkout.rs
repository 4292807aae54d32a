//! # Checkout Command Implementation
//!
//! `groot checkout [-b NAME] [-t] [-f] [-N] [TARGET] [SUBMODULE..]`
//!
//! Without submodules, the root is checked out to `TARGET` (or re-checked out
//! on its current branch) and every submodule is synced. With submodules,
//! only those are synced and the root is left alone.

use anyhow::Result;
use clap::Args;

use groot::ops::{self, CheckoutOptions};
use groot::superproject::Superproject;

/// Check out the root and bring submodules onto their preferred branches
#[derive(Args, Debug)]
pub struct CheckoutArgs {
    /// Create a new branch in the root
    #[arg(short = 'b', value_name = "NAME")]
    pub new_branch: Option<String>,

    /// Set up tracking for the new branch
    #[arg(short, long)]
    pub track: bool,

    /// Discard local changes; move detached submodules onto their preferred
    /// branch even when they are not at its tip
    #[arg(short, long)]
    pub force: bool,

    /// Do not run `git submodule update` first
    #[arg(short = 'N', long)]
    pub no_update: bool,

    /// Target branch or commit, then the submodules to restrict the sync to
    #[arg(value_name = "ARGS")]
    pub args: Vec<String>,
}

impl CheckoutArgs {
    fn into_options(self) -> CheckoutOptions {
        let new_branch = self.new_branch.is_some();
        let (target, submodules) = match self.new_branch {
            Some(branch) => (Some(branch), self.args),
            None => split_target(self.args),
        };
        CheckoutOptions {
            target,
            new_branch,
            track: self.track,
            force: self.force,
            no_update: self.no_update,
            submodules,
        }
    }
}

/// The first argument is the target unless it looks like a submodule path.
fn split_target(mut args: Vec<String>) -> (Option<String>, Vec<String>) {
    match args.first() {
        Some(first) if !first.contains('/') => {
            let target = args.remove(0);
            (Some(target), args)
        }
        _ => (None, args),
    }
}

pub fn execute(args: CheckoutArgs, sp: &Superproject) -> Result<()> {
    let report = ops::checkout(sp, &args.into_options())?;
    if let Some(target) = &report.root_target {
        log::debug!("# Root checked out to {}", target);
    }
    Ok(())
}
