//! # Stash Command Implementation
//!
//! `groot stash [save|push|pop|apply|drop|clear|<other>] [options] [args]`
//!
//! Save stashes every dirty repository under one shared tag; pop, apply and
//! drop find the matching stash in each repository by that tag. Other
//! sub-actions only run in the root.

use anyhow::Result;
use clap::Args;

use groot::ops::{self, StashOptions};
use groot::superproject::Superproject;

/// Stash in every dirty repository, tied together by a shared tag
#[derive(Args, Debug)]
pub struct StashArgs {
    /// Sub-action, its options and arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

pub fn execute(args: StashArgs, sp: &Superproject) -> Result<()> {
    let options = StashOptions::parse(&args.args);
    let report = ops::stash(sp, &options)?;
    if let Some(tag) = &report.tag {
        log::debug!("# Stash tag {} used in: {:?}", tag, report.submodules);
    }
    Ok(())
}
