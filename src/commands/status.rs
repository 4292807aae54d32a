//! # Status Command Implementation
//!
//! Full status of the root, then the status of every submodule that is not
//! clean. `-v` shows clean submodules too.

use anyhow::Result;
use clap::Args;

use groot::ops::{self, StatusOptions};
use groot::superproject::Superproject;

/// Show the status of the root and of every submodule with changes
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Short format
    #[arg(short, long)]
    pub short: bool,

    /// Show clean submodules as well
    #[arg(short, long)]
    pub verbose: bool,

    /// Further arguments passed to git status
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

pub fn execute(args: StatusArgs, sp: &Superproject) -> Result<()> {
    let options = StatusOptions {
        short: args.short,
        verbose: args.verbose || sp.ctx().is_verbose(),
        args: args.args,
    };
    ops::status(sp, &options)?;
    Ok(())
}
