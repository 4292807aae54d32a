//! # Diff Command Implementation
//!
//! Diff of the root, then of every submodule; submodules without changes
//! print nothing unless `-v` is given.

use anyhow::Result;
use clap::Args;

use groot::ops::{self, DiffOptions};
use groot::superproject::Superproject;

/// Show changes in the root and in every changed submodule
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Mention submodules without changes too
    #[arg(short, long)]
    pub verbose: bool,

    /// Paths, and options passed to every git diff
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

pub fn execute(args: DiffArgs, sp: &Superproject) -> Result<()> {
    let options = DiffOptions {
        verbose: args.verbose || sp.ctx().is_verbose(),
        args: args.args,
    };
    ops::diff(sp, &options)?;
    Ok(())
}
