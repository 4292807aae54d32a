//! # Add Command Implementation
//!
//! `groot add` routes each path to the repository that owns it and runs
//! `git add` there, once per repository. Naming a submodule directory stages
//! the submodule pointer in the root.

use anyhow::Result;
use clap::Args;

use groot::ops;
use groot::superproject::Superproject;

/// Add paths to the index of the repository owning them
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Paths to add, and options passed to every `git add`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

/// Execute the `add` command.
pub fn execute(args: AddArgs, sp: &Superproject) -> Result<()> {
    let count = ops::add(sp, &args.args)?;
    log::debug!("# git add ran in {} repositories", count);
    Ok(())
}
