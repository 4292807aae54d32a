//! Commands that only make sense in the root: `branch`, `reset` and
//! `submodule` are handed to git unchanged.

use anyhow::Result;
use clap::Args;

use groot::ops;
use groot::superproject::Superproject;

/// Arguments forwarded verbatim to git
#[derive(Args, Debug)]
pub struct RootArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

pub fn execute(command: &str, args: RootArgs, sp: &Superproject) -> Result<()> {
    ops::root_command(sp, command, &args.args)?;
    Ok(())
}
