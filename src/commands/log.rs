//! `groot log`: `git log` in every repository owning one of the paths, or in
//! the root when no path is given.

use anyhow::Result;
use clap::Args;

use groot::ops;
use groot::superproject::Superproject;

/// Show logs of the repositories owning the given paths
#[derive(Args, Debug)]
pub struct LogArgs {
    /// Paths, and options passed to every `git log`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

pub fn execute(args: LogArgs, sp: &Superproject) -> Result<()> {
    ops::log(sp, &args.args)?;
    Ok(())
}
