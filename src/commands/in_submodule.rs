//! `groot in <submodule> <git args..>`, also reachable as
//! `groot --in <submodule> <git args..>`.

use anyhow::Result;
use clap::Args;

use groot::ops;
use groot::superproject::Superproject;

/// Run a git command inside one submodule
#[derive(Args, Debug)]
pub struct InArgs {
    /// Relative path of the submodule
    #[arg(value_name = "SUBMODULE")]
    pub submodule: String,

    /// The git command and its arguments
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required = true,
        value_name = "GIT_ARGS"
    )]
    pub args: Vec<String>,
}

pub fn execute(args: InArgs, sp: &Superproject) -> Result<()> {
    ops::in_submodule(sp, &args.submodule, &args.args)?;
    Ok(())
}
