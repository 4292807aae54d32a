//! `groot start <branch>`: put the root and every submodule on `branch`,
//! creating it where needed.

use anyhow::Result;
use clap::Args;

use groot::ops;
use groot::superproject::Superproject;

/// Create or switch to a branch everywhere
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Branch name
    #[arg(value_name = "BRANCH")]
    pub branch: String,
}

pub fn execute(args: StartArgs, sp: &Superproject) -> Result<()> {
    let created = ops::start(sp, &args.branch)?;
    if !created.is_empty() {
        sp.ctx().log(format!(
            "# Created {} in: {}",
            args.branch,
            created.join(", ")
        ));
    }
    Ok(())
}
