//! # Merge Command Implementation
//!
//! `groot merge [OPTIONS] REF [SUBMODULE..]` merges `REF` in every submodule
//! where it exists and then in the root. Naming submodules restricts the
//! merge to them and leaves the root alone.

use anyhow::{bail, Result};
use clap::Args;

use groot::ops::{self, MergeOptions};
use groot::superproject::Superproject;

/// Merge a ref in every submodule, then in the root
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Create a merge commit even for fast-forwards
    #[arg(long)]
    pub no_ff: bool,

    /// Refuse anything but a fast-forward
    #[arg(long)]
    pub ff_only: bool,

    /// Merge message
    #[arg(short, long, value_name = "MSG")]
    pub message: Option<String>,

    /// Ref to merge, then the submodules to restrict the merge to
    #[arg(value_name = "ARGS", required = true)]
    pub args: Vec<String>,
}

impl MergeArgs {
    fn into_options(self) -> Result<MergeOptions> {
        let mut args = self.args.into_iter();
        let Some(target) = args.next() else {
            bail!("Missing branch/commit name");
        };
        let mut options = Vec::new();
        if self.no_ff {
            options.push("--no-ff".to_string());
        }
        if self.ff_only {
            options.push("--ff-only".to_string());
        }
        if let Some(message) = self.message {
            options.push("-m".to_string());
            options.push(message);
        }
        Ok(MergeOptions {
            target,
            submodules: args.collect(),
            options,
        })
    }
}

pub fn execute(args: MergeArgs, sp: &Superproject) -> Result<()> {
    let report = ops::merge(sp, &args.into_options()?)?;
    if !report.skipped.is_empty() {
        log::info!("Not merged in: {}", report.skipped.join(", "));
    }
    Ok(())
}
