//! # Clone Command Implementation
//!
//! Clones a superproject, initializes its submodules and moves each one onto
//! its preferred branch, so the new tree is ready to work in.

use anyhow::{Context as _, Result};
use clap::Args;

use groot::ops::{self, CloneOptions};

use crate::cli::{finish, GlobalOptions};

/// Clone a superproject and set up its submodules
#[derive(Args, Debug)]
pub struct CloneArgs {
    /// Repository to clone
    #[arg(value_name = "URL")]
    pub url: String,

    /// Target directory (default: derived from the URL)
    #[arg(value_name = "DIR")]
    pub dir: Option<String>,
}

pub fn execute(args: CloneArgs, global: &GlobalOptions) -> Result<()> {
    let base = std::env::current_dir().context("Failed to read the current directory")?;
    let ctx = global.context(None)?;
    let options = CloneOptions {
        url: args.url,
        dir: args.dir,
    };
    let root = ops::clone(ctx.clone(), &base, &options)?;
    log::info!("Cloned into {}", root.display());
    finish(&ctx)
}
