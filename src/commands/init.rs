//! # Init Command Implementation
//!
//! Turns a directory into a superproject: runs `git init` when there is no
//! repository yet and creates an empty `.gitmodules`. An existing
//! `.gitmodules` is left untouched.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;

use groot::ops;

use crate::cli::{finish, GlobalOptions};

/// Turn a directory into a superproject
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: the current directory)
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

pub fn execute(args: InitArgs, global: &GlobalOptions) -> Result<()> {
    let dir = match args.dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let ctx = global.context(Some(&dir))?;
    ops::init(ctx.clone(), &dir)?;
    finish(&ctx)
}
