//! Creating superprojects: `clone` and `init`.
//!
//! Neither needs an existing root; both run git through a handle on the
//! directory they work in.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::context::Context;
use crate::defaults;
use crate::error::{Error, Result};
use crate::ops::checkout::{checkout, CheckoutOptions};
use crate::repository::Repository;
use crate::superproject::Superproject;

#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    pub url: String,
    /// Target directory; derived from the URL when missing.
    pub dir: Option<String>,
}

impl CloneOptions {
    /// The directory `git clone` will create.
    pub fn target_dir(&self) -> Result<String> {
        if let Some(dir) = &self.dir {
            return Ok(dir.clone());
        }
        dir_from_url(&self.url).ok_or_else(|| Error::Usage {
            message: format!("cannot derive a directory name from '{}'", self.url),
        })
    }
}

/// `host:group/name.git` and `https://host/name/` both give `name`.
pub fn dir_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let last = trimmed.rsplit(['/', ':']).next()?;
    (!last.is_empty()).then(|| last.to_string())
}

/// Clone a superproject into `base`, initialise its submodules and put them
/// on their preferred branches. Returns the new root.
pub fn clone(ctx: Rc<Context>, base: &Path, options: &CloneOptions) -> Result<PathBuf> {
    let dir = options.target_dir()?;
    let here = Repository::new(ctx.clone(), base);
    here.git(["clone", options.url.as_str(), dir.as_str()]).run()?;

    let root = base.join(&dir);
    let sp = Superproject::open(ctx.clone(), &root);
    if !root.join(defaults::GITMODULES_FILENAME).is_file() {
        ctx.log("# No submodules to initialize");
        return Ok(root);
    }
    sp.root().git(["submodule", "update", "--init"]).run()?;

    // Handles are resolved on creation, so reopen now the submodules exist.
    let sp = Superproject::open(ctx, &root);
    checkout(
        &sp,
        &CheckoutOptions {
            no_update: true,
            ..Default::default()
        },
    )?;
    Ok(root)
}

/// Turn `dir` into an (empty) superproject.
pub fn init(ctx: Rc<Context>, dir: &Path) -> Result<()> {
    let repo = Repository::new(ctx.clone(), dir);
    if dir.join(defaults::GIT_DIR_NAME).exists() {
        ctx.log("# Already a git repository");
    } else {
        repo.git(["init"]).run()?;
    }
    let gitmodules = dir.join(defaults::GITMODULES_FILENAME);
    if gitmodules.exists() {
        ctx.log(format!("# {} already exists", defaults::GITMODULES_FILENAME));
    } else {
        fs::write(&gitmodules, "")?;
        ctx.log(format!("# Created {}", defaults::GITMODULES_FILENAME));
    }
    Ok(())
}
