//! Start (or resume) a topic branch across the whole superproject.

use crate::error::Result;
use crate::ops::report_failure;
use crate::repository::{CheckoutArgs, Repository};
use crate::superproject::Superproject;

/// Switch the root and every initialized submodule to `branch`, creating it
/// where it does not exist yet. Returns the repositories where it was created.
pub fn start(sp: &Superproject, branch: &str) -> Result<Vec<String>> {
    let ctx = sp.ctx();
    let mut created = Vec::new();

    ctx.banner(".", false);
    if switch_or_create(sp.root(), branch)? {
        created.push(".".to_string());
    }

    for sub in sp.submodules()? {
        if !sub.repo().has_git_dir() {
            ctx.warning(format!("Submodule not initialized: {}", sub.rel_path()));
            continue;
        }
        ctx.tick(sub.rel_path());
        ctx.banner(sub.rel_path(), true);
        match switch_or_create(sub.repo(), branch) {
            Ok(true) => created.push(sub.rel_path().to_string()),
            Ok(false) => {}
            Err(e) => report_failure(ctx, sub, &e),
        }
        ctx.discard();
    }
    Ok(created)
}

fn switch_or_create(repo: &Repository, branch: &str) -> Result<bool> {
    if repo.current_branch()?.as_deref() == Some(branch) {
        repo.ctx().log_deferred(format!("# Already on {}", branch));
        return Ok(false);
    }
    let exists = repo.branch_exists(branch)?;
    repo.checkout(
        branch,
        &CheckoutArgs {
            new_branch: !exists,
            ..Default::default()
        },
    )?;
    Ok(!exists)
}
