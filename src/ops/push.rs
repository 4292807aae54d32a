//! Push submodules first, then the root, so the root never records a
//! submodule commit that has not been published.

use crate::error::Result;
use crate::ops::report_failure;
use crate::submodule::Submodule;
use crate::superproject::Superproject;

#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    /// Options passed to every `git push`, such as `--dry-run` or `--tags`.
    pub options: Vec<String>,
}

pub fn push(sp: &Superproject, options: &PushOptions) -> Result<Vec<String>> {
    let ctx = sp.ctx();
    let mut pushed = Vec::new();

    for sub in sp.submodules()? {
        if !sub.repo().has_git_dir() {
            ctx.warning(format!("Submodule not initialized: {}", sub.rel_path()));
            continue;
        }
        ctx.tick(sub.rel_path());
        ctx.banner(sub.rel_path(), true);
        match push_submodule(sub, options) {
            Ok(true) => pushed.push(sub.rel_path().to_string()),
            Ok(false) => {}
            Err(e) => report_failure(ctx, sub, &e),
        }
        ctx.discard();
    }

    ctx.banner(".", false);
    let mut args = vec!["push".to_string()];
    args.extend(options.options.iter().cloned());
    sp.root().git(args).run()?;
    Ok(pushed)
}

fn push_submodule(sub: &Submodule, options: &PushOptions) -> Result<bool> {
    let repo = sub.repo();
    let Some(branch) = repo.current_branch()? else {
        repo.ctx()
            .warning(format!("Submodule is detached, not pushing: {}", sub.rel_path()));
        return Ok(false);
    };
    let mut args = vec!["push".to_string()];
    args.extend(options.options.iter().cloned());
    args.push(sub.preferred_remote().to_string());
    args.push(branch);
    repo.git(args).run()?;
    Ok(true)
}
