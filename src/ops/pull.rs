//! Pull-with-autocommit.
//!
//! Refuses to start unless every submodule and the root are clean. Each
//! submodule on a branch is pulled from its upstream, which is set up from
//! the preferred remote when missing. A submodule whose HEAD moved has
//! advanced. After the root has been pulled, advanced submodules are staged
//! and recorded in one root commit whose message lists the pulled commits.

use crate::error::{Error, Result};
use crate::ops::{advance_message, report_failure, stage_submodule};
use crate::submodule::Submodule;
use crate::superproject::Superproject;

#[derive(Debug, Clone, Default)]
pub struct PullOptions {
    pub quiet: bool,
    pub verbose: bool,
    /// Fetch from all remotes instead of the upstream only.
    pub all: bool,
    pub rebase: bool,
    /// Record advanced submodules in a root commit.
    pub auto_commit: bool,
}

impl PullOptions {
    fn args(&self) -> Vec<String> {
        [
            ("--quiet", self.quiet),
            ("--verbose", self.verbose),
            ("--all", self.all),
            ("--rebase", self.rebase),
        ]
        .iter()
        .filter(|(_, on)| *on)
        .map(|(flag, _)| flag.to_string())
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullReport {
    pub advanced: Vec<String>,
    pub root_committed: bool,
}

pub fn pull(sp: &Superproject, options: &PullOptions) -> Result<PullReport> {
    let ctx = sp.ctx();
    let root = sp.root();
    let submodules = sp.submodules()?;

    let mut dirty = Vec::new();
    for sub in submodules {
        if sub.repo().has_git_dir() && !sub.repo().is_clean(false)? {
            dirty.push(sub.rel_path().to_string());
        }
    }
    if !root.is_clean(true)? {
        dirty.push(".".to_string());
    }
    if !dirty.is_empty() {
        return Err(Error::NotClean {
            path: dirty.join(", "),
        });
    }

    let mut report = PullReport::default();
    let mut advanced: Vec<(&Submodule, String)> = Vec::new();
    for sub in submodules {
        if !sub.repo().has_git_dir() {
            ctx.warning(format!("Submodule not initialized: {}", sub.rel_path()));
            continue;
        }
        ctx.tick(sub.rel_path());
        ctx.banner(sub.rel_path(), false);
        match pull_submodule(sp, sub, options) {
            Ok(Some(recorded_before)) => {
                report.advanced.push(sub.rel_path().to_string());
                advanced.push((sub, recorded_before));
            }
            Ok(None) => {}
            Err(e) => report_failure(ctx, sub, &e),
        }
    }

    ctx.banner(".", false);
    let mut args = vec!["pull".to_string()];
    args.extend(options.args());
    root.git(args).run()?;

    if options.auto_commit && !advanced.is_empty() {
        for (sub, _) in &advanced {
            stage_submodule(root, sub)?;
        }
        if root.is_index_clean()? {
            ctx.log("# Nothing to commit");
        } else {
            let message = advance_message(&advanced)?;
            let message = if message.is_empty() {
                "Pull submodules".to_string()
            } else {
                message
            };
            root.git(["commit".to_string(), "-m".to_string(), message]).run()?;
            report.root_committed = true;
        }
    }

    Ok(report)
}

/// Pull one submodule; returns the previously recorded commit if it advanced.
fn pull_submodule(sp: &Superproject, sub: &Submodule, options: &PullOptions) -> Result<Option<String>> {
    let ctx = sp.ctx();
    let repo = sub.repo();

    let Some(branch) = repo.current_branch()? else {
        ctx.warning(format!("Submodule is detached, not pulling: {}", sub.rel_path()));
        return Ok(None);
    };
    let Some((remote, remote_branch)) = ensure_upstream(sp, sub, &branch)? else {
        ctx.warning(format!(
            "No upstream for {} in {}, not pulling",
            branch,
            sub.rel_path()
        ));
        return Ok(None);
    };

    let before = repo.head_commit()?;
    let recorded_before = sub.recorded_commit(sp.root())?;

    let mut args = vec!["pull".to_string()];
    args.extend(options.args());
    if !options.all {
        args.push(remote);
        args.push(remote_branch);
    }
    repo.git(args).run()?;

    let after = repo.head_commit()?;
    if before == after {
        log::debug!("# {} did not move", sub.rel_path());
        return Ok(None);
    }
    Ok(Some(recorded_before.name().to_string()))
}

/// The configured upstream of `branch`, setting one up from the preferred
/// remote when it is missing.
fn ensure_upstream(sp: &Superproject, sub: &Submodule, branch: &str) -> Result<Option<(String, String)>> {
    let repo = sub.repo();
    if let Some(upstream) = repo.upstream(branch)? {
        return Ok(Some(upstream));
    }

    let remote = sub.preferred_remote();
    if repo.remote_branch_tip(remote, branch)?.is_none() {
        return Ok(None);
    }
    sp.ctx().warning(format!(
        "Setting upstream of {} in {} to {}/{}",
        branch,
        sub.rel_path(),
        remote,
        branch
    ));
    repo.git([
        "branch".to_string(),
        format!("--set-upstream-to={}/{}", remote, branch),
        branch.to_string(),
    ])
    .run()?;
    Ok(Some((remote.to_string(), branch.to_string())))
}
