//! Checkout-sync: check out the root, then bring every submodule to the
//! commit the root records and onto its preferred branch where that is safe.
//!
//! After a run, each visited submodule is either on its preferred branch, or
//! detached at a commit that is not that branch's tip (and `force` was off).

use crate::error::Result;
use crate::git::Id;
use crate::ops::report_failure;
use crate::repository::CheckoutArgs;
use crate::submodule::Submodule;
use crate::superproject::Superproject;

#[derive(Debug, Clone, Default)]
pub struct CheckoutOptions {
    /// Branch or commit for the root. Defaults to the root's current branch.
    pub target: Option<String>,
    /// Create `target` as a new branch in the root.
    pub new_branch: bool,
    /// Set up tracking for a new root branch.
    pub track: bool,
    /// Discard local changes, and move detached submodules onto their
    /// preferred branch even when they are not at its tip.
    pub force: bool,
    /// Skip `git submodule update` before reconciling.
    pub no_update: bool,
    /// Only reconcile these submodules; the root is left alone.
    pub submodules: Vec<String>,
}

/// Where one submodule ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    OnBranch(String),
    Detached,
    /// Reconciliation failed; the error has been reported.
    Failed,
    /// The submodule is declared but not checked out.
    Missing,
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// The target the root was checked out to, if it was touched.
    pub root_target: Option<String>,
    pub submodules: Vec<(String, SyncState)>,
}

impl SyncReport {
    pub fn state_of(&self, rel_path: &str) -> Option<&SyncState> {
        self.submodules
            .iter()
            .find(|(rel, _)| rel == rel_path)
            .map(|(_, state)| state)
    }
}

pub fn checkout(sp: &Superproject, options: &CheckoutOptions) -> Result<SyncReport> {
    let ctx = sp.ctx();
    let root = sp.root();
    let mut report = SyncReport::default();

    let selected: Vec<&Submodule> = if options.submodules.is_empty() {
        let target = match &options.target {
            Some(target) => Some(target.clone()),
            None => root.current_branch()?,
        };
        match &target {
            Some(target) => {
                ctx.banner(".", false);
                ctx.log(format!("# Checking out {} in the root", target));
                let args = CheckoutArgs {
                    new_branch: options.new_branch,
                    track: options.track,
                    force: options.force,
                    ..Default::default()
                };
                root.checkout(target, &args)?;
            }
            None => ctx.log("# Root is detached, leaving it where it is"),
        }
        report.root_target = target;
        sp.submodules()?.iter().collect()
    } else {
        sp.select(&options.submodules)?
    };

    for sub in selected {
        ctx.tick(sub.rel_path());
        ctx.banner(sub.rel_path(), true);
        let state = match sync_submodule(sp, sub, options) {
            Ok(state) => state,
            Err(e) => {
                report_failure(ctx, sub, &e);
                SyncState::Failed
            }
        };
        ctx.discard();
        report.submodules.push((sub.rel_path().to_string(), state));
    }

    Ok(report)
}

fn sync_submodule(sp: &Superproject, sub: &Submodule, options: &CheckoutOptions) -> Result<SyncState> {
    let ctx = sp.ctx();
    if !options.no_update {
        sub.update(sp.root())?;
    }
    if !sub.repo().has_git_dir() {
        ctx.warning(format!("Submodule not initialized: {}", sub.rel_path()));
        return Ok(SyncState::Missing);
    }

    reconcile(sp, sub, options.force)?;

    let repo = sub.repo();
    match repo.current_branch()? {
        Some(branch) => {
            log::debug!("# {} is on {}", sub.rel_path(), branch);
            Ok(SyncState::OnBranch(branch))
        }
        None => {
            ctx.warning(format!(
                "Submodule in detached-head state after checkout: {}",
                sub.rel_path()
            ));
            Ok(SyncState::Detached)
        }
    }
}

/// Move the submodule onto its preferred branch when that is safe.
fn reconcile(sp: &Superproject, sub: &Submodule, force: bool) -> Result<()> {
    let ctx = sp.ctx();
    let repo = sub.repo();
    let branch = sub.preferred_branch();

    match repo.current_branch()? {
        None => {
            let tip = preferred_tip(sub)?;
            let head = repo.head()?;
            if head == tip {
                ctx.log_deferred(format!("# Detached at the tip of {}, checking it out", branch));
                switch_to_preferred(sub, force)
            } else if force {
                ctx.log(format!(
                    "# Detached away from the tip of {}, forcing a checkout of {}",
                    branch, branch
                ));
                switch_to_preferred(sub, force)
            } else {
                ctx.log_deferred(format!(
                    "# Detached away from the tip of {}, leaving it detached",
                    branch
                ));
                Ok(())
            }
        }
        Some(current) if current != branch => {
            ctx.log(format!("# Switching from {} to {}", current, branch));
            switch_to_preferred(sub, force)
        }
        Some(_) => {
            ctx.log_deferred(format!("# Already on {}", branch));
            Ok(())
        }
    }
}

/// Tip of the preferred branch, local first, then remote-tracking.
fn preferred_tip(sub: &Submodule) -> Result<Id> {
    match sub.head_of_preferred_branch() {
        Ok(tip) => Ok(tip),
        Err(e) if e.is_branch_not_found() => sub
            .repo()
            .remote_branch_tip(sub.preferred_remote(), sub.preferred_branch())?
            .ok_or(e),
        Err(e) => Err(e),
    }
}

/// Check out the preferred branch, creating it from the remote-tracking
/// branch (or from HEAD) when it does not exist locally.
fn switch_to_preferred(sub: &Submodule, force: bool) -> Result<()> {
    let repo = sub.repo();
    let branch = sub.preferred_branch();
    let mut args = CheckoutArgs {
        force,
        ..Default::default()
    };
    if !repo.branch_exists(branch)? {
        args.new_branch = true;
        if repo
            .remote_branch_tip(sub.preferred_remote(), branch)?
            .is_some()
        {
            args.track = true;
            args.start_point = Some(format!("{}/{}", sub.preferred_remote(), branch));
        }
    }
    repo.checkout(branch, &args)
}
