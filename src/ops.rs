//! # Orchestration Protocols
//!
//! Each operation here is a fixed sequence of git commands over the
//! superproject. The shared rules:
//!
//! - Submodules are visited one at a time, in relative-path order.
//! - A failure inside one submodule is reported through the [`Context`] and
//!   counted; the loop continues with the next submodule.
//! - Preconditions (such as "everything is clean" for pull) are checked
//!   before anything is changed and abort the whole operation.
//! - Failures in the root abort the operation.
//!
//! The operations return small report values describing what happened, which
//! the command layer ignores and the tests inspect.

pub mod checkout;
pub mod clone;
pub mod commit;
pub mod info;
pub mod merge;
pub mod passthrough;
pub mod pull;
pub mod push;
pub mod start;
pub mod stash;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::repository::Repository;
use crate::submodule::Submodule;

pub use checkout::{checkout, CheckoutOptions, SyncReport, SyncState};
pub use clone::{clone, init, CloneOptions};
pub use commit::{commit, CommitOptions, CommitReport};
pub use info::{info, HeadState, InfoReport, SubmoduleInfo};
pub use merge::{merge, MergeOptions, MergeReport};
pub use passthrough::{add, diff, in_submodule, log, root_command, status, DiffOptions, StatusOptions};
pub use pull::{pull, PullOptions, PullReport};
pub use push::{push, PushOptions};
pub use start::start;
pub use stash::{stash, StashOptions, StashReport, StashTag};

/// Report a failure inside one submodule without stopping the loop.
pub(crate) fn report_failure(ctx: &Context, sub: &Submodule, err: &Error) {
    match err {
        Error::BranchNotFound { branch } => ctx.error(format!(
            "Specified branch doesn't exist in {}: {}",
            sub.rel_path(),
            branch
        )),
        other => ctx.error(format!("{}: {}", sub.rel_path(), other)),
    }
}

/// Record the submodule's checked-out commit in the root's index.
pub(crate) fn stage_submodule(root: &Repository, sub: &Submodule) -> Result<()> {
    let ctx = root.ctx();
    ctx.log(format!("# Staging new commit of {} in the root", sub.rel_path()));
    root.git(["add", "--", sub.rel_path()]).run()?;
    Ok(())
}

/// Aggregate one-line logs of advanced submodules into a commit message.
///
/// Each entry pairs a submodule with the commit the root recorded for it
/// before the operation.
pub(crate) fn advance_message(advanced: &[(&Submodule, String)]) -> Result<String> {
    let mut lines = Vec::new();
    for (sub, before) in advanced {
        lines.extend(sub.log_lines(before, "HEAD")?);
    }
    Ok(lines.join("\n"))
}

/// Split pass-through arguments into options (leading `-`) and the rest.
pub(crate) fn split_options(args: &[String]) -> (Vec<String>, Vec<String>) {
    args.iter().cloned().partition(|arg| arg.starts_with('-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_options() {
        let args: Vec<String> = ["-f", "a.txt", "--verbose", "b"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (options, rest) = split_options(&args);
        assert_eq!(options, vec!["-f", "--verbose"]);
        assert_eq!(rest, vec!["a.txt", "b"]);
    }
}
