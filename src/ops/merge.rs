//! Merge-with-autoadvance.
//!
//! The ref is merged in every submodule where it resolves, then in the root.
//! Submodules that advanced (at the preferred tip before, no longer after)
//! are staged in the root once the root merge is done.

use crate::error::Result;
use crate::ops::{report_failure, stage_submodule};
use crate::submodule::Submodule;
use crate::superproject::Superproject;

#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Ref to merge.
    pub target: String,
    /// Only these submodules; the root is left alone when non-empty.
    pub submodules: Vec<String>,
    /// Options passed to every `git merge`.
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub merged: Vec<String>,
    pub advanced: Vec<String>,
    /// Submodules where the ref does not exist.
    pub skipped: Vec<String>,
    pub root_merged: bool,
}

pub fn merge(sp: &Superproject, options: &MergeOptions) -> Result<MergeReport> {
    let ctx = sp.ctx();
    let root = sp.root();
    let selected: Vec<&Submodule> = if options.submodules.is_empty() {
        sp.submodules()?.iter().collect()
    } else {
        sp.select(&options.submodules)?
    };

    let mut report = MergeReport::default();
    let mut advanced: Vec<&Submodule> = Vec::new();
    for sub in selected {
        if !sub.repo().has_git_dir() {
            ctx.warning(format!("Submodule not initialized: {}", sub.rel_path()));
            continue;
        }
        ctx.tick(sub.rel_path());
        ctx.banner(sub.rel_path(), true);
        match merge_submodule(sp, sub, options) {
            Ok(Outcome::Skipped) => report.skipped.push(sub.rel_path().to_string()),
            Ok(Outcome::Merged { advanced: moved }) => {
                report.merged.push(sub.rel_path().to_string());
                if moved {
                    report.advanced.push(sub.rel_path().to_string());
                    advanced.push(sub);
                }
            }
            Err(e) => report_failure(ctx, sub, &e),
        }
        ctx.discard();
    }

    if options.submodules.is_empty() {
        ctx.banner(".", false);
        root.git(merge_args(options)).run()?;
        report.root_merged = true;
    }

    for sub in advanced {
        stage_submodule(root, sub)?;
    }
    Ok(report)
}

enum Outcome {
    Skipped,
    Merged { advanced: bool },
}

fn merge_submodule(sp: &Superproject, sub: &Submodule, options: &MergeOptions) -> Result<Outcome> {
    let ctx = sp.ctx();
    let root = sp.root();

    if !sub.repo().rev_exists(&options.target)? {
        ctx.warning(format!(
            "{} does not exist in {}, not merging",
            options.target,
            sub.rel_path()
        ));
        return Ok(Outcome::Skipped);
    }

    let at_head_before = sub.is_at_head_or_missing(root)?;
    let recorded_before = sub.recorded_commit(root)?;
    log::debug!(
        "# {} at head before merge: {} (recorded {})",
        sub.rel_path(),
        at_head_before,
        recorded_before
    );

    sub.repo().git(merge_args(options)).run()?;

    let at_head_after = sub.is_at_head_or_missing(root)?;
    Ok(Outcome::Merged {
        advanced: at_head_before && !at_head_after,
    })
}

fn merge_args(options: &MergeOptions) -> Vec<String> {
    let mut args = vec!["merge".to_string()];
    args.extend(options.options.iter().cloned());
    args.push(options.target.clone());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{context, ScriptedRunner};
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    const SHA_A: &str = "1111111111111111111111111111111111111111";
    const SHA_B: &str = "2222222222222222222222222222222222222222";

    fn layout() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join(".git/HEAD"), "ref: refs/heads/master\n").unwrap();
        fs::write(
            root.join(".gitmodules"),
            "[submodule \"libA\"]\n\tpath = libA\n[submodule \"libB\"]\n\tpath = libB\n",
        )
        .unwrap();
        for lib in ["libA", "libB"] {
            let git = root.join(lib).join(".git");
            fs::create_dir_all(git.join("refs/heads")).unwrap();
            fs::write(git.join("HEAD"), "ref: refs/heads/master\n").unwrap();
            fs::write(git.join("refs/heads/master"), format!("{}\n", SHA_A)).unwrap();
        }
        temp
    }

    fn options(target: &str) -> MergeOptions {
        MergeOptions {
            target: target.to_string(),
            ..Default::default()
        }
    }

    #[test]
    #[serial]
    fn test_advanced_submodule_staged_after_root_merge() {
        let temp = layout();
        let tip = temp.path().join("libA/.git/refs/heads/master");
        let runner = ScriptedRunner::default();
        runner.respond(
            "submodule status --cached",
            &format!(" {} libA (heads/master)\n", SHA_A),
            0,
        );
        runner.respond_with("merge feature", "", 0, move || {
            if tip.exists() {
                fs::write(&tip, format!("{}\n", SHA_B)).unwrap();
            }
        });
        let (ctx, _, _) = context(runner.clone());
        let sp = Superproject::open(ctx, temp.path());

        let report = merge(&sp, &options("feature")).unwrap();

        assert_eq!(report.merged, vec!["libA", "libB"]);
        assert!(report.advanced.contains(&"libA".to_string()));
        assert!(report.root_merged);
        let calls = runner.calls.borrow();
        let root_merge = calls
            .iter()
            .position(|(dir, argv)| dir.as_deref() == Some(temp.path()) && argv[1] == "merge")
            .unwrap();
        let staging = calls
            .iter()
            .position(|(_, argv)| argv[1..] == ["add", "--", "libA"])
            .unwrap();
        assert!(root_merge < staging);
    }

    #[test]
    #[serial]
    fn test_missing_ref_is_skipped_with_warning() {
        let temp = layout();
        let runner = ScriptedRunner::default();
        runner.respond("rev-parse --verify --quiet", "", 1);
        let (ctx, _, err) = context(runner.clone());
        let sp = Superproject::open(ctx.clone(), temp.path());

        let report = merge(&sp, &options("nowhere")).unwrap();

        assert_eq!(report.skipped, vec!["libA", "libB"]);
        assert!(report.merged.is_empty());
        assert!(err.contents().contains("nowhere does not exist in libA"));
        assert_eq!(ctx.error_count(), 0);
        let merges = runner
            .commands()
            .into_iter()
            .filter(|c| c.starts_with("merge"))
            .count();
        assert_eq!(merges, 1);
    }

    #[test]
    #[serial]
    fn test_subset_leaves_root_alone() {
        let temp = layout();
        let runner = ScriptedRunner::default();
        runner.respond(
            "submodule status --cached",
            &format!(" {} libB (heads/master)\n", SHA_A),
            0,
        );
        let (ctx, _, _) = context(runner.clone());
        let sp = Superproject::open(ctx, temp.path());

        let report = merge(
            &sp,
            &MergeOptions {
                target: "dev".to_string(),
                submodules: vec!["libB".to_string()],
                options: vec!["--no-ff".to_string()],
            },
        )
        .unwrap();

        assert_eq!(report.merged, vec!["libB"]);
        assert!(!report.root_merged);
        let calls = runner.calls.borrow();
        let merges: Vec<_> = calls
            .iter()
            .filter(|(_, argv)| argv[1] == "merge")
            .collect();
        assert_eq!(merges.len(), 1);
        assert_eq!(merges[0].0.as_deref(), Some(temp.path().join("libB").as_path()));
        assert_eq!(merges[0].1[1..], ["merge", "--no-ff", "dev"]);
    }

    #[test]
    #[serial]
    fn test_failing_submodule_merge_continues() {
        let temp = layout();
        let runner = ScriptedRunner::default();
        runner.respond(
            "submodule status --cached",
            &format!(" {} libA (heads/master)\n", SHA_A),
            0,
        );
        runner.respond_once("merge feature", "CONFLICT", 1);
        let (ctx, _, err) = context(runner.clone());
        let sp = Superproject::open(ctx.clone(), temp.path());

        let report = merge(&sp, &options("feature")).unwrap();

        assert_eq!(ctx.error_count(), 1);
        assert!(err.contents().contains("-E- libA:"));
        assert_eq!(report.merged, vec!["libB"]);
        assert!(report.root_merged);
    }
}
