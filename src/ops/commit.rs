//! Commit-with-autoadvance.
//!
//! Submodules are committed first. A submodule whose recorded commit was the
//! tip of its preferred branch before the commit, and is no longer afterwards,
//! has advanced: its new commit is staged in the root so the root commit
//! records it. When no message was given, the root message is built from the
//! one-line logs of the advanced submodules.

use crate::error::Result;
use crate::ops::{advance_message, report_failure, stage_submodule};
use crate::path::{self, RouteOptions, ROOT_KEY};
use crate::submodule::Submodule;
use crate::superproject::Superproject;

#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    pub message: Option<String>,
    pub file: Option<String>,
    pub reuse_message: Option<String>,
    pub reedit_message: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub all: bool,
    pub only: bool,
    pub include: bool,
    pub quiet: bool,
    pub verbose: bool,
    pub paths: Vec<String>,
}

impl CommitOptions {
    /// Whether git will not need an editor for the message.
    pub fn has_message(&self) -> bool {
        self.message.is_some()
            || self.file.is_some()
            || self.reuse_message.is_some()
            || self.reedit_message.is_some()
    }

    /// Options forwarded to every `git commit`.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        let valued = [
            ("--message", &self.message),
            ("--file", &self.file),
            ("--reuse-message", &self.reuse_message),
            ("--reedit-message", &self.reedit_message),
            ("--author", &self.author),
            ("--date", &self.date),
        ];
        for (flag, value) in valued {
            if let Some(value) = value {
                args.push(format!("{}={}", flag, value));
            }
        }
        let flags = [
            ("--all", self.all),
            ("--only", self.only),
            ("--include", self.include),
            ("--quiet", self.quiet),
            ("--verbose", self.verbose),
        ];
        args.extend(
            flags
                .iter()
                .filter(|(_, on)| *on)
                .map(|(flag, _)| flag.to_string()),
        );
        args
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Submodules whose new commit was staged in the root.
    pub advanced: Vec<String>,
    /// Submodules where `git commit` created a commit.
    pub committed: Vec<String>,
    /// Whether the root commit created a commit.
    pub root_committed: bool,
}

pub fn commit(sp: &Superproject, options: &CommitOptions) -> Result<CommitReport> {
    let ctx = sp.ctx();
    let root = sp.root();
    let submodules = sp.submodules()?;
    let map = if options.paths.is_empty() {
        path::route_all(submodules)
    } else {
        path::route(submodules, &options.paths, RouteOptions::default())
    };

    let mut report = CommitReport::default();
    let mut advanced: Vec<(&Submodule, String)> = Vec::new();

    for sub in submodules {
        let Some(route) = map.get(sub.rel_path()) else {
            log::debug!("# Nothing routed to {}, skipping", sub.rel_path());
            continue;
        };
        ctx.tick(sub.rel_path());
        ctx.banner(sub.rel_path(), true);
        match commit_submodule(sp, sub, &route.paths, options) {
            Ok(outcome) => {
                if outcome.committed {
                    report.committed.push(sub.rel_path().to_string());
                }
                if let Some(before) = outcome.advanced_from {
                    report.advanced.push(sub.rel_path().to_string());
                    advanced.push((sub, before));
                }
            }
            Err(e) => report_failure(ctx, sub, &e),
        }
        ctx.discard();
    }

    ctx.banner(".", false);
    let mut args = vec!["commit".to_string()];
    let mut root_options = options.clone();
    if root_options.all && !options.paths.is_empty() {
        // Paths were routed away; `--all` with paths is an error in git.
        root_options.all = false;
    }
    if !root_options.has_message() && !advanced.is_empty() {
        let message = advance_message(&advanced)?;
        if !message.is_empty() {
            root_options.message = Some(message);
        }
    }
    args.extend(root_options.args());

    let mut root_paths: Vec<String> = map
        .get(ROOT_KEY)
        .map(|route| route.paths.clone())
        .unwrap_or_default();
    if options.only || options.include {
        for (rel, route) in &map {
            if rel.as_str() != ROOT_KEY && !route.paths.is_empty() {
                root_paths.push(rel.clone());
            }
        }
    }
    if !root_paths.is_empty() {
        args.push("--".to_string());
        args.extend(root_paths);
    }

    let output = root.git(args).accept(&[0, 1]).run()?;
    report.root_committed = output.success();
    if !report.root_committed {
        ctx.log("# Nothing to commit in the root");
    }
    Ok(report)
}

struct SubmoduleOutcome {
    committed: bool,
    /// Commit the root recorded before, when the submodule advanced.
    advanced_from: Option<String>,
}

fn commit_submodule(
    sp: &Superproject,
    sub: &Submodule,
    paths: &[String],
    options: &CommitOptions,
) -> Result<SubmoduleOutcome> {
    let ctx = sp.ctx();
    let root = sp.root();

    let at_head_before = sub.is_at_head_or_missing(root)?;
    let recorded_before = sub.recorded_commit(root)?;
    log::debug!("# {} at head before commit: {}", sub.rel_path(), at_head_before);

    let mut args = vec!["commit".to_string()];
    args.extend(options.args());
    if !paths.is_empty() {
        args.push("--".to_string());
        args.extend(paths.iter().cloned());
    }

    let committed = if options.has_message() {
        let output = sub
            .repo()
            .git(args)
            .interactive()
            .capture()
            .accept(&[0, 1])
            .run()?;
        if output.success() {
            ctx.log(output.stdout.trim_end());
        } else if ctx.is_verbose() {
            ctx.log("# Nothing to commit");
        }
        output.success()
    } else {
        // The editor needs the terminal, so nothing is captured.
        ctx.flush();
        sub.repo().git(args).accept(&[0, 1]).run()?.success()
    };

    let at_head_after = sub.is_at_head_or_missing(root)?;
    log::debug!("# {} at head after commit: {}", sub.rel_path(), at_head_after);

    let advanced_from = if committed && at_head_before && !at_head_after {
        stage_submodule(root, sub)?;
        Some(recorded_before.name().to_string())
    } else {
        None
    };
    Ok(SubmoduleOutcome {
        committed,
        advanced_from,
    })
}
