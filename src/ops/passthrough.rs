//! Commands that mostly hand their arguments to git, once per repository.
//!
//! Path arguments are routed to the repository owning them (see
//! [`crate::path`]), options are repeated for every invocation. Submodules
//! with nothing to say are kept quiet through the deferred log.

use crate::error::{Error, Result};
use crate::ops::split_options;
use crate::path::{self, RouteOptions, RoutingMap, ROOT_KEY};
use crate::submodule::Submodule;
use crate::superproject::Superproject;

/// Run `git add` once per routing entry, in routing order.
///
/// Naming a submodule directory stages the submodule itself in the root.
/// Returns the number of `git add` invocations.
pub fn add(sp: &Superproject, args: &[String]) -> Result<usize> {
    let ctx = sp.ctx();
    let (options, paths) = split_options(args);
    let map = path::route(
        sp.submodules()?,
        &paths,
        RouteOptions {
            submodule_dir_as_root_path: true,
            ..Default::default()
        },
    );
    if map.is_empty() {
        ctx.warning("Nothing specified, nothing added");
        return Ok(0);
    }

    for (key, route) in &map {
        let repo = route.submodule.map(Submodule::repo).unwrap_or(sp.root());
        ctx.banner(display_key(key), false);
        if route.submodule.is_some() {
            ctx.log(format!("# add: {}", route.paths.join(" ")));
        }
        repo.git(with_paths("add", &options, &route.paths)).run()?;
    }
    Ok(map.len())
}

/// `git log` per routing entry; no paths means the root.
///
/// Revisions and option values are passed to every `git log` unchanged;
/// see [`split_pathspecs`] for what counts as a path.
pub fn log(sp: &Superproject, args: &[String]) -> Result<()> {
    let ctx = sp.ctx();
    let (options, paths) = split_pathspecs(sp, args)?;
    let map = path::route(
        sp.submodules()?,
        &paths,
        RouteOptions {
            default_root: true,
            ..Default::default()
        },
    );
    for (key, route) in &map {
        let repo = route.submodule.map(Submodule::repo).unwrap_or(sp.root());
        ctx.banner(display_key(key), false);
        repo.git(with_paths("log", &options, &route.paths))
            .interactive()
            .run()?;
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    /// Also show submodules without changes.
    pub verbose: bool,
    /// Options and paths passed to `git diff`.
    pub args: Vec<String>,
}

/// Diff the root, then every submodule that has changes.
pub fn diff(sp: &Superproject, options: &DiffOptions) -> Result<()> {
    let ctx = sp.ctx();
    let (flags, paths) = split_pathspecs(sp, &options.args)?;
    let map: RoutingMap<'_> = if paths.is_empty() {
        path::route_all(sp.submodules()?)
    } else {
        path::route(sp.submodules()?, &paths, RouteOptions::default())
    };

    if let Some(route) = map.get(ROOT_KEY) {
        ctx.banner(".", false);
        sp.root()
            .git(with_paths("diff", &flags, &route.paths))
            .interactive()
            .run()?;
    }

    for sub in sp.submodules()? {
        let Some(route) = map.get(sub.rel_path()) else {
            ::log::debug!("# Skipping submodule: {}", sub.rel_path());
            continue;
        };
        if !sub.repo().has_git_dir() {
            continue;
        }
        ctx.tick(sub.rel_path());
        ctx.banner(sub.rel_path(), true);
        let stdout = sub
            .repo()
            .git(with_paths("diff", &flags, &route.paths))
            .interactive()
            .stdout()?;
        if !stdout.trim().is_empty() {
            ctx.log(stdout.trim_end());
        } else if options.verbose {
            ctx.log("# No changes");
        }
        ctx.discard();
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    pub short: bool,
    /// Show every submodule, clean or not.
    pub verbose: bool,
    /// Further arguments passed to `git status`.
    pub args: Vec<String>,
}

impl StatusOptions {
    fn git_args(&self) -> Vec<String> {
        let mut args = vec!["status".to_string()];
        if self.short {
            args.push("--short".to_string());
        }
        args.extend(self.args.iter().cloned());
        args
    }
}

/// Whether captured `git status` output describes a clean submodule.
///
/// Long format must say "nothing to commit" and not be detached; short
/// format must be empty.
pub fn status_is_clean(stdout: &str, short: bool) -> bool {
    if short {
        return stdout.trim().is_empty();
    }
    let detached =
        stdout.contains("HEAD detached") || stdout.contains("Not currently on any branch");
    stdout.contains("nothing to commit") && !detached
}

/// Status of the root, then of every submodule that is not clean.
///
/// Returns the submodules that were shown.
pub fn status(sp: &Superproject, options: &StatusOptions) -> Result<Vec<String>> {
    let ctx = sp.ctx();
    ctx.banner(".", false);
    sp.root().git(options.git_args()).interactive().run()?;

    let mut shown = Vec::new();
    for sub in sp.submodules()? {
        if !sub.repo().exists() || !sub.repo().has_git_dir() {
            ctx.warning(format!("Missing submodule: {}", sub.rel_path()));
            continue;
        }
        ctx.tick(sub.rel_path());
        let stdout = sub
            .repo()
            .git(options.git_args())
            .interactive()
            .stdout()?;
        if options.verbose || !status_is_clean(&stdout, options.short) {
            ctx.banner(sub.rel_path(), false);
            ctx.log(stdout.trim_end());
            shown.push(sub.rel_path().to_string());
        }
    }
    Ok(shown)
}

/// Run a git command inside one submodule.
pub fn in_submodule(sp: &Superproject, rel_path: &str, args: &[String]) -> Result<()> {
    let sub = sp.submodule(rel_path)?.ok_or_else(|| Error::Usage {
        message: format!("no such submodule: {}", rel_path),
    })?;
    if args.is_empty() {
        return Err(Error::Usage {
            message: "no git command given".to_string(),
        });
    }
    sp.ctx().banner(sub.rel_path(), false);
    sub.repo().git(args.iter().cloned()).interactive().run()?;
    Ok(())
}

/// Run `git <command> <args>` in the root only.
pub fn root_command(sp: &Superproject, command: &str, args: &[String]) -> Result<()> {
    let mut argv = vec![command.to_string()];
    argv.extend(args.iter().cloned());
    sp.root().git(argv).interactive().run()?;
    Ok(())
}

fn display_key(key: &str) -> &str {
    if key == ROOT_KEY {
        "."
    } else {
        key
    }
}

/// Separate path arguments from revisions, options and option values.
///
/// Everything after a literal `--` is a path. Before it, an argument is a
/// path when it lies inside a submodule or names something that exists
/// under the root; anything else keeps its place among the options.
fn split_pathspecs(sp: &Superproject, args: &[String]) -> Result<(Vec<String>, Vec<String>)> {
    let rel_paths: Vec<&str> = sp.submodules()?.iter().map(Submodule::rel_path).collect();
    let mut options = Vec::new();
    let mut paths = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--" {
            paths.extend(iter.by_ref().cloned());
            break;
        }
        let is_path = !arg.starts_with('-')
            && (path::owner(rel_paths.iter().copied(), arg).is_some()
                || sp.root_path().join(arg).exists());
        if is_path {
            paths.push(arg.clone());
        } else {
            options.push(arg.clone());
        }
    }
    Ok((options, paths))
}

/// `<command> <options> [-- <paths>]`
fn with_paths(command: &str, options: &[String], paths: &[String]) -> Vec<String> {
    let mut args = vec![command.to_string()];
    args.extend(options.iter().cloned());
    if !paths.is_empty() {
        args.push("--".to_string());
        args.extend(paths.iter().cloned());
    }
    args
}
