//! Stash-with-tag-correlation.
//!
//! One logical stash spans the root and every dirty submodule. Each stash
//! message carries the same random tag, `[groot-XXXXXX]`, so a later pop,
//! apply or drop can find the matching entry in every repository even when
//! the stacks have drifted apart.
//!
//! When the root has nothing of its own to stash, an empty marker file is
//! force-added so the root still records the tag; it is removed again when
//! the stash is popped or applied.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;

use crate::defaults;
use crate::error::Result;
use crate::ops::report_failure;
use crate::repository::Repository;
use crate::submodule::Submodule;
use crate::superproject::Superproject;

/// The correlation token shared by the stashes of one logical stash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashTag(String);

impl StashTag {
    pub fn generate() -> Self {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(defaults::STASH_TAG_LEN)
            .map(char::from)
            .collect();
        Self(format!("{}{}", defaults::STASH_TAG_PREFIX, token))
    }

    /// Wrap an already formatted tag such as `groot-a1B2c3`.
    pub fn from_raw(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// `groot-XXXXXX`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The random part.
    pub fn token(&self) -> &str {
        self.0
            .strip_prefix(defaults::STASH_TAG_PREFIX)
            .unwrap_or(&self.0)
    }

    /// Name of the root marker file for this tag.
    pub fn marker_name(&self) -> String {
        format!("{}{}", defaults::STASH_MARKER_PREFIX, self.token())
    }
}

impl fmt::Display for StashTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

/// One `git stash list` line that carries a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedStash {
    pub stash: String,
    pub tag: StashTag,
}

/// Tagged entries of a `git stash list` output, in listing order.
pub fn parse_stash_list(listing: &str) -> Result<Vec<TaggedStash>> {
    let re = Regex::new(r"^(stash@\{\d+\}): .*\[(groot-[A-Za-z0-9]+)\]")?;
    Ok(listing
        .lines()
        .filter_map(|line| re.captures(line))
        .map(|caps| TaggedStash {
            stash: caps[1].to_string(),
            tag: StashTag::from_raw(&caps[2]),
        })
        .collect())
}

/// Turn a bare number into `stash@{N}`.
pub fn normalize_selector(selector: &str) -> String {
    if !selector.is_empty() && selector.bytes().all(|b| b.is_ascii_digit()) {
        format!("stash@{{{}}}", selector)
    } else {
        selector.to_string()
    }
}

/// A parsed `groot stash` command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashOptions {
    /// `save` (also for `push` and no sub-action), `pop`, `apply`, ...
    pub action: String,
    /// Arguments starting with `-`, passed through.
    pub options: Vec<String>,
    /// Message given with `-m`/`--message`.
    pub message: Option<String>,
    /// Remaining arguments: message words for save, the selector otherwise.
    pub args: Vec<String>,
}

impl StashOptions {
    pub fn parse(raw: &[String]) -> Self {
        let mut rest = raw;
        let action = match raw.first() {
            Some(first) if !first.starts_with('-') => {
                rest = &raw[1..];
                match first.as_str() {
                    "push" => "save".to_string(),
                    other => other.to_string(),
                }
            }
            _ => "save".to_string(),
        };

        let mut options = Vec::new();
        let mut message = None;
        let mut args = Vec::new();
        let mut iter = rest.iter();
        while let Some(arg) = iter.next() {
            if arg == "-m" || arg == "--message" {
                message = iter.next().cloned();
            } else if let Some(text) = arg.strip_prefix("--message=") {
                message = Some(text.to_string());
            } else if arg.starts_with('-') {
                options.push(arg.clone());
            } else {
                args.push(arg.clone());
            }
        }

        Self {
            action,
            options,
            message,
            args,
        }
    }

    fn user_message(&self) -> Option<String> {
        match (&self.message, self.args.is_empty()) {
            (Some(message), _) => Some(message.clone()),
            (None, false) => Some(self.args.join(" ")),
            (None, true) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StashReport {
    pub tag: Option<StashTag>,
    /// Submodules the action was carried out in.
    pub submodules: Vec<String>,
    /// Whether a marker file was created or removed in the root.
    pub marker: bool,
}

pub fn stash(sp: &Superproject, options: &StashOptions) -> Result<StashReport> {
    match options.action.as_str() {
        "save" => save(sp, options),
        "pop" | "apply" | "drop" => restore(sp, options),
        "clear" => clear(sp, options),
        _ => {
            let mut args = vec!["stash".to_string(), options.action.clone()];
            args.extend(options.options.iter().cloned());
            args.extend(options.args.iter().cloned());
            sp.root().git(args).run()?;
            Ok(StashReport::default())
        }
    }
}

fn save(sp: &Superproject, options: &StashOptions) -> Result<StashReport> {
    let ctx = sp.ctx();
    let root = sp.root();

    let mut dirty: Vec<&Submodule> = Vec::new();
    for sub in sp.submodules()? {
        if sub.repo().has_git_dir() && !sub.repo().is_clean(false)? {
            dirty.push(sub);
        }
    }
    let root_dirty = !root.is_clean(true)?;
    if dirty.is_empty() && !root_dirty {
        ctx.log("# Nothing to stash");
        return Ok(StashReport::default());
    }

    let tag = StashTag::generate();
    let mut report = StashReport {
        tag: Some(tag.clone()),
        ..Default::default()
    };

    ctx.banner(".", false);
    if !root_dirty {
        let marker = tag.marker_name();
        ctx.log(format!("# Root is clean, recording the stash with {}", marker));
        fs::write(
            root.work_tree().join(&marker),
            format!("groot stash marker {}\n", tag.as_str()),
        )?;
        root.git(["add", "-f", "--", marker.as_str()]).run()?;
        report.marker = true;
    }
    if let Err(e) = push_tagged(root, options, &tag) {
        if report.marker {
            if let Err(cleanup) = remove_marker(root, &tag) {
                log::warn!("failed to remove stash marker: {}", cleanup);
            }
        }
        return Err(e);
    }

    for sub in dirty {
        ctx.banner(sub.rel_path(), false);
        match push_tagged(sub.repo(), options, &tag) {
            Ok(()) => report.submodules.push(sub.rel_path().to_string()),
            Err(e) => report_failure(ctx, sub, &e),
        }
    }
    Ok(report)
}

/// `git stash push [opts] -m "<message> [tag]"` in one repository.
fn push_tagged(repo: &Repository, options: &StashOptions, tag: &StashTag) -> Result<()> {
    let message = match options.user_message() {
        Some(message) => message,
        None => {
            let (hash, subject) = repo.head_summary()?;
            format!("{} {}", hash, subject)
        }
    };
    let mut args = vec!["stash".to_string(), "push".to_string()];
    args.extend(options.options.iter().cloned());
    args.push("-m".to_string());
    args.push(format!("{} {}", message, tag));
    repo.git(args).run()?;
    Ok(())
}

fn restore(sp: &Superproject, options: &StashOptions) -> Result<StashReport> {
    let ctx = sp.ctx();
    let root = sp.root();

    let selector = options
        .args
        .first()
        .map(|s| normalize_selector(s))
        .unwrap_or_else(|| "stash@{0}".to_string());
    let listing = root.git(["stash", "list"]).stdout()?;
    let tag = parse_stash_list(&listing)?
        .into_iter()
        .find(|entry| entry.stash == selector)
        .map(|entry| entry.tag);

    ctx.banner(".", false);
    let mut args = vec!["stash".to_string(), options.action.clone()];
    args.extend(options.options.iter().cloned());
    args.push(selector.clone());
    root.git(args).run()?;

    let Some(tag) = tag else {
        ctx.warning(format!(
            "No groot tag on {}, not running '{}' in submodules",
            selector, options.action
        ));
        return Ok(StashReport::default());
    };

    let mut report = StashReport {
        tag: Some(tag.clone()),
        ..Default::default()
    };
    report.marker = remove_marker(root, &tag)?;

    for sub in sp.submodules()? {
        if !sub.repo().has_git_dir() {
            continue;
        }
        ctx.tick(sub.rel_path());
        ctx.banner(sub.rel_path(), true);
        match restore_submodule(sub, options, &tag) {
            Ok(true) => report.submodules.push(sub.rel_path().to_string()),
            Ok(false) => {}
            Err(e) => report_failure(ctx, sub, &e),
        }
        ctx.discard();
    }
    Ok(report)
}

fn restore_submodule(sub: &Submodule, options: &StashOptions, tag: &StashTag) -> Result<bool> {
    let ctx = sub.repo().ctx();
    let listing = sub.repo().git(["stash", "list"]).stdout()?;
    let Some(entry) = parse_stash_list(&listing)?
        .into_iter()
        .find(|entry| &entry.tag == tag)
    else {
        ctx.log_deferred(format!("# No stash tagged {}", tag));
        return Ok(false);
    };

    ctx.log(format!("# {} {} {}", options.action, entry.stash, tag));
    let mut args = vec!["stash".to_string(), options.action.clone()];
    args.extend(options.options.iter().cloned());
    args.push(entry.stash);
    sub.repo().git(args).run()?;
    Ok(true)
}

/// Unstage and delete the marker file for `tag`, if it is there.
fn remove_marker(root: &Repository, tag: &StashTag) -> Result<bool> {
    let marker = tag.marker_name();
    let path: PathBuf = root.work_tree().join(&marker);
    if !path.exists() {
        return Ok(false);
    }
    root.git([
        "rm",
        "--cached",
        "--quiet",
        "--ignore-unmatch",
        "--",
        marker.as_str(),
    ])
    .run()?;
    fs::remove_file(&path)?;
    root.ctx().log(format!("# Removed stash marker {}", marker));
    Ok(true)
}

fn clear(sp: &Superproject, options: &StashOptions) -> Result<StashReport> {
    let ctx = sp.ctx();
    let mut args = vec!["stash".to_string(), "clear".to_string()];
    args.extend(options.options.iter().cloned());

    ctx.banner(".", false);
    sp.root().git(args.clone()).run()?;

    let mut report = StashReport::default();
    for sub in sp.submodules()? {
        if !sub.repo().has_git_dir() {
            continue;
        }
        ctx.banner(sub.rel_path(), true);
        match sub.repo().git(args.clone()).run() {
            Ok(_) => report.submodules.push(sub.rel_path().to_string()),
            Err(e) => report_failure(ctx, sub, &e),
        }
        ctx.discard();
    }
    Ok(report)
}
