//! # Repository Handles
//!
//! A [`Repository`] wraps one git work tree: the root of the superproject or
//! one of its submodules. It answers questions about the repository's state
//! and runs git commands inside it.
//!
//! ## Where answers come from
//!
//! Branch questions that are asked for every submodule, often several times
//! per command, are answered from disk without spawning git:
//!
//! - [`Repository::head`] and [`Repository::current_branch`] read the `HEAD`
//!   file of the control directory.
//! - [`Repository::branch_exists`] and [`Repository::head_of_branch`] read the
//!   loose ref file and fall back to a cached `git show-ref` listing, which
//!   also covers `packed-refs`.
//!
//! Everything else runs git through [`GitCall`], which applies the run's
//! process-runner strategy, records the last command and drops the ref
//! listing cache, since any command may have moved a ref.
//!
//! ## Control directory
//!
//! The control directory is resolved once, when the handle is created:
//! `.git` may be a directory or a `gitdir: <path>` file (the layout git uses
//! for submodules). A handle whose control directory cannot be found is still
//! valid; it can run commands such as `git clone` or `git init`, and the
//! state queries report a structural error.

use std::cell::{OnceCell, Ref, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::context::Context;
use crate::defaults;
use crate::error::{Error, Result};
use crate::git::{self, GitConfig, Id};
use crate::process::{self, Capture, CommandOutput, Invocation, Mode};

/// The last command a handle ran and what it returned.
#[derive(Debug, Clone)]
pub struct LastCommand {
    pub argv: Vec<String>,
    pub output: CommandOutput,
}

/// Options for [`Repository::checkout`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutArgs {
    /// Create the branch (`-b`).
    pub new_branch: bool,
    /// Set up tracking (`--track`).
    pub track: bool,
    /// Throw away local changes (`--force`).
    pub force: bool,
    /// Start point for a new branch.
    pub start_point: Option<String>,
    /// Restrict the checkout to these paths.
    pub paths: Vec<String>,
}

impl CheckoutArgs {
    /// Argument list for `git checkout <target>`.
    pub fn to_args(&self, target: &str) -> Vec<String> {
        let mut args = vec!["checkout".to_string()];
        if self.track {
            args.push("--track".to_string());
        }
        if self.force {
            args.push("--force".to_string());
        }
        if self.new_branch {
            args.push("-b".to_string());
        }
        args.push(target.to_string());
        if let Some(start) = &self.start_point {
            args.push(start.clone());
        }
        args.push("--".to_string());
        args.extend(self.paths.iter().cloned());
        args
    }
}

/// A handle on one git work tree.
pub struct Repository {
    ctx: Rc<Context>,
    work_tree: PathBuf,
    git_dir: Option<PathBuf>,
    config: OnceCell<GitConfig>,
    refs: RefCell<Option<Vec<Id>>>,
    last: RefCell<Option<LastCommand>>,
}

impl Repository {
    pub fn new(ctx: Rc<Context>, work_tree: impl Into<PathBuf>) -> Self {
        let work_tree = work_tree.into();
        let git_dir = resolve_git_dir(&work_tree);
        Self {
            ctx,
            work_tree,
            git_dir,
            config: OnceCell::new(),
            refs: RefCell::new(None),
            last: RefCell::new(None),
        }
    }

    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    /// Whether the work tree directory exists at all.
    pub fn exists(&self) -> bool {
        self.work_tree.is_dir()
    }

    pub fn has_git_dir(&self) -> bool {
        self.git_dir.is_some()
    }

    pub fn git_dir(&self) -> Result<&Path> {
        self.git_dir.as_deref().ok_or_else(|| Error::Structure {
            message: format!(
                "no git control directory for {}",
                self.work_tree.display()
            ),
        })
    }

    /// The repository's own `config`, parsed on first use.
    pub fn config(&self) -> Result<&GitConfig> {
        if let Some(config) = self.config.get() {
            return Ok(config);
        }
        let path = self.git_dir()?.join("config");
        let config = if path.is_file() {
            GitConfig::from_file(&path)?
        } else {
            GitConfig::default()
        };
        Ok(self.config.get_or_init(|| config))
    }

    /// Start building a git command run in this work tree.
    pub fn git<I, S>(&self, args: I) -> GitCall<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = vec!["git".to_string()];
        argv.extend(args.into_iter().map(Into::into));
        GitCall {
            repo: self,
            invocation: Invocation::new(argv).in_dir(self.work_tree.clone()),
        }
    }

    pub fn last_command(&self) -> Option<Ref<'_, LastCommand>> {
        Ref::filter_map(self.last.borrow(), Option::as_ref).ok()
    }

    /// What `HEAD` points at, read from disk.
    pub fn head(&self) -> Result<Id> {
        let path = self.git_dir()?.join("HEAD");
        let contents = fs::read_to_string(&path).map_err(|e| Error::Structure {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Id::parse_head(&contents)
    }

    /// Short name of the checked-out branch, `None` when detached.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let head = self.head()?;
        Ok(head.is_branch().then(|| head.name().to_string()))
    }

    pub fn is_detached(&self) -> Result<bool> {
        Ok(!self.head()?.is_ref())
    }

    /// The cached `git show-ref` listing.
    pub fn refs(&self) -> Result<Ref<'_, [Id]>> {
        if self.refs.borrow().is_none() {
            let output = self
                .git(["show-ref"])
                .capture()
                .accept(&[0, 1])
                .run_keeping_refs()?;
            let refs = output
                .stdout
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(Id::parse_ref_line)
                .collect::<Result<Vec<_>>>()?;
            *self.refs.borrow_mut() = Some(refs);
        }
        Ok(Ref::map(self.refs.borrow(), |refs| {
            refs.as_deref().unwrap_or(&[])
        }))
    }

    fn find_ref(&self, wanted: &Id) -> Result<Option<Id>> {
        Ok(self.refs()?.iter().find(|id| *id == wanted).cloned())
    }

    fn read_loose_ref(&self, refname: &str) -> Result<Option<Id>> {
        let path = self.git_dir()?.join(refname);
        if !path.is_file() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        let contents = contents.trim();
        let hash = Id::parse_head(contents)?;
        Ok(Some(Id::from_refname(
            refname,
            hash.hash().map(str::to_string),
        )))
    }

    /// Whether a local branch exists, loose or packed.
    pub fn branch_exists(&self, name: &str) -> Result<bool> {
        let wanted = Id::branch(name);
        if self.read_loose_ref(&wanted.full_name())?.is_some() {
            return Ok(true);
        }
        Ok(self.find_ref(&wanted)?.is_some())
    }

    /// Tip commit of a local branch.
    ///
    /// Fails with [`Error::BranchNotFound`] when the branch does not exist.
    pub fn head_of_branch(&self, name: &str) -> Result<Id> {
        let wanted = Id::branch(name);
        let found = match self.read_loose_ref(&wanted.full_name())? {
            Some(id) => Some(id),
            None => self.find_ref(&wanted)?,
        };
        found
            .and_then(|id| id.hash().map(Id::from_hash))
            .ok_or_else(|| Error::BranchNotFound {
                branch: name.to_string(),
            })
    }

    /// Tip of a remote-tracking branch, if there is one.
    pub fn remote_branch_tip(&self, remote: &str, branch: &str) -> Result<Option<Id>> {
        let wanted = Id::from_refname(&format!("refs/remotes/{}/{}", remote, branch), None);
        let found = match self.read_loose_ref(&wanted.full_name())? {
            Some(id) => Some(id),
            None => self.find_ref(&wanted)?,
        };
        Ok(found.and_then(|id| id.hash().map(Id::from_hash)))
    }

    /// Full hash of the checked-out commit.
    pub fn head_commit(&self) -> Result<String> {
        let stdout = self.git(["rev-parse", "HEAD"]).stdout()?;
        Ok(stdout.trim().to_string())
    }

    /// Whether `rev` names a commit in this repository.
    pub fn rev_exists(&self, rev: &str) -> Result<bool> {
        let output = self
            .git([
                "rev-parse".to_string(),
                "--verify".to_string(),
                "--quiet".to_string(),
                format!("{}^{{commit}}", rev),
            ])
            .capture()
            .accept(&[0, 1, 128])
            .run()?;
        Ok(output.success())
    }

    /// No staged changes relative to `HEAD`.
    pub fn is_index_clean(&self) -> Result<bool> {
        let output = self
            .git(["diff-index", "--cached", "--quiet", "HEAD", "--"])
            .accept(&[0, 1])
            .run()?;
        Ok(output.success())
    }

    /// No unstaged changes in the work tree.
    pub fn is_worktree_clean(&self, ignore_submodules: bool) -> Result<bool> {
        let mut args = vec!["diff-files", "--quiet"];
        if ignore_submodules {
            args.push("--ignore-submodules");
        }
        let output = self.git(args).accept(&[0, 1]).run()?;
        Ok(output.success())
    }

    /// Clean index and clean work tree.
    ///
    /// With `ignore_submodules`, changes inside nested repositories do not
    /// count, which is what a root-only precondition wants.
    pub fn is_clean(&self, ignore_submodules: bool) -> Result<bool> {
        if ignore_submodules {
            let output = self
                .git([
                    "diff-index",
                    "--cached",
                    "--quiet",
                    "--ignore-submodules",
                    "HEAD",
                    "--",
                ])
                .accept(&[0, 1])
                .run()?;
            if !output.success() {
                return Ok(false);
            }
        } else if !self.is_index_clean()? {
            return Ok(false);
        }
        self.is_worktree_clean(ignore_submodules)
    }

    /// Configured upstream of `branch` as `(remote, remote branch)`.
    pub fn upstream(&self, branch: &str) -> Result<Option<(String, String)>> {
        let config = self.config()?;
        let remote = config.get(&["branch", branch], "remote");
        let merge = config.get(&["branch", branch], "merge");
        Ok(match (remote, merge) {
            (Some(remote), Some(merge)) => Some((
                remote.to_string(),
                merge.strip_prefix("refs/heads/").unwrap_or(merge).to_string(),
            )),
            _ => None,
        })
    }

    /// `(short hash, subject)` of the checked-out commit.
    pub fn head_summary(&self) -> Result<(String, String)> {
        let stdout = self.git(["log", "--pretty=oneline", "-1", "HEAD"]).stdout()?;
        let line = stdout.trim();
        let (hash, subject) = line.split_once(' ').unwrap_or((line, ""));
        if !git::is_hash(hash) {
            return Err(Error::GitOutput {
                command: "log --pretty=oneline -1 HEAD".to_string(),
                output: stdout,
            });
        }
        Ok((
            git::short_hash(hash).to_string(),
            subject.to_string(),
        ))
    }

    /// `git checkout` with the given options.
    pub fn checkout(&self, target: &str, args: &CheckoutArgs) -> Result<()> {
        self.git(args.to_args(target)).run()?;
        Ok(())
    }

    fn record(&self, argv: &[String], output: &CommandOutput) {
        *self.last.borrow_mut() = Some(LastCommand {
            argv: argv.to_vec(),
            output: output.clone(),
        });
    }

    fn invalidate_refs(&self) {
        self.refs.borrow_mut().take();
    }
}

/// Builder for one git command in a [`Repository`].
pub struct GitCall<'r> {
    repo: &'r Repository,
    invocation: Invocation,
}

impl GitCall<'_> {
    /// Capture stdout instead of letting it through.
    pub fn capture(mut self) -> Self {
        self.invocation.capture = Capture::Stdout;
        self
    }

    /// Capture stdout and stderr.
    pub fn capture_all(mut self) -> Self {
        self.invocation.capture = Capture::All;
        self
    }

    /// Run on a pseudo-terminal when one is available.
    pub fn interactive(mut self) -> Self {
        self.invocation.mode = Mode::Interactive;
        self
    }

    /// Exit codes treated as success.
    pub fn accept(mut self, codes: &[i32]) -> Self {
        self.invocation.accept = codes.to_vec();
        self
    }

    pub fn run(self) -> Result<CommandOutput> {
        let repo = self.repo;
        repo.invalidate_refs();
        self.run_keeping_refs()
    }

    fn run_keeping_refs(self) -> Result<CommandOutput> {
        let output = self.repo.ctx.spawn(&self.invocation)?;
        self.repo.record(&self.invocation.argv, &output);
        process::check_status(&self.invocation, output)
    }

    /// Run with stdout captured and return it.
    pub fn stdout(self) -> Result<String> {
        Ok(self.capture().run()?.stdout)
    }
}

/// Find the control directory of `work_tree`.
fn resolve_git_dir(work_tree: &Path) -> Option<PathBuf> {
    let dot_git = work_tree.join(defaults::GIT_DIR_NAME);
    if dot_git.is_dir() {
        return Some(dot_git);
    }
    if dot_git.is_file() {
        let contents = fs::read_to_string(&dot_git).ok()?;
        let target = contents.trim().strip_prefix("gitdir:")?.trim();
        let target = work_tree.join(target);
        return target.is_dir().then_some(target);
    }
    // A bare repository is its own control directory.
    if work_tree.join("HEAD").is_file() && work_tree.join("objects").is_dir() {
        return Some(work_tree.to_path_buf());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{context, ScriptedRunner};
    use serial_test::serial;
    use tempfile::TempDir;

    const SHA_A: &str = "1111111111111111111111111111111111111111";
    const SHA_B: &str = "2222222222222222222222222222222222222222";

    fn fake_repo(head: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let git = temp.path().join(".git");
        fs::create_dir_all(git.join("refs/heads")).unwrap();
        fs::write(git.join("HEAD"), head).unwrap();
        temp
    }

    #[test]
    #[serial]
    fn test_current_branch_from_head_file() {
        let temp = fake_repo("ref: refs/heads/dev\n");
        let (ctx, _, _) = context(ScriptedRunner::default());
        let repo = Repository::new(ctx, temp.path());

        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("dev"));
        assert!(!repo.is_detached().unwrap());
    }

    #[test]
    #[serial]
    fn test_detached_head() {
        let temp = fake_repo(&format!("{}\n", SHA_A));
        let (ctx, _, _) = context(ScriptedRunner::default());
        let repo = Repository::new(ctx, temp.path());

        assert_eq!(repo.current_branch().unwrap(), None);
        assert!(repo.is_detached().unwrap());
    }

    #[test]
    #[serial]
    fn test_gitdir_file_is_followed() {
        let temp = TempDir::new().unwrap();
        let real = temp.path().join("modules/lib");
        fs::create_dir_all(&real).unwrap();
        fs::write(real.join("HEAD"), "ref: refs/heads/master\n").unwrap();
        let work = temp.path().join("lib");
        fs::create_dir_all(&work).unwrap();
        fs::write(work.join(".git"), "gitdir: ../modules/lib\n").unwrap();

        let (ctx, _, _) = context(ScriptedRunner::default());
        let repo = Repository::new(ctx, &work);
        assert!(repo.has_git_dir());
        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("master"));
    }

    #[test]
    #[serial]
    fn test_missing_git_dir_is_structural() {
        let temp = TempDir::new().unwrap();
        let (ctx, _, _) = context(ScriptedRunner::default());
        let repo = Repository::new(ctx, temp.path());

        assert!(!repo.has_git_dir());
        assert!(matches!(repo.head(), Err(Error::Structure { .. })));
    }

    #[test]
    #[serial]
    fn test_loose_branch_lookup_spawns_nothing() {
        let temp = fake_repo("ref: refs/heads/master\n");
        fs::write(temp.path().join(".git/refs/heads/master"), SHA_A).unwrap();
        let runner = ScriptedRunner::default();
        let (ctx, _, _) = context(runner.clone());
        let repo = Repository::new(ctx, temp.path());

        assert!(repo.branch_exists("master").unwrap());
        assert_eq!(repo.head_of_branch("master").unwrap(), Id::from_hash(SHA_A));
        assert!(runner.commands().is_empty());
    }

    #[test]
    #[serial]
    fn test_packed_branch_falls_back_to_listing_once() {
        let temp = fake_repo("ref: refs/heads/master\n");
        let runner = ScriptedRunner::default();
        runner.respond(
            "show-ref",
            &format!(
                "{} refs/heads/packed\n{} refs/remotes/origin/dev\n",
                SHA_A, SHA_B
            ),
            0,
        );
        let (ctx, _, _) = context(runner.clone());
        let repo = Repository::new(ctx, temp.path());

        assert_eq!(repo.head_of_branch("packed").unwrap(), Id::from_hash(SHA_A));
        assert_eq!(
            repo.remote_branch_tip("origin", "dev").unwrap(),
            Some(Id::from_hash(SHA_B))
        );
        assert!(repo.branch_exists("packed").unwrap());
        assert_eq!(runner.commands(), vec!["show-ref"]);
    }

    #[test]
    #[serial]
    fn test_missing_branch_is_catchable() {
        let temp = fake_repo("ref: refs/heads/master\n");
        let runner = ScriptedRunner::default();
        runner.respond("show-ref", "", 1);
        let (ctx, _, _) = context(runner);
        let repo = Repository::new(ctx, temp.path());

        let err = repo.head_of_branch("nope").unwrap_err();
        assert!(err.is_branch_not_found());
        assert!(!repo.branch_exists("nope").unwrap());
    }

    #[test]
    #[serial]
    fn test_mutating_command_drops_ref_cache() {
        let temp = fake_repo("ref: refs/heads/master\n");
        let runner = ScriptedRunner::default();
        runner.respond("show-ref", "", 1);
        let (ctx, _, _) = context(runner.clone());
        let repo = Repository::new(ctx, temp.path());

        assert!(!repo.branch_exists("x").unwrap());
        repo.git(["branch", "x"]).run().unwrap();
        assert!(!repo.branch_exists("x").unwrap());
        assert_eq!(runner.commands(), vec!["show-ref", "branch x", "show-ref"]);
    }

    #[test]
    #[serial]
    fn test_last_command_is_recorded_on_failure() {
        let temp = fake_repo("ref: refs/heads/master\n");
        let runner = ScriptedRunner::default();
        runner.respond("pull", "", 1);
        let (ctx, _, _) = context(runner);
        let repo = Repository::new(ctx, temp.path());

        assert!(repo.git(["pull"]).run().is_err());
        let last = repo.last_command().unwrap();
        assert_eq!(last.argv, vec!["git", "pull"]);
        assert_eq!(last.output.code, Some(1));
    }

    #[test]
    #[serial]
    fn test_upstream_from_config() {
        let temp = fake_repo("ref: refs/heads/master\n");
        fs::write(
            temp.path().join(".git/config"),
            "[branch \"master\"]\n\tremote = origin\n\tmerge = refs/heads/main\n",
        )
        .unwrap();
        let (ctx, _, _) = context(ScriptedRunner::default());
        let repo = Repository::new(ctx, temp.path());

        assert_eq!(
            repo.upstream("master").unwrap(),
            Some(("origin".to_string(), "main".to_string()))
        );
        assert_eq!(repo.upstream("dev").unwrap(), None);
    }

    #[test]
    #[serial]
    fn test_checkout_args_layout() {
        let args = CheckoutArgs {
            new_branch: true,
            track: true,
            start_point: Some("origin/dev".to_string()),
            ..Default::default()
        };
        assert_eq!(
            args.to_args("dev"),
            vec!["checkout", "--track", "-b", "dev", "origin/dev", "--"]
        );

        let args = CheckoutArgs {
            force: true,
            paths: vec!["a.txt".to_string()],
            ..Default::default()
        };
        assert_eq!(
            args.to_args("master"),
            vec!["checkout", "--force", "master", "--", "a.txt"]
        );
    }
}
