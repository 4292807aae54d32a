//! A submodule: a nested repository plus what the superproject declares
//! about it.
//!
//! Methods that need the root (the recorded commit lives in the root's index)
//! take the root handle as a parameter instead of holding a back-reference.

use std::path::Path;
use std::rc::Rc;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::git::{self, Id};
use crate::repository::Repository;

/// What `git submodule status` says about one submodule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedStatus {
    /// Leading status character: `' '`, `'+'`, `'-'` or `'U'`.
    pub flag: char,
    /// Commit recorded in the root's index.
    pub hash: String,
    pub path: String,
}

impl RecordedStatus {
    /// Parse one `<flag><hash> <path> (<describe>)` line.
    pub fn parse(line: &str) -> Result<Self> {
        let malformed = || Error::GitOutput {
            command: "submodule status --cached".to_string(),
            output: line.to_string(),
        };
        let mut chars = line.chars();
        let flag = chars.next().ok_or_else(malformed)?;
        if !matches!(flag, ' ' | '+' | '-' | 'U') {
            return Err(malformed());
        }
        let rest = chars.as_str();
        let (hash, rest) = rest.split_once(' ').ok_or_else(malformed)?;
        if !git::is_hash(hash) {
            return Err(malformed());
        }
        let path = match rest.rfind(" (") {
            Some(i) if rest.ends_with(')') => &rest[..i],
            _ => rest,
        };
        if path.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            flag,
            hash: hash.to_string(),
            path: path.to_string(),
        })
    }
}

/// One declared submodule.
pub struct Submodule {
    name: String,
    rel_path: String,
    url: Option<String>,
    branch: String,
    remote: String,
    repo: Repository,
}

impl std::fmt::Debug for Submodule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submodule")
            .field("name", &self.name)
            .field("rel_path", &self.rel_path)
            .field("url", &self.url)
            .field("branch", &self.branch)
            .field("remote", &self.remote)
            .finish()
    }
}

impl Submodule {
    pub fn new(
        ctx: Rc<Context>,
        root: &Path,
        name: impl Into<String>,
        rel_path: impl Into<String>,
    ) -> Self {
        let rel_path = normalize_rel_path(&rel_path.into());
        let settings = ctx.settings();
        let branch = settings.default_branch.clone();
        let remote = settings.default_remote.clone();
        let repo = Repository::new(ctx, root.join(&rel_path));
        Self {
            name: name.into(),
            rel_path,
            url: None,
            branch,
            remote,
            repo,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Declaration name (`[submodule "<name>"]`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path relative to the root, without a trailing separator.
    pub fn rel_path(&self) -> &str {
        &self.rel_path
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn preferred_branch(&self) -> &str {
        &self.branch
    }

    pub fn preferred_remote(&self) -> &str {
        &self.remote
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// The root's view of this submodule, from `git submodule status --cached`.
    pub fn recorded_status(&self, root: &Repository) -> Result<RecordedStatus> {
        let stdout = root
            .git(["submodule", "status", "--cached", self.rel_path.as_str()])
            .stdout()?;
        let line = stdout
            .lines()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| Error::GitOutput {
                command: "submodule status --cached".to_string(),
                output: stdout.clone(),
            })?;
        RecordedStatus::parse(line)
    }

    /// Commit the root's index records for this submodule.
    pub fn recorded_commit(&self, root: &Repository) -> Result<Id> {
        Ok(Id::from_hash(self.recorded_status(root)?.hash))
    }

    /// Tip of the preferred branch in the submodule's own repository.
    pub fn head_of_preferred_branch(&self) -> Result<Id> {
        self.repo.head_of_branch(&self.branch)
    }

    /// Whether the recorded commit equals the tip of the preferred branch.
    ///
    /// Fails with [`Error::BranchNotFound`] when the preferred branch does
    /// not exist locally.
    pub fn is_at_head(&self, root: &Repository) -> Result<bool> {
        let recorded = self.recorded_commit(root)?;
        let tip = self.head_of_preferred_branch()?;
        log::debug!(
            "# {}: recorded {} vs {} tip {}",
            self.rel_path,
            recorded,
            self.branch,
            tip
        );
        Ok(recorded == tip)
    }

    /// [`Submodule::is_at_head`], with a missing preferred branch counting
    /// as "not at head".
    pub fn is_at_head_or_missing(&self, root: &Repository) -> Result<bool> {
        match self.is_at_head(root) {
            Ok(at_head) => Ok(at_head),
            Err(e) if e.is_branch_not_found() => {
                log::debug!("# {}: {}", self.rel_path, e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Bring the work tree to the commit recorded in the root's index.
    pub fn update(&self, root: &Repository) -> Result<()> {
        root.git(["submodule", "update", "--", self.rel_path.as_str()])
            .run()?;
        Ok(())
    }

    /// One-line logs of `from..to`, each prefixed with this submodule's path.
    pub fn log_lines(&self, from: &str, to: &str) -> Result<Vec<String>> {
        let stdout = self
            .repo
            .git([
                "log".to_string(),
                "--pretty=oneline".to_string(),
                format!("{}..{}", from, to),
            ])
            .stdout()?;
        Ok(stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| format!("{}: {}", self.rel_path, line))
            .collect())
    }
}

/// Strip `./` prefixes and trailing separators.
pub fn normalize_rel_path(path: &str) -> String {
    let mut path = path.trim();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path.trim_end_matches('/').to_string()
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

    #[test]
    fn test_parse_status_line() {
        let status =
            RecordedStatus::parse(&format!("+{} lib/foo (heads/master)", SHA_A)).unwrap();
        assert_eq!(status.flag, '+');
        assert_eq!(status.hash, SHA_A);
        assert_eq!(status.path, "lib/foo");

        let bare = RecordedStatus::parse(&format!("-{} lib", SHA_B)).unwrap();
        assert_eq!(bare.flag, '-');
        assert_eq!(bare.path, "lib");
    }

    #[test]
    fn test_parse_status_line_rejects_garbage() {
        assert!(RecordedStatus::parse("").is_err());
        assert!(RecordedStatus::parse(&format!("x{} lib", SHA_A)).is_err());
        assert!(RecordedStatus::parse(" nothex lib").is_err());
    }

    #[test]
    fn test_normalize_rel_path() {
        assert_eq!(normalize_rel_path("lib/"), "lib");
        assert_eq!(normalize_rel_path("./lib/a//"), "lib/a");
        assert_eq!(normalize_rel_path("lib"), "lib");
    }

    fn submodule_with_tip(tip: &str, recorded: &str) -> (TempDir, Submodule, Repository, ScriptedRunner) {
        let temp = TempDir::new().unwrap();
        let root_git = temp.path().join(".git");
        fs::create_dir_all(&root_git).unwrap();
        fs::write(root_git.join("HEAD"), "ref: refs/heads/master\n").unwrap();
        let lib_git = temp.path().join("lib/.git");
        fs::create_dir_all(lib_git.join("refs/heads")).unwrap();
        fs::write(lib_git.join("HEAD"), format!("{}\n", recorded)).unwrap();
        fs::write(lib_git.join("refs/heads/master"), format!("{}\n", tip)).unwrap();

        let runner = ScriptedRunner::default();
        runner.respond(
            "submodule status --cached lib",
            &format!(" {} lib (heads/master)\n", recorded),
            0,
        );
        let (ctx, _, _) = context(runner.clone());
        let root = Repository::new(ctx.clone(), temp.path());
        let sub = Submodule::new(ctx, temp.path(), "lib", "lib/");
        (temp, sub, root, runner)
    }

    #[test]
    #[serial]
    fn test_is_at_head_when_recorded_equals_tip() {
        let (_temp, sub, root, _) = submodule_with_tip(SHA_A, SHA_A);
        assert_eq!(sub.rel_path(), "lib");
        assert_eq!(sub.preferred_branch(), "master");
        assert!(sub.is_at_head(&root).unwrap());
    }

    #[test]
    fn test_debug_shows_declaration_only() {
        let (_temp, sub, _root, _) = submodule_with_tip(SHA_A, SHA_A);
        let shown = format!("{:?}", sub);
        assert!(shown.starts_with("Submodule {"));
        assert!(shown.contains("rel_path: \"lib\""));
        assert!(shown.contains("branch: \"master\""));
    }

    #[test]
    #[serial]
    fn test_not_at_head_when_tip_moved() {
        let (_temp, sub, root, _) = submodule_with_tip(SHA_B, SHA_A);
        assert!(!sub.is_at_head(&root).unwrap());
    }

    #[test]
    #[serial]
    fn test_missing_preferred_branch() {
        let (_temp, sub, root, runner) = submodule_with_tip(SHA_A, SHA_A);
        runner.respond("show-ref", "", 1);
        let sub = sub.with_branch("release");

        assert!(sub.is_at_head(&root).unwrap_err().is_branch_not_found());
        assert!(!sub.is_at_head_or_missing(&root).unwrap());
    }

    #[test]
    #[serial]
    fn test_log_lines_are_prefixed() {
        let (_temp, sub, _root, runner) = submodule_with_tip(SHA_A, SHA_A);
        runner.respond(
            "log --pretty=oneline",
            &format!("{} Second\n{} First\n", SHA_B, SHA_A),
            0,
        );
        assert_eq!(
            sub.log_lines(SHA_A, "HEAD").unwrap(),
            vec![
                format!("lib: {} Second", SHA_B),
                format!("lib: {} First", SHA_A)
            ]
        );
    }
}
