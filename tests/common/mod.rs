//! Shared test utilities for E2E tests.
//!
//! Fixtures build real superprojects with the system `git`: an upstream
//! repository per submodule, a superproject that declares them, and helpers
//! to run `groot` inside the result.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new().with_submodule("lib");
//! fixture.command().arg("status").assert().success();
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{git, git_stdout, TestFixture};
}

/// Environment that makes commits reproducible and independent of the
/// user's git configuration.
const GIT_ENV: [(&str, &str); 6] = [
    ("GIT_AUTHOR_NAME", "Groot Test"),
    ("GIT_AUTHOR_EMAIL", "groot@example.com"),
    ("GIT_COMMITTER_NAME", "Groot Test"),
    ("GIT_COMMITTER_EMAIL", "groot@example.com"),
    ("GIT_CONFIG_NOSYSTEM", "1"),
    ("GIT_TERMINAL_PROMPT", "0"),
];

fn git_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(dir)
        .args(["-c", "init.defaultBranch=master", "-c", "protocol.file.allow=always"])
        .args(args)
        .envs(GIT_ENV);
    cmd
}

/// Run git in `dir`, panicking when it fails.
pub fn git(dir: &Path, args: &[&str]) {
    let output = git_command(dir, args)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed in {}: {}",
        args,
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Run git in `dir` and return its trimmed stdout.
pub fn git_stdout(dir: &Path, args: &[&str]) -> String {
    let output = git_command(dir, args)
        .output()
        .expect("Failed to run git");
    assert!(output.status.success(), "git {:?} failed", args);
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A temporary directory holding upstream repositories and a superproject
/// named `super` that uses them as submodules.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create an empty superproject with one initial commit.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        let fixture = Self { temp_dir };
        let root = fixture.root();
        std::fs::create_dir_all(&root).expect("Failed to create superproject");
        git(&root, &["init", "--quiet"]);
        fixture.write(".gitmodules", "");
        fixture.write("README.md", "superproject\n");
        git(&root, &["add", "."]);
        git(&root, &["commit", "--quiet", "-m", "Initial commit"]);
        fixture
    }

    /// Create an upstream repository and add it to the superproject at
    /// `rel_path`, checked out on its `master` branch.
    pub fn with_submodule(self, rel_path: &str) -> Self {
        let upstream = self.upstream(rel_path);
        std::fs::create_dir_all(&upstream).expect("Failed to create upstream");
        git(&upstream, &["init", "--quiet"]);
        std::fs::write(upstream.join("file.txt"), format!("{}\n", rel_path))
            .expect("Failed to write upstream file");
        git(&upstream, &["add", "."]);
        git(&upstream, &["commit", "--quiet", "-m", "Upstream initial commit"]);

        let url = upstream.to_string_lossy().to_string();
        let root = self.root();
        git(&root, &["submodule", "--quiet", "add", "-b", "master", &url, rel_path]);
        git(&root, &["commit", "--quiet", "-m", &format!("Add {}", rel_path)]);
        git(&root.join(rel_path), &["checkout", "--quiet", "master"]);
        self
    }

    /// Give the superproject a bare `origin` that its `master` tracks.
    pub fn with_root_remote(self) -> Self {
        let bare = self.temp_dir.path().join("upstream/super.git");
        std::fs::create_dir_all(&bare).expect("Failed to create bare remote");
        git(&bare, &["init", "--quiet", "--bare"]);
        let root = self.root();
        git(&root, &["remote", "add", "origin", &bare.to_string_lossy()]);
        git(&root, &["push", "--quiet", "-u", "origin", "master"]);
        self
    }

    /// Commit a change to `file.txt` in a submodule's upstream repository.
    #[allow(dead_code)]
    pub fn commit_upstream(&self, rel_path: &str, content: &str, message: &str) -> String {
        let upstream = self.upstream(rel_path);
        std::fs::write(upstream.join("file.txt"), content).expect("Failed to write upstream file");
        git(&upstream, &["commit", "--quiet", "-am", message]);
        git_stdout(&upstream, &["rev-parse", "HEAD"])
    }

    /// Path of the superproject.
    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().join("super")
    }

    /// Path of the upstream repository for a submodule.
    pub fn upstream(&self, rel_path: &str) -> PathBuf {
        self.temp_dir
            .path()
            .join("upstream")
            .join(rel_path.replace('/', "_"))
    }

    /// Write a file relative to the superproject root.
    pub fn write(&self, rel_path: &str, content: &str) {
        self.temp_dir
            .child("super")
            .child(rel_path)
            .write_str(content)
            .expect("Failed to write file");
    }

    /// Get the path to the temporary directory.
    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a `groot` command running in the superproject with colors off.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("groot");
        cmd.current_dir(self.root())
            .env("NO_COLOR", "1")
            .env_remove("GROOT_ROOT")
            .envs(GIT_ENV);
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
