//! End-to-end tests running `groot` against real superprojects.
//!
//! These need a `git` binary on the path, so they only run with the
//! `integration-tests` feature.

mod common;
use common::prelude::*;

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_init_creates_superproject() {
    let temp = TempDir::new().unwrap();
    cargo_bin_cmd!("groot")
        .current_dir(temp.path())
        .env("NO_COLOR", "1")
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created .gitmodules"));
    temp.child(".git").assert(predicate::path::exists());
    temp.child(".gitmodules").assert("");
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_init_keeps_existing_gitmodules() {
    let fixture = TestFixture::new().with_submodule("lib");
    fixture
        .command()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Already a git repository"));
    let gitmodules = std::fs::read_to_string(fixture.root().join(".gitmodules")).unwrap();
    assert!(gitmodules.contains("[submodule \"lib\"]"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_info_shows_submodules() {
    let fixture = TestFixture::new()
        .with_submodule("lib")
        .with_submodule("vendor/zlib");
    fixture
        .command()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("(on master)"))
        .stdout(predicate::str::contains("lib (on master)"))
        .stdout(predicate::str::contains("vendor/zlib (on master)"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_root_found_from_inside_a_submodule() {
    let fixture = TestFixture::new().with_submodule("lib");
    // lib has no .gitmodules of its own, so the search goes up to the root.
    fixture
        .command()
        .current_dir(fixture.root().join("lib"))
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("lib (on master)"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_status_shows_only_dirty_submodules() {
    let fixture = TestFixture::new()
        .with_submodule("clean")
        .with_submodule("dirty");
    fixture.write("dirty/file.txt", "changed\n");

    fixture
        .command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("# ---[ dirty ]---"))
        .stdout(predicate::str::contains("file.txt"))
        .stdout(predicate::str::contains("# ---[ clean ]---").not());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_status_verbose_shows_clean_submodules() {
    let fixture = TestFixture::new().with_submodule("clean");
    fixture
        .command()
        .args(["status", "-v"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# ---[ clean ]---"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_in_runs_inside_submodule() {
    let fixture = TestFixture::new().with_submodule("lib");
    fixture
        .command()
        .args(["--in", "lib", "log", "--format=%s", "-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Upstream initial commit"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_in_unknown_submodule_fails() {
    let fixture = TestFixture::new().with_submodule("lib");
    fixture
        .command()
        .args(["in", "nope", "status"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nope"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_add_and_commit_advance_the_root() {
    let fixture = TestFixture::new().with_submodule("lib");
    fixture.write("lib/file.txt", "changed\n");

    fixture
        .command()
        .args(["add", "lib/file.txt"])
        .assert()
        .success();
    fixture
        .command()
        .args(["commit", "-m", "Change lib"])
        .assert()
        .success();

    let lib = fixture.root().join("lib");
    assert_eq!(git_stdout(&lib, &["log", "-1", "--format=%s"]), "Change lib");
    assert_eq!(
        git_stdout(&fixture.root(), &["log", "-1", "--format=%s"]),
        "Change lib"
    );
    assert_eq!(git_stdout(&fixture.root(), &["status", "--porcelain"]), "");
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_start_creates_branch_everywhere() {
    let fixture = TestFixture::new()
        .with_submodule("a")
        .with_submodule("b");

    fixture
        .command()
        .args(["start", "topic"])
        .assert()
        .success();

    for dir in [fixture.root(), fixture.root().join("a"), fixture.root().join("b")] {
        assert_eq!(git_stdout(&dir, &["rev-parse", "--abbrev-ref", "HEAD"]), "topic");
    }
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_checkout_moves_detached_submodule_onto_branch() {
    let fixture = TestFixture::new().with_submodule("lib");
    let lib = fixture.root().join("lib");
    git(&lib, &["checkout", "--quiet", "--detach"]);

    fixture.command().arg("checkout").assert().success();

    assert_eq!(git_stdout(&lib, &["rev-parse", "--abbrev-ref", "HEAD"]), "master");
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_stash_save_and_pop_follow_the_tag() {
    let fixture = TestFixture::new().with_submodule("lib");
    fixture.write("README.md", "changed root\n");
    fixture.write("lib/file.txt", "changed lib\n");

    fixture.command().args(["stash", "save"]).assert().success();

    let lib = fixture.root().join("lib");
    assert_eq!(git_stdout(&lib, &["status", "--porcelain"]), "");
    assert!(git_stdout(&lib, &["stash", "list"]).contains("[groot-"));
    assert!(git_stdout(&fixture.root(), &["stash", "list"]).contains("[groot-"));

    fixture.command().args(["stash", "pop"]).assert().success();

    assert_eq!(
        std::fs::read_to_string(lib.join("file.txt")).unwrap(),
        "changed lib\n"
    );
    assert_eq!(
        std::fs::read_to_string(fixture.root().join("README.md")).unwrap(),
        "changed root\n"
    );
    assert_eq!(git_stdout(&lib, &["stash", "list"]), "");
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_stash_with_clean_root_uses_marker() {
    let fixture = TestFixture::new().with_submodule("lib");
    fixture.write("lib/file.txt", "changed lib\n");

    fixture.command().args(["stash", "save"]).assert().success();
    assert!(git_stdout(&fixture.root(), &["stash", "list"]).contains("[groot-"));

    fixture.command().args(["stash", "pop"]).assert().success();
    assert_eq!(
        git_stdout(
            &fixture.root(),
            &["status", "--porcelain", "--ignore-submodules=dirty"]
        ),
        ""
    );
    let leftovers: Vec<_> = std::fs::read_dir(fixture.root())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(".groot-stash-"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_pull_refuses_dirty_tree() {
    let fixture = TestFixture::new().with_submodule("lib");
    fixture.write("lib/file.txt", "changed\n");

    fixture
        .command()
        .arg("pull")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not clean"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_pull_records_advanced_submodule_in_root() {
    let fixture = TestFixture::new()
        .with_submodule("lib")
        .with_root_remote();
    let new_tip = fixture.commit_upstream("lib", "upstream change\n", "Upstream change");

    fixture.command().arg("pull").assert().success();

    let lib = fixture.root().join("lib");
    assert_eq!(git_stdout(&lib, &["rev-parse", "HEAD"]), new_tip);
    assert_eq!(
        git_stdout(&fixture.root(), &["log", "-1", "--format=%s"]),
        format!("lib: {} Upstream change", new_tip)
    );
    assert_eq!(git_stdout(&fixture.root(), &["status", "--porcelain"]), "");
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_pull_no_commit_leaves_pointer_unstaged() {
    let fixture = TestFixture::new()
        .with_submodule("lib")
        .with_root_remote();
    fixture.commit_upstream("lib", "upstream change\n", "Upstream change");

    fixture
        .command()
        .args(["pull", "--no-commit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Advanced but not committed: lib"));

    assert_eq!(
        git_stdout(&fixture.root(), &["log", "-1", "--format=%s"]),
        "Add lib"
    );
}
