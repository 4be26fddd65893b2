//! Fetch tests against a local git repository: the clone path,
//! the update-in-place reuse path, and branch switching.

use std::fs;
use std::path::Path;
use std::process::Command;

use trabuco::source::{Fetcher, GitFetcher, authenticated_url, workdir_name};
use trabuco::DeployConfig;

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .status()
        .expect("git available");
    assert!(status.success(), "git {args:?} failed");
}

/// Create a repo with one commit on `main` and a `feature`
/// branch with a second commit.
fn seed_repo(dir: &Path) {
    let status = Command::new("git")
        .args(["init", "-q", "-b", "main"])
        .arg(dir)
        .status()
        .expect("git available");
    assert!(status.success());

    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "user.name", "Test"]);

    fs::write(dir.join("Dockerfile"), "FROM alpine\n").unwrap();
    git(dir, &["add", "."]);
    git(dir, &["commit", "-q", "-m", "initial"]);

    git(dir, &["checkout", "-q", "-b", "feature"]);
    fs::write(dir.join("FEATURE"), "yes\n").unwrap();
    git(dir, &["add", "."]);
    git(dir, &["commit", "-q", "-m", "feature work"]);
    git(dir, &["checkout", "-q", "main"]);
}

fn head_branch(dir: &Path) -> String {
    let out = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .output()
        .unwrap();
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

fn config_for(repo: &Path, branch: &str) -> DeployConfig {
    DeployConfig::new(repo.to_str().unwrap(), "unused-token")
        .branch(branch)
        .remote("deploy", "203.0.113.7")
        .key_path("/tmp/unused")
}

#[test]
fn clone_then_reuse_in_place() {
    let root = tempfile::tempdir().unwrap();
    let upstream = root.path().join("shop.git");
    fs::create_dir(&upstream).unwrap();
    seed_repo(&upstream);

    let base = root.path().join("work");
    fs::create_dir(&base).unwrap();
    let fetcher = GitFetcher::new().base_dir(&base);

    // Fresh clone.
    let config = config_for(&upstream, "main");
    let first = fetcher.fetch(&config).unwrap();
    assert!(first.path().join(".git").is_dir());
    assert!(first.path().join("Dockerfile").is_file());
    assert_eq!(head_branch(first.path()), "main");

    // New upstream commit, then fetch again: the checkout is
    // updated in place, not re-cloned.
    fs::write(upstream.join("NEW"), "v2\n").unwrap();
    git(&upstream, &["add", "."]);
    git(&upstream, &["commit", "-q", "-m", "second"]);

    let second = fetcher.fetch(&config).unwrap();
    assert_eq!(second.path(), first.path());
    assert!(second.path().join("NEW").is_file());
    assert_eq!(head_branch(second.path()), "main");
}

#[test]
fn reuse_after_branch_change_deploys_the_new_branch_tip() {
    let root = tempfile::tempdir().unwrap();
    let upstream = root.path().join("shop.git");
    fs::create_dir(&upstream).unwrap();
    seed_repo(&upstream);

    let base = root.path().join("work");
    fs::create_dir(&base).unwrap();
    let fetcher = GitFetcher::new().base_dir(&base);

    // First run deploys `main`.
    let first = fetcher.fetch(&config_for(&upstream, "main")).unwrap();
    assert_eq!(head_branch(first.path()), "main");

    // Upstream `feature` moves on while the checkout sits on main.
    git(&upstream, &["checkout", "-q", "feature"]);
    fs::write(upstream.join("FEATURE"), "v2\n").unwrap();
    git(&upstream, &["add", "."]);
    git(&upstream, &["commit", "-q", "-m", "feature v2"]);
    git(&upstream, &["checkout", "-q", "main"]);

    // Second run targets `feature`: the reused checkout must land
    // on that branch at its current tip, not on a stale local copy
    // and not merged into main.
    let second = fetcher.fetch(&config_for(&upstream, "feature")).unwrap();
    assert_eq!(second.path(), first.path());
    assert_eq!(head_branch(second.path()), "feature");
    let content = fs::read_to_string(second.path().join("FEATURE")).unwrap();
    assert_eq!(content, "v2\n");
}

#[test]
fn switches_to_requested_branch() {
    let root = tempfile::tempdir().unwrap();
    let upstream = root.path().join("shop.git");
    fs::create_dir(&upstream).unwrap();
    seed_repo(&upstream);

    let base = root.path().join("work");
    fs::create_dir(&base).unwrap();
    let fetcher = GitFetcher::new().base_dir(&base);

    let config = config_for(&upstream, "feature");
    let workdir = fetcher.fetch(&config).unwrap();

    assert_eq!(head_branch(workdir.path()), "feature");
    assert!(workdir.path().join("FEATURE").is_file());
}

#[test]
fn missing_branch_is_a_fetch_error() {
    let root = tempfile::tempdir().unwrap();
    let upstream = root.path().join("shop.git");
    fs::create_dir(&upstream).unwrap();
    seed_repo(&upstream);

    let base = root.path().join("work");
    fs::create_dir(&base).unwrap();
    let fetcher = GitFetcher::new().base_dir(&base);

    let config = config_for(&upstream, "does-not-exist");
    let err = fetcher.fetch(&config).unwrap_err();
    assert!(err.to_string().starts_with("source fetch failed"));
}

#[test]
fn workdir_name_strips_git_suffix() {
    assert_eq!(workdir_name("https://host/org/app.git"), "app");
}

#[test]
fn authenticated_url_carries_the_token() {
    assert_eq!(
        authenticated_url("https://host/org/app.git", "t0k"),
        "https://t0k@host/org/app.git"
    );
}
