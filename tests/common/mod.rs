// tests/common/mod.rs
//
// Shared test helpers. Imported via `mod common;` in integration test files.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Scratch project for one test: a docs tree, a config and usually a git
/// repository. Removed by `.pass()`; a panicking test leaves it behind under
/// `git-authors-test-*` in the temp dir so the repo can be inspected.
pub struct TestDir {
    path: PathBuf,
}

impl TestDir {
    pub fn new() -> Self {
        let dir = tempfile::Builder::new()
            .prefix("git-authors-test-")
            .tempdir()
            .unwrap();
        let path = dir.keep();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last line of a passing test.
    pub fn pass(self) {
        fs::remove_dir_all(&self.path).ok();
    }
}

/// Run git in `dir`, isolated from the user's and system git config.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("HOME", dir)
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

pub fn init_repo(dir: &Path) {
    git(dir, &["init", "-q"]);
    git(dir, &["config", "user.email", "test@test.com"]);
    git(dir, &["config", "user.name", "Test"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

/// Stage everything and commit as the given author. `date` is any format
/// git accepts, e.g. `2024-01-01T12:00:00Z`. Returns the new commit hash.
pub fn commit_as(dir: &Path, msg: &str, name: &str, email: &str, date: &str) -> String {
    git(dir, &["add", "-A"]);
    let out = Command::new("git")
        .args(["commit", "-q", "-m", msg])
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("HOME", dir)
        .env("GIT_AUTHOR_NAME", name)
        .env("GIT_AUTHOR_EMAIL", email)
        .env("GIT_AUTHOR_DATE", date)
        .env("GIT_COMMITTER_NAME", name)
        .env("GIT_COMMITTER_EMAIL", email)
        .env("GIT_COMMITTER_DATE", date)
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "git commit failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    git(dir, &["rev-parse", "HEAD"])
}

/// Path of a fixture under `tests/basic_setup`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("basic_setup")
        .join(name)
}

pub fn copy_dir(src: &Path, dst: &Path) {
    fs::create_dir_all(dst).unwrap();
    for entry in fs::read_dir(src).unwrap() {
        let entry = entry.unwrap();
        let target = dst.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

/// Lay out a project: fixture docs under `<project>/<subdir>/docs` and the
/// named fixture config as `<project>/<subdir>/mkdocs.yml`. Returns the
/// config path.
pub fn setup_project(project: &Path, subdir: &str, config_fixture: &str) -> PathBuf {
    let site_root = project.join(subdir);
    copy_dir(&fixture("docs"), &site_root.join("docs"));
    let config = site_root.join("mkdocs.yml");
    fs::copy(fixture(config_fixture), &config).unwrap();
    config
}

pub fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}
