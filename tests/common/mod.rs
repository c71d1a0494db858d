//! Shared test fixture: a miniature fleet with local "remote" repositories
//! and a cloned workspace, so lifecycle operations run against real git
//! with predictable results.
//!
//! The remotes are plain repositories configured with
//! `receive.denyCurrentBranch = updateInstead`, so pushes to their
//! checked-out branches update the worktree instead of being refused.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use repo_fleet::workspace::Workspace;

pub const FLEET_REPOS: &[&str] = &["app-src", "app-data", "external1"];

pub const CONTENT_YML: &str = "\
self:
  merge-policy: SOURCE_DATA
repositories:
- name: app-src
  content: SOURCE
- name: app-data
  content: DATA
- name: external1
  content: EXTERNAL
";

pub struct FleetFixture {
    tmp: TempDir,
}

impl FleetFixture {
    pub fn new() -> Self {
        set_hermetic_git_env();

        let tmp = TempDir::new().expect("create fixture tempdir");
        let remotes = tmp.path().join("remotes");
        fs::create_dir_all(&remotes).unwrap();

        for name in FLEET_REPOS.iter().chain(["manifest"].iter()).copied() {
            let dir = remotes.join(name);
            git(&remotes, &["init", "-b", "main", name]);
            git(&dir, &["config", "receive.denyCurrentBranch", "updateInstead"]);
            fs::write(dir.join("README.md"), format!("# {}\n", name)).unwrap();
            git(&dir, &["add", "."]);
            git(&dir, &["commit", "-m", "initial commit"]);
        }

        // external1 is consumed by tag, with history continuing past it
        let external = remotes.join("external1");
        git(&external, &["tag", "-a", "tag_1", "-m", "first drop"]);
        git(&external, &["commit", "--allow-empty", "-m", "after tag_1"]);

        let manifest_dir = remotes.join("manifest");
        fs::write(manifest_dir.join("fleet.yml"), fleet_yml(&remotes)).unwrap();
        fs::write(manifest_dir.join("content.yml"), CONTENT_YML).unwrap();
        git(&manifest_dir, &["add", "."]);
        git(&manifest_dir, &["commit", "-m", "add fleet manifests"]);

        let work = tmp.path().join("work");
        fs::create_dir_all(&work).unwrap();
        for name in FLEET_REPOS.iter().chain(["manifest"].iter()).copied() {
            let url = remotes.join(name);
            git(&work, &["clone", url.to_str().unwrap(), name]);
        }

        FleetFixture { tmp }
    }

    pub fn remotes(&self) -> PathBuf {
        self.tmp.path().join("remotes")
    }

    pub fn remote(&self, name: &str) -> PathBuf {
        self.remotes().join(name)
    }

    pub fn workspace_dir(&self) -> PathBuf {
        self.tmp.path().join("work")
    }

    pub fn workspace_repo(&self, name: &str) -> PathBuf {
        self.workspace_dir().join(name)
    }

    pub fn workspace(&self) -> Workspace {
        Workspace::open(self.workspace_dir(), "manifest").expect("open fixture workspace")
    }

    /// Add a brand-new remote repository (not yet in any manifest).
    pub fn add_remote(&self, name: &str) -> PathBuf {
        let remotes = self.remotes();
        let dir = remotes.join(name);
        git(&remotes, &["init", "-b", "main", name]);
        git(&dir, &["config", "receive.denyCurrentBranch", "updateInstead"]);
        fs::write(dir.join("README.md"), format!("# {}\n", name)).unwrap();
        git(&dir, &["add", "."]);
        git(&dir, &["commit", "-m", "initial commit"]);
        dir
    }

    /// The fixture's dependency manifest text, as committed to the manifest
    /// repository's main branch.
    pub fn fleet_yml(&self) -> String {
        fleet_yml(&self.remotes())
    }
}

pub fn fleet_yml(remotes: &Path) -> String {
    let base = remotes.display();
    format!(
        "\
repositories:
- name: manifest
  url: {base}/manifest
  revision: main
- name: app-src
  url: {base}/app-src
  revision: main
- name: app-data
  url: {base}/app-data
  revision: main
- name: external1
  url: {base}/external1
  revision: tag_1
"
    )
}

/// Run git in `dir`, asserting success, returning stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap_or_else(|e| panic!("failed to spawn git {:?}: {}", args, e));
    assert!(
        output.status.success(),
        "git {:?} in {} failed: {}",
        args,
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Commit a file in `dir` and return the new commit id.
pub fn commit_file(dir: &Path, file: &str, content: &str, message: &str) -> String {
    fs::write(dir.join(file), content).unwrap();
    git(dir, &["add", file]);
    git(dir, &["commit", "-m", message]);
    git(dir, &["rev-parse", "HEAD"]).trim().to_string()
}

/// List the branch names of a repository.
pub fn branch_names(dir: &Path) -> Vec<String> {
    git(dir, &["branch", "--format=%(refname:short)"])
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

/// List the tag names of a repository.
pub fn tag_names(dir: &Path) -> Vec<String> {
    git(dir, &["tag", "-l"])
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

/// Pin git to an identity and keep user/system configuration out of the
/// fixtures. Idempotent; tests run in threads within one process.
fn set_hermetic_git_env() {
    std::env::set_var("GIT_AUTHOR_NAME", "Fleet Test");
    std::env::set_var("GIT_AUTHOR_EMAIL", "fleet-test@example.com");
    std::env::set_var("GIT_COMMITTER_NAME", "Fleet Test");
    std::env::set_var("GIT_COMMITTER_EMAIL", "fleet-test@example.com");
    std::env::set_var("GIT_CONFIG_NOSYSTEM", "1");
    std::env::set_var("GIT_CONFIG_GLOBAL", "/dev/null");
}
