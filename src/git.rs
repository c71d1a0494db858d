//! # Version-Control Backend
//!
//! Drives the system `git` binary for one working copy, which automatically
//! handles SSH keys, credential helpers and anything else configured in the
//! user's git setup. The surface is deliberately narrow: resolve revisions,
//! probe revision kinds, test/create/push branches and tags, fetch,
//! checkout, merge, and read manifest files as of arbitrary revisions
//! without checking them out.
//!
//! Every failed command maps to [`Error::Git`] carrying the repository
//! name, the command and its stderr; callers inside fleet-wide loops decide
//! whether that is fatal or a per-repository skip.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use log::debug;

use crate::branches;
use crate::error::{Error, Result};

/// What a symbolic revision turned out to be, probed in fixed order:
/// remote branch > local branch > tag > commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevKind {
    RemoteBranch,
    LocalBranch,
    Tag,
    Commit,
}

impl RevKind {
    /// The ref to read or fork from for a revision of this kind: branches go
    /// through the remote-tracking ref, tags and commits are used as-is.
    pub fn reference_ref(self, revision: &str) -> String {
        match self {
            RevKind::RemoteBranch | RevKind::LocalBranch => format!("origin/{}", revision),
            RevKind::Tag | RevKind::Commit => revision.to_string(),
        }
    }
}

/// What HEAD currently points at, for tag-name derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadKind {
    Branch,
    Tag,
    Detached,
}

impl HeadKind {
    pub fn marker(self) -> &'static str {
        match self {
            HeadKind::Branch => "br",
            HeadKind::Tag => "tg",
            HeadKind::Detached => "sh",
        }
    }
}

/// One git working copy.
#[derive(Debug, Clone)]
pub struct GitRepo {
    name: String,
    dir: PathBuf,
}

impl GitRepo {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        GitRepo {
            name: name.into(),
            dir: dir.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the working copy exists on disk (has a `.git`).
    pub fn is_cloned(&self) -> bool {
        self.dir.join(".git").exists()
    }

    fn raw(&self, args: &[&str]) -> Result<Output> {
        debug!("[{}] git {}", self.name, args.join(" "));
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.dir)
            .output()
            .map_err(|e| Error::Git {
                repo: self.name.clone(),
                command: args.join(" "),
                stderr: e.to_string(),
            })?;
        Ok(output)
    }

    /// Run and require success.
    fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.raw(args)?;
        if !output.status.success() {
            return Err(Error::Git {
                repo: self.name.clone(),
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run without caring about the exit status; returns (success, stdout).
    fn run_unchecked(&self, args: &[&str]) -> Result<(bool, String)> {
        let output = self.raw(args)?;
        Ok((
            output.status.success(),
            String::from_utf8_lossy(&output.stdout).to_string(),
        ))
    }

    /// Clone `url` into `dir`, optionally shallow.
    pub fn clone_from(
        name: impl Into<String>,
        url: &str,
        dir: impl Into<PathBuf>,
        depth: Option<u32>,
    ) -> Result<GitRepo> {
        let name = name.into();
        let dir = dir.into();
        if let Some(parent) = dir.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let depth_arg = depth.map(|d| format!("--depth={}", d));
        let mut args: Vec<&str> = vec!["clone"];
        if let Some(ref d) = depth_arg {
            args.push(d);
        }
        args.push(url);
        let dir_str = dir.to_string_lossy().to_string();
        args.push(&dir_str);

        debug!("[{}] git {}", name, args.join(" "));
        let output = Command::new("git")
            .args(&args)
            .output()
            .map_err(|e| Error::Git {
                repo: name.clone(),
                command: args.join(" "),
                stderr: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(Error::Git {
                repo: name.clone(),
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(GitRepo::new(name, dir))
    }

    /// Resolve a symbolic revision to a full commit id.
    pub fn resolve_commit(&self, revision: &str) -> Result<String> {
        let spec = format!("{}^{{commit}}", revision);
        let (ok, stdout) = self.run_unchecked(&["rev-parse", "--verify", &spec])?;
        if !ok {
            return Err(Error::RevisionUnresolved {
                repo: self.name.clone(),
                revision: revision.to_string(),
            });
        }
        Ok(stdout.trim().to_string())
    }

    /// Probe what `revision` is, in the order remote branch > local branch >
    /// tag > commit. `None` when it resolves to nothing.
    pub fn rev_kind(&self, revision: &str) -> Result<Option<RevKind>> {
        let remote_ref = format!("refs/remotes/origin/{}", revision);
        if self.run_unchecked(&["show-ref", "--verify", &remote_ref])?.0 {
            return Ok(Some(RevKind::RemoteBranch));
        }
        let local_ref = format!("refs/heads/{}", revision);
        if self.run_unchecked(&["show-ref", "--verify", &local_ref])?.0 {
            return Ok(Some(RevKind::LocalBranch));
        }
        let tag_ref = format!("refs/tags/{}", revision);
        if self.run_unchecked(&["show-ref", "--verify", &tag_ref])?.0 {
            return Ok(Some(RevKind::Tag));
        }
        let (ok, kind) = self.run_unchecked(&["cat-file", "-t", revision])?;
        if ok && !kind.trim().is_empty() {
            return Ok(Some(RevKind::Commit));
        }
        Ok(None)
    }

    /// Test whether a branch exists, locally or on the remote.
    pub fn branch_exists(&self, branch: &str, remote: bool) -> Result<bool> {
        let stdout = if remote {
            let pattern = format!("origin/{}", branch);
            self.run_unchecked(&["branch", "-r", "-l", &pattern])?.1
        } else {
            self.run_unchecked(&["branch", "-l", branch])?.1
        };
        Ok(!stdout.trim().is_empty())
    }

    /// Create a local branch from `start_point` without upstream tracking.
    pub fn create_branch(&self, branch: &str, start_point: &str) -> Result<()> {
        self.run(&["branch", "--no-track", branch, start_point])?;
        Ok(())
    }

    /// Delete local branches, best effort - a branch that does not exist is
    /// not an error.
    pub fn delete_local_branches(&self, names: &[&str]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        let mut args = vec!["branch", "-D"];
        args.extend_from_slice(names);
        let _ = self.run_unchecked(&args)?;
        Ok(())
    }

    /// Push branches to origin, setting upstream.
    pub fn push_branches(&self, names: &[&str]) -> Result<()> {
        let mut args = vec!["push", "-u", "origin"];
        args.extend_from_slice(names);
        self.run(&args)?;
        Ok(())
    }

    /// Push one tag, optionally forced.
    pub fn push_tag(&self, tag: &str, force: bool) -> Result<()> {
        let mut args = vec!["push", "origin", tag];
        if force {
            args.push("--force");
        }
        self.run(&args)?;
        Ok(())
    }

    /// Push the current branch to its upstream.
    pub fn push(&self) -> Result<()> {
        self.run(&["push"])?;
        Ok(())
    }

    /// Fetch from origin with pruning.
    pub fn fetch_prune(&self) -> Result<()> {
        self.run(&["fetch", "-p"])?;
        Ok(())
    }

    /// Fetch tags from origin.
    pub fn fetch_tags(&self) -> Result<()> {
        self.run(&["fetch", "-t"])?;
        Ok(())
    }

    /// Fetch everything: all remotes, tags, forced, pruned; `--unshallow`
    /// when the clone is shallow.
    pub fn fetch_all(&self, unshallow: bool) -> Result<()> {
        let mut args = vec!["fetch", "--prune", "-t", "-f", "--all"];
        if unshallow {
            args.push("--unshallow");
        }
        let _ = self.run_unchecked(&args)?;
        Ok(())
    }

    /// Fetch only `revision` at the given depth, branch or tag alike.
    pub fn fetch_depth(&self, url: &str, revision: &str, depth: u32) -> Result<()> {
        let depth = depth.to_string();
        let heads = self.run_unchecked(&["ls-remote", "--heads", "-q"])?.1;
        let tags = self.run_unchecked(&["ls-remote", "--tags", "-q"])?.1;
        let branch_ref = format!("refs/heads/{}", revision);
        let tag_ref = format!("refs/tags/{}", revision);
        if heads.lines().any(|l| l.split_whitespace().nth(1) == Some(branch_ref.as_str())) {
            let refspec = format!("+refs/heads/{0}:refs/remotes/origin/{0}", revision);
            self.run(&["fetch", "-f", "--depth", &depth, "--", url, &refspec])?;
        } else if tags.lines().any(|l| l.split_whitespace().nth(1) == Some(tag_ref.as_str())) {
            let refspec = format!("+refs/tags/{0}:refs/tags/{0}", revision);
            self.run(&["fetch", "-f", "--depth", &depth, "--no-tags", "--", url, &refspec])?;
        } else {
            // a bare commit id cannot be fetched by depth; assume present
            debug!(
                "[{}] revision {} is neither remote branch nor tag, skipping depth fetch",
                self.name, revision
            );
        }
        Ok(())
    }

    /// Checkout a revision.
    pub fn checkout(&self, revision: &str) -> Result<()> {
        self.run(&["checkout", revision, "--"])?;
        Ok(())
    }

    /// Force-checkout a revision, discarding local modifications.
    pub fn checkout_force(&self, revision: &str) -> Result<()> {
        self.run(&["checkout", "-f", revision, "--"])?;
        Ok(())
    }

    /// Pull the current branch; failure is reported, not fatal - detached
    /// heads and unborn upstreams are everyday states here.
    pub fn pull(&self) -> Result<bool> {
        Ok(self.run_unchecked(&["pull"])?.0)
    }

    /// Merge a remote ref into the current branch without fast-forwarding.
    ///
    /// A conflicted merge exits non-zero but has done exactly what the fleet
    /// wants: the conflicts stay in the working tree for the operator.
    /// Returns whether the merge completed cleanly.
    pub fn merge(&self, remote_ref: &str, extra_flags: &[String]) -> Result<bool> {
        let mut args: Vec<&str> = vec!["merge"];
        for flag in extra_flags {
            args.extend(flag.split_whitespace());
        }
        args.extend_from_slice(&["--no-ff", "--no-edit", remote_ref]);
        Ok(self.run_unchecked(&args)?.0)
    }

    /// Create or force-move an annotated tag.
    pub fn tag_annotated(&self, tag: &str, message: &str, force: bool) -> Result<()> {
        let mut args = vec!["tag"];
        if force {
            args.push("-f");
        }
        args.extend_from_slice(&["-a", tag, "-m", message]);
        self.run(&args)?;
        Ok(())
    }

    /// Read a file's bytes as of `revision` without checking it out.
    pub fn read_file_at(&self, path: &str, revision: &str) -> Result<Vec<u8>> {
        let spec = format!("{}:{}", revision, path);
        let output = self.raw(&["show", &spec])?;
        if !output.status.success() {
            return Err(Error::Git {
                repo: self.name.clone(),
                command: format!("show {}", spec),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    /// The branch HEAD is on, or `None` when detached.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let (_, stdout) = self.run_unchecked(&["branch", "--show-current"])?;
        let branch = stdout.trim();
        if branch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(branch.to_string()))
        }
    }

    /// The current checkout identity: branch name, else nearest tag, else
    /// abbreviated commit id, with the kind of thing it was.
    pub fn current_identity(&self) -> Result<(String, HeadKind)> {
        if let Some(branch) = self.current_branch()? {
            return Ok((branch, HeadKind::Branch));
        }
        let (ok, tag) = self.run_unchecked(&["describe", "--tags", "--exact-match", "HEAD"])?;
        let tag = tag.trim();
        if ok && !tag.is_empty() {
            return Ok((tag.to_string(), HeadKind::Tag));
        }
        let sha = self.resolve_commit("HEAD")?;
        Ok((sha[..7.min(sha.len())].to_string(), HeadKind::Detached))
    }

    /// The remote's default branch, from `git remote show origin`.
    pub fn default_branch(&self) -> Result<String> {
        let stdout = self.run(&["remote", "show", "origin"])?;
        let pattern = regex::Regex::new(r"HEAD branch: (.*)$")?;
        for line in stdout.lines() {
            if let Some(captures) = pattern.captures(line.trim()) {
                return Ok(captures[1].trim().to_string());
            }
        }
        Err(Error::Git {
            repo: self.name.clone(),
            command: "remote show origin".to_string(),
            stderr: "no HEAD branch reported by remote".to_string(),
        })
    }

    /// How many commits the local branch is ahead of its remote counterpart.
    /// Detached HEAD and unborn branches count as zero.
    pub fn ahead_of_remote(&self, branch: Option<&str>) -> Result<u64> {
        let branch = match branch {
            Some(b) => b.to_string(),
            None => match self.current_branch()? {
                Some(b) => b,
                None => return Ok(0),
            },
        };
        let range = format!("origin/{0}..{0}", branch);
        let (ok, stdout) = self.run_unchecked(&["rev-list", "--count", &range])?;
        if !ok {
            return Ok(0);
        }
        Ok(stdout.trim().parse().unwrap_or(0))
    }

    /// Whether the clone is shallow.
    pub fn is_shallow(&self) -> Result<bool> {
        let (_, stdout) = self.run_unchecked(&["rev-parse", "--is-shallow-repository"])?;
        Ok(stdout.trim() == "true")
    }

    /// Stage the given paths and commit them. A commit with nothing staged
    /// is not an error - reconciliation passes are idempotent and often
    /// rewrite files to identical content.
    pub fn commit_paths(&self, paths: &[&str], message: &str) -> Result<()> {
        let mut args = vec!["add"];
        args.extend_from_slice(paths);
        self.run(&args)?;
        let _ = self.run_unchecked(&["commit", "-m", message])?;
        Ok(())
    }

    /// Commit all tracked modifications.
    pub fn commit_all(&self, message: &str) -> Result<()> {
        let _ = self.run_unchecked(&["commit", "-a", "-m", message])?;
        Ok(())
    }

    /// Delete local branches whose upstream is gone.
    pub fn prune_gone_branches(&self) -> Result<Vec<String>> {
        let format = "%(if:equals=[gone])%(upstream:track)%(then)%(refname:short)%(end)";
        let format_arg = format!("--format={}", format);
        let (_, stdout) = self.run_unchecked(&["branch", &format_arg])?;
        let gone: Vec<String> = stdout
            .lines()
            .map(|l| l.trim().trim_matches('"'))
            .filter(|l| !l.is_empty())
            .map(|l| l.to_string())
            .collect();
        if !gone.is_empty() {
            let refs: Vec<&str> = gone.iter().map(String::as_str).collect();
            self.delete_local_branches(&refs)?;
        }
        Ok(gone)
    }

    /// The fleet's maintained branches visible on this repository's remote.
    pub fn fleet_branches(&self) -> Result<Vec<String>> {
        let (_, stdout) = self.run_unchecked(&["branch", "-r"])?;
        branches::fleet_branches_from_listing(&stdout)
    }
}
