//! # Update Command Implementation
//!
//! Converges the local workspace to the dependency manifest's declared
//! state: fetches the manifest repository (optionally pinning it to a
//! requested revision first), guards against a locally-diverged manifest
//! branch, then walks every repository in manifest order - cloning the
//! missing ones, fetching the rest, and checking out the manifest revision.
//!
//! Group filters (`-c`) restrict the pass to repositories whose `groups`
//! intersect the selection; repositories without groups are always active.
//! `COMMANDS` repositories and the manifest repository itself are skipped.

use std::collections::BTreeSet;

use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use repo_fleet::content::ContentClass;
use repo_fleet::error::Error;
use repo_fleet::git::GitRepo;
use repo_fleet::manifest::{RepositoryDescriptor, MANIFEST_REPO};
use repo_fleet::output::OutputConfig;
use repo_fleet::report::Reporter;
use repo_fleet::workspace::Workspace;

use super::WorkspaceArgs;

/// Converge the local workspace to the manifest's declared state
#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Restrict the pass to repositories carrying this group label.
    /// May be given more than once; default is every repository.
    #[arg(short = 'c', long = "component", value_name = "GROUP")]
    pub component: Vec<String>,

    /// Check out this revision of the manifest repository first.
    #[arg(long = "manifest-rev", value_name = "REV")]
    pub manifest_rev: Option<String>,

    /// Also delete local branches whose upstream is gone.
    #[arg(long)]
    pub prune_all: bool,

    /// Fetch full history everywhere, ignoring clone-depth fields.
    #[arg(long, conflicts_with = "depth_1")]
    pub full_clone: bool,

    /// Clone and fetch with depth 1 for ALL repositories.
    #[arg(long = "depth-1")]
    pub depth_1: bool,

    /// Report every planned operation without mutating anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the `update` command.
pub fn execute(args: UpdateArgs, output: &OutputConfig) -> Result<()> {
    let ws = args.workspace.open()?;
    let mut reporter = Reporter::new(args.dry_run);
    let manifest_repo = ws.manifest_repo();

    println!("Updating workspace {}", ws.root().display());

    manifest_repo.fetch_all(false)?;
    if let Some(rev) = &args.manifest_rev {
        reporter.mutate(format!("check out manifest repository at {}", rev));
        if !args.dry_run {
            manifest_repo.checkout(rev)?;
        }
    }

    // an automated pull cannot reconcile divergent history unattended
    let ahead = manifest_repo.ahead_of_remote(None)?;
    if ahead > 0 {
        let branch = manifest_repo.current_branch()?.unwrap_or_default();
        return Err(Error::AheadOfRemote {
            repo: MANIFEST_REPO.to_string(),
            branch,
            count: ahead,
        }
        .into());
    }
    if !args.dry_run {
        let _ = manifest_repo.pull();
    }

    let (manifest, content) = ws.load_pair()?;

    let known_groups: BTreeSet<&str> = manifest
        .repositories
        .iter()
        .flat_map(|r| r.groups.iter().map(String::as_str))
        .collect();
    for group in &args.component {
        if !known_groups.contains(group.as_str()) {
            reporter.warn(format!("group {} appears nowhere in the manifest", group));
        }
    }

    let bar = ProgressBar::new(manifest.repositories.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    for descriptor in &manifest.repositories {
        bar.set_message(descriptor.name.clone());
        bar.inc(1);

        let name = &descriptor.name;
        if name == MANIFEST_REPO {
            continue;
        }
        let class = match content.class_of(name) {
            Some(class) => class,
            None => {
                reporter.skip(name, "no classification");
                continue;
            }
        };
        if class == ContentClass::Commands {
            reporter.debug(format!("{} provides commands - not updated here", name));
            continue;
        }
        if !is_active(descriptor, &args.component) {
            reporter.info(format!("{} filtered out by group selection", name));
            continue;
        }

        if let Err(err) = update_one(&ws, descriptor, &args, &mut reporter) {
            reporter.skip(name, err.to_string());
        }
    }
    bar.finish_and_clear();

    reporter.summary();
    println!(
        "Workspace updated to the revisions declared in {}",
        output.repo("fleet.yml")
    );
    Ok(())
}

fn is_active(descriptor: &RepositoryDescriptor, selection: &[String]) -> bool {
    if selection.is_empty() || descriptor.groups.is_empty() {
        return true;
    }
    descriptor
        .groups
        .iter()
        .any(|group| selection.iter().any(|s| s == group))
}

fn update_one(
    ws: &Workspace,
    descriptor: &RepositoryDescriptor,
    args: &UpdateArgs,
    reporter: &mut Reporter,
) -> repo_fleet::error::Result<()> {
    let repo = ws.repo_for(descriptor);
    let name = &descriptor.name;

    if !repo.is_cloned() {
        let depth = clone_depth(descriptor, args);
        reporter.mutate(format!(
            "clone {} into {} (depth {:?})",
            descriptor.url,
            repo.dir().display(),
            depth
        ));
        if args.dry_run {
            return Ok(());
        }
        GitRepo::clone_from(name.clone(), &descriptor.url, repo.dir(), depth)?;
    } else if args.dry_run {
        reporter.mutate(format!("fetch {} and check out {}", name, descriptor.revision));
        return Ok(());
    } else if args.depth_1 {
        repo.fetch_depth(&descriptor.url, &descriptor.revision, 1)?;
    } else if descriptor.clone_depth.is_none() || args.full_clone {
        let unshallow = repo.is_shallow()?;
        repo.fetch_all(unshallow)?;
    } else if let Some(depth) = descriptor.clone_depth {
        repo.fetch_depth(&descriptor.url, &descriptor.revision, depth)?;
    }

    if args.prune_all {
        let gone = repo.prune_gone_branches()?;
        if !gone.is_empty() {
            reporter.info(format!("{}: deleted gone branches {:?}", name, gone));
        }
    }

    reporter.info(format!("{}: check out {}", name, descriptor.revision));
    repo.checkout(&descriptor.revision)?;
    if repo.current_branch()?.is_some() {
        let _ = repo.pull();
    }
    Ok(())
}

fn clone_depth(descriptor: &RepositoryDescriptor, args: &UpdateArgs) -> Option<u32> {
    if args.depth_1 {
        Some(1)
    } else if args.full_clone {
        None
    } else {
        descriptor.clone_depth
    }
}
