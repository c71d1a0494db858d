//! # Manifest Command Implementation
//!
//! Reconciles the whole fleet with a proposed manifest update, in one of
//! two modes:
//!
//! 1. **Folder mode** (`--folder`): a directory containing new `fleet.yml`
//!    and `content.yml` documents is diffed against the default branch, the
//!    changes are classified into actions, and the actions are applied to
//!    the default branch and every maintained branch.
//! 2. **Field mode** (`--set REPO FIELD VALUE`): literal field assignments
//!    applied to named repositories across every branch.
//!
//! Both modes support `--dry-run`, which produces identical classification
//! and decision output while suppressing all backend mutations.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use repo_fleet::output::OutputConfig;
use repo_fleet::reconcile::{self, FieldEdit};
use repo_fleet::report::Reporter;

use super::WorkspaceArgs;

/// Apply a new manifest pair or field edits across every maintained branch
#[derive(Args, Debug)]
pub struct ManifestArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Folder containing the proposed fleet.yml and content.yml.
    #[arg(short = 'f', long = "folder", value_name = "DIR")]
    pub folder: Option<PathBuf>,

    /// Set one manifest field on one repository. Takes three values:
    /// repository name, field name and value. May be given more than once.
    #[arg(
        short = 's',
        long = "set",
        num_args = 3,
        value_names = ["REPO", "FIELD", "VALUE"],
        action = clap::ArgAction::Append
    )]
    pub set: Vec<String>,

    /// Compute and report every decision without mutating the backend.
    #[arg(long)]
    pub dry_run: bool,

    /// Do not ask for confirmation before rewriting branches.
    #[arg(long)]
    pub yes: bool,
}

/// Execute the `manifest` command.
pub fn execute(args: ManifestArgs, output: &OutputConfig) -> Result<()> {
    let ws = args.workspace.open()?;

    if args.folder.is_none() && args.set.is_empty() {
        anyhow::bail!("nothing to do: pass --folder or --set (see --help)");
    }

    if !args.dry_run && !args.yes && console::user_attended() {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt("Rewrite the manifests of every maintained branch?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let mut reporter = Reporter::new(args.dry_run);

    if let Some(folder) = &args.folder {
        println!(
            "Reconciling the fleet with the manifests in {}",
            output.repo(&folder.display().to_string())
        );
        reconcile::reconcile_from_dir(&ws, folder, &mut reporter)?;
    }

    if !args.set.is_empty() {
        let edits: Vec<FieldEdit> = args
            .set
            .chunks_exact(3)
            .map(|triple| FieldEdit {
                repo: triple[0].clone(),
                field: triple[1].clone(),
                value: triple[2].clone(),
            })
            .collect();
        println!("Applying {} field edit(s) across all branches", edits.len());
        reconcile::apply_field_edits(&ws, &edits, &mut reporter)?;
    }

    reporter.summary();
    if args.dry_run {
        println!("Dry run - no branch was modified.");
    }
    Ok(())
}
