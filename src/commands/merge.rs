//! # Merge Command Implementation
//!
//! Merges one maintained branch into another across the fleet. Per
//! repository one of three strategies applies (regular merge, sha-pin,
//! copy-revision), selected by the destination classification and the two
//! fleets' merge policies. The command never pushes; after reviewing
//! conflicts the operator pushes every repository manually.

use anyhow::Result;
use clap::Args;

use repo_fleet::lifecycle::{self, MergeOptions};
use repo_fleet::output::OutputConfig;
use repo_fleet::report::Reporter;

use super::WorkspaceArgs;

/// Merge one maintained branch into another across the fleet
#[derive(Args, Debug)]
pub struct MergeArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Name of the origin branch to merge from.
    pub branch_from: String,

    /// Name of the destination branch to merge into.
    pub branch_to: String,

    /// Restrict the merge to a repository name or class name
    /// (DATA, SOURCE, EXTERNAL, ALL_PROJECTS). May be given more than once.
    #[arg(short = 't', value_name = "REPO_OR_CLASS")]
    pub only: Vec<String>,

    /// Extra git-merge flags scoped to a repository name or class name.
    /// Takes two values: the scope and the flag string. May be given more
    /// than once.
    #[arg(
        short = 'o',
        num_args = 2,
        value_names = ["REPO_OR_CLASS", "MERGE_FLAGS"],
        action = clap::ArgAction::Append
    )]
    pub extra: Vec<String>,

    /// Compute and report every decision without mutating the backend.
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the `merge` command.
pub fn execute(args: MergeArgs, output: &OutputConfig) -> Result<()> {
    let ws = args.workspace.open()?;
    let mut reporter = Reporter::new(args.dry_run);

    let options = MergeOptions {
        only: args.only.clone(),
        extra_flags: args
            .extra
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect(),
    };

    println!(
        "Merging {} into {}",
        output.branch(&args.branch_from),
        output.branch(&args.branch_to)
    );

    lifecycle::merge_branches(&ws, &args.branch_from, &args.branch_to, &options, &mut reporter)?;

    reporter.summary();
    println!(
        "Merge pass complete. Review conflicts if any, then push each repository manually."
    );
    Ok(())
}
