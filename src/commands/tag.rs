//! # Tag Command Implementation
//!
//! Snapshot-tags the fleet: one annotated tag, derived from the manifest
//! repository's current identity plus a caller suffix, is force-created and
//! force-pushed in every repository except the manifest and the
//! `COMMANDS`/`EXTERNAL` classes, and a dependency manifest pinning every
//! repository to that tag is committed under the tag itself. A manifest
//! branch tip is restored afterwards, so tagging never moves a branch.

use anyhow::Result;
use clap::Args;

use repo_fleet::lifecycle;
use repo_fleet::output::OutputConfig;
use repo_fleet::report::Reporter;

use super::WorkspaceArgs;

/// Snapshot-tag the fleet's current state
#[derive(Args, Debug)]
pub struct TagArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// End of the tag name. An existing tag of the derived name is REPLACED.
    pub suffix: String,

    /// Message added to every created tag.
    #[arg(short = 'm', value_name = "MESSAGE")]
    pub message: Option<String>,

    /// Compute and report every decision without mutating the backend.
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the `tag` command.
pub fn execute(args: TagArgs, output: &OutputConfig) -> Result<()> {
    let ws = args.workspace.open()?;
    let mut reporter = Reporter::new(args.dry_run);

    let tag_name = lifecycle::tag_fleet(
        &ws,
        &args.suffix,
        args.message.as_deref(),
        &mut reporter,
    )?;

    reporter.summary();
    println!("Fleet tagged as {}", output.branch(&tag_name));
    Ok(())
}
