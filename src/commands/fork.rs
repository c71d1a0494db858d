//! # Fork Command Implementation
//!
//! Forks a new project/version: creates the `{proj}__{ver}_dev/_integ/_main`
//! triple in every repository the content/policy matrix says must fork,
//! pins or copies revisions everywhere else, and commits the three derived
//! manifest pairs to three new branches of the manifest repository.

use anyhow::Result;
use clap::Args;

use repo_fleet::lifecycle::{self, ProjectType};
use repo_fleet::output::OutputConfig;
use repo_fleet::report::Reporter;

use super::WorkspaceArgs;

/// Fork a new project/version triple from a source revision
#[derive(Args, Debug)]
pub struct ForkArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Source revision to fork from (branch, tag or commit).
    pub source_rev: String,

    /// Name of the destination project.
    pub project: String,

    /// Version string of the destination project.
    pub version: String,

    /// Project type: 'd' forks only DATA repositories and pins SOURCE by
    /// commit id; 's' forks SOURCE repositories too.
    #[arg(short = 't', value_name = "TYPE", default_value = "d")]
    pub project_type: char,

    /// Compute and report every decision without mutating the backend.
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the `fork` command.
pub fn execute(args: ForkArgs, output: &OutputConfig) -> Result<()> {
    let project_type = match args.project_type {
        'd' => ProjectType::Data,
        's' => ProjectType::SourceData,
        other => anyhow::bail!("project type must be 'd' or 's', got '{}'", other),
    };

    let ws = args.workspace.open()?;
    let mut reporter = Reporter::new(args.dry_run);

    println!(
        "Forking {}:{} from {}",
        output.repo(&args.project),
        args.version,
        output.branch(&args.source_rev)
    );

    let triple = lifecycle::fork_project(
        &ws,
        &args.source_rev,
        &args.project,
        &args.version,
        project_type,
        "fork",
        &mut reporter,
    )?;

    reporter.summary();
    println!("Created project branches:");
    for branch in triple.as_array() {
        println!("  {}", output.branch(branch));
    }
    Ok(())
}
