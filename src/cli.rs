//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Repo Fleet - Manage a fleet of versioned repositories
#[derive(Parser, Debug)]
#[command(name = "repo-fleet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Converge the local workspace to the manifest's declared state
    Update(commands::update::UpdateArgs),
    /// Fork a new project/version triple from a source revision
    Fork(commands::fork::ForkArgs),
    /// Merge one maintained branch into another across the fleet
    Merge(commands::merge::MergeArgs),
    /// Snapshot-tag the fleet's current state
    Tag(commands::tag::TagArgs),
    /// Apply a new manifest pair or field edits across every maintained branch
    Manifest(commands::manifest::ManifestArgs),
    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let level = self
            .log_level
            .parse::<log::LevelFilter>()
            .unwrap_or(log::LevelFilter::Info);
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .filter_level(level)
            .init();

        let output = repo_fleet::output::OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Update(args) => commands::update::execute(args, &output),
            Commands::Fork(args) => commands::fork::execute(args, &output),
            Commands::Merge(args) => commands::merge::execute(args, &output),
            Commands::Tag(args) => commands::tag::execute(args, &output),
            Commands::Manifest(args) => commands::manifest::execute(args, &output),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
