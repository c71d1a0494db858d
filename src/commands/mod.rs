//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `repo-fleet` command-line tool. Each subcommand is defined in its own
//! file to keep the logic separated and maintainable.
//!
//! Each command module contains an `Args` struct that defines the
//! command-specific arguments and options, derived using `clap`, and an
//! `execute` function that takes the parsed `Args`, performs the command's
//! logic by calling into the `repo_fleet` library, and prints the run
//! summary.

pub mod completions;
pub mod fork;
pub mod manifest;
pub mod merge;
pub mod tag;
pub mod update;

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use repo_fleet::workspace::Workspace;

/// Arguments shared by every fleet-touching command.
#[derive(Args, Debug)]
pub struct WorkspaceArgs {
    /// Workspace root directory.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub workspace: PathBuf,

    /// Directory of the manifest repository, relative to the workspace root.
    ///
    /// Can also be set with the `REPO_FLEET_MANIFEST_DIR` environment
    /// variable.
    #[arg(
        long,
        value_name = "DIR",
        env = "REPO_FLEET_MANIFEST_DIR",
        default_value = "manifest"
    )]
    pub manifest_dir: String,
}

impl WorkspaceArgs {
    pub fn open(&self) -> Result<Workspace> {
        Ok(Workspace::open(&self.workspace, &self.manifest_dir)?)
    }
}
