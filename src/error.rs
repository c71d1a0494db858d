//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `repo-fleet` application. It uses the `thiserror` library to create a
//! comprehensive `Error` enum that covers all anticipated failure modes,
//! providing clear and descriptive error messages.
//!
//! Two broad families of failures exist:
//!
//! - **Consistency faults** (`NameSymmetry`, `BranchExists`, `BranchMissing`,
//!   `RevisionUnresolved`, `AheadOfRemote`, `SameBranch`) abort an operation
//!   before any fleet mutation. Proceeding past one of these would commit the
//!   fleet into an inconsistent state, so they always terminate the run with
//!   a message naming the offending repository or branch.
//!
//! - **Backend failures** (`Git`, `Io`, `Yaml`) describe a single command or
//!   file operation that went wrong. Inside a fleet-wide loop these are
//!   usually logged and the pass continues to the next repository; at the
//!   top level they terminate the run.
//!
//! The `Result` type alias is used to return `Result<T, Error>` from
//! functions, making it easy to handle errors and propagate them up the
//! call stack.

use thiserror::Error;

/// Main error type for repo-fleet operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error occurred while parsing a manifest document.
    ///
    /// This error includes the specific parsing issue and optionally a hint
    /// about how to fix it.
    #[error("Manifest parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ManifestParse {
        message: String,
        /// Optional hint for how to fix the manifest issue
        hint: Option<String>,
    },

    /// An error occurred while executing a git command in a repository.
    #[error("Git command failed in {repo}: git {command} - {stderr}")]
    Git {
        repo: String,
        command: String,
        stderr: String,
    },

    /// The dependency manifest and the content manifest disagree on which
    /// repositories exist.
    ///
    /// Every name must appear in both documents (except the implicit
    /// `manifest` entry); reconciling with orphaned names would silently
    /// drop repositories.
    #[error("Dependency and content manifests disagree: only in dependency manifest: [{}], only in content manifest: [{}]", only_in_manifest.join(", "), only_in_content.join(", "))]
    NameSymmetry {
        only_in_manifest: Vec<String>,
        only_in_content: Vec<String>,
    },

    /// A repository appears in the dependency manifest but carries no
    /// classification in the content manifest.
    #[error("Repository {name} has no content classification")]
    MissingClassification { name: String },

    /// A symbolic revision could not be resolved to anything the backend
    /// knows about (not a branch, tag or commit).
    #[error("Revision {revision} does not resolve in repository {repo}")]
    RevisionUnresolved { repo: String, revision: String },

    /// A destination branch already exists where a fresh one was required.
    #[error("Branch {branch} already exists in repository {repo}")]
    BranchExists { repo: String, branch: String },

    /// A branch that an operation depends on is missing.
    #[error("Branch {branch} does not exist in repository {repo}")]
    BranchMissing { repo: String, branch: String },

    /// The local manifest branch has commits its remote counterpart lacks.
    ///
    /// An automated pull cannot reconcile divergent history unattended; the
    /// operator must push or reset first.
    #[error("Local branch {branch} of {repo} is {count} commit(s) ahead of its remote - push it before re-running")]
    AheadOfRemote {
        repo: String,
        branch: String,
        count: u64,
    },

    /// A merge was requested from a branch onto itself.
    #[error("Cannot merge branch {branch} into itself")]
    SameBranch { branch: String },

    /// A reconciliation pass was requested but the proposed manifests are
    /// identical to the current state.
    #[error("Nothing to update: the proposed manifests match the default branch")]
    NothingToUpdate,

    /// An error occurred with the workspace layout.
    #[error("Workspace error: {message}")]
    Workspace { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Whether this error must abort a fleet-wide loop immediately.
    ///
    /// Consistency faults poison the whole operation; everything else is a
    /// per-repository failure that the caller may log and skip.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::NameSymmetry { .. }
                | Error::RevisionUnresolved { .. }
                | Error::BranchExists { .. }
                | Error::BranchMissing { .. }
                | Error::AheadOfRemote { .. }
                | Error::SameBranch { .. }
                | Error::NothingToUpdate
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
