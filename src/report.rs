//! Reporting sink passed into the engine.
//!
//! The engine never owns a global logger: every entry point receives a
//! `Reporter`, which forwards progress to the `log` facade, carries the
//! dry-run bit, and accumulates the per-repository skip records that the
//! run's final summary must enumerate.

use log::{debug, info, warn};

/// One repository the pass had to skip, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipRecord {
    pub repo: String,
    pub reason: String,
}

/// Progress/skip sink for one engine invocation.
#[derive(Debug)]
pub struct Reporter {
    dry_run: bool,
    skipped: Vec<SkipRecord>,
}

impl Reporter {
    pub fn new(dry_run: bool) -> Self {
        Reporter {
            dry_run,
            skipped: Vec::new(),
        }
    }

    /// Whether backend mutations are suppressed for this run.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        debug!("{}", message.as_ref());
    }

    pub fn info(&self, message: impl AsRef<str>) {
        info!("{}", message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        warn!("{}", message.as_ref());
    }

    /// Section marker in the run log, one per repository or branch.
    pub fn section(&self, title: impl AsRef<str>) {
        info!("--- {}", title.as_ref());
    }

    /// Announce a backend mutation, or the fact that dry-run suppressed it.
    pub fn mutate(&self, description: impl AsRef<str>) {
        if self.dry_run {
            info!("dry-run: would {}", description.as_ref());
        } else {
            info!("{}", description.as_ref());
        }
    }

    /// Record a non-fatal per-repository skip.
    pub fn skip(&mut self, repo: &str, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("skipping {}: {}", repo, reason);
        self.skipped.push(SkipRecord {
            repo: repo.to_string(),
            reason,
        });
    }

    pub fn skipped(&self) -> &[SkipRecord] {
        &self.skipped
    }

    /// Emit the end-of-run summary enumerating every skipped repository.
    pub fn summary(&self) {
        if self.skipped.is_empty() {
            info!("run complete, no repositories were skipped");
            return;
        }
        warn!("run complete, {} repositories skipped:", self.skipped.len());
        for record in &self.skipped {
            warn!("  {}: {}", record.repo, record.reason);
        }
    }
}
