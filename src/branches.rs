//! Version-triple branch naming and maintained-branch discovery.
//!
//! A project/version pair owns exactly three branches, always created and
//! reasoned about together: `{proj}__{ver}_dev`, `{proj}__{ver}_integ`,
//! `{proj}__{ver}_main`, in that fixed order.

use regex::Regex;

use crate::error::Result;

/// The three lifecycle stages of one project version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Dev,
    Integ,
    Main,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Dev, Stage::Integ, Stage::Main];

    pub fn suffix(self) -> &'static str {
        match self {
            Stage::Dev => "dev",
            Stage::Integ => "integ",
            Stage::Main => "main",
        }
    }
}

/// The `{dev, integ, main}` branch names for one project+version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTriple {
    pub dev: String,
    pub integ: String,
    pub main: String,
}

impl VersionTriple {
    pub fn new(project: &str, version: &str) -> Self {
        let name = |stage: Stage| format!("{}__{}_{}", project, version, stage.suffix());
        VersionTriple {
            dev: name(Stage::Dev),
            integ: name(Stage::Integ),
            main: name(Stage::Main),
        }
    }

    /// The branch names in fixed dev/integ/main order.
    pub fn as_array(&self) -> [&str; 3] {
        [&self.dev, &self.integ, &self.main]
    }

    pub fn branch(&self, stage: Stage) -> &str {
        match stage {
            Stage::Dev => &self.dev,
            Stage::Integ => &self.integ,
            Stage::Main => &self.main,
        }
    }
}

/// Extract the maintained fleet branches from `git branch -r` output.
///
/// Matches the `{proj}__{ver}_{dev|integ|main}` shape and strips the remote
/// prefix; the `origin/HEAD -> ...` indirection line never matches.
pub fn fleet_branches_from_listing(listing: &str) -> Result<Vec<String>> {
    let pattern = Regex::new(r"(\S*__\S*_(?:dev|integ|main))\s*$")?;
    let mut branches = Vec::new();
    for line in listing.lines() {
        if let Some(captures) = pattern.captures(line.trim()) {
            let full = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            // strip "origin/"
            let name = full.rsplit_once('/').map(|(_, b)| b).unwrap_or(full);
            if !branches.iter().any(|b| b == name) {
                branches.push(name.to_string());
            }
        }
    }
    Ok(branches)
}
