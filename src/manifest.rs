//! # Dependency Manifest Model
//!
//! This module defines the data structures that represent the `fleet.yml`
//! dependency manifest: the ordered list of repository descriptors that make
//! up one fleet, together with parsing and serialization.
//!
//! ## Key Components
//!
//! - **`RepositoryDescriptor`**: one managed repository - name, url,
//!   checkout path, revision, optional shallow-clone depth, group labels and
//!   an optional CLI-extension (`commands`) entry.
//!
//! - **`ManifestSnapshot`**: the full document as loaded from one revision of
//!   the manifest repository. Document order is preserved because it is
//!   meaningful on serialization, but all cross-snapshot access goes through
//!   name-based lookup - two independently loaded snapshots never share
//!   index order.
//!
//! Snapshots have value semantics: `clone()` yields a deep copy, and every
//! branch reconciliation works on its own copy. Mutating one branch's
//! snapshot can never alias another's.
//!
//! ## Round-trip
//!
//! `to_yaml(from_yaml(s)) == s` holds for documents in canonical block
//! style; `from_yaml(to_yaml(x)) == x` holds always. Optional fields are
//! omitted from the output when absent so that documents stay minimal.

use std::collections::BTreeSet;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Reserved name of the repository that carries the manifest documents.
///
/// It appears in the dependency manifest like any other repository but is
/// excluded from name-symmetry checks and from every fleet-wide loop.
pub const MANIFEST_REPO: &str = "manifest";

/// One managed repository as declared in `fleet.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    /// Unique key within a manifest.
    pub name: String,
    /// Clone URL.
    pub url: String,
    /// Checkout path relative to the workspace root. Defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Branch name, tag name or commit id. Untyped - interpretation is
    /// contextual.
    pub revision: String,
    /// Optional shallow-clone depth.
    #[serde(rename = "clone-depth", default, skip_serializing_if = "Option::is_none")]
    pub clone_depth: Option<u32>,
    /// Labels used for selective checkout. Order is kept for serialization;
    /// comparisons treat this as a set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    /// Marks this repository as providing CLI-extension commands; the value
    /// points at the extension description file inside the repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<String>,
}

impl RepositoryDescriptor {
    /// Checkout path of this repository relative to the workspace root.
    pub fn checkout_path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }

    /// Whether this repository provides CLI-extension commands.
    ///
    /// Command repositories keep their revision under explicit control:
    /// revision edits on them are user actions, not policy outcomes.
    pub fn is_command_repo(&self) -> bool {
        self.commands.is_some()
    }

    /// The group labels as a set, for order-insensitive comparison.
    pub fn groups_set(&self) -> BTreeSet<&str> {
        self.groups.iter().map(String::as_str).collect()
    }
}

/// The dependency manifest loaded from one revision of the manifest
/// repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSnapshot {
    /// Repositories in document order.
    #[serde(default)]
    pub repositories: Vec<RepositoryDescriptor>,
}

impl ManifestSnapshot {
    /// Parse a manifest document.
    ///
    /// Duplicate names are tolerated the way the fleet has always behaved:
    /// the first entry wins and the duplicate is dropped with a warning.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let raw: ManifestSnapshot =
            serde_yaml::from_str(text).map_err(|e| Error::ManifestParse {
                message: e.to_string(),
                hint: Some("expected a top-level 'repositories:' list".to_string()),
            })?;

        let mut seen = BTreeSet::new();
        let mut repositories = Vec::with_capacity(raw.repositories.len());
        for descriptor in raw.repositories {
            if !seen.insert(descriptor.name.clone()) {
                warn!(
                    "repository {} appears more than once in the manifest - keeping the first entry",
                    descriptor.name
                );
                continue;
            }
            repositories.push(descriptor);
        }

        Ok(ManifestSnapshot { repositories })
    }

    /// Serialize back to YAML in canonical block style.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Name-based lookup.
    pub fn lookup(&self, name: &str) -> Option<&RepositoryDescriptor> {
        self.repositories.iter().find(|r| r.name == name)
    }

    /// Mutable name-based lookup.
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut RepositoryDescriptor> {
        self.repositories.iter_mut().find(|r| r.name == name)
    }

    /// Insert a descriptor, replacing an existing entry of the same name in
    /// place or appending at the end.
    pub fn insert(&mut self, descriptor: RepositoryDescriptor) {
        match self.lookup_mut(&descriptor.name) {
            Some(existing) => *existing = descriptor,
            None => self.repositories.push(descriptor),
        }
    }

    /// Remove a descriptor by name, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<RepositoryDescriptor> {
        let index = self.repositories.iter().position(|r| r.name == name)?;
        Some(self.repositories.remove(index))
    }

    /// All repository names, including the manifest repository entry.
    pub fn names(&self) -> BTreeSet<String> {
        self.repositories.iter().map(|r| r.name.clone()).collect()
    }

    /// Repository names excluding the implicit manifest entry.
    pub fn fleet_names(&self) -> BTreeSet<String> {
        self.repositories
            .iter()
            .filter(|r| r.name != MANIFEST_REPO)
            .map(|r| r.name.clone())
            .collect()
    }
}
