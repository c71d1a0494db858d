//! # Content Manifest Model
//!
//! The content manifest (`content.yml`) classifies every repository of the
//! fleet and carries the single fleet-wide merge policy in its `self:`
//! block. It is keyed by name and lives next to the dependency manifest on
//! every maintained branch; the two documents must stay name-symmetric.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::manifest::MANIFEST_REPO;

/// Content classification of one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentClass {
    /// Code that forms the product; revision policy depends on the fleet
    /// `MergePolicy`.
    Source,
    /// Repository whose branches always track the fleet's own version
    /// branches.
    Data,
    /// Third-party dependency; revision is always copied verbatim from the
    /// parent.
    External,
    /// The tooling-extension repository; excluded from all branch and merge
    /// logic.
    Commands,
    /// Shared-infrastructure repository common to every fleet version;
    /// revision copied verbatim, never forked.
    AllProjects,
}

impl fmt::Display for ContentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentClass::Source => "SOURCE",
            ContentClass::Data => "DATA",
            ContentClass::External => "EXTERNAL",
            ContentClass::Commands => "COMMANDS",
            ContentClass::AllProjects => "ALL_PROJECTS",
        };
        f.write_str(name)
    }
}

impl ContentClass {
    /// Parse the manifest spelling (`SOURCE`, `ALL_PROJECTS`, ...), used for
    /// CLI filters that accept a class name in place of a repository name.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "SOURCE" => Some(ContentClass::Source),
            "DATA" => Some(ContentClass::Data),
            "EXTERNAL" => Some(ContentClass::External),
            "COMMANDS" => Some(ContentClass::Commands),
            "ALL_PROJECTS" => Some(ContentClass::AllProjects),
            _ => None,
        }
    }
}

/// Fleet-wide merge policy.
///
/// `SOURCE_DATA` means SOURCE repositories fork real branches alongside DATA
/// repositories; `DATA` means SOURCE repositories are pinned by commit id
/// while only DATA repositories fork branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergePolicy {
    Data,
    SourceData,
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePolicy::Data => f.write_str("DATA"),
            MergePolicy::SourceData => f.write_str("SOURCE_DATA"),
        }
    }
}

/// The fleet-wide `self:` block of the content manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetBlock {
    #[serde(rename = "merge-policy")]
    pub merge_policy: MergePolicy,
}

impl Default for FleetBlock {
    // Historic documents without a self block behave as SOURCE_DATA fleets.
    fn default() -> Self {
        FleetBlock {
            merge_policy: MergePolicy::SourceData,
        }
    }
}

/// Classification of one repository, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub content: ContentClass,
}

/// The content manifest loaded from one revision of the manifest repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSnapshot {
    #[serde(rename = "self", default)]
    pub fleet: FleetBlock,
    #[serde(default)]
    pub repositories: Vec<ContentEntry>,
}

impl Default for ContentSnapshot {
    fn default() -> Self {
        ContentSnapshot {
            fleet: FleetBlock::default(),
            repositories: Vec::new(),
        }
    }
}

impl ContentSnapshot {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::ManifestParse {
            message: e.to_string(),
            hint: Some(
                "expected 'self: {merge-policy: ...}' and a 'repositories:' list".to_string(),
            ),
        })
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// The fleet-wide merge policy.
    pub fn policy(&self) -> MergePolicy {
        self.fleet.merge_policy
    }

    /// Classification lookup by name.
    pub fn class_of(&self, name: &str) -> Option<ContentClass> {
        self.repositories
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.content)
    }

    /// Reassign (or add) the classification of one repository.
    pub fn set_class(&mut self, name: &str, class: ContentClass) {
        match self.repositories.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.content = class,
            None => self.repositories.push(ContentEntry {
                name: name.to_string(),
                content: class,
            }),
        }
    }

    /// Remove an entry by name, returning whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.repositories.len();
        self.repositories.retain(|e| e.name != name);
        self.repositories.len() != before
    }

    /// All classified names, excluding the implicit manifest entry.
    pub fn fleet_names(&self) -> BTreeSet<String> {
        self.repositories
            .iter()
            .filter(|e| e.name != MANIFEST_REPO)
            .map(|e| e.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "\
self:
  merge-policy: SOURCE_DATA
repositories:
- name: app-core
  content: SOURCE
- name: data-set
  content: DATA
- name: vendor-lib
  content: EXTERNAL
- name: fleet-tools
  content: COMMANDS
- name: ci-scripts
  content: ALL_PROJECTS
";

    #[test]
    fn test_round_trip_canonical() {
        let snapshot = ContentSnapshot::from_yaml(CANONICAL).unwrap();
        assert_eq!(snapshot.to_yaml().unwrap(), CANONICAL);
    }

    #[test]
    fn test_class_lookup() {
        let snapshot = ContentSnapshot::from_yaml(CANONICAL).unwrap();
        assert_eq!(snapshot.class_of("app-core"), Some(ContentClass::Source));
        assert_eq!(snapshot.class_of("data-set"), Some(ContentClass::Data));
        assert_eq!(
            snapshot.class_of("ci-scripts"),
            Some(ContentClass::AllProjects)
        );
        assert_eq!(snapshot.class_of("unknown"), None);
    }

    #[test]
    fn test_policy_parsing() {
        let snapshot = ContentSnapshot::from_yaml(CANONICAL).unwrap();
        assert_eq!(snapshot.policy(), MergePolicy::SourceData);

        let data = CANONICAL.replace("SOURCE_DATA", "DATA");
        let snapshot = ContentSnapshot::from_yaml(&data).unwrap();
        assert_eq!(snapshot.policy(), MergePolicy::Data);
    }

    #[test]
    fn test_missing_self_block_defaults_to_source_data() {
        let text = "\
repositories:
- name: app-core
  content: SOURCE
";
        let snapshot = ContentSnapshot::from_yaml(text).unwrap();
        assert_eq!(snapshot.policy(), MergePolicy::SourceData);
    }

    #[test]
    fn test_set_class_updates_and_appends() {
        let mut snapshot = ContentSnapshot::from_yaml(CANONICAL).unwrap();
        snapshot.set_class("app-core", ContentClass::Data);
        assert_eq!(snapshot.class_of("app-core"), Some(ContentClass::Data));
        assert_eq!(snapshot.repositories.len(), 5);

        snapshot.set_class("module-a", ContentClass::Data);
        assert_eq!(snapshot.repositories.len(), 6);
        assert_eq!(snapshot.repositories[5].name, "module-a");
    }

    #[test]
    fn test_remove() {
        let mut snapshot = ContentSnapshot::from_yaml(CANONICAL).unwrap();
        assert!(snapshot.remove("vendor-lib"));
        assert!(!snapshot.remove("vendor-lib"));
        assert_eq!(snapshot.class_of("vendor-lib"), None);
    }

    #[test]
    fn test_class_parse_spellings() {
        assert_eq!(ContentClass::parse("SOURCE"), Some(ContentClass::Source));
        assert_eq!(
            ContentClass::parse("ALL_PROJECTS"),
            Some(ContentClass::AllProjects)
        );
        assert_eq!(ContentClass::parse("source"), None);
        assert_eq!(ContentClass::parse(""), None);
    }

    #[test]
    fn test_display_matches_manifest_spelling() {
        for class in [
            ContentClass::Source,
            ContentClass::Data,
            ContentClass::External,
            ContentClass::Commands,
            ContentClass::AllProjects,
        ] {
            assert_eq!(ContentClass::parse(&class.to_string()), Some(class));
        }
    }
}
