//! # Manifest Diff Engine
//!
//! Computes a canonical comparable projection of a manifest snapshot and
//! set-differences two snapshots into {added, changed, removed, unchanged}
//! repository-name partitions.
//!
//! The canonical form of a descriptor excludes `revision` unless the
//! repository provides CLI-extension commands: plain source/data revision
//! differences are policy outcomes, not user edits, and must not register as
//! changes. Command repositories are the exception - their revision moves
//! only through an explicit action, so it participates in equality.
//!
//! The engine also hosts the name-symmetry guard between a dependency
//! manifest and its content manifest: a pair whose name sets disagree
//! (ignoring the implicit `manifest` entry) is a consistency fault, never
//! something to proceed past silently.

use std::collections::BTreeSet;

use crate::content::ContentSnapshot;
use crate::error::{Error, Result};
use crate::manifest::ManifestSnapshot;

/// Name partitions produced by one diff of two manifest snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDiff {
    /// In new, not in old.
    pub added: BTreeSet<String>,
    /// In both, canonical forms differ.
    pub changed: BTreeSet<String>,
    /// In old, not in new.
    pub removed: BTreeSet<String>,
    /// In both, canonical forms equal.
    pub unchanged: BTreeSet<String>,
}

impl ManifestDiff {
    /// Whether the two snapshots were content-equal.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Canonical YAML of one descriptor with the revision normalized out for
/// non-command repositories.
fn canonical_form(
    descriptor: &crate::manifest::RepositoryDescriptor,
) -> Result<String> {
    let mut value = serde_yaml::to_value(descriptor)?;
    if !descriptor.is_command_repo() {
        if let serde_yaml::Value::Mapping(ref mut map) = value {
            map.remove(&serde_yaml::Value::String("revision".to_string()));
        }
    }
    Ok(serde_yaml::to_string(&value)?)
}

/// The comparable projection of a snapshot: (name, canonical form) pairs.
pub fn canonical_set(snapshot: &ManifestSnapshot) -> Result<BTreeSet<(String, String)>> {
    snapshot
        .repositories
        .iter()
        .map(|r| Ok((r.name.clone(), canonical_form(r)?)))
        .collect()
}

/// Set-difference two snapshots into name partitions.
pub fn diff(old: &ManifestSnapshot, new: &ManifestSnapshot) -> Result<ManifestDiff> {
    let old_set = canonical_set(old)?;
    let new_set = canonical_set(new)?;
    let old_names: BTreeSet<String> = old_set.iter().map(|(n, _)| n.clone()).collect();
    let new_names: BTreeSet<String> = new_set.iter().map(|(n, _)| n.clone()).collect();

    let added: BTreeSet<String> = new_names.difference(&old_names).cloned().collect();
    let changed: BTreeSet<String> = new_set
        .iter()
        .filter(|(name, _)| old_names.contains(name))
        .filter(|pair| !old_set.contains(*pair))
        .map(|(name, _)| name.clone())
        .collect();
    let removed: BTreeSet<String> = old_names.difference(&new_names).cloned().collect();
    let unchanged: BTreeSet<String> = old_names
        .intersection(&new_names)
        .filter(|name| !changed.contains(*name))
        .cloned()
        .collect();

    Ok(ManifestDiff {
        added,
        changed,
        removed,
        unchanged,
    })
}

/// Refuse to proceed when the dependency and content manifests disagree on
/// which repositories exist (ignoring the implicit manifest entry).
pub fn check_name_symmetry(
    manifest: &ManifestSnapshot,
    content: &ContentSnapshot,
) -> Result<()> {
    let manifest_names = manifest.fleet_names();
    let content_names = content.fleet_names();

    let only_in_manifest: Vec<String> = manifest_names
        .difference(&content_names)
        .cloned()
        .collect();
    let only_in_content: Vec<String> = content_names
        .difference(&manifest_names)
        .cloned()
        .collect();

    if only_in_manifest.is_empty() && only_in_content.is_empty() {
        Ok(())
    } else {
        Err(Error::NameSymmetry {
            only_in_manifest,
            only_in_content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentClass, ContentSnapshot};
    use crate::manifest::RepositoryDescriptor;

    fn descriptor(name: &str, revision: &str) -> RepositoryDescriptor {
        RepositoryDescriptor {
            name: name.to_string(),
            url: format!("https://git.example.com/fleet/{}.git", name),
            path: None,
            revision: revision.to_string(),
            clone_depth: None,
            groups: vec![],
            commands: None,
        }
    }

    fn snapshot(descriptors: Vec<RepositoryDescriptor>) -> ManifestSnapshot {
        ManifestSnapshot {
            repositories: descriptors,
        }
    }

    #[test]
    fn test_diff_of_identical_snapshots_is_all_unchanged() {
        let snap = snapshot(vec![descriptor("a", "main"), descriptor("b", "main")]);
        let result = diff(&snap, &snap.clone()).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.unchanged.len(), 2);
    }

    #[test]
    fn test_revision_change_is_not_a_change_for_plain_repos() {
        let old = snapshot(vec![descriptor("a", "main")]);
        let new = snapshot(vec![descriptor("a", "proj__1.0_dev")]);
        let result = diff(&old, &new).unwrap();
        assert!(result.is_empty());
        assert!(result.unchanged.contains("a"));
    }

    #[test]
    fn test_revision_change_counts_for_command_repos() {
        let mut old_desc = descriptor("tools", "v1.0");
        old_desc.commands = Some("scripts/commands.yml".to_string());
        let mut new_desc = old_desc.clone();
        new_desc.revision = "v2.0".to_string();

        let result = diff(&snapshot(vec![old_desc]), &snapshot(vec![new_desc])).unwrap();
        assert!(result.changed.contains("tools"));
    }

    #[test]
    fn test_added_and_removed() {
        let old = snapshot(vec![descriptor("a", "main"), descriptor("b", "main")]);
        let new = snapshot(vec![descriptor("b", "main"), descriptor("c", "main")]);
        let result = diff(&old, &new).unwrap();
        assert_eq!(result.added, ["c".to_string()].into());
        assert_eq!(result.removed, ["a".to_string()].into());
        assert_eq!(result.unchanged, ["b".to_string()].into());
        assert!(result.changed.is_empty());
    }

    #[test]
    fn test_url_change_is_a_change() {
        let old = snapshot(vec![descriptor("a", "main")]);
        let mut moved = descriptor("a", "main");
        moved.url = "https://elsewhere.example.com/a.git".to_string();
        let result = diff(&old, &snapshot(vec![moved])).unwrap();
        assert_eq!(result.changed, ["a".to_string()].into());
        assert!(result.unchanged.is_empty());
    }

    #[test]
    fn test_partitions_are_disjoint_and_cover() {
        let old = snapshot(vec![
            descriptor("a", "main"),
            descriptor("b", "main"),
            descriptor("c", "main"),
        ]);
        let mut changed_b = descriptor("b", "main");
        changed_b.path = Some("moved/b".to_string());
        let new = snapshot(vec![changed_b, descriptor("c", "main"), descriptor("d", "main")]);

        let result = diff(&old, &new).unwrap();
        let mut all = BTreeSet::new();
        for set in [
            &result.added,
            &result.changed,
            &result.removed,
            &result.unchanged,
        ] {
            for name in set {
                assert!(all.insert(name.clone()), "{} in two partitions", name);
            }
        }
        let union: BTreeSet<String> = old.names().union(&new.names()).cloned().collect();
        assert_eq!(all, union);
    }

    #[test]
    fn test_name_symmetry_ok() {
        let manifest = snapshot(vec![descriptor("manifest", "main"), descriptor("a", "main")]);
        let mut content = ContentSnapshot::default();
        content.set_class("a", ContentClass::Source);
        assert!(check_name_symmetry(&manifest, &content).is_ok());
    }

    #[test]
    fn test_name_symmetry_fault_reports_both_sides() {
        let manifest = snapshot(vec![descriptor("a", "main"), descriptor("b", "main")]);
        let mut content = ContentSnapshot::default();
        content.set_class("a", ContentClass::Source);
        content.set_class("ghost", ContentClass::Data);

        let err = check_name_symmetry(&manifest, &content).unwrap_err();
        match err {
            Error::NameSymmetry {
                only_in_manifest,
                only_in_content,
            } => {
                assert_eq!(only_in_manifest, vec!["b".to_string()]);
                assert_eq!(only_in_content, vec!["ghost".to_string()]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_manifest_entry_ignored_by_symmetry_guard() {
        let manifest = snapshot(vec![descriptor("manifest", "main"), descriptor("a", "main")]);
        let mut content = ContentSnapshot::default();
        content.set_class("a", ContentClass::Source);
        // content side never lists the manifest repository; still symmetric
        assert!(check_name_symmetry(&manifest, &content).is_ok());
    }
}
