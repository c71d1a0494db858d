//! # Action Classifier
//!
//! Maps a manifest diff plus the content classification of each affected
//! repository into typed actions. Actions are transient: they are computed
//! fresh per reconciliation pass, keyed by repository name, and applied by
//! the branch-lifecycle engine against whichever maintained branch is being
//! converged.

use std::collections::BTreeMap;

use log::debug;

use crate::content::{ContentClass, ContentSnapshot};
use crate::diff::ManifestDiff;
use crate::error::{Error, Result};
use crate::manifest::ManifestSnapshot;

/// One typed action against one repository.
///
/// `New*Project` carries the split by classification that decides the
/// revision-assignment strategy downstream; `Change*` mark individual field
/// edits and may stack on the same repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    NewSourceProject,
    NewDataProject,
    NewOtherProject,
    ChangePath,
    ChangeUrl,
    ChangeRevision,
    ChangeGroups,
    ChangeContentClass,
    ChangeCommand,
}

/// Repository name -> ordered action list for one reconciliation pass.
pub type ActionPlan = BTreeMap<String, Vec<ActionKind>>;

/// The `New*Project` action for a repository of the given class.
pub fn new_project_action(class: ContentClass) -> ActionKind {
    match class {
        ContentClass::Source => ActionKind::NewSourceProject,
        ContentClass::Data => ActionKind::NewDataProject,
        _ => ActionKind::NewOtherProject,
    }
}

/// Classify every added or changed repository of `diff` into actions.
///
/// Removed names get no action; deletions are handled separately by the
/// lifecycle engine. A name with no classification in the proposed content
/// manifest is a consistency fault (it should have been caught by the
/// name-symmetry guard already).
pub fn classify(
    diff: &ManifestDiff,
    old_manifest: &ManifestSnapshot,
    old_content: &ContentSnapshot,
    new_manifest: &ManifestSnapshot,
    new_content: &ContentSnapshot,
) -> Result<ActionPlan> {
    let mut plan = ActionPlan::new();

    for name in &diff.added {
        let class = new_content
            .class_of(name)
            .ok_or_else(|| Error::MissingClassification { name: name.clone() })?;
        debug!("classify: {} is new, class {}", name, class);
        plan.insert(name.clone(), vec![new_project_action(class)]);
    }

    for name in &diff.changed {
        let new_desc = new_manifest
            .lookup(name)
            .ok_or_else(|| Error::MissingClassification { name: name.clone() })?;
        let old_desc = match old_manifest.lookup(name) {
            Some(d) => d,
            None => continue,
        };
        let new_class = new_content
            .class_of(name)
            .ok_or_else(|| Error::MissingClassification { name: name.clone() })?;

        let mut actions = Vec::new();

        if old_content.class_of(name) != Some(new_class) {
            debug!(
                "classify: {} classification changed to {}",
                name, new_class
            );
            actions.push(ActionKind::ChangeContentClass);
        }
        if old_desc.url != new_desc.url {
            debug!("classify: {} url changed", name);
            actions.push(ActionKind::ChangeUrl);
        }
        // revision differences are user edits only on command repositories;
        // everywhere else they are policy outcomes and deliberately ignored
        if new_desc.is_command_repo() && old_desc.revision != new_desc.revision {
            debug!("classify: {} command revision changed", name);
            actions.push(ActionKind::ChangeRevision);
        }
        if old_desc.groups_set() != new_desc.groups_set() {
            debug!("classify: {} groups changed", name);
            actions.push(ActionKind::ChangeGroups);
        }
        if old_desc.path != new_desc.path {
            debug!("classify: {} path changed", name);
            actions.push(ActionKind::ChangePath);
        }
        if old_desc.commands != new_desc.commands {
            debug!("classify: {} commands entry changed", name);
            actions.push(ActionKind::ChangeCommand);
        }

        if !actions.is_empty() {
            plan.insert(name.clone(), actions);
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff;
    use crate::manifest::RepositoryDescriptor;

    fn descriptor(name: &str) -> RepositoryDescriptor {
        RepositoryDescriptor {
            name: name.to_string(),
            url: format!("https://git.example.com/fleet/{}.git", name),
            path: None,
            revision: "main".to_string(),
            clone_depth: None,
            groups: vec![],
            commands: None,
        }
    }

    fn pair(
        descriptors: Vec<RepositoryDescriptor>,
        classes: &[(&str, ContentClass)],
    ) -> (ManifestSnapshot, ContentSnapshot) {
        let manifest = ManifestSnapshot {
            repositories: descriptors,
        };
        let mut content = ContentSnapshot::default();
        for (name, class) in classes {
            content.set_class(name, *class);
        }
        (manifest, content)
    }

    fn run_classify(
        old: &(ManifestSnapshot, ContentSnapshot),
        new: &(ManifestSnapshot, ContentSnapshot),
    ) -> ActionPlan {
        let d = diff::diff(&old.0, &new.0).unwrap();
        classify(&d, &old.0, &old.1, &new.0, &new.1).unwrap()
    }

    #[test]
    fn test_new_repo_action_chosen_by_class() {
        let old = pair(vec![], &[]);
        for (class, expected) in [
            (ContentClass::Source, ActionKind::NewSourceProject),
            (ContentClass::Data, ActionKind::NewDataProject),
            (ContentClass::External, ActionKind::NewOtherProject),
            (ContentClass::AllProjects, ActionKind::NewOtherProject),
            (ContentClass::Commands, ActionKind::NewOtherProject),
        ] {
            let new = pair(vec![descriptor("fresh")], &[("fresh", class)]);
            let plan = run_classify(&old, &new);
            assert_eq!(plan["fresh"], vec![expected], "class {}", class);
        }
    }

    #[test]
    fn test_field_changes_stack() {
        let old = pair(
            vec![descriptor("app")],
            &[("app", ContentClass::Source)],
        );
        let mut moved = descriptor("app");
        moved.url = "https://elsewhere.example.com/app.git".to_string();
        moved.groups = vec!["firmware".to_string()];
        let new = pair(vec![moved], &[("app", ContentClass::Source)]);

        let plan = run_classify(&old, &new);
        assert_eq!(
            plan["app"],
            vec![ActionKind::ChangeUrl, ActionKind::ChangeGroups]
        );
    }

    #[test]
    fn test_class_change_detected() {
        let old = pair(vec![descriptor("app")], &[("app", ContentClass::Source)]);
        let new = pair(vec![descriptor("app")], &[("app", ContentClass::Data)]);
        // class lives only in the content manifest, so the dependency diff
        // alone sees nothing - feed the changed name explicitly
        let mut d = diff::diff(&old.0, &new.0).unwrap();
        d.changed.insert("app".to_string());
        d.unchanged.remove("app");
        let plan = classify(&d, &old.0, &old.1, &new.0, &new.1).unwrap();
        assert_eq!(plan["app"], vec![ActionKind::ChangeContentClass]);
    }

    #[test]
    fn test_revision_change_ignored_for_plain_repos() {
        let old = pair(vec![descriptor("app")], &[("app", ContentClass::Source)]);
        let mut new_desc = descriptor("app");
        new_desc.revision = "proj__1.0_dev".to_string();
        let new = pair(vec![new_desc], &[("app", ContentClass::Source)]);

        let plan = run_classify(&old, &new);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_revision_change_fires_for_command_repo() {
        let mut old_desc = descriptor("tools");
        old_desc.commands = Some("scripts/commands.yml".to_string());
        old_desc.revision = "v1.0".to_string();
        let mut new_desc = old_desc.clone();
        new_desc.revision = "v2.0".to_string();

        let old = pair(vec![old_desc], &[("tools", ContentClass::Commands)]);
        let new = pair(vec![new_desc], &[("tools", ContentClass::Commands)]);
        let plan = run_classify(&old, &new);
        assert_eq!(plan["tools"], vec![ActionKind::ChangeRevision]);
    }

    #[test]
    fn test_commands_entry_change_fires_change_command() {
        let old = pair(vec![descriptor("tools")], &[("tools", ContentClass::Commands)]);
        let mut new_desc = descriptor("tools");
        new_desc.commands = Some("scripts/commands.yml".to_string());
        let new = pair(vec![new_desc], &[("tools", ContentClass::Commands)]);

        let plan = run_classify(&old, &new);
        assert!(plan["tools"].contains(&ActionKind::ChangeCommand));
    }

    #[test]
    fn test_removed_names_get_no_action() {
        let old = pair(vec![descriptor("gone")], &[("gone", ContentClass::Data)]);
        let new = pair(vec![], &[]);
        let plan = run_classify(&old, &new);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_missing_classification_is_a_fault() {
        let old = pair(vec![], &[]);
        let new = pair(vec![descriptor("fresh")], &[]);
        let d = diff::diff(&old.0, &new.0).unwrap();
        let err = classify(&d, &old.0, &old.1, &new.0, &new.1).unwrap_err();
        assert!(matches!(err, Error::MissingClassification { name } if name == "fresh"));
    }

    #[test]
    fn test_group_reorder_is_not_a_group_change() {
        let mut old_desc = descriptor("app");
        old_desc.groups = vec!["a".to_string(), "b".to_string()];
        let mut new_desc = descriptor("app");
        new_desc.groups = vec!["b".to_string(), "a".to_string()];

        let old = pair(vec![old_desc], &[("app", ContentClass::Source)]);
        let new = pair(vec![new_desc], &[("app", ContentClass::Source)]);
        // the canonical diff sees the reorder; the classifier must not turn
        // it into a ChangeGroups
        let plan = run_classify(&old, &new);
        assert!(plan.get("app").map_or(true, |a| !a.contains(&ActionKind::ChangeGroups)));
    }
}
