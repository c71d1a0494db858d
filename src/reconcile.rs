//! # Reconciliation Driver
//!
//! Orchestrates the diff engine, the action classifier and the
//! branch-lifecycle engine across *all* maintained branches of the fleet:
//! a proposed manifest pair is diffed against the default branch, the
//! resulting plan is applied to the default branch and then to every
//! `{proj}__{ver}_{dev,integ,main}` branch of the manifest repository,
//! with cross-branch consistency warnings and default-branch
//! bootstrapping (a repository the default branch has and a maintained
//! branch lacks is synthesized into existence there).

use std::collections::BTreeSet;
use std::path::Path;

use crate::actions::{self, ActionPlan};
use crate::content::ContentSnapshot;
use crate::diff;
use crate::error::{Error, Result};
use crate::git::GitRepo;
use crate::manifest::ManifestSnapshot;
use crate::report::Reporter;
use crate::workspace::{Workspace, CONTENT_MANIFEST, DEPENDENCY_MANIFEST};

/// One literal field assignment to a named repository, applied across every
/// maintained branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEdit {
    pub repo: String,
    pub field: String,
    pub value: String,
}

/// Reconcile the whole fleet to a proposed manifest pair read from `folder`.
///
/// The proposed pair must be name-symmetric (fatal otherwise) and must
/// differ from the default branch's pair (fatal otherwise - an empty
/// reconciliation is a user error, not a no-op).
pub fn reconcile_from_dir(ws: &Workspace, folder: &Path, reporter: &mut Reporter) -> Result<()> {
    let (new_manifest, new_content) = Workspace::load_pair_from_dir(folder)?;
    diff::check_name_symmetry(&new_manifest, &new_content)?;

    let manifest_repo = ws.manifest_repo();
    manifest_repo.fetch_prune()?;
    let default_branch = manifest_repo.default_branch()?;
    reporter.info(format!("default branch: {}", default_branch));

    let (current_manifest, current_content) =
        ws.load_pair_at(&format!("origin/{}", default_branch))?;

    let mut manifest_diff = diff::diff(&current_manifest, &new_manifest)?;
    // classification moves live only in the content manifest; fold them
    // into the changed partition so the classifier sees them
    for name in new_content.fleet_names() {
        if manifest_diff.unchanged.contains(&name)
            && current_content.class_of(&name) != new_content.class_of(&name)
        {
            manifest_diff.unchanged.remove(&name);
            manifest_diff.changed.insert(name);
        }
    }
    reporter.debug(format!(
        "diff against {}: added {:?}, changed {:?}, removed {:?}",
        default_branch, manifest_diff.added, manifest_diff.changed, manifest_diff.removed
    ));

    let plan = actions::classify(
        &manifest_diff,
        &current_manifest,
        &current_content,
        &new_manifest,
        &new_content,
    )?;
    if plan.is_empty() && manifest_diff.removed.is_empty() {
        return Err(Error::NothingToUpdate);
    }

    clone_new_repositories(ws, &manifest_diff.added, &new_manifest, reporter);

    // the default branch simply receives the proposed documents verbatim
    reporter.mutate(format!(
        "commit proposed manifests to default branch {}",
        default_branch
    ));
    if !reporter.dry_run() {
        manifest_repo.checkout(&default_branch)?;
        let _ = manifest_repo.pull();
        ws.write_pair(&new_manifest, &new_content)?;
        manifest_repo.commit_paths(
            &[DEPENDENCY_MANIFEST, CONTENT_MANIFEST],
            &format!(
                "Automatic commit by the manifest command\n\nUpdate {} and {} on default branch {}",
                DEPENDENCY_MANIFEST, CONTENT_MANIFEST, default_branch
            ),
        )?;
        manifest_repo.push_branches(&[default_branch.as_str()])?;
    }

    let branches = manifest_repo.fleet_branches()?;
    reporter.info(format!("maintained branches: {:?}", branches));
    for branch in &branches {
        reporter.section(format!("branch {}", branch));
        let outcome = reconcile_branch(
            ws,
            branch,
            &current_manifest,
            &current_content,
            &new_manifest,
            &new_content,
            &plan,
            &manifest_diff.removed,
            reporter,
        );
        if let Err(err) = outcome {
            if err.is_fatal() {
                return Err(err);
            }
            reporter.skip(branch, err.to_string());
        }
    }

    Ok(())
}

/// Clone repositories that are new to the fleet into the workspace.
fn clone_new_repositories(
    ws: &Workspace,
    added: &BTreeSet<String>,
    new_manifest: &ManifestSnapshot,
    reporter: &mut Reporter,
) {
    for name in added {
        let Some(descriptor) = new_manifest.lookup(name) else {
            continue;
        };
        let target = ws.root().join(descriptor.checkout_path());
        if target.join(".git").exists() {
            reporter.debug(format!("{} already cloned", name));
            continue;
        }
        reporter.mutate(format!("clone {} into {}", descriptor.url, target.display()));
        if reporter.dry_run() {
            continue;
        }
        if let Err(err) = GitRepo::clone_from(
            name.clone(),
            &descriptor.url,
            &target,
            descriptor.clone_depth,
        ) {
            reporter.skip(name, err.to_string());
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn reconcile_branch(
    ws: &Workspace,
    branch: &str,
    default_manifest: &ManifestSnapshot,
    default_content: &ContentSnapshot,
    new_manifest: &ManifestSnapshot,
    new_content: &ContentSnapshot,
    plan: &ActionPlan,
    removals: &BTreeSet<String>,
    reporter: &mut Reporter,
) -> Result<()> {
    let manifest_repo = ws.manifest_repo();

    let (mut branch_manifest, mut branch_content) = if reporter.dry_run() {
        ws.load_pair_at(&format!("origin/{}", branch))?
    } else {
        manifest_repo.checkout(branch)?;
        let _ = manifest_repo.pull();
        ws.load_pair()?
    };

    // prune classifications orphaned from this branch's dependency manifest
    let branch_names = branch_manifest.fleet_names();
    let orphaned: Vec<String> = branch_content
        .fleet_names()
        .difference(&branch_names)
        .cloned()
        .collect();
    for orphan in orphaned {
        reporter.warn(format!(
            "{} is classified on branch {} but missing from its dependency manifest - dropping the classification",
            orphan, branch
        ));
        branch_content.remove(&orphan);
    }

    // cross-branch consistency is advisory: branches drift by design
    let default_names = default_manifest.fleet_names();
    if branch_names != default_names {
        reporter.warn(format!(
            "branch {} and the default branch track different repository sets",
            branch
        ));
    }

    // bootstrap: every maintained branch eventually carries every
    // non-deleted repository the default branch has
    let mut merged_plan = ActionPlan::new();
    for name in default_names {
        if removals.contains(&name) || branch_manifest.lookup(&name).is_some() {
            continue;
        }
        match default_content.class_of(&name) {
            Some(class) => {
                reporter.info(format!(
                    "{} exists on the default branch but not on {} - synthesizing an addition",
                    name, branch
                ));
                merged_plan.insert(name, vec![actions::new_project_action(class)]);
            }
            None => reporter.skip(&name, "no classification on the default branch"),
        }
    }
    // explicit user actions win over synthetic additions
    merged_plan.extend(plan.clone());

    crate::lifecycle::apply_actions(
        ws,
        branch,
        &mut branch_manifest,
        &mut branch_content,
        new_manifest,
        new_content,
        &merged_plan,
        removals,
        reporter,
    )?;

    reporter.mutate(format!("commit reconciled manifests on branch {}", branch));
    if !reporter.dry_run() {
        ws.write_pair(&branch_manifest, &branch_content)?;
        manifest_repo.commit_paths(
            &[DEPENDENCY_MANIFEST, CONTENT_MANIFEST],
            &format!(
                "Automatic commit by the manifest command\n\nReconcile branch {} with the proposed manifests",
                branch
            ),
        )?;
        manifest_repo.push_branches(&[branch])?;
    }

    Ok(())
}

/// Apply literal field assignments to named repositories across the default
/// branch and every maintained branch.
pub fn apply_field_edits(
    ws: &Workspace,
    edits: &[FieldEdit],
    reporter: &mut Reporter,
) -> Result<()> {
    if edits.is_empty() {
        return Err(Error::NothingToUpdate);
    }

    let manifest_repo = ws.manifest_repo();
    manifest_repo.fetch_prune()?;
    let default_branch = manifest_repo.default_branch()?;

    let mut branches = manifest_repo.fleet_branches()?;
    branches.push(default_branch);

    for branch in &branches {
        reporter.section(format!("branch {}", branch));

        let mut branch_manifest = if reporter.dry_run() {
            ws.load_pair_at(&format!("origin/{}", branch))?.0
        } else {
            manifest_repo.checkout(branch)?;
            let _ = manifest_repo.pull();
            ws.load_pair()?.0
        };

        let mut changed = false;
        for edit in edits {
            let Some(descriptor) = branch_manifest.lookup_mut(&edit.repo) else {
                reporter.skip(
                    &edit.repo,
                    format!("not present on branch {} - field edit dropped", branch),
                );
                continue;
            };
            match edit.field.as_str() {
                "revision" => descriptor.revision = edit.value.clone(),
                "url" => descriptor.url = edit.value.clone(),
                "path" => descriptor.path = Some(edit.value.clone()),
                "clone-depth" => match edit.value.parse::<u32>() {
                    Ok(depth) => descriptor.clone_depth = Some(depth),
                    Err(_) => {
                        reporter.warn(format!(
                            "clone-depth value {} for {} is not a number - ignored",
                            edit.value, edit.repo
                        ));
                        continue;
                    }
                },
                "groups" => {
                    descriptor.groups = edit
                        .value
                        .split(',')
                        .map(|g| g.trim().to_string())
                        .filter(|g| !g.is_empty())
                        .collect()
                }
                "commands" => descriptor.commands = Some(edit.value.clone()),
                other => {
                    reporter.warn(format!("unknown manifest field {} - ignored", other));
                    continue;
                }
            }
            reporter.info(format!(
                "set {}.{} = {} on branch {}",
                edit.repo, edit.field, edit.value, branch
            ));
            changed = true;
        }

        reporter.mutate(format!("commit field edits on branch {}", branch));
        if changed && !reporter.dry_run() {
            ws.write_dependency_manifest(&branch_manifest)?;
            manifest_repo.commit_paths(
                &[DEPENDENCY_MANIFEST],
                &format!(
                    "Automatic commit by the manifest command\n\nApply field edits on branch {}",
                    branch
                ),
            )?;
            manifest_repo.push_branches(&[branch])?;
        }
    }

    Ok(())
}
