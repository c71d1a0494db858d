//! # Branch-Lifecycle Engine
//!
//! Applies classified actions to one maintained branch, and implements the
//! three fleet-level lifecycle operations built on top of that: forking a
//! new project (a dev/integ/main triple derived from a source revision),
//! merging one maintained branch into another, and snapshot-tagging the
//! whole fleet.
//!
//! Failure semantics throughout: backend failures from a single
//! repository's branch/tag/push operation are logged and the fleet-wide
//! loop continues; explicit precondition violations (origin missing,
//! destination already exists, local ahead of remote) are fatal and abort
//! before any further mutation.

use std::collections::BTreeSet;

use crate::actions::{ActionKind, ActionPlan};
use crate::branches::VersionTriple;
use crate::content::{ContentClass, ContentSnapshot, MergePolicy};
use crate::error::{Error, Result};
use crate::git::RevKind;
use crate::manifest::{ManifestSnapshot, MANIFEST_REPO};
use crate::policy::{merge_strategy, revision_strategy, MergeStrategy, RevisionStrategy};
use crate::report::Reporter;
use crate::workspace::{Workspace, CONTENT_MANIFEST, DEPENDENCY_MANIFEST};

/// What kind of project a fork produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectType {
    /// Changes only the data of the parent project; SOURCE repositories are
    /// pinned to the commit the source revision resolves to.
    Data,
    /// Changes data and source code; SOURCE repositories fork real branches
    /// alongside DATA repositories.
    SourceData,
}

impl ProjectType {
    pub fn merge_policy(self) -> MergePolicy {
        match self {
            ProjectType::Data => MergePolicy::Data,
            ProjectType::SourceData => MergePolicy::SourceData,
        }
    }
}

/// Apply deletions and a classified action plan to one maintained branch's
/// in-memory manifest pair.
///
/// Mutates the snapshots to the converged state and performs the backend
/// operations the actions require (branch materialization, sha
/// resolution). Persisting the snapshots is the caller's job.
#[allow(clippy::too_many_arguments)]
pub fn apply_actions(
    ws: &Workspace,
    branch: &str,
    branch_manifest: &mut ManifestSnapshot,
    branch_content: &mut ContentSnapshot,
    reference_manifest: &ManifestSnapshot,
    reference_content: &ContentSnapshot,
    plan: &ActionPlan,
    removals: &BTreeSet<String>,
    reporter: &mut Reporter,
) -> Result<()> {
    // deletions first, so a name being replaced cannot collide
    for name in removals {
        if branch_manifest.remove(name).is_some() {
            reporter.info(format!("removed {} from branch {}", name, branch));
        } else {
            // branches diverge over time; partial convergence beats a stop
            reporter.skip(
                name,
                format!("scheduled for deletion but absent on branch {}", branch),
            );
        }
        branch_content.remove(name);
    }

    for (name, action_list) in plan {
        let outcome = apply_repo_actions(
            ws,
            branch,
            name,
            action_list,
            branch_manifest,
            branch_content,
            reference_manifest,
            reference_content,
            reporter,
        );
        if let Err(err) = outcome {
            if err.is_fatal() {
                return Err(err);
            }
            reporter.skip(name, err.to_string());
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn apply_repo_actions(
    ws: &Workspace,
    branch: &str,
    name: &str,
    action_list: &[ActionKind],
    branch_manifest: &mut ManifestSnapshot,
    branch_content: &mut ContentSnapshot,
    reference_manifest: &ManifestSnapshot,
    reference_content: &ContentSnapshot,
    reporter: &mut Reporter,
) -> Result<()> {
    let policy = branch_content.policy();
    let reference_desc = match reference_manifest.lookup(name) {
        Some(desc) => desc.clone(),
        None => {
            reporter.skip(name, "absent from the reference manifest");
            return Ok(());
        }
    };
    // saved before any assignment can overwrite it
    let reference_rev = reference_desc.revision.clone();
    let new_class = match reference_content.class_of(name) {
        Some(class) => class,
        None => {
            reporter.skip(name, "no classification in the reference content manifest");
            return Ok(());
        }
    };

    let mut needs_fork = false;
    for action in action_list {
        reporter.debug(format!("{}: applying {:?} on branch {}", name, action, branch));
        match action {
            ActionKind::NewSourceProject
            | ActionKind::NewDataProject
            | ActionKind::NewOtherProject => {
                let mut fresh = reference_desc.clone();
                if *action == ActionKind::NewOtherProject {
                    // external/shared/commands repositories never fork and
                    // never pin differently from the reference
                    fresh.revision = reference_rev.clone();
                } else {
                    match revision_strategy(new_class, policy) {
                        RevisionStrategy::TrackBranch => {
                            fresh.revision = branch.to_string();
                            needs_fork = true;
                        }
                        RevisionStrategy::PinCommit => {
                            let repo = ws.repo_for(&fresh);
                            fresh.revision =
                                repo.resolve_commit(&format!("origin/{}", reference_rev))?;
                        }
                        RevisionStrategy::CopyReference => {
                            fresh.revision = reference_rev.clone();
                        }
                    }
                }
                reporter.info(format!(
                    "adding {} to branch {} with revision {}",
                    name, branch, fresh.revision
                ));
                branch_manifest.insert(fresh);
                branch_content.set_class(name, new_class);
            }

            ActionKind::ChangePath => match branch_manifest.lookup_mut(name) {
                Some(desc) => desc.path = reference_desc.path.clone(),
                None => {
                    reporter.skip(name, format!("not present on branch {}", branch));
                    return Ok(());
                }
            },
            ActionKind::ChangeUrl => match branch_manifest.lookup_mut(name) {
                Some(desc) => desc.url = reference_desc.url.clone(),
                None => {
                    reporter.skip(name, format!("not present on branch {}", branch));
                    return Ok(());
                }
            },
            ActionKind::ChangeGroups => match branch_manifest.lookup_mut(name) {
                Some(desc) => desc.groups = reference_desc.groups.clone(),
                None => {
                    reporter.skip(name, format!("not present on branch {}", branch));
                    return Ok(());
                }
            },

            ActionKind::ChangeRevision | ActionKind::ChangeCommand => {
                if new_class != ContentClass::Commands {
                    reporter.warn(format!(
                        "{:?} for {} refused: new classification is {}, not COMMANDS",
                        action, name, new_class
                    ));
                    continue;
                }
                match branch_manifest.lookup_mut(name) {
                    Some(desc) => {
                        desc.revision = reference_rev.clone();
                        desc.commands = reference_desc.commands.clone();
                        branch_content.set_class(name, new_class);
                    }
                    None => {
                        reporter.skip(name, format!("not present on branch {}", branch));
                        return Ok(());
                    }
                }
            }

            ActionKind::ChangeContentClass => {
                branch_content.set_class(name, new_class);
                let current = match branch_manifest.lookup(name) {
                    Some(desc) => desc.clone(),
                    None => {
                        reporter.skip(name, format!("not present on branch {}", branch));
                        return Ok(());
                    }
                };
                let revision = match revision_strategy(new_class, policy) {
                    RevisionStrategy::TrackBranch => {
                        needs_fork = true;
                        branch.to_string()
                    }
                    RevisionStrategy::PinCommit => {
                        let repo = ws.repo_for(&current);
                        repo.resolve_commit(&format!("origin/{}", reference_rev))?
                    }
                    RevisionStrategy::CopyReference => reference_rev.clone(),
                };
                if let Some(desc) = branch_manifest.lookup_mut(name) {
                    desc.revision = revision;
                }
            }
        }
    }

    if needs_fork {
        if let Some(desc) = branch_manifest.lookup(name) {
            let desc = desc.clone();
            ensure_branch(ws, branch, &desc, &reference_rev, reporter)?;
        }
    }

    Ok(())
}

/// Make sure a real branch of the maintained branch's name exists in the
/// repository, creating it from the reference revision. Idempotent: an
/// existing remote branch is left alone.
fn ensure_branch(
    ws: &Workspace,
    branch: &str,
    descriptor: &crate::manifest::RepositoryDescriptor,
    reference_rev: &str,
    reporter: &mut Reporter,
) -> Result<()> {
    let repo = ws.repo_for(descriptor);
    if repo.branch_exists(branch, true)? {
        reporter.info(format!(
            "branch {} already exists in {} - skipping creation",
            branch,
            repo.name()
        ));
        return Ok(());
    }
    reporter.mutate(format!(
        "create branch {} in {} from origin/{}",
        branch,
        repo.name(),
        reference_rev
    ));
    if !reporter.dry_run() {
        repo.create_branch(branch, &format!("origin/{}", reference_rev))?;
        repo.push_branches(&[branch])?;
    }
    Ok(())
}

/// Fork a new project: derive the destination version triple from a source
/// revision and commit the three derived manifest pairs to three new
/// manifest-repository branches.
///
/// Preconditions, all fatal: the source revision must resolve; the
/// destination dev branch must not already exist remotely, neither in the
/// manifest repository nor in any repository that forks.
pub fn fork_project(
    ws: &Workspace,
    source_rev: &str,
    dest_project: &str,
    dest_version: &str,
    project_type: ProjectType,
    command_name: &str,
    reporter: &mut Reporter,
) -> Result<VersionTriple> {
    let triple = VersionTriple::new(dest_project, dest_version);
    let manifest_repo = ws.manifest_repo();

    manifest_repo.fetch_prune()?;
    if !reporter.dry_run() {
        manifest_repo.delete_local_branches(&triple.as_array())?;
    }

    let kind = manifest_repo
        .rev_kind(source_rev)?
        .ok_or_else(|| Error::RevisionUnresolved {
            repo: MANIFEST_REPO.to_string(),
            revision: source_rev.to_string(),
        })?;
    let reference_ref = kind.reference_ref(source_rev);
    reporter.debug(format!(
        "source revision {} is {:?}, reading manifests at {}",
        source_rev, kind, reference_ref
    ));

    if manifest_repo.branch_exists(&triple.dev, true)? {
        return Err(Error::BranchExists {
            repo: MANIFEST_REPO.to_string(),
            branch: triple.dev.clone(),
        });
    }

    let (source_manifest, source_content) = ws.load_pair_at(&reference_ref)?;

    let mut dev_manifest = source_manifest.clone();
    let mut integ_manifest = source_manifest.clone();
    let mut main_manifest = source_manifest.clone();

    for descriptor in &source_manifest.repositories {
        let name = &descriptor.name;
        if name == MANIFEST_REPO {
            continue;
        }
        reporter.section(name);

        let repo = ws.repo_for(descriptor);
        if !repo.is_cloned() {
            reporter.skip(name, "not cloned into the workspace");
            continue;
        }
        let class = match source_content.class_of(name) {
            Some(class) => class,
            None => {
                // fork must never invent a strategy for an unclassified repo
                return Err(Error::MissingClassification { name: name.clone() });
            }
        };

        match class {
            ContentClass::Commands => {
                reporter.debug(format!("{} provides commands - left untouched", name));
            }
            ContentClass::External | ContentClass::AllProjects => {
                // revision already carried verbatim by deriving from the
                // source manifest
                reporter.debug(format!(
                    "{} is {} - revision {} copied from source",
                    name, class, descriptor.revision
                ));
            }
            ContentClass::Source if project_type == ProjectType::Data => {
                repo.fetch_prune()?;
                let sha = repo.resolve_commit(&reference_ref)?;
                reporter.info(format!("pinning {} to {} in all three manifests", name, sha));
                for manifest in [&mut dev_manifest, &mut integ_manifest, &mut main_manifest] {
                    if let Some(entry) = manifest.lookup_mut(name) {
                        entry.revision = sha.clone();
                    }
                }
            }
            ContentClass::Data | ContentClass::Source => {
                repo.fetch_prune()?;

                if repo.rev_kind(source_rev)?.is_none() {
                    return Err(Error::BranchMissing {
                        repo: name.clone(),
                        branch: source_rev.to_string(),
                    });
                }
                if repo.branch_exists(&triple.dev, true)? {
                    return Err(Error::BranchExists {
                        repo: name.clone(),
                        branch: triple.dev.clone(),
                    });
                }

                reporter.mutate(format!(
                    "create branches {}, {} and {} in {} from {}",
                    triple.dev, triple.integ, triple.main, name, reference_ref
                ));
                if !reporter.dry_run() {
                    repo.delete_local_branches(&triple.as_array())?;
                    for branch in triple.as_array() {
                        repo.create_branch(branch, &reference_ref)?;
                    }
                    repo.push_branches(&triple.as_array())?;
                }

                for (manifest, branch) in [
                    (&mut dev_manifest, &triple.dev),
                    (&mut integ_manifest, &triple.integ),
                    (&mut main_manifest, &triple.main),
                ] {
                    if let Some(entry) = manifest.lookup_mut(name) {
                        entry.revision = branch.clone();
                    }
                }
            }
        }
    }

    let mut dest_content = source_content.clone();
    dest_content.fleet.merge_policy = project_type.merge_policy();

    commit_triple_manifests(
        ws,
        &triple,
        [&dev_manifest, &integ_manifest, &main_manifest],
        &dest_content,
        command_name,
        reporter,
    )?;

    Ok(triple)
}

/// Commit the three derived manifest pairs to three new branches of the
/// manifest repository, each created from the remote default branch.
fn commit_triple_manifests(
    ws: &Workspace,
    triple: &VersionTriple,
    manifests: [&ManifestSnapshot; 3],
    content: &ContentSnapshot,
    command_name: &str,
    reporter: &mut Reporter,
) -> Result<()> {
    let manifest_repo = ws.manifest_repo();
    manifest_repo.fetch_prune()?;
    let default_branch = manifest_repo.default_branch()?;

    for (branch, manifest) in triple.as_array().into_iter().zip(manifests) {
        reporter.mutate(format!("create manifest branch {} and commit manifests", branch));
        if reporter.dry_run() {
            continue;
        }
        if !manifest_repo.branch_exists(branch, false)? {
            manifest_repo.create_branch(branch, &format!("origin/{}", default_branch))?;
        }
        manifest_repo.checkout(branch)?;
        ws.write_pair(manifest, content)?;
        manifest_repo.commit_paths(
            &[DEPENDENCY_MANIFEST, CONTENT_MANIFEST],
            &format!(
                "Automatic commit by the {} command\n\nSet {} to the {} branches",
                command_name, DEPENDENCY_MANIFEST, branch
            ),
        )?;
        manifest_repo.push_branches(&[branch])?;
    }
    Ok(())
}

/// Repository/class scoping and extra merge flags for a merge pass.
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Restrict the pass to these repository names or class names
    /// (`DATA`, `SOURCE`, ...). Empty means everything.
    pub only: Vec<String>,
    /// Extra `git merge` flags keyed by repository name or class name.
    pub extra_flags: Vec<(String, String)>,
}

impl MergeOptions {
    fn selects(&self, name: &str, class: ContentClass) -> bool {
        self.only.is_empty()
            || self.only.iter().any(|t| t == name || *t == class.to_string())
    }

    fn flags_for(&self, name: &str, class: ContentClass) -> Vec<String> {
        self.extra_flags
            .iter()
            .filter(|(key, _)| key == name || *key == class.to_string())
            .map(|(_, flags)| flags.clone())
            .collect()
    }
}

/// Merge one maintained branch into another across the whole fleet.
///
/// Per repository, exactly one of three strategies applies, selected by the
/// destination class and the two fleets' merge policies. The destination
/// manifest is rewritten and committed only when a pin or copy changed it;
/// nothing is ever pushed - that is left to the operator after conflict
/// review.
pub fn merge_branches(
    ws: &Workspace,
    branch_from: &str,
    branch_to: &str,
    options: &MergeOptions,
    reporter: &mut Reporter,
) -> Result<()> {
    if branch_from == branch_to {
        return Err(Error::SameBranch {
            branch: branch_to.to_string(),
        });
    }

    let manifest_repo = ws.manifest_repo();
    manifest_repo.fetch_prune()?;
    manifest_repo.fetch_tags()?;

    // branches read through the remote-tracking ref; a tag by its tag ref
    let remote_from = match manifest_repo.rev_kind(branch_from)? {
        Some(RevKind::Tag) => format!("refs/tags/{}", branch_from),
        _ => format!("origin/{}", branch_from),
    };

    let dest_ref = if reporter.dry_run() {
        // decisions only - read the destination through its remote ref
        format!("origin/{}", branch_to)
    } else {
        manifest_repo.checkout(branch_to)?;
        let ahead = manifest_repo.ahead_of_remote(Some(branch_to))?;
        if ahead > 0 {
            return Err(Error::AheadOfRemote {
                repo: MANIFEST_REPO.to_string(),
                branch: branch_to.to_string(),
                count: ahead,
            });
        }
        let _ = manifest_repo.pull();
        branch_to.to_string()
    };

    let (mut dest_manifest, dest_content) = ws.load_pair_at(&dest_ref)?;
    let (origin_manifest, origin_content) = ws.load_pair_at(&remote_from)?;
    let dest_policy = dest_content.policy();
    let origin_policy = origin_content.policy();
    reporter.info(format!(
        "merge policies: destination {} origin {}",
        dest_policy, origin_policy
    ));

    let mut manifest_changed = false;
    let descriptors = dest_manifest.repositories.clone();
    for descriptor in &descriptors {
        let name = &descriptor.name;
        if name == MANIFEST_REPO {
            continue;
        }
        reporter.section(name);

        let class = match dest_content.class_of(name) {
            Some(class) => class,
            None => {
                reporter.skip(name, "no classification on the destination branch");
                continue;
            }
        };
        if class == ContentClass::Commands {
            reporter.debug(format!("{} provides commands - left untouched", name));
            continue;
        }
        if !options.selects(name, class) {
            reporter.info(format!("{} filtered out of this merge", name));
            continue;
        }

        let outcome = merge_one_repo(
            ws,
            descriptor,
            class,
            branch_from,
            branch_to,
            &remote_from,
            dest_policy,
            origin_policy,
            &origin_manifest,
            &mut dest_manifest,
            &options.flags_for(name, class),
            reporter,
        );
        match outcome {
            Ok(changed) => manifest_changed |= changed,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => reporter.skip(name, err.to_string()),
        }
    }

    if manifest_changed {
        reporter.mutate(format!(
            "rewrite and commit {} on branch {}",
            DEPENDENCY_MANIFEST, branch_to
        ));
        if !reporter.dry_run() {
            ws.write_dependency_manifest(&dest_manifest)?;
            manifest_repo.commit_all(&format!(
                "Automatic commit by the merge command\n\nUpdate {} from {} into {}",
                DEPENDENCY_MANIFEST, branch_from, branch_to
            ))?;
        }
    } else {
        reporter.info("no manifest revision changed - nothing to commit");
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn merge_one_repo(
    ws: &Workspace,
    descriptor: &crate::manifest::RepositoryDescriptor,
    class: ContentClass,
    branch_from: &str,
    branch_to: &str,
    remote_from: &str,
    dest_policy: MergePolicy,
    origin_policy: MergePolicy,
    origin_manifest: &ManifestSnapshot,
    dest_manifest: &mut ManifestSnapshot,
    extra_flags: &[String],
    reporter: &mut Reporter,
) -> Result<bool> {
    let name = &descriptor.name;
    let repo = ws.repo_for(descriptor);
    if !repo.is_cloned() {
        reporter.skip(name, "not cloned into the workspace");
        return Ok(false);
    }
    let unshallow = repo.is_shallow().unwrap_or(false);
    repo.fetch_all(unshallow)?;

    match merge_strategy(class, dest_policy, origin_policy) {
        MergeStrategy::Merge => {
            if !repo.branch_exists(branch_from, true)? {
                return Err(Error::BranchMissing {
                    repo: name.clone(),
                    branch: branch_from.to_string(),
                });
            }
            if !repo.branch_exists(branch_to, true)? {
                return Err(Error::BranchMissing {
                    repo: name.clone(),
                    branch: branch_to.to_string(),
                });
            }
            reporter.mutate(format!(
                "merge {} into {} in {}",
                remote_from, branch_to, name
            ));
            if !reporter.dry_run() {
                repo.checkout(branch_to)?;
                if repo.branch_exists(branch_to, false)? {
                    let _ = repo.pull();
                }
                let clean = repo.merge(remote_from, extra_flags)?;
                if !clean {
                    reporter.warn(format!(
                        "merge left conflicts in {} - resolve them and push manually",
                        name
                    ));
                }
            }
            Ok(false)
        }

        MergeStrategy::PinFromOrigin => {
            let sha = repo.resolve_commit(remote_from)?;
            let current = dest_manifest
                .lookup(name)
                .map(|d| d.revision.clone())
                .unwrap_or_default();
            if current == sha {
                reporter.debug(format!("{} already pinned to {}", name, sha));
                return Ok(false);
            }
            reporter.mutate(format!("pin {} to {} and force-checkout", name, sha));
            if let Some(entry) = dest_manifest.lookup_mut(name) {
                entry.revision = sha.clone();
            }
            if !reporter.dry_run() {
                repo.checkout_force(&sha)?;
            }
            Ok(true)
        }

        MergeStrategy::CopyRevision => {
            let origin_rev = match origin_manifest.lookup(name) {
                Some(entry) => entry.revision.clone(),
                None => {
                    reporter.skip(name, format!("absent from the {} manifest", branch_from));
                    return Ok(false);
                }
            };
            let current = dest_manifest
                .lookup(name)
                .map(|d| d.revision.clone())
                .unwrap_or_default();
            if current == origin_rev {
                reporter.debug(format!("{} revision unchanged ({})", name, origin_rev));
                return Ok(false);
            }
            reporter.mutate(format!(
                "copy revision {} into {} and force-checkout",
                origin_rev, name
            ));
            if let Some(entry) = dest_manifest.lookup_mut(name) {
                entry.revision = origin_rev.clone();
            }
            if !reporter.dry_run() {
                repo.checkout_force(&origin_rev)?;
            }
            Ok(true)
        }
    }
}

/// Snapshot-tag the whole fleet.
///
/// Derives one tag name from the manifest repository's current identity
/// plus the caller's suffix, force-tags and force-pushes every repository
/// except the manifest and `COMMANDS`/`EXTERNAL` classes, records the tag
/// as each repository's revision in the dependency manifest and commits
/// that manifest under the tag. When the manifest repository was on a
/// branch, the pre-tag manifest content is committed back on top so the
/// branch tip is restored while the tag preserves the frozen snapshot.
pub fn tag_fleet(
    ws: &Workspace,
    suffix: &str,
    user_message: Option<&str>,
    reporter: &mut Reporter,
) -> Result<String> {
    let manifest_repo = ws.manifest_repo();
    let _ = manifest_repo.pull();

    let (identity, head_kind) = manifest_repo.current_identity()?;
    let tag_name = format!("fleet-tag_{}-{}__{}", head_kind.marker(), identity, suffix);
    reporter.info(format!("tag name: {}", tag_name));

    let message = match user_message {
        Some(text) if !text.is_empty() => {
            format!("Created by the tag command\n\nUser message: {}", text)
        }
        _ => "NO USER MESSAGE".to_string(),
    };

    let original_manifest = manifest_repo.read_file_at(DEPENDENCY_MANIFEST, "HEAD")?;
    let (mut working_manifest, content) = ws.load_pair()?;

    let descriptors = working_manifest.repositories.clone();
    for descriptor in &descriptors {
        let name = &descriptor.name;
        if name == MANIFEST_REPO {
            continue;
        }
        reporter.section(name);
        let class = match content.class_of(name) {
            Some(class) => class,
            None => {
                reporter.skip(name, "no classification");
                continue;
            }
        };
        if class == ContentClass::Commands || class == ContentClass::External {
            reporter.debug(format!("{} is {} - no fleet tag", name, class));
            continue;
        }
        let repo = ws.repo_for(descriptor);
        if !repo.is_cloned() {
            reporter.skip(name, "not cloned into the workspace");
            continue;
        }

        reporter.mutate(format!("tag {} with {}", name, tag_name));
        if !reporter.dry_run() {
            let tagged = repo
                .tag_annotated(&tag_name, &message, true)
                .and_then(|_| repo.push_tag(&tag_name, true));
            if let Err(err) = tagged {
                reporter.skip(name, err.to_string());
                continue;
            }
        }
        if let Some(entry) = working_manifest.lookup_mut(name) {
            entry.revision = tag_name.clone();
        }
    }

    reporter.mutate(format!(
        "commit {} under tag {} and restore the branch tip",
        DEPENDENCY_MANIFEST, tag_name
    ));
    if reporter.dry_run() {
        return Ok(tag_name);
    }

    ws.write_dependency_manifest(&working_manifest)?;
    manifest_repo.commit_all(&format!(
        "Automatic commit by the tag command\n\nSet {} to tag {}",
        DEPENDENCY_MANIFEST, tag_name
    ))?;
    manifest_repo.tag_annotated(&tag_name, &message, true)?;

    if head_kind == crate::git::HeadKind::Branch {
        // the tag freezes the snapshot; the branch itself must not move
        ws.write_dependency_manifest_raw(&original_manifest)?;
        manifest_repo.commit_all(&format!(
            "Automatic commit by the tag command\n\nRestore pre-tag {} after creating {}",
            DEPENDENCY_MANIFEST, tag_name
        ))?;
    }

    manifest_repo.push_tag(&tag_name, true)?;
    let _ = manifest_repo.push();
    manifest_repo.checkout(&tag_name)?;

    Ok(tag_name)
}
