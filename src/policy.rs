//! # Classification Decision Tables
//!
//! The two pure decision tables that drive every revision assignment and
//! merge-strategy choice in the fleet, centralized here so call sites never
//! re-derive them with ad-hoc conditionals and so they are testable as one
//! unit.

use crate::content::{ContentClass, MergePolicy};

/// How a repository's manifest revision is assigned on a maintained branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionStrategy {
    /// The repository forks a real branch and the manifest records the
    /// branch's own name.
    TrackBranch,
    /// The manifest records the commit id the reference revision resolves
    /// to remotely.
    PinCommit,
    /// The manifest copies the reference revision verbatim.
    CopyReference,
}

/// Revision-assignment strategy for a repository of `class` in a fleet with
/// merge policy `policy`.
pub fn revision_strategy(class: ContentClass, policy: MergePolicy) -> RevisionStrategy {
    match (class, policy) {
        (ContentClass::Data, _) => RevisionStrategy::TrackBranch,
        (ContentClass::Source, MergePolicy::SourceData) => RevisionStrategy::TrackBranch,
        (ContentClass::Source, MergePolicy::Data) => RevisionStrategy::PinCommit,
        (ContentClass::External, _)
        | (ContentClass::AllProjects, _)
        | (ContentClass::Commands, _) => RevisionStrategy::CopyReference,
    }
}

/// Whether a repository of `class` under `policy` must have a real branch of
/// the maintained branch's name.
pub fn forks_branch(class: ContentClass, policy: MergePolicy) -> bool {
    revision_strategy(class, policy) == RevisionStrategy::TrackBranch
}

/// How one repository is carried across a branch-to-branch merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Regular git merge of the origin's remote branch into the destination
    /// branch.
    Merge,
    /// Rewrite the destination manifest to the commit id the repository
    /// resolves to at the origin revision.
    PinFromOrigin,
    /// Copy the origin manifest's revision value verbatim into the
    /// destination manifest.
    CopyRevision,
}

/// Merge-strategy selection: a pure function of the destination class, the
/// destination fleet's policy and the origin fleet's policy.
pub fn merge_strategy(
    dest_class: ContentClass,
    dest_policy: MergePolicy,
    origin_policy: MergePolicy,
) -> MergeStrategy {
    match (dest_class, dest_policy, origin_policy) {
        (ContentClass::Data, _, _) => MergeStrategy::Merge,
        (ContentClass::Source, MergePolicy::SourceData, _) => MergeStrategy::Merge,
        (ContentClass::Source, MergePolicy::Data, MergePolicy::SourceData) => {
            MergeStrategy::PinFromOrigin
        }
        (ContentClass::Source, MergePolicy::Data, MergePolicy::Data) => {
            MergeStrategy::CopyRevision
        }
        (ContentClass::External, _, _)
        | (ContentClass::AllProjects, _, _)
        | (ContentClass::Commands, _, _) => MergeStrategy::CopyRevision,
    }
}
