//! # Repo-Fleet Library
//!
//! This library manages a fleet of interdependent git repositories that
//! together form one versioned product. Two declarative documents live in a
//! dedicated manifest repository: the *dependency manifest* (`fleet.yml`,
//! one descriptor per repository) and the *content manifest*
//! (`content.yml`, one classification per repository plus the fleet-wide
//! merge policy). The library keeps both documents consistent with the
//! actual state of every repository and drives the branch-level operations
//! that make the `{proj}__{ver}_dev/_integ/_main` triple move as a unit.
//!
//! ## Core Concepts
//!
//! - **Manifest model (`manifest`, `content`)**: lossless, order-preserving
//!   in-memory snapshots of the two documents, with name-based lookup and
//!   value semantics.
//! - **Diff engine (`diff`)**: canonical comparable projections and the
//!   {added, changed, removed, unchanged} partition of two snapshots, plus
//!   the name-symmetry guard between the documents.
//! - **Action classifier (`actions`)**: maps a diff to typed per-repository
//!   actions.
//! - **Decision tables (`policy`)**: the pure (class x policy) tables that
//!   pick a revision-assignment strategy and a merge strategy.
//! - **Branch-lifecycle engine (`lifecycle`)**: applies actions to one
//!   maintained branch and implements fork, merge and fleet-tag.
//! - **Reconciliation driver (`reconcile`)**: runs diff -> classify ->
//!   apply across every maintained branch of the fleet.
//! - **Backend (`git`)**: the narrow git capability surface everything
//!   above consumes.
//!
//! ## Execution Flow
//!
//! A reconciliation pass is `diff` -> `classify` -> `apply` over one target
//! branch, strictly sequential per repository in manifest order, and
//! idempotent: re-running over a converged branch reports everything
//! unchanged and creates nothing.

pub mod actions;
pub mod branches;
pub mod content;
pub mod diff;
pub mod error;
pub mod git;
pub mod lifecycle;
pub mod manifest;
pub mod output;
pub mod policy;
pub mod reconcile;
pub mod report;
pub mod workspace;
