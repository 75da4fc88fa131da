//! # Arbor Sync Engine
//!
//! The core of the Arbor content reconciliation system.
//!
//! This crate provides:
//! - [`TreeSyncEngine`]: a predicate-filtered, depth-first tree walker
//!   that converges a live content tree to serialized desired state
//! - [`ItemMergeEngine`]: structural plus field/version reconciliation of
//!   a single item
//! - [`RetryQueue`]: deferred replay of failures that a later part of the
//!   same run may resolve
//! - Consistency checking, inclusion oracles, the evaluator contract, and
//!   structured sync logging
//!
//! ## Key invariants
//!
//! - The serialized tree is always the intended target state
//! - Excluded nodes are skipped with justification; their children are
//!   never visited
//! - Skipped is not deleted, and errors never cause deletion
//! - Reconciliation is idempotent: a converged tree reloads with zero
//!   change notifications (binary payloads excepted, which are always
//!   rewritten)
//! - Only consistency violations abort a run; every other failure is
//!   isolated at the smallest scope that preserves sibling progress

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod consistency;
mod error;
mod evaluator;
mod loader;
mod logger;
mod merge;
mod oracle;
mod orphans;
mod retry;

pub use consistency::{ConsistencyChecker, DuplicateIdChecker};
pub use error::{SyncError, SyncResult};
pub use evaluator::{Evaluator, SerializedWinsEvaluator};
pub use loader::{LoadOutcome, SkipReason, TreeSyncEngine};
pub use logger::{SyncLogger, TracingLogger};
pub use merge::ItemMergeEngine;
pub use oracle::{FieldFilter, FieldOracle, Inclusion, InclusionOracle, IncludeAll, PathScopeOracle};
pub use orphans::OrphanSet;
pub use retry::{ItemFailure, PrerequisiteEntry, RetryQueue, TreeFailure};
