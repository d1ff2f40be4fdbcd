//! Warden-State: persistence layer for Buildwarden
//!
//! This crate owns the persisted record types (build reports, merged pull
//! requests, pending action sets) and the storage contracts the rest of the
//! system is written against.
//!
//! ## Key components
//!
//! - [`HistoryStore`]: durable record of build reports and merged-PR events,
//!   queried by branch/commit
//! - [`PendingActionStore`]: keyed persistence of action sets awaiting
//!   operator confirmation
//! - `fakes`: in-memory implementations (testing and single-process use)
//! - [`SurrealStore`]: SurrealDB-backed implementation of both contracts

mod error;
pub mod fakes;
mod migrations;
mod records;
pub mod storage_traits;
mod surreal;

pub use error::{StoreError, StoreResult};
pub use records::{
    short_commit, ActionKind, ActionSet, BuildReport, BuildStatus, Disposition,
    ProposedAction, PullRequestMergedEvent,
};
pub use storage_traits::{HistoryStore, PendingActionStore};
pub use surreal::SurrealStore;

/// Result type for warden-state operations
pub type Result<T> = std::result::Result<T, StoreError>;
