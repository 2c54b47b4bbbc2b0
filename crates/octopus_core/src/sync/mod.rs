//! Local-first synchronization between the cache and the remote store.
//!
//! # Responsibility
//! - Reconcile cached and remote entity sets by id (remote wins).
//! - Write-through creates and deletes: cache first, remote best-effort.
//!
//! # Invariants
//! - Reads never fail; an unreachable remote yields the cached snapshot.
//! - Every remote outcome is returned to the caller as a value.
//! - Deletes are not tombstoned; a surviving remote copy reappears on the
//!   next successful read.

mod merge;
mod synchronizer;

pub use merge::merge_by_id;
pub use synchronizer::{ReadSource, SyncRead, Synchronizer, WriteOutcome};
