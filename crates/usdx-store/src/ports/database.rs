//! # Versioned Database Port
//!
//! Outbound port for durable version storage. The registry owns all
//! versioning semantics; a database only persists and returns snapshots.

use std::sync::Arc;

use crate::domain::{CommitId, StoreError, StoreState};

/// One committed version as persisted.
#[derive(Debug, Clone)]
pub struct StoredVersion {
    pub commit: CommitId,
    pub state: Arc<StoreState>,
}

pub trait VersionedDatabase: Send + Sync {
    /// Highest persisted version, if any.
    fn latest_version(&self) -> Result<Option<u64>, StoreError>;

    fn load_version(&self, version: u64) -> Result<Option<StoredVersion>, StoreError>;

    fn save_version(&self, stored: StoredVersion) -> Result<(), StoreError>;

    /// Forget every version strictly below `version`.
    fn prune_before(&self, version: u64) -> Result<(), StoreError>;
}
