use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::domain::StoreError;
use crate::ports::{StoredVersion, VersionedDatabase};

/// In-memory implementation of VersionedDatabase.
///
/// Shared between registry instances through `Arc` to model a restart over
/// the same on-disk data.
#[derive(Debug, Default)]
pub struct InMemoryVersionedDb {
    versions: RwLock<BTreeMap<u64, StoredVersion>>,
}

impl InMemoryVersionedDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn versions(&self) -> Vec<u64> {
        self.versions.read().keys().copied().collect()
    }
}

impl VersionedDatabase for InMemoryVersionedDb {
    fn latest_version(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.versions.read().keys().next_back().copied())
    }

    fn load_version(&self, version: u64) -> Result<Option<StoredVersion>, StoreError> {
        Ok(self.versions.read().get(&version).cloned())
    }

    fn save_version(&self, stored: StoredVersion) -> Result<(), StoreError> {
        self.versions.write().insert(stored.commit.version, stored);
        Ok(())
    }

    fn prune_before(&self, version: u64) -> Result<(), StoreError> {
        self.versions.write().retain(|v, _| *v >= version);
        Ok(())
    }
}
