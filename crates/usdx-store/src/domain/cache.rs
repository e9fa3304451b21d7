//! # Cache Multi-Store
//!
//! Copy-on-write view over a committed [`StoreState`].
//!
//! ## Branching Model
//!
//! ```text
//! committed (Arc<StoreState>)
//!      └── block store (CacheMultiStore)
//!              ├── tx 1 branch ──ok──→ write_back()
//!              └── tx 2 branch ──err─→ dropped
//! ```
//!
//! A branch copies its parent's pending writes. `write_back` replaces the
//! parent's writes with the branch's, which is only meaningful while the
//! parent has not been written to since the branch was taken. Block
//! processing is sequential, so that holds by construction.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::errors::StoreError;
use super::key::{StoreKey, StoreKind};
use super::state::{ChangeSet, StoreState};

/// Mounted namespaces, shared by every view of one registry.
pub type MountTable = Arc<BTreeMap<String, StoreKind>>;

#[derive(Debug, Clone)]
pub struct CacheMultiStore {
    base: Arc<StoreState>,
    mounted: MountTable,
    writes: ChangeSet,
    read_only: bool,
}

impl CacheMultiStore {
    pub fn new(base: Arc<StoreState>, mounted: MountTable) -> Self {
        Self {
            base,
            mounted,
            writes: ChangeSet::new(),
            read_only: false,
        }
    }

    /// View whose writes fail with [`StoreError::ReadOnly`].
    pub fn read_only(base: Arc<StoreState>, mounted: MountTable) -> Self {
        Self {
            read_only: true,
            ..Self::new(base, mounted)
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn branch(&self) -> Self {
        self.clone()
    }

    /// Adopt the writes of a branch taken from `self`.
    pub fn write_back(&mut self, branch: CacheMultiStore) {
        self.writes = branch.writes;
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.writes
    }

    pub fn get(&self, key: &StoreKey, k: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_mounted(key)?;
        if let Some(pending) = self.writes.get(key.name()).and_then(|w| w.get(k)) {
            return Ok(pending.clone());
        }
        if key.is_transient() {
            return Ok(None);
        }
        Ok(self.base.get(key.name(), k).cloned())
    }

    pub fn has(&self, key: &StoreKey, k: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(key, k)?.is_some())
    }

    pub fn set(&mut self, key: &StoreKey, k: Vec<u8>, v: Vec<u8>) -> Result<(), StoreError> {
        self.check_writable(key)?;
        self.writes
            .entry(key.name().to_string())
            .or_default()
            .insert(k, Some(v));
        Ok(())
    }

    pub fn delete(&mut self, key: &StoreKey, k: &[u8]) -> Result<(), StoreError> {
        self.check_writable(key)?;
        self.writes
            .entry(key.name().to_string())
            .or_default()
            .insert(k.to_vec(), None);
        Ok(())
    }

    /// All live entries under `prefix`, in key byte order, with pending
    /// writes merged over committed ones.
    pub fn iter_prefix(
        &self,
        key: &StoreKey,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        self.check_mounted(key)?;
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
        if !key.is_transient() {
            if let Some(kv) = self.base.namespace(key.name()) {
                merged.extend(
                    kv.range(prefix.to_vec()..)
                        .take_while(|(k, _)| k.starts_with(prefix))
                        .map(|(k, v)| (k.clone(), v.clone())),
                );
            }
        }
        if let Some(writes) = self.writes.get(key.name()) {
            for (k, v) in writes
                .range(prefix.to_vec()..)
                .take_while(|(k, _)| k.starts_with(prefix))
            {
                match v {
                    Some(v) => {
                        merged.insert(k.clone(), v.clone());
                    }
                    None => {
                        merged.remove(k);
                    }
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    fn check_mounted(&self, key: &StoreKey) -> Result<(), StoreError> {
        match self.mounted.get(key.name()) {
            Some(kind) if *kind == key.kind() => Ok(()),
            _ => Err(StoreError::NotMounted(key.name().to_string())),
        }
    }

    fn check_writable(&self, key: &StoreKey) -> Result<(), StoreError> {
        self.check_mounted(key)?;
        if self.read_only {
            return Err(StoreError::ReadOnly(key.name().to_string()));
        }
        Ok(())
    }
}
