//! # Store Registry
//!
//! Owns the mount table, the committed version chain and the retained
//! snapshots.
//!
//! ## Lifecycle
//!
//! ```text
//! new(db) → mount(keys)* → load_latest(main) → [deliver_store() → commit()]*
//! ```
//!
//! Mounting is closed once `load_latest` runs. Every commit produces version
//! `last + 1` (or `0` on an empty database), drops transient namespaces and
//! keeps the last `keep_recent` versions readable through [`SnapshotReader`].

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info, instrument};

use crate::domain::{
    CacheMultiStore, CommitId, MountTable, StoreError, StoreKey, StoreKind, StoreState,
};
use crate::ports::{StoredVersion, VersionedDatabase};

/// Versions kept readable for historical queries when not configured.
pub const DEFAULT_KEEP_RECENT: u64 = 100;

#[derive(Debug, Default)]
struct SnapshotIndex {
    versions: BTreeMap<u64, Arc<StoreState>>,
    latest: Option<CommitId>,
}

/// Cloneable read access to committed versions.
///
/// Safe to move to other threads; it never observes uncommitted writes.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    index: Arc<RwLock<SnapshotIndex>>,
    mounted: MountTable,
}

impl SnapshotReader {
    pub fn latest(&self) -> Option<CommitId> {
        self.index.read().latest
    }

    /// Read-only view of `height`, or of the latest version for `None`.
    pub fn at(&self, height: Option<u64>) -> Result<CacheMultiStore, StoreError> {
        let index = self.index.read();
        let version = match height {
            Some(h) => h,
            None => index.latest.map(|c| c.version).ok_or(StoreError::NotLoaded)?,
        };
        let state = index
            .versions
            .get(&version)
            .cloned()
            .ok_or(StoreError::VersionNotFound(version))?;
        Ok(CacheMultiStore::read_only(state, self.mounted.clone()))
    }

    /// Retained versions, oldest first.
    pub fn versions(&self) -> Vec<u64> {
        self.index.read().versions.keys().copied().collect()
    }
}

pub struct StoreRegistry {
    db: Arc<dyn VersionedDatabase>,
    mounted: BTreeMap<String, StoreKind>,
    table: MountTable,
    keep_recent: u64,
    loaded: bool,
    current: Arc<StoreState>,
    last_commit: Option<CommitId>,
    index: Arc<RwLock<SnapshotIndex>>,
}

impl StoreRegistry {
    pub fn new(db: Arc<dyn VersionedDatabase>) -> Self {
        Self {
            db,
            mounted: BTreeMap::new(),
            table: Arc::new(BTreeMap::new()),
            keep_recent: DEFAULT_KEEP_RECENT,
            loaded: false,
            current: Arc::new(StoreState::new()),
            last_commit: None,
            index: Arc::new(RwLock::new(SnapshotIndex::default())),
        }
    }

    /// Number of committed versions to retain; at least one.
    pub fn with_keep_recent(mut self, keep_recent: u64) -> Self {
        self.keep_recent = keep_recent.max(1);
        self
    }

    pub fn keep_recent(&self) -> u64 {
        self.keep_recent
    }

    /// Mount every key, or none of them.
    pub fn mount(&mut self, keys: &[StoreKey]) -> Result<(), StoreError> {
        if self.loaded {
            return Err(StoreError::MountAfterLoad);
        }
        let mut staged = self.mounted.clone();
        for key in keys {
            if staged.insert(key.name().to_string(), key.kind()).is_some() {
                return Err(StoreError::DuplicateKey(key.name().to_string()));
            }
        }
        for key in keys {
            debug!("[Store] mounted {} ({:?})", key, key.kind());
        }
        self.mounted = staged;
        self.table = Arc::new(self.mounted.clone());
        Ok(())
    }

    pub fn is_mounted(&self, key: &StoreKey) -> bool {
        self.mounted.get(key.name()) == Some(&key.kind())
    }

    /// Open the most recent committed version and the retained ones before
    /// it. Every opened version is re-hashed and checked.
    #[instrument(skip(self), fields(main = %main_key))]
    pub fn load_latest(&mut self, main_key: &StoreKey) -> Result<Option<CommitId>, StoreError> {
        if self.loaded {
            return Err(StoreError::AlreadyLoaded);
        }
        if main_key.is_transient() || !self.is_mounted(main_key) {
            return Err(StoreError::MainKeyNotMounted(main_key.name().to_string()));
        }

        let latest = match self.db.latest_version()? {
            Some(v) => v,
            None => {
                info!("[Store] empty database, no committed version");
                self.loaded = true;
                return Ok(None);
            }
        };

        let first = (latest + 1).saturating_sub(self.keep_recent);
        let mut versions = BTreeMap::new();
        for version in first..=latest {
            match self.db.load_version(version)? {
                Some(stored) => {
                    self.verify(version, &stored)?;
                    versions.insert(version, stored.state);
                }
                None if version == latest => {
                    return Err(StoreError::Corrupt {
                        version,
                        reason: "latest version unreadable".to_string(),
                    });
                }
                None => {}
            }
        }

        let state = versions.get(&latest).cloned().ok_or(StoreError::Corrupt {
            version: latest,
            reason: "latest version unreadable".to_string(),
        })?;
        let commit = CommitId {
            version: latest,
            hash: state.hash(),
        };

        {
            let mut index = self.index.write();
            index.versions = versions;
            index.latest = Some(commit);
        }
        self.current = state;
        self.last_commit = Some(commit);
        self.loaded = true;
        info!("[Store] loaded version {}", commit);
        Ok(Some(commit))
    }

    fn verify(&self, version: u64, stored: &StoredVersion) -> Result<(), StoreError> {
        if stored.commit.version != version {
            return Err(StoreError::Corrupt {
                version,
                reason: format!("stored under version {}", stored.commit.version),
            });
        }
        if let Some(name) = stored
            .state
            .namespaces()
            .find(|ns| self.mounted.get(*ns) != Some(&StoreKind::Persistent))
        {
            error!("[Store] version {} holds unmounted store {}", version, name);
            return Err(StoreError::UnmountedStore {
                version,
                name: name.to_string(),
            });
        }
        if stored.state.hash() != stored.commit.hash {
            error!("[Store] hash mismatch at version {}", version);
            return Err(StoreError::Corrupt {
                version,
                reason: "hash mismatch".to_string(),
            });
        }
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn last_commit(&self) -> Option<CommitId> {
        self.last_commit
    }

    /// Writable view over the latest committed state, for one block.
    pub fn deliver_store(&self) -> Result<CacheMultiStore, StoreError> {
        if !self.loaded {
            return Err(StoreError::NotLoaded);
        }
        Ok(CacheMultiStore::new(self.current.clone(), self.table.clone()))
    }

    pub fn snapshots(&self) -> SnapshotReader {
        SnapshotReader {
            index: self.index.clone(),
            mounted: self.table.clone(),
        }
    }

    /// Persist the block's writes as the next version.
    #[instrument(skip(self, store))]
    pub fn commit(&mut self, store: CacheMultiStore) -> Result<CommitId, StoreError> {
        if !self.loaded {
            return Err(StoreError::NotLoaded);
        }
        let mounted = &self.mounted;
        let state = Arc::new(self.current.apply(store.changes(), |ns| {
            mounted.get(ns) == Some(&StoreKind::Persistent)
        }));
        let version = self.last_commit.map(|c| c.version + 1).unwrap_or(0);
        let commit = CommitId {
            version,
            hash: state.hash(),
        };

        self.db.save_version(StoredVersion {
            commit,
            state: state.clone(),
        })?;

        let floor = (version + 1).saturating_sub(self.keep_recent);
        if floor > 0 {
            self.db.prune_before(floor)?;
        }

        {
            let mut index = self.index.write();
            index.versions.insert(version, state.clone());
            index.versions.retain(|v, _| *v >= floor);
            index.latest = Some(commit);
        }

        self.current = state;
        self.last_commit = Some(commit);
        debug!("[Store] committed {}", commit);
        Ok(commit)
    }
}
