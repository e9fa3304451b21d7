//! # Committed State
//!
//! Immutable contents of one committed version, and its hash.
//!
//! ## Hash Layout
//!
//! SHA-256 over every non-empty namespace in name order:
//!
//! ```text
//! for ns:  u64be(len(name)) name u64be(entries)
//!   for (k, v):  u64be(len(k)) k u64be(len(v)) v
//! ```
//!
//! `BTreeMap` ordering makes the byte stream, and therefore the hash,
//! identical on every replica holding the same entries.

use std::collections::BTreeMap;
use std::fmt;

use sha2::{Digest, Sha256};

pub type Hash = [u8; 32];

/// Entries of one namespace.
pub type KvMap = BTreeMap<Vec<u8>, Vec<u8>>;

/// Pending writes: `None` marks a deletion.
pub type ChangeSet = BTreeMap<String, BTreeMap<Vec<u8>, Option<Vec<u8>>>>;

/// Identifier of a committed version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitId {
    pub version: u64,
    pub hash: Hash,
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.version, hex::encode(self.hash))
    }
}

/// All persistent namespaces of one version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    stores: BTreeMap<String, KvMap>,
}

impl StoreState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_stores(stores: BTreeMap<String, KvMap>) -> Self {
        let mut state = Self { stores };
        state.stores.retain(|_, kv| !kv.is_empty());
        state
    }

    pub fn get(&self, namespace: &str, key: &[u8]) -> Option<&Vec<u8>> {
        self.stores.get(namespace).and_then(|kv| kv.get(key))
    }

    pub fn namespace(&self, namespace: &str) -> Option<&KvMap> {
        self.stores.get(namespace)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.stores.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.stores.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// New state with `changes` applied to the namespaces accepted by
    /// `keep`. Namespaces that end up empty are dropped.
    pub fn apply(&self, changes: &ChangeSet, keep: impl Fn(&str) -> bool) -> StoreState {
        let mut stores = self.stores.clone();
        for (namespace, writes) in changes.iter().filter(|(ns, _)| keep(ns.as_str())) {
            let kv = stores.entry(namespace.clone()).or_default();
            for (key, value) in writes {
                match value {
                    Some(v) => {
                        kv.insert(key.clone(), v.clone());
                    }
                    None => {
                        kv.remove(key);
                    }
                }
            }
        }
        StoreState::from_stores(stores)
    }

    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        for (name, kv) in &self.stores {
            hasher.update((name.len() as u64).to_be_bytes());
            hasher.update(name.as_bytes());
            hasher.update((kv.len() as u64).to_be_bytes());
            for (k, v) in kv {
                hasher.update((k.len() as u64).to_be_bytes());
                hasher.update(k);
                hasher.update((v.len() as u64).to_be_bytes());
                hasher.update(v);
            }
        }
        hasher.finalize().into()
    }
}
