//! # Context
//!
//! Per-operation handle: a store view, the block header and the events
//! emitted so far.
//!
//! A child context from [`Context::branch`] starts with no events and a
//! copy of the parent's pending writes. [`Context::absorb`] hands both back
//! to the parent; dropping the child discards them.

use shared_types::{BlockHeader, Event};

use crate::domain::{CacheMultiStore, StoreError, StoreKey};

#[derive(Debug, Clone)]
pub struct Context {
    store: CacheMultiStore,
    header: BlockHeader,
    events: Vec<Event>,
}

impl Context {
    pub fn new(store: CacheMultiStore, header: BlockHeader) -> Self {
        Self {
            store,
            header,
            events: Vec::new(),
        }
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn block_height(&self) -> u64 {
        self.header.height
    }

    pub fn chain_id(&self) -> &str {
        &self.header.chain_id
    }

    pub fn is_read_only(&self) -> bool {
        self.store.is_read_only()
    }

    pub fn get(&self, key: &StoreKey, k: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.store.get(key, k)
    }

    pub fn has(&self, key: &StoreKey, k: &[u8]) -> Result<bool, StoreError> {
        self.store.has(key, k)
    }

    pub fn set(&mut self, key: &StoreKey, k: Vec<u8>, v: Vec<u8>) -> Result<(), StoreError> {
        self.store.set(key, k, v)
    }

    pub fn delete(&mut self, key: &StoreKey, k: &[u8]) -> Result<(), StoreError> {
        self.store.delete(key, k)
    }

    pub fn iter_prefix(
        &self,
        key: &StoreKey,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        self.store.iter_prefix(key, prefix)
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn branch(&self) -> Context {
        Context {
            store: self.store.branch(),
            header: self.header.clone(),
            events: Vec::new(),
        }
    }

    /// Apply a child's writes and append its events.
    pub fn absorb(&mut self, child: Context) {
        self.store.write_back(child.store);
        self.events.extend(child.events);
    }

    /// Take the events accumulated so far, leaving none.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn into_parts(self) -> (CacheMultiStore, Vec<Event>) {
        (self.store, self.events)
    }
}
