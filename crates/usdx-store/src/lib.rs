//! # usdx-store
//!
//! Versioned multi-store for the USDX application.
//!
//! ## Role in System
//!
//! - **Store Registry**: mounts one namespace per [`StoreKey`], loads the
//!   latest committed version at startup, commits a new version per block.
//! - **Branching**: every transaction runs on a [`CacheMultiStore`] branch
//!   that is written back only on success.
//! - **Snapshots**: recent committed versions stay readable through a
//!   [`SnapshotReader`] for queries, without touching the block in progress.
//!
//! ## Layout
//!
//! ```text
//! VersionedDatabase (port) ←── StoreRegistry ──→ SnapshotReader ──→ read-only Context
//!        ↑                          │
//! InMemoryVersionedDb          deliver_store()
//!    (adapter)                      ↓
//!                            CacheMultiStore ──branch()──→ Context (per tx)
//! ```

pub mod adapters;
pub mod context;
pub mod domain;
pub mod ports;
pub mod registry;

pub use adapters::*;
pub use context::Context;
pub use domain::*;
pub use ports::*;
pub use registry::{SnapshotReader, StoreRegistry, DEFAULT_KEEP_RECENT};
