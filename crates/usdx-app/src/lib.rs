//! # USDX Application
//!
//! Composition root and block-lifecycle controller of the USDX chain.
//!
//! ## Modular Structure
//!
//! - `registry/` - Module identities and their dependency graph
//! - `container/` - Configuration, store keys and the keeper set
//! - `router/` - Transaction and query routing tables
//! - `genesis/` - Genesis document, initialization and export
//! - `wiring/` - Codec registration, routes and the end-of-block schedule
//! - `abci/` - The consensus-facing application
//!
//! ## Block Lifecycle
//!
//! ```text
//! init_chain(genesis) ──→ commit v0
//!        │
//!        ↓
//! begin_block(h) → deliver_tx* → end_block(h) → commit() ──→ v(h)
//!                      │               │
//!              branch per tx    auction, pricefeed
//!          (absorbed on success)
//!
//! query(path, height) ──→ SnapshotReader (committed versions only)
//! ```
//!
//! ## Determinism
//!
//! Every table that is iterated (routes, stores, accounts, auctions) is a
//! `BTreeMap` or a key-ordered store scan. Amounts are integers, prices are
//! fixed-point. No wall-clock time or randomness reaches state.

pub mod abci;
pub mod container;
pub mod errors;
pub mod genesis;
pub mod registry;
pub mod router;
pub mod wiring;

pub use abci::{
    EndBlockResult, InitChainResult, QueryHandle, QueryResult, TxResult, UsdxApp, ValidatorUpdate,
};
pub use container::{AppConfig, AppStoreKeys, ConfigError, KeeperSet, KeeperSetBuilder};
pub use errors::{FatalError, WiringError};
pub use genesis::{GenesisAccount, GenesisState};
pub use registry::{DependencyGraph, ModuleId};
pub use router::{QueryRouter, TxRouter};
pub use wiring::EndBlockSchedule;
