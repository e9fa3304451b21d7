//! # Error Types
//!
//! Errors that halt the replica. Per-transaction and per-query failures are
//! `shared_types::ModuleError` values reported through result codes and
//! never reach this module.

use shared_types::CodecError;
use thiserror::Error;
use usdx_store::StoreError;

use crate::container::ConfigError;
use crate::registry::ModuleId;

/// Misconstruction of the application at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WiringError {
    #[error("Keeper {0} constructed twice")]
    DuplicateKeeper(ModuleId),

    #[error("Keeper {module} requires {dependency}, which is not constructed yet")]
    MissingDependency { module: ModuleId, dependency: ModuleId },

    #[error("Module {module} depends on {dependency}, which is not part of the graph")]
    UnknownDependency { module: ModuleId, dependency: ModuleId },

    #[error("Dependency cycle among modules: {0}")]
    Cycle(String),

    #[error("Keeper set incomplete: {0} was never constructed")]
    Incomplete(ModuleId),

    #[error("Duplicate route: {0}")]
    DuplicateRoute(String),

    #[error("Params subspace unavailable for {module}: {reason}")]
    Params { module: ModuleId, reason: String },

    #[error("Codec registration failed: {0}")]
    Codec(#[from] CodecError),

    #[error("Store setup failed: {0}")]
    Store(#[from] StoreError),
}

/// Any condition after which the replica must stop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Wiring(#[from] WiringError),

    #[error("Store failure: {0}")]
    Store(#[from] StoreError),

    #[error("Genesis document could not be decoded: {0}")]
    GenesisDecode(String),

    #[error("Chain already initialized at version {0}")]
    GenesisAlreadyInitialized(u64),

    #[error("Genesis initialization failed in {module}: {reason}")]
    Genesis { module: String, reason: String },

    #[error("End block failed in {module}: {reason}")]
    EndBlock { module: String, reason: String },

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Chain has not been initialized")]
    ChainNotInitialized,

    #[error("A block is already in progress")]
    BlockInProgress,

    #[error("No block in progress")]
    NoBlockInProgress,

    #[error("End block already ran for height {0}")]
    EndBlockAlreadyRun(u64),

    #[error("Commit of height {0} before end block")]
    EndBlockNotRun(u64),

    #[error("Unexpected block height: expected {expected}, got {actual}")]
    UnexpectedHeight { expected: u64, actual: u64 },

    #[error("Chain id mismatch: chain is {expected}, header says {actual}")]
    ChainIdMismatch { expected: String, actual: String },
}
