//! # Consensus Boundary
//!
//! `init_chain`, `begin_block`, `deliver_tx`, `end_block`, `commit` and
//! `query`, shaped the way an ABCI-style engine calls them.

pub mod app;
pub mod query;
pub mod types;

pub use app::UsdxApp;
pub use query::QueryHandle;
pub use types::{EndBlockResult, InitChainResult, QueryResult, TxResult, ValidatorUpdate};
