//! Results returned across the consensus boundary.

use serde::Serialize;
use shared_types::{codes, Event, ModuleError};
use usdx_store::CommitId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitChainResult {
    /// Version 0 and its state hash.
    pub app_hash: CommitId,
}

/// Outcome of one delivered transaction. Code 0 means the transaction's
/// writes were kept; any other code means none of them were.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxResult {
    pub code: u32,
    pub log: String,
    pub events: Vec<Event>,
}

impl TxResult {
    pub fn ok(events: Vec<Event>) -> Self {
        Self {
            code: codes::OK,
            log: String::new(),
            events,
        }
    }

    pub fn from_error(err: &ModuleError) -> Self {
        Self {
            code: err.code(),
            log: err.to_string(),
            events: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == codes::OK
    }
}

/// Validator power change. The application never emits any; the field
/// keeps the end-of-block shape the consensus engine expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorUpdate {
    pub pub_key: Vec<u8>,
    pub power: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndBlockResult {
    pub events: Vec<Event>,
    pub validator_updates: Vec<ValidatorUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    pub code: u32,
    pub log: String,
    pub value: Vec<u8>,
    /// Version the answer was read from.
    pub height: u64,
}

impl QueryResult {
    pub fn ok(value: Vec<u8>, height: u64) -> Self {
        Self {
            code: codes::OK,
            log: String::new(),
            value,
            height,
        }
    }

    pub fn from_error(err: &ModuleError, height: u64) -> Self {
        Self {
            code: err.code(),
            log: err.to_string(),
            value: Vec::new(),
            height,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == codes::OK
    }
}
