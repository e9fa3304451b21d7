//! # Module Contract
//!
//! What a module hands to the application: a transaction handler, a
//! querier, an optional end-of-block provider, and for the CDP module the
//! asset-transfer capability other modules consume.

use std::sync::Arc;

use shared_types::{Address, Coins, Event, ModuleError, Tx};
use usdx_store::Context;

/// Executes one routed transaction message against a branched context.
///
/// The ante stage has already authenticated `tx.signer`; a handler still
/// checks that the signer is the party its message acts for.
pub type Handler = Arc<dyn Fn(&mut Context, &Tx) -> Result<(), ModuleError> + Send + Sync>;

/// Answers a query against a read-only context.
pub type Querier =
    Arc<dyn Fn(&Context, &QueryRequest) -> Result<Vec<u8>, ModuleError> + Send + Sync>;

/// A query path split after the route: `custom/<route>/<endpoint>/<args..>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub endpoint: String,
    pub args: Vec<String>,
    pub data: Vec<u8>,
}

impl QueryRequest {
    pub fn new(endpoint: impl Into<String>, args: Vec<String>, data: Vec<u8>) -> Self {
        Self {
            endpoint: endpoint.into(),
            args,
            data,
        }
    }

    /// Positional argument, or `InvalidMsg` naming the endpoint.
    pub fn arg(&self, index: usize) -> Result<&str, ModuleError> {
        self.args
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| {
                ModuleError::InvalidMsg(format!("{}: missing argument {}", self.endpoint, index))
            })
    }

    pub fn unknown(&self, route: &str) -> ModuleError {
        ModuleError::UnknownRequest(format!("unknown {} query endpoint: {}", route, self.endpoint))
    }
}

/// End-of-block settlement provider.
///
/// Failures of individual items (an auction that cannot pay out, an asset
/// with no valid price) are reported as events. An `Err` means the state
/// itself could not be read or written and halts the replica.
pub trait EndBlocker: Send + Sync {
    fn name(&self) -> &'static str;

    fn end_block(&self, ctx: &mut Context) -> Result<Vec<Event>, ModuleError>;
}

/// Capability to move, create and destroy coins held by accounts.
pub trait AssetTransfer: Send + Sync {
    fn get_coins(&self, ctx: &Context, addr: &Address) -> Result<Coins, ModuleError>;

    fn send_coins(
        &self,
        ctx: &mut Context,
        from: &Address,
        to: &Address,
        amount: &Coins,
    ) -> Result<(), ModuleError>;

    /// Mint into `addr`; returns the new balance.
    fn add_coins(
        &self,
        ctx: &mut Context,
        addr: &Address,
        amount: &Coins,
    ) -> Result<Coins, ModuleError>;

    /// Burn from `addr`; returns the new balance.
    fn subtract_coins(
        &self,
        ctx: &mut Context,
        addr: &Address,
        amount: &Coins,
    ) -> Result<Coins, ModuleError>;
}

/// Whether a module error means the state itself is unusable, as opposed
/// to one item failing its business rules.
pub fn is_state_failure(err: &ModuleError) -> bool {
    matches!(err, ModuleError::Store(_) | ModuleError::Codec(_))
}
