//! # Params
//!
//! Module parameters, one subspace per module, JSON-encoded in the `params`
//! store. Every write is also marked in the `transient_params` store, which
//! is dropped at commit.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{CodecBuilder, CodecError, ModuleError};
use tracing::debug;
use usdx_store::{Context, StoreKey};

pub const STORE_KEY: &str = "params";
pub const TRANSIENT_STORE_KEY: &str = "transient_params";

/// Subspace names handed out by the application.
pub const SUBSPACES: [&str; 6] = ["auth", "bank", "pricefeed", "cdp", "auction", "liquidator"];

pub struct ParamsKeeper {
    key: StoreKey,
    tkey: StoreKey,
}

impl ParamsKeeper {
    pub fn new(key: StoreKey, tkey: StoreKey) -> Self {
        Self { key, tkey }
    }

    pub fn subspace(self: &Arc<Self>, name: &str) -> Result<Subspace, ModuleError> {
        if !SUBSPACES.contains(&name) {
            return Err(ModuleError::NotFound(format!("params subspace {name}")));
        }
        Ok(Subspace {
            name: name.to_string(),
            keeper: self.clone(),
        })
    }

    fn full_key(subspace: &str, key: &str) -> Vec<u8> {
        format!("{subspace}/{key}").into_bytes()
    }
}

/// A module's view of its own parameters.
#[derive(Clone)]
pub struct Subspace {
    name: String,
    keeper: Arc<ParamsKeeper>,
}

impl Subspace {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        key: &str,
    ) -> Result<Option<T>, ModuleError> {
        let full = ParamsKeeper::full_key(&self.name, key);
        match ctx.get(&self.keeper.key, &full)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| CodecError::Decode(e.to_string()).into()),
            None => Ok(None),
        }
    }

    /// Stored value, or `T::default()` when never set.
    pub fn get_or_default<T: DeserializeOwned + Default>(
        &self,
        ctx: &Context,
        key: &str,
    ) -> Result<T, ModuleError> {
        Ok(self.get(ctx, key)?.unwrap_or_default())
    }

    pub fn set<T: Serialize>(
        &self,
        ctx: &mut Context,
        key: &str,
        value: &T,
    ) -> Result<(), ModuleError> {
        let bytes = serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))?;
        let full = ParamsKeeper::full_key(&self.name, key);
        ctx.set(&self.keeper.key, full.clone(), bytes)?;
        ctx.set(&self.keeper.tkey, full, vec![1])?;
        debug!("[Params] {}/{} updated", self.name, key);
        Ok(())
    }

    /// Whether `key` was written earlier in the current block.
    #[cfg(test)]
    pub(crate) fn modified(&self, ctx: &Context, key: &str) -> Result<bool, ModuleError> {
        Ok(ctx.has(&self.keeper.tkey, &ParamsKeeper::full_key(&self.name, key))?)
    }
}

/// Params values are plain JSON; nothing to register.
pub fn register_codec(_builder: &mut CodecBuilder) -> Result<(), CodecError> {
    Ok(())
}
