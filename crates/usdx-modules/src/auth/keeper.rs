use serde::{Deserialize, Serialize};
use shared_types::{Address, Codec, CodecType, Coins, ModuleError};
use std::sync::Arc;
use tracing::debug;
use usdx_store::{prefixed, Context, StoreKey};

use crate::kv;
use crate::params::Subspace;

const ACCOUNT_PREFIX: &[u8] = b"account/";
const GLOBAL_ACCOUNT_NUMBER_KEY: &[u8] = b"globalAccountNumber";
const PARAMS_KEY: &str = "params";

pub const DEFAULT_MAX_MEMO_CHARACTERS: u64 = 256;

/// An account: balance plus replay-protection sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseAccount {
    pub address: Address,
    pub coins: Coins,
    pub account_number: u64,
    pub sequence: u64,
}

impl CodecType for BaseAccount {
    const TYPE_NAME: &'static str = "auth/Account";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthParams {
    pub max_memo_characters: u64,
}

impl Default for AuthParams {
    fn default() -> Self {
        Self {
            max_memo_characters: DEFAULT_MAX_MEMO_CHARACTERS,
        }
    }
}

/// Accounts in the `acc` store, keyed by address bytes.
pub struct AccountKeeper {
    key: StoreKey,
    codec: Arc<Codec>,
    params: Subspace,
}

impl AccountKeeper {
    pub fn new(key: StoreKey, codec: Arc<Codec>, params: Subspace) -> Self {
        Self { key, codec, params }
    }

    fn account_key(addr: &Address) -> Vec<u8> {
        prefixed(ACCOUNT_PREFIX, addr.as_bytes())
    }

    /// Fresh account holding the next account number. Not stored until
    /// [`AccountKeeper::set_account`].
    pub fn new_account(
        &self,
        ctx: &mut Context,
        address: Address,
    ) -> Result<BaseAccount, ModuleError> {
        let account_number = self.next_account_number(ctx)?;
        debug!("[Auth] new account #{} {}", account_number, address);
        Ok(BaseAccount {
            address,
            coins: Coins::empty(),
            account_number,
            sequence: 0,
        })
    }

    pub fn get_account(
        &self,
        ctx: &Context,
        addr: &Address,
    ) -> Result<Option<BaseAccount>, ModuleError> {
        kv::load(ctx, &self.codec, &self.key, &Self::account_key(addr))
    }

    pub fn has_account(&self, ctx: &Context, addr: &Address) -> Result<bool, ModuleError> {
        Ok(ctx.has(&self.key, &Self::account_key(addr))?)
    }

    pub fn set_account(&self, ctx: &mut Context, account: &BaseAccount) -> Result<(), ModuleError> {
        kv::save(ctx, &self.codec, &self.key, Self::account_key(&account.address), account)
    }

    /// All accounts in address byte order.
    pub fn accounts(&self, ctx: &Context) -> Result<Vec<BaseAccount>, ModuleError> {
        kv::load_all(ctx, &self.codec, &self.key, ACCOUNT_PREFIX)
    }

    /// Return the current account number and advance the counter.
    pub fn next_account_number(&self, ctx: &mut Context) -> Result<u64, ModuleError> {
        let current = kv::load_u64(ctx, &self.key, GLOBAL_ACCOUNT_NUMBER_KEY)?.unwrap_or(0);
        let next = current
            .checked_add(1)
            .ok_or_else(|| ModuleError::Overflow("account number".to_string()))?;
        kv::save_u64(ctx, &self.key, GLOBAL_ACCOUNT_NUMBER_KEY, next)?;
        Ok(current)
    }

    /// Keep the counter ahead of an imported account number.
    pub fn reserve_account_number(
        &self,
        ctx: &mut Context,
        number: u64,
    ) -> Result<(), ModuleError> {
        let current = kv::load_u64(ctx, &self.key, GLOBAL_ACCOUNT_NUMBER_KEY)?.unwrap_or(0);
        if number >= current {
            let next = number
                .checked_add(1)
                .ok_or_else(|| ModuleError::Overflow("account number".to_string()))?;
            kv::save_u64(ctx, &self.key, GLOBAL_ACCOUNT_NUMBER_KEY, next)?;
        }
        Ok(())
    }

    pub fn params(&self, ctx: &Context) -> Result<AuthParams, ModuleError> {
        self.params.get_or_default(ctx, PARAMS_KEY)
    }

    pub fn set_params(&self, ctx: &mut Context, params: &AuthParams) -> Result<(), ModuleError> {
        self.params.set(ctx, PARAMS_KEY, params)
    }
}

const COLLECTED_FEES_KEY: &[u8] = b"collectedFees";

/// Fees taken by the ante stage, pooled until distribution.
pub struct FeeCollectionKeeper {
    key: StoreKey,
    codec: Arc<Codec>,
}

impl FeeCollectionKeeper {
    pub fn new(key: StoreKey, codec: Arc<Codec>) -> Self {
        Self { key, codec }
    }

    pub fn collected_fees(&self, ctx: &Context) -> Result<Coins, ModuleError> {
        Ok(kv::load(ctx, &self.codec, &self.key, COLLECTED_FEES_KEY)?.unwrap_or_default())
    }

    pub fn set_collected_fees(&self, ctx: &mut Context, fees: &Coins) -> Result<(), ModuleError> {
        kv::save(ctx, &self.codec, &self.key, COLLECTED_FEES_KEY.to_vec(), fees)
    }

    pub fn add_collected_fees(
        &self,
        ctx: &mut Context,
        fees: &Coins,
    ) -> Result<Coins, ModuleError> {
        let total = self.collected_fees(ctx)?.checked_add(fees)?;
        self.set_collected_fees(ctx, &total)?;
        Ok(total)
    }

    pub fn clear_collected_fees(&self, ctx: &mut Context) -> Result<(), ModuleError> {
        self.set_collected_fees(ctx, &Coins::empty())
    }
}
