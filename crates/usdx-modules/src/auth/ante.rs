//! # Ante Stage
//!
//! Runs before a transaction's handler, on the same branch:
//!
//! 1. memo within `max_memo_characters`
//! 2. signer account exists
//! 3. sequence matches the account's
//! 4. fee covers the configured minimum, and is moved to fee collection
//! 5. sequence incremented
//!
//! If the handler later fails the branch is dropped, fee and sequence
//! changes included.

use std::sync::Arc;

use shared_types::{Coins, ModuleError, Tx};
use tracing::debug;
use usdx_store::Context;

use super::keeper::{AccountKeeper, BaseAccount, FeeCollectionKeeper};

pub struct AnteHandler {
    accounts: Arc<AccountKeeper>,
    fees: Arc<FeeCollectionKeeper>,
    min_fees: Coins,
}

impl AnteHandler {
    pub fn new(
        accounts: Arc<AccountKeeper>,
        fees: Arc<FeeCollectionKeeper>,
        min_fees: Coins,
    ) -> Self {
        Self {
            accounts,
            fees,
            min_fees,
        }
    }

    pub fn min_fees(&self) -> &Coins {
        &self.min_fees
    }

    /// Returns the signer account as stored after the stage.
    pub fn run(&self, ctx: &mut Context, tx: &Tx) -> Result<BaseAccount, ModuleError> {
        let params = self.accounts.params(ctx)?;
        let memo_len = tx.memo.chars().count() as u64;
        if memo_len > params.max_memo_characters {
            return Err(ModuleError::InvalidMsg(format!(
                "memo too large: {} > {}",
                memo_len, params.max_memo_characters
            )));
        }

        let mut account = self
            .accounts
            .get_account(ctx, &tx.signer)?
            .ok_or_else(|| ModuleError::UnknownAddress(tx.signer.to_hex()))?;

        if tx.sequence != account.sequence {
            return Err(ModuleError::InvalidSequence {
                expected: account.sequence,
                actual: tx.sequence,
            });
        }

        if !tx.fee.is_all_gte(&self.min_fees) {
            return Err(ModuleError::InsufficientFee {
                required: self.min_fees.to_string(),
                offered: tx.fee.to_string(),
            });
        }

        if !tx.fee.is_empty() {
            account.coins = account.coins.checked_sub(&tx.fee)?;
            self.fees.add_collected_fees(ctx, &tx.fee)?;
        }

        account.sequence = account
            .sequence
            .checked_add(1)
            .ok_or_else(|| ModuleError::Overflow("sequence".to_string()))?;
        self.accounts.set_account(ctx, &account)?;
        debug!("[Ante] {} seq -> {}", account.address, account.sequence);
        Ok(account)
    }
}
