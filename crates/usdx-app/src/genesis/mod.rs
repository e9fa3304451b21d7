//! # Genesis
//!
//! Builds version 0 from a genesis document and exports committed state
//! back into one.
//!
//! ## Initialization Phases
//!
//! ```text
//! Phase 1: chain id ──→ main store
//! Phase 2: accounts, in document order
//! Phase 3: auth, bank
//! Phase 4: pricefeed, cdp
//! Phase 5: auction, liquidator
//! ```
//!
//! Any failure is fatal: a replica that cannot build its initial state must
//! not take part in consensus.

pub mod state;

use std::collections::BTreeSet;

use shared_types::{AddressConfig, ModuleError};
use tracing::{info, instrument};
use usdx_modules::auth::{self, BaseAccount};
use usdx_store::Context;

pub use state::{GenesisAccount, GenesisState};

use crate::container::{AppStoreKeys, KeeperSet};
use crate::errors::FatalError;

const CHAIN_ID_KEY: &[u8] = b"chainID";

fn failed(module: &'static str) -> impl Fn(ModuleError) -> FatalError {
    move |e| FatalError::Genesis {
        module: module.to_string(),
        reason: e.to_string(),
    }
}

fn export_failed(e: impl ToString) -> FatalError {
    FatalError::Export(e.to_string())
}

/// Chain id recorded at genesis, if any.
pub fn stored_chain_id(ctx: &Context, keys: &AppStoreKeys) -> Result<Option<String>, FatalError> {
    match ctx.get(&keys.main, CHAIN_ID_KEY)? {
        None => Ok(None),
        Some(bytes) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| FatalError::Genesis {
                module: "main".to_string(),
                reason: "stored chain id is not UTF-8".to_string(),
            }),
    }
}

/// Write the genesis state into `ctx`. The caller commits.
#[instrument(skip_all, fields(chain_id = %ctx.chain_id()))]
pub fn init_genesis(
    ctx: &mut Context,
    keys: &AppStoreKeys,
    keepers: &KeeperSet,
    addresses: &AddressConfig,
    state: &GenesisState,
) -> Result<(), FatalError> {
    info!("[Genesis] Phase 1: chain id");
    let chain_id = ctx.chain_id().as_bytes().to_vec();
    ctx.set(&keys.main, CHAIN_ID_KEY.to_vec(), chain_id)?;

    info!("[Genesis] Phase 2: {} accounts", state.accounts.len());
    init_accounts(ctx, keepers, addresses, &state.accounts)?;

    info!("[Genesis] Phase 3: auth, bank");
    auth::init_genesis(ctx, &keepers.accounts, &keepers.fees, &state.auth).map_err(failed("auth"))?;
    keepers.bank.init_genesis(ctx, &state.bank).map_err(failed("bank"))?;

    info!("[Genesis] Phase 4: pricefeed, cdp");
    keepers
        .pricefeed
        .init_genesis(ctx, &state.pricefeed)
        .map_err(failed("pricefeed"))?;
    keepers.cdp.init_genesis(ctx, &state.cdp).map_err(failed("cdp"))?;

    info!("[Genesis] Phase 5: auction, liquidator");
    keepers
        .auction
        .init_genesis(ctx, &state.auction)
        .map_err(failed("auction"))?;
    keepers
        .liquidator
        .init_genesis(ctx, &state.liquidator)
        .map_err(failed("liquidator"))?;

    Ok(())
}

/// Explicit account numbers are reserved first, so accounts without one
/// are numbered after every explicit number.
fn init_accounts(
    ctx: &mut Context,
    keepers: &KeeperSet,
    addresses: &AddressConfig,
    accounts: &[GenesisAccount],
) -> Result<(), FatalError> {
    let invalid = |reason: String| FatalError::Genesis {
        module: "auth".to_string(),
        reason,
    };

    let mut numbers = BTreeSet::new();
    for number in accounts.iter().filter_map(|a| a.account_number) {
        if !numbers.insert(number) {
            return Err(invalid(format!("account number {number} assigned twice")));
        }
        keepers
            .accounts
            .reserve_account_number(ctx, number)
            .map_err(failed("auth"))?;
    }

    let mut seen = BTreeSet::new();
    for entry in accounts {
        let address = addresses
            .decode_account(&entry.address)
            .map_err(|e| invalid(format!("{}: {e}", entry.address)))?;
        if !seen.insert(address) {
            return Err(invalid(format!("duplicate account {}", entry.address)));
        }
        let account_number = match entry.account_number {
            Some(number) => number,
            None => keepers.accounts.next_account_number(ctx).map_err(failed("auth"))?,
        };
        keepers
            .accounts
            .set_account(
                ctx,
                &BaseAccount {
                    address,
                    coins: entry.coins.clone(),
                    account_number,
                    sequence: entry.sequence,
                },
            )
            .map_err(failed("auth"))?;
    }
    Ok(())
}

/// Read every module's state back into a genesis document. Accounts come
/// out in address order with their numbers and sequences.
#[instrument(skip_all, fields(height = ctx.block_height()))]
pub fn export_genesis(
    ctx: &Context,
    keepers: &KeeperSet,
    addresses: &AddressConfig,
) -> Result<GenesisState, FatalError> {
    let accounts = keepers
        .accounts
        .accounts(ctx)
        .map_err(export_failed)?
        .into_iter()
        .map(|account| {
            Ok(GenesisAccount {
                address: addresses.encode_account(&account.address).map_err(export_failed)?,
                coins: account.coins,
                account_number: Some(account.account_number),
                sequence: account.sequence,
            })
        })
        .collect::<Result<Vec<_>, FatalError>>()?;

    let state = GenesisState {
        accounts,
        auth: auth::export_genesis(ctx, &keepers.accounts, &keepers.fees).map_err(export_failed)?,
        bank: keepers.bank.export_genesis(ctx).map_err(export_failed)?,
        pricefeed: keepers.pricefeed.export_genesis(ctx).map_err(export_failed)?,
        cdp: keepers.cdp.export_genesis(ctx).map_err(export_failed)?,
        auction: keepers.auction.export_genesis(ctx).map_err(export_failed)?,
        liquidator: keepers.liquidator.export_genesis(ctx).map_err(export_failed)?,
    };
    info!("[Genesis] exported {} accounts", state.accounts.len());
    Ok(state)
}
