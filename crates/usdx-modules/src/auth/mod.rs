//! # Auth
//!
//! Accounts, the account-number counter, fee collection and the ante stage
//! every transaction passes before its handler.

pub mod ante;
pub mod keeper;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared_types::{AddressConfig, CodecBuilder, CodecError, Coins, ModuleError};
use usdx_store::Context;

pub use ante::AnteHandler;
pub use keeper::{AccountKeeper, AuthParams, BaseAccount, FeeCollectionKeeper};

use crate::kv;
use crate::module::{Querier, QueryRequest};

pub const ROUTE: &str = "acc";
pub const STORE_KEY: &str = "acc";
pub const FEE_STORE_KEY: &str = "fee_collection";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthGenesis {
    #[serde(default)]
    pub collected_fees: Coins,
    #[serde(default)]
    pub params: AuthParams,
}

pub fn init_genesis(
    ctx: &mut Context,
    accounts: &AccountKeeper,
    fees: &FeeCollectionKeeper,
    genesis: &AuthGenesis,
) -> Result<(), ModuleError> {
    accounts.set_params(ctx, &genesis.params)?;
    fees.set_collected_fees(ctx, &genesis.collected_fees)
}

pub fn export_genesis(
    ctx: &Context,
    accounts: &AccountKeeper,
    fees: &FeeCollectionKeeper,
) -> Result<AuthGenesis, ModuleError> {
    Ok(AuthGenesis {
        collected_fees: fees.collected_fees(ctx)?,
        params: accounts.params(ctx)?,
    })
}

/// Account as returned by queries, with its prefixed text address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountResponse {
    pub address: String,
    pub coins: Coins,
    pub account_number: u64,
    pub sequence: u64,
}

/// `custom/acc/account/<address>`, `custom/acc/params`.
pub fn querier(accounts: Arc<AccountKeeper>, addresses: Arc<AddressConfig>) -> Querier {
    Arc::new(move |ctx: &Context, req: &QueryRequest| match req.endpoint.as_str() {
        "account" => {
            let addr = addresses.decode_account(req.arg(0)?)?;
            let account = accounts
                .get_account(ctx, &addr)?
                .ok_or_else(|| ModuleError::UnknownAddress(req.args[0].clone()))?;
            kv::to_json(&AccountResponse {
                address: addresses.encode_account(&account.address)?,
                coins: account.coins,
                account_number: account.account_number,
                sequence: account.sequence,
            })
        }
        "params" => kv::to_json(&accounts.params(ctx)?),
        _ => Err(req.unknown(ROUTE)),
    })
}

pub fn register_codec(builder: &mut CodecBuilder) -> Result<(), CodecError> {
    builder.register_state::<BaseAccount>()?.register_state::<Coins>()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::testing;
    use crate::params::ParamsKeeper;
    use shared_types::{codes, Address};
    use usdx_store::StoreKey;

    #[test]
    fn test_account_query_uses_prefixed_address() {
        // Arrange
        let codec = testing::codec();
        let keys = vec![
            StoreKey::persistent("params"),
            StoreKey::transient("transient_params"),
            StoreKey::persistent(STORE_KEY),
        ];
        let params = Arc::new(ParamsKeeper::new(keys[0].clone(), keys[1].clone()));
        let accounts = Arc::new(AccountKeeper::new(
            keys[2].clone(),
            codec,
            params.subspace("auth").unwrap(),
        ));
        let addresses = Arc::new(AddressConfig::usdx());
        let mut ctx = testing::context(&keys, 1);
        let alice = Address([7; 20]);
        let mut account = accounts.new_account(&mut ctx, alice).unwrap();
        account.coins = "100unitx".parse().unwrap();
        accounts.set_account(&mut ctx, &account).unwrap();
        let text = addresses.encode_account(&alice).unwrap();

        // Act
        let query = querier(accounts, addresses.clone());
        let body = query(&ctx, &QueryRequest::new("account", vec![text.clone()], vec![])).unwrap();
        let missing = query(
            &ctx,
            &QueryRequest::new(
                "account",
                vec![addresses.encode_account(&Address([8; 20])).unwrap()],
                vec![],
            ),
        );

        // Assert
        let response: AccountResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.address, text);
        assert_eq!(response.coins.amount_of("unitx"), 100);
        assert_eq!(missing.unwrap_err().code(), codes::UNKNOWN_ADDRESS);
    }

    #[test]
    fn test_account_numbers_are_sequential() {
        let codec = testing::codec();
        let keys = vec![
            StoreKey::persistent("params"),
            StoreKey::transient("transient_params"),
            StoreKey::persistent(STORE_KEY),
        ];
        let params = Arc::new(ParamsKeeper::new(keys[0].clone(), keys[1].clone()));
        let accounts = AccountKeeper::new(keys[2].clone(), codec, params.subspace("auth").unwrap());
        let mut ctx = testing::context(&keys, 1);

        let a = accounts.new_account(&mut ctx, Address([1; 20])).unwrap();
        let b = accounts.new_account(&mut ctx, Address([2; 20])).unwrap();

        assert_eq!((a.account_number, b.account_number), (0, 1));
    }
}
