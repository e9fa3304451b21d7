//! Shared fixtures: a small chain with an `xrp` collateral type and three
//! funded accounts.

#![allow(dead_code)]

use std::sync::Arc;

use shared_types::{Address, AddressConfig, BlockHeader, Coins, Msg, MsgType, Tx};
use usdx_app::{AppConfig, EndBlockResult, GenesisAccount, GenesisState, TxResult, UsdxApp};
use usdx_modules::auth::AccountResponse;
use usdx_modules::bank::MsgSend;
use usdx_modules::cdp::{CdpParams, CollateralParam};
use usdx_modules::liquidator::{LiquidatorCollateralParam, LiquidatorParams};
use usdx_modules::pricefeed::{Asset, PricefeedParams};
use usdx_store::{CommitId, InMemoryVersionedDb};

pub const CHAIN_ID: &str = "usdx-test";

pub fn alice() -> Address {
    Address([1; 20])
}

pub fn bob() -> Address {
    Address([2; 20])
}

pub fn oracle() -> Address {
    Address([9; 20])
}

pub fn text(addr: &Address) -> String {
    AddressConfig::usdx().encode_account(addr).unwrap()
}

pub fn coins(s: &str) -> Coins {
    s.parse().unwrap()
}

pub fn genesis() -> GenesisState {
    let account = |addr: Address, c: &str| GenesisAccount {
        address: text(&addr),
        coins: coins(c),
        account_number: None,
        sequence: 0,
    };
    let mut state = GenesisState {
        accounts: vec![
            account(alice(), "100unitx,1000xrp"),
            account(bob(), "50unitx"),
            account(oracle(), "10unitx"),
        ],
        ..GenesisState::default()
    };
    state.pricefeed.params = PricefeedParams {
        assets: vec![Asset {
            asset_code: "xrp".to_string(),
            description: "Ripple".to_string(),
        }],
        oracles: vec![oracle()],
    };
    state.cdp.params = CdpParams {
        global_debt_limit: 1000,
        collateral_params: vec![CollateralParam {
            denom: "xrp".to_string(),
            liquidation_ratio: "1.5".parse().unwrap(),
            debt_limit: 500,
        }],
        stable_denom: "usdx".to_string(),
    };
    state.liquidator.params = LiquidatorParams {
        collateral_params: vec![LiquidatorCollateralParam {
            denom: "xrp".to_string(),
            auction_size: 50,
        }],
    };
    state
}

pub fn genesis_bytes() -> Vec<u8> {
    serde_json::to_vec(&genesis()).unwrap()
}

pub fn new_app(config: AppConfig) -> UsdxApp {
    UsdxApp::new(config, Arc::new(InMemoryVersionedDb::new())).unwrap()
}

/// App with the fixture genesis committed as version 0.
pub fn started_app() -> UsdxApp {
    let mut app = new_app(AppConfig::default());
    app.init_chain(CHAIN_ID, &genesis_bytes()).unwrap();
    app
}

pub fn tx<T: MsgType>(msg: &T, signer: Address, sequence: u64) -> Tx {
    Tx::new(Msg::new(msg).unwrap(), signer, sequence)
}

pub fn send(from: Address, to: Address, amount: &str, sequence: u64) -> Vec<u8> {
    let msg = MsgSend {
        from,
        to,
        amount: coins(amount),
    };
    tx(&msg, from, sequence).to_bytes().unwrap()
}

/// Run one full block at the next height.
pub fn block(app: &mut UsdxApp, txs: &[Vec<u8>]) -> (Vec<TxResult>, EndBlockResult, CommitId) {
    let height = app.last_commit().map_or(0, |c| c.version) + 1;
    app.begin_block(BlockHeader::new(CHAIN_ID, height, height)).unwrap();
    let results = txs.iter().map(|t| app.deliver_tx(t)).collect();
    let end = app.end_block(height).unwrap();
    let commit = app.commit().unwrap();
    (results, end, commit)
}

pub fn account(app: &UsdxApp, addr: &Address, height: Option<u64>) -> AccountResponse {
    let result = app.query(&format!("custom/acc/account/{}", text(addr)), &[], height);
    assert!(result.is_ok(), "account query failed: {}", result.log);
    serde_json::from_slice(&result.value).unwrap()
}
