//! # Stability Flow Tests
//!
//! The full collateral cycle through the consensus boundary: an oracle
//! prices `xrp`, an owner draws `usdx` against it, the price falls, and a
//! keeper liquidates the position into a collateral auction.
//!
//! ## Test Strategy
//!
//! 1. Prices posted in a block take effect at its end
//! 2. CDP changes mint and escrow through the bank
//! 3. Liquidation hands the collateral to an auction and tracks the debt
//! 4. Exported state re-initializes a fresh chain with the same balances

mod common;

use shared_types::{codes, Address, Coin, Decimal};
use usdx_app::{AppConfig, GenesisState};
use usdx_modules::auction::{Auction, MsgPlaceBid};
use usdx_modules::cdp::{Cdp, MsgCreateOrModifyCdp};
use usdx_modules::liquidator::{
    LiquidatorKeeper, MsgSeizeAndStartCollateralAuction, OutstandingDebt,
};
use usdx_modules::pricefeed::{CurrentPrice, MsgPostPrice};

use common::*;

fn post_price(price: &str, sequence: u64) -> Vec<u8> {
    let msg = MsgPostPrice {
        from: oracle(),
        asset_code: "xrp".to_string(),
        price: price.parse().unwrap(),
        expiry: 10_000,
    };
    tx(&msg, oracle(), sequence).to_bytes().unwrap()
}

fn modify_cdp(owner: Address, collateral: i128, debt: i128, sequence: u64) -> Vec<u8> {
    let msg = MsgCreateOrModifyCdp {
        sender: owner,
        collateral_denom: "xrp".to_string(),
        collateral_change: collateral,
        debt_change: debt,
    };
    tx(&msg, owner, sequence).to_bytes().unwrap()
}

fn seize(keeper: Address, owner: Address, sequence: u64) -> Vec<u8> {
    let msg = MsgSeizeAndStartCollateralAuction {
        sender: keeper,
        cdp_owner: owner,
        collateral_denom: "xrp".to_string(),
    };
    tx(&msg, keeper, sequence).to_bytes().unwrap()
}

fn query_json<T: serde::de::DeserializeOwned>(app: &usdx_app::UsdxApp, path: &str) -> T {
    let result = app.query(path, &[], None);
    assert!(result.is_ok(), "{path}: {}", result.log);
    serde_json::from_slice(&result.value).unwrap()
}

/// Price at 1.0, CDP with 100 xrp backing 60 usdx.
fn priced_chain_with_cdp() -> usdx_app::UsdxApp {
    let mut app = started_app();
    let (results, end, _) = block(&mut app, &[post_price("1.0", 0)]);
    assert!(results[0].is_ok(), "{}", results[0].log);
    assert!(end.events.iter().any(|e| e.kind == "price_updated"));
    let (results, _, _) = block(&mut app, &[modify_cdp(alice(), 100, 60, 0)]);
    assert!(results[0].is_ok(), "{}", results[0].log);
    app
}

/// A price posted during a block is only current after its end.
#[test]
fn test_price_takes_effect_at_end_of_block() {
    // Arrange
    let mut app = started_app();

    // Act
    let txs = [post_price("1.25", 0), modify_cdp(alice(), 100, 10, 0)];
    let (results, _, _) = block(&mut app, &txs);

    let price: CurrentPrice = query_json(&app, "custom/pricefeed/price/xrp");

    // Assert: the CDP saw no current price yet
    assert!(results[0].is_ok());
    assert_eq!(results[1].code, codes::NOT_FOUND);
    assert_eq!(price.price, "1.25".parse::<Decimal>().unwrap());
}

#[test]
fn test_only_registered_oracles_post() {
    let mut app = started_app();
    let msg = MsgPostPrice {
        from: bob(),
        asset_code: "xrp".to_string(),
        price: "2.0".parse().unwrap(),
        expiry: 10_000,
    };

    let (results, _, _) = block(&mut app, &[tx(&msg, bob(), 0).to_bytes().unwrap()]);

    assert_eq!(results[0].code, codes::UNAUTHORIZED);
}

/// Drawing debt mints usdx to the owner and escrows the collateral.
#[test]
fn test_cdp_mints_against_collateral() {
    // Act
    let app = priced_chain_with_cdp();

    // Assert
    let alice_account = account(&app, &alice(), None);
    assert_eq!(alice_account.coins.amount_of("usdx"), 60);
    assert_eq!(alice_account.coins.amount_of("xrp"), 900);
    let cdp: Cdp = query_json(&app, &format!("custom/cdp/cdp/{}/xrp", text(&alice())));
    assert_eq!((cdp.collateral_amount, cdp.debt), (100, 60));
    let cdps: Vec<Cdp> = query_json(&app, "custom/cdp/cdps/xrp");
    assert_eq!(cdps.len(), 1);
}

#[test]
fn test_undercollateralized_draw_is_rejected() {
    let mut app = priced_chain_with_cdp();

    // 100 xrp at 1.0 supports at most 66 usdx at ratio 1.5
    let (results, _, _) = block(&mut app, &[modify_cdp(alice(), 0, 10, 1)]);

    assert_eq!(results[0].code, codes::INVALID_MSG);
    assert_eq!(account(&app, &alice(), None).coins.amount_of("usdx"), 60);
}

/// After the price halves the CDP is seized and its collateral auctioned.
#[test]
fn test_liquidation_starts_collateral_auction() {
    // Arrange
    let mut app = priced_chain_with_cdp();
    block(&mut app, &[post_price("0.5", 1)]);

    // Act
    let (results, _, _) = block(&mut app, &[seize(bob(), alice(), 0)]);

    // Assert
    assert!(results[0].is_ok(), "{}", results[0].log);
    let liquidation = results[0].events.iter().find(|e| e.kind == "liquidation").unwrap();
    assert_eq!(liquidation.get("seized_debt"), Some("60"));
    let auctions: Vec<Auction> = query_json(&app, "custom/auction/getauctions");
    assert_eq!(auctions.len(), 1);
    assert_eq!(auctions[0].lot, Coin::new("xrp", 50));
    assert_eq!(auctions[0].seller, LiquidatorKeeper::module_address());
    let debt: OutstandingDebt = query_json(&app, "custom/liquidator/outstanding_debt");
    assert_eq!(debt.outstanding_debt, 60);
    let missing = app.query(&format!("custom/cdp/cdp/{}/xrp", text(&alice())), &[], None);
    assert_eq!(missing.code, codes::NOT_FOUND);
}

/// A bid pays the seller and takes over as the leading bid.
#[test]
fn test_bid_on_collateral_auction() {
    let mut app = priced_chain_with_cdp();
    block(&mut app, &[post_price("0.5", 1)]);
    block(&mut app, &[seize(bob(), alice(), 0)]);
    let auctions: Vec<Auction> = query_json(&app, "custom/auction/getauctions");
    let bid = MsgPlaceBid {
        auction_id: auctions[0].id,
        bidder: alice(),
        bid: Coin::new("usdx", 20),
    };

    let (results, _, _) = block(&mut app, &[tx(&bid, alice(), 1).to_bytes().unwrap()]);

    assert!(results[0].is_ok(), "{}", results[0].log);
    let auctions: Vec<Auction> = query_json(&app, "custom/auction/getauctions");
    assert_eq!(auctions[0].bidder, alice());
    assert_eq!(account(&app, &alice(), None).coins.amount_of("usdx"), 40);
    assert_eq!(
        account(&app, &LiquidatorKeeper::module_address(), None).coins.amount_of("usdx"),
        20
    );
}

/// Exported state initializes a new chain that answers the same balances.
#[test]
fn test_export_reinitializes_same_balances() {
    // Arrange
    let mut app = priced_chain_with_cdp();
    block(&mut app, &[send(alice(), bob(), "25unitx", 1)]);
    let exported = app.export_genesis().unwrap();
    let bytes = exported.to_json().unwrap();

    // Act
    let mut fresh = new_app(AppConfig::default());
    fresh.init_chain(CHAIN_ID, &bytes).unwrap();

    // Assert
    for account_entry in &exported.accounts {
        let addr = fresh.addresses().decode_account(&account_entry.address).unwrap();
        let old = account(&app, &addr, None);
        let new = account(&fresh, &addr, None);
        assert_eq!(old.coins, new.coins);
        assert_eq!(old.account_number, new.account_number);
        assert_eq!(old.sequence, new.sequence);
    }
    let reexported = fresh.export_genesis().unwrap();
    assert_eq!(reexported.accounts, exported.accounts);
    assert_eq!(reexported.cdp, exported.cdp);
    assert_eq!(GenesisState::from_json(&bytes).unwrap(), exported);
}

/// Exported accounts come out in address order with explicit numbers.
#[test]
fn test_export_lists_accounts_in_address_order() {
    let app = priced_chain_with_cdp();

    let exported = app.export_genesis().unwrap();

    let addresses: Vec<Address> = exported
        .accounts
        .iter()
        .map(|a| app.addresses().decode_account(&a.address).unwrap())
        .collect();
    let mut sorted = addresses.clone();
    sorted.sort();
    assert_eq!(addresses, sorted);
    assert!(exported.accounts.iter().all(|a| a.account_number.is_some()));
    assert_eq!(exported.pricefeed.posted_prices.len(), 1);
}
