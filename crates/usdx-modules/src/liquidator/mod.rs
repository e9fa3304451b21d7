//! # Liquidator
//!
//! Seizes under-collateralized CDPs into the liquidator module account,
//! tracks the debt they leave behind, and sells the collateral through
//! forward auctions for the stable denom. Stable coins the account holds
//! (auction proceeds) are burned against that debt.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use shared_types::{
    module_address, Address, Codec, CodecBuilder, CodecError, CodecType, Coin, Coins, Event,
    ModuleError, MsgType, Tx,
};
use tracing::info;
use usdx_store::{Context, StoreKey};

use crate::auction::AuctionKeeper;
use crate::cdp::CdpKeeper;
use crate::kv;
use crate::module::{AssetTransfer, Handler, Querier, QueryRequest};
use crate::params::Subspace;

pub const ROUTE: &str = "liquidator";
pub const STORE_KEY: &str = "liquidator";
/// Module account receiving seized collateral and auction proceeds.
pub const MODULE_ACCOUNT: &str = "liquidator";

const SEIZED_DEBT_KEY: &[u8] = b"seizedDebt";
const PARAMS_KEY: &str = "params";

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidatorCollateralParam {
    pub denom: String,
    /// Largest lot put up in a single auction.
    #[serde_as(as = "DisplayFromStr")]
    pub auction_size: u128,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidatorParams {
    #[serde(default)]
    pub collateral_params: Vec<LiquidatorCollateralParam>,
}

impl LiquidatorParams {
    pub fn collateral(&self, denom: &str) -> Option<&LiquidatorCollateralParam> {
        self.collateral_params.iter().find(|c| c.denom == denom)
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidatorGenesis {
    #[serde(default)]
    pub params: LiquidatorParams,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default)]
    pub seized_debt: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSeizeAndStartCollateralAuction {
    pub sender: Address,
    pub cdp_owner: Address,
    pub collateral_denom: String,
}

impl CodecType for MsgSeizeAndStartCollateralAuction {
    const TYPE_NAME: &'static str = "liquidator/MsgSeizeAndStartCollateralAuction";
}

impl MsgType for MsgSeizeAndStartCollateralAuction {
    const ROUTE: &'static str = ROUTE;
}

/// Result of one liquidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Liquidation {
    pub seized_collateral: u128,
    pub seized_debt: u128,
    pub settled: u128,
    pub auction_id: u64,
}

pub struct LiquidatorKeeper {
    key: StoreKey,
    params: Subspace,
    cdp: Arc<CdpKeeper>,
    auction: Arc<AuctionKeeper>,
    transfer: Arc<dyn AssetTransfer>,
}

impl LiquidatorKeeper {
    pub fn new(
        key: StoreKey,
        params: Subspace,
        cdp: Arc<CdpKeeper>,
        auction: Arc<AuctionKeeper>,
        transfer: Arc<dyn AssetTransfer>,
    ) -> Self {
        Self {
            key,
            params,
            cdp,
            auction,
            transfer,
        }
    }

    pub fn module_address() -> Address {
        module_address(MODULE_ACCOUNT)
    }

    pub fn params(&self, ctx: &Context) -> Result<LiquidatorParams, ModuleError> {
        self.params.get_or_default(ctx, PARAMS_KEY)
    }

    pub fn set_params(
        &self,
        ctx: &mut Context,
        params: &LiquidatorParams,
    ) -> Result<(), ModuleError> {
        self.params.set(ctx, PARAMS_KEY, params)
    }

    /// Debt taken over from seized CDPs and not yet settled.
    pub fn seized_debt(&self, ctx: &Context) -> Result<u128, ModuleError> {
        kv::load_u128(ctx, &self.key, SEIZED_DEBT_KEY)
    }

    fn set_seized_debt(&self, ctx: &mut Context, debt: u128) -> Result<(), ModuleError> {
        kv::save_u128(ctx, &self.key, SEIZED_DEBT_KEY, debt)
    }

    /// Burn stable coins held by the module account against seized debt.
    pub fn settle_debt(&self, ctx: &mut Context) -> Result<u128, ModuleError> {
        let stable_denom = self.cdp.params(ctx)?.stable_denom;
        let debt = self.seized_debt(ctx)?;
        let held = self
            .transfer
            .get_coins(ctx, &Self::module_address())?
            .amount_of(&stable_denom);
        let settle = debt.min(held);
        if settle > 0 {
            let burn = Coins::from_coin(Coin::new(stable_denom, settle))?;
            self.transfer.subtract_coins(ctx, &Self::module_address(), &burn)?;
            self.set_seized_debt(ctx, debt - settle)?;
        }
        Ok(settle)
    }

    pub fn seize_and_start_auction(
        &self,
        ctx: &mut Context,
        owner: &Address,
        denom: &str,
    ) -> Result<Liquidation, ModuleError> {
        let param = self
            .params(ctx)?
            .collateral(denom)
            .cloned()
            .ok_or_else(|| ModuleError::NotFound(format!("liquidator collateral type {denom}")))?;
        let account = Self::module_address();

        let cdp = self.cdp.seize(ctx, owner, denom, &account)?;
        let total = self
            .seized_debt(ctx)?
            .checked_add(cdp.debt)
            .ok_or_else(|| ModuleError::Overflow("seized debt".to_string()))?;
        self.set_seized_debt(ctx, total)?;
        let settled = self.settle_debt(ctx)?;

        let available = self.transfer.get_coins(ctx, &account)?.amount_of(denom);
        let lot = Coin::new(denom, available.min(param.auction_size));
        let stable_denom = self.cdp.params(ctx)?.stable_denom;
        let auction_id = self.auction.start_forward_auction(ctx, &account, lot, &stable_denom)?;

        info!(
            "[Liquidator] seized {} {} (debt {}), auction #{}",
            owner, denom, cdp.debt, auction_id
        );
        Ok(Liquidation {
            seized_collateral: cdp.collateral_amount,
            seized_debt: cdp.debt,
            settled,
            auction_id,
        })
    }

    pub fn init_genesis(
        &self,
        ctx: &mut Context,
        genesis: &LiquidatorGenesis,
    ) -> Result<(), ModuleError> {
        self.set_params(ctx, &genesis.params)?;
        self.set_seized_debt(ctx, genesis.seized_debt)
    }

    pub fn export_genesis(&self, ctx: &Context) -> Result<LiquidatorGenesis, ModuleError> {
        Ok(LiquidatorGenesis {
            params: self.params(ctx)?,
            seized_debt: self.seized_debt(ctx)?,
        })
    }
}

pub fn handler(keeper: Arc<LiquidatorKeeper>, codec: Arc<Codec>) -> Handler {
    Arc::new(move |ctx: &mut Context, tx: &Tx| match tx.msg.msg_type.as_str() {
        MsgSeizeAndStartCollateralAuction::TYPE_NAME => {
            let msg: MsgSeizeAndStartCollateralAuction = codec.decode_msg(&tx.msg)?;
            if msg.sender != tx.signer {
                return Err(ModuleError::Unauthorized("sender must sign".to_string()));
            }
            let outcome =
                keeper.seize_and_start_auction(ctx, &msg.cdp_owner, &msg.collateral_denom)?;
            ctx.emit(
                Event::new("liquidation")
                    .attr("cdp_owner", msg.cdp_owner)
                    .attr("collateral_denom", &msg.collateral_denom)
                    .attr("seized_collateral", outcome.seized_collateral)
                    .attr("seized_debt", outcome.seized_debt)
                    .attr("settled", outcome.settled)
                    .attr("auction_id", outcome.auction_id),
            );
            Ok(())
        }
        other => Err(ModuleError::UnknownRequest(format!(
            "unrecognized liquidator message type: {other}"
        ))),
    })
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutstandingDebt {
    #[serde_as(as = "DisplayFromStr")]
    pub outstanding_debt: u128,
}

/// `outstanding_debt`, `params`.
pub fn querier(keeper: Arc<LiquidatorKeeper>) -> Querier {
    Arc::new(move |ctx: &Context, req: &QueryRequest| match req.endpoint.as_str() {
        "outstanding_debt" => kv::to_json(&OutstandingDebt {
            outstanding_debt: keeper.seized_debt(ctx)?,
        }),
        "params" => kv::to_json(&keeper.params(ctx)?),
        _ => Err(req.unknown(ROUTE)),
    })
}

pub fn register_codec(builder: &mut CodecBuilder) -> Result<(), CodecError> {
    builder.register_msg::<MsgSeizeAndStartCollateralAuction>()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::testing::World;
    use shared_types::{codes, Msg};

    fn seize_tx(sender: Address, owner: Address) -> Tx {
        let msg = MsgSeizeAndStartCollateralAuction {
            sender,
            cdp_owner: owner,
            collateral_denom: "xrp".to_string(),
        };
        Tx::new(Msg::new(&msg).unwrap(), sender, 0)
    }

    #[test]
    fn test_seize_and_auction() {
        // Arrange
        let mut world = World::new();
        let (alice, keeper) = (Address([1; 20]), Address([5; 20]));
        world.fund(alice, "100xrp");
        world.set_price("xrp", "1.0");
        world.cdp.modify_cdp(&mut world.ctx, &alice, "xrp", 100, 60).unwrap();
        world.set_price("xrp", "0.5");
        let handle = handler(world.liquidator.clone(), world.codec.clone());

        // Act
        handle(&mut world.ctx, &seize_tx(keeper, alice)).unwrap();

        // Assert
        assert_eq!(world.liquidator.seized_debt(&world.ctx).unwrap(), 60);
        let auctions = world.auction.auctions(&world.ctx).unwrap();
        assert_eq!(auctions.len(), 1);
        assert_eq!(auctions[0].lot, Coin::new("xrp", 50));
        assert_eq!(auctions[0].seller, LiquidatorKeeper::module_address());
        let liquidation = world.ctx.events().iter().find(|e| e.kind == "liquidation").unwrap();
        assert_eq!(liquidation.get("seized_collateral"), Some("100"));
    }

    #[test]
    fn test_settle_burns_held_stable_coins() {
        let mut world = World::new();
        world.liquidator.set_seized_debt(&mut world.ctx, 40).unwrap();
        world.fund(LiquidatorKeeper::module_address(), "25usdx");

        let settled = world.liquidator.settle_debt(&mut world.ctx).unwrap();

        assert_eq!(settled, 25);
        assert_eq!(world.liquidator.seized_debt(&world.ctx).unwrap(), 15);
        let query = querier(world.liquidator.clone());
        let request = QueryRequest::new("outstanding_debt", vec![], vec![]);
        let body = query(&world.ctx, &request).unwrap();
        let parsed: OutstandingDebt = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.outstanding_debt, 15);
    }

    #[test]
    fn test_healthy_cdp_is_not_seized() {
        let mut world = World::new();
        let alice = Address([1; 20]);
        world.fund(alice, "100xrp");
        world.set_price("xrp", "1.0");
        world.cdp.modify_cdp(&mut world.ctx, &alice, "xrp", 100, 10).unwrap();

        let handle = handler(world.liquidator.clone(), world.codec.clone());
        let err = handle(&mut world.ctx, &seize_tx(alice, alice)).unwrap_err();

        assert_eq!(err.code(), codes::INVALID_MSG);
        assert_eq!(world.liquidator.seized_debt(&world.ctx).unwrap(), 0);
    }
}
