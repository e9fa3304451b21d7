use std::sync::Arc;

use shared_types::{module_address, Address, Codec, Coin, Coins, Decimal, ModuleError};
use tracing::{debug, info};
use usdx_store::{prefixed, Context, StoreKey};

use super::types::{Cdp, CdpGenesis, CdpParams, CollateralParam};
use crate::bank::BankKeeper;
use crate::kv;
use crate::module::AssetTransfer;
use crate::params::Subspace;
use crate::pricefeed::PricefeedKeeper;

/// Module account holding escrowed collateral.
pub const MODULE_ACCOUNT: &str = "cdp";

const CDP_PREFIX: &[u8] = b"cdp/";
const DEBT_PREFIX: &[u8] = b"debt/";
const GLOBAL_DEBT_KEY: &[u8] = b"globaldebt";
const PARAMS_KEY: &str = "params";

pub struct CdpKeeper {
    key: StoreKey,
    codec: Arc<Codec>,
    params: Subspace,
    pricefeed: Arc<PricefeedKeeper>,
    bank: Arc<BankKeeper>,
}

fn apply_change(base: u128, change: i128, what: &str) -> Result<u128, ModuleError> {
    if change >= 0 {
        base.checked_add(change.unsigned_abs())
            .ok_or_else(|| ModuleError::Overflow(what.to_string()))
    } else {
        base.checked_sub(change.unsigned_abs())
            .ok_or_else(|| ModuleError::InvalidMsg(format!("{what} cannot go below zero")))
    }
}

fn single(denom: &str, amount: u128) -> Result<Coins, ModuleError> {
    Coins::from_coin(Coin::new(denom, amount))
}

impl CdpKeeper {
    pub fn new(
        key: StoreKey,
        codec: Arc<Codec>,
        params: Subspace,
        pricefeed: Arc<PricefeedKeeper>,
        bank: Arc<BankKeeper>,
    ) -> Self {
        Self {
            key,
            codec,
            params,
            pricefeed,
            bank,
        }
    }

    pub fn module_address() -> Address {
        module_address(MODULE_ACCOUNT)
    }

    fn denom_prefix(denom: &str) -> Vec<u8> {
        let mut out = prefixed(CDP_PREFIX, denom.as_bytes());
        out.push(b'/');
        out
    }

    fn cdp_key(owner: &Address, denom: &str) -> Vec<u8> {
        prefixed(&Self::denom_prefix(denom), owner.as_bytes())
    }

    fn debt_key(denom: &str) -> Vec<u8> {
        prefixed(DEBT_PREFIX, denom.as_bytes())
    }

    pub fn params(&self, ctx: &Context) -> Result<CdpParams, ModuleError> {
        self.params.get_or_default(ctx, PARAMS_KEY)
    }

    pub fn set_params(&self, ctx: &mut Context, params: &CdpParams) -> Result<(), ModuleError> {
        self.params.set(ctx, PARAMS_KEY, params)
    }

    pub fn get_cdp(
        &self,
        ctx: &Context,
        owner: &Address,
        denom: &str,
    ) -> Result<Option<Cdp>, ModuleError> {
        kv::load(ctx, &self.codec, &self.key, &Self::cdp_key(owner, denom))
    }

    fn set_cdp(&self, ctx: &mut Context, cdp: &Cdp) -> Result<(), ModuleError> {
        let key = Self::cdp_key(&cdp.owner, &cdp.collateral_denom);
        if cdp.is_empty() {
            ctx.delete(&self.key, &key)?;
            Ok(())
        } else {
            kv::save(ctx, &self.codec, &self.key, key, cdp)
        }
    }

    /// CDPs of one collateral denom in owner address order.
    pub fn cdps_by_denom(&self, ctx: &Context, denom: &str) -> Result<Vec<Cdp>, ModuleError> {
        kv::load_all(ctx, &self.codec, &self.key, &Self::denom_prefix(denom))
    }

    pub fn all_cdps(&self, ctx: &Context) -> Result<Vec<Cdp>, ModuleError> {
        kv::load_all(ctx, &self.codec, &self.key, CDP_PREFIX)
    }

    pub fn denom_debt(&self, ctx: &Context, denom: &str) -> Result<u128, ModuleError> {
        kv::load_u128(ctx, &self.key, &Self::debt_key(denom))
    }

    pub fn global_debt(&self, ctx: &Context) -> Result<u128, ModuleError> {
        kv::load_u128(ctx, &self.key, GLOBAL_DEBT_KEY)
    }

    fn adjust_debt(&self, ctx: &mut Context, denom: &str, change: i128) -> Result<(), ModuleError> {
        let denom_debt = apply_change(self.denom_debt(ctx, denom)?, change, "denom debt")?;
        let global = apply_change(self.global_debt(ctx)?, change, "global debt")?;
        kv::save_u128(ctx, &self.key, &Self::debt_key(denom), denom_debt)?;
        kv::save_u128(ctx, &self.key, GLOBAL_DEBT_KEY, global)
    }

    /// Whether `collateral` at the current price covers `debt` times the
    /// liquidation ratio.
    fn is_collateralized(
        &self,
        ctx: &Context,
        param: &CollateralParam,
        collateral: u128,
        debt: u128,
    ) -> Result<bool, ModuleError> {
        if debt == 0 {
            return Ok(true);
        }
        let price: Decimal = self.pricefeed.current_price(ctx, &param.denom)?.price;
        let value = price
            .checked_mul_int(collateral)
            .ok_or_else(|| ModuleError::Overflow("collateral value".to_string()))?;
        let required = param
            .liquidation_ratio
            .checked_mul_int(debt)
            .ok_or_else(|| ModuleError::Overflow("required collateral".to_string()))?;
        Ok(value >= required)
    }

    /// Deposit or withdraw collateral and draw or repay debt in one step.
    pub fn modify_cdp(
        &self,
        ctx: &mut Context,
        owner: &Address,
        denom: &str,
        collateral_change: i128,
        debt_change: i128,
    ) -> Result<Cdp, ModuleError> {
        let params = self.params(ctx)?;
        let param = params
            .collateral(denom)
            .ok_or_else(|| ModuleError::NotFound(format!("collateral type {denom}")))?;
        if collateral_change == 0 && debt_change == 0 {
            return Err(ModuleError::InvalidMsg("cdp change is empty".to_string()));
        }

        let mut cdp = self.get_cdp(ctx, owner, denom)?.unwrap_or_else(|| Cdp::empty(*owner, denom));
        cdp.collateral_amount =
            apply_change(cdp.collateral_amount, collateral_change, "collateral")?;
        cdp.debt = apply_change(cdp.debt, debt_change, "debt")?;

        if !self.is_collateralized(ctx, param, cdp.collateral_amount, cdp.debt)? {
            return Err(ModuleError::InvalidMsg(format!(
                "cdp would fall below liquidation ratio {}",
                param.liquidation_ratio
            )));
        }
        if debt_change > 0 {
            let added = debt_change.unsigned_abs();
            let denom_total = self.denom_debt(ctx, denom)?.saturating_add(added);
            if denom_total > param.debt_limit {
                return Err(ModuleError::InvalidMsg(format!("{denom} debt limit exceeded")));
            }
            let global_total = self.global_debt(ctx)?.saturating_add(added);
            if global_total > params.global_debt_limit {
                return Err(ModuleError::InvalidMsg("global debt limit exceeded".to_string()));
            }
        }

        let escrow = Self::module_address();
        let collateral_moved = single(denom, collateral_change.unsigned_abs())?;
        if collateral_change > 0 {
            self.bank.send_coins(ctx, owner, &escrow, &collateral_moved)?;
        } else if collateral_change < 0 {
            self.bank.send_coins(ctx, &escrow, owner, &collateral_moved)?;
        }
        let stable = single(&params.stable_denom, debt_change.unsigned_abs())?;
        if debt_change > 0 {
            self.bank.add_coins(ctx, owner, &stable)?;
        } else if debt_change < 0 {
            self.bank.subtract_coins(ctx, owner, &stable)?;
        }

        self.adjust_debt(ctx, denom, debt_change)?;
        self.set_cdp(ctx, &cdp)?;
        debug!(
            "[CDP] {} {}: collateral {} debt {}",
            owner, denom, cdp.collateral_amount, cdp.debt
        );
        Ok(cdp)
    }

    /// Take an under-collateralized CDP: its collateral goes to `to` and
    /// the position is closed. Returns the position as it was.
    pub fn seize(
        &self,
        ctx: &mut Context,
        owner: &Address,
        denom: &str,
        to: &Address,
    ) -> Result<Cdp, ModuleError> {
        let params = self.params(ctx)?;
        let param = params
            .collateral(denom)
            .ok_or_else(|| ModuleError::NotFound(format!("collateral type {denom}")))?;
        let cdp = self
            .get_cdp(ctx, owner, denom)?
            .ok_or_else(|| ModuleError::NotFound(format!("cdp {owner}/{denom}")))?;
        if self.is_collateralized(ctx, param, cdp.collateral_amount, cdp.debt)? {
            return Err(ModuleError::InvalidMsg("cdp is not under-collateralized".to_string()));
        }

        let collateral = single(denom, cdp.collateral_amount)?;
        self.bank.send_coins(ctx, &Self::module_address(), to, &collateral)?;
        let debt = i128::try_from(cdp.debt)
            .map_err(|_| ModuleError::Overflow("seized debt".to_string()))?;
        self.adjust_debt(ctx, denom, -debt)?;
        self.set_cdp(ctx, &Cdp::empty(*owner, denom))?;
        info!("[CDP] seized {} {} (debt {})", owner, denom, cdp.debt);
        Ok(cdp)
    }

    pub fn init_genesis(&self, ctx: &mut Context, genesis: &CdpGenesis) -> Result<(), ModuleError> {
        self.set_params(ctx, &genesis.params)?;
        for cdp in &genesis.cdps {
            if genesis.params.collateral(&cdp.collateral_denom).is_none() {
                return Err(ModuleError::NotFound(format!(
                    "collateral type {}",
                    cdp.collateral_denom
                )));
            }
            let debt = i128::try_from(cdp.debt)
                .map_err(|_| ModuleError::Overflow("cdp debt".to_string()))?;
            self.adjust_debt(ctx, &cdp.collateral_denom, debt)?;
            self.set_cdp(ctx, cdp)?;
        }
        Ok(())
    }

    pub fn export_genesis(&self, ctx: &Context) -> Result<CdpGenesis, ModuleError> {
        Ok(CdpGenesis {
            params: self.params(ctx)?,
            cdps: self.all_cdps(ctx)?,
        })
    }
}

impl AssetTransfer for CdpKeeper {
    fn get_coins(&self, ctx: &Context, addr: &Address) -> Result<Coins, ModuleError> {
        self.bank.get_coins(ctx, addr)
    }

    fn send_coins(
        &self,
        ctx: &mut Context,
        from: &Address,
        to: &Address,
        amount: &Coins,
    ) -> Result<(), ModuleError> {
        self.bank.send_coins(ctx, from, to, amount)
    }

    fn add_coins(
        &self,
        ctx: &mut Context,
        addr: &Address,
        amount: &Coins,
    ) -> Result<Coins, ModuleError> {
        self.bank.add_coins(ctx, addr, amount)
    }

    fn subtract_coins(
        &self,
        ctx: &mut Context,
        addr: &Address,
        amount: &Coins,
    ) -> Result<Coins, ModuleError> {
        self.bank.subtract_coins(ctx, addr, amount)
    }
}
