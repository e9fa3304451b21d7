use std::sync::Arc;

use shared_types::{median, Address, Codec, Decimal, Event, ModuleError};
use tracing::{debug, warn};
use usdx_store::{prefixed, Context, StoreKey};

use super::types::{CurrentPrice, PostedPrice, PricefeedGenesis, PricefeedParams};
use crate::kv;
use crate::module::EndBlocker;
use crate::params::Subspace;

const RAW_PRICE_PREFIX: &[u8] = b"rawprice/";
const CURRENT_PRICE_PREFIX: &[u8] = b"currentprice/";
const PARAMS_KEY: &str = "params";

pub struct PricefeedKeeper {
    key: StoreKey,
    codec: Arc<Codec>,
    params: Subspace,
}

impl PricefeedKeeper {
    pub fn new(key: StoreKey, codec: Arc<Codec>, params: Subspace) -> Self {
        Self { key, codec, params }
    }

    fn raw_prefix(asset: &str) -> Vec<u8> {
        let mut out = prefixed(RAW_PRICE_PREFIX, asset.as_bytes());
        out.push(b'/');
        out
    }

    fn raw_key(asset: &str, oracle: &Address) -> Vec<u8> {
        prefixed(&Self::raw_prefix(asset), oracle.as_bytes())
    }

    fn current_key(asset: &str) -> Vec<u8> {
        prefixed(CURRENT_PRICE_PREFIX, asset.as_bytes())
    }

    pub fn params(&self, ctx: &Context) -> Result<PricefeedParams, ModuleError> {
        self.params.get_or_default(ctx, PARAMS_KEY)
    }

    pub fn set_params(
        &self,
        ctx: &mut Context,
        params: &PricefeedParams,
    ) -> Result<(), ModuleError> {
        params.validate()?;
        self.params.set(ctx, PARAMS_KEY, params)
    }

    /// Record `oracle`'s price for `asset`, replacing its previous post.
    pub fn post_price(
        &self,
        ctx: &mut Context,
        oracle: Address,
        asset: &str,
        price: Decimal,
        expiry: u64,
    ) -> Result<PostedPrice, ModuleError> {
        let params = self.params(ctx)?;
        if !params.has_asset(asset) {
            return Err(ModuleError::NotFound(format!("asset {asset}")));
        }
        if !params.is_oracle(&oracle) {
            return Err(ModuleError::Unauthorized(format!("{oracle} is not an oracle")));
        }
        if expiry <= ctx.block_height() {
            return Err(ModuleError::InvalidMsg(format!(
                "price expiry {} is not after height {}",
                expiry,
                ctx.block_height()
            )));
        }
        let posted = PostedPrice {
            asset_code: asset.to_string(),
            oracle,
            price,
            expiry,
        };
        kv::save(ctx, &self.codec, &self.key, Self::raw_key(asset, &oracle), &posted)?;
        Ok(posted)
    }

    /// Posted prices for `asset` in oracle address order.
    pub fn raw_prices(&self, ctx: &Context, asset: &str) -> Result<Vec<PostedPrice>, ModuleError> {
        kv::load_all(ctx, &self.codec, &self.key, &Self::raw_prefix(asset))
    }

    pub fn current_price(&self, ctx: &Context, asset: &str) -> Result<CurrentPrice, ModuleError> {
        kv::load(ctx, &self.codec, &self.key, &Self::current_key(asset))?
            .ok_or_else(|| ModuleError::NotFound(format!("current price for {asset}")))
    }

    /// Recompute every asset's price from its unexpired posts, in asset
    /// order. An asset without valid posts keeps its previous price.
    pub fn update_current_prices(&self, ctx: &mut Context) -> Result<Vec<Event>, ModuleError> {
        let height = ctx.block_height();
        let mut events = Vec::new();
        for asset in self.params(ctx)?.assets {
            let valid: Vec<Decimal> = self
                .raw_prices(ctx, &asset.asset_code)?
                .into_iter()
                .filter(|p| p.expiry > height)
                .map(|p| p.price)
                .collect();
            match median(&valid) {
                Some(price) => {
                    let current = CurrentPrice {
                        asset_code: asset.asset_code.clone(),
                        price,
                    };
                    let key = Self::current_key(&asset.asset_code);
                    kv::save(ctx, &self.codec, &self.key, key, &current)?;
                    debug!(
                        "[Pricefeed] {} = {} from {} posts",
                        asset.asset_code,
                        price,
                        valid.len()
                    );
                    events.push(
                        Event::new("price_updated")
                            .attr("asset_code", &asset.asset_code)
                            .attr("price", price)
                            .attr("posts", valid.len()),
                    );
                }
                None => {
                    warn!("[Pricefeed] no valid prices for {}", asset.asset_code);
                    events.push(
                        Event::new("no_valid_prices").attr("asset_code", &asset.asset_code),
                    );
                }
            }
        }
        Ok(events)
    }

    pub fn init_genesis(
        &self,
        ctx: &mut Context,
        genesis: &PricefeedGenesis,
    ) -> Result<(), ModuleError> {
        self.set_params(ctx, &genesis.params)?;
        for posted in &genesis.posted_prices {
            if !genesis.params.has_asset(&posted.asset_code) {
                return Err(ModuleError::NotFound(format!("asset {}", posted.asset_code)));
            }
            kv::save(
                ctx,
                &self.codec,
                &self.key,
                Self::raw_key(&posted.asset_code, &posted.oracle),
                posted,
            )?;
        }
        self.update_current_prices(ctx)?;
        Ok(())
    }

    pub fn export_genesis(&self, ctx: &Context) -> Result<PricefeedGenesis, ModuleError> {
        let params = self.params(ctx)?;
        let mut posted_prices = Vec::new();
        for asset in &params.assets {
            posted_prices.extend(self.raw_prices(ctx, &asset.asset_code)?);
        }
        Ok(PricefeedGenesis { params, posted_prices })
    }
}

impl EndBlocker for PricefeedKeeper {
    fn name(&self) -> &'static str {
        "pricefeed"
    }

    fn end_block(&self, ctx: &mut Context) -> Result<Vec<Event>, ModuleError> {
        self.update_current_prices(ctx)
    }
}
