use serde::{Deserialize, Serialize};
use shared_types::{Address, CodecType, Coin, Decimal, ModuleError, MsgType};

use super::ROUTE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub asset_code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricefeedParams {
    #[serde(default)]
    pub assets: Vec<Asset>,
    /// Addresses allowed to post. Empty means anyone may post.
    #[serde(default)]
    pub oracles: Vec<Address>,
}

impl PricefeedParams {
    /// Asset codes follow the denom rules and appear once. Codes are store
    /// key segments, so a code never contains the `/` separator.
    pub fn validate(&self) -> Result<(), ModuleError> {
        for (i, asset) in self.assets.iter().enumerate() {
            Coin::validate_denom(&asset.asset_code)?;
            if self.assets[..i].iter().any(|a| a.asset_code == asset.asset_code) {
                return Err(ModuleError::InvalidMsg(format!(
                    "duplicate asset {}",
                    asset.asset_code
                )));
            }
        }
        Ok(())
    }

    pub fn has_asset(&self, code: &str) -> bool {
        self.assets.iter().any(|a| a.asset_code == code)
    }

    pub fn is_oracle(&self, addr: &Address) -> bool {
        self.oracles.is_empty() || self.oracles.contains(addr)
    }
}

/// A price posted by one oracle, valid while `expiry` is above the block
/// height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedPrice {
    pub asset_code: String,
    pub oracle: Address,
    pub price: Decimal,
    pub expiry: u64,
}

impl CodecType for PostedPrice {
    const TYPE_NAME: &'static str = "pricefeed/PostedPrice";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentPrice {
    pub asset_code: String,
    pub price: Decimal,
}

impl CodecType for CurrentPrice {
    const TYPE_NAME: &'static str = "pricefeed/CurrentPrice";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgPostPrice {
    pub from: Address,
    pub asset_code: String,
    pub price: Decimal,
    pub expiry: u64,
}

impl CodecType for MsgPostPrice {
    const TYPE_NAME: &'static str = "pricefeed/MsgPostPrice";
}

impl MsgType for MsgPostPrice {
    const ROUTE: &'static str = ROUTE;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricefeedGenesis {
    #[serde(default)]
    pub params: PricefeedParams,
    #[serde(default)]
    pub posted_prices: Vec<PostedPrice>,
}
