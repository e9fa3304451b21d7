use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use shared_types::{Address, CodecType, Decimal, MsgType};

use super::ROUTE;

pub const DEFAULT_STABLE_DENOM: &str = "usdx";

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralParam {
    pub denom: String,
    /// Minimum collateral value over debt.
    pub liquidation_ratio: Decimal,
    #[serde_as(as = "DisplayFromStr")]
    pub debt_limit: u128,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdpParams {
    #[serde_as(as = "DisplayFromStr")]
    pub global_debt_limit: u128,
    #[serde(default)]
    pub collateral_params: Vec<CollateralParam>,
    pub stable_denom: String,
}

impl Default for CdpParams {
    fn default() -> Self {
        Self {
            global_debt_limit: 0,
            collateral_params: Vec::new(),
            stable_denom: DEFAULT_STABLE_DENOM.to_string(),
        }
    }
}

impl CdpParams {
    pub fn collateral(&self, denom: &str) -> Option<&CollateralParam> {
        self.collateral_params.iter().find(|c| c.denom == denom)
    }
}

/// Collateralized debt position of one owner in one collateral denom.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cdp {
    pub owner: Address,
    pub collateral_denom: String,
    #[serde_as(as = "DisplayFromStr")]
    pub collateral_amount: u128,
    #[serde_as(as = "DisplayFromStr")]
    pub debt: u128,
}

impl Cdp {
    pub fn empty(owner: Address, collateral_denom: &str) -> Self {
        Self {
            owner,
            collateral_denom: collateral_denom.to_string(),
            collateral_amount: 0,
            debt: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.collateral_amount == 0 && self.debt == 0
    }
}

impl CodecType for Cdp {
    const TYPE_NAME: &'static str = "cdp/CDP";
}

/// Positive changes deposit collateral or draw debt; negative ones
/// withdraw collateral or repay.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateOrModifyCdp {
    pub sender: Address,
    pub collateral_denom: String,
    #[serde_as(as = "DisplayFromStr")]
    pub collateral_change: i128,
    #[serde_as(as = "DisplayFromStr")]
    pub debt_change: i128,
}

impl CodecType for MsgCreateOrModifyCdp {
    const TYPE_NAME: &'static str = "cdp/MsgCreateOrModifyCDP";
}

impl MsgType for MsgCreateOrModifyCdp {
    const ROUTE: &'static str = ROUTE;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdpGenesis {
    #[serde(default)]
    pub params: CdpParams,
    #[serde(default)]
    pub cdps: Vec<Cdp>,
}
