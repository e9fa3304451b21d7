//! Genesis document layout.

use serde::{Deserialize, Serialize};
use shared_types::Coins;
use usdx_modules::auction::AuctionGenesis;
use usdx_modules::auth::AuthGenesis;
use usdx_modules::bank::BankGenesis;
use usdx_modules::cdp::CdpGenesis;
use usdx_modules::liquidator::LiquidatorGenesis;
use usdx_modules::pricefeed::PricefeedGenesis;

use crate::errors::FatalError;

/// An account listed in the genesis document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenesisAccount {
    /// Prefixed text address, e.g. `usdx1...`.
    pub address: String,
    #[serde(default)]
    pub coins: Coins,
    /// Assigned in document order when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<u64>,
    #[serde(default)]
    pub sequence: u64,
}

/// Whole-chain initial state. Missing sections take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenesisState {
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
    #[serde(default)]
    pub auth: AuthGenesis,
    #[serde(default)]
    pub bank: BankGenesis,
    #[serde(default, alias = "pricfeed")]
    pub pricefeed: PricefeedGenesis,
    #[serde(default)]
    pub cdp: CdpGenesis,
    #[serde(default)]
    pub auction: AuctionGenesis,
    #[serde(default)]
    pub liquidator: LiquidatorGenesis,
}

impl GenesisState {
    pub fn from_json(bytes: &[u8]) -> Result<Self, FatalError> {
        serde_json::from_slice(bytes).map_err(|e| FatalError::GenesisDecode(e.to_string()))
    }

    pub fn to_json(&self) -> Result<Vec<u8>, FatalError> {
        serde_json::to_vec_pretty(self).map_err(|e| FatalError::Export(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_takes_defaults() {
        let state = GenesisState::from_json(b"{}").unwrap();

        assert_eq!(state, GenesisState::default());
        assert!(state.bank.send_enabled);
    }

    #[test]
    fn test_misspelled_pricefeed_section_is_accepted() {
        // Arrange
        let doc = br#"{"pricfeed": {"params": {
            "assets": [{"asset_code": "xrp", "description": "Ripple"}],
            "oracles": []
        }}}"#;

        // Act
        let state = GenesisState::from_json(doc).unwrap();

        // Assert
        assert_eq!(state.pricefeed.params.assets.len(), 1);
        assert_eq!(state.pricefeed.params.assets[0].asset_code, "xrp");
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        let err = GenesisState::from_json(br#"{"staking": {}}"#).unwrap_err();

        assert!(matches!(err, FatalError::GenesisDecode(_)));
    }

    #[test]
    fn test_account_defaults() {
        let doc = br#"{"accounts": [{
            "address": "usdx1abc",
            "coins": [{"denom": "unitx", "amount": "100"}]
        }]}"#;


        let state = GenesisState::from_json(doc).unwrap();

        let account = &state.accounts[0];
        assert_eq!(account.coins.amount_of("unitx"), 100);
        assert_eq!(account.account_number, None);
        assert_eq!(account.sequence, 0);
    }
}
