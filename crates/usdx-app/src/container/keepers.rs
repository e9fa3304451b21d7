//! # Keeper Set
//!
//! Constructs every keeper exactly once, each after the keepers it holds.
//! The builder refuses a keeper whose dependencies are not yet built and a
//! keeper built twice, so a miswired application fails at startup instead
//! of at the first transaction.

use std::sync::Arc;

use shared_types::Codec;
use tracing::info;
use usdx_modules::auction::AuctionKeeper;
use usdx_modules::auth::{AccountKeeper, FeeCollectionKeeper};
use usdx_modules::bank::BankKeeper;
use usdx_modules::cdp::CdpKeeper;
use usdx_modules::liquidator::LiquidatorKeeper;
use usdx_modules::params::{ParamsKeeper, Subspace};
use usdx_modules::pricefeed::PricefeedKeeper;
use usdx_modules::{auction, auth, cdp, liquidator, params, pricefeed, AssetTransfer};
use usdx_store::StoreKey;

use crate::errors::WiringError;
use crate::registry::{DependencyGraph, ModuleId};

/// Main store: chain-level records such as the chain id.
pub const MAIN_STORE_KEY: &str = "main";

/// Every store the application mounts.
#[derive(Debug, Clone)]
pub struct AppStoreKeys {
    pub main: StoreKey,
    pub acc: StoreKey,
    pub fee_collection: StoreKey,
    pub params: StoreKey,
    pub transient_params: StoreKey,
    pub pricefeed: StoreKey,
    pub cdp: StoreKey,
    pub auction: StoreKey,
    pub liquidator: StoreKey,
}

impl AppStoreKeys {
    pub fn new() -> Self {
        Self {
            main: StoreKey::persistent(MAIN_STORE_KEY),
            acc: StoreKey::persistent(auth::STORE_KEY),
            fee_collection: StoreKey::persistent(auth::FEE_STORE_KEY),
            params: StoreKey::persistent(params::STORE_KEY),
            transient_params: StoreKey::transient(params::TRANSIENT_STORE_KEY),
            pricefeed: StoreKey::persistent(pricefeed::STORE_KEY),
            cdp: StoreKey::persistent(cdp::STORE_KEY),
            auction: StoreKey::persistent(auction::STORE_KEY),
            liquidator: StoreKey::persistent(liquidator::STORE_KEY),
        }
    }

    pub fn all(&self) -> Vec<StoreKey> {
        vec![
            self.main.clone(),
            self.acc.clone(),
            self.fee_collection.clone(),
            self.params.clone(),
            self.transient_params.clone(),
            self.pricefeed.clone(),
            self.cdp.clone(),
            self.auction.clone(),
            self.liquidator.clone(),
        ]
    }
}

impl Default for AppStoreKeys {
    fn default() -> Self {
        Self::new()
    }
}

/// Fully wired keepers, shared by handlers, queriers and end-blockers.
#[derive(Clone)]
pub struct KeeperSet {
    pub params: Arc<ParamsKeeper>,
    pub accounts: Arc<AccountKeeper>,
    pub bank: Arc<BankKeeper>,
    pub fees: Arc<FeeCollectionKeeper>,
    pub pricefeed: Arc<PricefeedKeeper>,
    pub cdp: Arc<CdpKeeper>,
    pub auction: Arc<AuctionKeeper>,
    pub liquidator: Arc<LiquidatorKeeper>,
    order: Vec<ModuleId>,
}

impl KeeperSet {
    /// Construction order actually used.
    pub fn order(&self) -> &[ModuleId] {
        &self.order
    }
}

/// Incremental keeper construction with dependency checks.
pub struct KeeperSetBuilder {
    codec: Arc<Codec>,
    keys: AppStoreKeys,
    built: Vec<ModuleId>,
    params: Option<Arc<ParamsKeeper>>,
    accounts: Option<Arc<AccountKeeper>>,
    bank: Option<Arc<BankKeeper>>,
    fees: Option<Arc<FeeCollectionKeeper>>,
    pricefeed: Option<Arc<PricefeedKeeper>>,
    cdp: Option<Arc<CdpKeeper>>,
    auction: Option<Arc<AuctionKeeper>>,
    liquidator: Option<Arc<LiquidatorKeeper>>,
}

fn require<T: ?Sized>(
    slot: &Option<Arc<T>>,
    module: ModuleId,
    dependency: ModuleId,
) -> Result<Arc<T>, WiringError> {
    slot.clone()
        .ok_or(WiringError::MissingDependency { module, dependency })
}

impl KeeperSetBuilder {
    pub fn new(codec: Arc<Codec>, keys: AppStoreKeys) -> Self {
        Self {
            codec,
            keys,
            built: Vec::new(),
            params: None,
            accounts: None,
            bank: None,
            fees: None,
            pricefeed: None,
            cdp: None,
            auction: None,
            liquidator: None,
        }
    }

    /// Build every keeper in dependency order.
    pub fn build_all(codec: Arc<Codec>, keys: AppStoreKeys) -> Result<KeeperSet, WiringError> {
        let order = DependencyGraph::new().order()?;
        let mut builder = Self::new(codec, keys);
        for module in order {
            builder.build(module)?;
        }
        builder.finish()
    }

    pub fn built(&self) -> &[ModuleId] {
        &self.built
    }

    pub fn build(&mut self, module: ModuleId) -> Result<(), WiringError> {
        self.begin(module)?;
        match module {
            ModuleId::Params => {
                self.params = Some(Arc::new(ParamsKeeper::new(
                    self.keys.params.clone(),
                    self.keys.transient_params.clone(),
                )));
            }
            ModuleId::Auth => {
                let subspace = self.subspace(module)?;
                self.accounts = Some(Arc::new(AccountKeeper::new(
                    self.keys.acc.clone(),
                    self.codec.clone(),
                    subspace,
                )));
            }
            ModuleId::Bank => {
                let accounts = require(&self.accounts, module, ModuleId::Auth)?;
                let subspace = self.subspace(module)?;
                self.bank = Some(Arc::new(BankKeeper::new(accounts, subspace)));
            }
            ModuleId::FeeCollection => {
                self.fees = Some(Arc::new(FeeCollectionKeeper::new(
                    self.keys.fee_collection.clone(),
                    self.codec.clone(),
                )));
            }
            ModuleId::Pricefeed => {
                let subspace = self.subspace(module)?;
                self.pricefeed = Some(Arc::new(PricefeedKeeper::new(
                    self.keys.pricefeed.clone(),
                    self.codec.clone(),
                    subspace,
                )));
            }
            ModuleId::Cdp => {
                let pricefeed = require(&self.pricefeed, module, ModuleId::Pricefeed)?;
                let bank = require(&self.bank, module, ModuleId::Bank)?;
                let subspace = self.subspace(module)?;
                self.cdp = Some(Arc::new(CdpKeeper::new(
                    self.keys.cdp.clone(),
                    self.codec.clone(),
                    subspace,
                    pricefeed,
                    bank,
                )));
            }
            ModuleId::Auction => {
                let transfer: Arc<dyn AssetTransfer> = require(&self.cdp, module, ModuleId::Cdp)?;
                let subspace = self.subspace(module)?;
                self.auction = Some(Arc::new(AuctionKeeper::new(
                    self.keys.auction.clone(),
                    self.codec.clone(),
                    subspace,
                    transfer,
                )));
            }
            ModuleId::Liquidator => {
                let cdp = require(&self.cdp, module, ModuleId::Cdp)?;
                let auction = require(&self.auction, module, ModuleId::Auction)?;
                let transfer: Arc<dyn AssetTransfer> = cdp.clone();
                let subspace = self.subspace(module)?;
                self.liquidator = Some(Arc::new(LiquidatorKeeper::new(
                    self.keys.liquidator.clone(),
                    subspace,
                    cdp,
                    auction,
                    transfer,
                )));
            }
        }
        self.built.push(module);
        info!("[Keepers] built {} ({}/{})", module, self.built.len(), ModuleId::all().len());
        Ok(())
    }

    pub fn finish(self) -> Result<KeeperSet, WiringError> {
        let missing = |m| WiringError::Incomplete(m);
        Ok(KeeperSet {
            params: self.params.ok_or_else(|| missing(ModuleId::Params))?,
            accounts: self.accounts.ok_or_else(|| missing(ModuleId::Auth))?,
            bank: self.bank.ok_or_else(|| missing(ModuleId::Bank))?,
            fees: self.fees.ok_or_else(|| missing(ModuleId::FeeCollection))?,
            pricefeed: self.pricefeed.ok_or_else(|| missing(ModuleId::Pricefeed))?,
            cdp: self.cdp.ok_or_else(|| missing(ModuleId::Cdp))?,
            auction: self.auction.ok_or_else(|| missing(ModuleId::Auction))?,
            liquidator: self.liquidator.ok_or_else(|| missing(ModuleId::Liquidator))?,
            order: self.built,
        })
    }

    fn begin(&self, module: ModuleId) -> Result<(), WiringError> {
        if self.built.contains(&module) {
            return Err(WiringError::DuplicateKeeper(module));
        }
        match module.dependencies().into_iter().find(|d| !self.built.contains(d)) {
            Some(dependency) => Err(WiringError::MissingDependency { module, dependency }),
            None => Ok(()),
        }
    }

    fn subspace(&self, module: ModuleId) -> Result<Subspace, WiringError> {
        let params = require(&self.params, module, ModuleId::Params)?;
        params.subspace(module.name()).map_err(|e| WiringError::Params {
            module,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiring::build_codec;

    fn builder() -> KeeperSetBuilder {
        KeeperSetBuilder::new(Arc::new(build_codec().unwrap()), AppStoreKeys::new())
    }

    #[test]
    fn test_build_all_follows_dependency_order() {
        // Act
        let keepers =
            KeeperSetBuilder::build_all(Arc::new(build_codec().unwrap()), AppStoreKeys::new())
                .unwrap();

        // Assert
        assert_eq!(keepers.order(), DependencyGraph::new().order().unwrap().as_slice());
    }

    #[test]
    fn test_out_of_order_construction_fails() {
        let mut builder = builder();
        builder.build(ModuleId::Params).unwrap();

        let err = builder.build(ModuleId::Bank).unwrap_err();

        assert_eq!(
            err,
            WiringError::MissingDependency {
                module: ModuleId::Bank,
                dependency: ModuleId::Auth,
            }
        );
        assert_eq!(builder.built(), &[ModuleId::Params]);
    }

    #[test]
    fn test_duplicate_construction_fails() {
        let mut builder = builder();
        builder.build(ModuleId::Params).unwrap();

        assert_eq!(
            builder.build(ModuleId::Params).unwrap_err(),
            WiringError::DuplicateKeeper(ModuleId::Params)
        );
    }

    #[test]
    fn test_partial_set_cannot_finish() {
        let mut builder = builder();
        builder.build(ModuleId::Params).unwrap();
        builder.build(ModuleId::Auth).unwrap();

        assert_eq!(builder.finish().err(), Some(WiringError::Incomplete(ModuleId::Bank)));
    }

    #[test]
    fn test_store_keys_are_unique() {
        let keys = AppStoreKeys::new().all();
        let mut names: Vec<&str> = keys.iter().map(StoreKey::name).collect();
        names.sort_unstable();
        names.dedup();

        assert_eq!(names.len(), keys.len());
        assert!(keys.iter().filter(|k| k.is_transient()).count() == 1);
    }
}
