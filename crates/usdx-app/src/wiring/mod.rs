//! # Wiring
//!
//! Connects the keeper set to the outside: codec registration, the route
//! tables and the end-of-block schedule.
//!
//! ## Routes
//!
//! | Route        | Tx handler | Querier |
//! |--------------|------------|---------|
//! | `acc`        |            | yes     |
//! | `bank`       | yes        |         |
//! | `pricefeed`  | yes        | yes     |
//! | `cdp`        | yes        | yes     |
//! | `auction`    | yes        | yes     |
//! | `liquidator` | yes        | yes     |

pub mod end_block;

use std::sync::Arc;

use shared_types::{AddressConfig, Codec, CodecBuilder};
use usdx_modules::{auction, auth, bank, cdp, liquidator, params, pricefeed};

pub use end_block::EndBlockSchedule;

use crate::container::KeeperSet;
use crate::errors::WiringError;
use crate::router::{QueryRouter, TxRouter};

/// Codec with every module's messages and state types registered.
pub fn build_codec() -> Result<Codec, WiringError> {
    let mut builder = CodecBuilder::new();
    auth::register_codec(&mut builder)?;
    bank::register_codec(&mut builder)?;
    params::register_codec(&mut builder)?;
    pricefeed::register_codec(&mut builder)?;
    cdp::register_codec(&mut builder)?;
    auction::register_codec(&mut builder)?;
    liquidator::register_codec(&mut builder)?;
    Ok(builder.build())
}

pub fn tx_router(keepers: &KeeperSet, codec: &Arc<Codec>) -> Result<TxRouter, WiringError> {
    let mut router = TxRouter::new();
    router
        .add_route(bank::ROUTE, bank::handler(keepers.bank.clone(), codec.clone()))?
        .add_route(
            pricefeed::ROUTE,
            pricefeed::handler(keepers.pricefeed.clone(), codec.clone()),
        )?
        .add_route(cdp::ROUTE, cdp::handler(keepers.cdp.clone(), codec.clone()))?
        .add_route(
            auction::ROUTE,
            auction::handler(keepers.auction.clone(), codec.clone()),
        )?
        .add_route(
            liquidator::ROUTE,
            liquidator::handler(keepers.liquidator.clone(), codec.clone()),
        )?;
    Ok(router)
}

pub fn query_router(
    keepers: &KeeperSet,
    addresses: &Arc<AddressConfig>,
) -> Result<QueryRouter, WiringError> {
    let mut router = QueryRouter::new();
    router
        .add_route(
            auth::ROUTE,
            auth::querier(keepers.accounts.clone(), addresses.clone()),
        )?
        .add_route(pricefeed::ROUTE, pricefeed::querier(keepers.pricefeed.clone()))?
        .add_route(cdp::ROUTE, cdp::querier(keepers.cdp.clone(), addresses.clone()))?
        .add_route(auction::ROUTE, auction::querier(keepers.auction.clone()))?
        .add_route(liquidator::ROUTE, liquidator::querier(keepers.liquidator.clone()))?;
    Ok(router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{AppStoreKeys, KeeperSetBuilder};

    #[test]
    fn test_route_tables() {
        // Arrange
        let codec = Arc::new(build_codec().unwrap());
        let keepers = KeeperSetBuilder::build_all(codec.clone(), AppStoreKeys::new()).unwrap();
        let addresses = Arc::new(AddressConfig::usdx());

        // Act
        let txs = tx_router(&keepers, &codec).unwrap();
        let queries = query_router(&keepers, &addresses).unwrap();

        // Assert
        assert_eq!(
            txs.routes().collect::<Vec<_>>(),
            vec!["auction", "bank", "cdp", "liquidator", "pricefeed"]
        );
        assert_eq!(
            queries.routes().collect::<Vec<_>>(),
            vec!["acc", "auction", "cdp", "liquidator", "pricefeed"]
        );
    }

    #[test]
    fn test_every_message_routes_to_a_handler() {
        let codec = Arc::new(build_codec().unwrap());
        let keepers = KeeperSetBuilder::build_all(codec.clone(), AppStoreKeys::new()).unwrap();
        let txs = tx_router(&keepers, &codec).unwrap();

        for msg_type in codec.msg_types() {
            let route = codec.route_of(msg_type).unwrap();
            assert!(txs.route(route).is_ok(), "{msg_type} has no handler on {route}");
        }
    }
}
