//! # Auction
//!
//! Forward auctions of a collateral lot for the stable denom. Bids must be
//! strictly higher and in the auction's bid denom; each bid pushes the end
//! height to `min(height + bid_duration, max_end_height)`. Due auctions are
//! settled at the end of the block.

pub mod keeper;
pub mod types;

use std::sync::Arc;

use shared_types::{Codec, CodecBuilder, CodecError, CodecType, Event, ModuleError, Tx};
use usdx_store::Context;

pub use keeper::{AuctionKeeper, MODULE_ACCOUNT};
pub use types::{Auction, AuctionGenesis, AuctionParams, MsgPlaceBid};

use crate::kv;
use crate::module::{Handler, Querier, QueryRequest};

pub const ROUTE: &str = "auction";
pub const STORE_KEY: &str = "auction";

pub fn handler(keeper: Arc<AuctionKeeper>, codec: Arc<Codec>) -> Handler {
    Arc::new(move |ctx: &mut Context, tx: &Tx| match tx.msg.msg_type.as_str() {
        MsgPlaceBid::TYPE_NAME => {
            let msg: MsgPlaceBid = codec.decode_msg(&tx.msg)?;
            if msg.bidder != tx.signer {
                return Err(ModuleError::Unauthorized("bidder must sign".to_string()));
            }
            let auction = keeper.place_bid(ctx, msg.auction_id, &msg.bidder, msg.bid)?;
            ctx.emit(
                Event::new("auction_bid")
                    .attr("auction_id", auction.id)
                    .attr("bidder", auction.bidder)
                    .attr("bid", &auction.bid)
                    .attr("end_height", auction.end_height),
            );
            Ok(())
        }
        other => Err(ModuleError::UnknownRequest(format!(
            "unrecognized auction message type: {other}"
        ))),
    })
}

/// `getauctions`.
pub fn querier(keeper: Arc<AuctionKeeper>) -> Querier {
    Arc::new(move |ctx: &Context, req: &QueryRequest| match req.endpoint.as_str() {
        "getauctions" => kv::to_json(&keeper.auctions(ctx)?),
        _ => Err(req.unknown(ROUTE)),
    })
}

pub fn register_codec(builder: &mut CodecBuilder) -> Result<(), CodecError> {
    builder.register_msg::<MsgPlaceBid>()?.register_state::<Auction>()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::testing::{self, World};
    use crate::module::{AssetTransfer, EndBlocker};
    use shared_types::{codes, Address, Coin, Msg};

    fn bid(bidder: Address, id: u64, amount: u128) -> Tx {
        let msg = MsgPlaceBid {
            auction_id: id,
            bidder,
            bid: Coin::new("usdx", amount),
        };
        Tx::new(Msg::new(&msg).unwrap(), bidder, 0)
    }

    fn balance(world: &World, addr: &Address, denom: &str) -> u128 {
        world.cdp.get_coins(&world.ctx, addr).unwrap().amount_of(denom)
    }

    #[test]
    fn test_bidding_refunds_and_pays_seller() {
        // Arrange
        let mut world = World::new();
        let (seller, alice, bob) = (Address([1; 20]), Address([2; 20]), Address([3; 20]));
        world.fund(seller, "10xrp");
        world.fund(alice, "100usdx");
        world.fund(bob, "100usdx");
        let id = world
            .auction
            .start_forward_auction(&mut world.ctx, &seller, Coin::new("xrp", 10), "usdx")
            .unwrap();
        let handle = handler(world.auction.clone(), world.codec.clone());

        // Act
        handle(&mut world.ctx, &bid(alice, id, 20)).unwrap();
        handle(&mut world.ctx, &bid(bob, id, 30)).unwrap();

        // Assert
        assert_eq!(balance(&world, &alice, "usdx"), 100);
        assert_eq!(balance(&world, &bob, "usdx"), 70);
        assert_eq!(balance(&world, &seller, "usdx"), 30);
        let auction = world.auction.get_auction(&world.ctx, id).unwrap().unwrap();
        assert_eq!(auction.bidder, bob);
        assert_eq!(auction.end_height, 1 + types::DEFAULT_BID_DURATION);
    }

    #[test]
    fn test_bid_rules() {
        let mut world = World::new();
        let (seller, alice) = (Address([1; 20]), Address([2; 20]));
        world.fund(seller, "10xrp");
        world.fund(alice, "100usdx,100xrp");
        let id = world
            .auction
            .start_forward_auction(&mut world.ctx, &seller, Coin::new("xrp", 10), "usdx")
            .unwrap();
        let handle = handler(world.auction.clone(), world.codec.clone());
        handle(&mut world.ctx, &bid(alice, id, 20)).unwrap();

        let repeat = handle(&mut world.ctx, &bid(alice, id, 20)).unwrap_err();
        let missing = handle(&mut world.ctx, &bid(alice, 99, 50)).unwrap_err();
        assert_eq!(repeat.code(), codes::INVALID_MSG);
        assert_eq!(missing.code(), codes::NOT_FOUND);

        let wrong_denom = MsgPlaceBid {
            auction_id: id,
            bidder: alice,
            bid: Coin::new("xrp", 50),
        };
        let tx = Tx::new(Msg::new(&wrong_denom).unwrap(), alice, 0);
        assert_eq!(handle(&mut world.ctx, &tx).unwrap_err().code(), codes::INVALID_COINS);
    }

    #[test]
    fn test_end_block_closes_due_auctions_in_order() {
        // Arrange
        let mut world = World::new();
        let (seller, alice) = (Address([1; 20]), Address([2; 20]));
        world.fund(seller, "20xrp");
        world.fund(alice, "100usdx");
        let first = world
            .auction
            .start_forward_auction(&mut world.ctx, &seller, Coin::new("xrp", 10), "usdx")
            .unwrap();
        let second = world
            .auction
            .start_forward_auction(&mut world.ctx, &seller, Coin::new("xrp", 10), "usdx")
            .unwrap();
        let handle = handler(world.auction.clone(), world.codec.clone());
        handle(&mut world.ctx, &bid(alice, second, 5)).unwrap();
        world.ctx = testing::at_height(world.ctx, 1 + types::DEFAULT_MAX_AUCTION_DURATION);

        // Act
        let events = world.auction.end_block(&mut world.ctx).unwrap();

        // Assert: the bid moved `second` earlier, so it closes first
        let closed: Vec<String> = events
            .iter()
            .filter_map(|e| e.get("auction_id").map(String::from))
            .collect();
        assert_eq!(closed, vec![second.to_string(), first.to_string()]);
        assert!(events.iter().all(|e| e.kind == "auction_close"));
        assert_eq!(balance(&world, &alice, "xrp"), 10);
        assert_eq!(balance(&world, &seller, "xrp"), 10);
        assert!(world.auction.auctions(&world.ctx).unwrap().is_empty());
    }

    #[test]
    fn test_unpayable_close_is_reported_as_event() {
        let mut world = World::new();
        let seller = Address([1; 20]);
        world.fund(seller, "10xrp");
        let id = world
            .auction
            .start_forward_auction(&mut world.ctx, &seller, Coin::new("xrp", 10), "usdx")
            .unwrap();
        // drain the escrow behind the auction's back
        world
            .cdp
            .subtract_coins(
                &mut world.ctx,
                &AuctionKeeper::module_address(),
                &"10xrp".parse().unwrap(),
            )
            .unwrap();
        world.ctx = testing::at_height(world.ctx, 1 + types::DEFAULT_MAX_AUCTION_DURATION);

        let events = world.auction.end_block(&mut world.ctx).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "auction_close_failed");
        assert!(world.auction.get_auction(&world.ctx, id).unwrap().is_some());
    }
}
