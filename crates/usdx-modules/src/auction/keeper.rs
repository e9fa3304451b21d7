use std::sync::Arc;

use shared_types::{module_address, Address, Codec, Coin, Coins, Event, ModuleError};
use tracing::{debug, info, warn};
use usdx_store::{prefixed, Context, StoreKey};

use super::types::{Auction, AuctionGenesis, AuctionParams};
use crate::kv;
use crate::module::{is_state_failure, AssetTransfer, EndBlocker};
use crate::params::Subspace;

/// Module account holding auctioned lots.
pub const MODULE_ACCOUNT: &str = "auction";

const NEXT_ID_KEY: &[u8] = b"nextAuctionID";
const AUCTION_PREFIX: &[u8] = b"auction/";
const BY_END_PREFIX: &[u8] = b"byend/";
const PARAMS_KEY: &str = "params";

pub struct AuctionKeeper {
    key: StoreKey,
    codec: Arc<Codec>,
    params: Subspace,
    transfer: Arc<dyn AssetTransfer>,
}

impl AuctionKeeper {
    pub fn new(
        key: StoreKey,
        codec: Arc<Codec>,
        params: Subspace,
        transfer: Arc<dyn AssetTransfer>,
    ) -> Self {
        Self {
            key,
            codec,
            params,
            transfer,
        }
    }

    pub fn module_address() -> Address {
        module_address(MODULE_ACCOUNT)
    }

    fn auction_key(id: u64) -> Vec<u8> {
        prefixed(AUCTION_PREFIX, &id.to_be_bytes())
    }

    /// `byend/<end_height be><id be>`: byte order is `(end_height, id)` order.
    fn by_end_key(end_height: u64, id: u64) -> Vec<u8> {
        let mut out = prefixed(BY_END_PREFIX, &end_height.to_be_bytes());
        out.extend_from_slice(&id.to_be_bytes());
        out
    }

    fn parse_by_end_key(key: &[u8]) -> Result<(u64, u64), ModuleError> {
        let body = key
            .strip_prefix(BY_END_PREFIX)
            .filter(|b| b.len() == 16)
            .ok_or_else(|| ModuleError::Store("malformed auction index key".to_string()))?;
        let mut end = [0u8; 8];
        let mut id = [0u8; 8];
        end.copy_from_slice(&body[..8]);
        id.copy_from_slice(&body[8..]);
        Ok((u64::from_be_bytes(end), u64::from_be_bytes(id)))
    }

    pub fn params(&self, ctx: &Context) -> Result<AuctionParams, ModuleError> {
        self.params.get_or_default(ctx, PARAMS_KEY)
    }

    pub fn set_params(&self, ctx: &mut Context, params: &AuctionParams) -> Result<(), ModuleError> {
        self.params.set(ctx, PARAMS_KEY, params)
    }

    pub fn next_auction_id(&self, ctx: &Context) -> Result<u64, ModuleError> {
        Ok(kv::load_u64(ctx, &self.key, NEXT_ID_KEY)?.unwrap_or(0))
    }

    pub fn get_auction(&self, ctx: &Context, id: u64) -> Result<Option<Auction>, ModuleError> {
        kv::load(ctx, &self.codec, &self.key, &Self::auction_key(id))
    }

    /// Open auctions in id order.
    pub fn auctions(&self, ctx: &Context) -> Result<Vec<Auction>, ModuleError> {
        kv::load_all(ctx, &self.codec, &self.key, AUCTION_PREFIX)
    }

    fn store_auction(&self, ctx: &mut Context, auction: &Auction) -> Result<(), ModuleError> {
        kv::save(ctx, &self.codec, &self.key, Self::auction_key(auction.id), auction)?;
        ctx.set(
            &self.key,
            Self::by_end_key(auction.end_height, auction.id),
            auction.id.to_be_bytes().to_vec(),
        )?;
        Ok(())
    }

    fn remove_auction(&self, ctx: &mut Context, auction: &Auction) -> Result<(), ModuleError> {
        ctx.delete(&self.key, &Self::auction_key(auction.id))?;
        ctx.delete(&self.key, &Self::by_end_key(auction.end_height, auction.id))?;
        Ok(())
    }

    /// Escrow `lot` from `seller` and open a forward auction for `bid_denom`.
    pub fn start_forward_auction(
        &self,
        ctx: &mut Context,
        seller: &Address,
        lot: Coin,
        bid_denom: &str,
    ) -> Result<u64, ModuleError> {
        if lot.amount == 0 {
            return Err(ModuleError::InvalidCoins("auction lot is empty".to_string()));
        }
        Coin::validate_denom(bid_denom)?;
        let params = self.params(ctx)?;
        self.transfer
            .send_coins(ctx, seller, &Self::module_address(), &Coins::from_coin(lot.clone())?)?;

        let id = self.next_auction_id(ctx)?;
        let end_height = ctx
            .block_height()
            .checked_add(params.max_auction_duration)
            .ok_or_else(|| ModuleError::Overflow("auction end height".to_string()))?;
        let auction = Auction {
            id,
            seller: *seller,
            lot,
            bidder: *seller,
            bid: Coin::new(bid_denom, 0),
            end_height,
            max_end_height: end_height,
        };
        self.store_auction(ctx, &auction)?;
        kv::save_u64(ctx, &self.key, NEXT_ID_KEY, id + 1)?;

        info!("[Auction] #{} started: {} for {}", id, auction.lot, bid_denom);
        ctx.emit(
            Event::new("auction_start")
                .attr("auction_id", id)
                .attr("seller", seller)
                .attr("lot", &auction.lot)
                .attr("end_height", end_height),
        );
        Ok(id)
    }

    /// Outbid the current bidder. The new bidder refunds the previous one
    /// and pays the increase to the seller.
    pub fn place_bid(
        &self,
        ctx: &mut Context,
        id: u64,
        bidder: &Address,
        bid: Coin,
    ) -> Result<Auction, ModuleError> {
        let mut auction = self
            .get_auction(ctx, id)?
            .ok_or_else(|| ModuleError::NotFound(format!("auction {id}")))?;
        let height = ctx.block_height();
        if height >= auction.end_height {
            return Err(ModuleError::InvalidMsg(format!("auction {id} has closed")));
        }
        if bid.denom != auction.bid.denom {
            return Err(ModuleError::InvalidCoins(format!(
                "bid denom {} does not match {}",
                bid.denom, auction.bid.denom
            )));
        }
        if bid.amount <= auction.bid.amount {
            return Err(ModuleError::InvalidMsg(format!(
                "bid {} is not above current bid {}",
                bid, auction.bid
            )));
        }

        let increase = bid.amount - auction.bid.amount;
        if *bidder != auction.bidder && auction.bid.amount > 0 {
            let refund = Coins::from_coin(auction.bid.clone())?;
            self.transfer.send_coins(ctx, bidder, &auction.bidder, &refund)?;
        }
        let payment = Coins::from_coin(Coin::new(bid.denom.clone(), increase))?;
        self.transfer.send_coins(ctx, bidder, &auction.seller, &payment)?;

        let params = self.params(ctx)?;
        self.remove_auction(ctx, &auction)?;
        auction.bidder = *bidder;
        auction.bid = bid;
        auction.end_height = height.saturating_add(params.bid_duration).min(auction.max_end_height);
        self.store_auction(ctx, &auction)?;
        debug!("[Auction] #{} bid {} by {}", id, auction.bid, bidder);
        Ok(auction)
    }

    /// Pay the lot to the winning bidder (the seller when nobody bid).
    fn close_auction(&self, ctx: &mut Context, auction: &Auction) -> Result<(), ModuleError> {
        let lot = Coins::from_coin(auction.lot.clone())?;
        self.transfer
            .send_coins(ctx, &Self::module_address(), &auction.bidder, &lot)?;
        self.remove_auction(ctx, auction)
    }

    /// Close every auction due at the current height, in `(end_height, id)`
    /// order. Each close runs on its own branch.
    pub fn close_due_auctions(&self, ctx: &mut Context) -> Result<Vec<Event>, ModuleError> {
        let height = ctx.block_height();
        let mut due = Vec::new();
        for (key, _) in ctx.iter_prefix(&self.key, BY_END_PREFIX)? {
            let (end_height, id) = Self::parse_by_end_key(&key)?;
            if end_height > height {
                break;
            }
            due.push(id);
        }

        let mut events = Vec::new();
        for id in due {
            let auction = self
                .get_auction(ctx, id)?
                .ok_or_else(|| {
                    ModuleError::Store(format!("auction index points at missing auction {id}"))
                })?;
            let mut branch = ctx.branch();
            match self.close_auction(&mut branch, &auction) {
                Ok(()) => {
                    ctx.absorb(branch);
                    events.push(
                        Event::new("auction_close")
                            .attr("auction_id", id)
                            .attr("winner", auction.bidder)
                            .attr("lot", &auction.lot)
                            .attr("bid", &auction.bid),
                    );
                }
                Err(err) if is_state_failure(&err) => return Err(err),
                Err(err) => {
                    warn!("[Auction] #{} could not be closed: {}", id, err);
                    events.push(
                        Event::new("auction_close_failed")
                            .attr("auction_id", id)
                            .attr("reason", &err),
                    );
                }
            }
        }
        Ok(events)
    }

    pub fn init_genesis(
        &self,
        ctx: &mut Context,
        genesis: &AuctionGenesis,
    ) -> Result<(), ModuleError> {
        self.set_params(ctx, &genesis.params)?;
        let mut next_id = genesis.next_auction_id;
        for auction in &genesis.auctions {
            self.store_auction(ctx, auction)?;
            next_id = next_id.max(auction.id.saturating_add(1));
        }
        kv::save_u64(ctx, &self.key, NEXT_ID_KEY, next_id)
    }

    pub fn export_genesis(&self, ctx: &Context) -> Result<AuctionGenesis, ModuleError> {
        Ok(AuctionGenesis {
            params: self.params(ctx)?,
            auctions: self.auctions(ctx)?,
            next_auction_id: self.next_auction_id(ctx)?,
        })
    }
}

impl EndBlocker for AuctionKeeper {
    fn name(&self) -> &'static str {
        "auction"
    }

    fn end_block(&self, ctx: &mut Context) -> Result<Vec<Event>, ModuleError> {
        self.close_due_auctions(ctx)
    }
}
