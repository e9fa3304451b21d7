use serde::{Deserialize, Serialize};
use shared_types::{Address, CodecType, Coin, MsgType};

use super::ROUTE;

/// Blocks a bid keeps an auction open, about 3 hours at 5s blocks.
pub const DEFAULT_BID_DURATION: u64 = 2160;
/// Longest an auction may run, about 2 days at 5s blocks.
pub const DEFAULT_MAX_AUCTION_DURATION: u64 = 34560;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionParams {
    pub bid_duration: u64,
    pub max_auction_duration: u64,
}

impl Default for AuctionParams {
    fn default() -> Self {
        Self {
            bid_duration: DEFAULT_BID_DURATION,
            max_auction_duration: DEFAULT_MAX_AUCTION_DURATION,
        }
    }
}

/// Forward auction: `lot` is sold for increasing amounts of `bid.denom`.
/// Until the first bid `bidder` is the seller and `bid` is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub id: u64,
    pub seller: Address,
    pub lot: Coin,
    pub bidder: Address,
    pub bid: Coin,
    pub end_height: u64,
    pub max_end_height: u64,
}

impl CodecType for Auction {
    const TYPE_NAME: &'static str = "auction/ForwardAuction";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgPlaceBid {
    pub auction_id: u64,
    pub bidder: Address,
    pub bid: Coin,
}

impl CodecType for MsgPlaceBid {
    const TYPE_NAME: &'static str = "auction/MsgPlaceBid";
}

impl MsgType for MsgPlaceBid {
    const ROUTE: &'static str = ROUTE;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionGenesis {
    #[serde(default)]
    pub params: AuctionParams,
    #[serde(default)]
    pub auctions: Vec<Auction>,
    #[serde(default)]
    pub next_auction_id: u64,
}
