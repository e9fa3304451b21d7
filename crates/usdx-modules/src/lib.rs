//! # USDX Modules
//!
//! The accounting modules assembled by `usdx-app`, and the contract they
//! expose to it.
//!
//! ## Keeper Dependencies
//!
//! ```text
//! params ──→ auth ──→ bank ──→ cdp ──AssetTransfer──→ auction
//!                  ↑         ↗   │                        │
//!   fee collection   pricefeed   └───────→ liquidator ←───┘
//! ```
//!
//! Auction and liquidator move funds through the [`AssetTransfer`]
//! capability only; they never name the CDP keeper's type for that.
//!
//! ## Per-module surface
//!
//! | Item | Shape |
//! |------|-------|
//! | keeper | `XKeeper::new(deps.., store keys, codec)` |
//! | handler | `x::handler(keeper, codec) -> Handler` |
//! | querier | `x::querier(keeper, ..) -> Querier` |
//! | genesis | `keeper.init_genesis(ctx, g)` / `keeper.export_genesis(ctx)` |
//! | codec | `x::register_codec(&mut CodecBuilder)` |

pub mod auction;
pub mod auth;
pub mod bank;
pub mod cdp;
pub mod liquidator;
pub mod module;
pub mod params;
pub mod pricefeed;

mod kv;

pub use module::{is_state_failure, AssetTransfer, EndBlocker, Handler, Querier, QueryRequest};
