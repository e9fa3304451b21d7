//! # Pricefeed
//!
//! Oracles post prices with an expiry height; at the end of every block
//! each asset's current price becomes the median of its unexpired posts.

pub mod keeper;
pub mod types;

use std::sync::Arc;

use shared_types::{Codec, CodecBuilder, CodecError, CodecType, Event, ModuleError, Tx};
use usdx_store::Context;

pub use keeper::PricefeedKeeper;
pub use types::{Asset, CurrentPrice, MsgPostPrice, PostedPrice, PricefeedGenesis, PricefeedParams};

use crate::kv;
use crate::module::{Handler, Querier, QueryRequest};

pub const ROUTE: &str = "pricefeed";
pub const STORE_KEY: &str = "pricefeed";

pub fn handler(keeper: Arc<PricefeedKeeper>, codec: Arc<Codec>) -> Handler {
    Arc::new(move |ctx: &mut Context, tx: &Tx| match tx.msg.msg_type.as_str() {
        MsgPostPrice::TYPE_NAME => {
            let msg: MsgPostPrice = codec.decode_msg(&tx.msg)?;
            if msg.from != tx.signer {
                return Err(ModuleError::Unauthorized("oracle must sign".to_string()));
            }
            let posted = keeper.post_price(ctx, msg.from, &msg.asset_code, msg.price, msg.expiry)?;
            ctx.emit(
                Event::new("price_posted")
                    .attr("asset_code", &posted.asset_code)
                    .attr("oracle", posted.oracle)
                    .attr("price", posted.price)
                    .attr("expiry", posted.expiry),
            );
            Ok(())
        }
        other => Err(ModuleError::UnknownRequest(format!(
            "unrecognized pricefeed message type: {other}"
        ))),
    })
}

/// `price/<asset>`, `rawprices/<asset>`, `assets`.
pub fn querier(keeper: Arc<PricefeedKeeper>) -> Querier {
    Arc::new(move |ctx: &Context, req: &QueryRequest| match req.endpoint.as_str() {
        "price" => kv::to_json(&keeper.current_price(ctx, req.arg(0)?)?),
        "rawprices" => kv::to_json(&keeper.raw_prices(ctx, req.arg(0)?)?),
        "assets" => kv::to_json(&keeper.params(ctx)?.assets),
        _ => Err(req.unknown(ROUTE)),
    })
}

pub fn register_codec(builder: &mut CodecBuilder) -> Result<(), CodecError> {
    builder
        .register_msg::<MsgPostPrice>()?
        .register_state::<PostedPrice>()?
        .register_state::<CurrentPrice>()?;
    Ok(())
}
