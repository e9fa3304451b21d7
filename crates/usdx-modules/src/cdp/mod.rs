//! # CDP
//!
//! Collateralized debt positions. Collateral is escrowed in the `cdp`
//! module account; drawing debt mints the stable denom to the owner and
//! repaying burns it. A position must stay at or above its collateral
//! type's liquidation ratio at the current price.
//!
//! The keeper implements [`crate::AssetTransfer`] for the auction and
//! liquidator modules.

pub mod keeper;
pub mod types;

use std::sync::Arc;

use shared_types::{
    AddressConfig, Codec, CodecBuilder, CodecError, CodecType, Event, ModuleError, Tx,
};
use usdx_store::Context;

pub use keeper::{CdpKeeper, MODULE_ACCOUNT};
pub use types::{Cdp, CdpGenesis, CdpParams, CollateralParam, MsgCreateOrModifyCdp};

use crate::kv;
use crate::module::{Handler, Querier, QueryRequest};

pub const ROUTE: &str = "cdp";
pub const STORE_KEY: &str = "cdp";

pub fn handler(keeper: Arc<CdpKeeper>, codec: Arc<Codec>) -> Handler {
    Arc::new(move |ctx: &mut Context, tx: &Tx| match tx.msg.msg_type.as_str() {
        MsgCreateOrModifyCdp::TYPE_NAME => {
            let msg: MsgCreateOrModifyCdp = codec.decode_msg(&tx.msg)?;
            if msg.sender != tx.signer {
                return Err(ModuleError::Unauthorized("cdp owner must sign".to_string()));
            }
            let cdp = keeper.modify_cdp(
                ctx,
                &msg.sender,
                &msg.collateral_denom,
                msg.collateral_change,
                msg.debt_change,
            )?;
            ctx.emit(
                Event::new("cdp_modified")
                    .attr("owner", cdp.owner)
                    .attr("collateral_denom", &cdp.collateral_denom)
                    .attr("collateral_amount", cdp.collateral_amount)
                    .attr("debt", cdp.debt),
            );
            Ok(())
        }
        other => Err(ModuleError::UnknownRequest(format!(
            "unrecognized cdp message type: {other}"
        ))),
    })
}

/// `cdps/<denom>`, `cdp/<owner>/<denom>`, `params`.
pub fn querier(keeper: Arc<CdpKeeper>, addresses: Arc<AddressConfig>) -> Querier {
    Arc::new(move |ctx: &Context, req: &QueryRequest| match req.endpoint.as_str() {
        "cdps" => kv::to_json(&keeper.cdps_by_denom(ctx, req.arg(0)?)?),
        "cdp" => {
            let owner = addresses.decode_account(req.arg(0)?)?;
            let denom = req.arg(1)?;
            let cdp = keeper
                .get_cdp(ctx, &owner, denom)?
                .ok_or_else(|| ModuleError::NotFound(format!("cdp {}/{}", req.args[0], denom)))?;
            kv::to_json(&cdp)
        }
        "params" => kv::to_json(&keeper.params(ctx)?),
        _ => Err(req.unknown(ROUTE)),
    })
}

pub fn register_codec(builder: &mut CodecBuilder) -> Result<(), CodecError> {
    builder.register_msg::<MsgCreateOrModifyCdp>()?.register_state::<Cdp>()?;
    Ok(())
}
