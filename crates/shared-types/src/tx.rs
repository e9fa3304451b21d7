//! # Transaction Envelope
//!
//! Wire shape of a transaction as delivered by the consensus engine:
//!
//! ```json
//! {
//!   "msg": { "route": "bank", "type": "bank/MsgSend", "value": { ... } },
//!   "signer": "<hex address>",
//!   "fee": [{ "denom": "usdx", "amount": "1" }],
//!   "sequence": 0,
//!   "memo": ""
//! }
//! ```
//!
//! Signature verification happens before delivery and is not modelled here.

use serde::{Deserialize, Serialize};

use crate::codec::MsgType;
use crate::entities::{Address, Coins};
use crate::errors::CodecError;

/// A routed message. `value` is decoded by the owning module through the
/// codec, which checks that `msg_type` was registered for `route`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Msg {
    pub route: String,
    #[serde(rename = "type")]
    pub msg_type: String,
    pub value: serde_json::Value,
}

impl Msg {
    /// Wrap a typed message under its declared route and type name.
    pub fn new<T: MsgType>(msg: &T) -> Result<Self, CodecError> {
        let value = serde_json::to_value(msg).map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(Self {
            route: T::ROUTE.to_string(),
            msg_type: T::TYPE_NAME.to_string(),
            value,
        })
    }

    /// Build a message with an arbitrary route; used for raw envelopes.
    pub fn raw(
        route: impl Into<String>,
        msg_type: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        Self {
            route: route.into(),
            msg_type: msg_type.into(),
            value,
        }
    }
}

/// A decoded transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tx {
    pub msg: Msg,
    pub signer: Address,
    #[serde(default)]
    pub fee: Coins,
    pub sequence: u64,
    #[serde(default)]
    pub memo: String,
}

impl Tx {
    pub fn new(msg: Msg, signer: Address, sequence: u64) -> Self {
        Self {
            msg,
            signer,
            fee: Coins::empty(),
            sequence,
            memo: String::new(),
        }
    }

    pub fn with_fee(mut self, fee: Coins) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    /// JSON bytes as the consensus engine would deliver them.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(self).map_err(|e| CodecError::Encode(e.to_string()))
    }
}
