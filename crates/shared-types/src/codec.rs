//! # Codec Registry
//!
//! Process-wide table of the message and state types every module
//! registers at startup.
//!
//! ## Lifecycle
//!
//! ```text
//! CodecBuilder ──register_*()──→ build() ──→ Arc<Codec>  (read-only)
//! ```
//!
//! The built [`Codec`] has no mutating methods, so sharing it across
//! threads needs no locking.
//!
//! ## Encodings
//!
//! - Binary (store values): `bincode`
//! - JSON (transactions, genesis, query responses): `serde_json`
//!
//! Encoding or decoding a type that was never registered is an error, so a
//! module that forgot to register is caught on first use.

use std::collections::{BTreeMap, BTreeSet};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::entities::Coins;
use crate::errors::CodecError;
use crate::tx::{Msg, Tx};

/// A type with a stable, globally unique name in the codec.
pub trait CodecType: Serialize + DeserializeOwned {
    const TYPE_NAME: &'static str;
}

/// A transaction message type, bound to the route that handles it.
pub trait MsgType: CodecType {
    const ROUTE: &'static str;
}

/// Mutable registry used during startup only.
#[derive(Debug, Default)]
pub struct CodecBuilder {
    msgs: BTreeMap<String, String>,
    states: BTreeSet<String>,
}

impl CodecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a message type under its route. Each name registers once.
    pub fn register_msg<T: MsgType>(&mut self) -> Result<&mut Self, CodecError> {
        if self.msgs.contains_key(T::TYPE_NAME) || self.states.contains(T::TYPE_NAME) {
            return Err(CodecError::DuplicateType(T::TYPE_NAME.to_string()));
        }
        debug!("[Codec] msg {} -> route {}", T::TYPE_NAME, T::ROUTE);
        self.msgs
            .insert(T::TYPE_NAME.to_string(), T::ROUTE.to_string());
        Ok(self)
    }

    /// Register a state (stored or genesis) type. Each name registers once.
    pub fn register_state<T: CodecType>(&mut self) -> Result<&mut Self, CodecError> {
        if self.msgs.contains_key(T::TYPE_NAME) || !self.states.insert(T::TYPE_NAME.to_string()) {
            return Err(CodecError::DuplicateType(T::TYPE_NAME.to_string()));
        }
        debug!("[Codec] state {}", T::TYPE_NAME);
        Ok(self)
    }

    pub fn build(self) -> Codec {
        Codec {
            msgs: self.msgs,
            states: self.states,
        }
    }
}

/// Immutable encode/decode table.
#[derive(Debug)]
pub struct Codec {
    msgs: BTreeMap<String, String>,
    states: BTreeSet<String>,
}

impl Codec {
    pub fn is_registered<T: CodecType>(&self) -> bool {
        self.msgs.contains_key(T::TYPE_NAME) || self.states.contains(T::TYPE_NAME)
    }

    /// Route a registered message type belongs to.
    pub fn route_of(&self, msg_type: &str) -> Option<&str> {
        self.msgs.get(msg_type).map(String::as_str)
    }

    /// Registered message type names, in name order.
    pub fn msg_types(&self) -> impl Iterator<Item = &str> {
        self.msgs.keys().map(String::as_str)
    }

    pub fn encode_binary<T: CodecType>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        self.ensure_registered::<T>()?;
        bincode::serialize(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    pub fn decode_binary<T: CodecType>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        self.ensure_registered::<T>()?;
        bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }

    /// Decode the transaction envelope. The message body stays opaque until
    /// its handler calls [`Codec::decode_msg`].
    pub fn decode_tx(&self, bytes: &[u8]) -> Result<Tx, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }

    /// Decode a message body as `T`, checking that the envelope names `T`
    /// and that `T` was registered for the envelope's route.
    pub fn decode_msg<T: MsgType>(&self, msg: &Msg) -> Result<T, CodecError> {
        if msg.msg_type != T::TYPE_NAME {
            return Err(CodecError::UnregisteredType(msg.msg_type.clone()));
        }
        match self.msgs.get(T::TYPE_NAME) {
            None => return Err(CodecError::UnregisteredType(msg.msg_type.clone())),
            Some(route) if *route != msg.route => {
                return Err(CodecError::RouteMismatch {
                    route: msg.route.clone(),
                    msg_type: msg.msg_type.clone(),
                })
            }
            Some(_) => {}
        }
        serde_json::from_value(msg.value.clone()).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn ensure_registered<T: CodecType>(&self) -> Result<(), CodecError> {
        if self.is_registered::<T>() {
            Ok(())
        } else {
            Err(CodecError::UnregisteredType(T::TYPE_NAME.to_string()))
        }
    }
}

impl CodecType for Coins {
    const TYPE_NAME: &'static str = "Coins";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Ping {
        n: u64,
    }

    impl CodecType for Ping {
        const TYPE_NAME: &'static str = "test/Ping";
    }

    impl MsgType for Ping {
        const ROUTE: &'static str = "test";
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Counter(u64);

    impl CodecType for Counter {
        const TYPE_NAME: &'static str = "test/Counter";
    }

    fn codec() -> Codec {
        let mut builder = CodecBuilder::new();
        builder.register_msg::<Ping>().unwrap();
        builder.register_state::<Counter>().unwrap();
        builder.build()
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut builder = CodecBuilder::new();
        builder.register_msg::<Ping>().unwrap();

        assert!(matches!(
            builder.register_msg::<Ping>(),
            Err(CodecError::DuplicateType(_))
        ));
    }

    #[test]
    fn test_unregistered_type_rejected() {
        let codec = CodecBuilder::new().build();
        assert!(codec.encode_binary(&Counter(1)).is_err());
    }

    #[test]
    fn test_decode_msg_checks_route() {
        let codec = codec();
        let good = Msg::new(&Ping { n: 3 }).unwrap();
        assert_eq!(codec.decode_msg::<Ping>(&good).unwrap(), Ping { n: 3 });

        let wrong_route = Msg::raw("bank", "test/Ping", serde_json::json!({ "n": 3 }));
        assert!(matches!(
            codec.decode_msg::<Ping>(&wrong_route),
            Err(CodecError::RouteMismatch { .. })
        ));
    }

    #[test]
    fn test_binary_encoding_is_stable() {
        let codec = codec();
        let a = codec.encode_binary(&Counter(42)).unwrap();
        let b = codec.encode_binary(&Counter(42)).unwrap();
        assert_eq!(a, b);
        assert_eq!(codec.decode_binary::<Counter>(&a).unwrap(), Counter(42));
    }
}
