//! # Shared Types Crate
//!
//! Types every USDX crate agrees on. Nothing in here touches storage.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-module types are defined once, here.
//! - **Determinism**: amounts are `u128`, prices are fixed-point [`Decimal`],
//!   collections that reach state or events are ordered.
//! - **Explicit configuration**: address prefixes live in a sealed
//!   [`AddressConfig`] passed by reference, never in a mutable global.

pub mod address;
pub mod codec;
pub mod entities;
pub mod errors;
pub mod tx;

pub use address::{AddressConfig, AddressKind, AddressPrefixes};
pub use codec::{Codec, CodecBuilder, CodecType, MsgType};
pub use entities::*;
pub use errors::*;
pub use tx::{Msg, Tx};
