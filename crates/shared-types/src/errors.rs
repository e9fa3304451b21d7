//! # Error Types
//!
//! Error types shared across crates, and the stable result codes reported to
//! the consensus engine.

use thiserror::Error;

/// Stable result codes. `0` is success; everything else rejects the
/// transaction or query without touching state.
pub mod codes {
    pub const OK: u32 = 0;
    pub const INTERNAL: u32 = 1;
    pub const TX_DECODE: u32 = 2;
    pub const INVALID_SEQUENCE: u32 = 3;
    pub const UNAUTHORIZED: u32 = 4;
    pub const INSUFFICIENT_FUNDS: u32 = 5;
    pub const UNKNOWN_REQUEST: u32 = 6;
    pub const INVALID_ADDRESS: u32 = 7;
    pub const UNKNOWN_ADDRESS: u32 = 9;
    pub const INVALID_COINS: u32 = 10;
    pub const INSUFFICIENT_FEE: u32 = 13;
    pub const NOT_FOUND: u32 = 20;
    pub const INVALID_MSG: u32 = 21;
}

/// Per-transaction / per-query failure raised by a module or by the
/// pre-processing stage.
///
/// These never halt the node: the caller turns them into a result code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    #[error("unknown route: {0}")]
    UnknownRoute(String),

    #[error("unknown request: {0}")]
    UnknownRequest(String),

    #[error("tx decode error: {0}")]
    TxDecode(String),

    #[error("invalid sequence: expected {expected}, got {actual}")]
    InvalidSequence { expected: u64, actual: u64 },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: String, available: String },

    #[error("insufficient fee: required {required}, offered {offered}")]
    InsufficientFee { required: String, offered: String },

    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("unknown address: {0}")]
    UnknownAddress(String),

    #[error("invalid coins: {0}")]
    InvalidCoins(String),

    #[error("arithmetic overflow in {0}")]
    Overflow(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid message: {0}")]
    InvalidMsg(String),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The state view failed underneath the module (read-only violation,
    /// unmounted store, undecodable stored value).
    #[error("store error: {0}")]
    Store(String),
}

impl ModuleError {
    /// Stable result code for this error.
    pub fn code(&self) -> u32 {
        match self {
            Self::UnknownRoute(_) | Self::UnknownRequest(_) => codes::UNKNOWN_REQUEST,
            Self::TxDecode(_) | Self::Codec(_) => codes::TX_DECODE,
            Self::InvalidSequence { .. } => codes::INVALID_SEQUENCE,
            Self::Unauthorized(_) => codes::UNAUTHORIZED,
            Self::InsufficientFunds { .. } => codes::INSUFFICIENT_FUNDS,
            Self::InsufficientFee { .. } => codes::INSUFFICIENT_FEE,
            Self::InvalidAddress(_) => codes::INVALID_ADDRESS,
            Self::UnknownAddress(_) => codes::UNKNOWN_ADDRESS,
            Self::InvalidCoins(_) | Self::Overflow(_) => codes::INVALID_COINS,
            Self::NotFound(_) => codes::NOT_FOUND,
            Self::InvalidMsg(_) => codes::INVALID_MSG,
            Self::Store(_) => codes::INTERNAL,
        }
    }
}

/// Address prefix configuration and text-encoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address configuration is sealed")]
    Sealed,

    #[error("address configuration is already sealed")]
    AlreadySealed,

    #[error("address configuration is not sealed yet")]
    NotSealed,

    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),

    #[error("wrong prefix: expected {expected}, got {actual}")]
    WrongPrefix { expected: String, actual: String },

    #[error("malformed address: {0}")]
    Malformed(String),

    #[error("checksum mismatch for {0}")]
    Checksum(String),
}

/// Codec registration and encoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("type already registered: {0}")]
    DuplicateType(String),

    #[error("type not registered: {0}")]
    UnregisteredType(String),

    #[error("message type {msg_type} does not belong to route {route}")]
    RouteMismatch { route: String, msg_type: String },

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_non_zero() {
        let errors = [
            ModuleError::UnknownRoute("x".into()),
            ModuleError::TxDecode("x".into()),
            ModuleError::Store("x".into()),
            ModuleError::InvalidAddress(AddressError::NotSealed),
        ];
        for err in errors {
            assert_ne!(err.code(), codes::OK, "{err}");
        }
    }

    #[test]
    fn test_unknown_route_code() {
        assert_eq!(
            ModuleError::UnknownRoute("unknown".into()).code(),
            codes::UNKNOWN_REQUEST
        );
    }
}
