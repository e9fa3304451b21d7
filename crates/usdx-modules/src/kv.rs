//! Typed access to store values through the codec.

use serde::Serialize;
use shared_types::{Codec, CodecType, ModuleError};
use usdx_store::{Context, StoreKey};

pub(crate) fn load<T: CodecType>(
    ctx: &Context,
    codec: &Codec,
    key: &StoreKey,
    k: &[u8],
) -> Result<Option<T>, ModuleError> {
    match ctx.get(key, k)? {
        Some(bytes) => Ok(Some(codec.decode_binary(&bytes)?)),
        None => Ok(None),
    }
}

pub(crate) fn save<T: CodecType>(
    ctx: &mut Context,
    codec: &Codec,
    key: &StoreKey,
    k: Vec<u8>,
    value: &T,
) -> Result<(), ModuleError> {
    let bytes = codec.encode_binary(value)?;
    ctx.set(key, k, bytes)?;
    Ok(())
}

/// Every value under `prefix`, in key order.
pub(crate) fn load_all<T: CodecType>(
    ctx: &Context,
    codec: &Codec,
    key: &StoreKey,
    prefix: &[u8],
) -> Result<Vec<T>, ModuleError> {
    ctx.iter_prefix(key, prefix)?
        .into_iter()
        .map(|(_, v)| codec.decode_binary(&v).map_err(ModuleError::from))
        .collect()
}

fn corrupt_counter(k: &[u8]) -> ModuleError {
    ModuleError::Store(format!("corrupt counter {}", String::from_utf8_lossy(k)))
}

pub(crate) fn load_u128(ctx: &Context, key: &StoreKey, k: &[u8]) -> Result<u128, ModuleError> {
    match ctx.get(key, k)? {
        None => Ok(0),
        Some(bytes) => {
            let raw: [u8; 16] = bytes.as_slice().try_into().map_err(|_| corrupt_counter(k))?;
            Ok(u128::from_be_bytes(raw))
        }
    }
}

pub(crate) fn save_u128(
    ctx: &mut Context,
    key: &StoreKey,
    k: &[u8],
    value: u128,
) -> Result<(), ModuleError> {
    ctx.set(key, k.to_vec(), value.to_be_bytes().to_vec())?;
    Ok(())
}

pub(crate) fn load_u64(
    ctx: &Context,
    key: &StoreKey,
    k: &[u8],
) -> Result<Option<u64>, ModuleError> {
    match ctx.get(key, k)? {
        None => Ok(None),
        Some(bytes) => {
            let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| corrupt_counter(k))?;
            Ok(Some(u64::from_be_bytes(raw)))
        }
    }
}

pub(crate) fn save_u64(
    ctx: &mut Context,
    key: &StoreKey,
    k: &[u8],
    value: u64,
) -> Result<(), ModuleError> {
    ctx.set(key, k.to_vec(), value.to_be_bytes().to_vec())?;
    Ok(())
}

/// JSON body of a query response.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>, ModuleError> {
    serde_json::to_vec(value).map_err(|e| ModuleError::Store(format!("response encoding: {e}")))
}
