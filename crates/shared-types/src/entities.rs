//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: [`Address`], module account derivation
//! - **Value**: [`Coin`], [`Coins`], [`Decimal`]
//! - **Block**: [`BlockHeader`], [`Event`]
//!
//! ## Type Decisions
//!
//! - `amount: u128` - Covers every practical supply while keeping arithmetic
//!   in native integers. All arithmetic is checked; overflow is an error,
//!   never a wrap.
//! - `Decimal` - Fixed point with 18 fractional digits. Floating point is
//!   forbidden in replicated state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{serde_as, DisplayFromStr};
use sha2::{Digest, Sha256};

use crate::errors::ModuleError;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Length of every account address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// A 20-byte account address.
///
/// Human-readable serializers (JSON) see lowercase hex; binary serializers
/// see the raw bytes. The prefixed text form is produced by
/// [`crate::AddressConfig`] only.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// Build an address from a byte slice of exactly [`ADDRESS_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let array: [u8; ADDRESS_LEN] = bytes.try_into().ok()?;
        Some(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            let bytes = hex::decode(&text).map_err(serde::de::Error::custom)?;
            Address::from_slice(&bytes)
                .ok_or_else(|| serde::de::Error::custom("address must be 20 bytes"))
        } else {
            <[u8; ADDRESS_LEN]>::deserialize(deserializer).map(Address)
        }
    }
}

/// Deterministic address of a module-owned account.
///
/// Derived as the first 20 bytes of `SHA-256("module:" || name)`; no key
/// pair exists for it, so only the owning module can move its funds.
pub fn module_address(name: &str) -> Address {
    let digest = Sha256::new()
        .chain_update(b"module:")
        .chain_update(name.as_bytes())
        .finalize();
    let mut out = [0u8; ADDRESS_LEN];
    out.copy_from_slice(&digest[..ADDRESS_LEN]);
    Address(out)
}

// =============================================================================
// CLUSTER B: VALUE
// =============================================================================

/// A single denomination amount.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde_as(as = "DisplayFromStr")]
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Denoms are `[a-z][a-z0-9]{2,15}`.
    pub fn validate_denom(denom: &str) -> Result<(), ModuleError> {
        let mut chars = denom.chars();
        let valid_head = chars.next().is_some_and(|c| c.is_ascii_lowercase());
        let valid_tail = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if valid_head && valid_tail && (3..=16).contains(&denom.len()) {
            Ok(())
        } else {
            Err(ModuleError::InvalidCoins(format!("invalid denom: {denom}")))
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| ModuleError::InvalidCoins(format!("missing denom: {s}")))?;
        let (amount, denom) = s.split_at(split);
        let amount = amount
            .parse::<u128>()
            .map_err(|_| ModuleError::InvalidCoins(format!("invalid amount: {s}")))?;
        Coin::validate_denom(denom)?;
        Ok(Coin::new(denom, amount))
    }
}

/// A normalized multi-denomination amount.
///
/// ## Invariants
///
/// - Sorted by denom, denoms unique.
/// - No zero amounts.
///
/// Deserialization goes through [`Coins::new`], so a decoded value always
/// upholds the invariants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coin>", into = "Vec<Coin>")]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// Validate and normalize. Duplicate denoms are rejected rather than
    /// merged; zero amounts are dropped.
    pub fn new(mut coins: Vec<Coin>) -> Result<Self, ModuleError> {
        for coin in &coins {
            Coin::validate_denom(&coin.denom)?;
        }
        coins.retain(|c| c.amount > 0);
        coins.sort_by(|a, b| a.denom.cmp(&b.denom));
        if coins.windows(2).any(|w| w[0].denom == w[1].denom) {
            return Err(ModuleError::InvalidCoins("duplicate denom".to_string()));
        }
        Ok(Self(coins))
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Single-denom coins; a zero amount yields the empty set.
    pub fn from_coin(coin: Coin) -> Result<Self, ModuleError> {
        Self::new(vec![coin])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    pub fn denoms(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|c| c.denom.as_str())
    }

    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0
            .binary_search_by(|c| c.denom.as_str().cmp(denom))
            .map(|i| self.0[i].amount)
            .unwrap_or(0)
    }

    /// `self >= other` for every denom in `other`.
    pub fn is_all_gte(&self, other: &Coins) -> bool {
        other.iter().all(|c| self.amount_of(&c.denom) >= c.amount)
    }

    pub fn checked_add(&self, other: &Coins) -> Result<Coins, ModuleError> {
        let mut merged = self.0.clone();
        for coin in other.iter() {
            match merged.binary_search_by(|c| c.denom.cmp(&coin.denom)) {
                Ok(i) => {
                    merged[i].amount = merged[i]
                        .amount
                        .checked_add(coin.amount)
                        .ok_or_else(|| ModuleError::Overflow(coin.denom.clone()))?;
                }
                Err(i) => merged.insert(i, coin.clone()),
            }
        }
        Ok(Coins(merged))
    }

    /// Subtract, failing with `InsufficientFunds` when any denom would go
    /// negative.
    pub fn checked_sub(&self, other: &Coins) -> Result<Coins, ModuleError> {
        if !self.is_all_gte(other) {
            return Err(ModuleError::InsufficientFunds {
                required: other.to_string(),
                available: self.to_string(),
            });
        }
        let mut out = self.0.clone();
        for coin in other.iter() {
            if let Ok(i) = out.binary_search_by(|c| c.denom.cmp(&coin.denom)) {
                out[i].amount -= coin.amount;
            }
        }
        out.retain(|c| c.amount > 0);
        Ok(Coins(out))
    }
}

impl TryFrom<Vec<Coin>> for Coins {
    type Error = ModuleError;

    fn try_from(value: Vec<Coin>) -> Result<Self, Self::Error> {
        Coins::new(value)
    }
}

impl From<Coins> for Vec<Coin> {
    fn from(value: Coins) -> Self {
        value.0
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(Coin::to_string).collect();
        f.write_str(&parts.join(","))
    }
}

impl FromStr for Coins {
    type Err = ModuleError;

    /// Parses `"100ux,5usdx"`. The empty string is the empty set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Coins::empty());
        }
        let coins = trimmed
            .split(',')
            .map(|part| part.trim().parse::<Coin>())
            .collect::<Result<Vec<_>, _>>()?;
        Coins::new(coins)
    }
}

/// Number of fractional digits carried by [`Decimal`].
pub const DECIMAL_PRECISION: u32 = 18;

const DECIMAL_ONE: u128 = 10u128.pow(DECIMAL_PRECISION);

/// Unsigned fixed-point number with 18 fractional digits.
///
/// Serialized as its canonical string, e.g. `"1.500000000000000000"`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Decimal(u128);

impl Decimal {
    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn one() -> Self {
        Self(DECIMAL_ONE)
    }

    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u128 {
        self.0
    }

    pub fn from_int(value: u128) -> Option<Self> {
        value.checked_mul(DECIMAL_ONE).map(Self)
    }

    /// `numerator / denominator`, truncated. `None` on a zero denominator
    /// or overflow.
    pub fn from_ratio(numerator: u128, denominator: u128) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        numerator
            .checked_mul(DECIMAL_ONE)
            .map(|n| Self(n / denominator))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Decimal) -> Option<Decimal> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Integer amount times this decimal, truncated toward zero.
    pub fn checked_mul_int(self, amount: u128) -> Option<u128> {
        amount.checked_mul(self.0).map(|v| v / DECIMAL_ONE)
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({self})")
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:0width$}",
            self.0 / DECIMAL_ONE,
            self.0 % DECIMAL_ONE,
            width = DECIMAL_PRECISION as usize
        )
    }
}

impl FromStr for Decimal {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModuleError::InvalidMsg(format!("invalid decimal: {s}"));
        let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
        if int_part.is_empty() || frac_part.len() > DECIMAL_PRECISION as usize {
            return Err(invalid());
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let int_value = int_part.parse::<u128>().map_err(|_| invalid())?;
        let frac_value = if frac_part.is_empty() {
            0
        } else {
            let scale = 10u128.pow(DECIMAL_PRECISION - frac_part.len() as u32);
            frac_part.parse::<u128>().map_err(|_| invalid())? * scale
        };
        int_value
            .checked_mul(DECIMAL_ONE)
            .and_then(|v| v.checked_add(frac_value))
            .map(Decimal)
            .ok_or_else(invalid)
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Median of a list of decimals; the mean of the two middle values for even
/// lengths. `None` for an empty list.
pub fn median(values: &[Decimal]) -> Option<Decimal> {
    let mut sorted = values.to_vec();
    sorted.sort();
    let len = sorted.len();
    match len {
        0 => None,
        _ if len % 2 == 1 => Some(sorted[len / 2]),
        _ => {
            let (a, b) = (sorted[len / 2 - 1], sorted[len / 2]);
            // (a + b) / 2 without overflowing the sum
            Some(Decimal(a.0 / 2 + b.0 / 2 + (a.0 % 2 + b.0 % 2) / 2))
        }
    }
}

// =============================================================================
// CLUSTER C: BLOCK
// =============================================================================

/// Block header as delivered by the consensus engine.
///
/// `time` is consensus time (seconds). It is replicated, so modules may read
/// it; the node's wall clock is never consulted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockHeader {
    pub chain_id: String,
    pub height: u64,
    pub time: u64,
}

impl BlockHeader {
    pub fn new(chain_id: impl Into<String>, height: u64, time: u64) -> Self {
        Self {
            chain_id: chain_id.into(),
            height,
            time,
        }
    }
}

/// Key/value pair attached to an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

/// An ordered event record ("tag" set) emitted by a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: String,
    pub attributes: Vec<Attribute>,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    /// Append an attribute, preserving insertion order.
    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push(Attribute {
            key: key.into(),
            value: value.to_string(),
        });
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coins(s: &str) -> Coins {
        s.parse().unwrap()
    }

    #[test]
    fn test_coins_normalized() {
        let c = Coins::new(vec![
            Coin::new("usdx", 5),
            Coin::new("unitx", 100),
            Coin::new("xrp", 0),
        ])
        .unwrap();

        let denoms: Vec<&str> = c.denoms().collect();
        assert_eq!(denoms, vec!["unitx", "usdx"]);
        assert_eq!(c.to_string(), "100unitx,5usdx");
    }

    #[test]
    fn test_coins_reject_duplicates_and_bad_denoms() {
        assert!(Coins::new(vec![Coin::new("usdx", 1), Coin::new("usdx", 2)]).is_err());
        assert!(Coins::new(vec![Coin::new("U", 1)]).is_err());
        assert!("10".parse::<Coins>().is_err());
    }

    #[test]
    fn test_coins_arithmetic() {
        let a = coins("100unitx,5usdx");
        let b = coins("40unitx");

        assert_eq!(a.checked_add(&b).unwrap(), coins("140unitx,5usdx"));
        assert_eq!(a.checked_sub(&b).unwrap(), coins("60unitx,5usdx"));
        assert_eq!(a.checked_sub(&coins("5usdx")).unwrap(), coins("100unitx"));

        let err = b.checked_sub(&a).unwrap_err();
        assert!(matches!(err, ModuleError::InsufficientFunds { .. }));
    }

    #[test]
    fn test_coins_json_amounts_are_strings() {
        let json = serde_json::to_string(&coins("100unitx")).unwrap();
        assert_eq!(json, r#"[{"denom":"unitx","amount":"100"}]"#);

        let back: Coins = serde_json::from_str(&json).unwrap();
        assert_eq!(back.amount_of("unitx"), 100);

        let bad = r#"[{"denom":"unitx","amount":"1"},{"denom":"unitx","amount":"2"}]"#;
        assert!(serde_json::from_str::<Coins>(bad).is_err());
    }

    #[test]
    fn test_decimal_parse_and_display() {
        let d: Decimal = "1.5".parse().unwrap();
        assert_eq!(d.to_string(), "1.500000000000000000");
        assert_eq!(d.checked_mul_int(10), Some(15));

        assert!("1.".parse::<Decimal>().is_ok());
        assert!("-1".parse::<Decimal>().is_err());
        assert!("0.0000000000000000001".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_decimal_ratio() {
        let d = Decimal::from_ratio(3, 2).unwrap();
        assert_eq!(d, "1.5".parse().unwrap());
        assert!(Decimal::from_ratio(1, 0).is_none());
    }

    #[test]
    fn test_median() {
        let v: Vec<Decimal> = ["3", "1", "2"].iter().map(|s| s.parse().unwrap()).collect();
        assert_eq!(median(&v), Some("2".parse().unwrap()));

        let v: Vec<Decimal> = ["1", "2"].iter().map(|s| s.parse().unwrap()).collect();
        assert_eq!(median(&v), Some("1.5".parse().unwrap()));

        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_module_address_deterministic() {
        assert_eq!(module_address("cdp"), module_address("cdp"));
        assert_ne!(module_address("cdp"), module_address("auction"));
    }

    #[test]
    fn test_address_serde_forms() {
        let addr = Address([7u8; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", "07".repeat(20)));

        let bin = bincode::serialize(&addr).unwrap();
        assert_eq!(bin.len(), 20);
        assert_eq!(bincode::deserialize::<Address>(&bin).unwrap(), addr);
    }
}
