//! # Address Prefix Configuration
//!
//! Human-readable prefixes for account, validator-operator and consensus-node
//! identities.
//!
//! ## Lifecycle
//!
//! ```text
//! AddressConfig::new() ──set_*()──→ seal() ──→ Arc<AddressConfig> (read-only)
//! ```
//!
//! - Setters and `seal()` fail once sealed.
//! - `encode`/`decode` fail with [`AddressError::NotSealed`] until sealed.
//!   An unsealed config is never used as a silent default.
//!
//! ## Text Form
//!
//! `<hrp>1<40 hex chars><8 hex chars checksum>`, the checksum being the
//! first four bytes of `SHA-256(hrp || address)`.

use sha2::{Digest, Sha256};

use crate::entities::{Address, ADDRESS_LEN};
use crate::errors::AddressError;

const SEPARATOR: char = '1';
const CHECKSUM_LEN: usize = 4;

/// Which identity is being encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Account,
    AccountPub,
    ValidatorOperator,
    ValidatorOperatorPub,
    ConsensusNode,
    ConsensusNodePub,
}

/// The six human-readable prefixes placed before the hex body and
/// checksum of an encoded address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressPrefixes {
    pub account: String,
    pub account_pub: String,
    pub validator: String,
    pub validator_pub: String,
    pub consensus: String,
    pub consensus_pub: String,
}

impl AddressPrefixes {
    /// Derive the full prefix family from a chain's main prefix
    /// (`usdx` → `usdxpub`, `usdxvaloper`, `usdxvalconspub`, ...).
    pub fn from_main(main: &str) -> Self {
        Self {
            account: main.to_string(),
            account_pub: format!("{main}pub"),
            validator: format!("{main}valoper"),
            validator_pub: format!("{main}valoperpub"),
            consensus: format!("{main}valcons"),
            consensus_pub: format!("{main}valconspub"),
        }
    }

    fn get(&self, kind: AddressKind) -> &str {
        match kind {
            AddressKind::Account => &self.account,
            AddressKind::AccountPub => &self.account_pub,
            AddressKind::ValidatorOperator => &self.validator,
            AddressKind::ValidatorOperatorPub => &self.validator_pub,
            AddressKind::ConsensusNode => &self.consensus,
            AddressKind::ConsensusNodePub => &self.consensus_pub,
        }
    }
}

impl Default for AddressPrefixes {
    fn default() -> Self {
        Self::from_main("cosmos")
    }
}

/// Write-once address configuration.
#[derive(Debug, Clone, Default)]
pub struct AddressConfig {
    prefixes: AddressPrefixes,
    sealed: bool,
}

impl AddressConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sealed configuration for the USDX chain.
    pub fn usdx() -> Self {
        Self {
            prefixes: AddressPrefixes::from_main("usdx"),
            sealed: true,
        }
    }

    pub fn set_account_prefix(&mut self, addr: &str, public: &str) -> Result<(), AddressError> {
        self.ensure_unsealed()?;
        self.prefixes.account = checked_prefix(addr)?;
        self.prefixes.account_pub = checked_prefix(public)?;
        Ok(())
    }

    pub fn set_validator_prefix(&mut self, addr: &str, public: &str) -> Result<(), AddressError> {
        self.ensure_unsealed()?;
        self.prefixes.validator = checked_prefix(addr)?;
        self.prefixes.validator_pub = checked_prefix(public)?;
        Ok(())
    }

    pub fn set_consensus_prefix(&mut self, addr: &str, public: &str) -> Result<(), AddressError> {
        self.ensure_unsealed()?;
        self.prefixes.consensus = checked_prefix(addr)?;
        self.prefixes.consensus_pub = checked_prefix(public)?;
        Ok(())
    }

    /// Freeze the configuration. A second call fails.
    pub fn seal(&mut self) -> Result<(), AddressError> {
        if self.sealed {
            return Err(AddressError::AlreadySealed);
        }
        self.sealed = true;
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn prefixes(&self) -> &AddressPrefixes {
        &self.prefixes
    }

    pub fn encode(&self, kind: AddressKind, address: &Address) -> Result<String, AddressError> {
        self.ensure_sealed()?;
        let hrp = self.prefixes.get(kind);
        let checksum = checksum(hrp, address.as_bytes());
        Ok(format!(
            "{hrp}{SEPARATOR}{}{}",
            hex::encode(address.as_bytes()),
            hex::encode(checksum)
        ))
    }

    pub fn decode(&self, kind: AddressKind, text: &str) -> Result<Address, AddressError> {
        self.ensure_sealed()?;
        let expected = self.prefixes.get(kind);
        let body_len = (ADDRESS_LEN + CHECKSUM_LEN) * 2;
        if !text.is_ascii() || text.len() <= body_len {
            return Err(AddressError::Malformed(text.to_string()));
        }
        let (head, body) = text.split_at(text.len() - body_len);
        let hrp = head
            .strip_suffix(SEPARATOR)
            .ok_or_else(|| AddressError::Malformed(text.to_string()))?;
        if hrp != expected {
            return Err(AddressError::WrongPrefix {
                expected: expected.to_string(),
                actual: hrp.to_string(),
            });
        }
        let raw = hex::decode(body).map_err(|_| AddressError::Malformed(text.to_string()))?;
        let (addr_bytes, sum) = raw.split_at(ADDRESS_LEN);
        if checksum(hrp, addr_bytes).as_slice() != sum {
            return Err(AddressError::Checksum(text.to_string()));
        }
        Address::from_slice(addr_bytes).ok_or_else(|| AddressError::Malformed(text.to_string()))
    }

    /// Shorthand for [`AddressKind::Account`].
    pub fn encode_account(&self, address: &Address) -> Result<String, AddressError> {
        self.encode(AddressKind::Account, address)
    }

    /// Shorthand for [`AddressKind::Account`].
    pub fn decode_account(&self, text: &str) -> Result<Address, AddressError> {
        self.decode(AddressKind::Account, text)
    }

    fn ensure_unsealed(&self) -> Result<(), AddressError> {
        if self.sealed {
            Err(AddressError::Sealed)
        } else {
            Ok(())
        }
    }

    fn ensure_sealed(&self) -> Result<(), AddressError> {
        if self.sealed {
            Ok(())
        } else {
            Err(AddressError::NotSealed)
        }
    }
}

fn checked_prefix(prefix: &str) -> Result<String, AddressError> {
    // Letters only: the decoder relies on the body having a fixed length and
    // the prefix never containing the separator.
    let valid = !prefix.is_empty()
        && prefix.len() <= 32
        && prefix.chars().all(|c| c.is_ascii_lowercase());
    if valid {
        Ok(prefix.to_string())
    } else {
        Err(AddressError::InvalidPrefix(prefix.to_string()))
    }
}

fn checksum(hrp: &str, bytes: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = Sha256::new()
        .chain_update(hrp.as_bytes())
        .chain_update(bytes)
        .finalize();
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_twice_fails() {
        let mut config = AddressConfig::new();
        config.set_account_prefix("usdx", "usdxpub").unwrap();

        assert!(config.seal().is_ok());
        assert_eq!(config.seal(), Err(AddressError::AlreadySealed));
    }

    #[test]
    fn test_setters_fail_after_seal() {
        let mut config = AddressConfig::new();
        config.seal().unwrap();

        assert_eq!(
            config.set_validator_prefix("x", "xpub"),
            Err(AddressError::Sealed)
        );
    }

    #[test]
    fn test_encode_before_seal_fails() {
        let config = AddressConfig::new();
        let addr = Address([1u8; 20]);

        assert_eq!(config.encode_account(&addr), Err(AddressError::NotSealed));
        assert_eq!(
            config.decode_account("cosmos1abc"),
            Err(AddressError::NotSealed)
        );
    }

    #[test]
    fn test_encode_decode() {
        let config = AddressConfig::usdx();
        let addr = Address([0x11u8; 20]);

        let text = config.encode_account(&addr).unwrap();
        assert!(text.starts_with("usdx1"));
        assert_eq!(config.decode_account(&text).unwrap(), addr);

        let val = config.encode(AddressKind::ValidatorOperator, &addr).unwrap();
        assert!(val.starts_with("usdxvaloper1"));
        assert!(config.decode_account(&val).is_err());
    }

    #[test]
    fn test_checksum_detects_typos() {
        let config = AddressConfig::usdx();
        let text = config.encode_account(&Address([0xAB; 20])).unwrap();
        let tampered = text.replacen("ab", "ac", 1);

        assert!(matches!(
            config.decode_account(&tampered),
            Err(AddressError::Checksum(_))
        ));
    }

    #[test]
    fn test_prefix_family_from_main() {
        let config = AddressConfig::usdx();

        let prefixes: &AddressPrefixes = config.prefixes();

        assert_eq!(prefixes, &AddressPrefixes::from_main("usdx"));
        assert_eq!(prefixes.validator_pub, "usdxvaloperpub");
        assert_eq!(prefixes.consensus, "usdxvalcons");
    }

    #[test]
    fn test_invalid_prefix_rejected() {
        let mut config = AddressConfig::new();
        assert!(config.set_account_prefix("US1", "uspub").is_err());
    }
}
