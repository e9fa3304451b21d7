use std::fmt;

/// Lifetime of a namespace's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreKind {
    /// Committed with every version.
    Persistent,
    /// Visible for the rest of the block, dropped at commit.
    Transient,
}

/// Name of one key-value namespace.
///
/// Names are unique across the application; the registry refuses to mount
/// two keys with the same name, whatever their kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreKey {
    name: String,
    kind: StoreKind,
}

impl StoreKey {
    pub fn persistent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StoreKind::Persistent,
        }
    }

    pub fn transient(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StoreKind::Transient,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    pub fn is_transient(&self) -> bool {
        self.kind == StoreKind::Transient
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Concatenate a namespace-internal prefix and a key.
pub fn prefixed(prefix: &[u8], key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + key.len());
    out.extend_from_slice(prefix);
    out.extend_from_slice(key);
    out
}
