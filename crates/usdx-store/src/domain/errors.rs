use shared_types::ModuleError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Duplicate store key: {0}")]
    DuplicateKey(String),

    #[error("Cannot mount stores after a version has been loaded")]
    MountAfterLoad,

    #[error("Store registry already loaded")]
    AlreadyLoaded,

    #[error("Store registry not loaded")]
    NotLoaded,

    #[error("Store not mounted: {0}")]
    NotMounted(String),

    #[error("Main store key not mounted as persistent: {0}")]
    MainKeyNotMounted(String),

    #[error("Committed version {version} contains unmounted store {name}")]
    UnmountedStore { version: u64, name: String },

    #[error("Corrupt store at version {version}: {reason}")]
    Corrupt { version: u64, reason: String },

    #[error("Write to {0} through a read-only view")]
    ReadOnly(String),

    #[error("Version not available: {0}")]
    VersionNotFound(u64),

    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Errors after which the replica must halt rather than continue.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Corrupt { .. }
                | Self::UnmountedStore { .. }
                | Self::MainKeyNotMounted(_)
                | Self::Database(_)
        )
    }
}

impl From<StoreError> for ModuleError {
    fn from(err: StoreError) -> Self {
        ModuleError::Store(err.to_string())
    }
}
