pub mod database;

pub use database::{StoredVersion, VersionedDatabase};
