//! # Application Container
//!
//! Configuration, the mounted store keys and the keeper set they back.

pub mod config;
pub mod keepers;

pub use config::{AppConfig, ConfigError};
pub use keepers::{AppStoreKeys, KeeperSet, KeeperSetBuilder, MAIN_STORE_KEY};
