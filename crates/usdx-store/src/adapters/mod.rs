pub mod memory_db;

pub use memory_db::InMemoryVersionedDb;
