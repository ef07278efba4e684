//! Storage backends for the snip URL shortener.
//!
//! Mapping stores ([`InMemoryStore`], [`MySqlStore`]) and the shared Redis
//! counter used by the counter-encoding strategy.

pub mod memory;
pub mod mysql;
pub mod redis;

pub use self::redis::RedisCounter;
pub use memory::InMemoryStore;
pub use mysql::MySqlStore;
pub use snip_core::store::{MappingStore, Result};
pub use snip_core::StorageError;
