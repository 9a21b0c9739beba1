//! Flat string-keyed persistence shared by all core services.
//!
//! # Responsibility
//! - Define the `KeyValueStore` contract every service depends on.
//! - Provide SQLite-backed and in-memory implementations.
//!
//! # Invariants
//! - Each call is atomic; multi-call read-modify-write sequences are not.
//! - Values are opaque strings; encoding is owned by the calling service.

pub mod kv_store;
pub mod memory_store;
pub mod sqlite_store;

pub use kv_store::{KeyValueStore, SharedStore, StoreError, StoreResult};
pub use memory_store::MemoryKeyValueStore;
pub use sqlite_store::SqliteKeyValueStore;
