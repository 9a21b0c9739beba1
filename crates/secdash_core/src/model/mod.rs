//! Domain records shared by the account and session services.
//!
//! # Responsibility
//! - Define the persisted JSON shapes of identities and OAuth profiles.
//! - Define session timing snapshots and their display formatting.
//!
//! # Invariants
//! - `Identity::email` is the identity key; no two stored identities share it.
//! - Durations are integer milliseconds.

pub mod identity;
pub mod session;
