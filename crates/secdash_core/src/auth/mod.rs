//! External identity provider adapter.
//!
//! # Responsibility
//! - Build sign-in requests for the delegated OAuth flow.
//! - Map returned OAuth profiles into stored identities.
//!
//! # Invariants
//! - Sign-in is fire-and-forget; responses arrive via `oauth_profile`.

pub mod identity_bridge;
