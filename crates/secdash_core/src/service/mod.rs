//! Core use-case services.
//!
//! # Responsibility
//! - Implement account, session and dev-mode use cases over `KeyValueStore`.
//! - Keep callers decoupled from key layout and value encoding.

pub mod account_service;
pub mod dev_mode_service;
pub mod session_service;
