//! Device identification helpers.

pub mod fingerprint;
