//! Core domain logic for SecDash.
//! Local multi-account identity cache, session-time accounting and device
//! fingerprinting over a flat key-value store.

pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod device;
pub mod events;
pub mod logging;
pub mod model;
pub mod runtime;
pub mod service;
pub mod store;
pub mod task;

pub use auth::identity_bridge::{
    BridgeError, BridgeResult, IdentityBridge, IdentityProvider, SignInRequest,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use device::fingerprint::{device_fingerprint_hash, DeviceFingerprint, EnvironmentSnapshot};
pub use events::{AccountEvents, ActiveAccountChanged, Subscription};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::identity::{Identity, OAuthProfile};
pub use model::session::{format_duration, SessionTimeInfo};
pub use runtime::{CoreRuntime, RuntimeError};
pub use service::account_service::{
    AccountError, AccountResult, AccountService, ActiveAccountPolicy,
};
pub use service::dev_mode_service::DevModeService;
pub use service::session_service::SessionTracker;
pub use store::{
    KeyValueStore, MemoryKeyValueStore, SharedStore, SqliteKeyValueStore, StoreError, StoreResult,
};
pub use task::RecurringTask;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
