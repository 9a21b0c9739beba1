//! Composition root wiring one store into every service.
//!
//! # Responsibility
//! - Build the shared store, event channel and services from `CoreConfig`.
//! - Run the startup sequence (profile import, session start).
//! - Drive the periodic session refresh at the configured interval.
//!
//! # Invariants
//! - All services share a single `SharedStore` and `AccountEvents`.

use crate::clock::{Clock, SystemClock};
use crate::config::CoreConfig;
use crate::events::AccountEvents;
use crate::logging::{init_logging, LoggingError};
use crate::service::account_service::AccountService;
use crate::service::dev_mode_service::DevModeService;
use crate::service::session_service::SessionTracker;
use crate::model::session::SessionTimeInfo;
use crate::store::{SharedStore, SqliteKeyValueStore, StoreError};
use crate::task::RecurringTask;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug)]
pub enum RuntimeError {
    Logging(LoggingError),
    Store(StoreError),
    Refresh(std::io::Error),
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Refresh(err) => write!(f, "failed to start session refresh: {err}"),
        }
    }
}

impl Error for RuntimeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Refresh(err) => Some(err),
        }
    }
}

impl From<LoggingError> for RuntimeError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<StoreError> for RuntimeError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

pub struct CoreRuntime {
    store: SharedStore,
    events: AccountEvents,
    accounts: Arc<AccountService>,
    sessions: Arc<SessionTracker>,
    dev_mode: DevModeService,
    config: CoreConfig,
}

impl CoreRuntime {
    /// Opens the configured store with the system clock.
    ///
    /// Initializes logging first when `log_dir` is set.
    pub fn open(config: CoreConfig) -> Result<Self, RuntimeError> {
        if let Some(dir) = &config.log_dir {
            init_logging(&config.log_level, dir)?;
        }

        let store: SharedStore = match &config.database_path {
            Some(path) => Arc::new(SqliteKeyValueStore::open(path)?),
            None => Arc::new(SqliteKeyValueStore::open_in_memory()?),
        };
        Ok(Self::with_parts(config, store, Arc::new(SystemClock)))
    }

    /// Builds a runtime over caller-provided store and clock.
    pub fn with_parts(config: CoreConfig, store: SharedStore, clock: Arc<dyn Clock>) -> Self {
        let events = AccountEvents::new();
        let accounts = Arc::new(AccountService::with_policy(
            Arc::clone(&store),
            events.clone(),
            config.active_account_policy,
        ));
        let sessions = Arc::new(SessionTracker::with_heartbeat_interval(
            Arc::clone(&store),
            clock,
            config.heartbeat_interval(),
        ));
        let dev_mode = DevModeService::new(Arc::clone(&store));

        Self {
            store,
            events,
            accounts,
            sessions,
            dev_mode,
            config,
        }
    }

    /// Imports a pending OAuth profile and starts the active session.
    ///
    /// Returns the email whose session was started, if any.
    pub fn start(&self) -> Option<String> {
        self.accounts.initialize_from_external_profile();
        let active = self.accounts.get_active_account();
        match &active {
            Some(identity) => {
                self.sessions.initialize_session(&identity.email);
                info!("event=runtime_start module=runtime status=ok has_active=true");
            }
            None => info!("event=runtime_start module=runtime status=ok has_active=false"),
        }
        active.map(|identity| identity.email)
    }

    /// Reports the active account's session timing every
    /// `refresh_interval_ms`, starting immediately.
    ///
    /// Returns `None` when no account is active. Dropping the returned task
    /// stops the refresh.
    pub fn watch_active_session<F>(
        &self,
        on_tick: F,
    ) -> Result<Option<RecurringTask>, RuntimeError>
    where
        F: FnMut(SessionTimeInfo) + Send + 'static,
    {
        let Some(active) = self.accounts.get_active_account() else {
            return Ok(None);
        };
        let task = self
            .sessions
            .watch_session(&active.email, self.config.refresh_interval(), on_tick)
            .map_err(RuntimeError::Refresh)?;
        info!(
            "event=session_watch module=runtime status=ok interval_ms={}",
            self.config.refresh_interval_ms
        );
        Ok(Some(task))
    }

    /// Flushes the tracked session and stops the heartbeat.
    pub fn shutdown(&self) {
        self.sessions.shutdown();
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn events(&self) -> &AccountEvents {
        &self.events
    }

    pub fn accounts(&self) -> &Arc<AccountService> {
        &self.accounts
    }

    pub fn sessions(&self) -> &Arc<SessionTracker> {
        &self.sessions
    }

    pub fn dev_mode(&self) -> &DevModeService {
        &self.dev_mode
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }
}
