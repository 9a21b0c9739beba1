//! Per-identity session time accounting.
//!
//! # Responsibility
//! - Track session start, accumulated total and last heartbeat per email.
//! - Recover time from sessions that ended without a flush.
//! - Own the heartbeat timer and the unload flush.
//!
//! # Invariants
//! - Stored totals never decrease; negative gaps are clamped to zero.
//! - Arithmetic on stored integers saturates; out-of-range values never panic.
//! - Re-initialization cancels the previous heartbeat before arming a new one.
//! - Reads never fail; unreadable integers are treated as absent.

use crate::clock::Clock;
use crate::model::session::{format_duration, SessionTimeInfo};
use crate::store::{SharedStore, StoreResult};
use crate::task::RecurringTask;
use chrono::{DateTime, Local, Utc};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SESSION_START_PREFIX: &str = "user_session_start";
const TOTAL_TIME_PREFIX: &str = "user_total_time_spent";
const LAST_ACTIVE_PREFIX: &str = "user_last_active";
const FIRST_LOGIN_PREFIX: &str = "user_first_login";

/// Heartbeat period used when none is configured.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
/// Dashboard refresh period used when none is configured.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);
/// Returned by `get_first_login_date` when no session was ever recorded.
pub const FIRST_LOGIN_UNAVAILABLE: &str = "Not available";

const FIRST_LOGIN_FORMAT: &str = "%b %-d, %Y";

pub fn session_start_key(email: &str) -> String {
    format!("{SESSION_START_PREFIX}_{email}")
}

pub fn total_time_key(email: &str) -> String {
    format!("{TOTAL_TIME_PREFIX}_{email}")
}

pub fn last_active_key(email: &str) -> String {
    format!("{LAST_ACTIVE_PREFIX}_{email}")
}

pub fn first_login_key(email: &str) -> String {
    format!("{FIRST_LOGIN_PREFIX}_{email}")
}

struct Heartbeat {
    email: String,
    _task: RecurringTask,
}

/// Session time tracker over a shared key-value store.
pub struct SessionTracker {
    store: SharedStore,
    clock: Arc<dyn Clock>,
    heartbeat_interval: Duration,
    heartbeat: Mutex<Option<Heartbeat>>,
}

impl SessionTracker {
    pub fn new(store: SharedStore, clock: Arc<dyn Clock>) -> Self {
        Self::with_heartbeat_interval(store, clock, DEFAULT_HEARTBEAT_INTERVAL)
    }

    pub fn with_heartbeat_interval(
        store: SharedStore,
        clock: Arc<dyn Clock>,
        heartbeat_interval: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            heartbeat_interval,
            heartbeat: Mutex::new(None),
        }
    }

    /// Email whose heartbeat is currently armed, if any.
    pub fn tracked_email(&self) -> Option<String> {
        self.heartbeat
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|heartbeat| heartbeat.email.clone()))
    }

    /// Starts (or resumes) the session for `email` and arms the heartbeat.
    ///
    /// A last-active heartbeat left by a previous run whose start precedes
    /// it means that session ended without a flush; the time between its
    /// start and its last heartbeat is folded into the total. Whenever a
    /// previous run is detected the session start restarts at now, so time
    /// spent offline is never counted. Empty emails are ignored and storage
    /// failures are logged, not returned.
    pub fn initialize_session(&self, email: &str) {
        if email.is_empty() {
            return;
        }

        if let Err(err) = self.recover_previous_session(email) {
            warn!("event=session_init module=session status=error error={err}");
            return;
        }

        self.arm_heartbeat(email);
    }

    fn recover_previous_session(&self, email: &str) -> StoreResult<()> {
        let start_key = session_start_key(email);
        let now = self.clock.now_ms();
        let existing_start = self.read_millis(&start_key)?;

        if existing_start.is_none() {
            self.store.set(&start_key, &now.to_string())?;
        }
        self.ensure_first_login(email, existing_start.unwrap_or(now))?;

        if let Some(last_active) = self.read_millis(&last_active_key(email))? {
            let session_start = existing_start.unwrap_or(now);
            let gap = last_active.saturating_sub(session_start);
            if gap > 0 {
                self.add_to_total(email, gap)?;
                info!("event=session_recover module=session status=ok recovered_ms={gap}");
            } else {
                // Flushed on unload, or the stored clock went backwards.
                debug!("event=session_recover module=session status=skipped gap_ms={gap}");
            }
            self.store.set(&start_key, &now.to_string())?;
        }

        self.store.set(&last_active_key(email), &now.to_string())?;
        Ok(())
    }

    fn arm_heartbeat(&self, email: &str) {
        let Ok(mut slot) = self.heartbeat.lock() else {
            error!("event=heartbeat_arm module=session status=error error=lock_poisoned");
            return;
        };
        // Cancels and joins the previous timer.
        slot.take();

        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let key = last_active_key(email);
        let spawned = RecurringTask::spawn("heartbeat", self.heartbeat_interval, move || {
            if let Err(err) = store.set(&key, &clock.now_ms().to_string()) {
                debug!("event=heartbeat_tick module=session status=error error={err}");
            }
        });

        match spawned {
            Ok(task) => {
                *slot = Some(Heartbeat {
                    email: email.to_string(),
                    _task: task,
                });
                info!(
                    "event=heartbeat_arm module=session status=ok interval_ms={}",
                    self.heartbeat_interval.as_millis()
                );
            }
            Err(err) => error!("event=heartbeat_arm module=session status=error error={err}"),
        }
    }

    /// Unload hook: stops the heartbeat and flushes the tracked session.
    ///
    /// Best effort; flush errors are logged. Runs automatically on drop.
    pub fn shutdown(&self) {
        let heartbeat = match self.heartbeat.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => return,
        };
        let Some(heartbeat) = heartbeat else {
            return;
        };

        let email = heartbeat.email.clone();
        drop(heartbeat);
        match self.update_total_time_spent(&email) {
            Ok(()) => info!("event=session_shutdown module=session status=ok"),
            Err(err) => warn!("event=session_shutdown module=session status=error error={err}"),
        }
    }

    /// Returns current session and total durations for `email`.
    ///
    /// Does not touch the stored total. Writes a session start first when
    /// none is recorded.
    pub fn get_session_time_info(&self, email: &str) -> SessionTimeInfo {
        let now = self.clock.now_ms();
        if email.is_empty() {
            return SessionTimeInfo::empty(now);
        }

        match self.session_snapshot(email, now) {
            Ok(info) => info,
            Err(err) => {
                warn!("event=session_info module=session status=error error={err}");
                SessionTimeInfo::empty(now)
            }
        }
    }

    fn session_snapshot(&self, email: &str, now: i64) -> StoreResult<SessionTimeInfo> {
        let start_key = session_start_key(email);
        let session_start = match self.read_millis(&start_key)?.filter(|start| *start != 0) {
            Some(start) => start,
            None => {
                self.store.set(&start_key, &now.to_string())?;
                self.ensure_first_login(email, now)?;
                now
            }
        };

        let session_duration = now.saturating_sub(session_start).max(0);
        let previous_total = self.read_millis(&total_time_key(email))?.unwrap_or(0);
        let total_time_spent = previous_total.saturating_add(session_duration);

        Ok(SessionTimeInfo {
            session_start,
            total_time_spent,
            formatted_session_duration: format_duration(session_duration),
            formatted_total_time: format_duration(total_time_spent),
        })
    }

    /// Folds the running session into the stored total and restarts it.
    ///
    /// Each call only captures time since the previous flush. No-op when no
    /// session start is recorded.
    pub fn update_total_time_spent(&self, email: &str) -> StoreResult<()> {
        let start_key = session_start_key(email);
        let Some(session_start) = self.read_millis(&start_key)?.filter(|start| *start != 0)
        else {
            return Ok(());
        };

        let now = self.clock.now_ms();
        self.add_to_total(email, now.saturating_sub(session_start))?;
        self.store.set(&start_key, &now.to_string())?;
        Ok(())
    }

    /// Formats the earliest recorded session start as a short local date.
    ///
    /// Falls back to the current session start for data recorded before
    /// the first-login key existed.
    pub fn get_first_login_date(&self, email: &str) -> String {
        let lookup = self.read_millis(&first_login_key(email)).and_then(|first| match first {
            Some(first) => Ok(Some(first)),
            None => self.read_millis(&session_start_key(email)),
        });
        let start = lookup
            .unwrap_or_else(|err| {
                warn!("event=first_login module=session status=error error={err}");
                None
            })
            .filter(|start| *start != 0);

        start
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|utc| {
                utc.with_timezone(&Local)
                    .format(FIRST_LOGIN_FORMAT)
                    .to_string()
            })
            .unwrap_or_else(|| FIRST_LOGIN_UNAVAILABLE.to_string())
    }

    /// Calls `on_tick` now and then every `interval` with fresh timing.
    ///
    /// Dropping the returned task stops the refresh.
    pub fn watch_session<F>(
        self: &Arc<Self>,
        email: &str,
        interval: Duration,
        mut on_tick: F,
    ) -> std::io::Result<RecurringTask>
    where
        F: FnMut(SessionTimeInfo) + Send + 'static,
    {
        on_tick(self.get_session_time_info(email));

        // Weak so the refresh never keeps the tracker (and its heartbeat) alive.
        let tracker = Arc::downgrade(self);
        let email = email.to_string();
        RecurringTask::spawn("session-refresh", interval, move || {
            if let Some(tracker) = tracker.upgrade() {
                on_tick(tracker.get_session_time_info(&email));
            }
        })
    }

    fn ensure_first_login(&self, email: &str, candidate: i64) -> StoreResult<()> {
        let key = first_login_key(email);
        if self.read_millis(&key)?.is_none() {
            self.store.set(&key, &candidate.to_string())?;
        }
        Ok(())
    }

    fn add_to_total(&self, email: &str, delta_ms: i64) -> StoreResult<()> {
        let key = total_time_key(email);
        let previous = self.read_millis(&key)?.unwrap_or(0);
        let updated = previous.saturating_add(delta_ms.max(0));
        self.store.set(&key, &updated.to_string())
    }

    fn read_millis(&self, key: &str) -> StoreResult<Option<i64>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match raw.trim().parse::<i64>() {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                warn!(
                    "event=session_read module=session status=error key_kind={} error_code=not_an_integer",
                    key_kind(key)
                );
                Ok(None)
            }
        }
    }
}

impl Drop for SessionTracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn key_kind(key: &str) -> &'static str {
    [
        SESSION_START_PREFIX,
        TOTAL_TIME_PREFIX,
        LAST_ACTIVE_PREFIX,
        FIRST_LOGIN_PREFIX,
    ]
    .into_iter()
    .find(|prefix| key.starts_with(prefix))
    .unwrap_or("unknown")
}
