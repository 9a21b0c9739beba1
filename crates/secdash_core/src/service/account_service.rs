//! Multi-account store and active-account selection.
//!
//! # Responsibility
//! - Persist the ordered identity list under `accounts`.
//! - Persist the active identity pointer under `activeAccount`.
//! - Broadcast `ActiveAccountChanged` after every pointer write.
//!
//! # Invariants
//! - At most one stored identity per email; updates keep list position.
//! - Reads never fail: decode or storage errors degrade to empty/none.
//! - Explicit mutations return write failures to the caller, once.

use crate::events::{AccountEvents, ActiveAccountChanged, Subscription};
use crate::model::identity::{Identity, OAuthProfile};
use crate::store::{SharedStore, StoreError};
use log::{error, info, warn};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const ACCOUNTS_KEY: &str = "accounts";
pub const ACTIVE_ACCOUNT_KEY: &str = "activeAccount";
pub const OAUTH_PROFILE_KEY: &str = "oauth_profile";

pub type AccountResult<T> = Result<T, AccountError>;

/// Errors returned by account mutations.
#[derive(Debug)]
pub enum AccountError {
    Store(StoreError),
    Serialization(serde_json::Error),
    /// Active pointer rejected under `ActiveAccountPolicy::RequireKnown`.
    UnknownAccount(String),
}

impl Display for AccountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "failed to encode account data: {err}"),
            Self::UnknownAccount(_) => {
                write!(f, "active account is not present in the stored account list")
            }
        }
    }
}

impl Error for AccountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::UnknownAccount(_) => None,
        }
    }
}

impl From<StoreError> for AccountError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for AccountError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Whether the active pointer must reference a stored identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveAccountPolicy {
    /// Any identity may become active, stored or not.
    #[default]
    Unchecked,
    /// `update_active_account` rejects emails missing from `accounts`.
    RequireKnown,
}

/// Account store service over a shared key-value store.
pub struct AccountService {
    store: SharedStore,
    events: AccountEvents,
    policy: ActiveAccountPolicy,
}

impl AccountService {
    pub fn new(store: SharedStore, events: AccountEvents) -> Self {
        Self::with_policy(store, events, ActiveAccountPolicy::default())
    }

    pub fn with_policy(
        store: SharedStore,
        events: AccountEvents,
        policy: ActiveAccountPolicy,
    ) -> Self {
        Self {
            store,
            events,
            policy,
        }
    }

    pub fn policy(&self) -> ActiveAccountPolicy {
        self.policy
    }

    pub fn events(&self) -> &AccountEvents {
        &self.events
    }

    /// Registers a change listener for the lifetime of the returned guard.
    #[must_use = "dropping the subscription immediately unsubscribes the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ActiveAccountChanged) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    /// Inserts or overwrites `identity` by email, then makes it active.
    ///
    /// # Errors
    /// - Returns encode or storage errors; nothing is retried.
    pub fn store_account(&self, identity: &Identity) -> AccountResult<()> {
        let result = self.upsert_account(identity);
        if let Err(err) = &result {
            error!("event=account_store module=account status=error error={err}");
            return result;
        }
        self.update_active_account(identity)
    }

    fn upsert_account(&self, identity: &Identity) -> AccountResult<()> {
        let mut accounts = self.load_accounts();
        match accounts
            .iter_mut()
            .find(|existing| existing.email == identity.email)
        {
            Some(existing) => *existing = identity.clone(),
            None => accounts.push(identity.clone()),
        }

        let encoded = serde_json::to_string(&accounts)?;
        self.store.set(ACCOUNTS_KEY, &encoded)?;
        info!(
            "event=account_store module=account status=ok accounts={}",
            accounts.len()
        );
        Ok(())
    }

    /// Returns every stored identity in insertion order.
    ///
    /// Returns an empty list when nothing is stored or the payload is
    /// unreadable.
    pub fn load_accounts(&self) -> Vec<Identity> {
        self.read_json::<Vec<Identity>>(ACCOUNTS_KEY)
            .unwrap_or_default()
    }

    /// Returns the active identity, if any.
    pub fn get_active_account(&self) -> Option<Identity> {
        self.read_json::<Identity>(ACTIVE_ACCOUNT_KEY)
    }

    /// Points the active pointer at `identity` and notifies listeners.
    ///
    /// # Errors
    /// - `UnknownAccount` under `RequireKnown` when the email is not stored.
    /// - Encode or storage errors from the pointer write.
    pub fn update_active_account(&self, identity: &Identity) -> AccountResult<()> {
        if self.policy == ActiveAccountPolicy::RequireKnown
            && !self
                .load_accounts()
                .iter()
                .any(|stored| stored.email == identity.email)
        {
            warn!("event=account_activate module=account status=rejected reason=unknown_account");
            return Err(AccountError::UnknownAccount(identity.email.clone()));
        }

        if let Err(err) = self.write_active(identity) {
            error!("event=account_activate module=account status=error error={err}");
            return Err(err);
        }

        info!("event=account_activate module=account status=ok");
        self.notify_active_changed();
        Ok(())
    }

    /// Imports a pending `oauth_profile` payload as the active account.
    ///
    /// No-op when no profile is stored. Malformed payloads and write
    /// failures are logged and swallowed.
    pub fn initialize_from_external_profile(&self) {
        let raw = match self.store.get(OAUTH_PROFILE_KEY) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return,
            Err(err) => {
                error!("event=account_init module=account status=error error={err}");
                return;
            }
        };

        let profile = match serde_json::from_str::<OAuthProfile>(&raw) {
            Ok(profile) => profile,
            Err(err) => {
                warn!("event=account_init module=account status=error error_code=malformed_profile error={err}");
                return;
            }
        };

        let Some(identity) = profile.to_identity() else {
            warn!("event=account_init module=account status=skipped reason=incomplete_profile");
            return;
        };

        match self.store_account(&identity) {
            Ok(()) => info!("event=account_init module=account status=ok"),
            Err(err) => error!("event=account_init module=account status=error error={err}"),
        }
    }

    fn write_active(&self, identity: &Identity) -> AccountResult<()> {
        let encoded = serde_json::to_string(identity)?;
        self.store.set(ACTIVE_ACCOUNT_KEY, &encoded)?;
        Ok(())
    }

    fn notify_active_changed(&self) {
        let event = ActiveAccountChanged {
            active: self.get_active_account(),
        };
        self.events.emit(&event);
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(err) => {
                error!("event=account_read module=account status=error key={key} error={err}");
                return None;
            }
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                error!(
                    "event=account_read module=account status=error key={key} error_code=decode_failed error={err}"
                );
                None
            }
        }
    }
}
