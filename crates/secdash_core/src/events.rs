//! Active-account change notifications.
//!
//! # Responsibility
//! - Broadcast `ActiveAccountChanged` to any number of listeners.
//! - Tie each listener registration to a `Subscription` guard.
//!
//! # Invariants
//! - Delivery is synchronous, in subscription order, on the emitting thread.
//! - No queuing and no replay: late subscribers miss earlier emissions.
//! - Listeners may subscribe/unsubscribe from inside a callback.

use crate::model::identity::Identity;
use log::debug;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Payload emitted whenever the active identity pointer is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAccountChanged {
    pub active: Option<Identity>,
}

type Listener = Arc<dyn Fn(&ActiveAccountChanged) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<u64, Listener>>,
}

/// Cloneable handle to one broadcast channel.
#[derive(Clone, Default)]
pub struct AccountEvents {
    registry: Arc<Registry>,
}

impl AccountEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener`; it stays registered while the guard lives.
    #[must_use = "dropping the subscription immediately unsubscribes the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ActiveAccountChanged) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.registry.listeners.lock() {
            listeners.insert(id, Arc::new(listener));
        }
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Delivers `event` to every current listener.
    pub fn emit(&self, event: &ActiveAccountChanged) {
        // Snapshot so callbacks can touch the registry without deadlocking.
        let snapshot: Vec<Listener> = match self.registry.listeners.lock() {
            Ok(listeners) => listeners.values().cloned().collect(),
            Err(_) => return,
        };
        debug!(
            "event=account_changed_emit module=events status=ok listeners={} has_active={}",
            snapshot.len(),
            event.active.is_some()
        );
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry
            .listeners
            .lock()
            .map(|listeners| listeners.len())
            .unwrap_or(0)
    }
}

/// Listener registration guard; unsubscribes on drop.
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut listeners) = registry.listeners.lock() {
                listeners.remove(&self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AccountEvents, ActiveAccountChanged};
    use crate::model::identity::Identity;
    use std::sync::{Arc, Mutex};

    fn changed(email: &str) -> ActiveAccountChanged {
        ActiveAccountChanged {
            active: Some(Identity::new("n", email, "")),
        }
    }

    #[test]
    fn every_subscriber_receives_event() {
        let events = AccountEvents::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first_seen = Arc::clone(&seen);
        let _first = events.subscribe(move |event| {
            first_seen.lock().unwrap().push(("first", event.clone()));
        });
        let second_seen = Arc::clone(&seen);
        let _second = events.subscribe(move |event| {
            second_seen.lock().unwrap().push(("second", event.clone()));
        });

        events.emit(&changed("a@b.com"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, "first");
        assert_eq!(seen[1].0, "second");
    }

    #[test]
    fn late_subscriber_gets_no_replay() {
        let events = AccountEvents::new();
        events.emit(&changed("early@b.com"));

        let count = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&count);
        let _sub = events.subscribe(move |_| *counter.lock().unwrap() += 1);
        assert_eq!(*count.lock().unwrap(), 0);
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let events = AccountEvents::new();
        let count = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&count);
        let sub = events.subscribe(move |_| *counter.lock().unwrap() += 1);

        events.emit(&changed("a@b.com"));
        sub.unsubscribe();
        events.emit(&changed("a@b.com"));

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(events.listener_count(), 0);
    }

    #[test]
    fn listener_can_subscribe_during_emit() {
        let events = AccountEvents::new();
        let inner_events = events.clone();
        let nested = Arc::new(Mutex::new(Vec::new()));
        let nested_store = Arc::clone(&nested);
        let _sub = events.subscribe(move |_| {
            let sub = inner_events.subscribe(|_| {});
            nested_store.lock().unwrap().push(sub);
        });

        events.emit(&changed("a@b.com"));
        assert_eq!(events.listener_count(), 2);
    }
}
