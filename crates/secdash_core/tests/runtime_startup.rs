use secdash_core::service::account_service::OAUTH_PROFILE_KEY;
use secdash_core::service::session_service::total_time_key;
use secdash_core::{
    CoreConfig, CoreRuntime, Identity, KeyValueStore, ManualClock, MemoryKeyValueStore,
    SharedStore,
};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const T0: i64 = 1_760_000_000_000;

fn runtime() -> (SharedStore, Arc<ManualClock>, CoreRuntime) {
    let store: SharedStore = Arc::new(MemoryKeyValueStore::new());
    let clock = Arc::new(ManualClock::new(T0));
    let runtime =
        CoreRuntime::with_parts(CoreConfig::default(), Arc::clone(&store), clock.clone());
    (store, clock, runtime)
}

#[test]
fn start_without_profile_or_active_account_tracks_nothing() {
    let (_, _, runtime) = runtime();
    assert_eq!(runtime.start(), None);
    assert!(runtime.sessions().tracked_email().is_none());
}

#[test]
fn start_imports_profile_notifies_and_tracks_session() {
    let (store, clock, runtime) = runtime();
    store
        .set(OAUTH_PROFILE_KEY, r#"{"name":"Alice","email":"a@b.com"}"#)
        .unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = runtime
        .events()
        .subscribe(move |event| sink.lock().unwrap().push(event.active.clone()));

    assert_eq!(runtime.start().as_deref(), Some("a@b.com"));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![Some(Identity::new("Alice", "a@b.com", ""))]
    );
    assert_eq!(
        runtime.sessions().tracked_email().as_deref(),
        Some("a@b.com")
    );

    clock.advance(65_000);
    assert_eq!(
        runtime
            .sessions()
            .get_session_time_info("a@b.com")
            .formatted_session_duration,
        "1m 5s"
    );

    runtime.shutdown();
    assert_eq!(
        store.get(&total_time_key("a@b.com")).unwrap().as_deref(),
        Some("65000")
    );
}

#[test]
fn open_with_database_path_persists_dev_mode() {
    let dir = tempfile::tempdir().unwrap();
    let config = CoreConfig {
        database_path: Some(dir.path().join("secdash.db")),
        ..CoreConfig::default()
    };

    {
        let runtime = CoreRuntime::open(config.clone()).unwrap();
        runtime.dev_mode().enable().unwrap();
    }

    let runtime = CoreRuntime::open(config).unwrap();
    assert!(runtime.dev_mode().is_enabled());
}

#[test]
fn watch_active_session_is_none_without_active_account() {
    let (_, _, runtime) = runtime();
    let task = runtime.watch_active_session(|_| {}).unwrap();
    assert!(task.is_none());
}

#[test]
fn watch_active_session_ticks_at_configured_refresh_interval() {
    let store: SharedStore = Arc::new(MemoryKeyValueStore::new());
    let clock = Arc::new(ManualClock::new(T0));
    let config = CoreConfig {
        refresh_interval_ms: 20,
        ..CoreConfig::default()
    };
    let runtime = CoreRuntime::with_parts(config, Arc::clone(&store), clock.clone());
    runtime
        .accounts()
        .store_account(&Identity::new("Alice", "a@b.com", ""))
        .unwrap();
    assert_eq!(runtime.start().as_deref(), Some("a@b.com"));

    let ticks = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&ticks);
    clock.advance(5_000);
    let task = runtime
        .watch_active_session(move |info| {
            sink.lock().unwrap().push(info.formatted_session_duration)
        })
        .unwrap()
        .expect("active account is set");

    assert_eq!(ticks.lock().unwrap().first().map(String::as_str), Some("5s"));

    let deadline = Instant::now() + Duration::from_secs(5);
    while ticks.lock().unwrap().len() < 3 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    task.cancel();

    let seen = ticks.lock().unwrap().len();
    assert!(seen >= 3, "expected repeated refresh ticks, saw {seen}");
    thread::sleep(Duration::from_millis(60));
    assert_eq!(ticks.lock().unwrap().len(), seen);
}
