use secdash_core::{device_fingerprint_hash, DeviceFingerprint, EnvironmentSnapshot};

fn chrome_on_mac() -> EnvironmentSnapshot {
    EnvironmentSnapshot {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                     (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36"
            .to_string(),
        platform: "MacIntel".to_string(),
        screen_width: 1512,
        screen_height: 982,
        color_depth: 30,
        timezone: "Europe/Berlin".to_string(),
        language: "de-DE".to_string(),
        languages: vec!["de-DE".to_string(), "en".to_string()],
        hardware_concurrency: 10,
        device_memory: Some(8),
        touch_support: false,
        cookies_enabled: true,
    }
}

#[test]
fn same_snapshot_produces_same_hash() {
    let env = chrome_on_mac();
    let first = DeviceFingerprint::generate(&env);
    let second = DeviceFingerprint::generate(&env);

    assert_eq!(first.hash, second.hash);
    assert_eq!(first.hash, device_fingerprint_hash(&env));
    assert!(first.hash.starts_with("FP_"));
    assert!(first.hash[3..]
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
}

#[test]
fn known_snapshot_hash_is_stable() {
    let env = EnvironmentSnapshot {
        user_agent: "Mozilla/5.0".to_string(),
        platform: "Linux x86_64".to_string(),
        screen_width: 1920,
        screen_height: 1080,
        color_depth: 24,
        timezone: "Europe/Berlin".to_string(),
        language: "de-DE".to_string(),
        languages: vec!["de-DE".to_string(), "en".to_string()],
        hardware_concurrency: 8,
        device_memory: Some(8),
        touch_support: false,
        cookies_enabled: true,
    };
    assert_eq!(device_fingerprint_hash(&env), "FP_UWB8U3");
}

#[test]
fn any_attribute_change_changes_hash() {
    let base = chrome_on_mac();
    let mut rotated = base.clone();
    rotated.screen_width = 982;
    rotated.screen_height = 1512;

    assert_ne!(
        device_fingerprint_hash(&base),
        device_fingerprint_hash(&rotated)
    );
}

#[test]
fn device_info_extracts_browser_and_os() {
    let info = DeviceFingerprint::generate(&chrome_on_mac()).device_info();
    assert_eq!(info, "Chrome/Mac (1512x982)");
}

#[test]
fn device_info_falls_back_to_platform() {
    let env = EnvironmentSnapshot {
        platform: "FreeBSD amd64".to_string(),
        ..EnvironmentSnapshot::default()
    };
    assert_eq!(
        DeviceFingerprint::generate(&env).device_info(),
        "Browser/FreeBSD amd64 (0x0)"
    );
}

#[test]
fn host_snapshot_is_deterministic() {
    let first = EnvironmentSnapshot::from_host();
    let second = EnvironmentSnapshot::from_host();
    assert_eq!(device_fingerprint_hash(&first), device_fingerprint_hash(&second));
    assert!(first.hardware_concurrency >= 1);
}
