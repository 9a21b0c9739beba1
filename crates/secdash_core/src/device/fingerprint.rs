//! Deterministic device fingerprinting.
//!
//! # Responsibility
//! - Capture the environment attributes that identify a device.
//! - Derive a short, stable, non-cryptographic hash from them.
//!
//! # Invariants
//! - Same snapshot, same hash. Nothing is persisted.
//! - Attribute order in the hash input is fixed.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

const HASH_PREFIX: &str = "FP_";
const FIELD_DELIMITER: &str = "|";
const UNKNOWN: &str = "Unknown";
const MEMORY_UNAVAILABLE: &str = "N/A";
const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

static BROWSER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(Chrome|Safari|Firefox|Edge|Opera)/[\d.]+").expect("valid browser regex")
});
static OS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(Win|Mac|Linux|Android|iOS)").expect("valid os regex"));

/// Environment attributes feeding the fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSnapshot {
    pub user_agent: String,
    pub platform: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub color_depth: u32,
    pub timezone: String,
    pub language: String,
    pub languages: Vec<String>,
    pub hardware_concurrency: u32,
    /// Approximate device memory in GiB, when the host exposes it.
    pub device_memory: Option<u32>,
    pub touch_support: bool,
    pub cookies_enabled: bool,
}

impl Default for EnvironmentSnapshot {
    fn default() -> Self {
        Self {
            user_agent: UNKNOWN.to_string(),
            platform: UNKNOWN.to_string(),
            screen_width: 0,
            screen_height: 0,
            color_depth: 24,
            timezone: UNKNOWN.to_string(),
            language: "en-US".to_string(),
            languages: vec!["en-US".to_string()],
            hardware_concurrency: 4,
            device_memory: None,
            touch_support: false,
            cookies_enabled: true,
        }
    }
}

impl EnvironmentSnapshot {
    /// Best-effort snapshot of the running process's host.
    ///
    /// Reads `TZ`, `LANG`/`LC_ALL`, `LANGUAGE` and `COLUMNS`x`LINES`;
    /// anything missing keeps its default.
    pub fn from_host() -> Self {
        let defaults = Self::default();
        let language = std::env::var("LC_ALL")
            .ok()
            .or_else(|| std::env::var("LANG").ok())
            .and_then(|raw| posix_locale_to_tag(&raw))
            .unwrap_or(defaults.language);
        let languages = std::env::var("LANGUAGE")
            .ok()
            .map(|raw| {
                raw.split(':')
                    .filter_map(posix_locale_to_tag)
                    .collect::<Vec<_>>()
            })
            .filter(|tags| !tags.is_empty())
            .unwrap_or_else(|| vec![language.clone()]);

        Self {
            user_agent: format!("secdash/{}", env!("CARGO_PKG_VERSION")),
            platform: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            screen_width: env_u32("COLUMNS").unwrap_or(defaults.screen_width),
            screen_height: env_u32("LINES").unwrap_or(defaults.screen_height),
            timezone: std::env::var("TZ")
                .ok()
                .filter(|tz| !tz.is_empty())
                .unwrap_or(defaults.timezone),
            language,
            languages,
            hardware_concurrency: std::thread::available_parallelism()
                .ok()
                .and_then(|count| u32::try_from(count.get()).ok())
                .unwrap_or(defaults.hardware_concurrency),
            ..defaults
        }
    }

    pub fn screen_resolution(&self) -> String {
        format!("{}x{}", self.screen_width, self.screen_height)
    }

    fn hash_input(&self) -> String {
        [
            self.user_agent.clone(),
            self.platform.clone(),
            self.screen_resolution(),
            self.color_depth.to_string(),
            self.timezone.clone(),
            self.language.clone(),
            self.languages.join(","),
            self.hardware_concurrency.to_string(),
            self.device_memory
                .map_or_else(|| MEMORY_UNAVAILABLE.to_string(), |gib| gib.to_string()),
            self.touch_support.to_string(),
            self.cookies_enabled.to_string(),
        ]
        .join(FIELD_DELIMITER)
    }
}

/// Fingerprint hash plus the snapshot it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceFingerprint {
    pub hash: String,
    #[serde(flatten)]
    pub environment: EnvironmentSnapshot,
}

impl DeviceFingerprint {
    pub fn generate(environment: &EnvironmentSnapshot) -> Self {
        Self {
            hash: format!("{HASH_PREFIX}{}", hash_string(&environment.hash_input())),
            environment: environment.clone(),
        }
    }

    /// Short `browser/os (WxH)` label for display.
    pub fn device_info(&self) -> String {
        let env = &self.environment;
        let browser = BROWSER_RE
            .captures(&env.user_agent)
            .and_then(|captures| captures.get(1))
            .map_or("Browser", |found| found.as_str());
        let os = OS_RE
            .find(&env.platform)
            .map_or(env.platform.as_str(), |found| found.as_str());
        format!("{browser}/{os} ({})", env.screen_resolution())
    }
}

/// Shorthand for `DeviceFingerprint::generate(environment).hash`.
pub fn device_fingerprint_hash(environment: &EnvironmentSnapshot) -> String {
    DeviceFingerprint::generate(environment).hash
}

/// 31-multiplier rolling hash over UTF-16 code units, rendered in base 36.
///
/// Arithmetic wraps at `i32`; the sign is dropped before encoding.
pub fn hash_string(input: &str) -> String {
    let hash = input.encode_utf16().fold(0i32, |hash, unit| {
        (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit))
    });
    to_base36(hash.unsigned_abs())
}

fn to_base36(mut value: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok()?.trim().parse().ok()
}

fn posix_locale_to_tag(raw: &str) -> Option<String> {
    let base = raw.split(['.', '@']).next()?.trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}
