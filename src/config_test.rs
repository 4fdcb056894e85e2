use super::*;
use std::sync::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = Mutex::new(());

const VARS: &[&str] = &[
    "OPENWEATHER_API_KEY",
    "META_SEGMENTS",
    "META_TIMEZONE",
    "META_CITY_ID",
    "META_WEATHER_BASE_URL",
    "META_WEATHER_ICON_URL",
    "META_METALS_BASE_URL",
    "META_FX_BASE_URL",
    "META_TARGET_CURRENCY",
    "META_CURRENCY_PREFIX",
    "META_CLOCK_PERIOD_SECS",
    "META_WEATHER_PERIOD_SECS",
    "META_METALS_PERIOD_SECS",
    "META_REQUEST_TIMEOUT_SECS",
    "META_CONNECT_TIMEOUT_SECS",
    "META_WEATHER_FAILURE",
    "META_METALS_FAILURE",
    "META_THEME_FILE",
    "META_SYSTEM_THEME",
    "META_PREFERS_DARK",
];

/// Serialize env access across tests and start from a clean slate.
fn clean_env() -> MutexGuard<'static, ()> {
    let guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    // SAFETY: every test touching these vars holds `ENV_LOCK`.
    unsafe {
        for var in VARS {
            std::env::remove_var(var);
        }
    }
    guard
}

fn set(var: &str, value: &str) {
    // SAFETY: callers hold `ENV_LOCK`.
    unsafe { std::env::set_var(var, value) };
}

// =============================================================================
// from_env
// =============================================================================

#[test]
fn from_env_defaults_match_toronto_header() {
    let _guard = clean_env();

    let cfg = MetaConfig::from_env().unwrap();
    assert_eq!(cfg, MetaConfig::default());
    assert_eq!(cfg.timezone, chrono_tz::America::Toronto);
    assert_eq!(cfg.segments, SegmentKey::ALL.to_vec());
    assert_eq!(cfg.clock_period_secs, 1);
    assert_eq!(cfg.weather.period_secs, 600);
    assert_eq!(cfg.metals.period_secs, 300);
    assert_eq!(cfg.weather.city_id, "6167865");
    assert_eq!(cfg.weather.failure, FailurePolicy::Hide);
    assert_eq!(cfg.metals.failure, FailurePolicy::Fallback("N/A".into()));
    assert_eq!(cfg.metals.currency, "CAD");
    assert_eq!(cfg.theme.system_policy, SystemThemePolicy::ForceDark);
    assert_eq!(cfg.timeouts, FetchTimeouts { request_secs: 10, connect_secs: 5 });
}

#[test]
fn weather_inactive_without_api_key() {
    let _guard = clean_env();

    let cfg = MetaConfig::from_env().unwrap();
    assert!(cfg.weather.api_key.is_none());
    assert_eq!(cfg.active_segments(), vec![SegmentKey::Time, SegmentKey::Metals]);

    set("OPENWEATHER_API_KEY", "k");
    let cfg = MetaConfig::from_env().unwrap();
    assert_eq!(cfg.active_segments(), SegmentKey::ALL.to_vec());
}

#[test]
fn from_env_parses_overrides() {
    let _guard = clean_env();
    set("OPENWEATHER_API_KEY", "secret");
    set("META_SEGMENTS", "metals, time");
    set("META_TIMEZONE", "Europe/London");
    set("META_METALS_BASE_URL", "http://metals.test/");
    set("META_TARGET_CURRENCY", "eur");
    set("META_CURRENCY_PREFIX", "€");
    set("META_METALS_PERIOD_SECS", "60");
    set("META_REQUEST_TIMEOUT_SECS", "3");
    set("META_WEATHER_FAILURE", "fallback:offline");
    set("META_METALS_FAILURE", "hide");
    set("META_SYSTEM_THEME", "honor");
    set("META_PREFERS_DARK", "false");

    let cfg = MetaConfig::from_env().unwrap();
    assert_eq!(cfg.weather.api_key.as_deref(), Some("secret"));
    assert_eq!(cfg.segments, vec![SegmentKey::Metals, SegmentKey::Time]);
    assert_eq!(cfg.timezone, chrono_tz::Europe::London);
    assert_eq!(cfg.metals.metals_base_url, "http://metals.test");
    assert_eq!(cfg.metals.currency, "EUR");
    assert_eq!(cfg.metals.currency_prefix, "€");
    assert_eq!(cfg.metals.period_secs, 60);
    assert_eq!(cfg.timeouts.request_secs, 3);
    assert_eq!(cfg.weather.failure, FailurePolicy::Fallback("offline".into()));
    assert_eq!(cfg.metals.failure, FailurePolicy::Hide);
    assert_eq!(cfg.theme.system_policy, SystemThemePolicy::Honor);
    assert!(!cfg.theme.prefers_dark);
}

#[test]
fn zero_period_is_rejected() {
    let _guard = clean_env();
    set("META_CLOCK_PERIOD_SECS", "0");

    let err = MetaConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("META_CLOCK_PERIOD_SECS"));
    assert!(err.contains("greater than zero"));
}

#[test]
fn unknown_timezone_is_rejected() {
    let _guard = clean_env();
    set("META_TIMEZONE", "Mars/Olympus_Mons");

    let err = MetaConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("unknown IANA timezone"));
}

#[test]
fn bad_failure_policy_is_rejected() {
    let _guard = clean_env();
    set("META_METALS_FAILURE", "explode");

    let err = MetaConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("META_METALS_FAILURE"));
}

// =============================================================================
// helpers
// =============================================================================

#[test]
fn parse_segments_dedupes_and_rejects_unknown() {
    assert_eq!(
        parse_segments("time,time,weather").unwrap(),
        vec![SegmentKey::Time, SegmentKey::Weather]
    );
    assert!(parse_segments("time,stocks").is_err());
    assert!(parse_segments("").unwrap().is_empty());
}

#[test]
fn parse_bool_accepts_common_spellings() {
    assert_eq!(parse_bool("TRUE"), Some(true));
    assert_eq!(parse_bool("off"), Some(false));
    assert_eq!(parse_bool("maybe"), None);
}
