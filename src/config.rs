//! Typed configuration for the header service, parsed from environment variables.
//!
//! DESIGN
//! ======
//! Every endpoint, location, key, cadence and failure policy is carried in
//! one `MetaConfig` value and passed into constructors. Nothing reads the
//! environment after startup.

use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use crate::header::SegmentKey;
use crate::sources::FailurePolicy;
use crate::theme::SystemThemePolicy;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Toronto;
pub const DEFAULT_CITY_ID: &str = "6167865";
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_WEATHER_ICON_URL: &str = "https://openweathermap.org/img/wn/{icon}.png";
pub const DEFAULT_METALS_BASE_URL: &str = "https://api.gold-api.com";
pub const DEFAULT_FX_BASE_URL: &str = "https://open.er-api.com/v6";
pub const DEFAULT_TARGET_CURRENCY: &str = "CAD";
pub const DEFAULT_CURRENCY_PREFIX: &str = "C$";
pub const DEFAULT_METALS_FALLBACK: &str = "N/A";
pub const DEFAULT_CLOCK_PERIOD_SECS: u64 = 1;
pub const DEFAULT_WEATHER_PERIOD_SECS: u64 = 10 * 60;
pub const DEFAULT_METALS_PERIOD_SECS: u64 = 5 * 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_THEME_FILE: &str = "header-meta-theme.json";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be used.
    #[error("invalid {var}={value:?}: {reason}")]
    Invalid { var: &'static str, value: String, reason: String },
}

fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { var, value: value.to_string(), reason: reason.into() }
}

// =============================================================================
// CONFIG TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl FetchTimeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherConfig {
    /// `None` disables the weather segment.
    pub api_key: Option<String>,
    pub city_id: String,
    pub base_url: String,
    /// Icon image URL with an `{icon}` placeholder for the condition token.
    pub icon_url_template: String,
    pub period_secs: u64,
    pub failure: FailurePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetalsConfig {
    pub metals_base_url: String,
    pub fx_base_url: String,
    /// Key looked up under `rates` in the FX payload.
    pub currency: String,
    /// Prefix shown before converted prices, e.g. `C$`.
    pub currency_prefix: String,
    pub period_secs: u64,
    pub failure: FailurePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeConfig {
    pub store_path: PathBuf,
    pub system_policy: SystemThemePolicy,
    /// System colour-scheme preference reported by the host.
    pub prefers_dark: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaConfig {
    pub timezone: Tz,
    /// Segments present in the header, in display order.
    pub segments: Vec<SegmentKey>,
    pub clock_period_secs: u64,
    pub weather: WeatherConfig,
    pub metals: MetalsConfig,
    pub theme: ThemeConfig,
    pub timeouts: FetchTimeouts,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE,
            segments: SegmentKey::ALL.to_vec(),
            clock_period_secs: DEFAULT_CLOCK_PERIOD_SECS,
            weather: WeatherConfig {
                api_key: None,
                city_id: DEFAULT_CITY_ID.to_string(),
                base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
                icon_url_template: DEFAULT_WEATHER_ICON_URL.to_string(),
                period_secs: DEFAULT_WEATHER_PERIOD_SECS,
                failure: FailurePolicy::Hide,
            },
            metals: MetalsConfig {
                metals_base_url: DEFAULT_METALS_BASE_URL.to_string(),
                fx_base_url: DEFAULT_FX_BASE_URL.to_string(),
                currency: DEFAULT_TARGET_CURRENCY.to_string(),
                currency_prefix: DEFAULT_CURRENCY_PREFIX.to_string(),
                period_secs: DEFAULT_METALS_PERIOD_SECS,
                failure: FailurePolicy::Fallback(DEFAULT_METALS_FALLBACK.to_string()),
            },
            theme: ThemeConfig {
                store_path: PathBuf::from(DEFAULT_THEME_FILE),
                system_policy: SystemThemePolicy::ForceDark,
                prefers_dark: false,
            },
            timeouts: FetchTimeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
        }
    }
}

impl MetaConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `OPENWEATHER_API_KEY`: weather segment is dropped when absent
    /// - `META_SEGMENTS`: comma list of `time`, `weather`, `metals` (default all)
    /// - `META_TIMEZONE`: IANA name (default `America/Toronto`)
    /// - `META_CITY_ID`, `META_WEATHER_BASE_URL`, `META_WEATHER_ICON_URL`
    /// - `META_METALS_BASE_URL`, `META_FX_BASE_URL`
    /// - `META_TARGET_CURRENCY` (default `CAD`), `META_CURRENCY_PREFIX` (default `C$`)
    /// - `META_CLOCK_PERIOD_SECS`, `META_WEATHER_PERIOD_SECS`, `META_METALS_PERIOD_SECS`
    /// - `META_REQUEST_TIMEOUT_SECS`, `META_CONNECT_TIMEOUT_SECS`
    /// - `META_WEATHER_FAILURE`, `META_METALS_FAILURE`: `hide` or `fallback[:text]`
    /// - `META_THEME_FILE`, `META_SYSTEM_THEME` (`force-dark` or `honor`), `META_PREFERS_DARK`
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let timezone = match env_string("META_TIMEZONE") {
            Some(raw) => raw
                .parse::<Tz>()
                .map_err(|_| invalid("META_TIMEZONE", &raw, "unknown IANA timezone"))?,
            None => defaults.timezone,
        };
        let segments = match env_string("META_SEGMENTS") {
            Some(raw) => parse_segments(&raw)?,
            None => defaults.segments,
        };

        let weather = WeatherConfig {
            api_key: env_string("OPENWEATHER_API_KEY"),
            city_id: env_string("META_CITY_ID").unwrap_or(defaults.weather.city_id),
            base_url: env_url("META_WEATHER_BASE_URL", defaults.weather.base_url),
            icon_url_template: env_string("META_WEATHER_ICON_URL").unwrap_or(defaults.weather.icon_url_template),
            period_secs: env_period("META_WEATHER_PERIOD_SECS", defaults.weather.period_secs)?,
            failure: env_failure("META_WEATHER_FAILURE", defaults.weather.failure)?,
        };
        let metals = MetalsConfig {
            metals_base_url: env_url("META_METALS_BASE_URL", defaults.metals.metals_base_url),
            fx_base_url: env_url("META_FX_BASE_URL", defaults.metals.fx_base_url),
            currency: env_string("META_TARGET_CURRENCY")
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or(defaults.metals.currency),
            currency_prefix: env_string("META_CURRENCY_PREFIX").unwrap_or(defaults.metals.currency_prefix),
            period_secs: env_period("META_METALS_PERIOD_SECS", defaults.metals.period_secs)?,
            failure: env_failure("META_METALS_FAILURE", defaults.metals.failure)?,
        };
        let theme = ThemeConfig {
            store_path: env_string("META_THEME_FILE").map_or(defaults.theme.store_path, PathBuf::from),
            system_policy: match env_string("META_SYSTEM_THEME") {
                Some(raw) => SystemThemePolicy::parse(&raw)
                    .ok_or_else(|| invalid("META_SYSTEM_THEME", &raw, "expected 'force-dark' or 'honor'"))?,
                None => defaults.theme.system_policy,
            },
            prefers_dark: match env_string("META_PREFERS_DARK") {
                Some(raw) => parse_bool(&raw).ok_or_else(|| invalid("META_PREFERS_DARK", &raw, "expected a boolean"))?,
                None => defaults.theme.prefers_dark,
            },
        };
        let timeouts = FetchTimeouts {
            request_secs: env_period("META_REQUEST_TIMEOUT_SECS", defaults.timeouts.request_secs)?,
            connect_secs: env_period("META_CONNECT_TIMEOUT_SECS", defaults.timeouts.connect_secs)?,
        };

        Ok(Self {
            timezone,
            segments,
            clock_period_secs: env_period("META_CLOCK_PERIOD_SECS", defaults.clock_period_secs)?,
            weather,
            metals,
            theme,
            timeouts,
        })
    }

    /// Segments that can actually be served. Weather needs an API key.
    #[must_use]
    pub fn active_segments(&self) -> Vec<SegmentKey> {
        self.segments
            .iter()
            .copied()
            .filter(|key| *key != SegmentKey::Weather || self.weather.api_key.is_some())
            .collect()
    }
}

// =============================================================================
// PARSING HELPERS
// =============================================================================

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_url(key: &str, default: String) -> String {
    env_string(key)
        .map(|v| v.trim_end_matches('/').to_string())
        .unwrap_or(default)
}

fn env_period(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = env_string(key) else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(invalid(key, &raw, "must be greater than zero")),
        Ok(secs) => Ok(secs),
        Err(e) => Err(invalid(key, &raw, e.to_string())),
    }
}

fn env_failure(key: &'static str, default: FailurePolicy) -> Result<FailurePolicy, ConfigError> {
    match env_string(key) {
        Some(raw) => FailurePolicy::parse(&raw).ok_or_else(|| invalid(key, &raw, "expected 'hide' or 'fallback[:text]'")),
        None => Ok(default),
    }
}

pub(crate) fn parse_segments(raw: &str) -> Result<Vec<SegmentKey>, ConfigError> {
    let mut segments = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let key = SegmentKey::parse(part).ok_or_else(|| invalid("META_SEGMENTS", raw, format!("unknown segment '{part}'")))?;
        if !segments.contains(&key) {
            segments.push(key);
        }
    }
    Ok(segments)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
