//! Weather source: current conditions for a fixed city, metric units.
//!
//! Each cycle first empties and hides the segment so stale conditions are
//! never shown while a request is in flight. The segment is revealed only
//! once the full pill has been built. Failures apply the configured
//! policy; by default the segment just stays hidden.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::{FailurePolicy, Source, SourceError, SourceState, StateCell};
use crate::config::WeatherConfig;
use crate::fetch::JsonFetch;
use crate::header::{Fragment, Header, Node, SegmentKey};

const SOURCE_NAME: &str = "weather";

/// One validated reading. Built whole or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherSnapshot {
    /// Whole degrees Celsius, rounded half up.
    pub temp_c: i64,
    pub description: String,
    /// Opaque condition token used to build the icon URL.
    pub icon: String,
}

impl WeatherSnapshot {
    /// Validate a current-weather payload.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedPayload` unless `main.temp` is a number and
    /// `weather[0]` carries string `description` and `icon` fields.
    pub fn from_payload(payload: &Value) -> Result<Self, SourceError> {
        let main = payload
            .get("main")
            .filter(|m| m.is_object())
            .ok_or_else(|| unexpected("missing main conditions"))?;
        let first = payload
            .get("weather")
            .and_then(Value::as_array)
            .and_then(|list| list.first())
            .ok_or_else(|| unexpected("missing weather descriptors"))?;

        let temp = main
            .get("temp")
            .and_then(Value::as_f64)
            .filter(|t| t.is_finite())
            .ok_or_else(|| unexpected("main.temp is not a number"))?;
        let description = first
            .get("description")
            .and_then(Value::as_str)
            .ok_or_else(|| unexpected("weather[0].description is not a string"))?;
        let icon = first
            .get("icon")
            .and_then(Value::as_str)
            .ok_or_else(|| unexpected("weather[0].icon is not a string"))?;

        Ok(Self { temp_c: round_half_up(temp), description: description.to_string(), icon: icon.to_string() })
    }

    /// Build the weather pill: temperature, icon image, description.
    #[must_use]
    pub fn render(&self, icon_url_template: &str) -> Fragment {
        Fragment::from_nodes(vec![Node::span(
            "weather-pill",
            vec![
                Node::span("toronto-weather-temp", vec![Node::text(format!("{}°C", self.temp_c))]),
                Node::span(
                    "toronto-weather-icon",
                    vec![Node::image(icon_url(icon_url_template, &self.icon), self.description.clone())],
                ),
                Node::span("toronto-weather-desc", vec![Node::text(self.description.clone())]),
            ],
        )])
    }
}

fn unexpected(detail: &str) -> SourceError {
    SourceError::UnexpectedPayload { source_name: SOURCE_NAME, detail: detail.to_string() }
}

/// Round to the nearest integer with ties going toward positive infinity.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn round_half_up(value: f64) -> i64 {
    // `value - floor` is exact, unlike `value + 0.5`.
    let floor = value.floor();
    let rounded = if value - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i64
}

#[must_use]
pub fn icon_url(template: &str, icon: &str) -> String {
    template.replace("{icon}", icon)
}

pub struct WeatherSource {
    header: Header,
    fetcher: Arc<dyn JsonFetch>,
    url: String,
    icon_url_template: String,
    period: Duration,
    failure: FailurePolicy,
    state: StateCell,
}

impl WeatherSource {
    /// Build from config. `None` when no API key is configured.
    #[must_use]
    pub fn from_config(config: &WeatherConfig, header: Header, fetcher: Arc<dyn JsonFetch>) -> Option<Self> {
        let api_key = config.api_key.as_deref()?;
        Some(Self {
            header,
            fetcher,
            url: weather_url(&config.base_url, &config.city_id, api_key),
            icon_url_template: config.icon_url_template.clone(),
            period: Duration::from_secs(config.period_secs),
            failure: config.failure.clone(),
            state: StateCell::new(),
        })
    }

    async fn load(&self) -> Result<WeatherSnapshot, SourceError> {
        let payload = self.fetcher.fetch_json(&self.url).await?;
        WeatherSnapshot::from_payload(&payload)
    }
}

#[must_use]
pub fn weather_url(base_url: &str, city_id: &str, api_key: &str) -> String {
    format!("{base_url}/weather?id={city_id}&units=metric&appid={api_key}")
}

#[async_trait::async_trait]
impl Source for WeatherSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn key(&self) -> SegmentKey {
        SegmentKey::Weather
    }

    fn period(&self) -> Duration {
        self.period
    }

    fn state(&self) -> SourceState {
        self.state.get()
    }

    async fn is_active(&self) -> bool {
        self.header.has_segment(SegmentKey::Weather).await
    }

    async fn refresh(&self) {
        self.state.set(SourceState::Fetching);
        self.header.clear(SegmentKey::Weather).await;
        self.header.synchronize().await;

        match self.load().await {
            Ok(snapshot) => {
                debug!(temp_c = snapshot.temp_c, description = %snapshot.description, "weather refreshed");
                self.header.set_content(SegmentKey::Weather, snapshot.render(&self.icon_url_template)).await;
                self.header.set_hidden(SegmentKey::Weather, false).await;
                self.state.set(SourceState::Rendered);
                self.header.synchronize().await;
            }
            Err(e) => {
                warn!(error = %e, source = SOURCE_NAME, "weather refresh failed");
                self.state.set(SourceState::Failed);
                self.failure.apply(&self.header, SegmentKey::Weather).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "weather_test.rs"]
mod tests;
