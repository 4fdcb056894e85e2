//! Data sources that feed the header segments.
//!
//! DESIGN
//! ======
//! Each source runs the same pipeline per cycle: fetch, validate,
//! transform, render, then ask the header to re-synchronize. The stage a
//! source is in is tracked as a `SourceState` for diagnostics.
//!
//! ERROR HANDLING
//! ==============
//! Failures never leave a source. They are logged, recorded as
//! `SourceState::Failed`, and turned into display content by the source's
//! `FailurePolicy`. The next scheduled cycle is the only retry.

pub mod clock;
pub mod metals;
pub mod weather;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::config::MetaConfig;
use crate::fetch::{JsonFetch, RequestError};
use crate::header::{Fragment, Header, SegmentKey};

pub use clock::ClockSource;
pub use metals::{MetalsSnapshot, MetalsSource};
pub use weather::{WeatherSnapshot, WeatherSource};

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network, timeout, status or body-parse failure.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The payload parsed but lacked a required field.
    #[error("unexpected {source_name} payload: {detail}")]
    UnexpectedPayload { source_name: &'static str, detail: String },
}

// =============================================================================
// STATE + POLICY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Idle,
    Fetching,
    Rendered,
    Failed,
}

/// What a segment shows after a failed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Empty the segment; the synchronizer hides it.
    Hide,
    /// Show this literal text in place of data.
    Fallback(String),
}

impl FailurePolicy {
    /// Parse `hide`, `fallback` (defaults to `N/A`) or `fallback:<text>`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("hide") {
            return Some(Self::Hide);
        }
        if raw.eq_ignore_ascii_case("fallback") {
            return Some(Self::Fallback(crate::config::DEFAULT_METALS_FALLBACK.to_string()));
        }
        let (head, text) = raw.split_once(':')?;
        if head.trim().eq_ignore_ascii_case("fallback") && !text.trim().is_empty() {
            Some(Self::Fallback(text.trim().to_string()))
        } else {
            None
        }
    }

    /// Write the failure content into `key` and re-synchronize.
    pub async fn apply(&self, header: &Header, key: SegmentKey) {
        match self {
            Self::Hide => header.clear(key).await,
            Self::Fallback(text) => header.set_content(key, Fragment::text(text.clone())).await,
        }
        header.synchronize().await;
    }
}

/// Interior-mutable `SourceState` shared between a source and its observers.
#[derive(Debug)]
pub struct StateCell(Mutex<SourceState>);

impl StateCell {
    #[must_use]
    pub fn new() -> Self {
        Self(Mutex::new(SourceState::Idle))
    }

    pub fn get(&self) -> SourceState {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, state: SourceState) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SOURCE TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait Source: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn key(&self) -> SegmentKey;

    /// Time between the starts of two refresh cycles.
    fn period(&self) -> Duration;

    fn state(&self) -> SourceState;

    /// A source whose segment is absent from the header is inert.
    async fn is_active(&self) -> bool;

    /// Run one full cycle. Never fails; failures become segment content.
    async fn refresh(&self);
}

/// Build every source the configuration enables, in header order.
#[must_use]
pub fn build_sources(config: &MetaConfig, header: &Header, fetcher: Arc<dyn JsonFetch>) -> Vec<Arc<dyn Source>> {
    let mut sources: Vec<Arc<dyn Source>> = Vec::new();
    for key in config.active_segments() {
        match key {
            SegmentKey::Time => {
                sources.push(Arc::new(ClockSource::new(header.clone(), config.timezone, config.clock_period_secs)));
            }
            SegmentKey::Weather => {
                if let Some(source) = WeatherSource::from_config(&config.weather, header.clone(), Arc::clone(&fetcher)) {
                    sources.push(Arc::new(source));
                }
            }
            SegmentKey::Metals => {
                sources.push(Arc::new(MetalsSource::from_config(&config.metals, header.clone(), Arc::clone(&fetcher))));
            }
        }
    }
    sources
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use serde_json::Value;

    use crate::fetch::{JsonFetch, RequestError};

    /// Canned response for a single URL.
    pub enum MockReply {
        Json(Value),
        Status { status: u16, body: Value },
        Transport,
    }

    /// `JsonFetch` that answers from a URL → reply table.
    ///
    /// Unknown URLs fail with a transport error. Every request is recorded.
    pub struct MockFetcher {
        replies: Mutex<HashMap<String, MockReply>>,
        pub requests: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self { replies: Mutex::new(HashMap::new()), requests: Mutex::new(Vec::new()) }
        }

        pub fn reply(self, url: &str, reply: MockReply) -> Self {
            self.set(url, reply);
            self
        }

        pub fn set(&self, url: &str, reply: MockReply) {
            self.replies.lock().expect("mock mutex should lock").insert(url.to_string(), reply);
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().expect("mock mutex should lock").len()
        }
    }

    #[async_trait::async_trait]
    impl JsonFetch for MockFetcher {
        async fn fetch_json(&self, url: &str) -> Result<Value, RequestError> {
            self.requests.lock().expect("mock mutex should lock").push(url.to_string());
            let replies = self.replies.lock().expect("mock mutex should lock");
            match replies.get(url) {
                Some(MockReply::Json(value)) => Ok(value.clone()),
                Some(MockReply::Status { status, body }) => {
                    crate::fetch::interpret_response(*status, &body.to_string())
                }
                Some(MockReply::Transport) | None => Err(RequestError::Transport(format!("no route to {url}"))),
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
