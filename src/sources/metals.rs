//! Metals source: gold and silver spot prices converted through one FX rate.
//!
//! DESIGN
//! ======
//! The three requests are issued together with `tokio::join!`, which waits
//! for every outcome. The combination only runs when all three succeeded,
//! so a price is never shown converted with a missing rate. Only the
//! converted prices are kept; raw USD values die with the cycle.
//!
//! Unlike weather, a failed cycle shows fallback text (`N/A` by default)
//! instead of hiding the segment. Both behaviours come from
//! `FailurePolicy` and can be swapped in configuration.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::{FailurePolicy, Source, SourceError, SourceState, StateCell};
use crate::config::MetalsConfig;
use crate::fetch::JsonFetch;
use crate::header::{Fragment, Header, Node, SegmentKey};

const SOURCE_NAME: &str = "metals";
pub const LOADING_TEXT: &str = "Loading…";

/// Converted prices per troy ounce in the target currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetalsSnapshot {
    pub gold: f64,
    pub silver: f64,
}

impl MetalsSnapshot {
    /// Combine the three payloads into converted prices.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedPayload` when either `price` or
    /// `rates.<currency>` is absent, non-numeric or zero.
    pub fn combine(gold: &Value, silver: &Value, fx: &Value, currency: &str) -> Result<Self, SourceError> {
        let rate = required_number(fx.get("rates").and_then(|r| r.get(currency)), "FX rate")?;
        let gold_usd = required_number(gold.get("price"), "gold price")?;
        let silver_usd = required_number(silver.get("price"), "silver price")?;
        Ok(Self { gold: gold_usd * rate, silver: silver_usd * rate })
    }

    /// Two label/value pills: gold without decimals, silver with two.
    #[must_use]
    pub fn render(&self, prefix: &str) -> Fragment {
        Fragment::from_nodes(vec![
            pill("Gold", format!("{prefix}{}/oz", to_fixed(self.gold, 0))),
            Node::text(" "),
            pill("Silver", format!("{prefix}{}/oz", to_fixed(self.silver, 2))),
        ])
    }
}

/// Fixed-decimal price text with ties rounded away from zero.
///
/// Plain `{:.N}` formatting breaks ties toward the even digit, so
/// `2502.5` would print as `2502`.
#[must_use]
pub fn to_fixed(value: f64, decimals: u8) -> String {
    let factor = 10_f64.powi(i32::from(decimals));
    let rounded = (value * factor).round() / factor;
    format!("{rounded:.prec$}", prec = usize::from(decimals))
}

fn pill(label: &str, value: String) -> Node {
    Node::span("metals-pill", vec![Node::strong(vec![Node::text(label)]), Node::text(format!(" {value}"))])
}

// Zero counts as missing, the same as an absent field.
fn required_number(value: Option<&Value>, what: &str) -> Result<f64, SourceError> {
    value
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite() && *n != 0.0)
        .ok_or_else(|| SourceError::UnexpectedPayload {
            source_name: SOURCE_NAME,
            detail: format!("{what} missing or not a number"),
        })
}

pub struct MetalsSource {
    header: Header,
    fetcher: Arc<dyn JsonFetch>,
    gold_url: String,
    silver_url: String,
    fx_url: String,
    currency: String,
    currency_prefix: String,
    period: Duration,
    failure: FailurePolicy,
    state: StateCell,
}

impl MetalsSource {
    #[must_use]
    pub fn from_config(config: &MetalsConfig, header: Header, fetcher: Arc<dyn JsonFetch>) -> Self {
        Self {
            header,
            fetcher,
            gold_url: format!("{}/price/XAU", config.metals_base_url),
            silver_url: format!("{}/price/XAG", config.metals_base_url),
            fx_url: format!("{}/latest/USD", config.fx_base_url),
            currency: config.currency.clone(),
            currency_prefix: config.currency_prefix.clone(),
            period: Duration::from_secs(config.period_secs),
            failure: config.failure.clone(),
            state: StateCell::new(),
        }
    }

    async fn load(&self) -> Result<MetalsSnapshot, SourceError> {
        let (gold, silver, fx) = tokio::join!(
            self.fetcher.fetch_json(&self.gold_url),
            self.fetcher.fetch_json(&self.silver_url),
            self.fetcher.fetch_json(&self.fx_url),
        );
        let (gold, silver, fx) = (gold?, silver?, fx?);
        MetalsSnapshot::combine(&gold, &silver, &fx, &self.currency)
    }
}

#[async_trait::async_trait]
impl Source for MetalsSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn key(&self) -> SegmentKey {
        SegmentKey::Metals
    }

    fn period(&self) -> Duration {
        self.period
    }

    fn state(&self) -> SourceState {
        self.state.get()
    }

    async fn is_active(&self) -> bool {
        self.header.has_segment(SegmentKey::Metals).await
    }

    async fn refresh(&self) {
        self.state.set(SourceState::Fetching);
        self.header.set_content(SegmentKey::Metals, Fragment::text(LOADING_TEXT)).await;
        self.header.synchronize().await;

        match self.load().await {
            Ok(snapshot) => {
                debug!(gold = snapshot.gold, silver = snapshot.silver, currency = %self.currency, "metals refreshed");
                self.header.set_content(SegmentKey::Metals, snapshot.render(&self.currency_prefix)).await;
                self.state.set(SourceState::Rendered);
                self.header.synchronize().await;
            }
            Err(e) => {
                warn!(error = %e, source = SOURCE_NAME, "metals refresh failed");
                self.state.set(SourceState::Failed);
                self.failure.apply(&self.header, SegmentKey::Metals).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "metals_test.rs"]
mod tests;
