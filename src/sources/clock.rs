//! Clock source: wall-clock time for a fixed timezone, 12-hour with seconds.

use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::trace;

use super::{Source, SourceState, StateCell};
use crate::header::{Fragment, Header, SegmentKey};

pub struct ClockSource {
    header: Header,
    timezone: Tz,
    period: Duration,
    state: StateCell,
}

impl ClockSource {
    #[must_use]
    pub fn new(header: Header, timezone: Tz, period_secs: u64) -> Self {
        Self { header, timezone, period: Duration::from_secs(period_secs), state: StateCell::new() }
    }

    /// Write the reading for `now` into the time segment and synchronize.
    pub async fn render_at(&self, now: DateTime<Utc>) {
        let reading = format_time(now, self.timezone);
        trace!(%reading, "clock tick");
        self.header.set_content(SegmentKey::Time, Fragment::text(reading)).await;
        self.state.set(SourceState::Rendered);
        self.header.synchronize().await;
    }
}

/// Format `now` in `timezone` as `hh:mm:ss AM`.
#[must_use]
pub fn format_time(now: DateTime<Utc>, timezone: Tz) -> String {
    let local = now.with_timezone(&timezone);
    normalize_meridiem(&local.format("%I:%M:%S %p").to_string())
}

/// Rewrite a trailing day-period marker (`a.m.`, `pm`, `P.M.`) as `AM`/`PM`.
#[must_use]
pub fn normalize_meridiem(formatted: &str) -> String {
    let Some((time, marker)) = formatted.trim().rsplit_once(' ') else {
        return formatted.to_string();
    };
    let bare: String = marker.chars().filter(|c| *c != '.').collect::<String>().to_ascii_lowercase();
    match bare.as_str() {
        "am" => format!("{time} AM"),
        "pm" => format!("{time} PM"),
        _ => formatted.to_string(),
    }
}

#[async_trait::async_trait]
impl Source for ClockSource {
    fn name(&self) -> &'static str {
        "clock"
    }

    fn key(&self) -> SegmentKey {
        SegmentKey::Time
    }

    fn period(&self) -> Duration {
        self.period
    }

    fn state(&self) -> SourceState {
        self.state.get()
    }

    async fn is_active(&self) -> bool {
        self.header.has_segment(SegmentKey::Time).await
    }

    async fn refresh(&self) {
        self.render_at(Utc::now()).await;
    }
}

#[cfg(test)]
#[path = "clock_test.rs"]
mod tests;
