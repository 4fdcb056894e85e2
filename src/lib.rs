//! Live header widget for a portfolio page: local time, weather and
//! precious-metal prices, each refreshed on its own cadence, plus the
//! persisted dark/light theme flag.

pub mod config;
pub mod fetch;
pub mod header;
pub mod scheduler;
pub mod sources;
pub mod sync;
pub mod theme;
