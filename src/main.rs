use std::sync::Arc;

use header_meta::config::MetaConfig;
use header_meta::fetch::{HttpJsonFetcher, JsonFetch};
use header_meta::header::{Header, SegmentKey};
use header_meta::scheduler::RefreshScheduler;
use header_meta::sources;
use header_meta::theme::{FileThemeStore, ThemeController};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let _ = dotenvy::dotenv();

    let config = MetaConfig::from_env().expect("invalid configuration");

    let theme = ThemeController::init(
        FileThemeStore::new(config.theme.store_path.clone()),
        config.theme.prefers_dark,
        config.theme.system_policy,
    );
    tracing::info!(theme = theme.current().as_str(), icon = theme.current().toggle_icon(), "theme applied");

    if config.segments.contains(&SegmentKey::Weather) && config.weather.api_key.is_none() {
        tracing::warn!("OPENWEATHER_API_KEY not set; weather segment disabled");
    }

    let header = Header::new(&config.active_segments());
    header.synchronize().await;

    let fetcher: Arc<dyn JsonFetch> = Arc::new(HttpJsonFetcher::new(config.timeouts).expect("http client build failed"));
    let scheduler = RefreshScheduler::start(sources::build_sources(&config, &header, fetcher)).await;
    tracing::info!(sources = ?scheduler.source_names(), "header-meta running");

    let mut updates = header.subscribe();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                tracing::info!(header = %snapshot.render(), "header updated");
                match snapshot.to_json() {
                    Ok(json) => tracing::debug!(snapshot = %json, "header snapshot"),
                    Err(e) => tracing::warn!(error = %e, "header snapshot not serializable"),
                }
            }
            _ = &mut shutdown => {
                tracing::info!("shutdown requested");
                break;
            }
        }
    }

    scheduler.shutdown().await;
}
