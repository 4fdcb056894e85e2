use super::test_helpers::MockFetcher;
use super::*;

// =============================================================================
// FailurePolicy
// =============================================================================

#[test]
fn failure_policy_parse() {
    assert_eq!(FailurePolicy::parse("hide"), Some(FailurePolicy::Hide));
    assert_eq!(FailurePolicy::parse("HIDE"), Some(FailurePolicy::Hide));
    assert_eq!(FailurePolicy::parse("fallback"), Some(FailurePolicy::Fallback("N/A".into())));
    assert_eq!(FailurePolicy::parse("fallback: offline "), Some(FailurePolicy::Fallback("offline".into())));
    assert_eq!(FailurePolicy::parse("fallback:"), None);
    assert_eq!(FailurePolicy::parse("retry"), None);
}

#[tokio::test]
async fn hide_policy_empties_and_hides() {
    let header = Header::new(&SegmentKey::ALL);
    header.set_content(SegmentKey::Metals, Fragment::text("Loading…")).await;
    header.synchronize().await;

    FailurePolicy::Hide.apply(&header, SegmentKey::Metals).await;

    let snap = header.snapshot().await;
    assert!(snap.get(SegmentKey::Metals).unwrap().content.is_empty());
    assert!(!snap.is_visible(SegmentKey::Metals));
}

#[tokio::test]
async fn fallback_policy_shows_text() {
    let header = Header::new(&SegmentKey::ALL);

    FailurePolicy::Fallback("N/A".into()).apply(&header, SegmentKey::Weather).await;

    let snap = header.snapshot().await;
    assert_eq!(snap.get(SegmentKey::Weather).unwrap().content.text_content(), "N/A");
    assert!(snap.is_visible(SegmentKey::Weather));
}

// =============================================================================
// StateCell
// =============================================================================

#[test]
fn state_cell_starts_idle() {
    let cell = StateCell::default();
    assert_eq!(cell.get(), SourceState::Idle);
    cell.set(SourceState::Failed);
    assert_eq!(cell.get(), SourceState::Failed);
}

// =============================================================================
// build_sources
// =============================================================================

#[test]
fn build_sources_follows_active_segments() {
    let header = Header::new(&SegmentKey::ALL);
    let fetcher: Arc<dyn JsonFetch> = Arc::new(MockFetcher::new());

    let config = MetaConfig::default();
    let names: Vec<_> = build_sources(&config, &header, Arc::clone(&fetcher)).iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["clock", "metals"]);

    let mut config = MetaConfig::default();
    config.weather.api_key = Some("k".into());
    let sources = build_sources(&config, &header, fetcher);
    let keys: Vec<_> = sources.iter().map(|s| s.key()).collect();
    assert_eq!(keys, SegmentKey::ALL.to_vec());
    assert_eq!(sources[1].period(), Duration::from_secs(600));
    assert_eq!(sources[2].period(), Duration::from_secs(300));
}

#[test]
fn source_error_wraps_request_error_transparently() {
    let err = SourceError::from(RequestError::Status { status: 503, message: None });
    assert_eq!(err.to_string(), "HTTP 503");
}
