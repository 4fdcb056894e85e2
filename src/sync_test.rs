use super::*;
use crate::header::Node;

fn state_with(weather: Fragment, metals: Fragment) -> HeaderState {
    let mut state = HeaderState::new(&SegmentKey::ALL);
    state.get_mut(SegmentKey::Weather).unwrap().content = weather;
    state.get_mut(SegmentKey::Metals).unwrap().content = metals;
    state
}

// =============================================================================
// segment_visible
// =============================================================================

#[test]
fn time_is_visible_even_when_empty() {
    assert!(segment_visible(SegmentKey::Time, &Fragment::empty()));
}

#[test]
fn blank_text_hides_data_segments() {
    assert!(!segment_visible(SegmentKey::Weather, &Fragment::empty()));
    assert!(!segment_visible(SegmentKey::Metals, &Fragment::text("   \n\t")));
    let only_blank_markup = Fragment::from_nodes(vec![Node::span("pill", vec![Node::text(" ")])]);
    assert!(!segment_visible(SegmentKey::Metals, &only_blank_markup));
}

#[test]
fn image_alone_is_enough() {
    let icon = Fragment::from_nodes(vec![Node::span("icon", vec![Node::image("a.png", "")])]);
    assert!(segment_visible(SegmentKey::Weather, &icon));
}

#[test]
fn text_makes_segment_visible() {
    assert!(segment_visible(SegmentKey::Metals, &Fragment::text("N/A")));
}

// =============================================================================
// sync_segments
// =============================================================================

#[test]
fn sync_reveals_content_and_hides_empty() {
    let mut state = state_with(Fragment::empty(), Fragment::text("N/A"));
    state.get_mut(SegmentKey::Weather).unwrap().hidden = false;
    state.get_mut(SegmentKey::Time).unwrap().hidden = true;

    assert!(sync_segments(&mut state));
    assert!(state.is_visible(SegmentKey::Time));
    assert!(!state.is_visible(SegmentKey::Weather));
    assert!(state.is_visible(SegmentKey::Metals));
}

#[test]
fn sync_is_idempotent() {
    let mut state = state_with(Fragment::text("22°C"), Fragment::empty());

    sync_segments(&mut state);
    let first = state.clone();
    let changed = sync_segments(&mut state);

    assert!(!changed);
    assert_eq!(state, first);
}

#[test]
fn no_visible_segment_is_ever_empty() {
    let cases = [
        (Fragment::empty(), Fragment::empty()),
        (Fragment::text(" "), Fragment::text("N/A")),
        (Fragment::text("clear"), Fragment::empty()),
    ];
    for (weather, metals) in cases {
        let mut state = state_with(weather, metals);
        sync_segments(&mut state);
        for segment in state.segments.iter().filter(|s| s.key != SegmentKey::Time) {
            if !segment.hidden {
                assert!(!segment.content.text_content().trim().is_empty() || segment.content.has_image());
            }
        }
    }
}

#[test]
fn sync_ignores_absent_segments() {
    let mut state = HeaderState::new(&[SegmentKey::Time]);
    assert!(!sync_segments(&mut state));
    assert_eq!(state.segments.len(), 1);
}
