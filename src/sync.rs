//! Segment visibility synchronizer.
//!
//! The time segment is always shown. Every other segment is shown iff its
//! content holds an image or non-blank text, so a separator never sits
//! next to an empty slot. The pass only writes hidden flags and is
//! idempotent: running it again without a content change is a no-op.

use crate::header::{Fragment, HeaderState, SegmentKey};

/// Visibility rule for a single segment.
#[must_use]
pub fn segment_visible(key: SegmentKey, content: &Fragment) -> bool {
    match key {
        SegmentKey::Time => true,
        SegmentKey::Weather | SegmentKey::Metals => {
            content.has_image() || !content.text_content().trim().is_empty()
        }
    }
}

/// Recompute every segment's hidden flag. Returns `true` if any flag changed.
pub fn sync_segments(state: &mut HeaderState) -> bool {
    let mut changed = false;
    for segment in &mut state.segments {
        let hidden = !segment_visible(segment.key, &segment.content);
        if segment.hidden != hidden {
            segment.hidden = hidden;
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
