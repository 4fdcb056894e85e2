//! Header model: segments, markup fragments and the shared header handle.
//!
//! DESIGN
//! ======
//! The page header is modelled headlessly. Each segment owns a `Fragment`
//! (a small typed markup tree) and a hidden flag. Sources write content
//! into their own segment; the synchronizer derives the hidden flags.
//!
//! `Header` is a cheap clone around `Arc<RwLock<HeaderState>>` plus a
//! `watch` channel that publishes a snapshot after every synchronization.
//! Snapshots serialize to JSON for structured logging.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{RwLock, watch};

/// Text placed between two visible segments when the header is rendered.
pub const SEGMENT_SEPARATOR: &str = " | ";

// =============================================================================
// SEGMENT KEY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKey {
    Time,
    Weather,
    Metals,
}

impl SegmentKey {
    pub const ALL: [Self; 3] = [Self::Time, Self::Weather, Self::Metals];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Weather => "weather",
            Self::Metals => "metals",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "time" => Some(Self::Time),
            "weather" => Some(Self::Weather),
            "metals" => Some(Self::Metals),
            _ => None,
        }
    }
}

// =============================================================================
// FRAGMENT
// =============================================================================

/// One node of rendered segment content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Text { text: String },
    Image { src: String, alt: String },
    Element { tag: String, class: Option<String>, children: Vec<Node> },
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self::Image { src: src.into(), alt: alt.into() }
    }

    pub fn span(class: impl Into<String>, children: Vec<Node>) -> Self {
        Self::Element { tag: "span".into(), class: Some(class.into()), children }
    }

    #[must_use]
    pub fn strong(children: Vec<Node>) -> Self {
        Self::Element { tag: "strong".into(), class: None, children }
    }

    fn has_image(&self) -> bool {
        match self {
            Self::Image { .. } => true,
            Self::Text { .. } => false,
            Self::Element { children, .. } => children.iter().any(Node::has_image),
        }
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text { text } => out.push_str(text),
            Self::Image { .. } => {}
            Self::Element { children, .. } => children.iter().for_each(|c| c.collect_text(out)),
        }
    }

    fn render_into(&self, out: &mut String) {
        match self {
            Self::Text { text } => out.push_str(&escape(text)),
            Self::Image { src, alt } => {
                let _ = write!(out, r#"<img src="{}" alt="{}">"#, escape(src), escape(alt));
            }
            Self::Element { tag, class, children } => {
                out.push('<');
                out.push_str(tag);
                if let Some(class) = class {
                    let _ = write!(out, r#" class="{}""#, escape(class));
                }
                out.push('>');
                children.iter().for_each(|c| c.render_into(out));
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

/// Ordered markup content of a segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub nodes: Vec<Node>,
}

impl Fragment {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self { nodes: vec![Node::text(text)] }
    }

    #[must_use]
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether any image element appears anywhere in the fragment.
    #[must_use]
    pub fn has_image(&self) -> bool {
        self.nodes.iter().any(Node::has_image)
    }

    /// Concatenated text of every text node, in document order.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.nodes.iter().for_each(|n| n.collect_text(&mut out));
        out
    }

    /// Render as HTML. Text and attribute values are escaped.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.nodes.iter().for_each(|n| n.render_into(&mut out));
        out
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

// =============================================================================
// SEGMENTS + STATE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub key: SegmentKey,
    pub content: Fragment,
    pub hidden: bool,
}

impl Segment {
    #[must_use]
    pub fn new(key: SegmentKey) -> Self {
        Self { key, content: Fragment::empty(), hidden: key != SegmentKey::Time }
    }
}

/// Segments in display order. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeaderState {
    pub segments: Vec<Segment>,
}

impl HeaderState {
    #[must_use]
    pub fn new(keys: &[SegmentKey]) -> Self {
        let mut segments: Vec<Segment> = Vec::with_capacity(keys.len());
        for key in keys {
            if !segments.iter().any(|s| s.key == *key) {
                segments.push(Segment::new(*key));
            }
        }
        Self { segments }
    }

    #[must_use]
    pub fn get(&self, key: SegmentKey) -> Option<&Segment> {
        self.segments.iter().find(|s| s.key == key)
    }

    pub fn get_mut(&mut self, key: SegmentKey) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|s| s.key == key)
    }
}

/// Point-in-time copy of the header published to observers.
pub type HeaderSnapshot = HeaderState;

impl HeaderState {
    /// Render visible segments joined by [`SEGMENT_SEPARATOR`].
    ///
    /// Hidden segments contribute neither content nor a separator.
    #[must_use]
    pub fn render(&self) -> String {
        self.segments
            .iter()
            .filter(|s| !s.hidden)
            .map(|s| format!(r#"<span class="segment" data-seg="{}">{}</span>"#, s.key.as_str(), s.content.render()))
            .collect::<Vec<_>>()
            .join(SEGMENT_SEPARATOR)
    }

    #[must_use]
    pub fn is_visible(&self, key: SegmentKey) -> bool {
        self.get(key).is_some_and(|s| !s.hidden)
    }

    /// Structured form of the snapshot for log sinks.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// HEADER HANDLE
// =============================================================================

/// Shared handle to the header. Clone is cheap; all clones see one state.
#[derive(Clone)]
pub struct Header {
    state: Arc<RwLock<HeaderState>>,
    snapshots: Arc<watch::Sender<HeaderSnapshot>>,
}

impl Header {
    #[must_use]
    pub fn new(keys: &[SegmentKey]) -> Self {
        let state = HeaderState::new(keys);
        let (tx, _rx) = watch::channel(state.clone());
        Self { state: Arc::new(RwLock::new(state)), snapshots: Arc::new(tx) }
    }

    pub async fn has_segment(&self, key: SegmentKey) -> bool {
        self.state.read().await.get(key).is_some()
    }

    /// Replace a segment's content. No-op when the segment is absent.
    pub async fn set_content(&self, key: SegmentKey, content: Fragment) {
        if let Some(segment) = self.state.write().await.get_mut(key) {
            segment.content = content;
        }
    }

    pub async fn set_hidden(&self, key: SegmentKey, hidden: bool) {
        if let Some(segment) = self.state.write().await.get_mut(key) {
            segment.hidden = hidden;
        }
    }

    /// Empty the segment and hide it in one step.
    pub async fn clear(&self, key: SegmentKey) {
        if let Some(segment) = self.state.write().await.get_mut(key) {
            segment.content = Fragment::empty();
            segment.hidden = true;
        }
    }

    pub async fn snapshot(&self) -> HeaderSnapshot {
        self.state.read().await.clone()
    }

    /// Reconcile segment visibility and publish the result.
    ///
    /// Returns `true` when any hidden flag changed.
    pub async fn synchronize(&self) -> bool {
        let (changed, snapshot) = {
            let mut state = self.state.write().await;
            let changed = crate::sync::sync_segments(&mut state);
            (changed, state.clone())
        };
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
        changed
    }

    /// Receiver that wakes whenever a synchronization changes the header.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HeaderSnapshot> {
        self.snapshots.subscribe()
    }
}

#[cfg(test)]
#[path = "header_test.rs"]
mod tests;
