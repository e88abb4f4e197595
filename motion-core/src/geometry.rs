//! Viewport geometry.
//!
//! Stateless helpers answering "is this box visible now" and "where does a
//! parallax layer sit at this scroll offset". Every call recomputes from the
//! inputs; layout can change between calls.

use serde::{Deserialize, Serialize};

/// An element's layout box in document coordinates (pixels).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Distance from the document's left edge.
    pub x: f64,
    /// Distance from the document's top edge.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Rect {
    /// Create a new rect.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bottom edge in document coordinates.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Right edge in document coordinates.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// The visible window onto the document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Vertical scroll offset.
    pub scroll_top: f64,
    /// Viewport width.
    pub width: f64,
    /// Viewport height.
    pub height: f64,
    /// Full scroll height of the document.
    pub document_height: f64,
}

impl Viewport {
    /// Create a viewport at the given scroll offset.
    #[must_use]
    pub const fn new(scroll_top: f64, width: f64, height: f64, document_height: f64) -> Self {
        Self {
            scroll_top,
            width,
            height,
            document_height,
        }
    }

    /// Copy of this viewport scrolled to `scroll_top`.
    #[must_use]
    pub const fn scrolled_to(self, scroll_top: f64) -> Self {
        Self { scroll_top, ..self }
    }

    /// Bottom edge of the visible window in document coordinates.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.scroll_top + self.height
    }

    /// How far the document can scroll.
    #[must_use]
    pub fn scrollable_height(&self) -> f64 {
        (self.document_height - self.height).max(0.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 1280.0, 800.0, 800.0)
    }
}

/// Scroll axis a parallax layer moves along.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Background moves vertically.
    #[default]
    Vertical,
    /// Background moves horizontally.
    Horizontal,
}

impl Axis {
    /// Parse a `data-parallax-direction` value. Unknown values yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "vertical" => Some(Self::Vertical),
            "horizontal" => Some(Self::Horizontal),
            _ => None,
        }
    }
}

/// Whether the whole box lies inside the viewport.
#[must_use]
pub fn is_in_viewport(rect: &Rect, viewport: &Viewport) -> bool {
    rect.y >= viewport.scroll_top
        && rect.x >= 0.0
        && rect.bottom() <= viewport.bottom()
        && rect.right() <= viewport.width
}

/// Whether any part of the box lies inside the viewport.
#[must_use]
pub fn is_partially_in_viewport(rect: &Rect, viewport: &Viewport) -> bool {
    rect.y < viewport.bottom()
        && rect.bottom() > viewport.scroll_top
        && rect.x < viewport.width
        && rect.right() > 0.0
}

/// Whether the box's top edge has come `margin` pixels above the viewport
/// bottom.
///
/// `elementTop - viewportHeight < scrollTop - margin`
#[must_use]
pub fn is_triggered(rect: &Rect, viewport: &Viewport, margin: f64) -> bool {
    rect.y - viewport.height < viewport.scroll_top - margin
}

/// Offset of a parallax layer moving at `speed` relative to the scroll.
#[must_use]
pub fn parallax_offset(scroll_top: f64, speed: f64) -> f64 {
    -(scroll_top * speed)
}

/// Scroll progress as a percentage in `[0, 100]`.
///
/// A document that does not scroll reports 0.
#[must_use]
pub fn scroll_progress(viewport: &Viewport) -> f64 {
    let scrollable = viewport.scrollable_height();
    if scrollable <= 0.0 {
        return 0.0;
    }
    (viewport.scroll_top / scrollable * 100.0).clamp(0.0, 100.0)
}
