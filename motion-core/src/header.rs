//! Smart header state.

use serde::{Deserialize, Serialize};

/// Direction of the most recent scroll movement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    /// Content moving up (offset increasing).
    Down,
    /// Content moving down (offset decreasing or unchanged).
    #[default]
    Up,
}

/// What the header should do after a scroll update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeaderEffect {
    /// Slide the header up by its height.
    Hide {
        /// Header height in pixels.
        height: f64,
    },
    /// Slide the header back into view.
    Show,
    /// Mobile layout: toggle the drop shadow.
    Shadow(bool),
    /// Leave the header as it is.
    Unchanged,
}

/// Last known scroll offset and derived direction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeaderState {
    last_scroll: f64,
    direction: ScrollDirection,
    height: f64,
}

impl HeaderState {
    /// Create header state for a header of `height` pixels.
    #[must_use]
    pub fn new(height: f64) -> Self {
        Self {
            last_scroll: 0.0,
            direction: ScrollDirection::Up,
            height,
        }
    }

    /// Header height in pixels.
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }

    /// Re-measure after a resize.
    pub fn set_height(&mut self, height: f64) {
        self.height = height;
    }

    /// Direction derived from the last update.
    #[must_use]
    pub const fn direction(&self) -> ScrollDirection {
        self.direction
    }

    /// Last scroll offset seen.
    #[must_use]
    pub const fn last_scroll(&self) -> f64 {
        self.last_scroll
    }

    /// Feed a new scroll offset.
    ///
    /// On desktop the header hides when scrolling down past its own height and
    /// shows when scrolling up or back at the top. On mobile it stays put and
    /// only toggles a shadow once the page is scrolled past
    /// `shadow_threshold`.
    pub fn update(&mut self, scroll_top: f64, is_mobile: bool, shadow_threshold: f64) -> HeaderEffect {
        self.direction = if scroll_top > self.last_scroll {
            ScrollDirection::Down
        } else {
            ScrollDirection::Up
        };
        self.last_scroll = scroll_top;

        if is_mobile {
            return HeaderEffect::Shadow(scroll_top > shadow_threshold);
        }
        match self.direction {
            ScrollDirection::Down if scroll_top > self.height => HeaderEffect::Hide {
                height: self.height,
            },
            ScrollDirection::Up => HeaderEffect::Show,
            ScrollDirection::Down if scroll_top <= 0.0 => HeaderEffect::Show,
            ScrollDirection::Down => HeaderEffect::Unchanged,
        }
    }
}
