//! Host boundary.
//!
//! The engine never touches a document directly. Hosts answer layout
//! queries through [`LayoutSource`] and apply the [`Mutation`]s the engine
//! returns, in order.

use serde::{Deserialize, Serialize};

use crate::element::NodeKey;
use crate::geometry::{Rect, Viewport};

/// Layout queries answered by the host.
pub trait LayoutSource {
    /// Current viewport.
    fn viewport(&self) -> Viewport;

    /// Border box of `node` in document coordinates, or `None` once the node
    /// is no longer attached.
    fn element_box(&self, node: NodeKey) -> Option<Rect>;
}

/// Inline style properties the engine writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleProperty {
    /// `opacity`
    Opacity,
    /// `transform`
    Transform,
    /// `transition`
    Transition,
    /// `transition-delay`
    TransitionDelay,
    /// `animation`
    Animation,
    /// `background-position`
    BackgroundPosition,
    /// `background-attachment`
    BackgroundAttachment,
    /// `position`
    Position,
    /// `top`
    Top,
    /// `width`
    Width,
    /// `z-index`
    ZIndex,
    /// `overflow`
    Overflow,
}

impl StyleProperty {
    /// CSS property name.
    #[must_use]
    pub const fn css_name(self) -> &'static str {
        match self {
            Self::Opacity => "opacity",
            Self::Transform => "transform",
            Self::Transition => "transition",
            Self::TransitionDelay => "transition-delay",
            Self::Animation => "animation",
            Self::BackgroundPosition => "background-position",
            Self::BackgroundAttachment => "background-attachment",
            Self::Position => "position",
            Self::Top => "top",
            Self::Width => "width",
            Self::ZIndex => "z-index",
            Self::Overflow => "overflow",
        }
    }
}

/// A single presentation change for the host to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Set an inline style on a node.
    SetStyle {
        /// Target node.
        node: NodeKey,
        /// Property to set.
        property: StyleProperty,
        /// CSS value.
        value: String,
    },
    /// Replace a node's text content.
    SetText {
        /// Target node.
        node: NodeKey,
        /// New text.
        text: String,
    },
    /// Add or remove a class.
    SetClass {
        /// Target node.
        node: NodeKey,
        /// Class name.
        class: String,
        /// `true` to add, `false` to remove.
        present: bool,
    },
    /// Start media playback.
    PlayVideo {
        /// Media node.
        node: NodeKey,
    },
    /// Pause media playback.
    PauseVideo {
        /// Media node.
        node: NodeKey,
    },
    /// Append a `reveal-overlay` child to a section.
    InjectOverlay {
        /// Section receiving the overlay.
        section: NodeKey,
        /// Starting overlay transform.
        transform: String,
    },
    /// Move a section's overlay.
    SetOverlayTransform {
        /// Section owning the overlay.
        section: NodeKey,
        /// New overlay transform.
        transform: String,
    },
    /// Set a custom property on the document root.
    SetRootProperty {
        /// Property name including the leading `--`.
        name: String,
        /// Value.
        value: String,
    },
    /// Create the `scroll-progress-indicator` bar.
    InjectProgressIndicator,
    /// Set the progress bar width in percent.
    SetProgress {
        /// Width in `[0, 100]`.
        percent: f64,
    },
    /// Show or hide the progress bar.
    SetProgressVisible {
        /// Visibility.
        visible: bool,
    },
    /// Pad the document body to make room for a fixed header.
    SetDocumentPaddingTop {
        /// Padding in pixels.
        px: f64,
    },
}

impl Mutation {
    /// Shorthand for [`Mutation::SetStyle`].
    #[must_use]
    pub fn style(node: NodeKey, property: StyleProperty, value: impl Into<String>) -> Self {
        Self::SetStyle {
            node,
            property,
            value: value.into(),
        }
    }

    /// Shorthand for [`Mutation::SetClass`].
    #[must_use]
    pub fn class(node: NodeKey, class: impl Into<String>, present: bool) -> Self {
        Self::SetClass {
            node,
            class: class.into(),
            present,
        }
    }

    /// Node the mutation targets, if it targets one.
    #[must_use]
    pub const fn node(&self) -> Option<NodeKey> {
        match self {
            Self::SetStyle { node, .. }
            | Self::SetText { node, .. }
            | Self::SetClass { node, .. }
            | Self::PlayVideo { node }
            | Self::PauseVideo { node } => Some(*node),
            Self::InjectOverlay { section, .. } | Self::SetOverlayTransform { section, .. } => {
                Some(*section)
            }
            Self::SetRootProperty { .. }
            | Self::InjectProgressIndicator
            | Self::SetProgress { .. }
            | Self::SetProgressVisible { .. }
            | Self::SetDocumentPaddingTop { .. } => None,
        }
    }
}

impl std::fmt::Display for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SetStyle {
                node,
                property,
                value,
            } => write!(f, "{node} style {}: {value}", property.css_name()),
            Self::SetText { node, text } => write!(f, "{node} text {text:?}"),
            Self::SetClass {
                node,
                class,
                present,
            } => write!(f, "{node} class {}{class}", if *present { '+' } else { '-' }),
            Self::PlayVideo { node } => write!(f, "{node} play"),
            Self::PauseVideo { node } => write!(f, "{node} pause"),
            Self::InjectOverlay { section, transform } => {
                write!(f, "{section} overlay inject {transform}")
            }
            Self::SetOverlayTransform { section, transform } => {
                write!(f, "{section} overlay {transform}")
            }
            Self::SetRootProperty { name, value } => write!(f, ":root {name}: {value}"),
            Self::InjectProgressIndicator => f.write_str("progress inject"),
            Self::SetProgress { percent } => write!(f, "progress {percent:.1}%"),
            Self::SetProgressVisible { visible } => write!(f, "progress visible={visible}"),
            Self::SetDocumentPaddingTop { px } => write!(f, "body padding-top {px}px"),
        }
    }
}
