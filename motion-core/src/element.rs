//! Tracked elements - what a host node means to the engine.
//!
//! Hosts describe their nodes as [`NodeSnapshot`]s (tag, classes, data
//! attributes). The orchestrator classifies each snapshot into zero or more
//! roles by class and parses the role's configuration from the data
//! attributes. Malformed attributes fall back to defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::geometry::Axis;
use crate::variant::{parse_duration_ms, AnimationTiming, AnimationVariant, Easing};

/// Unique identifier the engine assigns to a node at scan time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(Uuid);

impl TrackId {
    /// Create a new unique track ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host-side identity of a node. Stable for the node's lifetime.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeKey(pub u64);

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the host knows about a node when scanning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSnapshot {
    /// Host identity.
    pub key: NodeKey,
    /// Lower-case tag name (`video`, `div`, ...).
    pub tag: String,
    /// Class list.
    pub classes: Vec<String>,
    /// `data-*` attributes, keyed without the `data-` prefix
    /// (`counter-target`, `parallax-speed`, ...).
    pub data: BTreeMap<String, String>,
    /// Direct element children, in document order.
    pub children: Vec<NodeKey>,
}

impl NodeSnapshot {
    /// Create a snapshot with the given key, tag and classes.
    #[must_use]
    pub fn new(key: u64, tag: &str, classes: &[&str]) -> Self {
        Self {
            key: NodeKey(key),
            tag: tag.to_string(),
            classes: classes.iter().map(ToString::to_string).collect(),
            data: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Add a data attribute.
    #[must_use]
    pub fn with_data(mut self, name: &str, value: &str) -> Self {
        self.data.insert(name.to_string(), value.to_string());
        self
    }

    /// Set the child list.
    #[must_use]
    pub fn with_children(mut self, children: &[u64]) -> Self {
        self.children = children.iter().copied().map(NodeKey).collect();
        self
    }

    /// Whether the node carries `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    fn has_any_class(&self, classes: &[&str]) -> bool {
        classes.iter().any(|c| self.has_class(c))
    }

    fn data_str(&self, name: &str) -> Option<&str> {
        self.data.get(name).map(String::as_str)
    }

    fn data_f64(&self, name: &str) -> Option<f64> {
        let value = self.data_str(name)?;
        match value.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                tracing::debug!(node = %self.key, attr = name, value, "ignoring non-numeric data attribute");
                None
            }
        }
    }

    fn data_ms(&self, name: &str) -> Option<u32> {
        let value = self.data_str(name)?;
        let parsed = parse_duration_ms(value);
        if parsed.is_none() {
            tracing::debug!(node = %self.key, attr = name, value, "ignoring malformed duration");
        }
        parsed
    }
}

/// Header class the smart-header behaviour binds to.
pub const HEADER_CLASS: &str = "mainnav";
/// Counter classes.
pub const COUNTER_CLASSES: [&str; 3] = ["counter", "stat-number", "count-up"];
/// Parallax classes.
pub const PARALLAX_CLASSES: [&str; 2] = ["parallax-bg", "parallax-element"];
/// Video trigger classes.
pub const VIDEO_CLASSES: [&str; 2] = ["video-scroll-play", "video-parallax"];
/// Reveal section classes.
pub const REVEAL_CLASSES: [&str; 3] = ["reveal-section", "reveal-left", "reveal-right"];
/// Stagger container classes.
pub const STAGGER_CLASSES: [&str; 2] = ["stagger-fade-in", "stagger-slide-up"];

/// Scroll-triggered entrance animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackableSpec {
    /// Entrance variant.
    pub variant: AnimationVariant,
    /// Transition overrides.
    pub timing: AnimationTiming,
}

impl TrackableSpec {
    /// Parse from a snapshot. `None` if the node has no variant class.
    #[must_use]
    pub fn parse(node: &NodeSnapshot, config: &EngineConfig) -> Option<Self> {
        let variant = AnimationVariant::from_classes(&node.classes)?;
        let easing = node
            .data_str("animation-easing")
            .and_then(Easing::parse)
            .unwrap_or(config.default_animation_easing);
        Some(Self {
            variant,
            timing: AnimationTiming {
                delay_ms: node.data_ms("animation-delay").unwrap_or(0),
                duration_ms: node
                    .data_ms("animation-duration")
                    .unwrap_or(config.default_animation_duration_ms),
                easing,
            },
        })
    }
}

/// Leading integer of `value`, ignoring anything after the digits
/// (`"1500+"` reads as 1500). Negative numbers clamp to zero.
fn leading_integer(value: &str) -> Option<u64> {
    let value = value.trim_start();
    let (negative, rest) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    if negative {
        return Some(0);
    }
    Some(rest[..end].parse().unwrap_or(u64::MAX))
}

/// Count-up number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSpec {
    /// Final value.
    pub target: u64,
    /// Ramp length.
    pub duration_ms: u32,
    /// Text rendered before the number.
    pub prefix: String,
    /// Text rendered after the number.
    pub suffix: String,
}

impl CounterSpec {
    /// Parse from a snapshot. `None` if the node is not a counter.
    #[must_use]
    pub fn parse(node: &NodeSnapshot, config: &EngineConfig) -> Option<Self> {
        if !node.has_any_class(&COUNTER_CLASSES) {
            return None;
        }
        // Negative or missing targets count to zero.
        let target = node.data_str("counter-target").map_or(0, |value| {
            leading_integer(value).unwrap_or_else(|| {
                tracing::debug!(node = %node.key, value, "counter target has no leading digits");
                0
            })
        });
        Some(Self {
            target,
            duration_ms: node
                .data_ms("counter-duration")
                .unwrap_or(config.default_counter_duration_ms),
            prefix: node.data_str("counter-prefix").unwrap_or_default().to_string(),
            suffix: node.data_str("counter-suffix").unwrap_or_default().to_string(),
        })
    }
}

/// How a parallax node is moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParallaxLayer {
    /// Only the background position moves (`parallax-bg`).
    Background,
    /// Background plus a half-speed transform (`parallax-element`).
    Element,
}

/// Scroll-linked background or transform offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParallaxSpec {
    /// Layer kind.
    pub layer: ParallaxLayer,
    /// Multiplier on the scroll offset.
    pub speed: f64,
    /// Axis of motion.
    pub axis: Axis,
}

impl ParallaxSpec {
    /// Default scroll multiplier.
    pub const DEFAULT_SPEED: f64 = 0.5;

    /// Parse from a snapshot. `None` if the node is not a parallax layer.
    #[must_use]
    pub fn parse(node: &NodeSnapshot) -> Option<Self> {
        let layer = if node.has_class("parallax-element") {
            ParallaxLayer::Element
        } else if node.has_class("parallax-bg") {
            ParallaxLayer::Background
        } else {
            return None;
        };
        Some(Self {
            layer,
            speed: node
                .data_f64("parallax-speed")
                .filter(|s| s.abs() > f64::EPSILON)
                .unwrap_or(Self::DEFAULT_SPEED),
            axis: node
                .data_str("parallax-direction")
                .and_then(Axis::parse)
                .unwrap_or_default(),
        })
    }
}

/// Visibility-bound video playback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoSpec {
    /// Play on enter, pause on exit (`video-scroll-play`).
    pub autoplay: bool,
    /// Parallax speed when classed `video-parallax`.
    pub parallax_speed: Option<f64>,
    /// Whether the node is a real media element.
    pub is_media: bool,
}

impl VideoSpec {
    /// Default `video-parallax` speed.
    pub const DEFAULT_PARALLAX_SPEED: f64 = 0.1;

    /// Parse from a snapshot. `None` if the node is not a video trigger.
    #[must_use]
    pub fn parse(node: &NodeSnapshot) -> Option<Self> {
        if !node.has_any_class(&VIDEO_CLASSES) {
            return None;
        }
        let parallax_speed = node.has_class("video-parallax").then(|| {
            node.data_f64("parallax-speed")
                .filter(|s| s.abs() > f64::EPSILON)
                .unwrap_or(Self::DEFAULT_PARALLAX_SPEED)
        });
        Some(Self {
            autoplay: node.has_class("video-scroll-play"),
            parallax_speed,
            is_media: node.tag.eq_ignore_ascii_case("video"),
        })
    }
}

/// Which way a reveal overlay leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevealDirection {
    /// Overlay exits to the left (`reveal-left`).
    Left,
    /// Overlay exits to the right (`reveal-right`).
    Right,
    /// Overlay exits downwards (`reveal-section`).
    Down,
}

impl RevealDirection {
    /// Parse from a snapshot. `None` if the node is not a reveal section.
    #[must_use]
    pub fn parse(node: &NodeSnapshot) -> Option<Self> {
        if node.has_class("reveal-left") {
            Some(Self::Left)
        } else if node.has_class("reveal-right") {
            Some(Self::Right)
        } else if node.has_class("reveal-section") {
            Some(Self::Down)
        } else {
            None
        }
    }

    /// Overlay transform while covering the section.
    #[must_use]
    pub const fn covering(self) -> &'static str {
        match self {
            Self::Left | Self::Right => "translateX(0)",
            Self::Down => "translateY(0)",
        }
    }

    /// Overlay transform once slid off-screen.
    #[must_use]
    pub const fn revealed(self) -> &'static str {
        match self {
            Self::Left => "translateX(-100%)",
            Self::Right => "translateX(100%)",
            Self::Down => "translateY(100%)",
        }
    }
}

/// Container whose children reveal in sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaggerSpec {
    /// Delay between consecutive children (ms), as authored.
    pub delay_ms: u32,
    /// Direct children in order.
    pub children: Vec<NodeKey>,
}

impl StaggerSpec {
    /// Parse from a snapshot. `None` if the node is not a stagger container.
    #[must_use]
    pub fn parse(node: &NodeSnapshot, config: &EngineConfig) -> Option<Self> {
        if !node.has_any_class(&STAGGER_CLASSES) {
            return None;
        }
        Some(Self {
            delay_ms: node
                .data_ms("stagger-delay")
                .filter(|d| *d > 0)
                .unwrap_or(config.default_stagger_delay_ms),
            children: node.children.clone(),
        })
    }
}

/// Every role a snapshot plays. A node may play several.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roles {
    /// Smart header.
    pub header: bool,
    /// Entrance animation.
    pub trackable: Option<TrackableSpec>,
    /// Count-up number.
    pub counter: Option<CounterSpec>,
    /// Parallax layer.
    pub parallax: Option<ParallaxSpec>,
    /// Video trigger.
    pub video: Option<VideoSpec>,
    /// Reveal section.
    pub reveal: Option<RevealDirection>,
    /// Stagger container.
    pub stagger: Option<StaggerSpec>,
}

impl Roles {
    /// Classify a snapshot.
    #[must_use]
    pub fn classify(node: &NodeSnapshot, config: &EngineConfig) -> Self {
        Self {
            header: node.has_class(HEADER_CLASS),
            trackable: TrackableSpec::parse(node, config),
            counter: CounterSpec::parse(node, config),
            parallax: ParallaxSpec::parse(node),
            video: VideoSpec::parse(node),
            reveal: RevealDirection::parse(node),
            stagger: StaggerSpec::parse(node, config),
        }
    }

    /// Whether the node plays no role at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.header
            && self.trackable.is_none()
            && self.counter.is_none()
            && self.parallax.is_none()
            && self.video.is_none()
            && self.reveal.is_none()
            && self.stagger.is_none()
    }
}
