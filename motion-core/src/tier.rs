//! Performance tiers and the fixed effect bundle each one applies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::MotionError;

/// Animation fidelity, ordered from least to most elaborate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTier {
    /// Motion suppressed (user prefers reduced motion).
    Reduced,
    /// Low-end device or slow network.
    Low,
    /// Mobile device.
    Medium,
    /// Full experience.
    High,
}

impl PerformanceTier {
    /// Every tier, lowest first.
    pub const ALL: [Self; 4] = [Self::Reduced, Self::Low, Self::Medium, Self::High];

    /// Lower-case name used by hosts and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reduced => "reduced",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// The tier one step down that the frame-rate monitor may select.
    ///
    /// `low` and `reduced` have none: the monitor never forces `reduced`.
    #[must_use]
    pub const fn monitor_downgrade(self) -> Option<Self> {
        match self {
            Self::High => Some(Self::Medium),
            Self::Medium => Some(Self::Low),
            Self::Low | Self::Reduced => None,
        }
    }

    /// The effect bundle for this tier.
    #[must_use]
    pub const fn policy(self, is_mobile: bool) -> TierPolicy {
        match self {
            Self::Reduced => TierPolicy {
                tier: self,
                animation_duration: "0.01ms",
                transition_duration: "0.01ms",
                suppress_motion: true,
                simplify_complex: false,
                scroll_attachment: ScrollAttachment::All,
                stagger_animated_limit: Some(0),
                stagger_delay_cap_ms: None,
                show_progress: false,
            },
            Self::Low => TierPolicy {
                tier: self,
                animation_duration: "0.3s",
                transition_duration: "0.2s",
                suppress_motion: false,
                simplify_complex: true,
                scroll_attachment: ScrollAttachment::Backgrounds,
                stagger_animated_limit: Some(4),
                stagger_delay_cap_ms: None,
                show_progress: true,
            },
            Self::Medium => TierPolicy {
                tier: self,
                animation_duration: "0.5s",
                transition_duration: "0.4s",
                suppress_motion: false,
                simplify_complex: false,
                scroll_attachment: if is_mobile {
                    ScrollAttachment::Backgrounds
                } else {
                    ScrollAttachment::None
                },
                stagger_animated_limit: None,
                stagger_delay_cap_ms: Some(100),
                show_progress: true,
            },
            Self::High => TierPolicy {
                tier: self,
                animation_duration: "0.6s",
                transition_duration: "0.6s",
                suppress_motion: false,
                simplify_complex: false,
                scroll_attachment: ScrollAttachment::None,
                stagger_animated_limit: None,
                stagger_delay_cap_ms: None,
                show_progress: true,
            },
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerformanceTier {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MotionError::UnknownTier(s.to_string()))
    }
}

/// Which parallax layers lose their fixed background attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAttachment {
    /// Keep fixed attachment everywhere.
    None,
    /// `parallax-bg` layers scroll normally.
    Backgrounds,
    /// Every parallax layer scrolls normally and stops moving.
    All,
}

/// Fixed effect bundle for a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierPolicy {
    /// Tier this bundle belongs to.
    pub tier: PerformanceTier,
    /// Value for `--animation-duration`.
    pub animation_duration: &'static str,
    /// Value for `--transition-duration`.
    pub transition_duration: &'static str,
    /// Snap every entrance animation to its resting state and stop parallax.
    pub suppress_motion: bool,
    /// Replace complex variants with `fade-in-up`.
    pub simplify_complex: bool,
    /// Parallax attachment override.
    pub scroll_attachment: ScrollAttachment,
    /// Only the first N children of a stagger container animate; the rest
    /// are shown immediately.
    pub stagger_animated_limit: Option<usize>,
    /// Upper bound on per-container stagger delay.
    pub stagger_delay_cap_ms: Option<u32>,
    /// Whether the scroll progress indicator is visible.
    pub show_progress: bool,
}

impl TierPolicy {
    /// Effective stagger delay for a container authored with `delay_ms`.
    #[must_use]
    pub fn stagger_delay(&self, delay_ms: u32) -> u32 {
        self.stagger_delay_cap_ms
            .map_or(delay_ms, |cap| delay_ms.min(cap))
    }

    /// Whether the child at `index` of a stagger container animates.
    #[must_use]
    pub fn stagger_animates(&self, index: usize) -> bool {
        self.stagger_animated_limit.map_or(true, |limit| index < limit)
    }
}

impl Default for TierPolicy {
    fn default() -> Self {
        PerformanceTier::High.policy(false)
    }
}
