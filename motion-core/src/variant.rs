//! Animation variants and their presentation table.
//!
//! Each trackable element carries exactly one variant class. The variant
//! decides the pre-animation (initial) and resting (final) presentation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::MotionError;

/// The closed set of scroll-triggered entrance animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationVariant {
    /// Fade in while rising 50px.
    FadeInUp,
    /// Fade in from 50px left.
    FadeInLeft,
    /// Fade in from 50px right.
    FadeInRight,
    /// Opacity only.
    FadeIn,
    /// Fade in growing from 80%.
    ScaleIn,
    /// Slide in from 100px left.
    SlideInLeft,
    /// Slide in from 100px right.
    SlideInRight,
    /// Slide in rising 100px.
    SlideInUp,
    /// Slide in dropping 100px.
    SlideInDown,
    /// Unrotate from -10deg while growing from 90%.
    RotateIn,
    /// Flip around the Y axis.
    FlipIn,
    /// Grow from 30%.
    ZoomIn,
    /// Grow from 30% with a bounce keyframe.
    BounceIn,
    /// Grow from nothing with an elastic keyframe.
    ElasticIn,
}

/// Opacity and transform pair applied to an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Presentation {
    /// CSS opacity.
    pub opacity: f32,
    /// CSS transform, `None` when the variant leaves transform alone.
    pub transform: Option<&'static str>,
}

struct VariantEntry {
    class: &'static str,
    initial: Option<&'static str>,
    resting: Option<&'static str>,
    keyframes: Option<&'static str>,
}

const fn entry(
    class: &'static str,
    initial: Option<&'static str>,
    resting: Option<&'static str>,
    keyframes: Option<&'static str>,
) -> VariantEntry {
    VariantEntry {
        class,
        initial,
        resting,
        keyframes,
    }
}

impl AnimationVariant {
    /// Every variant, in class-scan order.
    pub const ALL: [Self; 14] = [
        Self::FadeInUp,
        Self::FadeInLeft,
        Self::FadeInRight,
        Self::FadeIn,
        Self::ScaleIn,
        Self::SlideInLeft,
        Self::SlideInRight,
        Self::SlideInUp,
        Self::SlideInDown,
        Self::RotateIn,
        Self::FlipIn,
        Self::ZoomIn,
        Self::BounceIn,
        Self::ElasticIn,
    ];

    const fn entry(self) -> VariantEntry {
        match self {
            Self::FadeInUp => entry(
                "fade-in-up",
                Some("translateY(50px)"),
                Some("translateY(0)"),
                None,
            ),
            Self::FadeInLeft => entry(
                "fade-in-left",
                Some("translateX(-50px)"),
                Some("translateX(0)"),
                None,
            ),
            Self::FadeInRight => entry(
                "fade-in-right",
                Some("translateX(50px)"),
                Some("translateX(0)"),
                None,
            ),
            Self::FadeIn => entry("fade-in", None, None, None),
            Self::ScaleIn => entry("scale-in", Some("scale(0.8)"), Some("scale(1)"), None),
            Self::SlideInLeft => entry(
                "slide-in-left",
                Some("translateX(-100px)"),
                Some("translateX(0)"),
                None,
            ),
            Self::SlideInRight => entry(
                "slide-in-right",
                Some("translateX(100px)"),
                Some("translateX(0)"),
                None,
            ),
            Self::SlideInUp => entry(
                "slide-in-up",
                Some("translateY(100px)"),
                Some("translateY(0)"),
                None,
            ),
            Self::SlideInDown => entry(
                "slide-in-down",
                Some("translateY(-100px)"),
                Some("translateY(0)"),
                None,
            ),
            Self::RotateIn => entry(
                "rotate-in",
                Some("rotate(-10deg) scale(0.9)"),
                Some("rotate(0) scale(1)"),
                None,
            ),
            Self::FlipIn => entry("flip-in", Some("rotateY(90deg)"), Some("rotateY(0)"), None),
            Self::ZoomIn => entry("zoom-in", Some("scale(0.3)"), Some("scale(1)"), None),
            Self::BounceIn => entry(
                "bounce-in",
                Some("scale(0.3)"),
                Some("scale(1)"),
                Some("bounceIn 0.8s ease-out"),
            ),
            Self::ElasticIn => entry(
                "elastic-in",
                Some("scale(0)"),
                Some("scale(1)"),
                Some("elasticIn 0.8s ease-out"),
            ),
        }
    }

    /// The CSS class selecting this variant.
    #[must_use]
    pub const fn class_name(self) -> &'static str {
        self.entry().class
    }

    /// Look a variant up by class name.
    #[must_use]
    pub fn from_class(class: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.class_name() == class)
    }

    /// First variant class found in a class list.
    ///
    /// Variants are checked in [`Self::ALL`] order so that an element carrying
    /// several (malformed markup) resolves deterministically.
    #[must_use]
    pub fn from_classes<S: AsRef<str>>(classes: &[S]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| classes.iter().any(|c| c.as_ref() == v.class_name()))
    }

    /// Presentation before the element has animated.
    #[must_use]
    pub const fn initial(self) -> Presentation {
        Presentation {
            opacity: 0.0,
            transform: self.entry().initial,
        }
    }

    /// Resting presentation once animated.
    #[must_use]
    pub const fn resting(self) -> Presentation {
        Presentation {
            opacity: 1.0,
            transform: self.entry().resting,
        }
    }

    /// Keyframe animation played on top of the transition, if any.
    #[must_use]
    pub const fn keyframes(self) -> Option<&'static str> {
        self.entry().keyframes
    }

    /// Whether low-fidelity tiers replace this variant.
    #[must_use]
    pub const fn is_complex(self) -> bool {
        matches!(
            self,
            Self::BounceIn | Self::ElasticIn | Self::FlipIn | Self::RotateIn
        )
    }

    /// The variant used in place of a complex one.
    #[must_use]
    pub const fn simplified(self) -> Self {
        if self.is_complex() {
            Self::FadeInUp
        } else {
            self
        }
    }
}

impl fmt::Display for AnimationVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

impl FromStr for AnimationVariant {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_class(s.trim()).ok_or_else(|| MotionError::UnknownVariant(s.to_string()))
    }
}

/// Named timing curve for a transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    /// CSS `ease`.
    #[default]
    Ease,
    /// CSS `linear`.
    Linear,
    /// CSS `ease-in`.
    EaseIn,
    /// CSS `ease-out`.
    EaseOut,
    /// CSS `ease-in-out`.
    EaseInOut,
}

impl Easing {
    /// CSS keyword for this curve.
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Ease => "ease",
            Self::Linear => "linear",
            Self::EaseIn => "ease-in",
            Self::EaseOut => "ease-out",
            Self::EaseInOut => "ease-in-out",
        }
    }

    /// Parse a CSS keyword.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "ease" => Some(Self::Ease),
            "linear" => Some(Self::Linear),
            "ease-in" => Some(Self::EaseIn),
            "ease-out" => Some(Self::EaseOut),
            "ease-in-out" => Some(Self::EaseInOut),
            _ => None,
        }
    }
}

/// Per-element transition overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationTiming {
    /// Delay before the transition starts.
    pub delay_ms: u32,
    /// Transition length.
    pub duration_ms: u32,
    /// Timing curve.
    pub easing: Easing,
}

impl AnimationTiming {
    /// CSS `transition` shorthand.
    #[must_use]
    pub fn transition(&self) -> String {
        format!("all {}ms {}", self.duration_ms, self.easing.as_css())
    }

    /// CSS `transition-delay` value.
    #[must_use]
    pub fn delay(&self) -> String {
        format!("{}ms", self.delay_ms)
    }
}

/// Parse a CSS-ish duration (`"250"`, `"250ms"`, `"0.6s"`) into milliseconds.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_duration_ms(value: &str) -> Option<u32> {
    let value = value.trim();
    let (number, scale) = if let Some(ms) = value.strip_suffix("ms") {
        (ms, 1.0)
    } else if let Some(s) = value.strip_suffix('s') {
        (s, 1000.0)
    } else {
        (value, 1.0)
    };
    let parsed: f64 = number.trim().parse().ok()?;
    if !parsed.is_finite() || parsed < 0.0 {
        return None;
    }
    Some((parsed * scale).round().min(f64::from(u32::MAX)) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_names_round_trip_through_lookup() {
        for variant in AnimationVariant::ALL {
            assert_eq!(AnimationVariant::from_class(variant.class_name()), Some(variant));
        }
    }

    #[test]
    fn every_variant_starts_hidden_and_rests_visible() {
        for variant in AnimationVariant::ALL {
            assert!(variant.initial().opacity.abs() < f32::EPSILON);
            assert!((variant.resting().opacity - 1.0).abs() < f32::EPSILON);
            assert_eq!(
                variant.initial().transform.is_some(),
                variant.resting().transform.is_some(),
                "{variant} must pair transforms"
            );
        }
    }

    #[test]
    fn fade_in_up_offsets() {
        let v = AnimationVariant::FadeInUp;
        assert_eq!(v.initial().transform, Some("translateY(50px)"));
        assert_eq!(v.resting().transform, Some("translateY(0)"));
    }

    #[test]
    fn complex_variants_simplify_to_fade_in_up() {
        let complex: Vec<_> = AnimationVariant::ALL
            .into_iter()
            .filter(|v| v.is_complex())
            .collect();
        assert_eq!(complex.len(), 4);
        for v in complex {
            assert_eq!(v.simplified(), AnimationVariant::FadeInUp);
        }
        assert_eq!(AnimationVariant::ZoomIn.simplified(), AnimationVariant::ZoomIn);
    }

    #[test]
    fn only_bounce_and_elastic_have_keyframes() {
        let with_keyframes: Vec<_> = AnimationVariant::ALL
            .into_iter()
            .filter(|v| v.keyframes().is_some())
            .collect();
        assert_eq!(
            with_keyframes,
            vec![AnimationVariant::BounceIn, AnimationVariant::ElasticIn]
        );
    }

    #[test]
    fn from_classes_ignores_unrelated_classes() {
        let classes = ["card", "zoom-in", "shadow"];
        assert_eq!(
            AnimationVariant::from_classes(&classes),
            Some(AnimationVariant::ZoomIn)
        );
        assert_eq!(AnimationVariant::from_classes(&["card"]), None);
    }

    #[test]
    fn unknown_variant_is_an_error() {
        assert!("wobble-in".parse::<AnimationVariant>().is_err());
        assert_eq!("flip-in".parse::<AnimationVariant>().ok(), Some(AnimationVariant::FlipIn));
    }

    #[test]
    fn durations_parse_with_units() {
        assert_eq!(parse_duration_ms("250"), Some(250));
        assert_eq!(parse_duration_ms("250ms"), Some(250));
        assert_eq!(parse_duration_ms("0.6s"), Some(600));
        assert_eq!(parse_duration_ms("soon"), None);
        assert_eq!(parse_duration_ms("-5ms"), None);
    }

    #[test]
    fn timing_css() {
        let timing = AnimationTiming {
            delay_ms: 200,
            duration_ms: 600,
            easing: Easing::EaseOut,
        };
        assert_eq!(timing.transition(), "all 600ms ease-out");
        assert_eq!(timing.delay(), "200ms");
    }
}
