//! Engine configuration.
//!
//! Every tunable constant of the engine lives here. Hosts load it from JSON
//! (missing fields fall back to the defaults below).

use serde::{Deserialize, Serialize};

use crate::{Easing, MotionError, MotionResult};

/// Configuration for the scroll orchestrator and performance governor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How far (px) an element's top must be inside the viewport bottom
    /// before it triggers.
    pub trigger_margin: f64,
    /// Scroll inactivity (ms) before the full trackable rescan runs.
    pub debounce_ms: f64,
    /// Interval (ms) between counter ramp steps.
    pub counter_tick_ms: f64,
    /// Counter duration (ms) when `data-counter-duration` is absent.
    pub default_counter_duration_ms: u32,
    /// Stagger delay (ms) when `data-stagger-delay` is absent.
    pub default_stagger_delay_ms: u32,
    /// Transition duration (ms) when `data-animation-duration` is absent.
    pub default_animation_duration_ms: u32,
    /// Transition easing when `data-animation-easing` is absent.
    pub default_animation_easing: Easing,
    /// Viewport widths below this are treated as mobile for the header.
    pub mobile_breakpoint: f64,
    /// Scroll offset (px) past which the mobile header gets its shadow.
    pub header_shadow_threshold: f64,
    /// Frame rate below which the governor downgrades.
    pub fps_threshold: f64,
    /// Length of one FPS sampling window (ms).
    pub fps_window_ms: f64,
    /// Whether a manual tier choice blocks automatic downgrades.
    pub manual_override_sticky: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trigger_margin: 100.0,
            debounce_ms: 50.0,
            counter_tick_ms: 16.0,
            default_counter_duration_ms: 2000,
            default_stagger_delay_ms: 100,
            default_animation_duration_ms: 600,
            default_animation_easing: Easing::Ease,
            mobile_breakpoint: 768.0,
            header_shadow_threshold: 10.0,
            fps_threshold: 30.0,
            fps_window_ms: 1000.0,
            manual_override_sticky: false,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> MotionResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`MotionError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> MotionResult<()> {
        if self.counter_tick_ms.is_nan() || self.counter_tick_ms <= 0.0 {
            return Err(MotionError::InvalidConfig(
                "counter_tick_ms must be positive".to_string(),
            ));
        }
        if self.fps_window_ms.is_nan() || self.fps_window_ms <= 0.0 {
            return Err(MotionError::InvalidConfig(
                "fps_window_ms must be positive".to_string(),
            ));
        }
        if self.debounce_ms < 0.0 || self.trigger_margin.is_nan() {
            return Err(MotionError::InvalidConfig(
                "debounce_ms and trigger_margin must be non-negative numbers".to_string(),
            ));
        }
        Ok(())
    }
}
