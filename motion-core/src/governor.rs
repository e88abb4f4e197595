//! # Adaptive Performance Governor
//!
//! Picks the starting tier from [`DeviceSignals`], watches the frame rate,
//! and steps the tier down when the device cannot keep up.
//!
//! ```text
//! classify ──▶ tier ──▶ policy bundle
//!                ▲
//!  frames ──▶ FpsMonitor ──(fps < threshold)──▶ one step down
//! ```
//!
//! The monitor only ever moves `high → medium → low`. `reduced` is reached
//! only through the reduced-motion preference or a manual override, and
//! monitoring stops there.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::device::DeviceSignals;
use crate::fps::{FpsMonitor, FpsSample};
use crate::tier::{PerformanceTier, TierPolicy};

/// Why the tier changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierChangeReason {
    /// Sustained low frame rate.
    LowFrameRate,
    /// Explicit `set_performance_mode` call.
    Manual,
}

/// A tier transition the host must apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierChange {
    /// Tier before the change.
    pub from: PerformanceTier,
    /// Tier after the change.
    pub to: PerformanceTier,
    /// What caused it.
    pub reason: TierChangeReason,
    /// Frame-rate sample that triggered an automatic change.
    pub sample: Option<FpsSample>,
}

/// Tier selection and frame-rate driven degradation.
#[derive(Debug, Clone)]
pub struct PerformanceGovernor {
    tier: PerformanceTier,
    is_mobile: bool,
    monitor: FpsMonitor,
    fps_threshold: f64,
    manual_sticky: bool,
    manual: bool,
}

impl PerformanceGovernor {
    /// Classify the device and start at the resulting tier.
    #[must_use]
    pub fn new(signals: &DeviceSignals, config: &EngineConfig) -> Self {
        let tier = signals.classify();
        tracing::info!(
            tier = %tier,
            mobile = signals.is_mobile(),
            low_end = signals.is_low_end(),
            "Performance tier selected"
        );
        Self {
            tier,
            is_mobile: signals.is_mobile(),
            monitor: FpsMonitor::new(config.fps_window_ms),
            fps_threshold: config.fps_threshold,
            manual_sticky: config.manual_override_sticky,
            manual: false,
        }
    }

    /// Current tier.
    #[must_use]
    pub const fn tier(&self) -> PerformanceTier {
        self.tier
    }

    /// Whether the user agent is a mobile device.
    #[must_use]
    pub const fn is_mobile(&self) -> bool {
        self.is_mobile
    }

    /// Effect bundle for the current tier.
    #[must_use]
    pub const fn policy(&self) -> TierPolicy {
        self.tier.policy(self.is_mobile)
    }

    /// Whether frames should still be fed to [`Self::on_frame`].
    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.tier != PerformanceTier::Reduced && !(self.manual && self.manual_sticky)
    }

    /// Most recent frame-rate sample.
    #[must_use]
    pub const fn last_sample(&self) -> Option<FpsSample> {
        self.monitor.last_sample()
    }

    /// Count an animation frame at `now_ms`.
    ///
    /// Returns a change when a completed window averaged below the threshold
    /// and a lower tier is available.
    pub fn on_frame(&mut self, now_ms: f64) -> Option<TierChange> {
        if !self.is_monitoring() {
            return None;
        }
        let sample = self.monitor.record_frame(now_ms)?;
        tracing::trace!(fps = sample.fps, tier = %self.tier, "Frame-rate sample");
        if sample.fps >= self.fps_threshold {
            return None;
        }
        let to = self.tier.monitor_downgrade()?;
        let from = self.tier;
        self.tier = to;
        tracing::warn!(
            fps = sample.fps,
            from = %from,
            to = %to,
            "Sustained low frame rate, downgrading animations"
        );
        Some(TierChange {
            from,
            to,
            reason: TierChangeReason::LowFrameRate,
            sample: Some(sample),
        })
    }

    /// Document visibility changed. A new window starts when the page comes
    /// back so the hidden gap is never sampled.
    pub fn on_visibility_change(&mut self, hidden: bool, now_ms: f64) {
        if !hidden {
            self.monitor.restart(now_ms);
        }
    }

    /// Force a tier, bypassing classification.
    pub fn set_performance_mode(&mut self, tier: PerformanceTier, now_ms: f64) -> TierChange {
        let from = self.tier;
        self.tier = tier;
        self.manual = true;
        self.monitor.restart(now_ms);
        tracing::info!(from = %from, to = %tier, sticky = self.manual_sticky, "Performance mode set manually");
        TierChange {
            from,
            to: tier,
            reason: TierChangeReason::Manual,
            sample: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop() -> DeviceSignals {
        DeviceSignals {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string(),
            hardware_concurrency: Some(8),
            ..DeviceSignals::default()
        }
    }

    fn slow_window(governor: &mut PerformanceGovernor, start: f64) -> Vec<TierChange> {
        // 20 fps for one second.
        (1..=20)
            .filter_map(|i| governor.on_frame(start + f64::from(i) * 50.0))
            .collect()
    }

    #[test]
    fn starts_at_classified_tier() {
        let governor = PerformanceGovernor::new(&desktop(), &EngineConfig::default());
        assert_eq!(governor.tier(), PerformanceTier::High);
        assert!(governor.is_monitoring());
    }

    #[test]
    fn slow_windows_step_down_to_low_and_stop() {
        let mut governor = PerformanceGovernor::new(&desktop(), &EngineConfig::default());
        governor.on_frame(0.0);

        let first = slow_window(&mut governor, 0.0);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].to, PerformanceTier::Medium);

        let second = slow_window(&mut governor, 1000.0);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].to, PerformanceTier::Low);

        assert!(slow_window(&mut governor, 2000.0).is_empty());
        assert_eq!(governor.tier(), PerformanceTier::Low);
    }

    #[test]
    fn reduced_motion_never_monitors() {
        let signals = DeviceSignals {
            prefers_reduced_motion: true,
            ..desktop()
        };
        let mut governor = PerformanceGovernor::new(&signals, &EngineConfig::default());
        assert!(!governor.is_monitoring());
        assert!(governor.on_frame(0.0).is_none());
    }

    #[test]
    fn manual_override_then_automatic_downgrade() {
        let mut governor = PerformanceGovernor::new(&desktop(), &EngineConfig::default());
        let change = governor.set_performance_mode(PerformanceTier::Medium, 0.0);
        assert_eq!(change.reason, TierChangeReason::Manual);
        let changes = slow_window(&mut governor, 0.0);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].to, PerformanceTier::Low);
    }

    #[test]
    fn sticky_manual_override_blocks_downgrade() {
        let config = EngineConfig {
            manual_override_sticky: true,
            ..EngineConfig::default()
        };
        let mut governor = PerformanceGovernor::new(&desktop(), &config);
        governor.set_performance_mode(PerformanceTier::High, 0.0);
        assert!(slow_window(&mut governor, 0.0).is_empty());
        assert_eq!(governor.tier(), PerformanceTier::High);
    }

    #[test]
    fn visibility_restart_discards_hidden_gap() {
        let mut governor = PerformanceGovernor::new(&desktop(), &EngineConfig::default());
        governor.on_frame(0.0);
        governor.on_frame(16.0);
        // Tab hidden for 5 seconds, then two frames: no 0.4 fps sample.
        governor.on_visibility_change(true, 16.0);
        governor.on_visibility_change(false, 5016.0);
        assert!(governor.on_frame(5032.0).is_none());
        assert_eq!(governor.tier(), PerformanceTier::High);
    }
}
