//! Engine façade tying the orchestrator to the performance governor.
//!
//! Hosts own one [`MotionEngine`] and feed it every event. Each call returns
//! the mutations to apply, in order.

use crate::config::EngineConfig;
use crate::device::DeviceSignals;
use crate::element::NodeSnapshot;
use crate::governor::{PerformanceGovernor, TierChange};
use crate::mutation::{LayoutSource, Mutation};
use crate::orchestrator::ScrollOrchestrator;
use crate::tier::{PerformanceTier, TierPolicy};

/// A scroll animation engine instance.
#[derive(Debug)]
pub struct MotionEngine {
    orchestrator: ScrollOrchestrator,
    governor: PerformanceGovernor,
    tier_changes: Vec<TierChange>,
}

impl MotionEngine {
    /// Classify the device and build an engine at the resulting tier.
    #[must_use]
    pub fn new(config: EngineConfig, signals: &DeviceSignals) -> Self {
        let governor = PerformanceGovernor::new(signals, &config);
        let orchestrator = ScrollOrchestrator::new(config, governor.policy());
        Self {
            orchestrator,
            governor,
            tier_changes: Vec::new(),
        }
    }

    /// Scan the document and apply the starting tier.
    pub fn initialize(&mut self, nodes: &[NodeSnapshot], layout: &dyn LayoutSource) -> Vec<Mutation> {
        self.orchestrator.initialize(nodes, layout)
    }

    /// Pick up nodes added since the last scan. Safe to call redundantly.
    pub fn refresh(&mut self, nodes: &[NodeSnapshot], layout: &dyn LayoutSource) -> Vec<Mutation> {
        self.orchestrator.refresh(nodes, layout)
    }

    /// Scroll event. Returns whether the host should request a frame.
    pub fn on_scroll(&mut self, now_ms: f64) -> bool {
        self.orchestrator.on_scroll(now_ms)
    }

    /// Resize event.
    pub fn on_resize(&mut self, now_ms: f64, layout: &dyn LayoutSource) -> Vec<Mutation> {
        self.orchestrator.on_resize(now_ms, layout)
    }

    /// Animation frame at `now_ms`.
    ///
    /// Samples the frame rate (re-applying the tier bundle on a downgrade),
    /// runs the scheduled frame pass and the debounced rescan, and advances
    /// counters.
    pub fn on_frame(&mut self, now_ms: f64, layout: &dyn LayoutSource) -> Vec<Mutation> {
        let mut out = Vec::new();
        if let Some(change) = self.governor.on_frame(now_ms) {
            out.extend(self.orchestrator.apply_policy(self.governor.policy()));
            self.tier_changes.push(change);
        }
        out.extend(self.orchestrator.on_frame(layout));
        out.extend(self.orchestrator.poll_debounce(now_ms, layout));
        out.extend(self.orchestrator.advance_counters(now_ms));
        out
    }

    /// One counter timer tick, for hosts driving counters from a timer.
    pub fn on_counter_tick(&mut self) -> Vec<Mutation> {
        self.orchestrator.tick_counters()
    }

    /// Document visibility changed.
    pub fn on_visibility_change(&mut self, hidden: bool, now_ms: f64) -> Vec<Mutation> {
        self.governor.on_visibility_change(hidden, now_ms);
        self.orchestrator.on_visibility_change(hidden)
    }

    /// Force a tier and re-apply its bundle.
    pub fn set_performance_mode(&mut self, tier: PerformanceTier, now_ms: f64) -> Vec<Mutation> {
        let change = self.governor.set_performance_mode(tier, now_ms);
        self.tier_changes.push(change);
        self.orchestrator.apply_policy(self.governor.policy())
    }

    /// Current tier.
    #[must_use]
    pub const fn tier(&self) -> PerformanceTier {
        self.governor.tier()
    }

    /// Current tier bundle.
    #[must_use]
    pub const fn policy(&self) -> TierPolicy {
        self.governor.policy()
    }

    /// Drain tier changes recorded since the last call.
    pub fn take_tier_changes(&mut self) -> Vec<TierChange> {
        std::mem::take(&mut self.tier_changes)
    }

    /// The orchestrator, for inspection.
    #[must_use]
    pub const fn orchestrator(&self) -> &ScrollOrchestrator {
        &self.orchestrator
    }

    /// The governor, for inspection.
    #[must_use]
    pub const fn governor(&self) -> &PerformanceGovernor {
        &self.governor
    }
}
