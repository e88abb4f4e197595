//! Count-up ramps.
//!
//! A ramp advances by `target / (duration / tick)` per timer tick and renders
//! the floor of the running value. When the running value reaches the target
//! it snaps to exactly the target and finishes. Ramps are plain state; the
//! orchestrator owns them and the host drives the ticks.

use std::collections::BTreeMap;

use crate::element::{CounterSpec, NodeKey, TrackId};

/// Lifecycle of a ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampState {
    /// Advancing on every tick.
    Running,
    /// Suspended while the document is hidden.
    Paused,
    /// Reached its target.
    Finished,
}

/// A single count-up animation.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterRamp {
    target: u64,
    increment: f64,
    current: f64,
    prefix: String,
    suffix: String,
    state: RampState,
}

impl CounterRamp {
    /// Create a running ramp for `spec` stepping every `tick_ms`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(spec: &CounterSpec, tick_ms: f64) -> Self {
        let target = spec.target as f64;
        let steps = f64::from(spec.duration_ms) / tick_ms;
        // Durations shorter than one tick finish on the first step.
        let increment = if steps >= 1.0 { target / steps } else { target };
        Self {
            target: spec.target,
            increment,
            current: 0.0,
            prefix: spec.prefix.clone(),
            suffix: spec.suffix.clone(),
            state: RampState::Running,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RampState {
        self.state
    }

    /// Whether the ramp reached its target.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == RampState::Finished
    }

    /// The value currently displayed.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn value(&self) -> u64 {
        (self.current.floor() as u64).min(self.target)
    }

    /// Advance one tick. Returns the text to render, or `None` if the ramp
    /// is not running.
    #[allow(clippy::cast_precision_loss)]
    pub fn step(&mut self) -> Option<String> {
        if self.state != RampState::Running {
            return None;
        }
        self.current += self.increment;
        if self.current >= self.target as f64 || self.increment <= 0.0 {
            self.current = self.target as f64;
            self.state = RampState::Finished;
        }
        Some(self.render())
    }

    /// Suspend a running ramp. Returns whether it was running.
    pub fn pause(&mut self) -> bool {
        if self.state == RampState::Running {
            self.state = RampState::Paused;
            true
        } else {
            false
        }
    }

    /// Resume a paused ramp from its current value.
    pub fn resume(&mut self) -> bool {
        if self.state == RampState::Paused {
            self.state = RampState::Running;
            true
        } else {
            false
        }
    }

    /// Render `prefix + value + suffix`.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}{}{}", self.prefix, group_thousands(self.value()), self.suffix)
    }
}

/// Format with `,` thousands separators (`1234567` → `1,234,567`).
#[must_use]
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// One rendered ramp step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterFrame {
    /// Node to write into.
    pub node: NodeKey,
    /// Text to display.
    pub text: String,
    /// Whether this was the final value.
    pub finished: bool,
}

/// The set of live ramps, keyed by track id.
#[derive(Debug, Default)]
pub struct CounterScheduler {
    tasks: BTreeMap<TrackId, (NodeKey, CounterRamp)>,
}

impl CounterScheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a ramp for a node.
    pub fn start(&mut self, id: TrackId, node: NodeKey, ramp: CounterRamp) {
        self.tasks.insert(id, (node, ramp));
    }

    /// Stop a ramp. Returns whether one was live.
    pub fn cancel(&mut self, id: TrackId) -> bool {
        self.tasks.remove(&id).is_some()
    }

    /// Whether a ramp is live for `id`.
    #[must_use]
    pub fn contains(&self, id: TrackId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Number of live ramps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no ramps are live. Hosts stop their tick timer when true.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Advance every running ramp one tick; finished ramps are dropped.
    pub fn tick(&mut self) -> Vec<CounterFrame> {
        let mut frames = Vec::new();
        self.tasks.retain(|_, (node, ramp)| {
            if let Some(text) = ramp.step() {
                frames.push(CounterFrame {
                    node: *node,
                    text,
                    finished: ramp.is_finished(),
                });
            }
            !ramp.is_finished()
        });
        frames
    }

    /// Pause every running ramp. Returns how many were paused.
    pub fn pause_all(&mut self) -> usize {
        self.tasks
            .values_mut()
            .map(|(_, ramp)| ramp.pause())
            .filter(|paused| *paused)
            .count()
    }

    /// Resume one paused ramp. Returns whether it was paused.
    pub fn resume(&mut self, id: TrackId) -> bool {
        self.tasks
            .get_mut(&id)
            .is_some_and(|(_, ramp)| ramp.resume())
    }

    /// Whether the ramp for `id` is paused.
    #[must_use]
    pub fn is_paused(&self, id: TrackId) -> bool {
        self.tasks
            .get(&id)
            .is_some_and(|(_, ramp)| ramp.state() == RampState::Paused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(target: u64, duration_ms: u32) -> CounterSpec {
        CounterSpec {
            target,
            duration_ms,
            prefix: String::new(),
            suffix: String::new(),
        }
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn ramp_finishes_exactly_on_target() {
        let mut ramp = CounterRamp::new(&spec(1000, 160), 16.0);
        let mut last = None;
        let mut steps = 0;
        while let Some(text) = ramp.step() {
            last = Some(text);
            steps += 1;
        }
        assert_eq!(steps, 10);
        assert_eq!(last.as_deref(), Some("1,000"));
        assert_eq!(ramp.value(), 1000);
        assert!(ramp.step().is_none());
    }

    #[test]
    fn ramp_with_affixes() {
        let mut ramp = CounterRamp::new(
            &CounterSpec {
                target: 50,
                duration_ms: 0,
                prefix: "~".to_string(),
                suffix: "%".to_string(),
            },
            16.0,
        );
        assert_eq!(ramp.step().as_deref(), Some("~50%"));
        assert!(ramp.is_finished());
    }

    #[test]
    fn zero_target_finishes_immediately() {
        let mut ramp = CounterRamp::new(&spec(0, 2000), 16.0);
        assert_eq!(ramp.step().as_deref(), Some("0"));
        assert!(ramp.is_finished());
    }

    #[test]
    fn paused_ramp_does_not_advance() {
        let mut ramp = CounterRamp::new(&spec(100, 1600), 16.0);
        ramp.step();
        let before = ramp.value();
        assert!(ramp.pause());
        assert!(ramp.step().is_none());
        assert_eq!(ramp.value(), before);
        assert!(ramp.resume());
        assert!(ramp.step().is_some());
        assert!(ramp.value() >= before);
    }

    #[test]
    fn scheduler_drops_finished_and_cancelled() {
        let mut scheduler = CounterScheduler::new();
        let quick = TrackId::new();
        let slow = TrackId::new();
        scheduler.start(quick, NodeKey(1), CounterRamp::new(&spec(5, 0), 16.0));
        scheduler.start(slow, NodeKey(2), CounterRamp::new(&spec(500, 2000), 16.0));

        let frames = scheduler.tick();
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().any(|f| f.node == NodeKey(1) && f.finished));
        assert!(!scheduler.contains(quick));
        assert!(scheduler.contains(slow));

        assert!(scheduler.cancel(slow));
        assert!(!scheduler.cancel(slow));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn scheduler_pause_and_resume() {
        let mut scheduler = CounterScheduler::new();
        let id = TrackId::new();
        scheduler.start(id, NodeKey(1), CounterRamp::new(&spec(500, 2000), 16.0));
        assert_eq!(scheduler.pause_all(), 1);
        assert!(scheduler.is_paused(id));
        assert!(scheduler.tick().is_empty());
        assert!(scheduler.resume(id));
        assert_eq!(scheduler.tick().len(), 1);
    }
}
