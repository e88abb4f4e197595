//! Scripted page scenarios and their replay.
//!
//! A [`Scenario`] describes a page (viewport, nodes with fixed boxes,
//! device signals, engine configuration) and a list of [`Step`]s. Replaying
//! it through a [`HeadlessSession`] yields a timeline of [`LogEvent`]s.

use std::fmt;

use motion_core::{
    DeviceSignals, EngineConfig, HeadlessPage, HeadlessSession, Mutation, NodeKey, NodeSnapshot,
    PerformanceTier, Rect, TierChange, TierChangeReason, Viewport,
};
use serde::{Deserialize, Serialize};

/// Frame interval when a scenario does not set one, about 60 fps.
pub const DEFAULT_FRAME_MS: f64 = motion_core::headless::DEFAULT_FRAME_MS;

/// A page node with its document box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioNode {
    /// Key, tag, classes, data attributes and children.
    #[serde(flatten)]
    pub snapshot: NodeSnapshot,
    /// Box in document coordinates.
    pub rect: Rect,
}

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Scroll to an absolute offset. Takes effect on the next frame.
    Scroll {
        /// Target scroll offset in pixels.
        to: f64,
    },
    /// Let time pass, delivering frames at the current interval.
    Advance {
        /// Milliseconds to advance.
        ms: f64,
    },
    /// Let time pass without frames (a stalled or throttled page).
    Sleep {
        /// Milliseconds to skip.
        ms: f64,
    },
    /// Change the frame interval for later `advance` steps.
    FrameInterval {
        /// Milliseconds between frames.
        ms: f64,
    },
    /// Document becomes hidden.
    Hidden,
    /// Document becomes visible.
    Visible,
    /// Resize the viewport.
    Resize {
        /// New viewport width.
        width: f64,
        /// New viewport height.
        height: f64,
    },
    /// Rescan the page for nodes added since the last scan.
    Refresh,
    /// Force a performance tier.
    SetMode {
        /// Tier to apply.
        tier: PerformanceTier,
    },
    /// Remove a node from the document.
    Detach {
        /// Node to remove.
        node: NodeKey,
    },
    /// Move a node.
    Move {
        /// Node to move.
        node: NodeKey,
        /// New document box.
        rect: Rect,
    },
    /// Insert a node. Invisible to the engine until the next `refresh`.
    Add {
        /// Node to insert.
        node: ScenarioNode,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scroll { to } => write!(f, "scroll to {to}"),
            Self::Advance { ms } => write!(f, "advance {ms}ms"),
            Self::Sleep { ms } => write!(f, "sleep {ms}ms"),
            Self::FrameInterval { ms } => write!(f, "frame interval {ms}ms"),
            Self::Hidden => f.write_str("document hidden"),
            Self::Visible => f.write_str("document visible"),
            Self::Resize { width, height } => write!(f, "resize to {width}x{height}"),
            Self::Refresh => f.write_str("refresh"),
            Self::SetMode { tier } => write!(f, "set mode {tier}"),
            Self::Detach { node } => write!(f, "detach {node}"),
            Self::Move { node, rect } => write!(f, "move {node} to y={}", rect.y),
            Self::Add { node } => write!(f, "add {}", node.snapshot.key),
        }
    }
}

/// A scripted page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Initial viewport and document height.
    pub viewport: Viewport,
    /// Device signals the governor classifies.
    #[serde(default)]
    pub signals: DeviceSignals,
    /// Engine configuration. Defaults apply when absent.
    #[serde(default)]
    pub config: Option<EngineConfig>,
    /// Nodes present at load.
    #[serde(default)]
    pub nodes: Vec<ScenarioNode>,
    /// Actions, in order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One line of the replay log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    /// A scripted step began.
    Step {
        /// Scenario time.
        at_ms: f64,
        /// Position in the step list.
        index: usize,
        /// The step.
        step: Step,
    },
    /// The engine produced a mutation.
    Mutation {
        /// Scenario time.
        at_ms: f64,
        /// The mutation.
        mutation: Mutation,
    },
    /// The performance tier changed.
    TierChange {
        /// Scenario time.
        at_ms: f64,
        /// Previous tier.
        from: PerformanceTier,
        /// New tier.
        to: PerformanceTier,
        /// Cause.
        reason: TierChangeReason,
        /// Frame rate of the window that triggered a downgrade.
        fps: Option<f64>,
    },
    /// Final state.
    Summary(Summary),
}

/// Final state of a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Scenario time at the end.
    pub at_ms: f64,
    /// Final tier.
    pub tier: PerformanceTier,
    /// Tracked nodes.
    pub tracked: usize,
    /// Nodes whose entrance animation fired.
    pub animated: usize,
    /// Counters started.
    pub counted: usize,
    /// Reveal sections uncovered.
    pub revealed: usize,
    /// Final progress bar width.
    pub progress: Option<f64>,
    /// Mutations applied over the whole run.
    pub mutations: usize,
}

impl LogEvent {
    /// Scenario time of the event.
    #[must_use]
    pub const fn at_ms(&self) -> f64 {
        match self {
            Self::Step { at_ms, .. }
            | Self::Mutation { at_ms, .. }
            | Self::TierChange { at_ms, .. } => *at_ms,
            Self::Summary(summary) => summary.at_ms,
        }
    }

    fn tier_change(at_ms: f64, change: &TierChange) -> Self {
        Self::TierChange {
            at_ms,
            from: change.from,
            to: change.to,
            reason: change.reason,
            fps: change.sample.map(|s| s.fps),
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:>9.1}ms] ", self.at_ms())?;
        match self {
            Self::Step { index, step, .. } => write!(f, "step {index}: {step}"),
            Self::Mutation { mutation, .. } => write!(f, "  {mutation}"),
            Self::TierChange {
                from,
                to,
                reason,
                fps,
                ..
            } => {
                write!(f, "tier {from} -> {to}")?;
                match (reason, fps) {
                    (TierChangeReason::LowFrameRate, Some(fps)) => {
                        write!(f, " (low frame rate, {fps} fps)")
                    }
                    (TierChangeReason::LowFrameRate, None) => f.write_str(" (low frame rate)"),
                    (TierChangeReason::Manual, _) => f.write_str(" (manual)"),
                }
            }
            Self::Summary(s) => {
                write!(
                    f,
                    "done: tier {}, {} tracked, {} animated, {} counted, {} revealed, {} mutations",
                    s.tier, s.tracked, s.animated, s.counted, s.revealed, s.mutations
                )?;
                if let Some(progress) = s.progress {
                    write!(f, ", progress {progress}%")?;
                }
                Ok(())
            }
        }
    }
}

/// Replays a scenario against a headless page.
#[derive(Debug)]
pub struct Replay {
    session: HeadlessSession,
    frame_ms: f64,
    events: Vec<LogEvent>,
    mutations: usize,
    keys: Vec<NodeKey>,
}

impl Replay {
    /// Build the page and start the engine. `config` overrides the
    /// scenario's own configuration.
    #[must_use]
    pub fn start(scenario: &Scenario, config: Option<EngineConfig>) -> Self {
        let mut page = HeadlessPage::new(scenario.viewport);
        for node in &scenario.nodes {
            page.add_node(node.snapshot.clone(), node.rect);
        }
        let config = config
            .or_else(|| scenario.config.clone())
            .unwrap_or_default();
        let session = HeadlessSession::start(page, config, &scenario.signals);

        let mut replay = Self {
            session,
            frame_ms: DEFAULT_FRAME_MS,
            events: Vec::new(),
            mutations: 0,
            keys: scenario.nodes.iter().map(|n| n.snapshot.key).collect(),
        };
        replay.drain();
        tracing::debug!(
            nodes = replay.keys.len(),
            tier = %replay.session.engine().tier(),
            "Scenario started"
        );
        replay
    }

    /// Run one step.
    pub fn step(&mut self, index: usize, step: &Step) {
        self.events.push(LogEvent::Step {
            at_ms: self.session.now(),
            index,
            step: step.clone(),
        });
        match step {
            Step::Scroll { to } => self.session.scroll_to(*to),
            Step::Advance { ms } => self.advance(*ms),
            Step::Sleep { ms } => self.session.sleep(ms.max(0.0)),
            Step::FrameInterval { ms } => {
                if *ms > 0.0 {
                    self.frame_ms = *ms;
                } else {
                    tracing::warn!(ms, "Ignoring non-positive frame interval");
                }
            }
            Step::Hidden => self.session.set_hidden(true),
            Step::Visible => self.session.set_hidden(false),
            Step::Resize { width, height } => self.session.resize(*width, *height),
            Step::Refresh => self.session.refresh(),
            Step::SetMode { tier } => self.session.set_performance_mode(*tier),
            Step::Detach { node } => {
                if !self.session.page_mut().detach(*node) {
                    tracing::warn!(node = %node, "Detach of unknown node");
                }
            }
            Step::Move { node, rect } => {
                if !self.session.page_mut().set_rect(*node, *rect) {
                    tracing::warn!(node = %node, "Move of unknown node");
                }
            }
            Step::Add { node } => {
                self.session
                    .page_mut()
                    .add_node(node.snapshot.clone(), node.rect);
                if !self.keys.contains(&node.snapshot.key) {
                    self.keys.push(node.snapshot.key);
                }
            }
        }
        self.drain();
    }

    /// Frame by frame so every mutation carries the time it happened.
    fn advance(&mut self, ms: f64) {
        let end = self.session.now() + ms.max(0.0);
        while self.session.now() + self.frame_ms <= end {
            self.session.sleep(self.frame_ms);
            self.session.frame();
            self.drain();
        }
        let rest = end - self.session.now();
        self.session.sleep(rest);
    }

    fn drain(&mut self) {
        let at_ms = self.session.now();
        for change in self.session.take_tier_changes() {
            self.events.push(LogEvent::tier_change(at_ms, &change));
        }
        let log = self.session.take_log();
        self.mutations += log.len();
        self.events
            .extend(log.into_iter().map(|mutation| LogEvent::Mutation { at_ms, mutation }));
    }

    /// Final state.
    #[must_use]
    pub fn summary(&self) -> Summary {
        let engine = self.session.engine();
        let orchestrator = engine.orchestrator();
        let count = |f: &dyn Fn(NodeKey) -> bool| self.keys.iter().filter(|k| f(**k)).count();
        Summary {
            at_ms: self.session.now(),
            tier: engine.tier(),
            tracked: orchestrator.tracked_len(),
            animated: count(&|k| orchestrator.is_animated(k)),
            counted: count(&|k| orchestrator.is_counted(k)),
            revealed: count(&|k| orchestrator.is_revealed(k)),
            progress: self.session.page().progress(),
            mutations: self.mutations,
        }
    }

    /// The session being driven.
    #[must_use]
    pub const fn session(&self) -> &HeadlessSession {
        &self.session
    }

    /// Consume the replay, returning the log with the summary appended.
    #[must_use]
    pub fn finish(mut self) -> Vec<LogEvent> {
        let summary = self.summary();
        self.events.push(LogEvent::Summary(summary));
        self.events
    }
}

/// Replay every step of `scenario`.
#[must_use]
pub fn replay(scenario: &Scenario, config: Option<EngineConfig>) -> Vec<LogEvent> {
    let mut replay = Replay::start(scenario, config);
    for (index, step) in scenario.steps.iter().enumerate() {
        replay.step(index, step);
    }
    replay.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"{
        "name": "hero",
        "viewport": { "scroll_top": 0, "width": 1280, "height": 800, "document_height": 3000 },
        "nodes": [
            { "key": 1, "tag": "div", "classes": ["fade-in-up"],
              "rect": { "x": 0, "y": 1500, "width": 400, "height": 200 } }
        ],
        "steps": [
            { "step": "scroll", "to": 1000 },
            { "step": "advance", "ms": 200 }
        ]
    }"#;

    #[test]
    fn parses_tagged_steps() {
        let scenario: Scenario = serde_json::from_str(SCENARIO).unwrap();
        assert_eq!(scenario.name.as_deref(), Some("hero"));
        assert_eq!(scenario.nodes[0].snapshot.key, NodeKey(1));
        assert_eq!(scenario.steps[0], Step::Scroll { to: 1000.0 });
        assert!(scenario.config.is_none());
    }

    #[test]
    fn replay_fires_entrance_and_ends_with_summary() {
        let scenario: Scenario = serde_json::from_str(SCENARIO).unwrap();
        let events = replay(&scenario, None);
        let Some(LogEvent::Summary(summary)) = events.last() else {
            panic!("missing summary");
        };
        assert_eq!(summary.animated, 1);
        assert_eq!(summary.tier, PerformanceTier::High);
        assert!((summary.at_ms - 200.0).abs() < 1e-9);

        let times: Vec<f64> = events.iter().map(LogEvent::at_ms).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn text_lines_are_readable() {
        let event = LogEvent::TierChange {
            at_ms: 1050.0,
            from: PerformanceTier::High,
            to: PerformanceTier::Medium,
            reason: TierChangeReason::LowFrameRate,
            fps: Some(20.0),
        };
        assert_eq!(
            event.to_string(),
            "[   1050.0ms] tier high -> medium (low frame rate, 20 fps)"
        );
        let step = LogEvent::Step {
            at_ms: 0.0,
            index: 2,
            step: Step::Hidden,
        };
        assert_eq!(step.to_string(), "[      0.0ms] step 2: document hidden");
    }
}
