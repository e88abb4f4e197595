//! # Scroll Orchestrator
//!
//! Owns every tracked node and turns scroll, resize, visibility and frame
//! events into [`Mutation`]s.
//!
//! ```text
//! scroll ──▶ on_scroll ──(schedule)──▶ on_frame ──▶ header
//!    │                                          ├─▶ entrances (trackables, staggers)
//!    │                                          ├─▶ parallax
//!    │                                          ├─▶ progress
//!    │                                          ├─▶ counters (start / resume)
//!    │                                          ├─▶ videos (play / pause)
//!    │                                          └─▶ reveal overlays
//!    └──(arm)──▶ poll_debounce ──▶ entrance rescan once scrolling settles
//! ```
//!
//! State only moves forward: a node that has animated, counted or revealed
//! never goes back, so the per-frame pass and the debounced rescan can
//! interleave in any order.

use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::counter::{CounterRamp, CounterScheduler};
use crate::element::{
    NodeKey, NodeSnapshot, ParallaxLayer, ParallaxSpec, Roles, StaggerSpec, TrackId, TrackableSpec,
};
use crate::geometry::{self, Axis, Rect};
use crate::header::{HeaderEffect, HeaderState};
use crate::mutation::{LayoutSource, Mutation, StyleProperty};
use crate::registry::AnimationStateRegistry;
use crate::tier::{ScrollAttachment, TierPolicy};
use crate::variant::AnimationVariant;
use crate::{MotionError, MotionResult};

/// Class added once an entrance animation has fired.
pub const ANIMATED_CLASS: &str = "animated";
/// Class given to every stagger child.
pub const STAGGER_ITEM_CLASS: &str = "stagger-item";
/// Class toggled on the mobile header once scrolled.
pub const HEADER_SCROLLED_CLASS: &str = "header-scrolled";

const STAGGER_ITEM_OFFSET: &str = "translateY(30px)";
const STAGGER_ITEM_RESTING: &str = "translateY(0)";
const PARALLAX_TRANSITION: &str = "transform 0.1s ease-out";
const HEADER_TRANSITION: &str = "transform 0.3s ease";
const VIDEO_PARALLAX_SCALE: &str = "scale(1.1)";
const PARALLAX_ELEMENT_FACTOR: f64 = 0.5;

#[derive(Debug, Clone)]
struct TrackedNode {
    id: TrackId,
    roles: Roles,
}

/// Render a pixel length without `-0` or float noise.
fn px(value: f64) -> String {
    format!("{}px", (value * 100.0).round() / 100.0 + 0.0)
}

fn locate(layout: &dyn LayoutSource, key: NodeKey) -> MotionResult<Rect> {
    layout
        .element_box(key)
        .ok_or_else(|| MotionError::Detached(key.to_string()))
}

/// Route a per-element result: detached nodes are collected for pruning,
/// anything else is logged and the pass continues.
fn settle(key: NodeKey, result: MotionResult<()>, detached: &mut Vec<NodeKey>) {
    match result {
        Ok(()) => {}
        Err(MotionError::Detached(_)) => detached.push(key),
        Err(err) => tracing::warn!(node = %key, error = %err, "Skipping element"),
    }
}

fn header_mutations(key: NodeKey, effect: HeaderEffect, out: &mut Vec<Mutation>) {
    match effect {
        HeaderEffect::Hide { height } => out.push(Mutation::style(
            key,
            StyleProperty::Transform,
            format!("translateY(-{})", px(height)),
        )),
        HeaderEffect::Show => {
            out.push(Mutation::style(key, StyleProperty::Transform, "translateY(0)"));
        }
        HeaderEffect::Shadow(scrolled) => {
            out.push(Mutation::class(key, HEADER_SCROLLED_CLASS, scrolled));
        }
        HeaderEffect::Unchanged => {}
    }
}

/// Scroll-driven animation state machine.
#[derive(Debug)]
pub struct ScrollOrchestrator {
    config: EngineConfig,
    policy: TierPolicy,
    nodes: BTreeMap<NodeKey, TrackedNode>,
    registry: AnimationStateRegistry,
    counters: CounterScheduler,
    header: Option<(NodeKey, HeaderState)>,
    header_effect: Option<HeaderEffect>,
    last_progress: Option<f64>,
    initialized: bool,
    tick_scheduled: bool,
    rescan_due: Option<f64>,
    counter_clock: Option<f64>,
    hidden: bool,
}

impl ScrollOrchestrator {
    /// Create an orchestrator applying `policy`.
    #[must_use]
    pub fn new(config: EngineConfig, policy: TierPolicy) -> Self {
        Self {
            config,
            policy,
            nodes: BTreeMap::new(),
            registry: AnimationStateRegistry::new(),
            counters: CounterScheduler::new(),
            header: None,
            header_effect: None,
            last_progress: None,
            initialized: false,
            tick_scheduled: false,
            rescan_due: None,
            counter_clock: None,
            hidden: false,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Policy currently applied.
    #[must_use]
    pub const fn policy(&self) -> &TierPolicy {
        &self.policy
    }

    /// Per-node state.
    #[must_use]
    pub const fn registry(&self) -> &AnimationStateRegistry {
        &self.registry
    }

    /// Number of tracked nodes.
    #[must_use]
    pub fn tracked_len(&self) -> usize {
        self.nodes.len()
    }

    /// Track id bound to a host node.
    #[must_use]
    pub fn track_id(&self, key: NodeKey) -> Option<TrackId> {
        self.nodes.get(&key).map(|n| n.id)
    }

    /// Whether `key`'s entrance animation (or stagger) has fired.
    #[must_use]
    pub fn is_animated(&self, key: NodeKey) -> bool {
        self.track_id(key).is_some_and(|id| self.registry.is_animated(id))
    }

    /// Whether `key`'s counter has started.
    #[must_use]
    pub fn is_counted(&self, key: NodeKey) -> bool {
        self.track_id(key).is_some_and(|id| self.registry.is_counted(id))
    }

    /// Whether `key`'s reveal overlay has slid away.
    #[must_use]
    pub fn is_revealed(&self, key: NodeKey) -> bool {
        self.track_id(key).is_some_and(|id| self.registry.is_revealed(id))
    }

    /// Whether `key`'s video is playing.
    #[must_use]
    pub fn is_playing(&self, key: NodeKey) -> bool {
        self.track_id(key).is_some_and(|id| self.registry.is_playing(id))
    }

    /// Number of live counter ramps.
    #[must_use]
    pub fn active_counters(&self) -> usize {
        self.counters.len()
    }

    /// Whether a frame has been requested since the last tick.
    #[must_use]
    pub const fn is_tick_scheduled(&self) -> bool {
        self.tick_scheduled
    }

    /// Whether the document is currently hidden.
    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn effective_variant(&self, variant: AnimationVariant) -> AnimationVariant {
        if self.policy.simplify_complex {
            variant.simplified()
        } else {
            variant
        }
    }

    // ========================================================================
    // Scanning
    // ========================================================================

    /// Scan the document once: assign initial presentation, inject overlays
    /// and the progress bar, set up the header, then run an initial
    /// visibility check and frame pass.
    pub fn initialize(&mut self, nodes: &[NodeSnapshot], layout: &dyn LayoutSource) -> Vec<Mutation> {
        if self.initialized {
            tracing::debug!("Orchestrator already initialized, refreshing instead");
            return self.refresh(nodes, layout);
        }
        self.initialized = true;

        let mut out = vec![Mutation::InjectProgressIndicator];
        self.policy_globals(&mut out);
        let tracked = nodes
            .iter()
            .filter(|node| self.track(node, layout, &mut out))
            .count();
        tracing::info!(
            tracked,
            scanned = nodes.len(),
            tier = %self.policy.tier,
            "Scroll orchestrator initialized"
        );
        self.rescan(layout, &mut out);
        out.extend(self.tick(layout));
        out
    }

    /// Track nodes not seen before and check entrance triggers. Already
    /// tracked nodes keep their ids and state.
    pub fn refresh(&mut self, nodes: &[NodeSnapshot], layout: &dyn LayoutSource) -> Vec<Mutation> {
        let mut out = Vec::new();
        let added = nodes
            .iter()
            .filter(|node| self.track(node, layout, &mut out))
            .count();
        tracing::debug!(added, tracked = self.nodes.len(), "Refreshed tracked elements");
        self.rescan(layout, &mut out);
        // New counters and reveal sections may already be in view.
        if added > 0 {
            self.tick_scheduled = true;
        }
        out
    }

    /// Start tracking one node. Returns whether it was newly tracked.
    fn track(&mut self, node: &NodeSnapshot, layout: &dyn LayoutSource, out: &mut Vec<Mutation>) -> bool {
        if self.nodes.contains_key(&node.key) {
            return false;
        }
        let roles = Roles::classify(node, &self.config);
        if roles.is_empty() {
            return false;
        }
        let id = TrackId::new();
        let key = node.key;
        self.registry.register(id);

        if roles.header {
            self.setup_header(key, layout, out);
        }
        if let Some(spec) = &roles.trackable {
            self.setup_trackable(key, id, spec, out);
        }
        if let Some(spec) = &roles.parallax {
            out.push(Mutation::style(key, StyleProperty::Transition, PARALLAX_TRANSITION));
            self.parallax_attachment(key, spec, out);
        }
        if roles.video.is_some_and(|v| v.parallax_speed.is_some()) {
            out.push(Mutation::style(key, StyleProperty::Transform, VIDEO_PARALLAX_SCALE));
            out.push(Mutation::style(key, StyleProperty::Transition, PARALLAX_TRANSITION));
        }
        if let Some(direction) = roles.reveal {
            out.push(Mutation::style(key, StyleProperty::Position, "relative"));
            out.push(Mutation::style(key, StyleProperty::Overflow, "hidden"));
            out.push(Mutation::InjectOverlay {
                section: key,
                transform: direction.covering().to_string(),
            });
        }
        if let Some(spec) = &roles.stagger {
            self.setup_stagger(key, id, spec, out);
        }

        tracing::trace!(node = %key, track = %id, "Tracking node");
        self.nodes.insert(key, TrackedNode { id, roles });
        true
    }

    fn setup_header(&mut self, key: NodeKey, layout: &dyn LayoutSource, out: &mut Vec<Mutation>) {
        if let Some((existing, _)) = self.header {
            tracing::warn!(node = %key, header = %existing, "Ignoring second header");
            return;
        }
        let height = layout.element_box(key).map_or(0.0, |r| r.height);
        out.push(Mutation::style(key, StyleProperty::Position, "fixed"));
        out.push(Mutation::style(key, StyleProperty::Top, "0"));
        out.push(Mutation::style(key, StyleProperty::Width, "100%"));
        out.push(Mutation::style(key, StyleProperty::ZIndex, "1000"));
        out.push(Mutation::style(key, StyleProperty::Transition, HEADER_TRANSITION));
        out.push(Mutation::SetDocumentPaddingTop { px: height });
        self.header = Some((key, HeaderState::new(height)));
    }

    fn setup_trackable(&mut self, key: NodeKey, id: TrackId, spec: &TrackableSpec, out: &mut Vec<Mutation>) {
        if self.registry.is_animated(id) {
            return;
        }
        if self.policy.suppress_motion {
            self.snap_trackable(key, id, spec, out);
            return;
        }
        let initial = self.effective_variant(spec.variant).initial();
        out.push(Mutation::style(key, StyleProperty::Opacity, initial.opacity.to_string()));
        if let Some(transform) = initial.transform {
            out.push(Mutation::style(key, StyleProperty::Transform, transform));
        }
        out.push(Mutation::style(key, StyleProperty::Transition, spec.timing.transition()));
        out.push(Mutation::style(key, StyleProperty::TransitionDelay, spec.timing.delay()));
    }

    /// Put a trackable straight into its resting state without motion.
    fn snap_trackable(&mut self, key: NodeKey, id: TrackId, spec: &TrackableSpec, out: &mut Vec<Mutation>) {
        let resting = spec.variant.resting();
        out.push(Mutation::style(key, StyleProperty::Transition, "none"));
        out.push(Mutation::style(key, StyleProperty::Opacity, resting.opacity.to_string()));
        if let Some(transform) = resting.transform {
            out.push(Mutation::style(key, StyleProperty::Transform, transform));
        }
        out.push(Mutation::class(key, ANIMATED_CLASS, true));
        self.registry.mark_animated(id);
    }

    fn setup_stagger(&mut self, key: NodeKey, id: TrackId, spec: &StaggerSpec, out: &mut Vec<Mutation>) {
        if self.registry.is_animated(id) {
            return;
        }
        let delay = self.policy.stagger_delay(spec.delay_ms);
        for (index, child) in spec.children.iter().copied().enumerate() {
            out.push(Mutation::class(child, STAGGER_ITEM_CLASS, true));
            if self.policy.stagger_animates(index) {
                let child_delay = u32::try_from(index)
                    .unwrap_or(u32::MAX)
                    .saturating_mul(delay);
                out.push(Mutation::style(child, StyleProperty::Opacity, "0"));
                out.push(Mutation::style(child, StyleProperty::Transform, STAGGER_ITEM_OFFSET));
                out.push(Mutation::style(
                    child,
                    StyleProperty::TransitionDelay,
                    format!("{child_delay}ms"),
                ));
            } else {
                out.push(Mutation::style(child, StyleProperty::TransitionDelay, "0ms"));
                out.push(Mutation::style(child, StyleProperty::Opacity, "1"));
                out.push(Mutation::style(child, StyleProperty::Transform, "none"));
                out.push(Mutation::class(child, ANIMATED_CLASS, true));
            }
        }
        if self.policy.suppress_motion {
            // Every child is already visible; nothing left to trigger.
            self.registry.mark_animated(id);
            tracing::debug!(container = %key, "Stagger shown immediately");
        }
    }

    fn parallax_attachment(&self, key: NodeKey, spec: &ParallaxSpec, out: &mut Vec<Mutation>) {
        let scrolls = match self.policy.scroll_attachment {
            ScrollAttachment::None => false,
            ScrollAttachment::Backgrounds => spec.layer == ParallaxLayer::Background,
            ScrollAttachment::All => true,
        };
        out.push(Mutation::style(
            key,
            StyleProperty::BackgroundAttachment,
            if scrolls { "scroll" } else { "fixed" },
        ));
        if self.policy.suppress_motion {
            out.push(Mutation::style(key, StyleProperty::Transform, "none"));
        }
    }

    // ========================================================================
    // Policy
    // ========================================================================

    fn policy_globals(&self, out: &mut Vec<Mutation>) {
        out.push(Mutation::SetRootProperty {
            name: "--animation-duration".to_string(),
            value: self.policy.animation_duration.to_string(),
        });
        out.push(Mutation::SetRootProperty {
            name: "--transition-duration".to_string(),
            value: self.policy.transition_duration.to_string(),
        });
        out.push(Mutation::SetProgressVisible {
            visible: self.policy.show_progress,
        });
    }

    /// Switch to a new tier bundle and bring every pending node in line.
    pub fn apply_policy(&mut self, policy: TierPolicy) -> Vec<Mutation> {
        let previous = self.policy.tier;
        self.policy = policy;
        let mut out = Vec::new();
        self.policy_globals(&mut out);

        let nodes: Vec<(NodeKey, TrackedNode)> = self
            .nodes
            .iter()
            .map(|(key, node)| (*key, node.clone()))
            .collect();
        for (key, node) in &nodes {
            if let Some(spec) = &node.roles.trackable {
                self.setup_trackable(*key, node.id, spec, &mut out);
            }
            if let Some(spec) = &node.roles.parallax {
                self.parallax_attachment(*key, spec, &mut out);
            }
            if policy.suppress_motion && node.roles.video.is_some_and(|v| v.parallax_speed.is_some()) {
                out.push(Mutation::style(*key, StyleProperty::Transform, "none"));
            }
            if let Some(spec) = &node.roles.stagger {
                self.setup_stagger(*key, node.id, spec, &mut out);
            }
        }
        // Force the next frame to redraw progress and header.
        self.last_progress = None;
        self.header_effect = None;
        self.tick_scheduled = true;
        tracing::info!(from = %previous, to = %policy.tier, "Applied performance policy");
        out
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Record a scroll event at `now_ms`. Arms the rescan debounce.
    ///
    /// Returns `true` when the host should request an animation frame; at
    /// most one frame is requested until [`Self::on_frame`] runs.
    pub fn on_scroll(&mut self, now_ms: f64) -> bool {
        self.rescan_due = Some(now_ms + self.config.debounce_ms);
        if self.tick_scheduled {
            false
        } else {
            self.tick_scheduled = true;
            true
        }
    }

    /// Viewport resized: re-measure the header and arm the rescan.
    pub fn on_resize(&mut self, now_ms: f64, layout: &dyn LayoutSource) -> Vec<Mutation> {
        let mut out = Vec::new();
        if let Some((key, header)) = &mut self.header {
            if let Some(rect) = layout.element_box(*key) {
                header.set_height(rect.height);
                out.push(Mutation::SetDocumentPaddingTop { px: rect.height });
            }
        }
        self.header_effect = None;
        self.rescan_due = Some(now_ms + self.config.debounce_ms);
        self.tick_scheduled = true;
        out
    }

    /// Run the rescan once the debounce has elapsed.
    pub fn poll_debounce(&mut self, now_ms: f64, layout: &dyn LayoutSource) -> Vec<Mutation> {
        match self.rescan_due {
            Some(due) if now_ms >= due => {
                self.rescan_due = None;
                let mut out = Vec::new();
                self.rescan(layout, &mut out);
                out
            }
            _ => Vec::new(),
        }
    }

    /// Document visibility changed.
    ///
    /// Hiding pauses running counters and playing videos. Showing resumes
    /// the videos; paused counters resume on the next frame in which they
    /// are triggered.
    pub fn on_visibility_change(&mut self, hidden: bool) -> Vec<Mutation> {
        let mut out = Vec::new();
        if hidden == self.hidden {
            return out;
        }
        self.hidden = hidden;
        self.counter_clock = None;

        if hidden {
            let paused = self.counters.pause_all();
            for (key, node) in &self.nodes {
                let Some(video) = node.roles.video.filter(|v| v.autoplay) else {
                    continue;
                };
                if self.registry.is_playing(node.id) {
                    self.registry.set_was_playing(node.id, true);
                    self.registry.set_playing(node.id, false);
                    if video.is_media {
                        out.push(Mutation::PauseVideo { node: *key });
                    }
                }
            }
            tracing::debug!(paused_counters = paused, "Document hidden");
        } else {
            for (key, node) in &self.nodes {
                let Some(video) = node.roles.video.filter(|v| v.autoplay) else {
                    continue;
                };
                if self.registry.take_was_playing(node.id) {
                    self.registry.set_playing(node.id, true);
                    if video.is_media {
                        out.push(Mutation::PlayVideo { node: *key });
                    }
                }
            }
            self.tick_scheduled = true;
            tracing::debug!("Document visible");
        }
        out
    }

    /// Stop tracking a node the host removed. Cancels its counter.
    pub fn remove(&mut self, key: NodeKey) -> bool {
        let Some(node) = self.nodes.remove(&key) else {
            return false;
        };
        self.registry.forget(node.id);
        if self.counters.cancel(node.id) {
            tracing::debug!(node = %key, "Cancelled counter of removed node");
        }
        if self.header.is_some_and(|(header, _)| header == key) {
            self.header = None;
            self.header_effect = None;
        }
        true
    }

    fn prune(&mut self, detached: Vec<NodeKey>) {
        for key in detached {
            if self.remove(key) {
                tracing::debug!(node = %key, "Dropped detached node");
            }
        }
    }

    // ========================================================================
    // Entrance rescan
    // ========================================================================

    /// Fire every pending trackable and stagger container that has entered
    /// the trigger zone.
    fn rescan(&mut self, layout: &dyn LayoutSource, out: &mut Vec<Mutation>) {
        let viewport = layout.viewport();
        let margin = self.config.trigger_margin;
        let mut detached = Vec::new();
        let mut fired = 0_usize;

        for (key, node) in &self.nodes {
            let roles = &node.roles;
            if (roles.trackable.is_none() && roles.stagger.is_none())
                || self.registry.is_animated(node.id)
            {
                continue;
            }
            let result = locate(layout, *key).map(|rect| {
                if !geometry::is_triggered(&rect, &viewport, margin) {
                    return;
                }
                if let Some(spec) = &roles.trackable {
                    let variant = if self.policy.simplify_complex {
                        spec.variant.simplified()
                    } else {
                        spec.variant
                    };
                    let resting = variant.resting();
                    out.push(Mutation::style(*key, StyleProperty::Opacity, resting.opacity.to_string()));
                    if let Some(transform) = resting.transform {
                        out.push(Mutation::style(*key, StyleProperty::Transform, transform));
                    }
                    if let Some(keyframes) = variant.keyframes() {
                        out.push(Mutation::style(*key, StyleProperty::Animation, keyframes));
                    }
                    out.push(Mutation::class(*key, ANIMATED_CLASS, true));
                }
                if let Some(spec) = &roles.stagger {
                    for (index, child) in spec.children.iter().copied().enumerate() {
                        if self.policy.stagger_animates(index) {
                            out.push(Mutation::style(child, StyleProperty::Opacity, "1"));
                            out.push(Mutation::style(
                                child,
                                StyleProperty::Transform,
                                STAGGER_ITEM_RESTING,
                            ));
                            out.push(Mutation::class(child, ANIMATED_CLASS, true));
                        }
                    }
                }
                self.registry.mark_animated(node.id);
                fired += 1;
            });
            settle(*key, result, &mut detached);
        }

        if fired > 0 {
            tracing::debug!(fired, scroll = viewport.scroll_top, "Entrance animations fired");
        }
        self.prune(detached);
    }

    // ========================================================================
    // Frame pass
    // ========================================================================

    /// Run the scheduled frame pass, if one was requested.
    pub fn on_frame(&mut self, layout: &dyn LayoutSource) -> Vec<Mutation> {
        if !self.tick_scheduled || self.hidden {
            return Vec::new();
        }
        self.tick_scheduled = false;
        self.tick(layout)
    }

    /// One full frame pass: header, entrances, parallax, progress,
    /// counters, videos, reveal sections.
    pub fn tick(&mut self, layout: &dyn LayoutSource) -> Vec<Mutation> {
        let viewport = layout.viewport();
        let mut out = Vec::new();
        let mut detached = Vec::new();

        self.update_header(viewport.scroll_top, viewport.width, &mut out);
        self.rescan(layout, &mut out);
        if !self.policy.suppress_motion {
            self.update_parallax(viewport.scroll_top, layout, &mut out, &mut detached);
        }
        self.update_progress(&viewport, &mut out);
        self.update_counters(layout, &mut out, &mut detached);
        self.update_videos(layout, &mut out, &mut detached);
        self.update_reveals(layout, &mut out, &mut detached);

        detached.sort_unstable();
        detached.dedup();
        self.prune(detached);
        out
    }

    fn update_header(&mut self, scroll_top: f64, viewport_width: f64, out: &mut Vec<Mutation>) {
        let Some((key, header)) = &mut self.header else {
            return;
        };
        let is_mobile = viewport_width < self.config.mobile_breakpoint;
        let effect = header.update(scroll_top, is_mobile, self.config.header_shadow_threshold);
        if effect == HeaderEffect::Unchanged || self.header_effect == Some(effect) {
            return;
        }
        if matches!(effect, HeaderEffect::Shadow(_))
            && matches!(self.header_effect, Some(HeaderEffect::Hide { .. }))
        {
            // Layout switched to mobile while hidden.
            header_mutations(*key, HeaderEffect::Show, out);
        }
        header_mutations(*key, effect, out);
        self.header_effect = Some(effect);
    }

    fn update_parallax(
        &self,
        scroll_top: f64,
        layout: &dyn LayoutSource,
        out: &mut Vec<Mutation>,
        detached: &mut Vec<NodeKey>,
    ) {
        for (key, node) in &self.nodes {
            let video_speed = node.roles.video.and_then(|v| v.parallax_speed);
            if node.roles.parallax.is_none() && video_speed.is_none() {
                continue;
            }
            let result = locate(layout, *key).map(|_| {
                if let Some(spec) = node.roles.parallax {
                    let offset = geometry::parallax_offset(scroll_top, spec.speed);
                    let position = match spec.axis {
                        Axis::Vertical => format!("center {}", px(offset)),
                        Axis::Horizontal => format!("{} center", px(offset)),
                    };
                    out.push(Mutation::style(*key, StyleProperty::BackgroundPosition, position));
                    if spec.layer == ParallaxLayer::Element {
                        let shift = offset * PARALLAX_ELEMENT_FACTOR;
                        out.push(Mutation::style(
                            *key,
                            StyleProperty::Transform,
                            format!("translateY({})", px(shift)),
                        ));
                    }
                }
                if let Some(speed) = video_speed {
                    let offset = geometry::parallax_offset(scroll_top, speed);
                    out.push(Mutation::style(
                        *key,
                        StyleProperty::Transform,
                        format!("translateY({}) {VIDEO_PARALLAX_SCALE}", px(offset)),
                    ));
                }
            });
            settle(*key, result, detached);
        }
    }

    fn update_progress(&mut self, viewport: &geometry::Viewport, out: &mut Vec<Mutation>) {
        if !self.policy.show_progress {
            return;
        }
        let percent = (geometry::scroll_progress(viewport) * 100.0).round() / 100.0;
        if self
            .last_progress
            .is_some_and(|last| (last - percent).abs() < f64::EPSILON)
        {
            return;
        }
        self.last_progress = Some(percent);
        out.push(Mutation::SetProgress { percent });
    }

    fn update_counters(&mut self, layout: &dyn LayoutSource, out: &mut Vec<Mutation>, detached: &mut Vec<NodeKey>) {
        let viewport = layout.viewport();
        let margin = self.config.trigger_margin;
        let tick_ms = self.config.counter_tick_ms;
        for (key, node) in &self.nodes {
            let Some(spec) = &node.roles.counter else {
                continue;
            };
            let counted = self.registry.is_counted(node.id);
            let paused = self.counters.is_paused(node.id);
            let result = locate(layout, *key).map(|rect| {
                if (counted && !paused) || !geometry::is_triggered(&rect, &viewport, margin) {
                    return;
                }
                if counted {
                    self.counters.resume(node.id);
                    tracing::debug!(node = %key, "Counter resumed");
                } else {
                    let ramp = CounterRamp::new(spec, tick_ms);
                    out.push(Mutation::SetText {
                        node: *key,
                        text: ramp.render(),
                    });
                    self.counters.start(node.id, *key, ramp);
                    self.registry.mark_counted(node.id);
                    tracing::debug!(node = %key, target = spec.target, "Counter started");
                }
            });
            settle(*key, result, detached);
        }
    }

    fn update_videos(&mut self, layout: &dyn LayoutSource, out: &mut Vec<Mutation>, detached: &mut Vec<NodeKey>) {
        let viewport = layout.viewport();
        for (key, node) in &self.nodes {
            let Some(video) = node.roles.video.filter(|v| v.autoplay) else {
                continue;
            };
            let result = locate(layout, *key).map(|rect| {
                let visible = geometry::is_partially_in_viewport(&rect, &viewport);
                if self.registry.set_playing(node.id, visible) && video.is_media {
                    out.push(if visible {
                        Mutation::PlayVideo { node: *key }
                    } else {
                        Mutation::PauseVideo { node: *key }
                    });
                }
            });
            settle(*key, result, detached);
        }
    }

    fn update_reveals(&mut self, layout: &dyn LayoutSource, out: &mut Vec<Mutation>, detached: &mut Vec<NodeKey>) {
        let viewport = layout.viewport();
        let margin = self.config.trigger_margin;
        for (key, node) in &self.nodes {
            let Some(direction) = node.roles.reveal else {
                continue;
            };
            if self.registry.is_revealed(node.id) {
                continue;
            }
            let result = locate(layout, *key).map(|rect| {
                if geometry::is_triggered(&rect, &viewport, margin) {
                    out.push(Mutation::SetOverlayTransform {
                        section: *key,
                        transform: direction.revealed().to_string(),
                    });
                    self.registry.mark_revealed(node.id);
                }
            });
            settle(*key, result, detached);
        }
    }

    // ========================================================================
    // Counter timer
    // ========================================================================

    /// Advance every running counter one tick.
    pub fn tick_counters(&mut self) -> Vec<Mutation> {
        self.counters
            .tick()
            .into_iter()
            .map(|frame| Mutation::SetText {
                node: frame.node,
                text: frame.text,
            })
            .collect()
    }

    /// Advance counters by however many ticks have elapsed since the last
    /// call, writing only the latest text per node.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn advance_counters(&mut self, now_ms: f64) -> Vec<Mutation> {
        if self.counters.is_empty() || self.hidden {
            self.counter_clock = None;
            return Vec::new();
        }
        let tick_ms = self.config.counter_tick_ms;
        let start = *self.counter_clock.get_or_insert(now_ms);
        let due = ((now_ms - start) / tick_ms).floor().max(0.0) as usize;
        if due == 0 {
            return Vec::new();
        }
        self.counter_clock = Some(start + due as f64 * tick_ms);

        let mut latest: BTreeMap<NodeKey, String> = BTreeMap::new();
        for _ in 0..due {
            let frames = self.counters.tick();
            if frames.is_empty() {
                break;
            }
            for frame in frames {
                latest.insert(frame.node, frame.text);
            }
        }
        latest
            .into_iter()
            .map(|(node, text)| Mutation::SetText { node, text })
            .collect()
    }
}
