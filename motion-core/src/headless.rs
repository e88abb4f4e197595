//! Headless page model.
//!
//! [`HeadlessPage`] stands in for a browser document: it answers layout
//! queries from fixed boxes and records the presentation state produced by
//! applying [`Mutation`]s. [`HeadlessSession`] pairs a page with an engine
//! and a synthetic clock so scenarios can be replayed without a browser.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::device::DeviceSignals;
use crate::element::{NodeKey, NodeSnapshot};
use crate::engine::MotionEngine;
use crate::governor::TierChange;
use crate::geometry::{Rect, Viewport};
use crate::mutation::{LayoutSource, Mutation, StyleProperty};
use crate::tier::PerformanceTier;
use crate::{MotionError, MotionResult};

/// Frame interval used when advancing time, about 60 fps.
pub const DEFAULT_FRAME_MS: f64 = 1000.0 / 60.0;

/// Presentation state of one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePresentation {
    /// Inline styles.
    pub styles: BTreeMap<StyleProperty, String>,
    /// Classes added by the engine.
    pub classes: BTreeSet<String>,
    /// Text content, once written.
    pub text: Option<String>,
    /// Media playback state.
    pub playing: bool,
    /// Transform of the injected reveal overlay.
    pub overlay: Option<String>,
}

impl NodePresentation {
    /// Inline style value.
    #[must_use]
    pub fn style(&self, property: StyleProperty) -> Option<&str> {
        self.styles.get(&property).map(String::as_str)
    }

    /// Whether the engine added `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

#[derive(Debug, Clone)]
struct PageNode {
    snapshot: NodeSnapshot,
    rect: Rect,
    attached: bool,
}

/// In-memory document.
#[derive(Debug, Clone, Default)]
pub struct HeadlessPage {
    viewport: Viewport,
    nodes: BTreeMap<NodeKey, PageNode>,
    presentation: BTreeMap<NodeKey, NodePresentation>,
    root_properties: BTreeMap<String, String>,
    progress: Option<f64>,
    progress_injected: bool,
    progress_visible: bool,
    padding_top: f64,
    applied: usize,
}

impl HeadlessPage {
    /// Create an empty page.
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            progress_visible: true,
            ..Self::default()
        }
    }

    /// Add (or replace) a node with its document box.
    pub fn add_node(&mut self, snapshot: NodeSnapshot, rect: Rect) {
        self.nodes.insert(
            snapshot.key,
            PageNode {
                snapshot,
                rect,
                attached: true,
            },
        );
    }

    /// Detach a node: it keeps its snapshot but has no layout box.
    pub fn detach(&mut self, key: NodeKey) -> bool {
        self.nodes
            .get_mut(&key)
            .is_some_and(|node| std::mem::replace(&mut node.attached, false))
    }

    /// Move a node.
    pub fn set_rect(&mut self, key: NodeKey, rect: Rect) -> bool {
        match self.nodes.get_mut(&key) {
            Some(node) => {
                node.rect = rect;
                true
            }
            None => false,
        }
    }

    /// Scroll to `scroll_top`, clamped to the scrollable range.
    pub fn scroll_to(&mut self, scroll_top: f64) {
        let max = self.viewport.scrollable_height().max(0.0);
        self.viewport.scroll_top = scroll_top.clamp(0.0, max);
    }

    /// Resize the viewport.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.width = width;
        self.viewport.height = height;
        self.scroll_to(self.viewport.scroll_top);
    }

    /// Snapshots of every attached node, in key order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<NodeSnapshot> {
        self.nodes
            .values()
            .filter(|node| node.attached)
            .map(|node| node.snapshot.clone())
            .collect()
    }

    /// Apply mutations in order.
    pub fn apply(&mut self, mutations: &[Mutation]) {
        for mutation in mutations {
            self.apply_one(mutation);
        }
        self.applied += mutations.len();
    }

    fn apply_one(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::SetStyle {
                node,
                property,
                value,
            } => {
                self.entry(*node).styles.insert(*property, value.clone());
            }
            Mutation::SetText { node, text } => self.entry(*node).text = Some(text.clone()),
            Mutation::SetClass {
                node,
                class,
                present,
            } => {
                let classes = &mut self.entry(*node).classes;
                if *present {
                    classes.insert(class.clone());
                } else {
                    classes.remove(class);
                }
            }
            Mutation::PlayVideo { node } => self.entry(*node).playing = true,
            Mutation::PauseVideo { node } => self.entry(*node).playing = false,
            Mutation::InjectOverlay { section, transform }
            | Mutation::SetOverlayTransform { section, transform } => {
                self.entry(*section).overlay = Some(transform.clone());
            }
            Mutation::SetRootProperty { name, value } => {
                self.root_properties.insert(name.clone(), value.clone());
            }
            Mutation::InjectProgressIndicator => self.progress_injected = true,
            Mutation::SetProgress { percent } => self.progress = Some(*percent),
            Mutation::SetProgressVisible { visible } => self.progress_visible = *visible,
            Mutation::SetDocumentPaddingTop { px } => self.padding_top = *px,
        }
    }

    fn entry(&mut self, key: NodeKey) -> &mut NodePresentation {
        self.presentation.entry(key).or_default()
    }

    /// Presentation of a node, if the engine touched it.
    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<&NodePresentation> {
        self.presentation.get(&key)
    }

    /// Shorthand for a node's inline style.
    #[must_use]
    pub fn style(&self, key: NodeKey, property: StyleProperty) -> Option<&str> {
        self.node(key).and_then(|n| n.style(property))
    }

    /// Custom property on the document root.
    #[must_use]
    pub fn root_property(&self, name: &str) -> Option<&str> {
        self.root_properties.get(name).map(String::as_str)
    }

    /// Progress bar width, once set.
    #[must_use]
    pub const fn progress(&self) -> Option<f64> {
        self.progress
    }

    /// Whether the progress bar exists and is shown.
    #[must_use]
    pub const fn progress_visible(&self) -> bool {
        self.progress_injected && self.progress_visible
    }

    /// Body padding for the fixed header.
    #[must_use]
    pub const fn padding_top(&self) -> f64 {
        self.padding_top
    }

    /// Total mutations applied so far.
    #[must_use]
    pub const fn applied(&self) -> usize {
        self.applied
    }
}

impl LayoutSource for HeadlessPage {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn element_box(&self, node: NodeKey) -> Option<Rect> {
        self.nodes
            .get(&node)
            .filter(|n| n.attached)
            .map(|n| n.rect)
    }
}

/// A page, an engine and a clock.
#[derive(Debug)]
pub struct HeadlessSession {
    page: HeadlessPage,
    engine: MotionEngine,
    now_ms: f64,
    frame_ms: f64,
    log: Vec<Mutation>,
}

impl HeadlessSession {
    /// Build an engine for `signals` and initialize it against `page`.
    #[must_use]
    pub fn start(page: HeadlessPage, config: EngineConfig, signals: &DeviceSignals) -> Self {
        let mut session = Self {
            page,
            engine: MotionEngine::new(config, signals),
            now_ms: 0.0,
            frame_ms: DEFAULT_FRAME_MS,
            log: Vec::new(),
        };
        let nodes = session.page.snapshots();
        let out = session.engine.initialize(&nodes, &session.page);
        session.commit(out);
        session
    }

    fn commit(&mut self, mutations: Vec<Mutation>) {
        self.page.apply(&mutations);
        self.log.extend(mutations);
    }

    /// Change the synthetic frame interval.
    ///
    /// # Errors
    ///
    /// Returns [`MotionError::InvalidConfig`] unless `frame_ms` is a
    /// positive finite number.
    pub fn set_frame_interval(&mut self, frame_ms: f64) -> MotionResult<()> {
        if !frame_ms.is_finite() || frame_ms <= 0.0 {
            return Err(MotionError::InvalidConfig(format!(
                "frame interval must be positive, got {frame_ms}"
            )));
        }
        self.frame_ms = frame_ms;
        Ok(())
    }

    /// Current synthetic time.
    #[must_use]
    pub const fn now(&self) -> f64 {
        self.now_ms
    }

    /// The page.
    #[must_use]
    pub const fn page(&self) -> &HeadlessPage {
        &self.page
    }

    /// Mutable page access, for adding or moving nodes.
    pub fn page_mut(&mut self) -> &mut HeadlessPage {
        &mut self.page
    }

    /// The engine.
    #[must_use]
    pub const fn engine(&self) -> &MotionEngine {
        &self.engine
    }

    /// Drain the mutation log.
    pub fn take_log(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.log)
    }

    /// Scroll and deliver the scroll event. No frame runs yet.
    pub fn scroll_to(&mut self, scroll_top: f64) {
        self.page.scroll_to(scroll_top);
        self.engine.on_scroll(self.now_ms);
    }

    /// Deliver one animation frame at the current time.
    pub fn frame(&mut self) {
        let out = self.engine.on_frame(self.now_ms, &self.page);
        self.commit(out);
    }

    /// Advance the clock by `ms`, delivering a frame every interval.
    pub fn advance(&mut self, ms: f64) {
        let end = self.now_ms + ms;
        while self.now_ms + self.frame_ms <= end {
            self.now_ms += self.frame_ms;
            self.frame();
        }
        self.now_ms = end;
    }

    /// Advance the clock without delivering any frame.
    pub fn sleep(&mut self, ms: f64) {
        self.now_ms += ms;
    }

    /// Drain tier changes recorded by the engine.
    pub fn take_tier_changes(&mut self) -> Vec<TierChange> {
        self.engine.take_tier_changes()
    }

    /// Resize the viewport and deliver the resize event.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.page.resize(width, height);
        let out = self.engine.on_resize(self.now_ms, &self.page);
        self.commit(out);
    }

    /// Change document visibility.
    pub fn set_hidden(&mut self, hidden: bool) {
        let out = self.engine.on_visibility_change(hidden, self.now_ms);
        self.commit(out);
    }

    /// Rescan the page for new nodes.
    pub fn refresh(&mut self) {
        let nodes = self.page.snapshots();
        let out = self.engine.refresh(&nodes, &self.page);
        self.commit(out);
    }

    /// Force a tier.
    pub fn set_performance_mode(&mut self, tier: PerformanceTier) {
        let out = self.engine.set_performance_mode(tier, self.now_ms);
        self.commit(out);
    }
}
