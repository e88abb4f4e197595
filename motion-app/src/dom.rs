//! DOM side of the host boundary.
//!
//! [`DomHost`] assigns each tracked element a stable [`NodeKey`], answers
//! layout queries from `getBoundingClientRect`, and applies engine
//! [`Mutation`]s to the live document.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use motion_core::element::{
    COUNTER_CLASSES, HEADER_CLASS, PARALLAX_CLASSES, REVEAL_CLASSES, STAGGER_CLASSES,
    VIDEO_CLASSES,
};
use motion_core::{
    AnimationVariant, LayoutSource, MotionError, Mutation, NodeKey, NodeSnapshot, Rect, Viewport,
};
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlMediaElement, Node, Window};

/// Attribute carrying the host-assigned node key.
pub const KEY_ATTRIBUTE: &str = "data-motion-key";

/// Data attributes forwarded to the engine, without the `data-` prefix.
pub const DATA_ATTRIBUTES: [&str; 10] = [
    "animation-delay",
    "animation-duration",
    "animation-easing",
    "counter-target",
    "counter-duration",
    "counter-prefix",
    "counter-suffix",
    "parallax-speed",
    "parallax-direction",
    "stagger-delay",
];

const OVERLAY_CLASS: &str = "reveal-overlay";
const PROGRESS_CLASS: &str = "scroll-progress-indicator";

const OVERLAY_CSS: &str = "position: absolute; top: 0; left: 0; width: 100%; height: 100%; \
     background: #fff; z-index: 1; transition: transform 0.8s ease-out;";
const PROGRESS_CSS: &str = "position: fixed; top: 0; left: 0; width: 0%; height: 3px; \
     background: linear-gradient(90deg, #d4af37, #b30000); z-index: 9999; \
     transition: width 0.1s ease-out; box-shadow: 0 0 10px rgba(212, 175, 55, 0.5);";

/// Errors raised by the browser host.
#[derive(Debug, Error)]
pub enum HostError {
    /// No global `window`.
    #[error("No window object")]
    NoWindow,

    /// Window has no document.
    #[error("No document object")]
    NoDocument,

    /// Document has no body yet.
    #[error("No document body")]
    NoBody,

    /// Mutation names a key this host never assigned.
    #[error("Unknown node: {0}")]
    UnknownNode(NodeKey),

    /// Node exists but lacks the interface the mutation needs.
    #[error("Node {node} is not an {expected}")]
    WrongElement {
        /// Target node.
        node: NodeKey,
        /// Interface name the mutation required.
        expected: &'static str,
    },

    /// Engine rejected its input.
    #[error(transparent)]
    Engine(#[from] MotionError),

    /// A DOM call threw.
    #[error("DOM call failed: {0}")]
    Dom(String),
}

impl From<JsValue> for HostError {
    fn from(value: JsValue) -> Self {
        Self::Dom(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<HostError> for JsValue {
    fn from(err: HostError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;

/// CSS selector matching every element the engine may track.
#[must_use]
pub fn tracked_selector() -> String {
    std::iter::once(HEADER_CLASS)
        .chain(AnimationVariant::ALL.iter().map(|v| v.class_name()))
        .chain(COUNTER_CLASSES)
        .chain(PARALLAX_CLASSES)
        .chain(VIDEO_CLASSES)
        .chain(REVEAL_CLASSES)
        .chain(STAGGER_CLASSES)
        .map(|class| format!(".{class}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a key previously written to [`KEY_ATTRIBUTE`].
#[must_use]
pub fn parse_key(value: &str) -> Option<NodeKey> {
    value.trim().parse().ok().map(NodeKey)
}

/// The live document as seen by the engine.
pub struct DomHost {
    window: Window,
    document: Document,
    selector: String,
    elements: RefCell<HashMap<NodeKey, Element>>,
    overlays: RefCell<HashMap<NodeKey, HtmlElement>>,
    progress: RefCell<Option<HtmlElement>>,
    next_key: Cell<u64>,
    /// Shared rejection handler for `play()` promises; autoplay policies
    /// reject without user interaction.
    play_rejected: Closure<dyn FnMut(JsValue)>,
}

impl DomHost {
    /// Bind to the global window and document.
    ///
    /// # Errors
    ///
    /// Returns an error outside a browser document.
    pub fn new() -> HostResult<Self> {
        let window = web_sys::window().ok_or(HostError::NoWindow)?;
        let document = window.document().ok_or(HostError::NoDocument)?;
        Ok(Self {
            window,
            document,
            selector: tracked_selector(),
            elements: RefCell::new(HashMap::new()),
            overlays: RefCell::new(HashMap::new()),
            progress: RefCell::new(None),
            next_key: Cell::new(1),
            play_rejected: Closure::wrap(Box::new(|err: JsValue| {
                tracing::debug!(error = ?err, "video playback rejected");
            }) as Box<dyn FnMut(JsValue)>),
        })
    }

    /// The window.
    #[must_use]
    pub const fn window(&self) -> &Window {
        &self.window
    }

    /// The document.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Whether the document is hidden.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.document.hidden()
    }

    /// Number of elements holding a key.
    #[must_use]
    pub fn known_len(&self) -> usize {
        self.elements.borrow().len()
    }

    /// Snapshot every tracked element in document order.
    ///
    /// Keys are written back to the element, so repeated scans of an
    /// unchanged document produce the same keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the selector query throws.
    pub fn scan(&self) -> HostResult<Vec<NodeSnapshot>> {
        self.elements.borrow_mut().retain(|_, element| element.is_connected());

        let list = self.document.query_selector_all(&self.selector)?;
        let mut snapshots = Vec::with_capacity(list.length() as usize);
        for index in 0..list.length() {
            let Some(element) = list.item(index).and_then(|n| n.dyn_into::<Element>().ok())
            else {
                continue;
            };
            snapshots.push(self.snapshot(&element));
        }
        tracing::debug!(nodes = snapshots.len(), "document scanned");
        Ok(snapshots)
    }

    fn snapshot(&self, element: &Element) -> NodeSnapshot {
        let key = self.key_for(element);
        let class_list = element.class_list();
        let classes: Vec<String> = (0..class_list.length())
            .filter_map(|i| class_list.item(i))
            .collect();
        let data = DATA_ATTRIBUTES
            .iter()
            .filter_map(|name| {
                element
                    .get_attribute(&format!("data-{name}"))
                    .map(|value| ((*name).to_string(), value))
            })
            .collect();

        let is_container = classes.iter().any(|c| STAGGER_CLASSES.contains(&c.as_str()));
        let children = if is_container {
            let collection = element.children();
            (0..collection.length())
                .filter_map(|i| collection.item(i))
                .map(|child| self.key_for(&child))
                .collect()
        } else {
            Vec::new()
        };

        NodeSnapshot {
            key,
            tag: element.tag_name().to_ascii_lowercase(),
            classes,
            data,
            children,
        }
    }

    /// Key of `element`, assigning one if it has none. A key copied onto
    /// another live element (`cloneNode`, re-serialised markup) stays with
    /// its first owner; the copy gets a fresh one.
    pub fn key_for(&self, element: &Element) -> NodeKey {
        if let Some(key) = element.get_attribute(KEY_ATTRIBUTE).as_deref().and_then(parse_key) {
            let node: &Node = element;
            let owned_elsewhere = self
                .elements
                .borrow()
                .get(&key)
                .is_some_and(|known| !known.is_same_node(Some(node)));
            if !owned_elsewhere {
                self.elements.borrow_mut().insert(key, element.clone());
                if key.0 >= self.next_key.get() {
                    self.next_key.set(key.0 + 1);
                }
                return key;
            }
            tracing::debug!(node = %key, "duplicate motion key, re-keying copy");
        }
        let key = NodeKey(self.next_key.get());
        self.next_key.set(key.0 + 1);
        if let Err(err) = element.set_attribute(KEY_ATTRIBUTE, &key.0.to_string()) {
            tracing::warn!(node = %key, error = ?err, "could not tag element");
        }
        self.elements.borrow_mut().insert(key, element.clone());
        key
    }

    /// Apply mutations in order. A failing mutation is logged and skipped.
    /// Returns how many failed.
    pub fn apply(&self, mutations: &[Mutation]) -> usize {
        let mut failed = 0;
        for mutation in mutations {
            if let Err(err) = self.apply_one(mutation) {
                failed += 1;
                tracing::warn!(%mutation, error = %err, "mutation skipped");
            }
        }
        failed
    }

    fn apply_one(&self, mutation: &Mutation) -> HostResult<()> {
        match mutation {
            Mutation::SetStyle {
                node,
                property,
                value,
            } => self.html(*node)?.style().set_property(property.css_name(), value)?,
            Mutation::SetText { node, text } => self.element(*node)?.set_text_content(Some(text)),
            Mutation::SetClass {
                node,
                class,
                present,
            } => {
                let list = self.element(*node)?.class_list();
                if *present {
                    list.add_1(class)?;
                } else {
                    list.remove_1(class)?;
                }
            }
            Mutation::PlayVideo { node } => {
                let promise = self.media(*node)?.play()?;
                // Rejection handled; the returned promise is not needed.
                drop(promise.catch(&self.play_rejected));
            }
            Mutation::PauseVideo { node } => self.media(*node)?.pause()?,
            Mutation::InjectOverlay { section, transform } => {
                self.inject_overlay(*section, transform)?;
            }
            Mutation::SetOverlayTransform { section, transform } => {
                if let Some(overlay) = self.overlays.borrow().get(section) {
                    overlay.style().set_property("transform", transform)?;
                }
            }
            Mutation::SetRootProperty { name, value } => {
                let root = self
                    .document
                    .document_element()
                    .ok_or(HostError::NoDocument)?
                    .dyn_into::<HtmlElement>()
                    .map_err(|_| HostError::NoDocument)?;
                root.style().set_property(name, value)?;
            }
            Mutation::InjectProgressIndicator => self.inject_progress()?,
            Mutation::SetProgress { percent } => {
                if let Some(bar) = self.progress.borrow().as_ref() {
                    bar.style().set_property("width", &format!("{percent}%"))?;
                }
            }
            Mutation::SetProgressVisible { visible } => {
                if let Some(bar) = self.progress.borrow().as_ref() {
                    bar.style()
                        .set_property("display", if *visible { "" } else { "none" })?;
                }
            }
            Mutation::SetDocumentPaddingTop { px } => {
                let body = self.document.body().ok_or(HostError::NoBody)?;
                body.style().set_property("padding-top", &format!("{px}px"))?;
            }
        }
        Ok(())
    }

    fn element(&self, node: NodeKey) -> HostResult<Element> {
        self.elements
            .borrow()
            .get(&node)
            .cloned()
            .ok_or(HostError::UnknownNode(node))
    }

    fn html(&self, node: NodeKey) -> HostResult<HtmlElement> {
        self.element(node)?
            .dyn_into::<HtmlElement>()
            .map_err(|_| HostError::WrongElement {
                node,
                expected: "HTMLElement",
            })
    }

    fn media(&self, node: NodeKey) -> HostResult<HtmlMediaElement> {
        self.element(node)?
            .dyn_into::<HtmlMediaElement>()
            .map_err(|_| HostError::WrongElement {
                node,
                expected: "HTMLMediaElement",
            })
    }

    fn create_div(&self, class: &str, css: &str) -> HostResult<HtmlElement> {
        let div = self
            .document
            .create_element("div")?
            .dyn_into::<HtmlElement>()
            .map_err(|_| HostError::Dom("created div is not an HTMLElement".to_string()))?;
        div.set_class_name(class);
        div.style().set_css_text(css);
        Ok(div)
    }

    fn inject_overlay(&self, section: NodeKey, transform: &str) -> HostResult<()> {
        if let Some(existing) = self.overlays.borrow().get(&section) {
            existing.style().set_property("transform", transform)?;
            return Ok(());
        }
        let overlay = self.create_div(OVERLAY_CLASS, OVERLAY_CSS)?;
        overlay.style().set_property("transform", transform)?;
        self.element(section)?.append_child(&overlay)?;
        self.overlays.borrow_mut().insert(section, overlay);
        Ok(())
    }

    fn inject_progress(&self) -> HostResult<()> {
        if self.progress.borrow().is_some() {
            return Ok(());
        }
        let bar = self.create_div(PROGRESS_CLASS, PROGRESS_CSS)?;
        self.document
            .body()
            .ok_or(HostError::NoBody)?
            .append_child(&bar)?;
        *self.progress.borrow_mut() = Some(bar);
        Ok(())
    }

    /// Remove injected overlays and the progress bar.
    pub fn remove_injected(&self) {
        for (_, overlay) in self.overlays.borrow_mut().drain() {
            overlay.remove();
        }
        if let Some(bar) = self.progress.borrow_mut().take() {
            bar.remove();
        }
    }
}

impl LayoutSource for DomHost {
    fn viewport(&self) -> Viewport {
        let scroll_top = self.window.scroll_y().unwrap_or(0.0);
        let width = js_number(self.window.inner_width());
        let height = js_number(self.window.inner_height());
        let document_height = self
            .document
            .document_element()
            .map_or(height, |root| f64::from(root.scroll_height()));
        Viewport::new(scroll_top, width, height, document_height)
    }

    fn element_box(&self, node: NodeKey) -> Option<Rect> {
        let elements = self.elements.borrow();
        let element = elements.get(&node)?;
        if !element.is_connected() {
            return None;
        }
        let rect = element.get_bounding_client_rect();
        let scroll_x = self.window.scroll_x().unwrap_or(0.0);
        let scroll_y = self.window.scroll_y().unwrap_or(0.0);
        Some(Rect::new(
            rect.left() + scroll_x,
            rect.top() + scroll_y,
            rect.width(),
            rect.height(),
        ))
    }
}

impl std::fmt::Debug for DomHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomHost")
            .field("elements", &self.elements.borrow().len())
            .field("overlays", &self.overlays.borrow().len())
            .field("progress", &self.progress.borrow().is_some())
            .finish_non_exhaustive()
    }
}

fn js_number(value: Result<JsValue, JsValue>) -> f64 {
    value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_covers_every_role() {
        let selector = tracked_selector();
        for class in [".mainnav", ".fade-in-up", ".elastic-in", ".count-up", ".parallax-bg"] {
            assert!(selector.contains(class), "missing {class}");
        }
        assert!(selector.contains(".video-scroll-play"));
        assert!(selector.contains(".reveal-right"));
        assert!(selector.contains(".stagger-slide-up"));
        assert!(!selector.ends_with(", "));
    }

    #[test]
    fn keys_parse_from_attribute() {
        assert_eq!(parse_key("12"), Some(NodeKey(12)));
        assert_eq!(parse_key(" 3 "), Some(NodeKey(3)));
        assert_eq!(parse_key("abc"), None);
        assert_eq!(parse_key("-1"), None);
    }
}
