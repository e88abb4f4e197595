//! # Motion WASM Application
//!
//! Browser host for the motion engine. Scans the page for animated
//! elements, forwards scroll, resize and visibility events, drives the
//! engine from `requestAnimationFrame`, and applies the resulting mutations
//! to the DOM.
//!
//! ## Usage
//!
//! Build for WASM:
//! ```bash
//! wasm-pack build --target web motion-app
//! ```
//!
//! Then import in JavaScript:
//! ```javascript
//! import init, { MotionApp } from './pkg/motion_app.js';
//!
//! await init();
//! const motion = new MotionApp(JSON.stringify({ trigger_margin: 100 }));
//!
//! // After rendering new content:
//! motion.refresh();
//!
//! // Force a tier:
//! motion.setPerformanceMode('low');
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod dom;
pub mod raf;
pub mod signals;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use motion_core::{EngineConfig, MotionEngine, Mutation, PerformanceTier};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{AddEventListenerOptions, Event, EventTarget};

use crate::dom::{DomHost, HostError};
use crate::raf::{performance_now, RafLoop};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init_wasm() {
    console_error_panic_hook::set_once();
    tracing::info!("Motion WASM initialized");
}

/// Engine plus document, shared by event listeners and the frame loop.
struct Shared {
    engine: RefCell<MotionEngine>,
    host: DomHost,
    tier_changes: Cell<u32>,
}

impl Shared {
    /// Run `f` against the engine and apply what it returns. Skipped when
    /// the engine is already borrowed by an outer call.
    fn drive(&self, f: impl FnOnce(&mut MotionEngine, &DomHost) -> Vec<Mutation>) {
        let Ok(mut engine) = self.engine.try_borrow_mut() else {
            tracing::debug!("engine busy, event dropped");
            return;
        };
        let out = f(&mut engine, &self.host);
        let changes = engine.take_tier_changes().len();
        drop(engine);

        if changes > 0 {
            let changes = u32::try_from(changes).unwrap_or(u32::MAX);
            self.tier_changes
                .set(self.tier_changes.get().saturating_add(changes));
        }
        self.host.apply(&out);
    }
}

/// A registered DOM event listener, removed on drop.
struct Listener {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        let options = AddEventListenerOptions::new();
        options.set_passive(true);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            event,
            closure.as_ref().unchecked_ref(),
            &options,
        )?;
        Ok(Self {
            target: target.clone(),
            event,
            closure,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Err(err) = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref())
        {
            tracing::warn!(event = self.event, error = ?err, "Failed to remove listener");
        }
    }
}

/// Scroll animation engine bound to the current document.
#[wasm_bindgen]
pub struct MotionApp {
    shared: Rc<Shared>,
    raf: Option<RafLoop>,
    listeners: Vec<Listener>,
}

#[wasm_bindgen]
impl MotionApp {
    /// Classify the device, scan the document and start the frame loop.
    ///
    /// `config_json` is an optional engine configuration; missing fields
    /// take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or there is no
    /// document to bind to.
    #[wasm_bindgen(constructor)]
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(config_json: Option<String>) -> Result<MotionApp, JsValue> {
        let config = match config_json.as_deref().map(str::trim) {
            Some(json) if !json.is_empty() => {
                EngineConfig::from_json(json).map_err(HostError::from)?
            }
            _ => EngineConfig::default(),
        };

        let host = DomHost::new()?;
        let device = signals::read_signals(host.window());
        let mut engine = MotionEngine::new(config, &device);

        let nodes = host.scan()?;
        let out = engine.initialize(&nodes, &host);
        host.apply(&out);
        if host.is_hidden() {
            let out = engine.on_visibility_change(true, performance_now());
            host.apply(&out);
        }
        tracing::info!(
            tier = engine.tier().as_str(),
            nodes = nodes.len(),
            mutations = out.len(),
            "Motion engine started"
        );

        let shared = Rc::new(Shared {
            engine: RefCell::new(engine),
            host,
            tier_changes: Cell::new(0),
        });

        let mut app = Self {
            shared,
            raf: None,
            listeners: Vec::new(),
        };
        app.attach_listeners()?;
        app.start_frames();
        Ok(app)
    }

    fn attach_listeners(&mut self) -> Result<(), JsValue> {
        let window: EventTarget = self.shared.host.window().clone().into();
        let document: EventTarget = self.shared.host.document().clone().into();

        let shared = Rc::clone(&self.shared);
        self.listeners.push(Listener::attach(&window, "scroll", move |_| {
            shared.drive(|engine, _| {
                engine.on_scroll(performance_now());
                Vec::new()
            });
        })?);

        let shared = Rc::clone(&self.shared);
        self.listeners.push(Listener::attach(&window, "resize", move |_| {
            shared.drive(|engine, host| engine.on_resize(performance_now(), host));
        })?);

        let shared = Rc::clone(&self.shared);
        self.listeners
            .push(Listener::attach(&document, "visibilitychange", move |_| {
                let hidden = shared.host.is_hidden();
                shared.drive(|engine, _| engine.on_visibility_change(hidden, performance_now()));
            })?);
        Ok(())
    }

    fn start_frames(&mut self) {
        let shared = Rc::clone(&self.shared);
        let raf = RafLoop::new(move |now_ms| {
            shared.drive(|engine, host| engine.on_frame(now_ms, host));
        });
        raf.start();
        self.raf = Some(raf);
    }

    /// Pick up elements rendered since the last scan. Safe to call
    /// redundantly.
    ///
    /// # Errors
    ///
    /// Returns an error if the document query fails.
    pub fn refresh(&self) -> Result<(), JsValue> {
        let nodes = self.shared.host.scan()?;
        self.shared.drive(|engine, host| engine.refresh(&nodes, host));
        Ok(())
    }

    /// Force a performance tier: `high`, `medium`, `low` or `reduced`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown tier name.
    #[wasm_bindgen(js_name = setPerformanceMode)]
    pub fn set_performance_mode(&self, mode: &str) -> Result<(), JsValue> {
        let tier: PerformanceTier = mode.parse().map_err(HostError::from)?;
        self.shared
            .drive(|engine, _| engine.set_performance_mode(tier, performance_now()));
        Ok(())
    }

    /// Current performance tier name.
    #[wasm_bindgen(js_name = getPerformanceMode)]
    #[must_use]
    pub fn get_performance_mode(&self) -> String {
        self.shared.engine.borrow().tier().as_str().to_string()
    }

    /// Engine statistics.
    ///
    /// Returns a JS object with: tier, tracked, activeCounters, monitoring,
    /// fps (null before the first sample), frames, tierChanges.
    #[wasm_bindgen(js_name = getStats)]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn get_stats(&self) -> JsValue {
        let engine = self.shared.engine.borrow();
        let fps = engine
            .governor()
            .last_sample()
            .map_or(JsValue::NULL, |s| JsValue::from_f64(s.fps));
        let frames = self.raf.as_ref().map_or(0, RafLoop::frames);

        let obj = js_sys::Object::new();
        let entries = [
            ("tier", JsValue::from_str(engine.tier().as_str())),
            (
                "tracked",
                JsValue::from_f64(engine.orchestrator().tracked_len() as f64),
            ),
            (
                "activeCounters",
                JsValue::from_f64(engine.orchestrator().active_counters() as f64),
            ),
            (
                "monitoring",
                JsValue::from_bool(engine.governor().is_monitoring()),
            ),
            ("fps", fps),
            ("frames", JsValue::from_f64(frames as f64)),
            (
                "tierChanges",
                JsValue::from_f64(f64::from(self.shared.tier_changes.get())),
            ),
        ];
        for (key, value) in &entries {
            let _ = js_sys::Reflect::set(&obj, &JsValue::from_str(key), value);
        }
        obj.into()
    }

    /// Stop the frame loop, detach listeners and remove injected elements.
    pub fn destroy(&mut self) {
        if let Some(raf) = self.raf.take() {
            raf.stop();
        }
        self.listeners.clear();
        self.shared.host.remove_injected();
        tracing::info!("Motion engine destroyed");
    }

    /// Whether the frame loop is running.
    #[wasm_bindgen(js_name = isRunning)]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.raf.as_ref().is_some_and(RafLoop::is_running)
    }
}
