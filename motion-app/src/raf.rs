//! `requestAnimationFrame` frame source.
//!
//! [`RafLoop`] calls back once per display frame with the
//! `DOMHighResTimeStamp` the browser hands to `requestAnimationFrame`, in
//! milliseconds on the same clock as `performance.now()`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

// Global bindings so the frame path never fetches the Window object.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

type RafClosure = Closure<dyn FnMut(f64)>;

/// A self re-registering animation frame loop.
///
/// Created stopped. The loop keeps requesting frames until [`stop`](Self::stop)
/// is called or the `RafLoop` is dropped.
pub struct RafLoop {
    inner: Rc<RafInner>,
}

struct RafInner {
    /// Closure registered with `requestAnimationFrame`. Separate from
    /// `callback` so the closure can re-register itself mid-frame.
    closure: RefCell<Option<RafClosure>>,
    callback: RefCell<Box<dyn FnMut(f64)>>,
    frames: Cell<u64>,
    running: Cell<bool>,
    raf_id: Cell<i32>,
}

impl RafLoop {
    /// Create a stopped loop that will call `callback` with each frame time.
    pub fn new(callback: impl FnMut(f64) + 'static) -> Self {
        Self {
            inner: Rc::new(RafInner {
                closure: RefCell::new(None),
                callback: RefCell::new(Box::new(callback)),
                frames: Cell::new(0),
                running: Cell::new(false),
                raf_id: Cell::new(0),
            }),
        }
    }

    /// Start requesting frames. No-op when already running.
    pub fn start(&self) {
        if self.inner.running.get() {
            return;
        }
        self.inner.running.set(true);

        let inner = Rc::clone(&self.inner);
        let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            if !inner.running.get() {
                return;
            }
            inner.frames.set(inner.frames.get() + 1);

            // Scoped so it does not overlap the `closure` borrow below.
            inner.callback.borrow_mut()(timestamp_ms);

            if !inner.running.get() {
                return;
            }
            if let Some(ref closure) = *inner.closure.borrow() {
                let id = request_animation_frame(closure.as_ref().unchecked_ref());
                inner.raf_id.set(id);
            }
        }) as Box<dyn FnMut(f64)>);

        let id = request_animation_frame(closure.as_ref().unchecked_ref());
        self.inner.raf_id.set(id);
        *self.inner.closure.borrow_mut() = Some(closure);
    }

    /// Stop the loop and cancel the pending frame. [`start`](Self::start)
    /// resumes it.
    pub fn stop(&self) {
        if !self.inner.running.get() {
            return;
        }
        self.inner.running.set(false);
        cancel_animation_frame(self.inner.raf_id.get());
    }

    /// Whether frames are being requested.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Frames delivered since creation.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.inner.frames.get()
    }
}

impl Drop for RafLoop {
    fn drop(&mut self) {
        self.stop();
        // Breaks the closure -> inner -> closure cycle.
        self.inner.closure.borrow_mut().take();
    }
}

impl std::fmt::Debug for RafLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RafLoop")
            .field("running", &self.inner.running.get())
            .field("frames", &self.inner.frames.get())
            .finish()
    }
}
