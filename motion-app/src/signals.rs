//! Device signal collection.
//!
//! Every lookup degrades to "unknown" when the browser does not expose the
//! API, so the classifier falls through to its defaults.

use motion_core::DeviceSignals;
use wasm_bindgen::JsValue;
use web_sys::Window;

/// Media query for the user's reduced-motion preference.
pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// Read user agent, CPU, memory, connection and motion preference.
#[must_use]
pub fn read_signals(window: &Window) -> DeviceSignals {
    let navigator = window.navigator();
    let navigator_value: &JsValue = navigator.as_ref();

    let signals = DeviceSignals {
        user_agent: navigator.user_agent().unwrap_or_default(),
        hardware_concurrency: cores_from(navigator.hardware_concurrency()),
        device_memory_gb: memory_from(property(navigator_value, "deviceMemory").as_f64()),
        effective_connection: property(&property(navigator_value, "connection"), "effectiveType")
            .as_string()
            .and_then(|s| connection_from(&s)),
        prefers_reduced_motion: prefers_reduced_motion(window),
    };
    tracing::debug!(
        cores = ?signals.hardware_concurrency,
        memory_gb = ?signals.device_memory_gb,
        connection = ?signals.effective_connection,
        reduced_motion = signals.prefers_reduced_motion,
        "device signals read"
    );
    signals
}

/// Whether the reduced-motion media query matches. False when unsupported.
#[must_use]
pub fn prefers_reduced_motion(window: &Window) -> bool {
    matches!(window.match_media(REDUCED_MOTION_QUERY), Ok(Some(mql)) if mql.matches())
}

/// Non-standard navigator members are read reflectively.
fn property(target: &JsValue, name: &str) -> JsValue {
    if target.is_undefined() || target.is_null() {
        return JsValue::UNDEFINED;
    }
    js_sys::Reflect::get(target, &JsValue::from_str(name)).unwrap_or(JsValue::UNDEFINED)
}

/// `navigator.hardwareConcurrency` is 0 or absent when hidden.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cores_from(value: f64) -> Option<u32> {
    (value.is_finite() && value >= 1.0).then(|| value.min(f64::from(u32::MAX)) as u32)
}

fn memory_from(value: Option<f64>) -> Option<f64> {
    value.filter(|gb| gb.is_finite() && *gb > 0.0)
}

fn connection_from(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_ascii_lowercase())
}
