//! Browser tests for the DOM host.
//!
//! Run with `wasm-pack test --headless --firefox motion-app`:
//! - Element keys stay stable across scans
//! - Cloned markup gets its own key
//! - Mutations reach the live element and injected nodes are removed

#![cfg(target_arch = "wasm32")]

use motion_app::dom::{DomHost, KEY_ATTRIBUTE};
use motion_core::{LayoutSource, Mutation, NodeKey, StyleProperty};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{Document, Element, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window()
        .expect("window")
        .document()
        .expect("document")
}

/// Append a div with `class` to the body.
fn mount(class: &str) -> Element {
    let element = document().create_element("div").expect("create div");
    element.set_class_name(class);
    document()
        .body()
        .expect("body")
        .append_child(&element)
        .expect("append");
    element
}

fn keys(host: &DomHost) -> Vec<NodeKey> {
    host.scan()
        .expect("scan")
        .into_iter()
        .map(|node| node.key)
        .collect()
}

// ============================================================================
// Keys
// ============================================================================

#[wasm_bindgen_test]
fn test_keys_are_stable_across_scans() {
    let element = mount("fade-in-up");
    let host = DomHost::new().expect("host");

    let first = keys(&host);
    let key = host.key_for(&element);
    assert!(first.contains(&key));
    assert_eq!(
        element.get_attribute(KEY_ATTRIBUTE),
        Some(key.0.to_string())
    );

    let second = keys(&host);
    assert!(second.contains(&key));
    assert_eq!(host.key_for(&element), key);

    element.remove();
}

#[wasm_bindgen_test]
fn test_cloned_element_gets_its_own_key() {
    let original = mount("zoom-in");
    let host = DomHost::new().expect("host");
    keys(&host);
    let original_key = host.key_for(&original);

    let copy: Element = original
        .clone_node_with_deep(true)
        .expect("clone")
        .dyn_into()
        .expect("element");
    document()
        .body()
        .expect("body")
        .append_child(&copy)
        .expect("append");
    assert_eq!(
        copy.get_attribute(KEY_ATTRIBUTE),
        Some(original_key.0.to_string())
    );

    let scanned = keys(&host);
    let copy_key = host.key_for(&copy);
    assert_ne!(copy_key, original_key);
    assert!(scanned.contains(&original_key));
    assert!(scanned.contains(&copy_key));
    assert_eq!(host.key_for(&original), original_key);
    assert_eq!(
        copy.get_attribute(KEY_ATTRIBUTE),
        Some(copy_key.0.to_string())
    );

    // Mutations addressed to the original leave the copy alone.
    let failed = host.apply(&[Mutation::style(original_key, StyleProperty::Opacity, "0.5")]);
    assert_eq!(failed, 0);
    let style_of = |element: &Element| {
        element
            .clone()
            .dyn_into::<HtmlElement>()
            .expect("html element")
            .style()
            .get_property_value("opacity")
            .expect("opacity")
    };
    assert_eq!(style_of(&original), "0.5");
    assert_ne!(style_of(&copy), "0.5");

    original.remove();
    copy.remove();
}

// ============================================================================
// Mutations
// ============================================================================

#[wasm_bindgen_test]
fn test_overlay_injected_once_and_removed() {
    let section = mount("reveal-section");
    let host = DomHost::new().expect("host");
    keys(&host);
    let key = host.key_for(&section);
    assert!(host.element_box(key).is_some());

    let inject = Mutation::InjectOverlay {
        section: key,
        transform: "translateY(0)".to_string(),
    };
    assert_eq!(host.apply(&[inject.clone(), inject]), 0);
    assert_eq!(section.query_selector_all(".reveal-overlay").expect("query").length(), 1);

    host.remove_injected();
    assert_eq!(section.query_selector_all(".reveal-overlay").expect("query").length(), 0);

    section.remove();
    assert!(host.element_box(key).is_none());
}

#[wasm_bindgen_test]
fn test_unknown_node_is_counted_as_failed() {
    let host = DomHost::new().expect("host");
    let failed = host.apply(&[Mutation::class(NodeKey(u64::MAX), "animated", true)]);
    assert_eq!(failed, 1);
}
