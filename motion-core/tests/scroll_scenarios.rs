//! Scroll Scenario Integration Tests
//!
//! Drives the engine through a headless page:
//! - Entrance animations and their one-shot guarantee
//! - Reduced-motion and low-tier bundles
//! - Counters, progress, videos, reveal overlays
//! - Refresh and detached-node tolerance

use motion_core::{
    group_thousands, AnimationVariant, CounterRamp, DeviceSignals, EngineConfig, HeadlessPage,
    HeadlessSession, Mutation, NodeKey, NodeSnapshot, Rect, StyleProperty, Viewport,
};
use motion_core::element::CounterSpec;
use motion_core::geometry::scroll_progress;
use proptest::prelude::*;

const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0";

/// A capable desktop.
fn desktop() -> DeviceSignals {
    DeviceSignals {
        user_agent: DESKTOP_UA.to_string(),
        hardware_concurrency: Some(8),
        device_memory_gb: Some(8.0),
        effective_connection: Some("4g".to_string()),
        prefers_reduced_motion: false,
    }
}

/// A 1280x800 viewport over a 4000px document.
fn empty_page() -> HeadlessPage {
    HeadlessPage::new(Viewport::new(0.0, 1280.0, 800.0, 4000.0))
}

/// A full-width box at document offset `y`.
fn row(y: f64) -> Rect {
    Rect::new(0.0, y, 1280.0, 200.0)
}

fn start(page: HeadlessPage, signals: &DeviceSignals) -> HeadlessSession {
    HeadlessSession::start(page, EngineConfig::default(), signals)
}

fn style(session: &HeadlessSession, key: u64, property: StyleProperty) -> Option<String> {
    session
        .page()
        .style(NodeKey(key), property)
        .map(str::to_string)
}

fn text(session: &HeadlessSession, key: u64) -> Option<String> {
    session
        .page()
        .node(NodeKey(key))
        .and_then(|n| n.text.clone())
}

// ============================================================================
// Entrance Animations
// ============================================================================

#[test]
fn test_fade_in_up_end_to_end() {
    let mut page = empty_page();
    page.add_node(NodeSnapshot::new(1, "div", &["fade-in-up"]), row(2000.0));
    let mut session = start(page, &desktop());

    assert_eq!(style(&session, 1, StyleProperty::Opacity).as_deref(), Some("0"));
    assert_eq!(
        style(&session, 1, StyleProperty::Transform).as_deref(),
        Some("translateY(50px)")
    );
    assert!(!session.engine().orchestrator().is_animated(NodeKey(1)));

    // 2000 - 800 < 1500 - 100; one frame, well inside the debounce.
    session.scroll_to(1500.0);
    session.advance(17.0);

    assert_eq!(style(&session, 1, StyleProperty::Opacity).as_deref(), Some("1"));
    assert_eq!(
        style(&session, 1, StyleProperty::Transform).as_deref(),
        Some("translateY(0)")
    );
    assert!(session.engine().orchestrator().is_animated(NodeKey(1)));

    session.scroll_to(0.0);
    session.advance(100.0);
    assert!(session.engine().orchestrator().is_animated(NodeKey(1)));
    assert_eq!(style(&session, 1, StyleProperty::Opacity).as_deref(), Some("1"));
}

#[test]
fn test_entrance_fires_during_continuous_scroll() {
    let mut page = empty_page();
    page.add_node(NodeSnapshot::new(1, "div", &["fade-in-up"]), row(1500.0));
    let mut session = start(page, &desktop());

    // 2px every 16ms for two seconds: the debounce never elapses.
    let mut frames_until_animated = None;
    for frame in 0..125_u32 {
        session.scroll_to(1000.0 + f64::from(frame) * 2.0);
        session.frame();
        session.sleep(16.0);
        if frames_until_animated.is_none()
            && session.engine().orchestrator().is_animated(NodeKey(1))
        {
            frames_until_animated = Some(frame + 1);
        }
    }

    assert_eq!(frames_until_animated, Some(1));
    assert_eq!(style(&session, 1, StyleProperty::Opacity).as_deref(), Some("1"));
    assert_eq!(
        style(&session, 1, StyleProperty::Transform).as_deref(),
        Some("translateY(0)")
    );
}

#[test]
fn test_animated_element_is_never_touched_again() {
    let mut page = empty_page();
    page.add_node(NodeSnapshot::new(1, "div", &["scale-in"]), row(1200.0));
    let mut session = start(page, &desktop());
    session.scroll_to(1000.0);
    session.advance(100.0);
    assert!(session.engine().orchestrator().is_animated(NodeKey(1)));
    session.take_log();

    for scroll in [0.0, 1500.0, 300.0, 2500.0, 1000.0] {
        session.scroll_to(scroll);
        session.advance(100.0);
    }
    let touched = session
        .take_log()
        .iter()
        .filter(|m| m.node() == Some(NodeKey(1)))
        .count();
    assert_eq!(touched, 0);
}

#[test]
fn test_bounce_in_plays_keyframes() {
    let mut page = empty_page();
    page.add_node(NodeSnapshot::new(1, "div", &["bounce-in"]), row(1200.0));
    let mut session = start(page, &desktop());
    session.scroll_to(1000.0);
    session.advance(100.0);
    assert_eq!(
        style(&session, 1, StyleProperty::Animation).as_deref(),
        Some("bounceIn 0.8s ease-out")
    );
}

#[test]
fn test_data_attributes_drive_transition() {
    let mut page = empty_page();
    page.add_node(
        NodeSnapshot::new(1, "div", &["fade-in"])
            .with_data("animation-delay", "200")
            .with_data("animation-duration", "0.9s")
            .with_data("animation-easing", "ease-in-out"),
        row(2000.0),
    );
    let session = start(page, &desktop());
    assert_eq!(
        style(&session, 1, StyleProperty::Transition).as_deref(),
        Some("all 900ms ease-in-out")
    );
    assert_eq!(
        style(&session, 1, StyleProperty::TransitionDelay).as_deref(),
        Some("200ms")
    );
}

// ============================================================================
// Tier Bundles
// ============================================================================

#[test]
fn test_reduced_motion_snaps_everything_to_final_state() {
    let mut page = empty_page();
    for (i, variant) in AnimationVariant::ALL.iter().enumerate() {
        let key = u64::try_from(i).unwrap() + 1;
        page.add_node(
            NodeSnapshot::new(key, "div", &[variant.class_name()]),
            row(1000.0 + 200.0 * f64::from(u32::try_from(i).unwrap())),
        );
    }
    page.add_node(
        NodeSnapshot::new(100, "div", &["parallax-element"]),
        row(1500.0),
    );
    let signals = DeviceSignals {
        prefers_reduced_motion: true,
        ..desktop()
    };
    let mut session = start(page, &signals);

    for (i, variant) in AnimationVariant::ALL.iter().enumerate() {
        let key = u64::try_from(i).unwrap() + 1;
        assert!(session.engine().orchestrator().is_animated(NodeKey(key)));
        assert_eq!(style(&session, key, StyleProperty::Opacity).as_deref(), Some("1"));
        assert_eq!(
            style(&session, key, StyleProperty::Transform).as_deref(),
            variant.resting().transform,
            "{variant}"
        );
    }
    assert_eq!(
        session.page().root_property("--animation-duration"),
        Some("0.01ms")
    );
    assert!(!session.page().progress_visible());

    // Parallax stays put while scrolling.
    session.scroll_to(900.0);
    session.advance(100.0);
    assert_eq!(
        style(&session, 100, StyleProperty::Transform).as_deref(),
        Some("none")
    );
    assert_eq!(
        style(&session, 100, StyleProperty::BackgroundAttachment).as_deref(),
        Some("scroll")
    );
}

#[test]
fn test_low_tier_clamps_stagger() {
    let mut page = empty_page();
    let children: Vec<u64> = (11..=20).collect();
    page.add_node(
        NodeSnapshot::new(10, "ul", &["stagger-fade-in"])
            .with_data("stagger-delay", "150")
            .with_children(&children),
        row(2500.0),
    );
    let signals = DeviceSignals {
        hardware_concurrency: Some(2),
        ..desktop()
    };
    let mut session = start(page, &signals);
    assert_eq!(session.engine().tier(), motion_core::PerformanceTier::Low);

    let delays: Vec<String> = (11..=14)
        .map(|k| style(&session, k, StyleProperty::TransitionDelay).unwrap())
        .collect();
    assert_eq!(delays, ["0ms", "150ms", "300ms", "450ms"]);
    for key in 11..=14 {
        assert_eq!(style(&session, key, StyleProperty::Opacity).as_deref(), Some("0"));
    }
    for key in 15..=20 {
        assert_eq!(
            style(&session, key, StyleProperty::TransitionDelay).as_deref(),
            Some("0ms")
        );
        assert_eq!(style(&session, key, StyleProperty::Opacity).as_deref(), Some("1"));
        assert_eq!(
            style(&session, key, StyleProperty::Transform).as_deref(),
            Some("none")
        );
    }

    session.scroll_to(2000.0);
    session.advance(100.0);
    for key in 11..=14 {
        assert_eq!(style(&session, key, StyleProperty::Opacity).as_deref(), Some("1"));
        assert!(session
            .page()
            .node(NodeKey(key))
            .is_some_and(|n| n.has_class("animated") && n.has_class("stagger-item")));
    }
}

#[test]
fn test_medium_tier_caps_stagger_delay() {
    let mut page = empty_page();
    page.add_node(
        NodeSnapshot::new(10, "ul", &["stagger-slide-up"])
            .with_data("stagger-delay", "250")
            .with_children(&[11, 12, 13]),
        row(2500.0),
    );
    let signals = DeviceSignals {
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile".to_string(),
        ..desktop()
    };
    let session = start(page, &signals);
    assert_eq!(session.engine().tier(), motion_core::PerformanceTier::Medium);
    assert_eq!(
        style(&session, 13, StyleProperty::TransitionDelay).as_deref(),
        Some("200ms")
    );
}

// ============================================================================
// Counters
// ============================================================================

#[test]
fn test_counter_counts_to_formatted_target() {
    let mut page = empty_page();
    page.add_node(
        NodeSnapshot::new(1, "span", &["stat-number"])
            .with_data("counter-target", "1234")
            .with_data("counter-duration", "500")
            .with_data("counter-prefix", "$")
            .with_data("counter-suffix", "+"),
        row(2000.0),
    );
    let mut session = start(page, &desktop());
    assert_eq!(text(&session, 1), None);

    session.scroll_to(1500.0);
    session.advance(1000.0);
    assert_eq!(text(&session, 1).as_deref(), Some("$1,234+"));
    assert_eq!(session.engine().orchestrator().active_counters(), 0);
}

#[test]
fn test_counter_texts_are_non_decreasing() {
    let mut page = empty_page();
    page.add_node(
        NodeSnapshot::new(1, "span", &["counter"]).with_data("counter-target", "987654"),
        row(100.0),
    );
    let mut session = start(page, &desktop());
    session.advance(2500.0);

    let values: Vec<u64> = session
        .take_log()
        .into_iter()
        .filter_map(|m| match m {
            Mutation::SetText { text, .. } => text.replace(',', "").parse().ok(),
            _ => None,
        })
        .collect();
    assert!(values.len() > 2);
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(values.last().copied(), Some(987_654));
}

#[test]
fn test_counter_pauses_while_hidden() {
    let mut page = empty_page();
    page.add_node(
        NodeSnapshot::new(1, "span", &["count-up"])
            .with_data("counter-target", "100")
            .with_data("counter-duration", "1000"),
        row(100.0),
    );
    let mut session = start(page, &desktop());
    session.advance(200.0);
    let before = text(&session, 1);
    assert_ne!(before.as_deref(), Some("100"));

    session.set_hidden(true);
    session.advance(5000.0);
    assert_eq!(text(&session, 1), before);

    session.set_hidden(false);
    session.advance(2000.0);
    assert_eq!(text(&session, 1).as_deref(), Some("100"));
}

#[test]
fn test_detached_counter_is_cancelled() {
    let mut page = empty_page();
    page.add_node(
        NodeSnapshot::new(1, "span", &["counter"]).with_data("counter-target", "5000"),
        row(100.0),
    );
    let mut session = start(page, &desktop());
    session.advance(100.0);
    assert_eq!(session.engine().orchestrator().active_counters(), 1);

    session.page_mut().detach(NodeKey(1));
    session.scroll_to(10.0);
    session.advance(100.0);
    assert_eq!(session.engine().orchestrator().active_counters(), 0);
    session.take_log();

    session.advance(3000.0);
    assert!(session.take_log().iter().all(|m| m.node() != Some(NodeKey(1))));
}

proptest! {
    #[test]
    fn prop_counter_ramp_is_monotonic_and_exact(
        target in 0u64..5_000_000,
        duration_ms in 1u32..6000,
    ) {
        let spec = CounterSpec {
            target,
            duration_ms,
            prefix: String::new(),
            suffix: String::new(),
        };
        let mut ramp = CounterRamp::new(&spec, 16.0);
        let mut last = 0;
        let mut steps = 0;
        while let Some(text) = ramp.step() {
            let value = ramp.value();
            prop_assert!(value >= last);
            prop_assert!(value <= target);
            prop_assert_eq!(text, group_thousands(value));
            last = value;
            steps += 1;
            prop_assert!(steps <= 10_000);
        }
        prop_assert!(ramp.is_finished());
        prop_assert_eq!(last, target);
    }

    #[test]
    fn prop_progress_is_monotonic(
        mut scrolls in proptest::collection::vec(0.0f64..5000.0, 1..40),
        doc in 900.0f64..6000.0,
    ) {
        scrolls.sort_by(f64::total_cmp);
        let mut last = 0.0;
        for scroll in scrolls {
            let percent = scroll_progress(&Viewport::new(scroll, 1280.0, 800.0, doc));
            prop_assert!((0.0..=100.0).contains(&percent));
            prop_assert!(percent >= last);
            last = percent;
        }
    }
}

// ============================================================================
// Progress, Videos, Reveals
// ============================================================================

#[test]
fn test_progress_spans_top_to_bottom() {
    let mut session = start(empty_page(), &desktop());
    assert_eq!(session.page().progress(), Some(0.0));
    assert!(session.page().progress_visible());

    session.scroll_to(1600.0);
    session.advance(20.0);
    assert_eq!(session.page().progress(), Some(50.0));

    session.scroll_to(3200.0);
    session.advance(20.0);
    assert_eq!(session.page().progress(), Some(100.0));
}

#[test]
fn test_video_plays_only_while_visible() {
    let mut page = empty_page();
    page.add_node(
        NodeSnapshot::new(1, "video", &["video-scroll-play"]),
        row(1500.0),
    );
    let mut session = start(page, &desktop());
    assert!(!session.engine().orchestrator().is_playing(NodeKey(1)));

    session.scroll_to(1000.0);
    session.advance(20.0);
    assert!(session.page().node(NodeKey(1)).is_some_and(|n| n.playing));

    session.scroll_to(3000.0);
    session.advance(20.0);
    assert!(session.page().node(NodeKey(1)).is_some_and(|n| !n.playing));
    assert!(!session.engine().orchestrator().is_playing(NodeKey(1)));
}

#[test]
fn test_reveal_directions() {
    let mut page = empty_page();
    page.add_node(NodeSnapshot::new(1, "section", &["reveal-section"]), row(1200.0));
    page.add_node(NodeSnapshot::new(2, "section", &["reveal-right"]), row(1300.0));
    let mut session = start(page, &desktop());
    let overlay = |session: &HeadlessSession, key| {
        session
            .page()
            .node(NodeKey(key))
            .and_then(|n| n.overlay.clone())
    };
    assert_eq!(overlay(&session, 1).as_deref(), Some("translateY(0)"));
    assert_eq!(overlay(&session, 2).as_deref(), Some("translateX(0)"));

    session.scroll_to(1000.0);
    session.advance(20.0);
    assert_eq!(overlay(&session, 1).as_deref(), Some("translateY(100%)"));
    assert_eq!(overlay(&session, 2).as_deref(), Some("translateX(100%)"));
    assert!(session.engine().orchestrator().is_revealed(NodeKey(2)));
}

// ============================================================================
// Refresh
// ============================================================================

#[test]
fn test_refresh_tracks_new_nodes_only() {
    let mut page = empty_page();
    page.add_node(NodeSnapshot::new(1, "div", &["fade-in-right"]), row(300.0));
    let mut session = start(page, &desktop());
    assert!(session.engine().orchestrator().is_animated(NodeKey(1)));
    let id = session.engine().orchestrator().track_id(NodeKey(1));

    session
        .page_mut()
        .add_node(NodeSnapshot::new(2, "div", &["slide-in-up"]), row(3000.0));
    session.refresh();
    session.refresh();

    let orchestrator = session.engine().orchestrator();
    assert_eq!(orchestrator.track_id(NodeKey(1)), id);
    assert!(orchestrator.is_animated(NodeKey(1)));
    assert!(!orchestrator.is_animated(NodeKey(2)));
    assert_eq!(orchestrator.tracked_len(), 2);
    assert_eq!(
        style(&session, 2, StyleProperty::Transform).as_deref(),
        Some("translateY(100px)")
    );
}

#[test]
fn test_refresh_starts_in_view_reveal_and_counter_without_scroll() {
    let mut session = start(empty_page(), &desktop());

    session
        .page_mut()
        .add_node(NodeSnapshot::new(1, "section", &["reveal-section"]), row(100.0));
    session.page_mut().add_node(
        NodeSnapshot::new(2, "span", &["counter"]).with_data("counter-target", "300"),
        row(200.0),
    );
    session.refresh();
    session.advance(3000.0);

    let orchestrator = session.engine().orchestrator();
    assert!(orchestrator.is_revealed(NodeKey(1)));
    assert!(orchestrator.is_counted(NodeKey(2)));
    assert_eq!(text(&session, 2).as_deref(), Some("300"));
    let overlay = session
        .page()
        .node(NodeKey(1))
        .and_then(|n| n.overlay.as_deref());
    assert_eq!(overlay, Some("translateY(100%)"));
}
