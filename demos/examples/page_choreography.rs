// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small landing page: nested hover via pointer paths, a hero that animates in when
//! scrolled into view, a menu whose events dim a backdrop over the bus, a toast that
//! dismisses itself on a timer, and a theme switch relayed as a global signal.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p noiir_demos --example page_choreography`

use std::time::Duration;

use kurbo::Rect;
use noiir_timing::TimeValue;
use noiir_variants::action::{HostEffect, OverlayEvent, OverlayNotification, RecordingHost};
use noiir_variants::{
    Action, Engine, EngineConfig, EntityId, GlobalSignal, Rule, RuleTrigger, TriggerKind,
};

const CONFIG: &str = r#"
visibility_threshold = 0.25
max_tasks_per_flush = 256

[default_transition]
duration = "slow"
curve = "easeInOut"
"#;

fn path(ids: &[&str]) -> Vec<EntityId> {
    ids.iter().map(|s| EntityId::from(*s)).collect()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = EngineConfig::from_toml_str(CONFIG).expect("demo config is valid");
    let mut engine = Engine::with_host(RecordingHost::new(), config);

    engine.mount("page", "light", [
        Rule::parse("global:themeChange")
            .expect("channel trigger")
            .cycle(["light", "dark"]),
    ]);
    engine.mount("card", "flat", [Rule::new(RuleTrigger::Hover).to("raised")]);
    engine.mount("cta", "idle", [
        Rule::new(RuleTrigger::Hover).guard("idle").to("glow"),
        Rule::new(TriggerKind::Click)
            .action(Action::OpenOverlay)
            .overlay("signup"),
    ]);
    engine.mount("hero", "offscreen", [
        Rule::new(TriggerKind::Visible).to("onscreen"),
        Rule::new(TriggerKind::Hidden).to("offscreen"),
    ]);
    engine.mount("menu", "closed", [Rule::new(TriggerKind::Click).cycle(["closed", "open"])]);
    engine.mount("backdrop", "clear", [
        Rule::parse("menu:change").expect("channel trigger").cycle(["clear", "dim"]),
    ]);
    engine.mount("toast", "shown", [
        Rule::new(TriggerKind::Delay)
            .delay(TimeValue::from_millis(3000.0))
            .to("dismissed"),
    ]);

    // Nested hover: entering the button inside the card lights both.
    engine.update_pointer_path(&path(&["page", "card", "cta"]));
    println!("card: {:?}", engine.snapshot("card"));
    println!("cta:  {:?}", engine.snapshot("cta"));
    assert_eq!(engine.active("card"), Some("raised"));
    assert_eq!(engine.active("cta"), Some("glow"));

    engine.click("cta");
    assert_eq!(
        engine.host_mut().take(),
        vec![HostEffect::Overlay(OverlayNotification {
            event: OverlayEvent::Open,
            overlay_id: "signup".into(),
        })]
    );

    engine.update_pointer_path(&path(&["page"]));
    assert_eq!(engine.active("card"), Some("flat"));
    assert_eq!(engine.active("cta"), Some("idle"));

    // Scrolling the hero into view.
    let viewport = Rect::new(0.0, 0.0, 1280.0, 720.0);
    engine.update_intersection("hero", Rect::new(0.0, 900.0, 1280.0, 1400.0), viewport);
    assert_eq!(engine.logical("hero"), Some("offscreen"));
    engine.update_intersection("hero", Rect::new(0.0, 400.0, 1280.0, 900.0), viewport);
    println!("hero: {:?}", engine.snapshot("hero"));
    assert_eq!(engine.logical("hero"), Some("onscreen"));

    // Menu commits are published on `menu:change`; the backdrop follows.
    engine.click("menu");
    assert_eq!(engine.logical("backdrop"), Some("dim"));
    engine.click("menu");
    assert_eq!(engine.logical("backdrop"), Some("clear"));

    engine.signal(GlobalSignal::ThemeChange {
        theme: serde_json::json!({ "scheme": "dark" }),
    });
    assert_eq!(engine.logical("page"), Some("dark"));

    engine.advance(Duration::from_secs(2));
    assert_eq!(engine.logical("toast"), Some("shown"));
    engine.advance(Duration::from_secs(1));
    println!("toast: {:?}", engine.snapshot("toast"));
    assert_eq!(engine.logical("toast"), Some("dismissed"));

    // Tearing the menu down releases its bus traffic.
    engine.unmount("menu");
    assert!(engine.unmount("backdrop"));
    assert!(!engine.unmount("backdrop"));
    tracing::info!(mounted = engine.store().len(), "demo finished");
}
