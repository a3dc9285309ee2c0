// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A button authored as JSON: hover overlay, press toggle, and a link action.
//!
//! Run:
//! - `RUST_LOG=noiir_variants=trace cargo run -p noiir_demos --example hover_button`

use noiir_variants::action::{HostEffect, RecordingHost};
use noiir_variants::{Engine, EngineConfig};

const RULES: &str = r#"[
    { "trigger": "hover", "fromVariant": "idle", "toVariant": "hoverIdle",
      "duration": "fast", "curve": "easeOut" },
    { "trigger": "click", "toggle": true, "toggleVariants": ["idle", "pressed"] },
    { "trigger": "click", "action": "openLink", "url": "https://example.com/docs" }
]"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut engine = Engine::with_host(RecordingHost::new(), EngineConfig::default());
    engine
        .mount_json("btn", "idle", RULES)
        .expect("rules are valid JSON");
    println!("mounted:      {:?}", engine.snapshot("btn"));

    engine.pointer_enter("btn");
    let hovered = engine.snapshot("btn").expect("btn is mounted");
    println!("hovered:      {hovered:?}");
    assert_eq!(hovered.active, "hoverIdle");
    assert_eq!(hovered.logical, "idle");
    assert_eq!(hovered.transition, "all 150ms ease-out 0ms");

    engine.pointer_leave("btn");
    println!("left:         {:?}", engine.snapshot("btn"));
    assert_eq!(engine.active("btn"), Some("idle"));

    let commits = engine.click("btn");
    println!("clicked:      {commits:?}");
    assert_eq!(engine.logical("btn"), Some("pressed"));
    assert_eq!(
        engine.host().effects,
        vec![HostEffect::OpenUrl("https://example.com/docs".into())]
    );

    // The hover guard only accepts "idle", so a pressed button does not light up.
    engine.pointer_enter("btn");
    println!("hover while pressed: {:?}", engine.snapshot("btn"));
    assert_eq!(engine.active("btn"), Some("pressed"));
}
