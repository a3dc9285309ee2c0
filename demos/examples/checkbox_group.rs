// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Checkboxes that report into a summary frame through `listen` rules.
//!
//! Run:
//! - `cargo run -p noiir_demos --example checkbox_group`

use noiir_variants::{Engine, Rule, TriggerKind};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut engine = Engine::new();
    for id in ["terms", "privacy"] {
        engine.mount(
            id,
            "unchecked",
            [
                Rule::new(TriggerKind::Click).cycle(["unchecked", "checked"]),
                Rule::parse("key:Enter")
                    .expect("key trigger")
                    .cycle(["unchecked", "checked"]),
            ],
        );
    }
    // The submit button wakes up once both boxes have been checked at least once.
    engine.mount(
        "submit",
        "locked",
        [
            Rule::new(TriggerKind::Listen)
                .listen_to("terms", Some("checked"))
                .guard("locked")
                .to("half"),
            Rule::new(TriggerKind::Listen)
                .listen_to("privacy", Some("checked"))
                .guard("locked")
                .to("half"),
            Rule::new(TriggerKind::Listen)
                .listen_to("terms", Some("checked"))
                .guard("half")
                .to("ready"),
            Rule::new(TriggerKind::Listen)
                .listen_to("privacy", Some("checked"))
                .guard("half")
                .to("ready"),
        ],
    );

    let commits = engine.click("terms");
    println!("terms clicked:  {commits:?}");
    assert_eq!(engine.logical("submit"), Some("half"));

    let commits = engine.key_down(Some("privacy"), "Enter");
    println!("privacy keyed:  {commits:?}");
    assert_eq!(engine.logical("privacy"), Some("checked"));
    assert_eq!(engine.logical("submit"), Some("ready"));

    engine.click("terms");
    println!("terms cleared:  {:?}", engine.variant("terms"));
    assert_eq!(engine.logical("terms"), Some("unchecked"));
    assert_eq!(engine.logical("submit"), Some("ready"));
}
