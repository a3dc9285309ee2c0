// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Noiir Variants: a declarative variant transition engine for UI frames.
//!
//! ## Overview
//!
//! Each mounted entity (a frame) is in exactly one named *variant* at a time, plus an
//! optional transient *visual overlay* (hover). Entities supply an ordered list of
//! [`Rule`]s saying which trigger moves which entity from which variant to which, and
//! which side effect runs alongside.
//!
//! The engine is single-threaded and synchronous. Inputs go in through an [`Engine`]
//! (clicks, pointer paths, keys, viewport geometry, clock ticks, bus events); commits come
//! out as return values, bus events and host effects.
//!
//! ## Pieces
//!
//! - [`rule`]: the rule schema and authored trigger/action vocabulary.
//! - [`store`]: the only mutable truth about variants.
//! - [`registry`]: every mounted rule, normalized once at registration.
//! - [`dispatch`]: turns one trigger into commits and action runs.
//! - [`action`]: runs side effects against an [`ActionHost`].
//! - [`bus`]: cross-entity publish/subscribe keyed by `"<entity>:<event>"`.
//! - [`triggers`]: binds rule sets to event sources (pointer path, visibility, timers,
//!   bus channels, the global key listener).
//! - [`queue`]: deferred work drained after each commit phase.
//! - [`config`]: TOML-loadable tunables.
//!
//! ## Example
//!
//! ```
//! use noiir_variants::{Engine, Rule, RuleTrigger, TriggerKind};
//!
//! let mut engine = Engine::new();
//! engine.mount("btn", "idle", [
//!     Rule::new(RuleTrigger::Hover).guard("idle").to("hoverIdle"),
//!     Rule::new(TriggerKind::Click).to("pressed"),
//! ]);
//!
//! engine.pointer_enter("btn");
//! assert_eq!(engine.active("btn"), Some("hoverIdle"));
//! assert_eq!(engine.logical("btn"), Some("idle"));
//!
//! engine.pointer_leave("btn");
//! assert_eq!(engine.active("btn"), Some("idle"));
//!
//! engine.click("btn");
//! assert_eq!(engine.logical("btn"), Some("pressed"));
//! ```

pub mod action;
pub mod bus;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod queue;
pub mod registry;
pub mod rule;
pub mod store;
pub mod triggers;
pub mod types;

pub use action::{ActionExecutor, ActionHost, ActionOutcome, NullHost, RecordingHost};
pub use bus::{BusEvent, EventBus, SubscriptionId};
pub use config::EngineConfig;
pub use dispatch::{Commit, Scope, TriggerEvent};
pub use engine::{Engine, GlobalSignal, VariantSnapshot};
pub use error::{ConfigError, RuleError};
pub use registry::{RuleId, RuleRegistry, RuleSetId};
pub use rule::{Action, Probe, Rule, RuleTrigger, ScrollBehavior, Trigger, TriggerKind};
pub use store::VariantStore;
pub use triggers::{TriggerManager, TriggerMask};
pub use types::{EntityId, GLOBAL_ENTITY, Layer, VariantState};

pub use noiir_timing::{Curve, TimeValue, Transition};
