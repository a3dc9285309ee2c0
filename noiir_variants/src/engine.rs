// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The engine: one constructible value owning every piece of shared state.
//!
//! ## Overview
//!
//! An [`Engine`] owns the [`VariantStore`], the [`RuleRegistry`], the [`EventBus`], the
//! [`TriggerManager`] and the [`ActionExecutor`]. Independent roots are independent
//! engines; nothing is global.
//!
//! Every input method runs in two phases:
//!
//! 1. **Commit**: the trigger is dispatched synchronously; commits are published
//!    (`"<entity>:change"` on the bus, a deferred `listen` trigger, the rule's transition).
//! 2. **Propagate**: the deferred task queue is drained until empty, bounded by
//!    [`EngineConfig::max_tasks_per_flush`]. Each drained task runs its own commit phase,
//!    so a `listen` rule always observes the commit that scheduled it.
//!
//! Every input method returns the [`Commit`]s of both phases in order.
//!
//! ## Minimal example
//!
//! ```
//! use noiir_variants::{Engine, Rule, TriggerKind};
//!
//! let mut engine = Engine::new();
//! engine.mount(
//!     "cb",
//!     "unchecked",
//!     [Rule::new(TriggerKind::Click).cycle(["unchecked", "checked"])],
//! );
//! engine.click("cb");
//! assert_eq!(engine.logical("cb"), Some("checked"));
//! engine.click("cb");
//! assert_eq!(engine.logical("cb"), Some("unchecked"));
//! ```

use core::time::Duration;
use std::collections::BTreeMap;

use kurbo::Rect;
use noiir_timing::Transition;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::action::{ActionExecutor, ActionHost, NullHost};
use crate::bus::EventBus;
use crate::config::EngineConfig;
use crate::dispatch::{self, Commit, Scope, TriggerEvent};
use crate::queue::{Task, TaskKind, TaskQueue};
use crate::registry::{RuleRegistry, RuleSetId};
use crate::rule::{Probe, Rule, TriggerKind};
use crate::store::VariantStore;
use crate::triggers::pointer::Crossing;
use crate::triggers::{TriggerManager, TriggerMask};
use crate::types::{EntityId, VariantState};

/// Bus event name under which commits are published.
pub const CHANGE_EVENT: &str = "change";

/// Window-level signals relayed onto the bus under the reserved global entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GlobalSignal {
    /// Viewport resized.
    Resize {
        /// New width.
        width: f64,
        /// New height.
        height: f64,
    },
    /// Document scrolled.
    Scroll {
        /// Horizontal offset.
        x: f64,
        /// Vertical offset.
        y: f64,
    },
    /// Theme changed; the payload is consumer-defined.
    ThemeChange {
        /// Consumer payload.
        theme: Value,
    },
    /// History/route changed.
    RouteChange {
        /// Current path.
        path: String,
    },
}

impl GlobalSignal {
    /// Event name on the bus (`global:<name>`).
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Resize { .. } => "resize",
            Self::Scroll { .. } => "scroll",
            Self::ThemeChange { .. } => "themeChange",
            Self::RouteChange { .. } => "routeChange",
        }
    }

    /// Payload delivered to listeners.
    pub fn payload(&self) -> Value {
        match self {
            Self::Resize { width, height } => json!({ "width": width, "height": height }),
            Self::Scroll { x, y } => json!({ "x": x, "y": y }),
            Self::ThemeChange { theme } => theme.clone(),
            Self::RouteChange { path } => json!({ "path": path }),
        }
    }
}

/// What the renderer needs to draw one entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSnapshot {
    /// Persistent variant.
    pub logical: String,
    /// Transient overlay.
    pub visual: Option<String>,
    /// `visual` if set, else `logical`.
    pub active: String,
    /// CSS transition string for the last commit.
    pub transition: String,
}

/// A variant transition engine.
#[derive(Debug)]
pub struct Engine<H: ActionHost = NullHost> {
    config: EngineConfig,
    store: VariantStore,
    registry: RuleRegistry,
    bus: EventBus,
    queue: TaskQueue,
    triggers: TriggerManager,
    executor: ActionExecutor<H>,
    transitions: BTreeMap<EntityId, Transition>,
}

impl Engine<NullHost> {
    /// An engine with the default configuration and no host effects.
    pub fn new() -> Self {
        Self::with_host(NullHost, EngineConfig::default())
    }

    /// An engine with `config` and no host effects.
    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_host(NullHost, config)
    }
}

impl Default for Engine<NullHost> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ActionHost> Engine<H> {
    /// An engine whose actions reach the outside world through `host`.
    pub fn with_host(host: H, config: EngineConfig) -> Self {
        Self {
            triggers: TriggerManager::new(config.visibility_threshold),
            executor: ActionExecutor::new(host, config.default_scroll_behavior),
            config,
            store: VariantStore::new(),
            registry: RuleRegistry::new(),
            bus: EventBus::new(),
            queue: TaskQueue::new(),
            transitions: BTreeMap::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- lifecycle ---

    /// Register `id` with an initial variant, then register and bind its rules.
    ///
    /// Mounting an id that is already mounted resets its variant and adds another rule
    /// set; use [`Engine::replace_rules`] to swap rules instead.
    pub fn mount<I>(
        &mut self,
        id: impl Into<EntityId>,
        initial: impl Into<String>,
        rules: I,
    ) -> RuleSetId
    where
        I: IntoIterator<Item = Rule>,
    {
        let id = id.into();
        self.store.register(id.clone(), initial);
        let set = self.bind(&id, rules);
        self.flush();
        set
    }

    /// Like [`Engine::mount`], with rules authored as a JSON array.
    pub fn mount_json(
        &mut self,
        id: impl Into<EntityId>,
        initial: impl Into<String>,
        rules: &str,
    ) -> Result<RuleSetId, serde_json::Error> {
        let rules: Vec<Rule> = serde_json::from_str(rules)?;
        Ok(self.mount(id, initial, rules))
    }

    /// Register and bind an additional rule set owned by `id`.
    pub fn add_rules<I>(&mut self, id: impl Into<EntityId>, rules: I) -> RuleSetId
    where
        I: IntoIterator<Item = Rule>,
    {
        let id = id.into();
        let set = self.bind(&id, rules);
        self.flush();
        set
    }

    /// Unbind and unregister one rule set. Unknown sets are a no-op.
    pub fn remove_rules(&mut self, set: RuleSetId) -> bool {
        self.triggers.unbind_set(set, &mut self.bus, &self.queue);
        self.registry.unregister(set)
    }

    /// Swap every rule set of `id` for `rules`, keeping its variant.
    ///
    /// Returns `None` when `id` is not mounted.
    pub fn replace_rules<I>(&mut self, id: &str, rules: I) -> Option<RuleSetId>
    where
        I: IntoIterator<Item = Rule>,
    {
        if !self.store.contains(id) {
            tracing::debug!(entity = id, "replace_rules on unmounted entity");
            return None;
        }
        self.triggers.unbind(id, &mut self.bus, &self.queue);
        self.registry.unregister_owner(id);
        let owner = EntityId::from(id);
        let set = self.bind(&owner, rules);
        self.flush();
        Some(set)
    }

    /// Tear down `id`: cancel its timers and tasks, drop its subscriptions and rules,
    /// and forget its variant. Returns whether it was mounted; repeated calls are no-ops.
    pub fn unmount(&mut self, id: &str) -> bool {
        self.triggers.unbind(id, &mut self.bus, &self.queue);
        self.triggers.forget_entity(id);
        self.registry.unregister_owner(id);
        self.transitions.remove(id);
        let was_mounted = self.store.unregister(id);
        if was_mounted {
            tracing::debug!(entity = id, "unmounted");
        }
        was_mounted
    }

    fn bind<I>(&mut self, owner: &EntityId, rules: I) -> RuleSetId
    where
        I: IntoIterator<Item = Rule>,
    {
        let set = self.registry.register(Some(owner), rules);
        self.triggers
            .bind(owner, set, &self.registry, &mut self.bus, &self.queue);
        set
    }

    // --- input ---

    /// Dispatch a normalized trigger and drain the deferred work it causes.
    pub fn dispatch(&mut self, event: TriggerEvent) -> Vec<Commit> {
        let mut commits = self.run(&event);
        commits.extend(self.flush());
        commits
    }

    /// Primary activation of `id`.
    pub fn click(&mut self, id: &str) -> Vec<Commit> {
        self.dispatch(TriggerEvent::from_source(TriggerKind::Click, id))
    }

    /// Pointer entered `id`.
    pub fn pointer_enter(&mut self, id: &str) -> Vec<Commit> {
        self.dispatch(TriggerEvent::from_source(TriggerKind::PointerEnter, id))
    }

    /// Pointer left `id`.
    pub fn pointer_leave(&mut self, id: &str) -> Vec<Commit> {
        self.dispatch(TriggerEvent::from_source(TriggerKind::PointerLeave, id))
    }

    /// Pointer pressed on `id`.
    pub fn pointer_down(&mut self, id: &str) -> Vec<Commit> {
        self.dispatch(TriggerEvent::from_source(TriggerKind::PointerDown, id))
    }

    /// Pointer released on `id`.
    pub fn pointer_up(&mut self, id: &str) -> Vec<Commit> {
        self.dispatch(TriggerEvent::from_source(TriggerKind::PointerUp, id))
    }

    /// `id` gained focus.
    pub fn focus(&mut self, id: &str) -> Vec<Commit> {
        self.dispatch(TriggerEvent::from_source(TriggerKind::Focus, id))
    }

    /// `id` lost focus.
    pub fn blur(&mut self, id: &str) -> Vec<Commit> {
        self.dispatch(TriggerEvent::from_source(TriggerKind::Blur, id))
    }

    /// A key went down. Raises `key` on the focused entity, if any, then `hotKey`.
    pub fn key_down(&mut self, focused: Option<&str>, key: &str) -> Vec<Commit> {
        let mut commits = Vec::new();
        if let Some(id) = focused {
            commits.extend(self.run(&TriggerEvent::key(id, key)));
        }
        if self.triggers.wants_global_keys() {
            commits.extend(self.run(&TriggerEvent::hot_key(key)));
        }
        commits.extend(self.flush());
        commits
    }

    /// Fire a named custom event on `id`.
    pub fn fire_custom(&mut self, id: &str, name: Option<&str>) -> Vec<Commit> {
        self.dispatch(TriggerEvent::custom(id, name))
    }

    /// Report the root→target chain under the pointer; raises the leave and enter
    /// triggers for the difference against the previous chain.
    pub fn update_pointer_path(&mut self, path: &[EntityId]) -> Vec<Commit> {
        let crossings = self.triggers.update_pointer_path(path);
        self.cross(crossings)
    }

    /// The pointer left the surface.
    pub fn clear_pointer_path(&mut self) -> Vec<Commit> {
        let crossings = self.triggers.clear_pointer_path();
        self.cross(crossings)
    }

    fn cross(&mut self, crossings: Vec<Crossing>) -> Vec<Commit> {
        let mut commits = Vec::new();
        for crossing in crossings {
            let event = match crossing {
                Crossing::Enter(id) => TriggerEvent::from_source(TriggerKind::PointerEnter, id),
                Crossing::Leave(id) => TriggerEvent::from_source(TriggerKind::PointerLeave, id),
            };
            commits.extend(self.run(&event));
        }
        commits.extend(self.flush());
        commits
    }

    /// Report the geometry of `id` and the viewport; raises `visible`/`hidden` on
    /// threshold crossings.
    pub fn update_intersection(&mut self, id: &str, element: Rect, viewport: Rect) -> Vec<Commit> {
        match self.triggers.update_intersection(id, element, viewport) {
            Some(kind) => self.dispatch(TriggerEvent::from_source(kind, id)),
            None => Vec::new(),
        }
    }

    /// Advance the cooperative clock, firing elapsed `delay` rules.
    pub fn advance(&mut self, by: Duration) -> Vec<Commit> {
        self.triggers.advance(by, &self.queue);
        self.flush()
    }

    /// Publish an entity-scoped event on the bus and drain what it triggers.
    pub fn emit(&mut self, entity: &str, name: &str, data: Value) -> Vec<Commit> {
        self.bus.emit(entity, name, data);
        self.flush()
    }

    /// Relay a window-level signal and drain what it triggers.
    pub fn signal(&mut self, signal: GlobalSignal) -> Vec<Commit> {
        self.bus.emit_global(signal.event_name(), signal.payload());
        self.flush()
    }

    // --- reads ---

    /// Current state of `id`.
    pub fn variant(&self, id: &str) -> Option<&VariantState> {
        self.store.get(id)
    }

    /// Logical variant of `id`.
    pub fn logical(&self, id: &str) -> Option<&str> {
        self.store.get(id).map(|s| s.logical.as_str())
    }

    /// Visual-or-logical variant of `id`.
    pub fn active(&self, id: &str) -> Option<&str> {
        self.store.get(id).map(VariantState::active)
    }

    /// Timing of the last commit to `id`, if it has been committed to.
    pub fn transition(&self, id: &str) -> Option<&Transition> {
        self.transitions.get(id)
    }

    /// Everything the renderer needs for `id`.
    pub fn snapshot(&self, id: &str) -> Option<VariantSnapshot> {
        let state = self.store.get(id)?;
        let transition = self
            .transitions
            .get(id)
            .unwrap_or(&self.config.default_transition);
        Some(VariantSnapshot {
            logical: state.logical.clone(),
            visual: state.visual.clone(),
            active: state.active().to_owned(),
            transition: transition.to_css(),
        })
    }

    /// Element listeners `id` needs.
    pub fn bindings(&self, id: &str) -> TriggerMask {
        self.triggers.bindings(id)
    }

    /// Whether the single process-wide key listener is needed.
    pub fn wants_global_keys(&self) -> bool {
        self.triggers.wants_global_keys()
    }

    /// The variant store.
    pub fn store(&self) -> &VariantStore {
        &self.store
    }

    /// The rule registry.
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// The trigger manager.
    pub fn triggers(&self) -> &TriggerManager {
        &self.triggers
    }

    /// The event bus, for external subscribers.
    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// The action host.
    pub fn host(&self) -> &H {
        self.executor.host()
    }

    /// The action host, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        self.executor.host_mut()
    }

    /// Deferred tasks not yet drained. Always zero between input calls.
    pub fn pending_tasks(&self) -> usize {
        self.queue.len()
    }

    // --- phases ---

    fn run(&mut self, event: &TriggerEvent) -> Vec<Commit> {
        let commits = dispatch::dispatch(event, &mut self.store, &self.registry, &mut self.executor);
        for commit in &commits {
            self.publish(commit);
        }
        commits
    }

    fn publish(&mut self, commit: &Commit) {
        // A cleared overlay is not a new variant.
        let Some(variant) = &commit.variant else {
            return;
        };
        if let Some(entry) = self.registry.get(commit.rule) {
            self.transitions.insert(
                commit.entity.clone(),
                entry.rule.transition(&self.config.default_transition),
            );
        }
        tracing::trace!(entity = %commit.entity, variant = %variant, layer = ?commit.layer, "commit");
        self.queue.push(Task::dispatch(
            Some(commit.entity.clone()),
            TriggerEvent::listen(&commit.entity, variant.clone()),
        ));
        self.bus.emit(
            commit.entity.as_str(),
            CHANGE_EVENT,
            json!({ "variant": variant, "layer": commit.layer }),
        );
    }

    fn flush(&mut self) -> Vec<Commit> {
        let budget = self.config.max_tasks_per_flush;
        let mut commits = Vec::new();
        let mut ran = 0_usize;
        while let Some(task) = self.queue.pop() {
            if ran >= budget {
                let dropped = self.queue.clear() + 1;
                tracing::warn!(budget, dropped, "propagation budget exhausted; dropping deferred tasks");
                break;
            }
            ran += 1;
            match task.kind {
                TaskKind::Dispatch(event) => commits.extend(self.run(&event)),
                TaskKind::Probe(id) => {
                    let fired = self
                        .registry
                        .get(id)
                        .and_then(|e| e.probe.as_ref())
                        .is_some_and(Probe::fire);
                    if fired {
                        let event = TriggerEvent {
                            source: task.owner,
                            ..TriggerEvent::new(TriggerKind::Custom)
                        }
                        .scoped(Scope::Rule(id));
                        commits.extend(self.run(&event));
                    }
                }
            }
        }
        commits
    }
}
