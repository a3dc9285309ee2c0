// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trigger manager: binds mounted rule sets to concrete event sources.
//!
//! ## Overview
//!
//! Binding a rule set walks its normalized rules once and sets up whatever each trigger
//! kind needs:
//!
//! - Element events (pointer, focus, keys) only need the host to listen on the element;
//!   they are summarized in a [`TriggerMask`] per entity.
//! - `hotKey` rules count towards a single process-wide key listener
//!   ([`TriggerManager::wants_global_keys`]).
//! - `mount` rules and probes queue one deferred task scoped to their set or rule.
//! - `delay` rules schedule a one-shot timer on the cooperative clock.
//! - `visible`/`hidden` rules register the entity with the [`VisibilityWatcher`].
//! - Cross-frame channel rules subscribe once per channel on the [`EventBus`]; the
//!   subscription enqueues a dispatch scoped to the set.
//!
//! Unbinding reverses every one of these exactly: subscriptions are dropped, timers and
//! queued tasks are cancelled, and the hotkey count is released.
//!
//! The manager never dispatches. It queues tasks or returns the trigger the engine
//! should dispatch.

pub mod pointer;
pub mod timer;
pub mod visibility;

use core::time::Duration;
use std::collections::BTreeMap;

use bitflags::bitflags;
use kurbo::Rect;

use crate::bus::{EventBus, SubscriptionId};
use crate::dispatch::{Scope, TriggerEvent};
use crate::queue::{Task, TaskKind, TaskQueue};
use crate::registry::{RuleRegistry, RuleSetId};
use crate::rule::TriggerKind;
use crate::types::EntityId;

use pointer::{Crossing, PointerTracker};
use timer::Timers;
use visibility::{VisibilityChange, VisibilityWatcher};

bitflags! {
    /// Native event kinds an entity's element must listen for.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TriggerMask: u16 {
        /// Primary activation.
        const CLICK         = 0b0000_0000_0001;
        /// Pointer enter.
        const POINTER_ENTER = 0b0000_0000_0010;
        /// Pointer leave.
        const POINTER_LEAVE = 0b0000_0000_0100;
        /// Pointer down.
        const POINTER_DOWN  = 0b0000_0000_1000;
        /// Pointer up.
        const POINTER_UP    = 0b0000_0001_0000;
        /// Focus gained.
        const FOCUS         = 0b0000_0010_0000;
        /// Focus lost.
        const BLUR          = 0b0000_0100_0000;
        /// Key pressed while focused.
        const KEY           = 0b0000_1000_0000;
        /// Viewport intersection changes.
        const VISIBILITY    = 0b0001_0000_0000;
    }
}

impl TriggerMask {
    /// Hover tracking needs both pointer boundary events.
    pub const HOVER: Self = Self::POINTER_ENTER.union(Self::POINTER_LEAVE);

    /// The element listener needed for `kind`, if any.
    pub const fn for_kind(kind: TriggerKind) -> Self {
        match kind {
            TriggerKind::Click => Self::CLICK,
            TriggerKind::PointerEnter => Self::POINTER_ENTER,
            TriggerKind::PointerLeave => Self::POINTER_LEAVE,
            TriggerKind::PointerDown => Self::POINTER_DOWN,
            TriggerKind::PointerUp => Self::POINTER_UP,
            TriggerKind::Focus => Self::FOCUS,
            TriggerKind::Blur => Self::BLUR,
            TriggerKind::Key => Self::KEY,
            TriggerKind::Visible | TriggerKind::Hidden => Self::VISIBILITY,
            TriggerKind::HotKey
            | TriggerKind::Listen
            | TriggerKind::Delay
            | TriggerKind::Mount
            | TriggerKind::Custom
            | TriggerKind::Channel => Self::empty(),
        }
    }
}

#[derive(Debug)]
struct SetBinding {
    set: RuleSetId,
    mask: TriggerMask,
    hot_keys: usize,
    subscriptions: Vec<SubscriptionId>,
}

/// Per-entity bindings for every mounted rule set.
#[derive(Debug)]
pub struct TriggerManager {
    entities: BTreeMap<EntityId, Vec<SetBinding>>,
    pointer: PointerTracker,
    visibility: VisibilityWatcher,
    timers: Timers,
    hot_keys: usize,
}

impl TriggerManager {
    /// Create a manager whose visibility watcher uses `visibility_threshold`.
    pub fn new(visibility_threshold: f64) -> Self {
        Self {
            entities: BTreeMap::new(),
            pointer: PointerTracker::new(),
            visibility: VisibilityWatcher::new(visibility_threshold),
            timers: Timers::new(),
            hot_keys: 0,
        }
    }

    /// Bind rule set `set` for `owner`.
    pub fn bind(
        &mut self,
        owner: &EntityId,
        set: RuleSetId,
        registry: &RuleRegistry,
        bus: &mut EventBus,
        queue: &TaskQueue,
    ) {
        let mut binding = SetBinding {
            set,
            mask: TriggerMask::empty(),
            hot_keys: 0,
            subscriptions: Vec::new(),
        };
        let mut mount = false;
        let mut channels: Vec<String> = Vec::new();
        for entry in registry.rules_of(set) {
            let kind = entry.trigger.kind;
            binding.mask |= TriggerMask::for_kind(kind);
            match kind {
                TriggerKind::Mount => mount = true,
                TriggerKind::Custom if entry.probe.is_some() => queue.push(Task {
                    owner: Some(owner.clone()),
                    kind: TaskKind::Probe(entry.id),
                }),
                TriggerKind::Delay => {
                    let after = entry.rule.delay.map_or(Duration::ZERO, |d| d.as_duration());
                    self.timers.schedule(owner.clone(), entry.id, after);
                }
                TriggerKind::HotKey => binding.hot_keys += 1,
                TriggerKind::Visible | TriggerKind::Hidden => self.visibility.watch(owner.clone()),
                TriggerKind::Channel => {
                    if let Some(ch) = &entry.trigger.channel
                        && !channels.contains(ch)
                    {
                        channels.push(ch.clone());
                    }
                }
                _ => {}
            }
        }
        if mount {
            queue.push(Task::dispatch(
                Some(owner.clone()),
                TriggerEvent::from_source(TriggerKind::Mount, owner.clone()).scoped(Scope::Set(set)),
            ));
        }
        for channel in channels {
            let q = queue.clone();
            let own = owner.clone();
            let ch = channel.clone();
            let sub = bus.listen(channel, move |ev| {
                q.push(Task::dispatch(
                    Some(own.clone()),
                    TriggerEvent::channel(ch.clone(), ev.entity.clone(), ev.data.clone())
                        .scoped(Scope::Set(set)),
                ));
            });
            binding.subscriptions.push(sub);
        }
        self.hot_keys += binding.hot_keys;
        tracing::debug!(
            entity = %owner,
            set = ?set,
            mask = ?binding.mask,
            subscriptions = binding.subscriptions.len(),
            "bound rule set"
        );
        self.entities.entry(owner.clone()).or_default().push(binding);
    }

    /// Reverse every binding of `owner`. Returns whether anything was bound.
    pub fn unbind(&mut self, owner: &str, bus: &mut EventBus, queue: &TaskQueue) -> bool {
        let Some(bindings) = self.entities.remove(owner) else {
            return false;
        };
        for binding in bindings {
            self.release(binding, bus);
        }
        let timers = self.timers.cancel_owner(owner);
        let tasks = queue.cancel_owner(owner);
        self.visibility.unwatch(owner);
        tracing::debug!(entity = %owner, timers, tasks, "unbound entity");
        true
    }

    /// Reverse the bindings of one rule set. Returns whether it was bound.
    pub fn unbind_set(&mut self, set: RuleSetId, bus: &mut EventBus, queue: &TaskQueue) -> bool {
        let Some((owner, pos)) = self.entities.iter().find_map(|(id, sets)| {
            sets.iter().position(|b| b.set == set).map(|p| (id.clone(), p))
        }) else {
            return false;
        };
        let Some(sets) = self.entities.get_mut(&owner) else {
            return false;
        };
        let binding = sets.remove(pos);
        let still_visible = sets
            .iter()
            .any(|b| b.mask.contains(TriggerMask::VISIBILITY));
        if sets.is_empty() {
            self.entities.remove(&owner);
        }
        if !still_visible {
            self.visibility.unwatch(owner.as_str());
        }
        self.release(binding, bus);
        queue.cancel_set(set);
        true
    }

    fn release(&mut self, binding: SetBinding, bus: &mut EventBus) {
        for sub in binding.subscriptions {
            bus.unlisten(sub);
        }
        self.hot_keys = self.hot_keys.saturating_sub(binding.hot_keys);
        self.timers.cancel_set(binding.set);
    }

    /// Forget pointer state for an entity that is going away.
    pub fn forget_entity(&mut self, id: &str) {
        self.pointer.forget(id);
    }

    /// Union of the element listeners `id` needs.
    pub fn bindings(&self, id: &str) -> TriggerMask {
        self.entities
            .get(id)
            .map_or(TriggerMask::empty(), |sets| {
                sets.iter().fold(TriggerMask::empty(), |m, b| m | b.mask)
            })
    }

    /// Rule sets bound for `id`, in binding order.
    pub fn bound_sets(&self, id: &str) -> Vec<RuleSetId> {
        self.entities
            .get(id)
            .map(|sets| sets.iter().map(|b| b.set).collect())
            .unwrap_or_default()
    }

    /// Whether anything is bound for `id`.
    pub fn is_bound(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Whether the single process-wide key listener is needed.
    pub fn wants_global_keys(&self) -> bool {
        self.hot_keys > 0
    }

    /// Number of bound `hotKey` rules.
    pub fn hot_key_rules(&self) -> usize {
        self.hot_keys
    }

    /// Pending `delay` timers.
    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    /// Advance the cooperative clock, queueing a scoped `delay` dispatch per elapsed timer.
    /// Returns how many timers fired.
    pub fn advance(&mut self, by: Duration, queue: &TaskQueue) -> usize {
        let elapsed = self.timers.advance(by);
        let n = elapsed.len();
        for e in elapsed {
            queue.push(Task::dispatch(
                Some(e.owner.clone()),
                TriggerEvent::from_source(TriggerKind::Delay, e.owner).scoped(Scope::Rule(e.rule)),
            ));
        }
        n
    }

    /// The pointer tracker.
    pub fn pointer(&self) -> &PointerTracker {
        &self.pointer
    }

    /// Replace the chain under the pointer; see [`PointerTracker::update_path`].
    pub fn update_pointer_path(&mut self, path: &[EntityId]) -> Vec<Crossing> {
        self.pointer.update_path(path)
    }

    /// Leave everything under the pointer.
    pub fn clear_pointer_path(&mut self) -> Vec<Crossing> {
        self.pointer.clear()
    }

    /// Report geometry for a watched entity; returns the trigger to dispatch, if any.
    pub fn update_intersection(
        &mut self,
        id: &str,
        element: Rect,
        viewport: Rect,
    ) -> Option<TriggerKind> {
        self.visibility
            .update(id, element, viewport)
            .map(|change| match change {
                VisibilityChange::Visible => TriggerKind::Visible,
                VisibilityChange::Hidden => TriggerKind::Hidden,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Probe, Rule, RuleTrigger};
    use noiir_timing::TimeValue;
    use serde_json::json;

    struct Rig {
        registry: RuleRegistry,
        bus: EventBus,
        queue: TaskQueue,
        manager: TriggerManager,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                registry: RuleRegistry::new(),
                bus: EventBus::new(),
                queue: TaskQueue::new(),
                manager: TriggerManager::new(0.1),
            }
        }

        fn mount(&mut self, id: &str, rules: Vec<Rule>) -> RuleSetId {
            let owner = EntityId::from(id);
            let set = self.registry.register(Some(&owner), rules);
            self.manager
                .bind(&owner, set, &self.registry, &mut self.bus, &self.queue);
            set
        }
    }

    #[test]
    fn mask_summarizes_element_listeners() {
        let mut rig = Rig::new();
        rig.mount(
            "btn",
            vec![
                Rule::new(RuleTrigger::Hover).to("hot"),
                Rule::new(TriggerKind::Click).to("on"),
                Rule::new(TriggerKind::HotKey).key("k"),
            ],
        );
        let mask = rig.manager.bindings("btn");
        assert!(mask.contains(TriggerMask::HOVER | TriggerMask::CLICK));
        assert!(!mask.contains(TriggerMask::KEY));
        assert!(rig.manager.wants_global_keys());
        assert_eq!(rig.manager.bindings("other"), TriggerMask::empty());
    }

    #[test]
    fn mount_rules_queue_one_scoped_task() {
        let mut rig = Rig::new();
        let set = rig.mount(
            "x",
            vec![
                Rule::new(TriggerKind::Mount).to("a"),
                Rule::new(TriggerKind::Mount).to("b"),
            ],
        );
        assert_eq!(rig.queue.len(), 1);
        let task = rig.queue.pop().unwrap();
        assert_eq!(task.rule_set(), Some(set));
        assert_eq!(task.owner.as_ref().map(EntityId::as_str), Some("x"));
    }

    #[test]
    fn probes_queue_per_rule() {
        let mut rig = Rig::new();
        rig.mount(
            "x",
            vec![
                Rule::new(Probe::new(|| true)).to("a"),
                Rule::new(Probe::new(|| false)).to("b"),
            ],
        );
        assert_eq!(rig.queue.len(), 2);
        assert!(matches!(rig.queue.pop().unwrap().kind, TaskKind::Probe(_)));
    }

    #[test]
    fn channel_subscription_enqueues_scoped_dispatch() {
        let mut rig = Rig::new();
        let set = rig.mount(
            "panel",
            vec![
                Rule::parse("menu:opened").unwrap().to("dim"),
                Rule::parse("menu:opened").unwrap().action(crate::rule::Action::Back),
            ],
        );
        assert_eq!(rig.bus.listener_count("menu:opened"), 1);
        rig.bus.emit("menu", "opened", json!({"depth": 1}));
        let task = rig.queue.pop().unwrap();
        let TaskKind::Dispatch(ev) = task.kind else {
            panic!("expected dispatch task");
        };
        assert_eq!(ev.kind, TriggerKind::Channel);
        assert_eq!(ev.channel.as_deref(), Some("menu:opened"));
        assert_eq!(ev.source.as_ref().map(EntityId::as_str), Some("menu"));
        assert_eq!(ev.scope, Some(Scope::Set(set)));
        assert_eq!(ev.data, json!({"depth": 1}));
    }

    #[test]
    fn unbind_reverses_everything() {
        let mut rig = Rig::new();
        rig.mount(
            "x",
            vec![
                Rule::parse("menu:opened").unwrap(),
                Rule::new(TriggerKind::HotKey),
                Rule::new(TriggerKind::Mount),
                Rule::new(TriggerKind::Delay).delay(TimeValue::from_millis(100.0)),
                Rule::new(TriggerKind::Visible),
            ],
        );
        assert!(!rig.bus.is_empty());
        assert_eq!(rig.manager.timers().len(), 1);
        assert!(rig.manager.unbind("x", &mut rig.bus, &rig.queue));
        assert!(rig.bus.is_empty());
        assert!(rig.queue.is_empty());
        assert!(rig.manager.timers().is_empty());
        assert!(!rig.manager.wants_global_keys());
        assert!(!rig.manager.is_bound("x"));
        assert_eq!(
            rig.manager
                .update_intersection("x", Rect::new(0., 0., 1., 1.), Rect::new(0., 0., 1., 1.)),
            None
        );
        assert!(!rig.manager.unbind("x", &mut rig.bus, &rig.queue));
    }

    #[test]
    fn unbind_set_keeps_sibling_sets() {
        let mut rig = Rig::new();
        let first = rig.mount("x", vec![Rule::new(TriggerKind::HotKey)]);
        rig.mount("x", vec![Rule::new(TriggerKind::Click)]);
        assert!(rig.manager.unbind_set(first, &mut rig.bus, &rig.queue));
        assert!(!rig.manager.unbind_set(first, &mut rig.bus, &rig.queue));
        assert!(!rig.manager.wants_global_keys());
        assert_eq!(rig.manager.bindings("x"), TriggerMask::CLICK);
        assert_eq!(rig.manager.bound_sets("x").len(), 1);
    }

    #[test]
    fn delay_timers_queue_rule_scoped_dispatch() {
        let mut rig = Rig::new();
        rig.mount(
            "toast",
            vec![Rule::new(TriggerKind::Delay)
                .delay(TimeValue::from_millis(200.0))
                .to("gone")],
        );
        assert_eq!(rig.manager.advance(Duration::from_millis(199), &rig.queue), 0);
        assert_eq!(rig.manager.advance(Duration::from_millis(1), &rig.queue), 1);
        let TaskKind::Dispatch(ev) = rig.queue.pop().unwrap().kind else {
            panic!("expected dispatch task");
        };
        assert_eq!(ev.kind, TriggerKind::Delay);
        assert!(matches!(ev.scope, Some(Scope::Rule(_))));
    }

    #[test]
    fn visibility_maps_to_triggers() {
        let mut rig = Rig::new();
        rig.mount("hero", vec![Rule::new(TriggerKind::Visible).to("shown")]);
        let view = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(
            rig.manager
                .update_intersection("hero", Rect::new(0.0, 0.0, 10.0, 10.0), view),
            Some(TriggerKind::Visible)
        );
        assert_eq!(
            rig.manager
                .update_intersection("hero", Rect::new(0.0, 500.0, 10.0, 510.0), view),
            Some(TriggerKind::Hidden)
        );
    }
}
