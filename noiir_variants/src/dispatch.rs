// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rule dispatcher: turns one normalized trigger into state commits and actions.
//!
//! ## Resolution
//!
//! 1. Select registered rules whose trigger kind matches, whose `sourceId` (if any) equals
//!    the event source, and whose kind-specific fields match (channel, key, listen
//!    id/variant, custom event name). An optional [`Scope`] restricts matching further.
//! 2. Group by effective target: `targetId`, else the event source, else the
//!    [global bucket](crate::types::GLOBAL_ENTITY). Targets unknown to the store are
//!    dropped.
//! 3. Visual triggers (`pointerEnter`/`pointerLeave`): rules are tried in registration
//!    order against the target's active (visual-or-logical) variant; the first whose guard
//!    passes runs its action and commits the overlay. The rest are not evaluated.
//! 4. Logical triggers: guards are evaluated against the target's logical variant as it
//!    was before this dispatch. Every guard-passing explicit rule runs its action; the
//!    first of them whose destination differs from the current variant commits. Toggle
//!    rules are only considered when no explicit rule changed the variant, and follow the
//!    same run-all-actions, first-change-commits policy.
//!
//! Actions run before their rule's commit. The dispatcher does not schedule anything; it
//! returns the [`Commit`]s and the engine turns them into deferred `listen` triggers.

use serde_json::Value;

use crate::action::{ActionExecutor, ActionHost};
use crate::registry::{RegisteredRule, RuleId, RuleRegistry, RuleSetId};
use crate::rule::TriggerKind;
use crate::store::VariantStore;
use crate::types::{EntityId, Layer};

/// Restricts a dispatch to part of the registry.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Scope {
    /// Only rules of this set.
    Set(RuleSetId),
    /// Only this rule.
    Rule(RuleId),
}

/// A normalized trigger tuple: `(source, kind, payload)`.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerEvent {
    /// Trigger kind.
    pub kind: TriggerKind,
    /// Originating entity, if any.
    pub source: Option<EntityId>,
    /// Bus channel for [`TriggerKind::Channel`].
    pub channel: Option<String>,
    /// Key for keyboard triggers.
    pub key: Option<String>,
    /// Entity that committed, for [`TriggerKind::Listen`].
    pub listen_id: Option<EntityId>,
    /// Variant that was committed, for [`TriggerKind::Listen`].
    pub listen_variant: Option<String>,
    /// Event name for [`TriggerKind::Custom`].
    pub event: Option<String>,
    /// Optional restriction to a rule set or a single rule.
    pub scope: Option<Scope>,
    /// Free-form payload (bus data, signal details).
    pub data: Value,
}

impl TriggerEvent {
    /// An event of `kind` with no source or payload.
    pub fn new(kind: TriggerKind) -> Self {
        Self {
            kind,
            source: None,
            channel: None,
            key: None,
            listen_id: None,
            listen_variant: None,
            event: None,
            scope: None,
            data: Value::Null,
        }
    }

    /// An element-originated event.
    pub fn from_source(kind: TriggerKind, source: impl Into<EntityId>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::new(kind)
        }
    }

    /// Key pressed on the focused element `source`.
    pub fn key(source: impl Into<EntityId>, key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::from_source(TriggerKind::Key, source)
        }
    }

    /// Key pressed anywhere.
    pub fn hot_key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::new(TriggerKind::HotKey)
        }
    }

    /// `entity` committed `variant`.
    pub fn listen(entity: &EntityId, variant: impl Into<String>) -> Self {
        Self {
            listen_id: Some(entity.clone()),
            listen_variant: Some(variant.into()),
            ..Self::from_source(TriggerKind::Listen, entity.clone())
        }
    }

    /// A bus event arrived on `channel`.
    pub fn channel(channel: impl Into<String>, source: impl Into<EntityId>, data: Value) -> Self {
        Self {
            channel: Some(channel.into()),
            data,
            ..Self::from_source(TriggerKind::Channel, source)
        }
    }

    /// Caller-fired custom event `name` on `source`.
    pub fn custom(source: impl Into<EntityId>, name: Option<&str>) -> Self {
        Self {
            event: name.map(str::to_owned),
            ..Self::from_source(TriggerKind::Custom, source)
        }
    }

    /// Restrict to `scope`.
    pub fn scoped(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// A variant change that actually modified the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    /// Changed entity.
    pub entity: EntityId,
    /// Which half of its state changed.
    pub layer: Layer,
    /// New value: the logical variant, or the overlay (`None` when cleared).
    pub variant: Option<String>,
    /// Rule that caused the change.
    pub rule: RuleId,
}

/// Whether `entry` reacts to `event` (step 1 of resolution).
pub fn matches(entry: &RegisteredRule, event: &TriggerEvent) -> bool {
    match event.scope {
        Some(Scope::Set(set)) if entry.id.set != set => return false,
        Some(Scope::Rule(id)) if entry.id != id => return false,
        _ => {}
    }
    if entry.trigger.kind != event.kind {
        return false;
    }
    // Probe rules only fire through their own scoped dispatch.
    if entry.probe.is_some() && event.scope != Some(Scope::Rule(entry.id)) {
        return false;
    }
    let rule = &entry.rule;
    if let Some(src) = &rule.source_id
        && event.source.as_ref() != Some(src)
    {
        return false;
    }
    match event.kind {
        TriggerKind::Channel => entry.trigger.channel == event.channel,
        TriggerKind::Key | TriggerKind::HotKey => rule.matches_key(event.key.as_deref()),
        TriggerKind::Listen => {
            let id_ok = rule
                .listen_id
                .as_ref()
                .is_none_or(|id| event.listen_id.as_ref() == Some(id));
            let variant_ok = rule
                .listen_variant
                .as_deref()
                .is_none_or(|v| event.listen_variant.as_deref() == Some(v));
            id_ok && variant_ok
        }
        TriggerKind::Custom => rule
            .event
            .as_deref()
            .is_none_or(|name| event.event.as_deref() == Some(name)),
        _ => true,
    }
}

/// Resolve `event` against `registry`, commit into `store`, and run actions.
///
/// Returns the commits that actually changed the store, in order.
pub fn dispatch<H: ActionHost>(
    event: &TriggerEvent,
    store: &mut VariantStore,
    registry: &RuleRegistry,
    executor: &mut ActionExecutor<H>,
) -> Vec<Commit> {
    let groups = group_by_target(event, registry);
    tracing::trace!(trigger = ?event.kind, source = ?event.source, targets = groups.len(), "dispatch");
    let mut commits = Vec::new();
    for (target, rules) in groups {
        if !store.contains(target.as_str()) {
            tracing::debug!(entity = %target, trigger = ?event.kind, "dropping trigger for unknown target");
            continue;
        }
        if event.kind.is_visual() {
            resolve_visual(&target, &rules, store, executor, &mut commits);
        } else {
            resolve_logical(&target, &rules, store, executor, &mut commits);
        }
    }
    commits
}

fn group_by_target<'a>(
    event: &TriggerEvent,
    registry: &'a RuleRegistry,
) -> Vec<(EntityId, Vec<&'a RegisteredRule>)> {
    let mut groups: Vec<(EntityId, Vec<&'a RegisteredRule>)> = Vec::new();
    for entry in registry.iter().filter(|e| matches(e, event)) {
        let target = entry
            .rule
            .target_id
            .clone()
            .or_else(|| event.source.clone())
            .unwrap_or_else(EntityId::global);
        match groups.iter_mut().find(|(t, _)| *t == target) {
            Some((_, rules)) => rules.push(entry),
            None => groups.push((target, vec![entry])),
        }
    }
    groups
}

fn resolve_visual<H: ActionHost>(
    target: &EntityId,
    rules: &[&RegisteredRule],
    store: &mut VariantStore,
    executor: &mut ActionExecutor<H>,
    commits: &mut Vec<Commit>,
) {
    let Some(state) = store.get(target.as_str()) else {
        return;
    };
    let relevant = state.active().to_owned();
    let Some(entry) = rules.iter().find(|e| e.rule.guard_passes(&relevant)) else {
        return;
    };
    executor.execute(&entry.rule);
    let destination = if entry.clears_overlay {
        None
    } else {
        match entry.rule.destination(&relevant) {
            Some(d) => Some(d.to_owned()),
            None => return,
        }
    };
    if store.set_visual(target.as_str(), destination.as_deref()) {
        let variant = store
            .get(target.as_str())
            .and_then(|s| s.visual.clone());
        commits.push(Commit {
            entity: target.clone(),
            layer: Layer::Visual,
            variant,
            rule: entry.id,
        });
    }
}

fn resolve_logical<H: ActionHost>(
    target: &EntityId,
    rules: &[&RegisteredRule],
    store: &mut VariantStore,
    executor: &mut ActionExecutor<H>,
    commits: &mut Vec<Commit>,
) {
    let Some(state) = store.get(target.as_str()) else {
        return;
    };
    let before = state.logical.clone();
    let (toggles, explicit): (Vec<&RegisteredRule>, Vec<&RegisteredRule>) =
        rules.iter().copied().partition(|e| e.rule.toggle);

    let changed = apply_pass(target, &explicit, &before, store, executor, commits);
    if !changed {
        apply_pass(target, &toggles, &before, store, executor, commits);
    }
}

/// Run every guard-passing rule's action; the first that changes the variant commits.
/// Returns whether the store changed.
fn apply_pass<H: ActionHost>(
    target: &EntityId,
    rules: &[&RegisteredRule],
    before: &str,
    store: &mut VariantStore,
    executor: &mut ActionExecutor<H>,
    commits: &mut Vec<Commit>,
) -> bool {
    let mut changed = false;
    for entry in rules.iter().filter(|e| e.rule.guard_passes(before)) {
        executor.execute(&entry.rule);
        if changed {
            continue;
        }
        let Some(destination) = entry.rule.destination(before) else {
            continue;
        };
        if store.set_logical(target.as_str(), destination) {
            changed = true;
            commits.push(Commit {
                entity: target.clone(),
                layer: Layer::Logical,
                variant: Some(destination.to_owned()),
                rule: entry.id,
            });
        }
    }
    changed
}
