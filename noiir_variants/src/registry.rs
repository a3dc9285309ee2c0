// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rule registry: every currently-mounted rule in one flat, ordered list.
//!
//! ## Registration-time normalization
//!
//! [`RuleRegistry::register`] turns authored [`Rule`]s into [`RegisteredRule`]s once, so
//! the dispatcher never re-parses anything per event:
//!
//! - `hover` rules expand into a `pointerEnter` rule and a mirrored `pointerLeave` rule.
//! - Probe triggers become `custom` rules carrying their probe.
//! - With an owner, element-bound rules without a `sourceId` are scoped to the owner, and
//!   global rules (`hotKey`, `listen`, channel) without a `targetId` target the owner.
//!
//! Entries keep registration order across sets; this order is what "first match wins" and
//! "explicit rules in registration order" refer to.

use crate::rule::{Probe, Rule, RuleTrigger, Trigger, TriggerKind};
use crate::types::EntityId;

/// Handle of one registered rule set.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RuleSetId(u64);

/// Identity of one normalized rule: its set plus its position in the expanded set.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RuleId {
    /// Owning rule set.
    pub set: RuleSetId,
    /// Position within the normalized set.
    pub index: u32,
}

/// A rule after normalization.
#[derive(Clone, Debug)]
pub struct RegisteredRule {
    /// Stable identity.
    pub id: RuleId,
    /// Entity that registered the set, if any.
    pub owner: Option<EntityId>,
    /// Normalized trigger descriptor.
    pub trigger: Trigger,
    /// One-off predicate for probe-triggered rules.
    pub probe: Option<Probe>,
    /// The leave half of a guard-less `hover` rule: clears the overlay instead of
    /// committing a named variant.
    pub clears_overlay: bool,
    /// The normalized rule.
    pub rule: Rule,
}

/// Flat, ordered collection of all mounted rules.
#[derive(Clone, Debug, Default)]
pub struct RuleRegistry {
    next_set: u64,
    entries: Vec<RegisteredRule>,
}

impl RuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule set, normalizing each rule. Returns the set handle.
    ///
    /// Sets accumulate: registering the same rules twice makes them match twice.
    pub fn register<I>(&mut self, owner: Option<&EntityId>, rules: I) -> RuleSetId
    where
        I: IntoIterator<Item = Rule>,
    {
        self.next_set += 1;
        let set = RuleSetId(self.next_set);
        let mut index = 0_u32;
        let mut push = |entries: &mut Vec<RegisteredRule>, entry: Pending| {
            entries.push(RegisteredRule {
                id: RuleId { set, index },
                owner: owner.cloned(),
                trigger: entry.trigger,
                probe: entry.probe,
                clears_overlay: entry.clears_overlay,
                rule: entry.rule,
            });
            index += 1;
        };
        for rule in rules {
            for pending in expand(rule) {
                let pending = scope_to_owner(pending, owner);
                push(&mut self.entries, pending);
            }
        }
        tracing::trace!(set = set.0, owner = ?owner, "registered rule set");
        set
    }

    /// Remove a rule set. Returns whether anything was removed; unknown sets are a no-op.
    pub fn unregister(&mut self, set: RuleSetId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id.set != set);
        before != self.entries.len()
    }

    /// Remove every set registered by `owner`, returning the removed set handles.
    pub fn unregister_owner(&mut self, owner: &str) -> Vec<RuleSetId> {
        let mut removed: Vec<RuleSetId> = Vec::new();
        self.entries.retain(|e| {
            let owned = e.owner.as_ref().is_some_and(|o| o == owner);
            if owned && !removed.contains(&e.id.set) {
                removed.push(e.id.set);
            }
            !owned
        });
        removed
    }

    /// All rules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredRule> {
        self.entries.iter()
    }

    /// Rules belonging to `set`, in order.
    pub fn rules_of(&self, set: RuleSetId) -> impl Iterator<Item = &RegisteredRule> {
        self.entries.iter().filter(move |e| e.id.set == set)
    }

    /// Look up a single rule.
    pub fn get(&self, id: RuleId) -> Option<&RegisteredRule> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Whether any rule of `set` is registered.
    pub fn contains_set(&self, set: RuleSetId) -> bool {
        self.entries.iter().any(|e| e.id.set == set)
    }

    /// Number of normalized rules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct Pending {
    trigger: Trigger,
    probe: Option<Probe>,
    clears_overlay: bool,
    rule: Rule,
}

fn expand(rule: Rule) -> Vec<Pending> {
    match rule.trigger.clone() {
        RuleTrigger::Event(trigger) => vec![Pending {
            trigger,
            probe: None,
            clears_overlay: false,
            rule,
        }],
        RuleTrigger::Probe(probe) => vec![Pending {
            trigger: Trigger::new(TriggerKind::Custom),
            probe: Some(probe),
            clears_overlay: false,
            rule,
        }],
        RuleTrigger::Hover => {
            let mut enter = rule.clone();
            enter.trigger = TriggerKind::PointerEnter.into();
            let mut leave = rule;
            leave.trigger = TriggerKind::PointerLeave.into();
            leave.toggle = false;
            leave.toggle_variants.clear();
            // Leave mirrors enter: undo exactly what enter did.
            let clears_overlay = enter.toggle || enter.from_variant.is_none();
            if clears_overlay {
                leave.from_variant = None;
                leave.to_variant = None;
            } else {
                leave.from_variant = enter.to_variant.clone();
                leave.to_variant = enter.from_variant.clone();
            }
            vec![
                Pending {
                    trigger: Trigger::new(TriggerKind::PointerEnter),
                    probe: None,
                    clears_overlay: false,
                    rule: enter,
                },
                Pending {
                    trigger: Trigger::new(TriggerKind::PointerLeave),
                    probe: None,
                    clears_overlay,
                    rule: leave,
                },
            ]
        }
    }
}

fn scope_to_owner(mut pending: Pending, owner: Option<&EntityId>) -> Pending {
    let Some(owner) = owner else {
        return pending;
    };
    if pending.trigger.kind.is_element_bound() {
        if pending.rule.source_id.is_none() {
            pending.rule.source_id = Some(owner.clone());
        }
    } else if pending.rule.target_id.is_none() {
        pending.rule.target_id = Some(owner.clone());
    }
    pending
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(s: &str) -> EntityId {
        EntityId::from(s)
    }

    #[test]
    fn register_assigns_sequential_ids() {
        let mut r = RuleRegistry::new();
        let set = r.register(
            None,
            [
                Rule::new(TriggerKind::Click).to("a"),
                Rule::new(TriggerKind::Click).to("b"),
            ],
        );
        let idx: Vec<u32> = r.rules_of(set).map(|e| e.id.index).collect();
        assert_eq!(idx, vec![0, 1]);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn hover_expands_into_mirrored_pair() {
        let mut r = RuleRegistry::new();
        let o = owner("btn");
        r.register(Some(&o), [Rule::new(RuleTrigger::Hover).guard("idle").to("hot")]);
        let rules: Vec<&RegisteredRule> = r.iter().collect();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].trigger.kind, TriggerKind::PointerEnter);
        assert_eq!(rules[0].rule.from_variant.as_deref(), Some("idle"));
        assert_eq!(rules[0].rule.to_variant.as_deref(), Some("hot"));
        assert_eq!(rules[1].trigger.kind, TriggerKind::PointerLeave);
        assert_eq!(rules[1].rule.from_variant.as_deref(), Some("hot"));
        assert_eq!(rules[1].rule.to_variant.as_deref(), Some("idle"));
        assert!(!rules[1].clears_overlay);
    }

    #[test]
    fn unguarded_hover_leave_clears_overlay() {
        let mut r = RuleRegistry::new();
        r.register(None, [Rule::new(RuleTrigger::Hover).to("hot")]);
        let leave = r.iter().nth(1).unwrap();
        assert!(leave.clears_overlay);
        assert_eq!(leave.rule.to_variant, None);
    }

    #[test]
    fn owner_scopes_source_and_target() {
        let mut r = RuleRegistry::new();
        let o = owner("card");
        r.register(
            Some(&o),
            [
                Rule::new(TriggerKind::Click).to("open"),
                Rule::new(TriggerKind::HotKey).key("Escape").to("closed"),
                Rule::new(TriggerKind::Click).source("other").target("x"),
            ],
        );
        let rules: Vec<&RegisteredRule> = r.iter().collect();
        assert_eq!(rules[0].rule.source_id.as_ref(), Some(&o));
        assert_eq!(rules[0].rule.target_id, None);
        assert_eq!(rules[1].rule.source_id, None);
        assert_eq!(rules[1].rule.target_id.as_ref(), Some(&o));
        assert_eq!(rules[2].rule.source_id.as_ref().map(EntityId::as_str), Some("other"));
    }

    #[test]
    fn probe_rules_become_custom() {
        let mut r = RuleRegistry::new();
        r.register(None, [Rule::new(Probe::new(|| true)).to("ready")]);
        let e = r.iter().next().unwrap();
        assert_eq!(e.trigger.kind, TriggerKind::Custom);
        assert!(e.probe.as_ref().is_some_and(Probe::fire));
    }

    #[test]
    fn unregister_is_idempotent_and_scoped() {
        let mut r = RuleRegistry::new();
        let a = r.register(None, [Rule::new(TriggerKind::Click)]);
        let b = r.register(None, [Rule::new(TriggerKind::Click)]);
        assert!(r.unregister(a));
        assert!(!r.unregister(a));
        assert!(r.contains_set(b));
        assert!(!r.contains_set(a));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn unregister_owner_removes_all_sets() {
        let mut r = RuleRegistry::new();
        let o = owner("x");
        let s1 = r.register(Some(&o), [Rule::new(TriggerKind::Click)]);
        let s2 = r.register(Some(&o), [Rule::new(TriggerKind::Focus)]);
        let keep = r.register(Some(&owner("y")), [Rule::new(TriggerKind::Click)]);
        assert_eq!(r.unregister_owner("x"), vec![s1, s2]);
        assert!(r.unregister_owner("x").is_empty());
        assert!(r.contains_set(keep));
    }
}
