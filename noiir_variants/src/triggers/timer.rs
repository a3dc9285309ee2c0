// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot timers for `delay` triggers on a cooperative clock.
//!
//! The host advances the clock explicitly; nothing here reads wall time.

use core::time::Duration;

use crate::registry::{RuleId, RuleSetId};
use crate::types::EntityId;

/// A timer that elapsed during [`Timers::advance`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Elapsed {
    /// Entity the timer was bound for.
    pub owner: EntityId,
    /// The `delay` rule to fire.
    pub rule: RuleId,
}

#[derive(Clone, Debug)]
struct Pending {
    seq: u64,
    due: Duration,
    owner: EntityId,
    rule: RuleId,
}

/// Pending one-shot timers.
#[derive(Clone, Debug, Default)]
pub struct Timers {
    now: Duration,
    seq: u64,
    pending: Vec<Pending>,
}

impl Timers {
    /// Create an idle clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Fire `rule` for `owner` once, `after` from now.
    pub fn schedule(&mut self, owner: EntityId, rule: RuleId, after: Duration) {
        self.seq += 1;
        self.pending.push(Pending {
            seq: self.seq,
            due: self.now.saturating_add(after),
            owner,
            rule,
        });
    }

    /// Move the clock forward and return the timers that came due, ordered by due time
    /// and then by scheduling order.
    pub fn advance(&mut self, by: Duration) -> Vec<Elapsed> {
        self.now = self.now.saturating_add(by);
        let now = self.now;
        let mut due: Vec<Pending> = Vec::new();
        self.pending.retain(|p| {
            if p.due <= now {
                due.push(p.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|p| (p.due, p.seq));
        due.into_iter()
            .map(|p| Elapsed {
                owner: p.owner,
                rule: p.rule,
            })
            .collect()
    }

    /// Cancel every timer owned by `owner`.
    pub fn cancel_owner(&mut self, owner: &str) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| p.owner != owner);
        before - self.pending.len()
    }

    /// Cancel every timer of rule set `set`.
    pub fn cancel_set(&mut self, set: RuleSetId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| p.rule.set != set);
        before - self.pending.len()
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no timer is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RuleRegistry;
    use crate::rule::{Rule, TriggerKind};

    fn rule_ids(n: usize) -> Vec<RuleId> {
        let mut r = RuleRegistry::new();
        let set = r.register(None, (0..n).map(|_| Rule::new(TriggerKind::Delay)));
        r.rules_of(set).map(|e| e.id).collect()
    }

    #[test]
    fn fires_in_due_order() {
        let ids = rule_ids(3);
        let mut t = Timers::new();
        t.schedule("a".into(), ids[0], Duration::from_millis(300));
        t.schedule("b".into(), ids[1], Duration::from_millis(100));
        t.schedule("c".into(), ids[2], Duration::from_millis(100));
        assert!(t.advance(Duration::from_millis(50)).is_empty());
        let fired: Vec<RuleId> = t
            .advance(Duration::from_millis(300))
            .into_iter()
            .map(|e| e.rule)
            .collect();
        assert_eq!(fired, vec![ids[1], ids[2], ids[0]]);
        assert!(t.is_empty());
        assert_eq!(t.now(), Duration::from_millis(350));
    }

    #[test]
    fn zero_delay_fires_on_next_advance() {
        let ids = rule_ids(1);
        let mut t = Timers::new();
        t.schedule("a".into(), ids[0], Duration::ZERO);
        assert_eq!(t.advance(Duration::ZERO).len(), 1);
    }

    #[test]
    fn cancellation_by_owner_and_set() {
        let ids = rule_ids(2);
        let mut t = Timers::new();
        t.schedule("a".into(), ids[0], Duration::from_millis(10));
        t.schedule("b".into(), ids[1], Duration::from_millis(10));
        assert_eq!(t.cancel_owner("a"), 1);
        assert_eq!(t.cancel_owner("a"), 0);
        assert_eq!(t.cancel_set(ids[1].set), 1);
        assert!(t.advance(Duration::from_secs(1)).is_empty());
    }
}
