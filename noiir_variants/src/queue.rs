// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred task queue.
//!
//! Work that must observe post-commit state (listen propagation, mount triggers, probes,
//! bus-delivered channel triggers) is pushed here and drained by the engine after the
//! synchronous commit phase of the outer call that produced it.
//!
//! The queue is a cheap shared handle so that bus callbacks can enqueue without holding
//! a borrow of the engine. Tasks are owned by an entity so that teardown can cancel them.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::dispatch::{Scope, TriggerEvent};
use crate::registry::{RuleId, RuleSetId};
use crate::types::EntityId;

/// What a deferred task does when drained.
#[derive(Clone, Debug, PartialEq)]
pub enum TaskKind {
    /// Run the dispatcher on this trigger.
    Dispatch(TriggerEvent),
    /// Evaluate the probe of this rule; fire it as a scoped `custom` trigger if it holds.
    Probe(RuleId),
}

/// One deferred unit of work.
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    /// Entity whose teardown cancels this task; `None` for tasks nobody owns.
    pub owner: Option<EntityId>,
    /// The work.
    pub kind: TaskKind,
}

impl Task {
    /// A deferred dispatch owned by `owner`.
    pub fn dispatch(owner: Option<EntityId>, event: TriggerEvent) -> Self {
        Self {
            owner,
            kind: TaskKind::Dispatch(event),
        }
    }

    /// Rule set this task is scoped to, if any.
    pub fn rule_set(&self) -> Option<RuleSetId> {
        match &self.kind {
            TaskKind::Probe(id) => Some(id.set),
            TaskKind::Dispatch(ev) => match ev.scope {
                Some(Scope::Set(set)) => Some(set),
                Some(Scope::Rule(id)) => Some(id.set),
                None => None,
            },
        }
    }
}

/// FIFO of deferred tasks, shared by handle.
#[derive(Clone, Debug, Default)]
pub struct TaskQueue {
    inner: Rc<RefCell<VecDeque<Task>>>,
}

impl TaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task.
    pub fn push(&self, task: Task) {
        self.inner.borrow_mut().push_back(task);
    }

    /// Take the oldest task.
    pub fn pop(&self) -> Option<Task> {
        self.inner.borrow_mut().pop_front()
    }

    /// Drop every pending task owned by `owner`. Returns how many were dropped.
    pub fn cancel_owner(&self, owner: &str) -> usize {
        let mut q = self.inner.borrow_mut();
        let before = q.len();
        q.retain(|t| t.owner.as_ref().is_none_or(|o| o != owner));
        before - q.len()
    }

    /// Drop every pending task scoped to rule set `set`.
    pub fn cancel_set(&self, set: RuleSetId) -> usize {
        let mut q = self.inner.borrow_mut();
        let before = q.len();
        q.retain(|t| t.rule_set() != Some(set));
        before - q.len()
    }

    /// Drop every pending task.
    pub fn clear(&self) -> usize {
        let mut q = self.inner.borrow_mut();
        let n = q.len();
        q.clear();
        n
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::TriggerKind;

    fn mount(id: &str) -> Task {
        Task::dispatch(
            Some(id.into()),
            TriggerEvent::from_source(TriggerKind::Mount, id),
        )
    }

    #[test]
    fn fifo_order() {
        let q = TaskQueue::new();
        q.push(mount("a"));
        q.push(mount("b"));
        assert_eq!(q.pop(), Some(mount("a")));
        assert_eq!(q.pop(), Some(mount("b")));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn handles_share_storage() {
        let q = TaskQueue::new();
        let h = q.clone();
        h.push(mount("a"));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn cancel_owner_keeps_others() {
        let q = TaskQueue::new();
        q.push(mount("a"));
        q.push(mount("b"));
        q.push(mount("a"));
        q.push(Task::dispatch(None, TriggerEvent::hot_key("x")));
        assert_eq!(q.cancel_owner("a"), 2);
        assert_eq!(q.len(), 2);
        assert_eq!(q.cancel_owner("a"), 0);
        assert_eq!(q.clear(), 2);
        assert!(q.is_empty());
    }

    #[test]
    fn cancel_set_matches_scoped_tasks() {
        let mut registry = crate::registry::RuleRegistry::new();
        let a = registry.register(None, [crate::rule::Rule::new(TriggerKind::Mount)]);
        let b = registry.register(None, [crate::rule::Rule::new(TriggerKind::Mount)]);
        let q = TaskQueue::new();
        let scoped = |set| {
            Task::dispatch(
                None,
                TriggerEvent::from_source(TriggerKind::Mount, "x").scoped(Scope::Set(set)),
            )
        };
        q.push(scoped(a));
        q.push(scoped(b));
        q.push(mount("x"));
        assert_eq!(q.cancel_set(a), 1);
        assert_eq!(q.pop(), Some(scoped(b)));
        assert_eq!(q.pop().and_then(|t| t.rule_set()), None);
    }
}
