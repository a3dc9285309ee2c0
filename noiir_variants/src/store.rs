// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Variant state store: the only mutable truth about which variant an entity is in.
//!
//! Reads are always the last committed write. Registration and removal are public;
//! the setters are crate-private so that only the [dispatcher](crate::dispatch) commits.

use std::collections::BTreeMap;

use crate::types::{EntityId, VariantState};

/// Map from entity id to its logical variant and visual overlay.
#[derive(Clone, Debug, Default)]
pub struct VariantStore {
    entries: BTreeMap<EntityId, VariantState>,
}

impl VariantStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` with an initial logical variant and no overlay.
    ///
    /// Registering an id twice replaces the previous state (last registration wins).
    pub fn register(&mut self, id: EntityId, initial: impl Into<String>) {
        self.entries.insert(id, VariantState::new(initial));
    }

    /// Remove `id`. Returns whether it was present; unknown ids are a no-op.
    pub fn unregister(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Current state of `id`.
    pub fn get(&self, id: &str) -> Option<&VariantState> {
        self.entries.get(id)
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entity is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &VariantState)> {
        self.entries.iter()
    }

    /// Commit a logical variant. Returns whether the stored value changed.
    ///
    /// A change also clears the visual overlay.
    pub(crate) fn set_logical(&mut self, id: &str, variant: &str) -> bool {
        let Some(state) = self.entries.get_mut(id) else {
            return false;
        };
        if state.logical == variant {
            return false;
        }
        state.logical = variant.to_owned();
        state.visual = None;
        true
    }

    /// Commit a visual overlay. Returns whether the stored value changed.
    ///
    /// An overlay equal to the logical variant is stored as `None`.
    pub(crate) fn set_visual(&mut self, id: &str, variant: Option<&str>) -> bool {
        let Some(state) = self.entries.get_mut(id) else {
            return false;
        };
        let next = variant.filter(|v| *v != state.logical);
        if state.visual.as_deref() == next {
            return false;
        }
        state.visual = next.map(str::to_owned);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_read_back() {
        let mut s = VariantStore::new();
        s.register("btn".into(), "idle");
        assert_eq!(s.get("btn"), Some(&VariantState::new("idle")));
        assert!(s.contains("btn"));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn duplicate_registration_last_wins() {
        let mut s = VariantStore::new();
        s.register("x".into(), "a");
        s.register("x".into(), "b");
        assert_eq!(s.get("x").unwrap().logical, "b");
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut s = VariantStore::new();
        s.register("x".into(), "a");
        assert!(s.unregister("x"));
        assert!(!s.unregister("x"));
        assert!(!s.unregister("never"));
        assert!(s.is_empty());
    }

    #[test]
    fn logical_commit_clears_overlay() {
        let mut s = VariantStore::new();
        s.register("x".into(), "a");
        assert!(s.set_visual("x", Some("hover")));
        assert!(s.set_logical("x", "b"));
        let st = s.get("x").unwrap();
        assert_eq!(st.logical, "b");
        assert_eq!(st.visual, None);
    }

    #[test]
    fn unchanged_commits_report_false() {
        let mut s = VariantStore::new();
        s.register("x".into(), "a");
        assert!(!s.set_logical("x", "a"));
        assert!(!s.set_visual("x", None));
        assert!(s.set_visual("x", Some("h")));
        assert!(!s.set_visual("x", Some("h")));
    }

    #[test]
    fn overlay_equal_to_logical_is_cleared() {
        let mut s = VariantStore::new();
        s.register("btn".into(), "idle");
        s.set_visual("btn", Some("hoverIdle"));
        assert!(s.set_visual("btn", Some("idle")));
        assert_eq!(s.get("btn").unwrap().visual, None);
    }

    #[test]
    fn setters_ignore_unknown_ids() {
        let mut s = VariantStore::new();
        assert!(!s.set_logical("ghost", "a"));
        assert!(!s.set_visual("ghost", Some("a")));
        assert!(s.is_empty());
    }
}
