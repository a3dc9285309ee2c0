// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer path tracking: derive `pointerEnter`/`pointerLeave` from path changes.
//!
//! The host reports the root→target chain of entities under the pointer after each move.
//! [`PointerTracker::update_path`] returns the minimal sequence of crossings from the
//! previous chain to the new one.
//!
//! ```
//! use noiir_variants::triggers::pointer::{Crossing, PointerTracker};
//!
//! let mut p = PointerTracker::new();
//! p.update_path(&["page".into(), "card".into()]);
//! assert_eq!(
//!     p.update_path(&["page".into(), "menu".into()]),
//!     vec![Crossing::Leave("card".into()), Crossing::Enter("menu".into())]
//! );
//! ```

use crate::types::EntityId;

/// A pointer boundary crossing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Crossing {
    /// The pointer entered the entity (outer→inner order).
    Enter(EntityId),
    /// The pointer left the entity (inner→outer order).
    Leave(EntityId),
}

/// Tracks the root→target chain currently under the pointer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PointerTracker {
    current: Vec<EntityId>,
}

impl PointerTracker {
    /// Create a tracker with nothing under the pointer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current root→target chain.
    pub fn current_path(&self) -> &[EntityId] {
        &self.current
    }

    /// Whether `id` is currently under the pointer.
    pub fn contains(&self, id: &str) -> bool {
        self.current.iter().any(|e| e == id)
    }

    /// Replace the chain, returning leaves (inner→outer) then enters (outer→inner).
    pub fn update_path(&mut self, new_path: &[EntityId]) -> Vec<Crossing> {
        let shared = self
            .current
            .iter()
            .zip(new_path)
            .take_while(|(a, b)| a == b)
            .count();
        let mut out: Vec<Crossing> = self.current[shared..]
            .iter()
            .rev()
            .cloned()
            .map(Crossing::Leave)
            .collect();
        out.extend(new_path[shared..].iter().cloned().map(Crossing::Enter));
        self.current = new_path.to_vec();
        out
    }

    /// Leave everything, inner→outer.
    pub fn clear(&mut self) -> Vec<Crossing> {
        self.update_path(&[])
    }

    /// Forget `id` and everything beneath it without emitting crossings.
    ///
    /// Used when an entity unmounts while hovered.
    pub fn forget(&mut self, id: &str) {
        if let Some(pos) = self.current.iter().position(|e| e == id) {
            self.current.truncate(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(ids: &[&str]) -> Vec<EntityId> {
        ids.iter().map(|s| EntityId::from(*s)).collect()
    }

    fn enter(s: &str) -> Crossing {
        Crossing::Enter(s.into())
    }

    fn leave(s: &str) -> Crossing {
        Crossing::Leave(s.into())
    }

    #[test]
    fn fresh_path_enters_outer_to_inner() {
        let mut p = PointerTracker::new();
        assert_eq!(
            p.update_path(&path(&["a", "b", "c"])),
            vec![enter("a"), enter("b"), enter("c")]
        );
        assert_eq!(p.current_path(), path(&["a", "b", "c"]).as_slice());
    }

    #[test]
    fn sibling_move_leaves_then_enters() {
        let mut p = PointerTracker::new();
        p.update_path(&path(&["a", "b", "c"]));
        assert_eq!(
            p.update_path(&path(&["a", "d"])),
            vec![leave("c"), leave("b"), enter("d")]
        );
    }

    #[test]
    fn same_path_is_quiet() {
        let mut p = PointerTracker::new();
        p.update_path(&path(&["a", "b"]));
        assert!(p.update_path(&path(&["a", "b"])).is_empty());
        assert!(p.contains("b"));
    }

    #[test]
    fn clear_leaves_inner_to_outer() {
        let mut p = PointerTracker::new();
        p.update_path(&path(&["a", "b"]));
        assert_eq!(p.clear(), vec![leave("b"), leave("a")]);
        assert!(p.current_path().is_empty());
    }

    #[test]
    fn forget_truncates_silently() {
        let mut p = PointerTracker::new();
        p.update_path(&path(&["a", "b", "c"]));
        p.forget("b");
        assert_eq!(p.current_path(), path(&["a"]).as_slice());
        p.forget("zzz");
        assert_eq!(p.current_path().len(), 1);
    }
}
