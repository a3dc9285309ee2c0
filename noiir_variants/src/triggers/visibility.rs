// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewport intersection watcher for `visible`/`hidden` triggers.
//!
//! The host reports each watched element's bounds and the viewport in a shared coordinate
//! space. An element intersects when the visible fraction of its area reaches the
//! threshold. Only transitions are reported: into intersection yields
//! [`VisibilityChange::Visible`], out of it [`VisibilityChange::Hidden`].

use std::collections::BTreeMap;

use kurbo::Rect;

use crate::types::EntityId;

/// A crossing of the visibility threshold.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VisibilityChange {
    /// The element started intersecting the viewport.
    Visible,
    /// The element stopped intersecting the viewport.
    Hidden,
}

/// Fraction of `element`'s area that lies inside `viewport`, in `[0, 1]`.
///
/// A degenerate (zero-area) element counts as fully visible when the viewport contains
/// its center.
pub fn intersection_ratio(element: Rect, viewport: Rect) -> f64 {
    let element = element.abs();
    let viewport = viewport.abs();
    let area = element.area();
    if area <= 0.0 {
        return if viewport.contains(element.center()) {
            1.0
        } else {
            0.0
        };
    }
    let overlap = element.intersect(viewport).area();
    (overlap / area).clamp(0.0, 1.0)
}

/// Per-entity intersection state.
#[derive(Clone, Debug)]
pub struct VisibilityWatcher {
    threshold: f64,
    intersecting: BTreeMap<EntityId, bool>,
}

impl VisibilityWatcher {
    /// Create a watcher with the given threshold in `(0, 1]`.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            intersecting: BTreeMap::new(),
        }
    }

    /// The visibility threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Start watching `id`; it starts out not intersecting.
    pub fn watch(&mut self, id: EntityId) {
        self.intersecting.entry(id).or_insert(false);
    }

    /// Stop watching `id`. Returns whether it was watched.
    pub fn unwatch(&mut self, id: &str) -> bool {
        self.intersecting.remove(id).is_some()
    }

    /// Whether `id` is watched.
    pub fn is_watched(&self, id: &str) -> bool {
        self.intersecting.contains_key(id)
    }

    /// Whether `id` currently counts as intersecting.
    pub fn is_intersecting(&self, id: &str) -> bool {
        self.intersecting.get(id).copied().unwrap_or(false)
    }

    /// Report new geometry for `id`. Returns the threshold crossing, if any.
    ///
    /// Unwatched ids are ignored.
    pub fn update(&mut self, id: &str, element: Rect, viewport: Rect) -> Option<VisibilityChange> {
        let threshold = self.threshold;
        let state = self.intersecting.get_mut(id)?;
        let ratio = intersection_ratio(element, viewport);
        let now = ratio > 0.0 && ratio >= threshold;
        if now == *state {
            return None;
        }
        *state = now;
        Some(if now {
            VisibilityChange::Visible
        } else {
            VisibilityChange::Hidden
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: Rect = Rect::new(0.0, 0.0, 100.0, 100.0);

    #[test]
    fn ratio_of_partial_overlap() {
        let r = intersection_ratio(Rect::new(50.0, 0.0, 150.0, 100.0), VIEW);
        assert!((r - 0.5).abs() < 1e-9);
        assert_eq!(intersection_ratio(Rect::new(200.0, 0.0, 300.0, 10.0), VIEW), 0.0);
    }

    #[test]
    fn degenerate_element_uses_center() {
        assert_eq!(intersection_ratio(Rect::new(10.0, 10.0, 10.0, 10.0), VIEW), 1.0);
        assert_eq!(intersection_ratio(Rect::new(500.0, 10.0, 500.0, 10.0), VIEW), 0.0);
    }

    #[test]
    fn reports_only_transitions() {
        let mut w = VisibilityWatcher::new(0.1);
        w.watch("card".into());
        let off = Rect::new(0.0, 200.0, 100.0, 300.0);
        let on = Rect::new(0.0, 50.0, 100.0, 150.0);
        assert_eq!(w.update("card", off, VIEW), None);
        assert_eq!(w.update("card", on, VIEW), Some(VisibilityChange::Visible));
        assert_eq!(w.update("card", on, VIEW), None);
        assert!(w.is_intersecting("card"));
        assert_eq!(w.update("card", off, VIEW), Some(VisibilityChange::Hidden));
        assert_eq!(w.update("card", off, VIEW), None);
    }

    #[test]
    fn threshold_is_respected() {
        let mut w = VisibilityWatcher::new(0.5);
        w.watch("x".into());
        // 10% visible.
        let sliver = Rect::new(0.0, 90.0, 100.0, 190.0);
        assert_eq!(w.update("x", sliver, VIEW), None);
        let half = Rect::new(0.0, 50.0, 100.0, 150.0);
        assert_eq!(w.update("x", half, VIEW), Some(VisibilityChange::Visible));
    }

    #[test]
    fn unwatched_ids_are_ignored() {
        let mut w = VisibilityWatcher::new(0.1);
        assert_eq!(w.update("ghost", VIEW, VIEW), None);
        w.watch("x".into());
        assert!(w.unwatch("x"));
        assert!(!w.unwatch("x"));
        assert!(!w.is_watched("x"));
    }
}
