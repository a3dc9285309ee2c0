// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core identifiers and per-entity variant state.

use core::borrow::Borrow;
use core::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of the reserved bucket used for events with neither a target nor a source.
///
/// Also the entity id of window-level signals on the [event bus](crate::bus::EventBus).
pub const GLOBAL_ENTITY: &str = "global";

/// String key identifying an entity (a mounted frame) for its lifetime.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create an id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The reserved global bucket.
    pub fn global() -> Self {
        Self(GLOBAL_ENTITY.to_owned())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the reserved global bucket.
    pub fn is_global(&self) -> bool {
        self.0 == GLOBAL_ENTITY
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&EntityId> for EntityId {
    fn from(id: &EntityId) -> Self {
        id.clone()
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for EntityId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EntityId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which half of an entity's state a commit touched.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Layer {
    /// The persistent, semantic variant.
    Logical,
    /// The transient overlay (e.g. hover).
    Visual,
}

/// Variant state of one entity.
#[derive(Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct VariantState {
    /// Persistent, semantically meaningful variant; survives pointer-leave.
    pub logical: String,
    /// Transient overlay; `None` defers to `logical` for rendering.
    pub visual: Option<String>,
}

impl VariantState {
    /// A fresh state with no overlay.
    pub fn new(logical: impl Into<String>) -> Self {
        Self {
            logical: logical.into(),
            visual: None,
        }
    }

    /// The variant the renderer should show: the overlay if set, else the logical variant.
    pub fn active(&self) -> &str {
        self.visual.as_deref().unwrap_or(&self.logical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_prefers_visual_overlay() {
        let mut s = VariantState::new("idle");
        assert_eq!(s.active(), "idle");
        s.visual = Some("hoverIdle".into());
        assert_eq!(s.active(), "hoverIdle");
        assert_eq!(s.logical, "idle");
    }

    #[test]
    fn entity_id_compares_with_str() {
        let id = EntityId::from("btn");
        assert_eq!(id, "btn");
        assert!(!id.is_global());
        assert!(EntityId::global().is_global());
        assert_eq!(id.to_string(), "btn");
    }
}
