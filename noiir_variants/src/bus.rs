// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cross-entity event bus.
//!
//! ## Overview
//!
//! A publish/subscribe channel keyed by `"<entity>:<event>"`. It decouples "rule belongs to
//! entity A" from "event consumed by entity B": the trigger manager subscribes cross-frame
//! rules here, and the engine publishes every committed change on `"<entity>:change"`.
//!
//! Window-level signals use the reserved [`GLOBAL_ENTITY`] id via [`EventBus::emit_global`].
//!
//! Delivery is synchronous and, per channel, in subscription order; each listener sees
//! events in emission order.
//!
//! ```
//! use std::{cell::RefCell, rc::Rc};
//! use noiir_variants::bus::EventBus;
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let mut bus = EventBus::new();
//! let sink = seen.clone();
//! let sub = bus.listen("menu:opened", move |ev| sink.borrow_mut().push(ev.data.clone()));
//! bus.emit("menu", "opened", serde_json::json!(1));
//! bus.unlisten(sub);
//! bus.emit("menu", "opened", serde_json::json!(2));
//! assert_eq!(*seen.borrow(), vec![serde_json::json!(1)]);
//! ```

use std::collections::BTreeMap;

use serde_json::Value;

use crate::types::{EntityId, GLOBAL_ENTITY};

/// Build the channel key for an entity-scoped event.
pub fn channel_key(entity: &str, event: &str) -> String {
    format!("{entity}:{event}")
}

/// An event delivered to bus listeners.
#[derive(Clone, Debug, PartialEq)]
pub struct BusEvent {
    /// Emitting entity ([`GLOBAL_ENTITY`] for window-level signals).
    pub entity: EntityId,
    /// Event name.
    pub name: String,
    /// Payload.
    pub data: Value,
}

impl BusEvent {
    /// Channel key this event was published on.
    pub fn channel(&self) -> String {
        channel_key(self.entity.as_str(), &self.name)
    }
}

/// Handle returned by [`EventBus::listen`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&BusEvent)>;

/// Publish/subscribe channel keyed by `"<entity>:<event>"`.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    channels: BTreeMap<String, Vec<(SubscriptionId, Listener)>>,
    index: BTreeMap<SubscriptionId, String>,
}

impl core::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventBus")
            .field("channels", &self.channels.keys().collect::<Vec<_>>())
            .field("listeners", &self.index.len())
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `callback` to `channel`. Returns a handle for [`EventBus::unlisten`].
    pub fn listen(
        &mut self,
        channel: impl Into<String>,
        callback: impl FnMut(&BusEvent) + 'static,
    ) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        let channel = channel.into();
        self.channels
            .entry(channel.clone())
            .or_default()
            .push((id, Box::new(callback)));
        self.index.insert(id, channel);
        id
    }

    /// Remove a subscription. Returns whether it existed; unknown handles are a no-op.
    pub fn unlisten(&mut self, id: SubscriptionId) -> bool {
        let Some(channel) = self.index.remove(&id) else {
            return false;
        };
        if let Some(listeners) = self.channels.get_mut(&channel) {
            listeners.retain(|(sid, _)| *sid != id);
            if listeners.is_empty() {
                self.channels.remove(&channel);
            }
        }
        true
    }

    /// Publish `name` from `entity`. Returns the number of listeners reached.
    pub fn emit(&mut self, entity: &str, name: &str, data: Value) -> usize {
        let event = BusEvent {
            entity: EntityId::from(entity),
            name: name.to_owned(),
            data,
        };
        self.deliver(&event)
    }

    /// Publish a window-level signal on the reserved global entity.
    pub fn emit_global(&mut self, name: &str, data: Value) -> usize {
        self.emit(GLOBAL_ENTITY, name, data)
    }

    /// Publish a prepared event.
    pub fn deliver(&mut self, event: &BusEvent) -> usize {
        let key = event.channel();
        let Some(listeners) = self.channels.get_mut(&key) else {
            tracing::trace!(channel = %key, "bus event without listeners");
            return 0;
        };
        for (_, cb) in listeners.iter_mut() {
            cb(event);
        }
        listeners.len()
    }

    /// Number of listeners on `channel`.
    pub fn listener_count(&self, channel: &str) -> usize {
        self.channels.get(channel).map_or(0, Vec::len)
    }

    /// Total number of live subscriptions.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether there are no subscriptions.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
