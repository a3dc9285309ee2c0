// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Action executor: the only component that touches the outside world.
//!
//! ## Overview
//!
//! Runs the [`Action`] attached to a matched rule, independently of whether the state
//! commit changed anything. The outside world is reached through an [`ActionHost`]
//! supplied by the embedder (a browser shell, a native window, a test recorder).
//!
//! Missing payloads and unknown action names are recoverable: they log a warning and
//! return [`ActionOutcome::Failed`]; they never abort the surrounding dispatch.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::rule::{Action, Rule, ScrollBehavior};
use crate::types::EntityId;

/// Overlay notification kind. The engine broadcasts these; an external overlay manager
/// decides what they mean.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OverlayEvent {
    /// Open an overlay.
    Open,
    /// Replace the current overlay.
    Swap,
    /// Close an overlay.
    Close,
}

impl OverlayEvent {
    /// Name of the cross-cutting notification.
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::Open => "noiir:overlay-open",
            Self::Swap => "noiir:overlay-swap",
            Self::Close => "noiir:overlay-close",
        }
    }
}

/// A named overlay notification carrying its `overlayId`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayNotification {
    /// Which notification.
    pub event: OverlayEvent,
    /// Overlay the notification concerns.
    pub overlay_id: String,
}

/// The outside world as seen by the executor.
pub trait ActionHost {
    /// Navigate back in history.
    fn navigate_back(&mut self);

    /// Scroll the element rendered for `target` into view.
    ///
    /// Returns `false` when no such element exists.
    fn scroll_into_view(&mut self, target: &EntityId, behavior: ScrollBehavior) -> bool;

    /// Open `url` in a new browsing context.
    fn open_url(&mut self, url: &str);

    /// Broadcast an overlay notification.
    fn notify(&mut self, notification: OverlayNotification);
}

/// A host that ignores every effect.
///
/// Every scroll target is reported as found.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullHost;

impl ActionHost for NullHost {
    fn navigate_back(&mut self) {}

    fn scroll_into_view(&mut self, _target: &EntityId, _behavior: ScrollBehavior) -> bool {
        true
    }

    fn open_url(&mut self, _url: &str) {}

    fn notify(&mut self, _notification: OverlayNotification) {}
}

/// A side effect captured by [`RecordingHost`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HostEffect {
    /// History back.
    Back,
    /// Scroll request that found its target.
    Scroll {
        /// Scrolled element.
        target: EntityId,
        /// Requested animation.
        behavior: ScrollBehavior,
    },
    /// Opened URL.
    OpenUrl(String),
    /// Overlay notification.
    Overlay(OverlayNotification),
}

/// A host that records effects, for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct RecordingHost {
    /// Effects in the order they were requested.
    pub effects: Vec<HostEffect>,
    elements: Option<BTreeSet<EntityId>>,
}

impl RecordingHost {
    /// A recorder that treats every scroll target as present.
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder that only finds the listed scroll targets.
    pub fn with_elements<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<EntityId>,
    {
        Self {
            effects: Vec::new(),
            elements: Some(ids.into_iter().map(Into::into).collect()),
        }
    }

    /// Drain the recorded effects.
    pub fn take(&mut self) -> Vec<HostEffect> {
        core::mem::take(&mut self.effects)
    }
}

impl ActionHost for RecordingHost {
    fn navigate_back(&mut self) {
        self.effects.push(HostEffect::Back);
    }

    fn scroll_into_view(&mut self, target: &EntityId, behavior: ScrollBehavior) -> bool {
        if self.elements.as_ref().is_some_and(|e| !e.contains(target)) {
            return false;
        }
        self.effects.push(HostEffect::Scroll {
            target: target.clone(),
            behavior,
        });
        true
    }

    fn open_url(&mut self, url: &str) {
        self.effects.push(HostEffect::OpenUrl(url.to_owned()));
    }

    fn notify(&mut self, notification: OverlayNotification) {
        self.effects.push(HostEffect::Overlay(notification));
    }
}

/// Result of running one action.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActionOutcome {
    /// Nothing to do (`none`, `changeTo`).
    Skipped,
    /// The side effect was requested from the host.
    Performed,
    /// Recoverable failure; a warning was logged.
    Failed,
}

/// Runs rule actions against an [`ActionHost`].
#[derive(Clone, Debug, Default)]
pub struct ActionExecutor<H> {
    host: H,
    default_scroll: ScrollBehavior,
}

impl<H: ActionHost> ActionExecutor<H> {
    /// Create an executor with the given host and default scroll behavior.
    pub fn new(host: H, default_scroll: ScrollBehavior) -> Self {
        Self {
            host,
            default_scroll,
        }
    }

    /// Borrow the host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutably borrow the host.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Run `rule.action`.
    pub fn execute(&mut self, rule: &Rule) -> ActionOutcome {
        match &rule.action {
            Action::None | Action::ChangeTo => ActionOutcome::Skipped,
            Action::Custom(f) => {
                f.call(rule);
                ActionOutcome::Performed
            }
            Action::Back => {
                self.host.navigate_back();
                ActionOutcome::Performed
            }
            Action::ScrollTo => {
                let Some(target) = &rule.scroll_target_id else {
                    tracing::warn!("scrollTo action without scrollTargetId");
                    return ActionOutcome::Failed;
                };
                let behavior = rule.scroll_behavior.unwrap_or(self.default_scroll);
                if self.host.scroll_into_view(target, behavior) {
                    ActionOutcome::Performed
                } else {
                    tracing::warn!(target = %target, "scrollTo target not found");
                    ActionOutcome::Failed
                }
            }
            Action::OpenLink => {
                let Some(url) = &rule.url else {
                    tracing::warn!("openLink action without url");
                    return ActionOutcome::Failed;
                };
                self.host.open_url(url);
                ActionOutcome::Performed
            }
            Action::OpenOverlay => self.overlay(rule, OverlayEvent::Open),
            Action::SwapOverlay => self.overlay(rule, OverlayEvent::Swap),
            Action::CloseOverlay => self.overlay(rule, OverlayEvent::Close),
            Action::Unknown(name) => {
                tracing::warn!(action = %name, "unknown action");
                ActionOutcome::Failed
            }
        }
    }

    fn overlay(&mut self, rule: &Rule, event: OverlayEvent) -> ActionOutcome {
        let Some(overlay_id) = &rule.overlay_id else {
            tracing::warn!(event = event.event_name(), "overlay action without overlayId");
            return ActionOutcome::Failed;
        };
        self.host.notify(OverlayNotification {
            event,
            overlay_id: overlay_id.clone(),
        });
        ActionOutcome::Performed
    }
}
