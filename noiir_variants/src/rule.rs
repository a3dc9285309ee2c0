// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rule schema: the declarative record describing one variant transition.
//!
//! ## Overview
//!
//! A [`Rule`] names a trigger, an optional source and target entity, a destination
//! (explicit `to` or a toggle cycle), an optional guard, presentational timing, and an
//! optional side-effecting [`Action`]. Rules are pure data; the
//! [dispatcher](crate::dispatch) gives them meaning.
//!
//! Rules can be built in code:
//!
//! ```
//! use noiir_variants::rule::{Rule, TriggerKind};
//!
//! let rule = Rule::new(TriggerKind::Click).target("cb").cycle(["unchecked", "checked"]);
//! assert_eq!(rule.destination("unchecked"), Some("checked"));
//! ```
//!
//! or deserialized from the JSON authoring surface, where the trigger string is parsed
//! once into a [`Trigger`] descriptor:
//!
//! ```
//! use noiir_variants::rule::{Rule, RuleTrigger, TriggerKind};
//!
//! let rule: Rule = serde_json::from_str(
//!     r#"{"trigger": "card:opened", "targetId": "badge", "toVariant": "lit"}"#,
//! ).unwrap();
//! let RuleTrigger::Event(trigger) = &rule.trigger else { unreachable!() };
//! assert_eq!(trigger.kind, TriggerKind::Channel);
//! assert_eq!(trigger.channel.as_deref(), Some("card:opened"));
//! ```

use core::fmt;
use std::rc::Rc;

use noiir_timing::{Curve, TimeValue, TimingError, Transition};
use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::types::EntityId;

/// Closed vocabulary of trigger kinds after normalization.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerKind {
    /// Primary activation of the element.
    Click,
    /// Pointer moved onto the element.
    PointerEnter,
    /// Pointer moved off the element.
    PointerLeave,
    /// Pointer pressed on the element.
    PointerDown,
    /// Pointer released on the element.
    PointerUp,
    /// Element gained focus.
    Focus,
    /// Element lost focus.
    Blur,
    /// Key pressed while the element has focus.
    Key,
    /// Key pressed anywhere (single process-wide listener).
    HotKey,
    /// Another entity committed a variant.
    Listen,
    /// Timer elapsed after binding.
    Delay,
    /// Element finished mounting; fires once.
    Mount,
    /// Element entered the viewport.
    Visible,
    /// Element left the viewport.
    Hidden,
    /// Caller-fired named event, or a one-off probe.
    Custom,
    /// Cross-frame trigger subscribed on the event bus.
    Channel,
}

impl TriggerKind {
    /// Visual-class triggers commit to the overlay and use first-match-wins resolution.
    pub const fn is_visual(self) -> bool {
        matches!(self, Self::PointerEnter | Self::PointerLeave)
    }

    /// Whether the trigger is raised by the owning element itself (as opposed to a
    /// process-wide source such as the keyboard, the bus, or another entity's commit).
    pub const fn is_element_bound(self) -> bool {
        !matches!(self, Self::HotKey | Self::Listen | Self::Channel)
    }

    /// Whether matching also compares the rule's `key`/`hotKey` field.
    pub const fn is_keyboard(self) -> bool {
        matches!(self, Self::Key | Self::HotKey)
    }

    /// Parse a trigger name. Case, `-` and `_` are ignored; DOM-style aliases are accepted.
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        Some(match key.as_str() {
            "click" | "tap" | "press" => Self::Click,
            "pointerenter" | "mouseenter" => Self::PointerEnter,
            "pointerleave" | "mouseleave" => Self::PointerLeave,
            "pointerdown" | "mousedown" => Self::PointerDown,
            "pointerup" | "mouseup" => Self::PointerUp,
            "focus" => Self::Focus,
            "blur" => Self::Blur,
            "key" | "keydown" => Self::Key,
            "hotkey" => Self::HotKey,
            "listen" => Self::Listen,
            "delay" | "timeout" => Self::Delay,
            "mount" => Self::Mount,
            "visible" | "inview" => Self::Visible,
            "hidden" | "outofview" => Self::Hidden,
            "custom" => Self::Custom,
            _ => return None,
        })
    }

    /// Canonical camelCase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::PointerEnter => "pointerEnter",
            Self::PointerLeave => "pointerLeave",
            Self::PointerDown => "pointerDown",
            Self::PointerUp => "pointerUp",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Key => "key",
            Self::HotKey => "hotKey",
            Self::Listen => "listen",
            Self::Delay => "delay",
            Self::Mount => "mount",
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Custom => "custom",
            Self::Channel => "channel",
        }
    }
}

/// Normalized trigger descriptor: a kind plus, for cross-frame triggers, the bus channel.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Trigger {
    /// Trigger kind.
    pub kind: TriggerKind,
    /// Bus channel (`"<entity>:<event>"`) for [`TriggerKind::Channel`].
    pub channel: Option<String>,
}

impl Trigger {
    /// A trigger with no channel.
    pub const fn new(kind: TriggerKind) -> Self {
        Self {
            kind,
            channel: None,
        }
    }

    /// A cross-frame trigger listening on `channel`.
    pub fn channel(channel: impl Into<String>) -> Self {
        Self {
            kind: TriggerKind::Channel,
            channel: Some(channel.into()),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.channel {
            Some(ch) => f.write_str(ch),
            None => f.write_str(self.kind.name()),
        }
    }
}

/// Caller-supplied zero-argument function used as a one-off custom trigger.
///
/// Evaluated once after binding; the rule fires if it returns `true`.
#[derive(Clone)]
pub struct Probe(Rc<dyn Fn() -> bool>);

impl Probe {
    /// Wrap a predicate.
    pub fn new(f: impl Fn() -> bool + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Evaluate the predicate.
    pub fn fire(&self) -> bool {
        (self.0)()
    }
}

impl fmt::Debug for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Probe(..)")
    }
}

/// Trigger as authored, before registration-time normalization.
#[derive(Clone, Debug)]
pub enum RuleTrigger {
    /// Expands into a `pointerEnter` rule and its mirrored `pointerLeave` rule.
    Hover,
    /// A concrete trigger.
    Event(Trigger),
    /// A one-off custom trigger.
    Probe(Probe),
}

impl RuleTrigger {
    /// Parse an authored trigger string.
    ///
    /// Returns the trigger and, for `key:<name>` strings, the key to match.
    /// A string containing `:` that does not start with `key` is a cross-frame trigger.
    pub fn parse(s: &str) -> Result<(Self, Option<String>), RuleError> {
        let s = s.trim();
        if let Some((head, tail)) = s.split_once(':') {
            if head.to_ascii_lowercase().starts_with("key") {
                let kind = TriggerKind::from_name(head)
                    .filter(|k| *k == TriggerKind::Key)
                    .ok_or_else(|| RuleError::UnknownTrigger(s.to_owned()))?;
                let key = (!tail.is_empty()).then(|| tail.to_owned());
                return Ok((Self::Event(Trigger::new(kind)), key));
            }
            if head.is_empty() || tail.is_empty() {
                return Err(RuleError::MalformedChannel(s.to_owned()));
            }
            return Ok((Self::Event(Trigger::channel(s)), None));
        }
        if s.eq_ignore_ascii_case("hover") {
            return Ok((Self::Hover, None));
        }
        TriggerKind::from_name(s)
            .map(|k| (Self::Event(Trigger::new(k)), None))
            .ok_or_else(|| RuleError::UnknownTrigger(s.to_owned()))
    }
}

impl From<TriggerKind> for RuleTrigger {
    fn from(kind: TriggerKind) -> Self {
        Self::Event(Trigger::new(kind))
    }
}

impl From<Trigger> for RuleTrigger {
    fn from(t: Trigger) -> Self {
        Self::Event(t)
    }
}

impl From<Probe> for RuleTrigger {
    fn from(p: Probe) -> Self {
        Self::Probe(p)
    }
}

/// Scroll animation requested by a `scrollTo` action.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScrollBehavior {
    /// Animated scroll.
    #[default]
    Smooth,
    /// Jump immediately.
    Instant,
    /// Host default.
    Auto,
}

/// Caller-defined side effect; invoked with the matched rule.
#[derive(Clone)]
pub struct ActionFn(Rc<dyn Fn(&Rule)>);

impl ActionFn {
    /// Wrap a callback.
    pub fn new(f: impl Fn(&Rule) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self, rule: &Rule) {
        (self.0)(rule);
    }
}

impl fmt::Debug for ActionFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActionFn(..)")
    }
}

/// Side effect attached to a rule.
///
/// Executed whenever the rule's guard passes, whether or not the variant changed.
#[derive(Clone, Debug, Default)]
pub enum Action {
    /// No side effect.
    #[default]
    None,
    /// The variant change is the entire effect.
    ChangeTo,
    /// History back-navigation.
    Back,
    /// Scroll `scrollTargetId` into view.
    ScrollTo,
    /// Open `url` in a new browsing context.
    OpenLink,
    /// Broadcast an open-overlay notification for `overlayId`.
    OpenOverlay,
    /// Broadcast a swap-overlay notification for `overlayId`.
    SwapOverlay,
    /// Broadcast a close-overlay notification for `overlayId`.
    CloseOverlay,
    /// Caller-defined callback.
    Custom(ActionFn),
    /// An action name outside the vocabulary; logged and skipped.
    Unknown(String),
}

impl Action {
    /// Map an authored action name onto the vocabulary.
    pub fn from_name(name: &str) -> Self {
        let key: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "" | "none" => Self::None,
            "changeto" => Self::ChangeTo,
            "back" => Self::Back,
            "scrollto" => Self::ScrollTo,
            "openlink" => Self::OpenLink,
            "openoverlay" => Self::OpenOverlay,
            "swapoverlay" => Self::SwapOverlay,
            "closeoverlay" => Self::CloseOverlay,
            _ => Self::Unknown(name.to_owned()),
        }
    }

    /// Wrap a callback as a custom action.
    pub fn custom(f: impl Fn(&Rule) + 'static) -> Self {
        Self::Custom(ActionFn::new(f))
    }
}

/// One declarative transition.
///
/// Fields mirror the JSON authoring surface (camelCase there).
#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "RawRule")]
pub struct Rule {
    /// What raises this rule.
    pub trigger: RuleTrigger,
    /// Only events from this entity match; `None` matches any source.
    pub source_id: Option<EntityId>,
    /// Entity whose state changes; `None` means the event's source.
    pub target_id: Option<EntityId>,
    /// Guard: the target's relevant variant must equal this value.
    pub from_variant: Option<String>,
    /// Explicit destination.
    pub to_variant: Option<String>,
    /// Whether the destination is resolved by cycling `toggle_variants`.
    pub toggle: bool,
    /// Cycle for toggle rules.
    pub toggle_variants: Vec<String>,
    /// Side effect.
    pub action: Action,
    /// Presentational delay.
    pub delay: Option<TimeValue>,
    /// Presentational duration.
    pub duration: Option<TimeValue>,
    /// Presentational easing.
    pub curve: Option<Curve>,
    /// Payload for [`Action::OpenLink`].
    pub url: Option<String>,
    /// Payload for the overlay actions.
    pub overlay_id: Option<String>,
    /// Payload for [`Action::ScrollTo`].
    pub scroll_target_id: Option<EntityId>,
    /// Scroll animation for [`Action::ScrollTo`].
    pub scroll_behavior: Option<ScrollBehavior>,
    /// Key to match for keyboard triggers.
    pub key: Option<String>,
    /// Alternate key to match for keyboard triggers.
    pub hot_key: Option<String>,
    /// Entity whose commits a `listen` rule reacts to.
    pub listen_id: Option<EntityId>,
    /// Variant a `listen` rule reacts to; `None` reacts to any.
    pub listen_variant: Option<String>,
    /// Event name a `custom` rule reacts to; `None` reacts to any.
    pub event: Option<String>,
}

impl Rule {
    /// A rule with the given trigger and no destination, guard, or action.
    pub fn new(trigger: impl Into<RuleTrigger>) -> Self {
        Self {
            trigger: trigger.into(),
            source_id: None,
            target_id: None,
            from_variant: None,
            to_variant: None,
            toggle: false,
            toggle_variants: Vec::new(),
            action: Action::None,
            delay: None,
            duration: None,
            curve: None,
            url: None,
            overlay_id: None,
            scroll_target_id: None,
            scroll_behavior: None,
            key: None,
            hot_key: None,
            listen_id: None,
            listen_variant: None,
            event: None,
        }
    }

    /// A rule from an authored trigger string (see [`RuleTrigger::parse`]).
    pub fn parse(trigger: &str) -> Result<Self, RuleError> {
        let (trigger, key) = RuleTrigger::parse(trigger)?;
        let mut rule = Self::new(trigger);
        rule.key = key;
        Ok(rule)
    }

    /// Restrict to events from `id`.
    pub fn source(mut self, id: impl Into<EntityId>) -> Self {
        self.source_id = Some(id.into());
        self
    }

    /// Mutate `id` instead of the event source.
    pub fn target(mut self, id: impl Into<EntityId>) -> Self {
        self.target_id = Some(id.into());
        self
    }

    /// Only apply while the target is in `variant`.
    pub fn guard(mut self, variant: impl Into<String>) -> Self {
        self.from_variant = Some(variant.into());
        self
    }

    /// Explicit destination.
    pub fn to(mut self, variant: impl Into<String>) -> Self {
        self.to_variant = Some(variant.into());
        self
    }

    /// Make this a toggle rule cycling through `variants`.
    pub fn cycle<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.toggle = true;
        self.toggle_variants = variants.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a side effect.
    pub fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Set the [`Action::OpenLink`] payload.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the overlay payload.
    pub fn overlay(mut self, id: impl Into<String>) -> Self {
        self.overlay_id = Some(id.into());
        self
    }

    /// Set the [`Action::ScrollTo`] payload.
    pub fn scroll_target(mut self, id: impl Into<EntityId>, behavior: Option<ScrollBehavior>) -> Self {
        self.scroll_target_id = Some(id.into());
        self.scroll_behavior = behavior;
        self
    }

    /// Key to match for keyboard triggers.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Alternate key to match for keyboard triggers.
    pub fn hot_key(mut self, key: impl Into<String>) -> Self {
        self.hot_key = Some(key.into());
        self
    }

    /// React to `id` committing `variant` (any variant when `None`).
    pub fn listen_to(mut self, id: impl Into<EntityId>, variant: Option<&str>) -> Self {
        self.listen_id = Some(id.into());
        self.listen_variant = variant.map(str::to_owned);
        self
    }

    /// React only to custom events named `name`.
    pub fn event(mut self, name: impl Into<String>) -> Self {
        self.event = Some(name.into());
        self
    }

    /// Presentational duration.
    pub fn duration(mut self, t: TimeValue) -> Self {
        self.duration = Some(t);
        self
    }

    /// Presentational delay; also the timer length for `delay` triggers.
    pub fn delay(mut self, t: TimeValue) -> Self {
        self.delay = Some(t);
        self
    }

    /// Presentational easing.
    pub fn curve(mut self, c: Curve) -> Self {
        self.curve = Some(c);
        self
    }

    /// Whether the guard accepts `relevant` (the target's visual-or-logical or logical variant).
    pub fn guard_passes(&self, relevant: &str) -> bool {
        self.from_variant.as_deref().is_none_or(|f| f == relevant)
    }

    /// Resolve the destination given the target's current variant.
    ///
    /// Toggle rules cycle; explicit rules return `to_variant`.
    pub fn destination(&self, current: &str) -> Option<&str> {
        if self.toggle {
            next_in_cycle(&self.toggle_variants, current)
        } else {
            self.to_variant.as_deref()
        }
    }

    /// Whether a keyboard event carrying `key` satisfies this rule's key fields.
    ///
    /// Rules with neither `key` nor `hotKey` accept every key.
    pub fn matches_key(&self, key: Option<&str>) -> bool {
        match (self.key.as_deref(), self.hot_key.as_deref()) {
            (None, None) => true,
            (a, b) => key.is_some_and(|k| a == Some(k) || b == Some(k)),
        }
    }

    /// Presentational timing for a commit caused by this rule.
    pub fn transition(&self, base: &Transition) -> Transition {
        Transition::merged(base, self.duration, self.delay, self.curve.as_ref())
    }
}

/// Next variant of a toggle cycle.
///
/// `variants[(index(current) + 1) % n]` when `current` is in the list, else `variants[0]`.
/// `None` for an empty list.
pub fn next_in_cycle<'a>(variants: &'a [String], current: &str) -> Option<&'a str> {
    if variants.is_empty() {
        return None;
    }
    let next = match variants.iter().position(|v| v == current) {
        Some(i) => (i + 1) % variants.len(),
        None => 0,
    };
    Some(&variants[next])
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawRule {
    trigger: String,
    source_id: Option<EntityId>,
    target_id: Option<EntityId>,
    from_variant: Option<String>,
    to_variant: Option<String>,
    toggle: bool,
    toggle_variants: Vec<String>,
    action: Option<String>,
    delay: Option<RawTime>,
    duration: Option<RawTime>,
    curve: Option<RawCurve>,
    url: Option<String>,
    overlay_id: Option<String>,
    scroll_target_id: Option<EntityId>,
    scroll_behavior: Option<ScrollBehavior>,
    key: Option<String>,
    hot_key: Option<String>,
    listen_id: Option<EntityId>,
    listen_variant: Option<String>,
    event: Option<String>,
}

/// Timing fields are read loosely and validated on conversion into a [`Rule`], so a bad value
/// surfaces as [`RuleError::Timing`].
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTime {
    Number(f64),
    Text(String),
}

impl RawTime {
    fn parse(self) -> Result<TimeValue, TimingError> {
        match self {
            Self::Number(ms) => TimeValue::try_from_millis(ms),
            Self::Text(s) => s.parse(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCurve {
    Name(String),
    Points(Vec<f64>),
}

impl RawCurve {
    fn parse(self) -> Result<Curve, TimingError> {
        match self {
            Self::Name(s) => s.parse(),
            Self::Points(v) => Curve::bezier(&v),
        }
    }
}

impl TryFrom<RawRule> for Rule {
    type Error = RuleError;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        let (trigger, parsed_key) = RuleTrigger::parse(&raw.trigger)?;
        Ok(Self {
            trigger,
            source_id: raw.source_id,
            target_id: raw.target_id,
            from_variant: raw.from_variant,
            to_variant: raw.to_variant,
            toggle: raw.toggle,
            toggle_variants: raw.toggle_variants,
            action: raw.action.as_deref().map_or(Action::None, Action::from_name),
            delay: raw.delay.map(RawTime::parse).transpose()?,
            duration: raw.duration.map(RawTime::parse).transpose()?,
            curve: raw.curve.map(RawCurve::parse).transpose()?,
            url: raw.url,
            overlay_id: raw.overlay_id,
            scroll_target_id: raw.scroll_target_id,
            scroll_behavior: raw.scroll_behavior,
            key: raw.key.or(parsed_key),
            hot_key: raw.hot_key,
            listen_id: raw.listen_id,
            listen_variant: raw.listen_variant,
            event: raw.event,
        })
    }
}
