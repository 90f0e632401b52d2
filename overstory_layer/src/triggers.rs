// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Close triggers: closer attributes, outside clicks, the Escape key, named
//! events, and location matches.
//!
//! Every trigger ends in [`Overlay::request_close`]; the close itself refuses to
//! run twice, so triggers never need to coordinate with each other.

use std::rc::{Rc, Weak};
use std::time::Duration;

use overstory_dom::{Document, ElementId};
use overstory_responder::types::{Outcome, Phase};
use serde_json::Value;
use tracing::{error, trace, warn};

use crate::dismiss::DismissMethods;
use crate::error::OverlayError;
use crate::events::{Event, Subscription};
use crate::focus::OverlayFocus;
use crate::motion::Animation;
use crate::overlay::{CloseOptions, Overlay, OverlayState, Verb};

/// Clicking an element with this attribute accepts the overlay with the attribute's JSON value.
pub const ACCEPT_ATTR: &str = "ov-accept";
/// Clicking an element with this attribute dismisses the overlay with the attribute's JSON value.
pub const DISMISS_ATTR: &str = "ov-dismiss";
/// Deprecated spelling of [`DISMISS_ATTR`].
pub const LEGACY_CLOSE_ATTR: &str = "ov-close";
/// Closer override: `false` disables the animation, `true` keeps the default, anything else names one.
pub const ANIMATION_ATTR: &str = "ov-animation";
/// Closer override: easing name.
pub const EASING_ATTR: &str = "ov-easing";
/// Closer override: duration in milliseconds.
pub const DURATION_ATTR: &str = "ov-duration";
/// Closer override: confirmation message.
pub const CONFIRM_ATTR: &str = "ov-confirm";

/// Read the value and close options of the closer `element` carrying `attribute`.
pub fn parse_closer(
    document: &Document,
    element: ElementId,
    attribute: &str,
) -> Result<(Value, CloseOptions), OverlayError> {
    let raw = document.attr(element, attribute).unwrap_or_default();
    let value = if raw.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(raw).map_err(|source| OverlayError::Payload {
            attribute: attribute.into(),
            source,
        })?
    };
    let animation = match document.attr(element, ANIMATION_ATTR) {
        None | Some("" | "true") => None,
        Some("false" | "none") => Some(Animation::None),
        Some(name) => Some(Animation::named(name)),
    };
    let duration = document
        .attr(element, DURATION_ATTR)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| OverlayError::Attribute {
                    attribute: DURATION_ATTR.into(),
                    value: raw.into(),
                })
        })
        .transpose()?;
    let options = CloseOptions {
        animation,
        duration,
        easing: document.attr(element, EASING_ATTR).map(String::from),
        confirm: document.attr(element, CONFIRM_ATTR).map(String::from),
        origin: Some(element),
        ..CloseOptions::default()
    };
    Ok((value, options))
}

impl Overlay {
    /// Wire the focus trap and every enabled close trigger.
    pub(crate) fn setup_handlers(self: &Rc<Self>) {
        let focus = OverlayFocus::new(self);
        *self.focus.borrow_mut() = Some(focus);

        let policy = &self.config.dismissable;
        if policy.supports(DismissMethods::BUTTON) {
            self.create_dismiss_element();
        }

        let mut subscriptions = Vec::new();
        if policy.supports(DismissMethods::OUTSIDE) {
            subscriptions.extend(self.register_outside_closers());
        }
        if policy.supports(DismissMethods::KEY) {
            let weak = Rc::downgrade(self);
            subscriptions.push(self.ctx.events().on_escape(move |event| {
                weak.upgrade()
                    .map_or(Outcome::Continue, |overlay| overlay.on_escape_pressed(event))
            }));
        }

        subscriptions.extend(self.register_click_closer(ACCEPT_ATTR, Verb::Accept));
        subscriptions.extend(self.register_click_closer(DISMISS_ATTR, Verb::Dismiss));
        if self.ctx.legacy_closers() {
            subscriptions.extend(self.register_click_closer(LEGACY_CLOSE_ATTR, Verb::Dismiss));
        }
        if let Some(types) = &self.config.accept_event {
            subscriptions.extend(self.register_event_closer(types, Verb::Accept));
        }
        if let Some(types) = &self.config.dismiss_event {
            subscriptions.extend(self.register_event_closer(types, Verb::Dismiss));
        }

        self.subscriptions.borrow_mut().extend(subscriptions);
        self.state.set(OverlayState::Attached);
    }

    /// Release every listener and the focus trap. Safe to call more than once.
    pub(crate) fn teardown_handlers(&self) {
        let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
        for subscription in subscriptions {
            subscription.unsubscribe();
        }
        let focus = self.focus.borrow_mut().take();
        if let Some(focus) = focus {
            focus.teardown(&self.ctx);
        }
    }

    fn register_outside_closers(self: &Rc<Self>) -> Vec<Subscription> {
        let mut subscriptions = Vec::new();
        if let Some(parent) = self.parent.element(&self.ctx) {
            let weak = Rc::downgrade(self);
            subscriptions.push(self.ctx.events().on_layer(parent, "click", None, move |event, _| {
                weak.upgrade()
                    .map_or(Outcome::Continue, |overlay| overlay.on_parent_clicked(event))
            }));
        }
        if let Some(viewport) = self.parts.get().viewport {
            let weak = Rc::downgrade(self);
            subscriptions.push(self.ctx.events().on(viewport, "click", Phase::Target, move |event| {
                match weak.upgrade() {
                    Some(overlay) => overlay.on_outside_clicked(event, true),
                    None => Outcome::Continue,
                }
            }));
        }
        subscriptions
    }

    fn on_parent_clicked(self: &Rc<Self>, event: &mut Event) -> Outcome {
        let on_origin = self
            .config
            .origin
            .is_some_and(|origin| self.ctx.document().contains(origin, event.target));
        if on_origin {
            trace!(overlay = %self, "origin clicked");
            return Outcome::StopAndConsume;
        }
        self.on_outside_clicked(event, false)
    }

    /// Dismiss for a click outside the box. A click on the overlay's own viewport
    /// is halted; one on the parent layer keeps going.
    fn on_outside_clicked(self: &Rc<Self>, event: &mut Event, halt: bool) -> Outcome {
        if self.last_outside_event.replace(Some(event.id())) == Some(event.id()) {
            return Outcome::Continue;
        }
        if !self.is_open() {
            return Outcome::Continue;
        }
        let options = CloseOptions {
            origin: Some(event.target),
            ..CloseOptions::default()
        };
        self.request_close(Verb::Dismiss, Value::from(":outside"), options);
        if halt {
            Outcome::StopAndConsume
        } else {
            Outcome::Continue
        }
    }

    fn on_escape_pressed(self: &Rc<Self>, _event: &mut Event) -> Outcome {
        if !self.is_front() || !self.is_open() {
            return Outcome::Continue;
        }
        let field = self.ctx.document().focused_field();
        if field.is_some() {
            self.ctx.events().blur();
            return Outcome::Continue;
        }
        self.request_close(Verb::Dismiss, Value::from(":key"), CloseOptions::default());
        Outcome::StopAndConsume
    }

    fn register_click_closer(self: &Rc<Self>, attribute: &'static str, verb: Verb) -> Option<Subscription> {
        let element = self.parts.get().element?;
        let weak: Weak<Self> = Rc::downgrade(self);
        Some(self.ctx.events().on_layer(element, "click", Some(attribute), move |_event, closer| {
            let Some(overlay) = weak.upgrade() else {
                return Outcome::Continue;
            };
            if attribute == LEGACY_CLOSE_ATTR {
                warn!(overlay = %overlay, "`{LEGACY_CLOSE_ATTR}` is deprecated, use `{DISMISS_ATTR}`");
            }
            let parsed = parse_closer(&overlay.ctx.document(), closer, attribute);
            match parsed {
                Ok((value, options)) => overlay.request_close(verb, value, options),
                Err(err) => error!(overlay = %overlay, %err, "malformed closer"),
            }
            Outcome::StopAndConsume
        }))
    }

    fn register_event_closer(self: &Rc<Self>, event_types: &str, verb: Verb) -> Option<Subscription> {
        let element = self.parts.get().element?;
        let weak = Rc::downgrade(self);
        Some(self.ctx.events().on_layer(element, event_types, None, move |event, _| {
            let Some(overlay) = weak.upgrade() else {
                return Outcome::Continue;
            };
            event.prevent_default();
            overlay.request_close(verb, event.to_value(), CloseOptions::default());
            Outcome::Continue
        }))
    }

    /// Close for the recorded location if an accept or dismiss pattern matches.
    pub(crate) fn try_close_for_location(self: &Rc<Self>) -> bool {
        if !self.is_open() {
            return false;
        }
        let Some(location) = self.location() else {
            return false;
        };
        let candidates = [
            (&self.config.accept_location, Verb::Accept),
            (&self.config.dismiss_location, Verb::Dismiss),
        ];
        for (pattern, verb) in candidates {
            if let Some(pattern) = pattern
                && let Some(mut value) = pattern.recognize(&location)
            {
                value.insert("location".into(), Value::String(location.clone()));
                self.request_close(verb, Value::Object(value), CloseOptions::default());
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlayOptions;
    use crate::dismiss::DismissableSetting;
    use crate::error::Dismissed;
    use crate::testing::Harness;
    use overstory_dom::Element;
    use serde_json::json;

    #[test]
    fn parse_closer_reads_payload_and_overrides() {
        let mut doc = Document::new();
        let el = doc.insert(
            None,
            Element::new("a")
                .with_attr(ACCEPT_ATTR, r#"{"id": 3}"#)
                .with_attr(ANIMATION_ATTR, "false")
                .with_attr(DURATION_ATTR, "250")
                .with_attr(EASING_ATTR, "ease-in")
                .with_attr(CONFIRM_ATTR, "Really?"),
        );
        let (value, options) = parse_closer(&doc, el, ACCEPT_ATTR).unwrap();
        assert_eq!(value, json!({"id": 3}));
        assert_eq!(options.animation, Some(Animation::None));
        assert_eq!(options.duration, Some(Duration::from_millis(250)));
        assert_eq!(options.easing.as_deref(), Some("ease-in"));
        assert_eq!(options.confirm.as_deref(), Some("Really?"));
        assert_eq!(options.origin, Some(el));

        let empty = doc.insert(None, Element::new("a").with_attr(DISMISS_ATTR, ""));
        let (value, options) = parse_closer(&doc, empty, DISMISS_ATTR).unwrap();
        assert_eq!(value, Value::Null);
        assert!(options.animation.is_none());

        let keep = doc.insert(
            None,
            Element::new("a")
                .with_attr(DISMISS_ATTR, "null")
                .with_attr(ANIMATION_ATTR, "true"),
        );
        let (_, options) = parse_closer(&doc, keep, DISMISS_ATTR).unwrap();
        assert!(options.animation.is_none());

        let named = doc.insert(
            None,
            Element::new("a")
                .with_attr(DISMISS_ATTR, "null")
                .with_attr(ANIMATION_ATTR, "move-to-top"),
        );
        let (_, options) = parse_closer(&doc, named, DISMISS_ATTR).unwrap();
        assert_eq!(options.animation, Some(Animation::named("move-to-top")));
    }

    #[test]
    fn closer_animation_overrides_reach_the_motion_engine() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default());
        let content = overlay.parts().content.unwrap();
        let link = h.ctx.document_mut().affix(
            content,
            "a",
            [(DISMISS_ATTR, "null"), (ANIMATION_ATTR, "move-to-top")],
        );
        h.clear_log();
        h.ctx.events().click(link);
        h.settle();
        assert!(overlay.is_closed());
        assert_eq!(
            h.entries(),
            vec!["animate ov-modal-box move-to-top", "animate ov-modal-backdrop fade-out"]
        );

        let overlay = h.open(OverlayOptions::default());
        let content = overlay.parts().content.unwrap();
        let link = h.ctx.document_mut().affix(
            content,
            "a",
            [(DISMISS_ATTR, "null"), (ANIMATION_ATTR, "true")],
        );
        h.clear_log();
        h.ctx.events().click(link);
        h.settle();
        assert!(overlay.is_closed());
        assert_eq!(
            h.entries(),
            vec!["animate ov-modal-box fade-out", "animate ov-modal-backdrop fade-out"]
        );
    }

    #[test]
    fn parse_closer_rejects_malformed_attributes() {
        let mut doc = Document::new();
        let bad_json = doc.insert(None, Element::new("a").with_attr(DISMISS_ATTR, "{oops"));
        assert!(matches!(
            parse_closer(&doc, bad_json, DISMISS_ATTR),
            Err(OverlayError::Payload { .. })
        ));
        let bad_duration = doc.insert(
            None,
            Element::new("a")
                .with_attr(DISMISS_ATTR, "1")
                .with_attr(DURATION_ATTR, "soon"),
        );
        assert!(matches!(
            parse_closer(&doc, bad_duration, DISMISS_ATTR),
            Err(OverlayError::Attribute { .. })
        ));
    }

    #[test]
    fn closer_click_accepts_with_payload() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default());
        let content = overlay.parts().content.unwrap();
        let button = h
            .ctx
            .document_mut()
            .affix(content, "button", [(ACCEPT_ATTR, "42")]);
        let result = overlay.result();
        let event = h.ctx.events().click(button);
        assert!(event.default_prevented());
        h.settle();
        assert!(overlay.is_closed());
        assert_eq!(h.block_on(result), Ok(json!(42)));
    }

    #[test]
    fn closer_attributes_work_without_dismissal_methods() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default().with_dismissable(false));
        assert!(overlay.parts().dismiss.is_none());
        let content = overlay.parts().content.unwrap();
        let link = h
            .ctx
            .document_mut()
            .affix(content, "a", [(DISMISS_ATTR, "\"no\"")]);
        h.ctx.events().click(link);
        h.settle();
        assert_eq!(
            h.block_on(overlay.result()),
            Err(Dismissed { value: json!("no") })
        );
    }

    #[test]
    fn malformed_closer_keeps_overlay_open() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default());
        let content = overlay.parts().content.unwrap();
        let link = h
            .ctx
            .document_mut()
            .affix(content, "a", [(ACCEPT_ATTR, "{not json")]);
        let event = h.ctx.events().click(link);
        assert!(event.default_prevented());
        h.settle();
        assert!(overlay.is_open());
    }

    #[test]
    fn dismiss_button_dismisses_with_button_value() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default());
        h.ctx.events().click(overlay.parts().dismiss.unwrap());
        h.settle();
        assert_eq!(
            h.block_on(overlay.result()),
            Err(Dismissed { value: json!(":button") })
        );
    }

    #[test]
    fn outside_click_dismisses_but_origin_click_is_swallowed() {
        let h = Harness::new();
        let origin = h.ctx.document_mut().affix(h.ctx.body(), "button", [("id", "open")]);
        let elsewhere = h.ctx.document_mut().affix(h.ctx.body(), "p", [("id", "text")]);
        let overlay = h.open(
            OverlayOptions::default()
                .with_mode("popup")
                .with_origin(origin),
        );

        let event = h.ctx.events().click(origin);
        assert!(event.default_prevented());
        h.settle();
        assert!(overlay.is_open());

        let inside = overlay.parts().box_element.unwrap();
        h.ctx.events().click(inside);
        h.settle();
        assert!(overlay.is_open());

        let event = h.ctx.events().click(elsewhere);
        assert!(!event.default_prevented());
        h.settle();
        assert!(overlay.is_closed());
        assert_eq!(
            h.block_on(overlay.result()),
            Err(Dismissed { value: json!(":outside") })
        );
    }

    #[test]
    fn viewport_click_counts_as_outside_only_on_the_viewport_itself() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default());
        let parts = overlay.parts();
        h.ctx.events().click(parts.content.unwrap());
        h.settle();
        assert!(overlay.is_open());
        let event = h.ctx.events().click(parts.viewport.unwrap());
        assert!(event.default_prevented());
        h.settle();
        assert!(overlay.is_closed());
    }

    #[test]
    fn outside_click_is_ignored_without_outside_dismissal() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default().with_dismissable("button key"));
        h.ctx.events().click(overlay.parts().viewport.unwrap());
        h.ctx.events().click(h.ctx.body());
        h.settle();
        assert!(overlay.is_open());
    }

    #[test]
    fn one_gesture_dismisses_once() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default().on(
            crate::config::HookSlot::Dismiss,
            {
                let log = h.log.clone();
                move |_, _| log.borrow_mut().push("on_dismiss".into())
            },
        ));
        let viewport = overlay.parts().viewport.unwrap();
        let event = h.ctx.events().click(viewport);
        assert_eq!(overlay.last_outside_event.get(), Some(event.id()));
        // The same gesture seen again by another outside listener.
        overlay.on_outside_clicked(&mut event.clone(), true);
        h.settle();
        assert!(overlay.is_closed());
        assert_eq!(h.count("on_dismiss"), 1);
    }

    #[test]
    fn escape_blurs_a_focused_field_before_dismissing() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default());
        let content = overlay.parts().content.unwrap();
        let field = h.ctx.document_mut().insert(
            Some(content),
            Element::new("input").with_flags(overstory_dom::ElementFlags::FIELD),
        );
        assert!(h.ctx.events().focus(field));

        let event = h.ctx.events().press_key("Escape");
        assert!(!event.default_prevented());
        h.settle();
        assert!(overlay.is_open());
        assert_eq!(h.ctx.document().focused_field(), None);

        let event = h.ctx.events().press_key("Escape");
        assert!(event.default_prevented());
        h.settle();
        assert!(overlay.is_closed());
        assert_eq!(
            h.block_on(overlay.result()),
            Err(Dismissed { value: json!(":key") })
        );
    }

    #[test]
    fn escape_only_closes_the_front_overlay() {
        let h = Harness::new();
        let below = h.open(OverlayOptions::default());
        let above = h.open(OverlayOptions::default());
        h.ctx.events().press_key("Escape");
        h.settle();
        assert!(above.is_closed());
        assert!(below.is_open());
        h.ctx.events().press_key("Escape");
        h.settle();
        assert!(below.is_closed());
    }

    #[test]
    fn escape_is_ignored_without_key_dismissal() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default().with_dismissable("button outside"));
        let event = h.ctx.events().press_key("Escape");
        assert!(!event.default_prevented());
        h.settle();
        assert!(overlay.is_open());
    }

    #[test]
    fn named_events_close_with_the_event_as_value() {
        let h = Harness::new();
        let overlay = h.open(
            OverlayOptions::default().with_close_events(Some("user:created user:picked"), Some("user:cancel")),
        );
        let content = overlay.parts().content.unwrap();
        let emitted = h.ctx.events().emit(
            crate::events::Event::new("user:picked", content).with_detail(json!({"id": 9})),
        );
        assert!(emitted.default_prevented());
        h.settle();
        assert_eq!(
            h.block_on(overlay.result()),
            Ok(json!({"type": "user:picked", "id": 9}))
        );
    }

    #[test]
    fn location_match_dismisses_with_captures() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default().with_close_locations(None, Some("/items/:id")));
        assert!(!overlay.navigate("/other"));
        h.settle();
        assert!(overlay.is_open());
        assert_eq!(overlay.location().as_deref(), Some("/other"));

        assert!(overlay.navigate("/items/42"));
        h.settle();
        assert_eq!(
            h.block_on(overlay.result()),
            Err(Dismissed { value: json!({"id": "42", "location": "/items/42"}) })
        );
    }

    #[test]
    fn location_match_is_ignored_once_closing() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default().with_close_locations(None, Some("/items/:id")));
        h.motion.hold(crate::testing::Hold::Pending);
        let closing = h.spawn(overlay.accept(json!("saved"), CloseOptions::default()));
        h.settle();
        assert_eq!(overlay.state(), OverlayState::Closing);
        assert!(!overlay.navigate("/items/7"));
        assert_eq!(overlay.location().as_deref(), Some("/items/7"));

        h.motion.release();
        h.block_on(closing).unwrap();
        assert!(!overlay.navigate("/items/8"));
        assert_eq!(h.block_on(overlay.result()), Ok(json!("saved")));
    }

    #[test]
    fn accept_location_is_tried_first() {
        let h = Harness::new();
        let overlay = h.open(
            OverlayOptions::default().with_close_locations(Some("/done"), Some("/done /cancel")),
        );
        assert!(overlay.navigate("/done/"));
        h.settle();
        assert_eq!(h.block_on(overlay.result()), Ok(json!({"location": "/done/"})));
    }

    #[test]
    fn legacy_closers_need_opting_in() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default());
        let content = overlay.parts().content.unwrap();
        let link = h.ctx.document_mut().affix(content, "a", [(LEGACY_CLOSE_ATTR, "")]);
        h.ctx.events().click(link);
        h.settle();
        assert!(overlay.is_open());

        let h = Harness::with_legacy_closers();
        let overlay = h.open(OverlayOptions::default());
        let content = overlay.parts().content.unwrap();
        let link = h.ctx.document_mut().affix(content, "a", [(LEGACY_CLOSE_ATTR, "")]);
        h.ctx.events().click(link);
        h.settle();
        assert!(overlay.is_closed());
    }

    #[test]
    fn teardown_releases_every_listener() {
        let h = Harness::new();
        let before = h.ctx.events().listener_count();
        let overlay = h.open(
            OverlayOptions::default()
                .with_dismissable(DismissableSetting::Flag(true))
                .with_close_events(Some("picked"), Some("cancel")),
        );
        assert!(h.ctx.events().listener_count() > before);
        h.block_on(overlay.dismiss(Value::Null, CloseOptions::default())).unwrap();
        assert_eq!(h.ctx.events().listener_count(), before);
        overlay.teardown_handlers();
    }
}
