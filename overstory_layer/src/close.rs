// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Close change: the accept/dismiss protocol.
//!
//! 1. Claim the overlay (single flight).
//! 2. Ask for confirmation, if requested.
//! 3. Run the pre-close hook and emit the preventable pre-close event on the overlay.
//! 4. Peel overlays stacked above, without animation.
//! 5. Leave the stack and release the handlers.
//! 6. Animate the elements out and remove them.
//! 7. Run the post-close hook, emit the post-close event on the parent layer, and
//!    resolve the opener.
//!
//! A declined or prevented close puts the overlay back into the state it left,
//! or into [`OverlayState::Open`] if its open animation finished in the meantime.

use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::error::{CloseError, Dismissed};
use crate::events::Event;
use crate::overlay::{CloseOptions, Overlay, OverlayState, Verb};

pub(crate) async fn execute(
    overlay: Rc<Overlay>,
    verb: Verb,
    value: Value,
    options: CloseOptions,
) -> Result<(), CloseError> {
    let previous = overlay.state.get();
    if !overlay.is_open() {
        return Err(CloseError::NotOpen);
    }
    overlay.state.set(OverlayState::Closing);
    debug!(overlay = %overlay, %verb, %value, "closing");

    if let Some(message) = &options.confirm {
        let confirmed = overlay.ctx.confirmer().confirm(message).await;
        if !confirmed {
            restore(&overlay, previous);
            debug!(overlay = %overlay, %verb, "close declined");
            return Err(CloseError::Declined);
        }
    }

    let ctx = Rc::clone(&overlay.ctx);
    let target = overlay.parts().element.unwrap_or(ctx.body());
    let mut event = Event::new(verb.pre_event(), target).with_detail(value.clone());
    if let Some(hook) = overlay.callback(verb.pre_hook()) {
        hook(&mut event);
    }
    if !(event.default_prevented() && options.preventable) {
        event = ctx.events().emit(event);
    }
    if event.default_prevented() && options.preventable {
        restore(&overlay, previous);
        debug!(overlay = %overlay, %verb, "close prevented");
        return Err(CloseError::Prevented);
    }

    for child in ctx.stack().descendants(&overlay).into_iter().rev() {
        let peel = CloseOptions {
            preventable: false,
            ..CloseOptions::default()
        }
        .instant();
        if let Err(err) = child.dismiss(Value::from(":peel"), peel).await {
            debug!(overlay = %child, %err, "peel ended early");
        }
    }

    ctx.stack().remove(&overlay);
    overlay.teardown_handlers();
    let animated = overlay.destroy_elements(&options).await;
    overlay.state.set(OverlayState::Closed);

    let parent = overlay.parent.element(&ctx).unwrap_or(ctx.body());
    let mut event = Event::new(verb.post_event(), parent).with_detail(value.clone());
    if let Some(hook) = overlay.callback(verb.post_hook()) {
        hook(&mut event);
    }
    ctx.events().emit(event);
    overlay.resolve(match verb {
        Verb::Accept => Ok(value),
        Verb::Dismiss => Err(Dismissed { value }),
    });
    debug!(overlay = %overlay, %verb, "closed");

    animated.map_err(CloseError::from)
}

/// Undo the claim of an abandoned close. An open animation that settled while
/// the close was pending completes the open here.
fn restore(overlay: &Rc<Overlay>, previous: OverlayState) {
    if previous == OverlayState::Attached && overlay.was_ever_visible() {
        overlay.finish_open();
    } else {
        overlay.state.set(previous);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use futures::future::RemoteHandle;
    use overstory_responder::types::{Outcome, Phase};
    use serde_json::json;

    use super::*;
    use crate::config::{HookSlot, OverlayOptions};
    use crate::error::MotionError;
    use crate::testing::{Harness, Hold};

    fn logging(h: &Harness, options: OverlayOptions) -> OverlayOptions {
        let mut options = options;
        for (slot, name) in [
            (HookSlot::Accept, "on_accept"),
            (HookSlot::Accepted, "on_accepted"),
            (HookSlot::Dismiss, "on_dismiss"),
            (HookSlot::Dismissed, "on_dismissed"),
        ] {
            let log = h.log.clone();
            let ctx = h.ctx.clone();
            options = options.on(slot, move |overlay, _| {
                let alive = overlay
                    .parts()
                    .element
                    .is_some_and(|el| ctx.document().is_alive(el));
                log.borrow_mut()
                    .push(format!("{name} elements={}", if alive { "alive" } else { "removed" }));
            });
        }
        options
    }

    #[test]
    fn accept_resolves_the_opener_with_the_exact_value() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default());
        let value = json!({"id": 1, "tags": ["a", "b"]});
        h.block_on(overlay.accept(value.clone(), CloseOptions::default()))
            .unwrap();
        assert_eq!(overlay.state(), OverlayState::Closed);
        assert_eq!(h.block_on(overlay.result()), Ok(value));
        assert!(h.ctx.stack().is_empty());
    }

    #[test]
    fn dismiss_rejects_the_opener_with_the_exact_value() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default());
        h.block_on(overlay.dismiss(json!([1, 2]), CloseOptions::default()))
            .unwrap();
        assert_eq!(
            h.block_on(overlay.result()),
            Err(Dismissed { value: json!([1, 2]) })
        );
    }

    #[test]
    fn hooks_bracket_the_animation_and_element_removal() {
        let h = Harness::new();
        let overlay = h.open(logging(&h, OverlayOptions::default()));
        h.clear_log();
        h.block_on(overlay.accept(Value::Null, CloseOptions::default()))
            .unwrap();
        assert_eq!(
            h.entries(),
            vec![
                "on_accept elements=alive",
                "animate ov-modal-box fade-out",
                "animate ov-modal-backdrop fade-out",
                "on_accepted elements=removed",
            ]
        );
    }

    #[test]
    fn lifecycle_events_reach_listeners() {
        let h = Harness::new();
        let seen = std::rc::Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let _sub = h.ctx.events().on(
            h.ctx.body(),
            "ov:layer:dismiss ov:layer:dismissed",
            Phase::Bubble,
            move |event| {
                s.borrow_mut().push((event.kind.clone(), event.detail.clone()));
                Outcome::Continue
            },
        );
        let overlay = h.open(OverlayOptions::default());
        h.block_on(overlay.dismiss(json!("bye"), CloseOptions::default()))
            .unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![
                ("ov:layer:dismiss".to_string(), json!("bye")),
                ("ov:layer:dismissed".to_string(), json!("bye")),
            ]
        );
    }

    #[test]
    fn second_close_while_closing_is_refused() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default());
        h.motion.hold(Hold::Pending);
        let first = overlay.dismiss(json!(1), CloseOptions::default());
        let first = h.spawn(first);
        h.settle();
        assert_eq!(overlay.state(), OverlayState::Closing);
        assert_eq!(
            h.block_on(overlay.accept(json!(2), CloseOptions::default())),
            Err(CloseError::NotOpen)
        );
        h.motion.release();
        assert_eq!(h.block_on(first), Ok(()));
        assert_eq!(
            h.block_on(overlay.result()),
            Err(Dismissed { value: json!(1) })
        );
        assert_eq!(
            h.block_on(overlay.dismiss(json!(3), CloseOptions::default())),
            Err(CloseError::NotOpen)
        );
    }

    #[test]
    fn declined_confirmation_keeps_the_overlay_open() {
        let h = Harness::declining();
        let overlay = h.open(logging(&h, OverlayOptions::default()));
        h.clear_log();
        let result = h.block_on(overlay.dismiss(Value::Null, CloseOptions::default().confirm("Discard?")));
        assert_eq!(result, Err(CloseError::Declined));
        assert_eq!(overlay.state(), OverlayState::Open);
        assert_eq!(h.entries(), vec!["confirm Discard?"]);
        assert!(h.ctx.stack().is_front(&overlay));
    }

    /// Start opening with held animations, then start a confirmed dismiss that
    /// waits on its prompt.
    fn open_under_pending_close(h: &Harness, options: OverlayOptions) -> (Rc<Overlay>, RemoteHandle<Result<(), CloseError>>) {
        h.motion.hold(Hold::Pending);
        let ctx = h.ctx.clone();
        let opening = h.spawn(async move { crate::open(&ctx, options, None).await });
        h.settle();
        let overlay = h.ctx.stack().overlays()[0].clone();
        let closing = h.spawn(overlay.dismiss(Value::Null, CloseOptions::default().confirm("Discard?")));
        h.settle();
        assert_eq!(overlay.state(), OverlayState::Closing);
        h.motion.release();
        h.settle();
        assert!(overlay.was_ever_visible());
        assert!(h.block_on(opening).is_ok());
        (overlay, closing)
    }

    #[test]
    fn open_finishing_during_a_declined_close_still_opens() {
        let h = Harness::deferring();
        let opened = Rc::new(Cell::new(0));
        let o = opened.clone();
        let options = OverlayOptions::default().on(HookSlot::Opened, move |_, _| o.set(o.get() + 1));
        let (overlay, closing) = open_under_pending_close(&h, options);
        assert_eq!(opened.get(), 0);

        h.answer(false);
        assert_eq!(h.block_on(closing), Err(CloseError::Declined));
        assert_eq!(overlay.state(), OverlayState::Open);
        assert_eq!(opened.get(), 1);

        h.clear_log();
        h.block_on(overlay.dismiss(Value::Null, CloseOptions::default()))
            .unwrap();
        assert_eq!(
            h.entries(),
            vec!["animate ov-modal-box fade-out", "animate ov-modal-backdrop fade-out"]
        );
        assert_eq!(opened.get(), 1);
    }

    #[test]
    fn open_finishing_during_a_prevented_close_still_opens() {
        let h = Harness::deferring();
        let opened_events = Rc::new(Cell::new(0));
        let seen = opened_events.clone();
        let _sub = h.ctx.events().on(h.ctx.body(), "ov:layer:opened", Phase::Bubble, move |_| {
            seen.set(seen.get() + 1);
            Outcome::Continue
        });
        let options = OverlayOptions::default().on(HookSlot::Dismiss, |_, event| event.prevent_default());
        let (overlay, closing) = open_under_pending_close(&h, options);

        h.answer(true);
        assert_eq!(h.block_on(closing), Err(CloseError::Prevented));
        assert_eq!(overlay.state(), OverlayState::Open);
        assert_eq!(opened_events.get(), 1);
    }

    #[test]
    fn declined_close_before_the_open_settles_leaves_the_open_to_finish() {
        let h = Harness::deferring();
        h.motion.hold(Hold::Pending);
        let ctx = h.ctx.clone();
        let opening = h.spawn(async move { crate::open(&ctx, OverlayOptions::default(), None).await });
        h.settle();
        let overlay = h.ctx.stack().overlays()[0].clone();
        let closing = h.spawn(overlay.dismiss(Value::Null, CloseOptions::default().confirm("Discard?")));
        h.settle();
        h.answer(false);
        assert_eq!(h.block_on(closing), Err(CloseError::Declined));
        assert_eq!(overlay.state(), OverlayState::Attached);
        h.motion.release();
        assert!(h.block_on(opening).is_ok());
        assert_eq!(overlay.state(), OverlayState::Open);
        assert!(overlay.was_ever_visible());
    }

    #[test]
    fn accepted_confirmation_proceeds() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default());
        h.clear_log();
        h.block_on(overlay.accept(json!(true), CloseOptions::default().confirm("Save?")))
            .unwrap();
        assert_eq!(h.entries()[0], "confirm Save?");
        assert!(overlay.is_closed());
    }

    #[test]
    fn pre_close_hook_can_prevent() {
        let h = Harness::new();
        let overlay = h.open(
            OverlayOptions::default().on(HookSlot::Dismiss, |_, event| event.prevent_default()),
        );
        assert_eq!(
            h.block_on(overlay.dismiss(Value::Null, CloseOptions::default())),
            Err(CloseError::Prevented)
        );
        assert!(overlay.is_open());
        let forced = CloseOptions {
            preventable: false,
            ..CloseOptions::default()
        };
        h.block_on(overlay.dismiss(Value::Null, forced)).unwrap();
        assert!(overlay.is_closed());
    }

    #[test]
    fn pre_close_listener_can_prevent() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default());
        let _sub = h.ctx.events().on(
            overlay.parts().element.unwrap(),
            "ov:layer:accept",
            Phase::Bubble,
            |event| {
                event.prevent_default();
                Outcome::Continue
            },
        );
        assert_eq!(
            h.block_on(overlay.accept(Value::Null, CloseOptions::default())),
            Err(CloseError::Prevented)
        );
        assert_eq!(overlay.state(), OverlayState::Open);
    }

    #[test]
    fn closing_peels_overlays_above_first() {
        let h = Harness::new();
        let below = h.open(logging(&h, OverlayOptions::default()));
        let above = h.open(logging(&h, OverlayOptions::default().with_mode("popup")));
        h.clear_log();
        h.block_on(below.accept(json!("done"), CloseOptions::default()))
            .unwrap();
        assert!(above.is_closed());
        assert!(below.is_closed());
        assert_eq!(
            h.block_on(above.result()),
            Err(Dismissed { value: json!(":peel") })
        );
        let entries = h.entries();
        assert_eq!(entries[0], "on_accept elements=alive");
        assert_eq!(entries[1], "on_dismiss elements=alive");
        assert_eq!(entries[2], "on_dismissed elements=removed");
        assert!(!entries.iter().any(|e| e.contains("ov-popup")));
        assert!(h.ctx.stack().is_empty());
    }

    #[test]
    fn failed_close_animation_still_tears_down() {
        let h = Harness::new();
        let overlay = h.open(OverlayOptions::default());
        let finished = std::rc::Rc::new(std::cell::Cell::new(false));
        let f = finished.clone();
        h.motion.hold(Hold::Fail);
        let options = CloseOptions {
            on_finished: Some(std::rc::Rc::new(move || f.set(true))),
            ..CloseOptions::default()
        };
        let result = h.block_on(overlay.accept(json!(5), options));
        assert!(matches!(result, Err(CloseError::Motion(MotionError { .. }))));
        assert!(finished.get());
        assert!(overlay.is_closed());
        assert!(!h.ctx.document().is_alive(overlay.parts().element.unwrap()));
        assert_eq!(h.block_on(overlay.result()), Ok(json!(5)));
    }

    #[test]
    fn never_opened_overlay_only_fades_the_backdrop() {
        let h = Harness::new();
        h.motion.hold(Hold::Pending);
        let ctx = h.ctx.clone();
        let opening = h.spawn(async move { crate::open(&ctx, OverlayOptions::default(), None).await });
        h.settle();
        let overlay = h.ctx.stack().overlays()[0].clone();
        assert_eq!(overlay.state(), OverlayState::Attached);
        assert!(!overlay.was_ever_visible());
        h.motion.hold(Hold::Instant);
        h.clear_log();
        h.block_on(overlay.dismiss(Value::Null, CloseOptions::default()))
            .unwrap();
        assert_eq!(h.entries(), vec!["animate ov-modal-backdrop fade-out"]);
        h.motion.release();
        let opened = h.block_on(opening).unwrap();
        assert!(opened.is_closed());
        assert!(!opened.was_ever_visible());
    }
}
