// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Focus trap for an overlay.

use std::rc::Rc;

use overstory_dom::{ElementFlags, ElementId};
use overstory_responder::types::{Outcome, Phase};

use crate::context::Context;
use crate::events::Subscription;
use crate::overlay::Overlay;

/// Keeps focus inside the overlay while it is the front layer, and gives focus
/// back to whatever held it before once torn down.
#[derive(Debug)]
pub struct OverlayFocus {
    subscription: Subscription,
    previous: Option<ElementId>,
}

impl OverlayFocus {
    /// Mark the overlay as a modal dialog, focus its box, and start trapping focus.
    pub fn new(overlay: &Rc<Overlay>) -> Self {
        let ctx = overlay.context();
        let parts = overlay.parts();
        let previous = {
            let mut doc = ctx.document_mut();
            if let Some(element) = parts.element {
                doc.set_attr(element, "role", "dialog");
                doc.set_attr(element, "aria-modal", "true");
            }
            if let Some(box_element) = parts.box_element {
                doc.set_attr(box_element, "tabindex", "-1");
                doc.insert_flags(box_element, ElementFlags::FOCUSABLE);
            }
            doc.focused()
        };
        if let Some(box_element) = parts.box_element {
            ctx.events().focus(box_element);
        }
        let weak = Rc::downgrade(overlay);
        let subscription = ctx
            .events()
            .on(ctx.body(), "focusin", Phase::Capture, move |event| {
                let Some(overlay) = weak.upgrade() else {
                    return Outcome::Continue;
                };
                let parts = overlay.parts();
                let (Some(element), Some(box_element)) = (parts.element, parts.box_element) else {
                    return Outcome::Continue;
                };
                if !overlay.is_open() || !overlay.is_front() {
                    return Outcome::Continue;
                }
                let mut doc = overlay.context().document_mut();
                if doc.contains(element, event.target) {
                    return Outcome::Continue;
                }
                doc.focus(box_element);
                Outcome::StopAndConsume
            });
        Self {
            subscription,
            previous,
        }
    }

    /// Stop trapping and restore the previous focus if that element still exists.
    pub fn teardown(self, ctx: &Context) {
        self.subscription.unsubscribe();
        if let Some(previous) = self.previous {
            let alive = ctx.document().is_alive(previous);
            if alive {
                ctx.events().focus(previous);
            }
        }
    }
}
