// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Open change: build an overlay above the current front layer and animate it in.

use std::rc::Rc;

use overstory_dom::ElementId;
use tracing::debug;

use crate::config::{HookSlot, OverlayOptions};
use crate::context::Context;
use crate::error::OverlayError;
use crate::events::Event;
use crate::overlay::{Overlay, OverlayState};

/// Open an overlay showing `content`.
///
/// Options are resolved before anything touches the document, so configuration
/// errors leave no trace. A listener preventing `ov:layer:open` on the front
/// layer's element aborts with [`OverlayError::OpenPrevented`]. The returned
/// overlay is already on the stack when the open animation fails.
pub async fn open(
    ctx: &Rc<Context>,
    options: OverlayOptions,
    content: Option<ElementId>,
) -> Result<Rc<Overlay>, OverlayError> {
    let overlay = Overlay::new(ctx, options)?;

    let parent = overlay.parent().element(ctx).unwrap_or(ctx.body());
    let event = ctx.events().emit(Event::new("ov:layer:open", parent));
    if event.default_prevented() {
        debug!(overlay = %overlay, "open prevented");
        return Err(OverlayError::OpenPrevented);
    }

    overlay.create_elements(content);
    ctx.stack().push(Rc::clone(&overlay));
    overlay.setup_handlers();
    debug!(overlay = %overlay, nesting = overlay.nesting(), "attached");

    overlay.start_open_animation().await?;

    // A pending close finishes the open itself if it is declined or prevented.
    if overlay.state() == OverlayState::Attached {
        overlay.finish_open();
    }
    Ok(overlay)
}

impl Overlay {
    /// Enter [`OverlayState::Open`], then run the opened hook and emit `ov:layer:opened`.
    pub(crate) fn finish_open(self: &Rc<Self>) {
        self.state.set(OverlayState::Open);
        let element = self.parts().element.unwrap_or(self.ctx.body());
        let mut event = Event::new("ov:layer:opened", element);
        if let Some(hook) = self.callback(HookSlot::Opened) {
            hook(&mut event);
        }
        self.ctx.events().emit(event);
        debug!(overlay = %self, "opened");
    }
}
