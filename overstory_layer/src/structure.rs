// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element structure of an overlay and its open/close animations.
//!
//! ```text
//! ov-<mode>                 layer container (align, position, size, class, nesting)
//! ├── ov-<mode>-backdrop    when configured
//! └── ov-<mode>-viewport    when configured; otherwise the box sits in the container
//!     └── ov-<mode>-box
//!         ├── ov-<mode>-content
//!         └── ov-<mode>-dismiss
//! ```

use futures::FutureExt;
use overstory_dom::{Element, ElementFlags, ElementId};
use tracing::trace;

use crate::error::MotionError;
use crate::motion::{self, Animation, MotionFuture, MotionOptions, settle_all};
use crate::overlay::{CloseOptions, Overlay, Parts};
use crate::stack::Layer;
use crate::triggers::DISMISS_ATTR;

/// Attribute marking a viewport so viewport lookups can find it.
pub const VIEWPORT_ATTR: &str = "ov-viewport";

/// Visual nesting depth of a new overlay of `mode` above `parent`.
///
/// Same-mode overlays stack their depths; a different mode starts over at zero.
pub fn suggest_visual_nesting(mode: &str, parent: &Layer) -> u32 {
    if parent.mode() == mode {
        parent.nesting() + 1
    } else {
        0
    }
}

/// Tag of `part` for overlays of `mode`, e.g. `ov-modal-box`.
pub fn selector(mode: &str, part: &str) -> String {
    format!("ov-{mode}-{part}")
}

impl Overlay {
    fn update_parts(&self, f: impl FnOnce(&mut Parts)) {
        let mut parts = self.parts.get();
        f(&mut parts);
        self.parts.set(parts);
    }

    fn affix_part(&self, parent: ElementId, part: &str) -> ElementId {
        let tag = selector(&self.config.mode, part);
        self.ctx
            .document_mut()
            .insert(Some(parent), Element::new(tag))
    }

    /// Build the container, backdrop, viewport, box, and content elements, moving
    /// `content` into the content element.
    pub(crate) fn create_elements(&self, content: Option<ElementId>) {
        let element = self.create_element();
        if self.config.backdrop {
            self.create_backdrop_element(element);
        }
        let box_parent = if self.config.viewport {
            self.create_viewport_element(element)
        } else {
            element
        };
        let box_element = self.create_box_element(box_parent);
        self.create_content_element(box_element, content);
    }

    fn create_element(&self) -> ElementId {
        let config = &self.config;
        let mut element = Element::new(format!("ov-{}", config.mode))
            .with_attr("nesting", self.nesting.to_string())
            .with_flags(ElementFlags::LAYER);
        for (name, value) in [
            ("align", &config.align),
            ("position", &config.position),
            ("size", &config.size),
            ("class", &config.class),
        ] {
            if let Some(value) = value {
                element = element.with_attr(name, value.as_str());
            }
        }
        let id = self
            .ctx
            .document_mut()
            .insert(Some(self.ctx.body()), element);
        self.update_parts(|p| p.element = Some(id));
        id
    }

    fn create_backdrop_element(&self, parent: ElementId) -> ElementId {
        let id = self.affix_part(parent, "backdrop");
        self.update_parts(|p| p.backdrop = Some(id));
        id
    }

    fn create_viewport_element(&self, parent: ElementId) -> ElementId {
        let id = self.affix_part(parent, "viewport");
        {
            let mut doc = self.ctx.document_mut();
            doc.set_attr(id, VIEWPORT_ATTR, "");
            doc.insert_flags(id, ElementFlags::VIEWPORT);
        }
        self.update_parts(|p| p.viewport = Some(id));
        id
    }

    fn create_box_element(&self, parent: ElementId) -> ElementId {
        let id = self.affix_part(parent, "box");
        self.update_parts(|p| p.box_element = Some(id));
        id
    }

    fn create_content_element(&self, parent: ElementId, content: Option<ElementId>) -> ElementId {
        let id = self.affix_part(parent, "content");
        if let Some(content) = content {
            self.ctx.document_mut().reparent(content, Some(id));
        }
        self.update_parts(|p| p.content = Some(id));
        id
    }

    /// Dismiss button inside the box. The accessible name lives on the button; the
    /// visible label is decorative.
    pub(crate) fn create_dismiss_element(&self) -> Option<ElementId> {
        let box_element = self.parts.get().box_element?;
        let tag = selector(&self.config.mode, "dismiss");
        let id = {
            let mut doc = self.ctx.document_mut();
            let id = doc.affix(
                box_element,
                &tag,
                [
                    (DISMISS_ATTR, "\":button\""),
                    ("aria-label", self.config.dismiss_aria_label.as_str()),
                    ("role", "button"),
                ],
            );
            let label = doc.affix(id, "span", [("aria-hidden", "true")]);
            doc.set_text(label, self.config.dismiss_label.as_str());
            id
        };
        self.update_parts(|p| p.dismiss = Some(id));
        Some(id)
    }

    fn animate(
        &self,
        element: Option<ElementId>,
        animation: &Animation,
        options: &MotionOptions,
    ) -> Option<MotionFuture> {
        let element = element?;
        trace!(overlay = %self, animation = animation.name(), "animate");
        let doc = self.ctx.document();
        self.ctx.motion().animate(&doc, element, animation, options)
    }

    /// Run the box and backdrop open animations together. Marks the overlay as
    /// visible once both settled successfully, unless it closed meanwhile.
    pub(crate) async fn start_open_animation(&self) -> Result<(), MotionError> {
        let settings = &self.config.open_motion;
        let parts = self.parts.get();
        let box_animation = self.animate(parts.box_element, &settings.animation, &settings.options);
        let backdrop_animation = if self.ctx.motion().is_none(&settings.animation) {
            None
        } else {
            self.animate(parts.backdrop, &settings.backdrop_animation, &settings.options)
        };
        settle_all(vec![box_animation, backdrop_animation]).await?;
        // A finished close has already removed the elements.
        if !self.is_closed() {
            self.was_ever_visible.set(true);
        }
        Ok(())
    }

    /// Run the close animations. The box only animates if it was ever visible.
    pub(crate) fn start_close_animation(&self, options: &CloseOptions) -> Option<MotionFuture> {
        let settings = &self.config.close_motion;
        let animation = options
            .animation
            .clone()
            .unwrap_or_else(|| settings.animation.clone());
        let timing = MotionOptions {
            duration: options.duration.or(settings.options.duration),
            easing: options
                .easing
                .clone()
                .or_else(|| settings.options.easing.clone()),
        };
        let parts = self.parts.get();
        let box_animation = if self.was_ever_visible.get() {
            self.animate(parts.box_element, &animation, &timing)
        } else {
            None
        };
        let backdrop_animation = if self.ctx.motion().is_none(&animation) {
            None
        } else {
            self.animate(parts.backdrop, &settings.backdrop_animation, &timing)
        };
        if box_animation.is_none() && backdrop_animation.is_none() {
            return None;
        }
        Some(settle_all(vec![box_animation, backdrop_animation]).boxed_local())
    }

    /// Animate the elements out, then remove them. Removal and `on_finished` run
    /// even when an animation fails; the failure is returned afterwards.
    pub(crate) async fn destroy_elements(&self, options: &CloseOptions) -> Result<(), MotionError> {
        let animation = self.start_close_animation(options);
        let result = match self.parts.get().element {
            Some(element) => motion::destroy(self.ctx.document_handle(), element, animation).await,
            None => match animation {
                Some(animation) => animation.await,
                None => Ok(()),
            },
        };
        self.on_elements_removed();
        if let Some(on_finished) = &options.on_finished {
            on_finished();
        }
        result
    }

    fn on_elements_removed(&self) {
        let pruned = self.ctx.events().prune();
        trace!(overlay = %self, pruned, "elements removed");
    }
}
