// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer stack: the root layer plus the overlays opened above it, bottom to top.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use overstory_dom::ElementId;

use crate::context::Context;
use crate::overlay::Overlay;

/// A layer: the root document or an overlay.
#[derive(Clone)]
pub enum Layer {
    /// The base document.
    Root,
    /// An overlay.
    Overlay(Rc<Overlay>),
}

impl Layer {
    /// Mode name; `root` for the base document.
    pub fn mode(&self) -> &str {
        match self {
            Self::Root => "root",
            Self::Overlay(overlay) => overlay.mode(),
        }
    }

    /// Visual nesting depth; zero for the base document.
    pub fn nesting(&self) -> u32 {
        match self {
            Self::Root => 0,
            Self::Overlay(overlay) => overlay.nesting(),
        }
    }

    /// The layer's container element.
    pub fn element(&self, ctx: &Context) -> Option<ElementId> {
        match self {
            Self::Root => Some(ctx.body()),
            Self::Overlay(overlay) => overlay.parts().element,
        }
    }

    /// The overlay, unless this is the base document.
    pub fn overlay(&self) -> Option<&Rc<Overlay>> {
        match self {
            Self::Root => None,
            Self::Overlay(overlay) => Some(overlay),
        }
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("root layer"),
            Self::Overlay(overlay) => fmt::Display::fmt(overlay, f),
        }
    }
}

/// Overlays above the root layer, bottom to top.
#[derive(Default)]
pub struct Stack {
    overlays: RefCell<Vec<Rc<Overlay>>>,
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.overlays.borrow().iter().map(|o| o.to_string()))
            .finish()
    }
}

impl Stack {
    pub(crate) fn push(&self, overlay: Rc<Overlay>) {
        self.overlays.borrow_mut().push(overlay);
    }

    pub(crate) fn remove(&self, overlay: &Rc<Overlay>) -> bool {
        let mut overlays = self.overlays.borrow_mut();
        let before = overlays.len();
        overlays.retain(|o| !Rc::ptr_eq(o, overlay));
        overlays.len() != before
    }

    /// The topmost layer.
    pub fn front(&self) -> Layer {
        self.overlays
            .borrow()
            .last()
            .cloned()
            .map_or(Layer::Root, Layer::Overlay)
    }

    /// Returns true if `overlay` is the topmost layer of the whole stack.
    pub fn is_front(&self, overlay: &Overlay) -> bool {
        self.overlays
            .borrow()
            .last()
            .is_some_and(|o| std::ptr::eq(Rc::as_ptr(o), overlay))
    }

    /// Overlays stacked above `overlay`, bottom to top.
    pub fn descendants(&self, overlay: &Overlay) -> Vec<Rc<Overlay>> {
        let overlays = self.overlays.borrow();
        overlays
            .iter()
            .position(|o| std::ptr::eq(Rc::as_ptr(o), overlay))
            .map(|i| overlays[i + 1..].to_vec())
            .unwrap_or_default()
    }

    /// All overlays, bottom to top.
    pub fn overlays(&self) -> Vec<Rc<Overlay>> {
        self.overlays.borrow().clone()
    }

    /// Number of overlays.
    pub fn len(&self) -> usize {
        self.overlays.borrow().len()
    }

    /// Returns true if only the root layer is open.
    pub fn is_empty(&self) -> bool {
        self.overlays.borrow().is_empty()
    }
}
