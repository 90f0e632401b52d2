// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapter for Overstory DOM.
//!
//! ## Feature
//!
//! Enable with `dom_adapter`.
//!
//! ## Notes
//!
//! The document's parent links drive path reconstruction, so a router built with
//! [`Router::with_parent`](crate::router::Router::with_parent) over `&Document`
//! propagates along the element ancestry. Stale identifiers produce a singleton path.

use alloc::vec::Vec;

use overstory_dom::{Document, ElementId};

use crate::router::Router;
use crate::types::{Dispatch, ParentLookup};

impl ParentLookup<ElementId> for Document {
    #[inline]
    fn parent_of(&self, node: &ElementId) -> Option<ElementId> {
        Document::parent_of(self, *node)
    }
}

/// Build the capture → target → bubble sequence for `target` in `document`.
///
/// Returns an empty sequence if `target` is stale.
pub fn dispatch_in(document: &Document, target: ElementId) -> Vec<Dispatch<ElementId>> {
    if !document.is_alive(target) {
        return Vec::new();
    }
    Router::with_parent(document).dispatch_for(target)
}
