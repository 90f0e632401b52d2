// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overstory DOM: a small, `no_std` element tree for layered UI surfaces.
//!
//! Overstory DOM is the structural building block underneath Overstory layers.
//!
//! - Represents a hierarchy of elements, each with a tag, ordered attributes, optional text, and [`ElementFlags`].
//! - Hands out generational [`ElementId`]s that never alias after removal.
//! - Answers the ancestry questions an event system needs: [`Document::path_to_root`],
//!   [`Document::contains`], [`Document::closest`], and [`Document::layer_of`].
//! - Tracks a single focus cursor, including whether the focused element is a form field.
//!
//! ## Not a renderer
//!
//! This crate does not lay out, style, or paint anything.
//! Positions, sizes, and stacking are the business of whatever renders the tree.
//!
//! ## Layers
//!
//! An element marked [`ElementFlags::LAYER`] is a layer container.
//! It owns every descendant up to the next nested layer container, which is how
//! event listeners scoped to a layer decide whether an event belongs to them.
//!
//! ## Minimal usage
//!
//! ```
//! use overstory_dom::{Document, Element, ElementFlags};
//!
//! let mut doc = Document::new();
//! let body = doc.insert(None, Element::new("body").with_flags(ElementFlags::LAYER));
//! let modal = doc.insert(Some(body), Element::new("ov-modal").with_flags(ElementFlags::LAYER));
//! let button = doc.affix(modal, "ov-modal-dismiss", [("aria-label", "Dismiss dialog")]);
//!
//! assert_eq!(doc.layer_of(button), Some(modal));
//! assert_eq!(doc.path_to_root(button), vec![body, modal, button]);
//!
//! doc.remove(modal);
//! assert!(!doc.is_alive(button));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod document;
mod types;

pub use document::Document;
pub use types::{Element, ElementFlags, ElementId};
