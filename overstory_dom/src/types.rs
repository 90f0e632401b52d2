// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the element tree: identifiers, flags, and element data.

use alloc::collections::BTreeMap;
use alloc::string::String;

/// Identifier for an element in a [`Document`](crate::Document).
///
/// A small, copyable handle made of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any existing `ElementId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `ElementId`.
///
/// Stale identifiers never alias a different live element because the generation must match.
/// Use [`Document::is_alive`](crate::Document::is_alive) to check liveness.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ElementId(pub(crate) u32, pub(crate) u32);

impl ElementId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

bitflags::bitflags! {
    /// Behavioral markers carried by an element.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ElementFlags: u8 {
        /// The element is the container of a layer; it owns every descendant
        /// up to the next nested layer container.
        const LAYER     = 0b0000_0001;
        /// The element is a scrollable viewport.
        const VIEWPORT  = 0b0000_0010;
        /// The element is a form field that can hold text focus.
        const FIELD     = 0b0000_0100;
        /// The element can receive focus.
        const FOCUSABLE = 0b0000_1000;
    }
}

/// Data stored for a single element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag name, e.g. `ov-modal-box`.
    pub tag: String,
    /// Attributes, ordered by name.
    pub attrs: BTreeMap<String, String>,
    /// Optional text content.
    pub text: Option<String>,
    /// Behavioral markers.
    pub flags: ElementFlags,
}

impl Element {
    /// Create an element with the given tag and no attributes.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Builder: set an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Builder: set the text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder: add flags.
    #[must_use]
    pub fn with_flags(mut self, flags: ElementFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Returns the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Returns true if the attribute is present (even when empty).
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }
}
