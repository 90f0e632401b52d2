// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core document implementation: structure, updates, queries.

use alloc::string::String;
use alloc::vec::Vec;

use crate::types::{Element, ElementFlags, ElementId};

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Element tree with generational slots and a single focus cursor.
pub struct Document {
    nodes: Vec<Option<Node>>, // slots
    generations: Vec<u32>,    // last generation per slot (persists across frees)
    free_list: Vec<usize>,
    focused: Option<ElementId>,
}

impl core::fmt::Debug for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Document")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("focused", &self.focused)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    element: Element,
}

impl Node {
    fn new(generation: u32, element: Element) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            element,
        }
    }
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            focused: None,
        }
    }

    /// Insert a new element as the last child of `parent` (or as a detached root if `None`).
    pub fn insert(&mut self, parent: Option<ElementId>, element: Element) -> ElementId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, element));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ElementId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, element)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ElementId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = ElementId::new(idx, generation);
        if let Some(p) = parent.filter(|p| self.is_alive(*p)) {
            self.link_parent(id, p);
        }
        id
    }

    /// Create an element with `tag` and `attrs` and attach it under `parent`.
    pub fn affix<I, K, V>(&mut self, parent: ElementId, tag: &str, attrs: I) -> ElementId
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut element = Element::new(tag);
        for (name, value) in attrs {
            element.attrs.insert(name.into(), value.into());
        }
        self.insert(Some(parent), element)
    }

    /// Remove an element (and its subtree) from the document.
    ///
    /// Clears focus when the focused element is part of the removed subtree.
    pub fn remove(&mut self, id: ElementId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(focused) = self.focused
            && self.contains(id, focused)
        {
            self.focused = None;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        self.free_subtree(id);
    }

    /// Move `id` to be the last child of `new_parent` (or detach it if `None`).
    ///
    /// Ignored when `new_parent` lies inside the subtree of `id`.
    pub fn reparent(&mut self, id: ElementId, new_parent: Option<ElementId>) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(p) = new_parent
            && (!self.is_alive(p) || self.contains(id, p))
        {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        if let Some(p) = new_parent {
            self.link_parent(id, p);
        }
    }

    /// Returns true if `id` refers to a live element.
    pub fn is_alive(&self, id: ElementId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .map(|n| n.generation == id.generation())
            .unwrap_or(false)
    }

    /// Returns the element data if `id` is live.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.node_opt(id).map(|n| &n.element)
    }

    /// Returns mutable element data if `id` is live.
    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.node_opt_mut(id).map(|n| &mut n.element)
    }

    /// Returns the parent of `id`, if any.
    pub fn parent_of(&self, id: ElementId) -> Option<ElementId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// Returns the children of `id` in insertion order.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.node_opt(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Returns the tag name of `id`.
    pub fn tag(&self, id: ElementId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    /// Returns the value of an attribute of `id`.
    pub fn attr(&self, id: ElementId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    /// Returns true if `id` is live and carries the attribute.
    pub fn has_attr(&self, id: ElementId, name: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_attr(name))
    }

    /// Set an attribute on `id`.
    pub fn set_attr(&mut self, id: ElementId, name: impl Into<String>, value: impl Into<String>) {
        if let Some(e) = self.element_mut(id) {
            e.attrs.insert(name.into(), value.into());
        }
    }

    /// Remove an attribute from `id`, returning its previous value.
    pub fn remove_attr(&mut self, id: ElementId, name: &str) -> Option<String> {
        self.element_mut(id).and_then(|e| e.attrs.remove(name))
    }

    /// Returns the text content of `id`.
    pub fn text(&self, id: ElementId) -> Option<&str> {
        self.element(id).and_then(|e| e.text.as_deref())
    }

    /// Replace the text content of `id`.
    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) {
        if let Some(e) = self.element_mut(id) {
            e.text = Some(text.into());
        }
    }

    /// Returns the flags of `id` (empty for stale identifiers).
    pub fn flags(&self, id: ElementId) -> ElementFlags {
        self.element(id).map(|e| e.flags).unwrap_or_default()
    }

    /// Add flags to `id`.
    pub fn insert_flags(&mut self, id: ElementId, flags: ElementFlags) {
        if let Some(e) = self.element_mut(id) {
            e.flags |= flags;
        }
    }

    /// Returns true if `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        if !self.is_alive(ancestor) {
            return false;
        }
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.parent_of(id);
        }
        false
    }

    /// Returns the nearest element, starting at `id` itself and walking up, that satisfies `pred`.
    pub fn closest(&self, id: ElementId, pred: impl Fn(&Element) -> bool) -> Option<ElementId> {
        let mut cur = Some(id).filter(|id| self.is_alive(*id));
        while let Some(id) = cur {
            if pred(&self.node(id).element) {
                return Some(id);
            }
            cur = self.node(id).parent;
        }
        None
    }

    /// Returns the layer container owning `id`: the closest element marked [`ElementFlags::LAYER`].
    pub fn layer_of(&self, id: ElementId) -> Option<ElementId> {
        self.closest(id, |e| e.flags.contains(ElementFlags::LAYER))
    }

    /// Root→element path (inclusive). Empty for stale identifiers.
    pub fn path_to_root(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut cur = Some(id).filter(|id| self.is_alive(*id));
        while let Some(id) = cur {
            out.push(id);
            cur = self.node(id).parent;
        }
        out.reverse();
        out
    }

    /// Descendants of `root` (exclusive) in depth-first pre-order.
    pub fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// First descendant of `root` with the given tag.
    pub fn find_by_tag(&self, root: ElementId, tag: &str) -> Option<ElementId> {
        self.descendants(root)
            .into_iter()
            .find(|id| self.tag(*id) == Some(tag))
    }

    /// Move focus to `id`. Returns false (and keeps the current focus) if `id` is stale.
    pub fn focus(&mut self, id: ElementId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        self.focused = Some(id);
        true
    }

    /// Clear focus, returning the element that held it.
    pub fn blur(&mut self) -> Option<ElementId> {
        self.focused.take()
    }

    /// Currently focused element.
    pub fn focused(&self) -> Option<ElementId> {
        self.focused.filter(|id| self.is_alive(*id))
    }

    /// Currently focused element if it is a form field.
    pub fn focused_field(&self) -> Option<ElementId> {
        self.focused()
            .filter(|id| self.flags(*id).contains(ElementFlags::FIELD))
    }

    // --- internals ---

    fn node(&self, id: ElementId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling ElementId")
    }

    fn node_mut(&mut self, id: ElementId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling ElementId")
    }

    fn node_opt(&self, id: ElementId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.generation()).then_some(n)
    }

    fn node_opt_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.generation() {
            return None;
        }
        Some(n)
    }

    fn free_subtree(&mut self, id: ElementId) {
        let children = core::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.free_subtree(child);
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    fn link_parent(&mut self, id: ElementId, parent: ElementId) {
        self.node_mut(parent).children.push(id);
        self.node_mut(id).parent = Some(parent);
    }

    fn unlink_parent(&mut self, id: ElementId, parent: ElementId) {
        self.node_mut(parent).children.retain(|c| *c != id);
        self.node_mut(id).parent = None;
    }
}
