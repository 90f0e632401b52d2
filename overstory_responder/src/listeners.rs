// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener registry: which handlers hear which node, event type, and phase.
//!
//! ## Usage
//!
//! 1) Register handlers with [`Listeners::add`] and keep the returned [`ListenerId`].
//! 2) For each step of a dispatch sequence, call [`Listeners::matching`] to get
//!    the handlers to invoke (cloned, so the registry can be mutated by the
//!    handlers themselves).
//! 3) Remove handlers with [`Listeners::remove`] when their owner goes away.
//!
//! ## Minimal example
//!
//! ```
//! use overstory_responder::listeners::Listeners;
//! use overstory_responder::types::Phase;
//!
//! let mut listeners: Listeners<u32, &'static str> = Listeners::new();
//! let id = listeners.add(7, "click", Phase::Bubble, "close");
//! assert_eq!(listeners.matching(&7, Phase::Bubble, "click"), vec!["close"]);
//! assert!(listeners.matching(&7, Phase::Capture, "click").is_empty());
//! assert!(listeners.remove(id));
//! assert!(listeners.is_empty());
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use crate::types::Phase;

/// Handle of a registered listener.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ListenerId(u64);

struct Entry<K, H> {
    id: ListenerId,
    node: K,
    event_type: String,
    phase: Phase,
    handler: H,
}

/// Handlers keyed by node, event type, and phase, in registration order.
pub struct Listeners<K, H> {
    entries: Vec<Entry<K, H>>,
    next_id: u64,
}

impl<K, H> core::fmt::Debug for Listeners<K, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.len())
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl<K, H> Default for Listeners<K, H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }
}

impl<K: PartialEq, H: Clone> Listeners<K, H> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event_type` on `node` during `phase`.
    pub fn add(
        &mut self,
        node: K,
        event_type: impl Into<String>,
        phase: Phase,
        handler: H,
    ) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push(Entry {
            id,
            node,
            event_type: event_type.into(),
            phase,
            handler,
        });
        id
    }

    /// Remove a listener. Returns false if it was not registered (already removed).
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Drop every listener whose node fails `keep`. Returns the number removed.
    pub fn retain_nodes(&mut self, keep: impl Fn(&K) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| keep(&e.node));
        before - self.entries.len()
    }

    /// Handlers registered for `node`, `phase`, and `event_type`, in registration order.
    pub fn matching(&self, node: &K, phase: Phase, event_type: &str) -> Vec<H> {
        self.entries
            .iter()
            .filter(|e| e.phase == phase && e.node == *node && e.event_type == event_type)
            .map(|e| e.handler.clone())
            .collect()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
