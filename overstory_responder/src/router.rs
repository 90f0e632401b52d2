// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Router implementation.
//!
//! ## Overview
//!
//! Reconstructs the root→target path of a node and emits dispatch steps.
//! Produces a capture → target → bubble sequence for that path, then [`run`]
//! walks the sequence and honors [`Outcome`] from each delivery.
//!
//! ## Sequence shape
//!
//! - Capture: root→target, inclusive.
//! - Target: the target node once.
//! - Bubble: target→root, inclusive.
//!
//! A listener hears the steps of the phase it registered for, so a node on the
//! path is visited at most once per listener.

use alloc::vec::Vec;

use crate::types::{Dispatch, NoParent, Outcome, ParentLookup, Phase};

/// Deterministic propagation-path router.
///
/// ## Usage
///
/// - Construct with [`Router::new`] for flat targets (singleton paths), or with
///   [`Router::with_parent`] to reconstruct paths via a [`ParentLookup`].
/// - Call [`Router::dispatch_for`] for each event to get the dispatch sequence,
///   and hand that to [`run`].
pub struct Router<K, P: ParentLookup<K> = NoParent> {
    parent: P,
    _phantom: core::marker::PhantomData<fn() -> K>,
}

impl<K, P: ParentLookup<K>> core::fmt::Debug for Router<K, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Router").finish_non_exhaustive()
    }
}

impl<K: Copy + Eq, P: ParentLookup<K> + Default> Router<K, P> {
    /// Create a router with a default parent lookup.
    pub fn new() -> Self {
        Self {
            parent: P::default(),
            _phantom: core::marker::PhantomData,
        }
    }
}

impl<K: Copy + Eq, P: ParentLookup<K> + Default> Default for Router<K, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq, P: ParentLookup<K>> Router<K, P> {
    /// Create a router with an explicit parent lookup provider.
    pub fn with_parent(parent: P) -> Self {
        Self {
            parent,
            _phantom: core::marker::PhantomData,
        }
    }

    /// Root→target path for `target` as seen by this router's parent lookup.
    pub fn path_for(&self, target: K) -> Vec<K> {
        let mut out = Vec::new();
        let mut cur = target;
        // Collect to root; caller ensures acyclic ancestry.
        loop {
            out.push(cur);
            match self.parent.parent_of(&cur) {
                Some(p) => cur = p,
                None => break,
            }
        }
        out.reverse();
        out
    }

    /// Produce the capture → target → bubble sequence for `target`.
    pub fn dispatch_for(&self, target: K) -> Vec<Dispatch<K>> {
        let path = self.path_for(target);
        let mut out = Vec::with_capacity(path.len() * 2 + 1);
        // Capture: root→target
        for &node in &path {
            out.push(Dispatch {
                phase: Phase::Capture,
                node,
            });
        }
        // Target
        out.push(Dispatch {
            phase: Phase::Target,
            node: target,
        });
        // Bubble: target→root
        for &node in path.iter().rev() {
            out.push(Dispatch {
                phase: Phase::Bubble,
                node,
            });
        }
        out
    }
}

/// Walk a dispatch sequence, delivering each step until a delivery stops propagation.
///
/// Returns true if the event was consumed ([`Outcome::StopAndConsume`]).
pub fn run<K>(seq: &[Dispatch<K>], mut deliver: impl FnMut(&Dispatch<K>) -> Outcome) -> bool {
    for step in seq {
        match deliver(step) {
            Outcome::Continue => {}
            Outcome::Stop => return false,
            Outcome::StopAndConsume => return true,
        }
    }
    false
}
