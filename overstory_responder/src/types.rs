// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for the responder: phases, outcomes, lookups, and dispatch steps.
//!
//! ## Overview
//!
//! These types describe the propagation protocol and its inputs/outputs.
//! They are referenced by the [`router`](crate::router), the [`listeners`](crate::listeners)
//! registry, and downstream toolkits.

/// Phases of event propagation.
///
/// Appears on each [`Dispatch`] item produced by
/// [`Router::dispatch_for`](crate::router::Router::dispatch_for), and selects
/// which steps a listener registered in [`Listeners`](crate::listeners::Listeners) hears.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Phase {
    /// Root-to-target traversal.
    Capture,
    /// Target node.
    Target,
    /// Target-to-root traversal.
    Bubble,
}

/// Handler outcome controlling propagation.
///
/// Returned by per-node delivery callbacks passed to [`run`](crate::router::run).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Keep propagating.
    Continue,
    /// Stop propagation after the current node.
    Stop,
    /// Stop immediately and mark the event consumed (default prevented).
    StopAndConsume,
}

/// Look up the parent of a node to reconstruct a root→target path for propagation.
///
/// The [router](crate::router::Router) consults this to build the capture and bubble legs.
pub trait ParentLookup<K> {
    /// Returns the parent of `node`, or `None` if `node` is a root.
    fn parent_of(&self, node: &K) -> Option<K>;
}

impl<K, P: ParentLookup<K> + ?Sized> ParentLookup<K> for &P {
    #[inline]
    fn parent_of(&self, node: &K) -> Option<K> {
        (**self).parent_of(node)
    }
}

/// A no‑op parent provider used by default when no parent lookup is needed.
///
/// Used by [`Router::new`](crate::router::Router::new). All calls to
/// [`ParentLookup::parent_of`] return `None`, so every path is a singleton.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoParent;

impl<K> ParentLookup<K> for NoParent {
    #[inline]
    fn parent_of(&self, _node: &K) -> Option<K> {
        None
    }
}

/// A single dispatch step.
///
/// Produced by [`Router::dispatch_for`](crate::router::Router::dispatch_for), and typically fed
/// into [`run`](crate::router::run), which invokes handlers in [`Capture`](Phase::Capture), then
/// [`Target`](Phase::Target), then [`Bubble`](Phase::Bubble) order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Dispatch<K> {
    /// Propagation phase for this step.
    pub phase: Phase,
    /// Node associated with this step.
    pub node: K,
}
