// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overstory Responder: deterministic, `no_std` event propagation for layered UIs.
//!
//! ## Overview
//!
//! This crate builds the propagation sequence (capture → target → bubble) for a target node,
//! keeps a registry of listeners keyed by node, event type, and phase, and walks the sequence
//! while honoring each delivery's [`Outcome`](crate::types::Outcome).
//! It does not perform hit testing; events arrive with their target already known.
//!
//! ## Inputs
//!
//! Provide a target node and a [`ParentLookup`](crate::types::ParentLookup) so the
//! [`Router`](crate::router::Router) can reconstruct the root→target path.
//! With the `dom_adapter` feature, `overstory_dom::Document` is such a lookup.
//!
//! ## Outcomes
//!
//! - [`Continue`](crate::types::Outcome::Continue): keep propagating.
//! - [`Stop`](crate::types::Outcome::Stop): finish the current node, then stop.
//! - [`StopAndConsume`](crate::types::Outcome::StopAndConsume): stop immediately and report the event consumed.
//!
//! ## Layering
//!
//! The router only computes the traversal order, and the registry only stores handlers.
//! A higher‑level dispatcher decides what an event is, clones the matching handlers for
//! each step (so handlers may register or remove listeners while running), and applies
//! toolkit policies such as "halt" (stop and prevent default).
//!
//! ## Dispatcher sketch
//!
//! ```
//! use overstory_responder::listeners::Listeners;
//! use overstory_responder::router::{run, Router};
//! use overstory_responder::types::{Outcome, ParentLookup};
//!
//! struct Parents;
//! impl ParentLookup<u32> for Parents {
//!     fn parent_of(&self, node: &u32) -> Option<u32> {
//!         (*node > 1).then(|| node - 1)
//!     }
//! }
//!
//! let mut listeners: Listeners<u32, fn(u32) -> Outcome> = Listeners::new();
//! listeners.add(1, "click", overstory_responder::types::Phase::Bubble, |_| Outcome::StopAndConsume);
//!
//! let seq = Router::with_parent(Parents).dispatch_for(3);
//! let consumed = run(&seq, |step| {
//!     let mut outcome = Outcome::Continue;
//!     for handler in listeners.matching(&step.node, step.phase, "click") {
//!         match handler(step.node) {
//!             Outcome::StopAndConsume => return Outcome::StopAndConsume,
//!             Outcome::Stop => outcome = Outcome::Stop,
//!             Outcome::Continue => {}
//!         }
//!     }
//!     outcome
//! });
//! assert!(consumed);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod adapters;
pub mod listeners;
pub mod router;
pub mod types;
