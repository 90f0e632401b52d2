// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overstory Layer: overlays stacked above a base document.
//!
//! An overlay is a dialog, drawer, cover, or popup opened above the current front
//! layer. This crate owns its whole lifecycle:
//!
//! - Builds the element structure (container, backdrop, viewport, box, content,
//!   dismiss button) in an [`overstory_dom::Document`].
//! - Animates it in and out through an injected [`Motion`] engine.
//! - Wires the ways a close may be requested: closer attributes
//!   ([`ACCEPT_ATTR`](triggers::ACCEPT_ATTR), [`DISMISS_ATTR`](triggers::DISMISS_ATTR)),
//!   outside clicks, the Escape key, named events, and location patterns.
//! - Runs the accept/dismiss protocol and hands the outcome to the opener.
//!
//! ## Minimal usage
//!
//! ```
//! use futures::executor::LocalPool;
//! use overstory_layer::{Context, Dismissed, OverlayOptions, open};
//! use serde_json::json;
//!
//! let mut pool = LocalPool::new();
//! let ctx = Context::builder(pool.spawner()).build();
//!
//! let overlay = pool
//!     .run_until(open(&ctx, OverlayOptions::default().with_mode("popup"), None))
//!     .unwrap();
//! let result = overlay.result();
//!
//! // Pressing Escape dismisses the front overlay.
//! ctx.events().press_key("Escape");
//! pool.run_until_stalled();
//!
//! assert!(overlay.is_closed());
//! assert_eq!(pool.run_until(result), Err(Dismissed { value: json!(":key") }));
//! ```
//!
//! ## Threading
//!
//! Everything here is single-threaded. Close requests raised by event handlers
//! are spawned on the [`futures::task::LocalSpawn`] given to [`Context::builder`].

mod close;
mod config;
mod context;
mod dismiss;
mod error;
mod events;
mod focus;
mod motion;
mod open;
mod overlay;
mod pattern;
mod stack;
mod structure;
pub mod triggers;

#[cfg(test)]
mod testing;

pub use config::{Callbacks, Config, Hook, HookSlot, ModeConfig, OverlayConfig, OverlayOptions};
pub use context::{AlwaysConfirm, Confirm, Context, ContextBuilder};
pub use dismiss::{DismissMethods, DismissPolicy, DismissableSetting};
pub use error::{CloseError, Dismissed, MotionError, OverlayError};
pub use events::{Event, EventHub, EventId, Handler, Subscription};
pub use focus::OverlayFocus;
pub use motion::{
    AnimateFn, Animation, InstantMotion, Motion, MotionFuture, MotionOptions, MotionSettings,
    destroy, settle_all,
};
pub use open::open;
pub use overlay::{CloseOptions, Overlay, OverlayState, Parts, Resolution, Verb};
pub use pattern::UrlPattern;
pub use stack::{Layer, Stack};
pub use structure::{VIEWPORT_ATTR, selector, suggest_visual_nesting};

pub use overstory_responder::types::{Outcome, Phase};
