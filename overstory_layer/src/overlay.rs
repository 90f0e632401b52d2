// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The overlay: state machine, public lifecycle operations, and the opener's result.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{LocalBoxFuture, Shared};
use futures::task::LocalSpawnExt;
use overstory_dom::ElementId;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::close;
use crate::config::{HookSlot, OverlayConfig, OverlayOptions};
use crate::context::Context;
use crate::error::{CloseError, Dismissed, OverlayError};
use crate::events::{Event, EventId, Subscription};
use crate::focus::OverlayFocus;
use crate::motion::Animation;
use crate::stack::Layer;
use crate::structure::suggest_visual_nesting;

/// What the opener receives: the accepted value, or the dismissal.
pub type Resolution = Result<Value, Dismissed>;

/// Lifecycle state. Moves forward only, except that a declined or prevented close
/// returns to the state it left, or to `Open` if the open animation finished meanwhile.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum OverlayState {
    /// Built, not yet wired.
    Constructed,
    /// Elements exist and handlers are wired; the open animation may still run.
    Attached,
    /// The open animation settled.
    Open,
    /// A close is in flight.
    Closing,
    /// Elements and handlers are gone. Terminal.
    Closed,
}

/// Kind of close outcome.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Verb {
    /// Resolve the opener with a value.
    Accept,
    /// Reject the opener with a value.
    Dismiss,
}

impl Verb {
    /// Preventable event emitted on the overlay before closing.
    pub fn pre_event(self) -> &'static str {
        match self {
            Self::Accept => "ov:layer:accept",
            Self::Dismiss => "ov:layer:dismiss",
        }
    }

    /// Event emitted on the parent layer after the overlay's elements are gone.
    pub fn post_event(self) -> &'static str {
        match self {
            Self::Accept => "ov:layer:accepted",
            Self::Dismiss => "ov:layer:dismissed",
        }
    }

    pub(crate) fn pre_hook(self) -> HookSlot {
        match self {
            Self::Accept => HookSlot::Accept,
            Self::Dismiss => HookSlot::Dismiss,
        }
    }

    pub(crate) fn post_hook(self) -> HookSlot {
        match self {
            Self::Accept => HookSlot::Accepted,
            Self::Dismiss => HookSlot::Dismissed,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Accept => "accept",
            Self::Dismiss => "dismiss",
        })
    }
}

/// Options of one close request.
#[derive(Clone)]
pub struct CloseOptions {
    /// Replaces the configured close animation.
    pub animation: Option<Animation>,
    /// Replaces the configured close duration.
    pub duration: Option<Duration>,
    /// Replaces the configured close easing.
    pub easing: Option<String>,
    /// Ask for confirmation with this message first.
    pub confirm: Option<String>,
    /// Element that requested the close.
    pub origin: Option<ElementId>,
    /// Whether hooks and listeners may prevent the close. Defaults to true.
    pub preventable: bool,
    /// Runs once the elements have been removed.
    pub on_finished: Option<Rc<dyn Fn()>>,
}

impl Default for CloseOptions {
    fn default() -> Self {
        Self {
            animation: None,
            duration: None,
            easing: None,
            confirm: None,
            origin: None,
            preventable: true,
            on_finished: None,
        }
    }
}

impl fmt::Debug for CloseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseOptions")
            .field("animation", &self.animation)
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .field("confirm", &self.confirm)
            .field("origin", &self.origin)
            .field("preventable", &self.preventable)
            .field("on_finished", &self.on_finished.is_some())
            .finish()
    }
}

impl CloseOptions {
    /// Close without animating.
    #[must_use]
    pub fn instant(mut self) -> Self {
        self.animation = Some(Animation::None);
        self
    }

    /// Ask for confirmation first.
    #[must_use]
    pub fn confirm(mut self, message: impl Into<String>) -> Self {
        self.confirm = Some(message.into());
        self
    }
}

/// Elements owned by an overlay. Each exists at most once.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Parts {
    /// Layer container.
    pub element: Option<ElementId>,
    /// Backdrop, when configured.
    pub backdrop: Option<ElementId>,
    /// Scrollable viewport, when configured.
    pub viewport: Option<ElementId>,
    /// The box.
    pub box_element: Option<ElementId>,
    /// Wrapper around the caller's content.
    pub content: Option<ElementId>,
    /// Dismiss button, when button dismissal is enabled.
    pub dismiss: Option<ElementId>,
}

/// A stacked surface above its parent layer.
pub struct Overlay {
    pub(crate) ctx: Rc<Context>,
    pub(crate) config: OverlayConfig,
    pub(crate) parent: Layer,
    pub(crate) nesting: u32,
    pub(crate) state: Cell<OverlayState>,
    pub(crate) parts: Cell<Parts>,
    pub(crate) location: RefCell<Option<String>>,
    pub(crate) was_ever_visible: Cell<bool>,
    pub(crate) subscriptions: RefCell<Vec<Subscription>>,
    pub(crate) focus: RefCell<Option<OverlayFocus>>,
    pub(crate) last_outside_event: Cell<Option<EventId>>,
    resolver: RefCell<Option<oneshot::Sender<Resolution>>>,
    resolution: Shared<oneshot::Receiver<Resolution>>,
}

impl Overlay {
    /// Resolve `options` and build an overlay above the current front layer.
    ///
    /// Nothing is attached to the document yet; see [`open`](crate::open).
    pub fn new(ctx: &Rc<Context>, options: OverlayOptions) -> Result<Rc<Self>, OverlayError> {
        let config = ctx.config().resolve(options)?;
        let parent = ctx.stack().front();
        let nesting = config
            .nesting
            .unwrap_or_else(|| suggest_visual_nesting(&config.mode, &parent));
        let (resolver, resolution) = oneshot::channel();
        Ok(Rc::new(Self {
            ctx: Rc::clone(ctx),
            config,
            parent,
            nesting,
            state: Cell::new(OverlayState::Constructed),
            parts: Cell::new(Parts::default()),
            location: RefCell::new(None),
            was_ever_visible: Cell::new(false),
            subscriptions: RefCell::new(Vec::new()),
            focus: RefCell::new(None),
            last_outside_event: Cell::new(None),
            resolver: RefCell::new(Some(resolver)),
            resolution: resolution.shared(),
        }))
    }

    /// Accept the overlay with `value`.
    pub fn accept(
        self: &Rc<Self>,
        value: Value,
        options: CloseOptions,
    ) -> LocalBoxFuture<'static, Result<(), CloseError>> {
        self.close(Verb::Accept, value, options)
    }

    /// Dismiss the overlay with `value`.
    pub fn dismiss(
        self: &Rc<Self>,
        value: Value,
        options: CloseOptions,
    ) -> LocalBoxFuture<'static, Result<(), CloseError>> {
        self.close(Verb::Dismiss, value, options)
    }

    /// Close with `verb`. Only one close runs at a time; others fail with [`CloseError::NotOpen`].
    pub fn close(
        self: &Rc<Self>,
        verb: Verb,
        value: Value,
        options: CloseOptions,
    ) -> LocalBoxFuture<'static, Result<(), CloseError>> {
        close::execute(Rc::clone(self), verb, value, options).boxed_local()
    }

    /// The opener's result: `Ok(value)` once accepted, `Err(Dismissed)` once dismissed.
    ///
    /// An overlay dropped without closing counts as dismissed with `null`.
    pub fn result(&self) -> LocalBoxFuture<'static, Resolution> {
        self.resolution
            .clone()
            .map(|received| received.unwrap_or(Err(Dismissed { value: Value::Null })))
            .boxed_local()
    }

    pub(crate) fn resolve(&self, resolution: Resolution) {
        if let Some(resolver) = self.resolver.borrow_mut().take() {
            let _ = resolver.send(resolution);
        }
    }

    /// The hook in `slot`, bound to this overlay.
    pub fn callback(self: &Rc<Self>, slot: HookSlot) -> Option<Box<dyn Fn(&mut Event)>> {
        let hook = self.config.callbacks.get(slot)?.clone();
        let this = Rc::clone(self);
        Some(Box::new(move |event: &mut Event| hook(&this, event)))
    }

    /// Record the overlay's new location and close it if an accept or dismiss
    /// pattern matches. Returns true if a close was requested.
    pub fn navigate(self: &Rc<Self>, location: &str) -> bool {
        *self.location.borrow_mut() = Some(location.into());
        self.try_close_for_location()
    }

    /// Run a close in the background, logging how it ended.
    pub(crate) fn request_close(self: &Rc<Self>, verb: Verb, value: Value, options: CloseOptions) {
        let label = self.to_string();
        let close = self.close(verb, value, options);
        let task = async move {
            match close.await {
                Ok(()) => {}
                Err(CloseError::Motion(err)) => warn!(overlay = %label, %err, "closed with a failed animation"),
                Err(err) => debug!(overlay = %label, %err, "close request ended early"),
            }
        };
        if let Err(err) = self.ctx.spawner().spawn_local(task) {
            error!(overlay = %self, %err, "failed to spawn close request");
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> OverlayState {
        self.state.get()
    }

    /// Returns true while the overlay accepts close requests.
    pub fn is_open(&self) -> bool {
        matches!(self.state.get(), OverlayState::Attached | OverlayState::Open)
    }

    /// Returns true once the overlay has closed.
    pub fn is_closed(&self) -> bool {
        self.state.get() == OverlayState::Closed
    }

    /// Returns true if this is the topmost layer of the whole stack.
    pub fn is_front(&self) -> bool {
        self.ctx.stack().is_front(self)
    }

    /// Returns true once an open animation completed.
    pub fn was_ever_visible(&self) -> bool {
        self.was_ever_visible.get()
    }

    /// Mode name.
    pub fn mode(&self) -> &str {
        &self.config.mode
    }

    /// Visual nesting depth.
    pub fn nesting(&self) -> u32 {
        self.nesting
    }

    /// The layer beneath.
    pub fn parent(&self) -> &Layer {
        &self.parent
    }

    /// Resolved configuration.
    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Shared context.
    pub fn context(&self) -> &Rc<Context> {
        &self.ctx
    }

    /// Owned elements.
    pub fn parts(&self) -> Parts {
        self.parts.get()
    }

    /// Last location passed to [`navigate`](Self::navigate).
    pub fn location(&self) -> Option<String> {
        self.location.borrow().clone()
    }
}

impl fmt::Display for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} overlay", self.config.mode)
    }
}

impl fmt::Debug for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overlay")
            .field("mode", &self.config.mode)
            .field("state", &self.state.get())
            .field("nesting", &self.nesting)
            .field("parts", &self.parts.get())
            .finish_non_exhaustive()
    }
}
