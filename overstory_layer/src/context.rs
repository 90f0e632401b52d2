// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared context: the document, its event hub, the layer stack, and injected collaborators.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use futures::future::{self, LocalBoxFuture};
use futures::task::LocalSpawn;
use overstory_dom::{Document, Element, ElementFlags, ElementId};

use crate::config::Config;
use crate::events::EventHub;
use crate::motion::{InstantMotion, Motion};
use crate::stack::Stack;

/// Asks the user whether a close may proceed.
pub trait Confirm {
    /// Resolve to true to proceed.
    fn confirm(&self, message: &str) -> LocalBoxFuture<'static, bool>;
}

/// Confirms everything without asking.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _message: &str) -> LocalBoxFuture<'static, bool> {
        Box::pin(future::ready(true))
    }
}

/// Everything overlays share.
pub struct Context {
    document: Rc<RefCell<Document>>,
    events: EventHub,
    stack: Stack,
    motion: Rc<dyn Motion>,
    spawner: Rc<dyn LocalSpawn>,
    confirmer: Rc<dyn Confirm>,
    config: Config,
    legacy_closers: bool,
    body: ElementId,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("document", &self.document.borrow())
            .field("events", &self.events)
            .field("stack", &self.stack.len())
            .field("legacy_closers", &self.legacy_closers)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Start building a context whose close requests are spawned on `spawner`.
    pub fn builder(spawner: impl LocalSpawn + 'static) -> ContextBuilder {
        ContextBuilder {
            spawner: Rc::new(spawner),
            motion: Rc::new(InstantMotion),
            confirmer: Rc::new(AlwaysConfirm),
            config: Config::default(),
            legacy_closers: false,
        }
    }

    /// Shared document handle.
    pub fn document_handle(&self) -> &Rc<RefCell<Document>> {
        &self.document
    }

    /// Borrow the document.
    pub fn document(&self) -> Ref<'_, Document> {
        self.document.borrow()
    }

    /// Borrow the document mutably.
    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.document.borrow_mut()
    }

    /// The event hub.
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// The layer stack.
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// The animation engine.
    pub fn motion(&self) -> &dyn Motion {
        &*self.motion
    }

    /// Where close requests from event handlers run.
    pub fn spawner(&self) -> &dyn LocalSpawn {
        &*self.spawner
    }

    /// The confirmation collaborator.
    pub fn confirmer(&self) -> &dyn Confirm {
        &*self.confirmer
    }

    /// Per-mode defaults.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether `[ov-close]` still works as a dismiss closer.
    pub fn legacy_closers(&self) -> bool {
        self.legacy_closers
    }

    /// The root layer's element.
    pub fn body(&self) -> ElementId {
        self.body
    }
}

/// Builder for [`Context`].
pub struct ContextBuilder {
    spawner: Rc<dyn LocalSpawn>,
    motion: Rc<dyn Motion>,
    confirmer: Rc<dyn Confirm>,
    config: Config,
    legacy_closers: bool,
}

impl fmt::Debug for ContextBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextBuilder")
            .field("config", &self.config)
            .field("legacy_closers", &self.legacy_closers)
            .finish_non_exhaustive()
    }
}

impl ContextBuilder {
    /// Use `motion` as the animation engine. Defaults to [`InstantMotion`].
    #[must_use]
    pub fn motion(mut self, motion: impl Motion + 'static) -> Self {
        self.motion = Rc::new(motion);
        self
    }

    /// Use `confirmer` for confirmation prompts. Defaults to [`AlwaysConfirm`].
    #[must_use]
    pub fn confirmer(mut self, confirmer: impl Confirm + 'static) -> Self {
        self.confirmer = Rc::new(confirmer);
        self
    }

    /// Use `config` for per-mode defaults.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Keep honoring the deprecated `[ov-close]` closer attribute.
    #[must_use]
    pub fn legacy_closers(mut self, enabled: bool) -> Self {
        self.legacy_closers = enabled;
        self
    }

    /// Create the document with its body element and return the context.
    pub fn build(self) -> Rc<Context> {
        let mut document = Document::new();
        let body = document.insert(None, Element::new("body").with_flags(ElementFlags::LAYER));
        let document = Rc::new(RefCell::new(document));
        Rc::new(Context {
            events: EventHub::new(document.clone(), body),
            document,
            stack: Stack::default(),
            motion: self.motion,
            spawner: self.spawner,
            confirmer: self.confirmer,
            config: self.config,
            legacy_closers: self.legacy_closers,
            body,
        })
    }
}
