// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event hub: listener registration and capture → target → bubble delivery over the document.
//!
//! Handlers run without any borrow of the document or the listener registry held,
//! so they may mutate the tree, move focus, or register and remove listeners.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use overstory_dom::{Document, ElementId};
use overstory_responder::adapters::dom::dispatch_in;
use overstory_responder::listeners::{ListenerId, Listeners};
use overstory_responder::router::run;
use overstory_responder::types::{Outcome, Phase};
use serde_json::{Map, Value};

/// Identity of one emitted event. Two listeners seeing the same id saw the same gesture.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct EventId(u64);

/// An event travelling through the document.
#[derive(Clone, Debug)]
pub struct Event {
    id: EventId,
    /// Event type, e.g. `click` or `ov:layer:dismissed`.
    pub kind: String,
    /// Element the event was emitted on.
    pub target: ElementId,
    /// Element whose listener is running.
    pub current_target: ElementId,
    /// Propagation phase of the running listener.
    pub phase: Phase,
    /// Payload.
    pub detail: Value,
    /// Key name for keyboard events.
    pub key: Option<String>,
    default_prevented: bool,
}

impl Event {
    /// A new event of type `kind` targeting `target`.
    pub fn new(kind: impl Into<String>, target: ElementId) -> Self {
        Self {
            id: EventId(0),
            kind: kind.into(),
            target,
            current_target: target,
            phase: Phase::Target,
            detail: Value::Null,
            key: None,
            default_prevented: false,
        }
    }

    /// Builder: set the payload.
    #[must_use]
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }

    /// Builder: set the key name.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Identity assigned when the event was emitted.
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Cancel the event's default action.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Returns true if a listener cancelled the default action.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// JSON rendering: `{"type": kind}` merged with an object payload, or with the
    /// payload under `detail` otherwise.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert("type".into(), Value::String(self.kind.clone()));
        match &self.detail {
            Value::Object(fields) => {
                for (k, v) in fields {
                    out.entry(k.clone()).or_insert_with(|| v.clone());
                }
            }
            Value::Null => {}
            other => {
                out.insert("detail".into(), other.clone());
            }
        }
        if let Some(key) = &self.key {
            out.insert("key".into(), Value::String(key.clone()));
        }
        Value::Object(out)
    }
}

/// Listener callback.
pub type Handler = Rc<dyn Fn(&mut Event) -> Outcome>;

type Registry = RefCell<Listeners<ElementId, Handler>>;

/// Removes its listeners when [`unsubscribe`](Subscription::unsubscribe)d.
///
/// Dropping a subscription without unsubscribing keeps the listeners registered.
#[must_use = "listeners stay registered until unsubscribed"]
pub struct Subscription {
    listeners: Weak<Registry>,
    ids: Vec<ListenerId>,
}

impl Subscription {
    /// Remove the listeners. Does nothing if the hub is gone.
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            let mut listeners = listeners.borrow_mut();
            for id in self.ids {
                listeners.remove(id);
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}

/// Listener registry plus delivery over a shared [`Document`].
pub struct EventHub {
    document: Rc<RefCell<Document>>,
    listeners: Rc<Registry>,
    body: ElementId,
    next_event: Cell<u64>,
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("listeners", &self.listeners.borrow().len())
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl EventHub {
    /// Hub delivering events in `document`; key events without a focused element go to `body`.
    pub fn new(document: Rc<RefCell<Document>>, body: ElementId) -> Self {
        Self {
            document,
            listeners: Rc::new(RefCell::new(Listeners::new())),
            body,
            next_event: Cell::new(0),
        }
    }

    /// Listen for each space-separated type in `event_types` on `node` during `phase`.
    pub fn on(
        &self,
        node: ElementId,
        event_types: &str,
        phase: Phase,
        handler: impl Fn(&mut Event) -> Outcome + 'static,
    ) -> Subscription {
        let handler: Handler = Rc::new(handler);
        let mut listeners = self.listeners.borrow_mut();
        let ids = event_types
            .split_whitespace()
            .map(|kind| listeners.add(node, kind, phase, handler.clone()))
            .collect();
        Subscription {
            listeners: Rc::downgrade(&self.listeners),
            ids,
        }
    }

    /// Listen for events bubbling to `layer` that were emitted inside that layer,
    /// excluding nested layers.
    ///
    /// With a `selector` attribute, only events whose target is, or sits inside, an
    /// element carrying that attribute are delivered; the handler receives that element.
    /// Without one it receives the target.
    pub fn on_layer(
        &self,
        layer: ElementId,
        event_types: &str,
        selector: Option<&str>,
        handler: impl Fn(&mut Event, ElementId) -> Outcome + 'static,
    ) -> Subscription {
        let document = Rc::downgrade(&self.document);
        let selector = selector.map(String::from);
        self.on(layer, event_types, Phase::Bubble, move |event| {
            let Some(document) = document.upgrade() else {
                return Outcome::Continue;
            };
            let matched = {
                let doc = document.borrow();
                if doc.layer_of(event.target) != Some(layer) {
                    return Outcome::Continue;
                }
                match &selector {
                    Some(attr) => doc
                        .closest(event.target, |e| e.has_attr(attr))
                        .filter(|found| doc.contains(layer, *found)),
                    None => Some(event.target),
                }
            };
            match matched {
                Some(matched) => handler(event, matched),
                None => Outcome::Continue,
            }
        })
    }

    /// Listen for the Escape key anywhere in the document.
    pub fn on_escape(&self, handler: impl Fn(&mut Event) -> Outcome + 'static) -> Subscription {
        self.on(self.body, "keydown", Phase::Bubble, move |event| {
            if event.key.as_deref() == Some("Escape") {
                handler(event)
            } else {
                Outcome::Continue
            }
        })
    }

    /// Deliver `event` and return it with its id assigned and the default-prevented flag final.
    ///
    /// A consuming listener halts delivery and prevents the default.
    pub fn emit(&self, mut event: Event) -> Event {
        let id = self.next_event.get() + 1;
        self.next_event.set(id);
        event.id = EventId(id);
        let seq = dispatch_in(&self.document.borrow(), event.target);
        tracing::trace!(kind = %event.kind, steps = seq.len(), "emit");
        let listeners = Rc::clone(&self.listeners);
        let consumed = run(&seq, |step| {
            let handlers = listeners
                .borrow()
                .matching(&step.node, step.phase, &event.kind);
            let mut outcome = Outcome::Continue;
            for handler in handlers {
                event.current_target = step.node;
                event.phase = step.phase;
                match handler(&mut event) {
                    Outcome::Continue => {}
                    Outcome::Stop => outcome = Outcome::Stop,
                    Outcome::StopAndConsume => return Outcome::StopAndConsume,
                }
            }
            outcome
        });
        if consumed {
            event.default_prevented = true;
        }
        event
    }

    /// Emit a `click` on `target`.
    pub fn click(&self, target: ElementId) -> Event {
        self.emit(Event::new("click", target))
    }

    /// Emit a `keydown` for `key` on the focused element, or on the body.
    pub fn press_key(&self, key: &str) -> Event {
        let target = self.document.borrow().focused().unwrap_or(self.body);
        self.emit(Event::new("keydown", target).with_key(key))
    }

    /// Move focus to `element` and emit `focusin` on it. Returns false if `element` is stale.
    pub fn focus(&self, element: ElementId) -> bool {
        if !self.document.borrow_mut().focus(element) {
            return false;
        }
        self.emit(Event::new("focusin", element));
        true
    }

    /// Clear focus and emit `focusout` on the element that held it.
    pub fn blur(&self) -> Option<ElementId> {
        let blurred = self.document.borrow_mut().blur()?;
        self.emit(Event::new("focusout", blurred));
        Some(blurred)
    }

    /// Drop listeners attached to removed elements. Returns how many were dropped.
    pub fn prune(&self) -> usize {
        let doc = self.document.borrow();
        self.listeners
            .borrow_mut()
            .retain_nodes(|node| doc.is_alive(*node))
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}
