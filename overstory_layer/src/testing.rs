// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test harness: a local executor, a recording motion engine, and a recording confirmer.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::future::{LocalBoxFuture, RemoteHandle, ready};
use futures::task::LocalSpawnExt;
use overstory_dom::{Document, ElementId};

use crate::config::OverlayOptions;
use crate::context::{Confirm, Context};
use crate::error::MotionError;
use crate::motion::{Animation, Motion, MotionFuture, MotionOptions};
use crate::overlay::Overlay;

type Log = Rc<RefCell<Vec<String>>>;

/// How the recording motion engine finishes the animations it starts.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Hold {
    /// Finish on first poll.
    Instant,
    /// Stay pending until [`RecordingMotion::release`].
    Pending,
    /// Fail on first poll.
    Fail,
}

struct MotionState {
    log: Log,
    hold: Cell<Hold>,
    pending: RefCell<Vec<oneshot::Sender<()>>>,
}

/// Logs `animate <tag> <animation>` for every animation it starts.
#[derive(Clone)]
pub(crate) struct RecordingMotion {
    state: Rc<MotionState>,
}

impl RecordingMotion {
    fn new(log: Log) -> Self {
        Self {
            state: Rc::new(MotionState {
                log,
                hold: Cell::new(Hold::Instant),
                pending: RefCell::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn hold(&self, hold: Hold) {
        self.state.hold.set(hold);
    }

    /// Finish every pending animation and go back to finishing instantly.
    pub(crate) fn release(&self) {
        self.state.hold.set(Hold::Instant);
        for tx in self.state.pending.borrow_mut().drain(..) {
            let _ = tx.send(());
        }
    }
}

impl Motion for RecordingMotion {
    fn animate(
        &self,
        document: &Document,
        element: ElementId,
        animation: &Animation,
        _options: &MotionOptions,
    ) -> Option<MotionFuture> {
        if self.is_none(animation) {
            return None;
        }
        let tag = document.tag(element).unwrap_or("?");
        self.state
            .log
            .borrow_mut()
            .push(format!("animate {tag} {}", animation.name()));
        Some(match self.state.hold.get() {
            Hold::Instant => ready(Ok(())).boxed_local(),
            Hold::Pending => {
                let (tx, rx) = oneshot::channel();
                self.state.pending.borrow_mut().push(tx);
                async move {
                    let _ = rx.await;
                    Ok(())
                }
                .boxed_local()
            }
            Hold::Fail => ready(Err(MotionError {
                animation: animation.name().into(),
                reason: "interrupted".into(),
            }))
            .boxed_local(),
        })
    }
}

type Prompts = Rc<RefCell<Vec<oneshot::Sender<bool>>>>;

/// Logs `confirm <message>` and answers with a fixed verdict, or holds the
/// prompt open until [`Harness::answer`] when there is none.
struct RecordingConfirm {
    log: Log,
    answer: Option<bool>,
    prompts: Prompts,
}

impl Confirm for RecordingConfirm {
    fn confirm(&self, message: &str) -> LocalBoxFuture<'static, bool> {
        self.log.borrow_mut().push(format!("confirm {message}"));
        match self.answer {
            Some(answer) => ready(answer).boxed_local(),
            None => {
                let (tx, rx) = oneshot::channel();
                self.prompts.borrow_mut().push(tx);
                rx.map(|answer| answer.unwrap_or(false)).boxed_local()
            }
        }
    }
}

pub(crate) struct Harness {
    pool: RefCell<LocalPool>,
    pub(crate) ctx: Rc<Context>,
    pub(crate) motion: RecordingMotion,
    pub(crate) log: Log,
    prompts: Prompts,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::build(Some(true), false)
    }

    /// A harness whose confirmer declines every prompt.
    pub(crate) fn declining() -> Self {
        Self::build(Some(false), false)
    }

    /// A harness whose prompts stay pending until [`Harness::answer`].
    pub(crate) fn deferring() -> Self {
        Self::build(None, false)
    }

    pub(crate) fn with_legacy_closers() -> Self {
        Self::build(Some(true), true)
    }

    fn build(answer: Option<bool>, legacy_closers: bool) -> Self {
        let pool = LocalPool::new();
        let log: Log = Rc::default();
        let prompts: Prompts = Rc::default();
        let motion = RecordingMotion::new(log.clone());
        let ctx = Context::builder(pool.spawner())
            .motion(motion.clone())
            .confirmer(RecordingConfirm {
                log: log.clone(),
                answer,
                prompts: prompts.clone(),
            })
            .legacy_closers(legacy_closers)
            .build();
        Self {
            pool: RefCell::new(pool),
            ctx,
            motion,
            log,
            prompts,
        }
    }

    /// Answer every pending confirmation prompt.
    pub(crate) fn answer(&self, answer: bool) {
        for tx in self.prompts.borrow_mut().drain(..) {
            let _ = tx.send(answer);
        }
    }

    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.pool.borrow_mut().run_until(future)
    }

    /// Run spawned tasks until none can make progress.
    pub(crate) fn settle(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    pub(crate) fn spawn<F>(&self, future: F) -> RemoteHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        self.pool
            .borrow()
            .spawner()
            .spawn_local_with_handle(future)
            .expect("spawn")
    }

    pub(crate) fn open(&self, options: OverlayOptions) -> Rc<Overlay> {
        self.open_with(options, None)
    }

    pub(crate) fn open_with(&self, options: OverlayOptions, content: Option<ElementId>) -> Rc<Overlay> {
        self.block_on(crate::open(&self.ctx, options, content))
            .expect("open")
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub(crate) fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }

    pub(crate) fn count(&self, entry: &str) -> usize {
        self.log.borrow().iter().filter(|e| *e == entry).count()
    }
}
