// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Motion: animation descriptors and the engine seam.
//!
//! An animation either runs as a [`MotionFuture`] or does not run at all. Absent
//! futures count as already finished, so a caller launching several animations
//! at once can hand every launch result to [`settle_all`] without special cases.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use futures::future::{LocalBoxFuture, join_all};
use overstory_dom::{Document, ElementId};
use serde::Deserialize;

use crate::error::MotionError;

/// A running animation.
pub type MotionFuture = LocalBoxFuture<'static, Result<(), MotionError>>;

/// Function animating an element directly.
pub type AnimateFn = Rc<dyn Fn(ElementId, &MotionOptions) -> Option<MotionFuture>>;

/// Animation descriptor.
#[derive(Clone, Default, Deserialize)]
#[serde(try_from = "RawAnimation")]
pub enum Animation {
    /// No animation; the change is instant.
    #[default]
    None,
    /// A named animation understood by the [`Motion`] engine, e.g. `fade-in`.
    Named(String),
    /// A function that animates the element itself.
    Custom(AnimateFn),
}

impl Animation {
    /// A named animation.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// A custom animation function.
    pub fn custom(f: impl Fn(ElementId, &MotionOptions) -> Option<MotionFuture> + 'static) -> Self {
        Self::Custom(Rc::new(f))
    }

    /// Name used in logs and errors.
    pub fn name(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Named(name) => name,
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for Animation {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Named(a), Self::Named(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAnimation {
    Flag(bool),
    Name(String),
}

impl TryFrom<RawAnimation> for Animation {
    type Error = String;

    fn try_from(raw: RawAnimation) -> Result<Self, Self::Error> {
        match raw {
            RawAnimation::Flag(false) => Ok(Self::None),
            RawAnimation::Flag(true) => Err("an animation must be a name or `false`".into()),
            RawAnimation::Name(name) if name.is_empty() || name == "none" => Ok(Self::None),
            RawAnimation::Name(name) => Ok(Self::Named(name)),
        }
    }
}

/// Timing options passed along with an animation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MotionOptions {
    /// Duration; the engine's default when `None`.
    pub duration: Option<Duration>,
    /// Easing function name; the engine's default when `None`.
    pub easing: Option<String>,
}

/// Box and backdrop animation for one direction (open or close).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MotionSettings {
    /// Animation of the overlay box.
    pub animation: Animation,
    /// Animation of the backdrop.
    pub backdrop_animation: Animation,
    /// Timing shared by both.
    pub options: MotionOptions,
}

/// Animation engine.
pub trait Motion {
    /// Start animating `element`. Returns `None` when nothing runs.
    fn animate(
        &self,
        document: &Document,
        element: ElementId,
        animation: &Animation,
        options: &MotionOptions,
    ) -> Option<MotionFuture>;

    /// Returns true if `animation` would not animate anything.
    fn is_none(&self, animation: &Animation) -> bool {
        matches!(animation, Animation::None)
    }
}

/// Engine that finishes every named animation instantly. Custom animations still run.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstantMotion;

impl Motion for InstantMotion {
    fn animate(
        &self,
        _document: &Document,
        element: ElementId,
        animation: &Animation,
        options: &MotionOptions,
    ) -> Option<MotionFuture> {
        match animation {
            Animation::Custom(f) => f(element, options),
            Animation::None | Animation::Named(_) => None,
        }
    }
}

/// Wait for every launched animation, then report the first failure.
pub async fn settle_all(animations: Vec<Option<MotionFuture>>) -> Result<(), MotionError> {
    let results = join_all(animations.into_iter().flatten()).await;
    results.into_iter().collect()
}

/// Wait for `animation`, then remove `element` whether or not the animation succeeded.
pub async fn destroy(
    document: &RefCell<Document>,
    element: ElementId,
    animation: Option<MotionFuture>,
) -> Result<(), MotionError> {
    let result = match animation {
        Some(animation) => animation.await,
        None => Ok(()),
    };
    document.borrow_mut().remove(element);
    result
}
