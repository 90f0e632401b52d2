// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for overlay construction, closing, and animation.

use serde_json::Value;
use thiserror::Error;

/// Configuration and construction errors.
///
/// These surface immediately (at construction or at click time) and are never retried.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// Options or configuration could not be deserialized.
    #[error("invalid overlay options: {0}")]
    Options(#[from] serde_json::Error),
    /// No configuration exists for the requested mode.
    #[error("unknown overlay mode `{0}`")]
    UnknownMode(String),
    /// A location pattern could not be compiled.
    #[error("invalid location pattern `{pattern}`: {reason}")]
    Pattern {
        /// The offending pattern source.
        pattern: String,
        /// What is wrong with it.
        reason: String,
    },
    /// A closer attribute does not hold JSON.
    #[error("invalid `{attribute}` payload: {source}")]
    Payload {
        /// Attribute name, e.g. `ov-dismiss`.
        attribute: String,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
    /// An option attribute holds a value of the wrong shape.
    #[error("invalid `{attribute}` value `{value}`")]
    Attribute {
        /// Attribute name, e.g. `ov-duration`.
        attribute: String,
        /// The raw value.
        value: String,
    },
    /// A listener prevented the default of the open event.
    #[error("opening the overlay was prevented")]
    OpenPrevented,
    /// The open animation failed.
    #[error(transparent)]
    Motion(#[from] MotionError),
}

/// Why a close request did not complete normally.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CloseError {
    /// The overlay is not open: it was never attached, or a close is already in flight or done.
    #[error("overlay is not open")]
    NotOpen,
    /// The user declined the confirmation prompt.
    #[error("close was not confirmed")]
    Declined,
    /// A hook or listener prevented the default of the pre-close event.
    #[error("close was prevented")]
    Prevented,
    /// The close animation failed. Elements were still removed and the outcome delivered.
    #[error(transparent)]
    Motion(#[from] MotionError),
}

/// An animation future failed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("animation `{animation}` failed: {reason}")]
pub struct MotionError {
    /// Name of the animation.
    pub animation: String,
    /// Why it failed.
    pub reason: String,
}

/// The error half of an opener's result: the overlay was dismissed with `value`.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("overlay was dismissed")]
pub struct Dismissed {
    /// The dismissal value, exactly as passed to `dismiss`.
    pub value: Value,
}
