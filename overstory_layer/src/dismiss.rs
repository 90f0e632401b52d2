// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dismissal policy: which user gestures may dismiss an overlay.

use std::collections::BTreeSet;

use serde::Deserialize;

bitflags::bitflags! {
    /// Gestures that may dismiss an overlay.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DismissMethods: u8 {
        /// A dismiss button inside the overlay box.
        const BUTTON  = 0b0000_0001;
        /// The Escape key, while the overlay is the front layer.
        const KEY     = 0b0000_0010;
        /// A click outside the overlay box.
        const OUTSIDE = 0b0000_0100;
    }
}

impl DismissMethods {
    /// The method named by `token`, if it names one.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "button" => Some(Self::BUTTON),
            "key" => Some(Self::KEY),
            "outside" => Some(Self::OUTSIDE),
            _ => None,
        }
    }
}

/// Raw `dismissable` setting as found in configuration.
///
/// Accepts a boolean, a string of tokens separated by spaces or commas, or a list of tokens.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DismissableSetting {
    /// `true` enables every method, `false` none.
    Flag(bool),
    /// `"button outside"`.
    Tokens(String),
    /// `["button", "outside"]`.
    List(Vec<String>),
}

impl Default for DismissableSetting {
    fn default() -> Self {
        Self::Flag(true)
    }
}

impl From<bool> for DismissableSetting {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<&str> for DismissableSetting {
    fn from(tokens: &str) -> Self {
        Self::Tokens(tokens.into())
    }
}

/// Effective set of enabled dismissal methods.
///
/// Tokens that name no known method are kept, but enable nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DismissPolicy {
    methods: DismissMethods,
    inert: BTreeSet<String>,
}

impl DismissPolicy {
    /// Policy enabling every method.
    pub fn all() -> Self {
        Self {
            methods: DismissMethods::all(),
            inert: BTreeSet::new(),
        }
    }

    /// Policy enabling nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Normalize a raw setting.
    pub fn from_setting(setting: &DismissableSetting) -> Self {
        match setting {
            DismissableSetting::Flag(true) => Self::all(),
            DismissableSetting::Flag(false) => Self::none(),
            DismissableSetting::Tokens(tokens) => {
                Self::from_tokens(tokens.split(|c: char| c.is_whitespace() || c == ','))
            }
            DismissableSetting::List(list) => Self::from_tokens(list.iter().map(String::as_str)),
        }
    }

    fn from_tokens<'a>(tokens: impl Iterator<Item = &'a str>) -> Self {
        let mut policy = Self::none();
        for token in tokens.map(str::trim).filter(|t| !t.is_empty()) {
            match DismissMethods::from_token(token) {
                Some(method) => policy.methods |= method,
                None => {
                    policy.inert.insert(token.into());
                }
            }
        }
        policy
    }

    /// Returns true if every method in `method` is enabled.
    pub fn supports(&self, method: DismissMethods) -> bool {
        self.methods.contains(method)
    }

    /// The enabled methods.
    pub fn methods(&self) -> DismissMethods {
        self.methods
    }

    /// Tokens that were accepted but name no method.
    pub fn inert_tokens(&self) -> impl Iterator<Item = &str> {
        self.inert.iter().map(String::as_str)
    }
}

impl From<&DismissableSetting> for DismissPolicy {
    fn from(setting: &DismissableSetting) -> Self {
        Self::from_setting(setting)
    }
}
