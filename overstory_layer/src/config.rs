// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration: per-mode defaults, per-open options, and their resolution into
//! a strongly typed [`OverlayConfig`].

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use overstory_dom::ElementId;
use serde::Deserialize;

use crate::dismiss::{DismissPolicy, DismissableSetting};
use crate::error::OverlayError;
use crate::events::Event;
use crate::motion::{Animation, MotionOptions, MotionSettings};
use crate::overlay::Overlay;
use crate::pattern::UrlPattern;

/// Lifecycle hook. Runs with the overlay as its receiver.
pub type Hook = Rc<dyn Fn(&Rc<Overlay>, &mut Event)>;

/// Names of the lifecycle hook slots.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum HookSlot {
    /// After the open animation settled.
    Opened,
    /// Before an accept; may prevent it.
    Accept,
    /// After an accepted overlay's elements were removed.
    Accepted,
    /// Before a dismiss; may prevent it.
    Dismiss,
    /// After a dismissed overlay's elements were removed.
    Dismissed,
}

/// Lifecycle hooks, each either set or absent.
#[derive(Clone, Default)]
pub struct Callbacks {
    /// See [`HookSlot::Opened`].
    pub on_opened: Option<Hook>,
    /// See [`HookSlot::Accept`].
    pub on_accept: Option<Hook>,
    /// See [`HookSlot::Accepted`].
    pub on_accepted: Option<Hook>,
    /// See [`HookSlot::Dismiss`].
    pub on_dismiss: Option<Hook>,
    /// See [`HookSlot::Dismissed`].
    pub on_dismissed: Option<Hook>,
}

impl Callbacks {
    /// The hook in `slot`.
    pub fn get(&self, slot: HookSlot) -> Option<&Hook> {
        match slot {
            HookSlot::Opened => self.on_opened.as_ref(),
            HookSlot::Accept => self.on_accept.as_ref(),
            HookSlot::Accepted => self.on_accepted.as_ref(),
            HookSlot::Dismiss => self.on_dismiss.as_ref(),
            HookSlot::Dismissed => self.on_dismissed.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: HookSlot) -> &mut Option<Hook> {
        match slot {
            HookSlot::Opened => &mut self.on_opened,
            HookSlot::Accept => &mut self.on_accept,
            HookSlot::Accepted => &mut self.on_accepted,
            HookSlot::Dismiss => &mut self.on_dismiss,
            HookSlot::Dismissed => &mut self.on_dismissed,
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set: Vec<HookSlot> = [
            HookSlot::Opened,
            HookSlot::Accept,
            HookSlot::Accepted,
            HookSlot::Dismiss,
            HookSlot::Dismissed,
        ]
        .into_iter()
        .filter(|slot| self.get(*slot).is_some())
        .collect();
        f.debug_struct("Callbacks").field("set", &set).finish()
    }
}

/// Defaults for one overlay mode.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ModeConfig {
    /// Render a backdrop behind the box.
    pub backdrop: bool,
    /// Wrap the box in a scrollable viewport.
    pub viewport: bool,
    /// Enabled dismissal methods.
    pub dismissable: DismissableSetting,
    /// Visible text of the dismiss button.
    pub dismiss_label: String,
    /// Accessible name of the dismiss button.
    pub dismiss_aria_label: String,
    /// Box animation when opening.
    pub open_animation: Animation,
    /// Box animation when closing.
    pub close_animation: Animation,
    /// Backdrop animation when opening.
    pub backdrop_open_animation: Animation,
    /// Backdrop animation when closing.
    pub backdrop_close_animation: Animation,
    /// Open duration in milliseconds.
    pub open_duration: Option<u64>,
    /// Close duration in milliseconds.
    pub close_duration: Option<u64>,
    /// Open easing.
    pub open_easing: Option<String>,
    /// Close easing.
    pub close_easing: Option<String>,
    /// Size hint, e.g. `medium`.
    pub size: Option<String>,
    /// Position hint, e.g. `left`.
    pub position: Option<String>,
    /// Alignment hint.
    pub align: Option<String>,
    /// Extra class names.
    pub class: Option<String>,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            backdrop: false,
            viewport: false,
            dismissable: DismissableSetting::Flag(true),
            dismiss_label: "×".into(),
            dismiss_aria_label: "Dismiss dialog".into(),
            open_animation: Animation::named("fade-in"),
            close_animation: Animation::named("fade-out"),
            backdrop_open_animation: Animation::named("fade-in"),
            backdrop_close_animation: Animation::named("fade-out"),
            open_duration: None,
            close_duration: None,
            open_easing: None,
            close_easing: None,
            size: None,
            position: None,
            align: None,
            class: None,
        }
    }
}

impl ModeConfig {
    /// A centered dialog over a backdrop.
    pub fn modal() -> Self {
        Self {
            backdrop: true,
            viewport: true,
            size: Some("medium".into()),
            ..Self::default()
        }
    }

    /// A panel sliding in from the side.
    pub fn drawer() -> Self {
        Self {
            backdrop: true,
            viewport: true,
            open_animation: Animation::named("move-from-left"),
            close_animation: Animation::named("move-to-left"),
            position: Some("left".into()),
            size: Some("medium".into()),
            ..Self::default()
        }
    }

    /// A full-screen layer.
    pub fn cover() -> Self {
        Self {
            viewport: true,
            open_animation: Animation::named("move-from-top"),
            close_animation: Animation::named("move-to-top"),
            size: Some("full".into()),
            ..Self::default()
        }
    }

    /// A small box anchored next to its origin.
    pub fn popup() -> Self {
        Self {
            position: Some("bottom".into()),
            align: Some("left".into()),
            size: Some("medium".into()),
            ..Self::default()
        }
    }
}

/// Per-mode defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Defaults keyed by mode name.
    pub modes: BTreeMap<String, ModeConfig>,
    /// Mode used when options name none.
    pub default_mode: String,
}

impl Default for Config {
    fn default() -> Self {
        let modes = [
            ("modal", ModeConfig::modal()),
            ("drawer", ModeConfig::drawer()),
            ("cover", ModeConfig::cover()),
            ("popup", ModeConfig::popup()),
        ]
        .into_iter()
        .map(|(name, mode)| (name.to_owned(), mode))
        .collect();
        Self {
            modes,
            default_mode: "modal".into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    modes: BTreeMap<String, ModeConfig>,
    default_mode: Option<String>,
}

impl Config {
    /// Parse JSON configuration. Modes listed there replace or extend the built-in modes.
    ///
    /// ```
    /// use overstory_layer::Config;
    ///
    /// let config = Config::from_json(r#"{"modes": {"sheet": {"backdrop": true}}, "defaultMode": "sheet"}"#).unwrap();
    /// assert!(config.modes["sheet"].backdrop);
    /// assert!(config.modes.contains_key("popup"));
    /// ```
    pub fn from_json(json: &str) -> Result<Self, OverlayError> {
        let file: ConfigFile = serde_json::from_str(json)?;
        let mut config = Self::default();
        config.modes.extend(file.modes);
        if let Some(mode) = file.default_mode {
            config.default_mode = mode;
        }
        if !config.modes.contains_key(&config.default_mode) {
            return Err(OverlayError::UnknownMode(config.default_mode));
        }
        Ok(config)
    }

    /// Merge `options` over the defaults of its mode and normalize the result.
    pub fn resolve(&self, options: OverlayOptions) -> Result<OverlayConfig, OverlayError> {
        let mode = options.mode.unwrap_or_else(|| self.default_mode.clone());
        let defaults = self
            .modes
            .get(&mode)
            .ok_or_else(|| OverlayError::UnknownMode(mode.clone()))?;
        let dismissable = options
            .dismissable
            .as_ref()
            .unwrap_or(&defaults.dismissable);
        let location = |pattern: Option<String>| pattern.as_deref().map(UrlPattern::new).transpose();
        Ok(OverlayConfig {
            size: options.size.or_else(|| defaults.size.clone()),
            position: options.position.or_else(|| defaults.position.clone()),
            align: options.align.or_else(|| defaults.align.clone()),
            class: options.class.or_else(|| defaults.class.clone()),
            backdrop: options.backdrop.unwrap_or(defaults.backdrop),
            viewport: defaults.viewport,
            nesting: options.nesting,
            dismissable: DismissPolicy::from_setting(dismissable),
            dismiss_label: options
                .dismiss_label
                .unwrap_or_else(|| defaults.dismiss_label.clone()),
            dismiss_aria_label: options
                .dismiss_aria_label
                .unwrap_or_else(|| defaults.dismiss_aria_label.clone()),
            open_motion: MotionSettings {
                animation: options
                    .open_animation
                    .unwrap_or_else(|| defaults.open_animation.clone()),
                backdrop_animation: options
                    .backdrop_open_animation
                    .unwrap_or_else(|| defaults.backdrop_open_animation.clone()),
                options: MotionOptions {
                    duration: options
                        .open_duration
                        .or(defaults.open_duration)
                        .map(Duration::from_millis),
                    easing: options.open_easing.or_else(|| defaults.open_easing.clone()),
                },
            },
            close_motion: MotionSettings {
                animation: options
                    .close_animation
                    .unwrap_or_else(|| defaults.close_animation.clone()),
                backdrop_animation: options
                    .backdrop_close_animation
                    .unwrap_or_else(|| defaults.backdrop_close_animation.clone()),
                options: MotionOptions {
                    duration: options
                        .close_duration
                        .or(defaults.close_duration)
                        .map(Duration::from_millis),
                    easing: options.close_easing.or_else(|| defaults.close_easing.clone()),
                },
            },
            accept_event: options.accept_event,
            dismiss_event: options.dismiss_event,
            accept_location: location(options.accept_location)?,
            dismiss_location: location(options.dismiss_location)?,
            origin: options.origin,
            callbacks: options.callbacks,
            mode,
        })
    }
}

/// Options for opening one overlay. Absent fields fall back to the mode's defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct OverlayOptions {
    /// Mode name, e.g. `modal` or `popup`.
    pub mode: Option<String>,
    /// Size hint.
    pub size: Option<String>,
    /// Position hint.
    pub position: Option<String>,
    /// Alignment hint.
    pub align: Option<String>,
    /// Extra class names.
    pub class: Option<String>,
    /// Render a backdrop.
    pub backdrop: Option<bool>,
    /// Explicit visual nesting depth.
    pub nesting: Option<u32>,
    /// Enabled dismissal methods.
    pub dismissable: Option<DismissableSetting>,
    /// Visible text of the dismiss button.
    pub dismiss_label: Option<String>,
    /// Accessible name of the dismiss button.
    pub dismiss_aria_label: Option<String>,
    /// Box animation when opening.
    pub open_animation: Option<Animation>,
    /// Box animation when closing.
    pub close_animation: Option<Animation>,
    /// Backdrop animation when opening.
    pub backdrop_open_animation: Option<Animation>,
    /// Backdrop animation when closing.
    pub backdrop_close_animation: Option<Animation>,
    /// Open duration in milliseconds.
    pub open_duration: Option<u64>,
    /// Close duration in milliseconds.
    pub close_duration: Option<u64>,
    /// Open easing.
    pub open_easing: Option<String>,
    /// Close easing.
    pub close_easing: Option<String>,
    /// Space-separated event types that accept the overlay.
    pub accept_event: Option<String>,
    /// Space-separated event types that dismiss the overlay.
    pub dismiss_event: Option<String>,
    /// Locations that accept the overlay.
    pub accept_location: Option<String>,
    /// Locations that dismiss the overlay.
    pub dismiss_location: Option<String>,
    /// Element that opened the overlay.
    #[serde(skip)]
    pub origin: Option<ElementId>,
    /// Lifecycle hooks.
    #[serde(skip)]
    pub callbacks: Callbacks,
}

impl OverlayOptions {
    /// Parse options from JSON. Unknown keys and ill-shaped values are errors.
    pub fn from_json(json: &str) -> Result<Self, OverlayError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builder: set the mode.
    #[must_use]
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Builder: set the origin element.
    #[must_use]
    pub fn with_origin(mut self, origin: ElementId) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Builder: set the dismissal methods.
    #[must_use]
    pub fn with_dismissable(mut self, dismissable: impl Into<DismissableSetting>) -> Self {
        self.dismissable = Some(dismissable.into());
        self
    }

    /// Builder: enable or disable the backdrop.
    #[must_use]
    pub fn with_backdrop(mut self, backdrop: bool) -> Self {
        self.backdrop = Some(backdrop);
        self
    }

    /// Builder: set the box animations.
    #[must_use]
    pub fn with_animations(mut self, open: Animation, close: Animation) -> Self {
        self.open_animation = Some(open);
        self.close_animation = Some(close);
        self
    }

    /// Builder: set the accept and dismiss event types.
    #[must_use]
    pub fn with_close_events(mut self, accept: Option<&str>, dismiss: Option<&str>) -> Self {
        self.accept_event = accept.map(String::from);
        self.dismiss_event = dismiss.map(String::from);
        self
    }

    /// Builder: set the accept and dismiss location patterns.
    #[must_use]
    pub fn with_close_locations(mut self, accept: Option<&str>, dismiss: Option<&str>) -> Self {
        self.accept_location = accept.map(String::from);
        self.dismiss_location = dismiss.map(String::from);
        self
    }

    /// Builder: set a lifecycle hook.
    #[must_use]
    pub fn on(mut self, slot: HookSlot, hook: impl Fn(&Rc<Overlay>, &mut Event) + 'static) -> Self {
        *self.callbacks.slot_mut(slot) = Some(Rc::new(hook));
        self
    }
}

/// Fully resolved configuration of one overlay.
#[derive(Clone, Debug)]
pub struct OverlayConfig {
    /// Mode name.
    pub mode: String,
    /// Size hint.
    pub size: Option<String>,
    /// Position hint.
    pub position: Option<String>,
    /// Alignment hint.
    pub align: Option<String>,
    /// Extra class names.
    pub class: Option<String>,
    /// Render a backdrop.
    pub backdrop: bool,
    /// Wrap the box in a viewport.
    pub viewport: bool,
    /// Explicit visual nesting depth; computed from the parent when absent.
    pub nesting: Option<u32>,
    /// Enabled dismissal methods.
    pub dismissable: DismissPolicy,
    /// Visible text of the dismiss button.
    pub dismiss_label: String,
    /// Accessible name of the dismiss button.
    pub dismiss_aria_label: String,
    /// Opening animations.
    pub open_motion: MotionSettings,
    /// Closing animations.
    pub close_motion: MotionSettings,
    /// Event types that accept the overlay.
    pub accept_event: Option<String>,
    /// Event types that dismiss the overlay.
    pub dismiss_event: Option<String>,
    /// Locations that accept the overlay.
    pub accept_location: Option<UrlPattern>,
    /// Locations that dismiss the overlay.
    pub dismiss_location: Option<UrlPattern>,
    /// Element that opened the overlay.
    pub origin: Option<ElementId>,
    /// Lifecycle hooks.
    pub callbacks: Callbacks,
}
