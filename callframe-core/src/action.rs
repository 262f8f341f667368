//! Runtime actions
//!
//! An [`Action`] is a named, described, enable/disable-able unit of
//! behavior. Front-ends discover actions through an
//! [`Actor`](crate::actor::Actor) and render them as menu entries or
//! buttons; activation runs the bound behavior, never front-end code.
//!
//! Enabled-state notifications fire only on an actual transition, so a
//! predicate recomputation that lands on the current state does not
//! trigger a menu rebuild.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::signal::Signal;

/// A named, enableable unit of invocable behavior.
///
/// Activating a disabled action is a silent no-op; the behavior is
/// never invoked. The name is stable and unique within the owning
/// [`Actor`](crate::actor::Actor).
pub struct Action {
    name: String,
    description: String,
    enabled: Cell<bool>,
    behavior: RefCell<Option<Rc<dyn Fn()>>>,
    enabled_signal: Signal<()>,
    disabled_signal: Signal<()>,
    activated: Signal<()>,
}

impl Action {
    /// Create an enabled action with a bound behavior.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        behavior: impl Fn() + 'static,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            description: description.into(),
            enabled: Cell::new(true),
            behavior: RefCell::new(Some(Rc::new(behavior))),
            enabled_signal: Signal::new(),
            disabled_signal: Signal::new(),
            activated: Signal::new(),
        })
    }

    /// Create an enabled action with no behavior; activation only emits
    /// `activated`.
    pub fn unbound(name: impl Into<String>, description: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            description: description.into(),
            enabled: Cell::new(true),
            behavior: RefCell::new(None),
            enabled_signal: Signal::new(),
            disabled_signal: Signal::new(),
            activated: Signal::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Emitted when the action transitions to enabled.
    pub fn enabled(&self) -> &Signal<()> {
        &self.enabled_signal
    }

    /// Emitted when the action transitions to disabled.
    pub fn disabled(&self) -> &Signal<()> {
        &self.disabled_signal
    }

    /// Emitted on every successful activation, before the behavior
    /// runs.
    pub fn activated(&self) -> &Signal<()> {
        &self.activated
    }

    /// Mark the action usable. Emits `enabled` only if it was disabled.
    pub fn enable(&self) {
        if !self.enabled.replace(true) {
            self.enabled_signal.emit(&());
        }
    }

    /// Mark the action unusable. Emits `disabled` only if it was
    /// enabled.
    pub fn disable(&self) {
        if self.enabled.replace(false) {
            self.disabled_signal.emit(&());
        }
    }

    /// Run the action: emit `activated`, then invoke the behavior once.
    /// No-op while disabled.
    pub fn activate(&self) {
        if !self.enabled.get() {
            trace!(action = %self.name, "activation of disabled action ignored");
            return;
        }
        debug!(action = %self.name, "action activated");
        self.activated.emit(&());
        let behavior = self.behavior.borrow().clone();
        if let Some(behavior) = behavior {
            behavior();
        }
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("enabled", &self.enabled.get())
            .finish()
    }
}
