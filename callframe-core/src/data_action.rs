//! Data-bound actions
//!
//! A [`DataAction`] is an [`Action`](crate::action::Action) whose
//! enabled state is a predicate over a bound `(value, detail)` pair.
//! Every time the pair changes ([`set_data`](DataAction::set_data),
//! explicitly or through [`refresh_on`](DataAction::refresh_on)), all
//! registered testers are evaluated with AND semantics: the action is
//! enabled iff at least one tester is registered and every tester
//! accepts the pair. When the predicate rejects, the bound pair is
//! reset to its default form so a disabled action never holds a stale
//! reference.

use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;

use tracing::trace;

use crate::action::Action;
use crate::signal::{Connection, Signal};

type Tester<T> = Box<dyn Fn(&T, &str) -> bool>;

/// An action gated by predicates over a bound data pair.
///
/// Cloning yields a handle to the same action and bound data; the
/// underlying [`Action`] is registered into an
/// [`Actor`](crate::actor::Actor) via [`action`](DataAction::action).
pub struct DataAction<T: Clone + Default + 'static> {
    action: Rc<Action>,
    data: Rc<RefCell<(T, String)>>,
    testers: Rc<RefCell<Vec<Tester<T>>>>,
}

impl<T: Clone + Default + 'static> Clone for DataAction<T> {
    fn clone(&self) -> Self {
        Self {
            action: Rc::clone(&self.action),
            data: Rc::clone(&self.data),
            testers: Rc::clone(&self.testers),
        }
    }
}

impl<T: Clone + Default + 'static> DataAction<T> {
    /// Create a data action. `behavior` receives the bound pair at
    /// activation time. The action starts disabled: with no testers
    /// registered, no data can pass the predicate yet.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        behavior: impl Fn(&T, &str) + 'static,
    ) -> Self {
        let data = Rc::new(RefCell::new((T::default(), String::new())));
        let action = Action::new(name, description, {
            let data = Rc::clone(&data);
            move || {
                let (value, detail) = data.borrow().clone();
                behavior(&value, &detail);
            }
        });
        // Data-bound actions are unusable until set_data accepts.
        action.disable();
        Self {
            action,
            data,
            testers: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Register a predicate. All testers must accept a pair for the
    /// action to enable; registration alone does not re-evaluate
    /// already-bound data.
    pub fn add_tester(&self, tester: impl Fn(&T, &str) -> bool + 'static) {
        self.testers.borrow_mut().push(Box::new(tester));
    }

    /// Whether the current testers would accept `(value, detail)`.
    /// `false` when no tester is registered.
    pub fn can_run_with_data(&self, value: &T, detail: &str) -> bool {
        let testers = self.testers.borrow();
        !testers.is_empty() && testers.iter().all(|tester| tester(value, detail))
    }

    /// Rebind the data pair and recompute the enabled state. On
    /// rejection the pair resets to `(T::default(), "")` and the action
    /// disables.
    pub fn set_data(&self, value: T, detail: impl Into<String>) {
        let detail = detail.into();
        if self.can_run_with_data(&value, &detail) {
            *self.data.borrow_mut() = (value, detail);
            self.action.enable();
        } else {
            trace!(action = %self.action.name(), "bound data rejected, resetting");
            *self.data.borrow_mut() = (T::default(), String::new());
            self.action.disable();
        }
    }

    /// Recompute the binding automatically whenever `signal` fires,
    /// deriving the pair from the event through `source`. This is how
    /// an owning context keeps the action in lockstep with its bound
    /// value.
    pub fn refresh_on<E: 'static>(
        &self,
        signal: &Signal<E>,
        source: impl Fn(&E) -> (T, String) + 'static,
    ) -> Connection {
        let this = self.clone();
        signal.connect(move |event| {
            let (value, detail) = source(event);
            this.set_data(value, detail);
        })
    }

    /// The underlying action, for registration into an actor.
    pub fn action(&self) -> &Rc<Action> {
        &self.action
    }

    /// Snapshot of the bound pair.
    pub fn data(&self) -> (T, String) {
        self.data.borrow().clone()
    }
}

impl<T: Clone + Default + 'static> Deref for DataAction<T> {
    type Target = Action;

    fn deref(&self) -> &Action {
        &self.action
    }
}

impl<T: Clone + Default + 'static> std::fmt::Debug for DataAction<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataAction")
            .field("name", &self.action.name())
            .field("enabled", &self.action.is_enabled())
            .field("testers", &self.testers.borrow().len())
            .finish()
    }
}
