//! Test utilities for engine backends
//!
//! - [`SignalRecorder`]: captures every emission of a signal for
//!   assertions
//! - [`StubObject`]: a minimal live object implementing the account,
//!   contact and presentity traits, for driving collections in tests
//!
//! # Example
//!
//! ```ignore
//! let store: ObjectStore<StubObject> = ObjectStore::new();
//! let added: SignalRecorder<Rc<StubObject>> = SignalRecorder::new();
//! drop(added.record(store.object_added()));
//!
//! store.add_object(StubObject::new("alice"));
//! assert_eq!(added.count(), 1);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::account::Account;
use crate::actor::Actor;
use crate::addressbook::Contact;
use crate::lister::Disposable;
use crate::live::{LiveCell, LiveObject, Question};
use crate::presence::Presentity;
use crate::signal::{Connection, Signal};

/// Records every emission of the signals it is connected to.
///
/// Clones share the same event log, so a recorder can be captured by a
/// closure while the test keeps asserting through the original handle.
pub struct SignalRecorder<E: Clone + 'static> {
    events: Rc<RefCell<Vec<E>>>,
}

impl<E: Clone + 'static> Clone for SignalRecorder<E> {
    fn clone(&self) -> Self {
        Self {
            events: Rc::clone(&self.events),
        }
    }
}

impl<E: Clone + 'static> Default for SignalRecorder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + 'static> SignalRecorder<E> {
    pub fn new() -> Self {
        Self {
            events: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Connect this recorder to `signal`. Discard the returned
    /// connection to record for the signal's lifetime.
    pub fn record(&self, signal: &Signal<E>) -> Connection {
        let events = Rc::clone(&self.events);
        signal.connect(move |event| events.borrow_mut().push(event.clone()))
    }

    /// Everything recorded so far, in emission order.
    pub fn events(&self) -> Vec<E> {
        self.events.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Take and clear the recorded events.
    pub fn drain(&self) -> Vec<E> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn last(&self) -> Option<E> {
        self.events.borrow().last().cloned()
    }
}

impl<E: Clone + 'static> std::fmt::Debug for SignalRecorder<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalRecorder")
            .field("events", &self.events.borrow().len())
            .finish()
    }
}

/// Minimal live object for driving collections in tests.
///
/// Implements [`Account`], [`Contact`] and [`Presentity`], so one stub
/// type exercises every collection kind. Lifecycle transitions are
/// driven manually through [`vanish`](StubObject::vanish),
/// [`touch`](StubObject::touch) and [`raise`](StubObject::raise).
pub struct StubObject {
    live: LiveCell,
    actor: Actor,
    disposed: Cell<bool>,
}

impl StubObject {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            live: LiveCell::new(name),
            actor: Actor::new(),
            disposed: Cell::new(false),
        })
    }

    /// Announce this object's own removal.
    pub fn vanish(&self) {
        self.live.emit_removed();
    }

    /// Announce an attribute change.
    pub fn touch(&self) {
        self.live.emit_updated();
    }

    /// Raise an interactive prompt.
    pub fn raise(&self, question: Rc<Question>) {
        self.live.ask(question);
    }

    pub fn was_disposed(&self) -> bool {
        self.disposed.get()
    }
}

impl LiveObject for StubObject {
    fn name(&self) -> &str {
        self.live.name()
    }

    fn removed(&self) -> &Signal<()> {
        self.live.removed()
    }

    fn updated(&self) -> &Signal<()> {
        self.live.updated()
    }

    fn questions(&self) -> &Signal<Rc<Question>> {
        self.live.questions()
    }
}

impl Disposable for StubObject {
    fn dispose(&self) {
        self.disposed.set(true);
    }
}

impl Account for StubObject {
    fn actor(&self) -> &Actor {
        &self.actor
    }
}

impl Contact for StubObject {
    fn actor(&self) -> &Actor {
        &self.actor
    }
}

impl Presentity for StubObject {
    fn actor(&self) -> &Actor {
        &self.actor
    }
}

impl std::fmt::Debug for StubObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubObject")
            .field("name", &self.live.name())
            .field("disposed", &self.disposed.get())
            .finish()
    }
}
