//! Dynamic object store
//!
//! [`ObjectStore`] is the generic keyed collection every domain
//! collection in the engine is built on. It maps object identity
//! (pointer identity of the shared `Rc`) to a bundle of active
//! subscriptions, announces membership changes through its own signals,
//! and guarantees:
//!
//! - idempotent insertion: adding a present object is a silent no-op
//! - subscriptions for an object are installed before `object_added`
//!   fires for it, so no event from a freshly added object is missed
//! - `object_removed` fires exactly once per object, after the entry is
//!   detached (re-entrant removal is a no-op) and before the
//!   subscription bundle is torn down
//! - removal through [`remove_object`](ObjectStore::remove_object) and
//!   removal triggered by the object's own `removed` signal converge on
//!   the same teardown path

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::connections::ConnectionSet;
use crate::live::{LiveObject, Question};
use crate::signal::{Connection, Signal};

struct Entry<T: ?Sized> {
    object: Rc<T>,
    // A bundle created by add_connection before registration is
    // pending: it holds subscriptions but the object has not been
    // announced yet.
    registered: bool,
    connections: ConnectionSet,
}

type Entries<T> = Rc<RefCell<Vec<Entry<T>>>>;

/// Generic keyed collection of shared live objects.
///
/// `T` is usually a domain trait object (`dyn Account`, `dyn Contact`,
/// ...); one store is reused unchanged for every object kind in the
/// engine.
pub struct ObjectStore<T: LiveObject + ?Sized> {
    entries: Entries<T>,
    object_added: Signal<Rc<T>>,
    object_updated: Signal<Rc<T>>,
    object_removed: Signal<Rc<T>>,
    questions: Signal<Rc<Question>>,
}

/// Cloning yields a handle to the same collection; handlers that need
/// to mutate the store from inside one of its own notifications capture
/// a clone.
impl<T: LiveObject + ?Sized> Clone for ObjectStore<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Rc::clone(&self.entries),
            object_added: self.object_added.clone(),
            object_updated: self.object_updated.clone(),
            object_removed: self.object_removed.clone(),
            questions: self.questions.clone(),
        }
    }
}

impl<T: LiveObject + ?Sized> Default for ObjectStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: LiveObject + ?Sized> std::fmt::Debug for ObjectStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore")
            .field("objects", &self.entries.borrow().len())
            .finish()
    }
}

impl<T: LiveObject + ?Sized> ObjectStore<T> {
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(Vec::new())),
            object_added: Signal::new(),
            object_updated: Signal::new(),
            object_removed: Signal::new(),
            questions: Signal::new(),
        }
    }

    /// Emitted after an object was registered and its lifecycle
    /// subscriptions were installed.
    pub fn object_added(&self) -> &Signal<Rc<T>> {
        &self.object_added
    }

    /// Forwarded from each registered object's `updated` signal.
    pub fn object_updated(&self) -> &Signal<Rc<T>> {
        &self.object_updated
    }

    /// Emitted exactly once per deregistered object, before its
    /// subscription bundle is dropped.
    pub fn object_removed(&self) -> &Signal<Rc<T>> {
        &self.object_removed
    }

    /// Questions raised by any registered object, chained before that
    /// object's `object_added` fires so none can be missed.
    pub fn questions(&self) -> &Signal<Rc<Question>> {
        &self.questions
    }

    /// Register `object` and announce it. No effect and no event if it
    /// is already present.
    pub fn add_object(&self, object: Rc<T>) {
        self.add_object_with(object, |_| Vec::new());
    }

    /// Register `object`, installing the connections produced by `wire`
    /// into its bundle before `object_added` fires.
    ///
    /// Derived collections use this to piggy-back their own forwarding
    /// (for example chaining a child collection's events upward) with
    /// the guarantee that no event from the fresh object is missed by
    /// an `object_added` observer reacting immediately.
    pub fn add_object_with(
        &self,
        object: Rc<T>,
        wire: impl FnOnce(&Rc<T>) -> Vec<Connection>,
    ) {
        {
            let mut entries = self.entries.borrow_mut();
            match position(&entries, &object) {
                Some(index) if entries[index].registered => {
                    trace!(object = %object.name(), "duplicate registration ignored");
                    return;
                }
                // A pending bundle from add_connection: keep its
                // subscriptions and complete the registration.
                Some(index) => entries[index].registered = true,
                None => entries.push(Entry {
                    object: Rc::clone(&object),
                    registered: true,
                    connections: ConnectionSet::new(),
                }),
            }
        }

        // Lifecycle subscriptions go in first; `object_added` must not
        // fire until the store reacts to everything the object emits.
        let updated = {
            let weak = Rc::downgrade(&object);
            let signal = self.object_updated.clone();
            object.updated().connect(move |_| {
                if let Some(object) = weak.upgrade() {
                    signal.emit(&object);
                }
            })
        };
        self.add_connection(&object, updated);

        let removed = {
            let weak = Rc::downgrade(&object);
            let entries = Rc::downgrade(&self.entries);
            let signal = self.object_removed.clone();
            object.removed().connect(move |_| {
                if let (Some(object), Some(entries)) = (weak.upgrade(), entries.upgrade()) {
                    detach_and_announce(&entries, &signal, &object);
                }
            })
        };
        self.add_connection(&object, removed);

        let questions = {
            let signal = self.questions.clone();
            object.questions().connect(move |question| signal.emit(question))
        };
        self.add_connection(&object, questions);

        for connection in wire(&object) {
            self.add_connection(&object, connection);
        }

        debug!(object = %object.name(), "object registered");
        self.object_added.emit(&object);
    }

    /// Attach an extra subscription to `object`'s bundle without firing
    /// `object_added`, creating a pending bundle if necessary. A later
    /// [`add_object`](ObjectStore::add_object) adopts the pending
    /// bundle and completes the registration.
    pub fn add_connection(&self, object: &Rc<T>, connection: Connection) {
        let mut entries = self.entries.borrow_mut();
        match position(&entries, object) {
            Some(index) => entries[index].connections.add(connection),
            None => {
                let mut connections = ConnectionSet::new();
                connections.add(connection);
                entries.push(Entry {
                    object: Rc::clone(object),
                    registered: false,
                    connections,
                });
            }
        }
    }

    /// Deregister `object`: announce `object_removed`, then tear down
    /// its subscription bundle. Silent no-op if absent.
    pub fn remove_object(&self, object: &Rc<T>) {
        detach_and_announce(&self.entries, &self.object_removed, object);
    }

    /// Remove every object, one at a time, re-fetching the front each
    /// round; safe against objects that deregister further objects from
    /// inside their own `removed` handling.
    pub fn remove_all_objects(&self) {
        loop {
            let front = self.entries.borrow().first().map(|e| Rc::clone(&e.object));
            match front {
                Some(object) => self.remove_object(&object),
                None => break,
            }
        }
    }

    /// Call `visitor` for each object in registration order, stopping
    /// when it returns `false`.
    pub fn visit_objects(&self, mut visitor: impl FnMut(&Rc<T>) -> bool) {
        for object in self.objects() {
            if !visitor(&object) {
                break;
            }
        }
    }

    /// Snapshot of the held objects in registration order.
    pub fn objects(&self) -> Vec<Rc<T>> {
        self.entries
            .borrow()
            .iter()
            .map(|e| Rc::clone(&e.object))
            .collect()
    }

    /// Whether `object` is currently registered (or has a pending
    /// bundle from `add_connection`).
    pub fn contains(&self, object: &Rc<T>) -> bool {
        position(&self.entries.borrow(), object).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

// Identity is the object's address, deliberately ignoring trait-object
// vtable metadata: two Rc<dyn _> handles to the same object may carry
// different vtable pointers.
fn position<T: ?Sized>(entries: &[Entry<T>], object: &Rc<T>) -> Option<usize> {
    entries
        .iter()
        .position(|e| std::ptr::addr_eq(Rc::as_ptr(&e.object), Rc::as_ptr(object)))
}

/// Commit the removal, announce it, then drop the bundle, in that
/// order. Detaching first makes the announcement re-entrant-safe: a
/// second removal of the same object from inside `object_removed`
/// finds nothing and no-ops.
fn detach_and_announce<T: LiveObject + ?Sized>(
    entries: &Entries<T>,
    object_removed: &Signal<Rc<T>>,
    object: &Rc<T>,
) {
    let entry = {
        let mut entries = entries.borrow_mut();
        match position(&entries, object) {
            Some(index) => entries.remove(index),
            None => return,
        }
    };
    if entry.registered {
        debug!(object = %object.name(), "object deregistered");
        object_removed.emit(object);
    }
    // Dropping the entry clears its ConnectionSet, including the
    // object's own `removed` subscription that may have triggered this
    // very call.
    drop(entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{SignalRecorder, StubObject};
    use std::cell::Cell;

    fn store() -> ObjectStore<StubObject> {
        ObjectStore::new()
    }

    #[test]
    fn test_add_is_idempotent() {
        let store = store();
        let added: SignalRecorder<Rc<StubObject>> = SignalRecorder::new();
        drop(added.record(store.object_added()));

        let a = StubObject::new("a");
        store.add_object(a.clone());
        store.add_object(a.clone());

        assert_eq!(added.count(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_explicit_removal() {
        let store = store();
        let removed: SignalRecorder<Rc<StubObject>> = SignalRecorder::new();
        drop(removed.record(store.object_removed()));

        let a = StubObject::new("a");
        store.add_object(a.clone());
        store.remove_object(&a);
        store.remove_object(&a);

        assert_eq!(removed.count(), 1);
        assert!(store.is_empty());
        // All subscriptions are gone: the object announcing itself
        // again must not re-trigger store events.
        a.vanish();
        assert_eq!(removed.count(), 1);
    }

    #[test]
    fn test_self_announced_removal_converges() {
        let store = store();
        let removed: SignalRecorder<Rc<StubObject>> = SignalRecorder::new();
        drop(removed.record(store.object_removed()));

        let a = StubObject::new("a");
        store.add_object(a.clone());
        a.vanish();

        assert_eq!(removed.count(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_updated_is_forwarded() {
        let store = store();
        let updated: SignalRecorder<Rc<StubObject>> = SignalRecorder::new();
        drop(updated.record(store.object_updated()));

        let a = StubObject::new("a");
        store.add_object(a.clone());
        a.touch();
        a.touch();

        assert_eq!(updated.count(), 2);

        store.remove_object(&a);
        a.touch();
        assert_eq!(updated.count(), 2);
    }

    #[test]
    fn test_remove_all_objects() {
        let store = store();
        let removed: SignalRecorder<Rc<StubObject>> = SignalRecorder::new();
        drop(removed.record(store.object_removed()));

        for name in ["a", "b", "c", "d"] {
            store.add_object(StubObject::new(name));
        }
        store.remove_all_objects();

        assert_eq!(removed.count(), 4);
        assert!(store.is_empty());
    }

    #[test]
    fn test_removed_observer_may_remove_others() {
        // An object_removed handler that itself deregisters another
        // object must not derail the bulk teardown.
        let store = store();
        let a = StubObject::new("a");
        let b = StubObject::new("b");
        store.add_object(a.clone());
        store.add_object(b.clone());

        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let entries = store.objects();
        let st = store.clone();
        drop(store.object_removed().connect(move |_| {
            h.set(h.get() + 1);
            for other in &entries {
                st.remove_object(other);
            }
        }));

        store.remove_all_objects();
        assert!(store.is_empty());
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_added_fires_after_subscriptions_installed() {
        // Touching the object from inside the added handler must
        // already be observable as object_updated.
        let store = store();
        let updated: SignalRecorder<Rc<StubObject>> = SignalRecorder::new();
        drop(updated.record(store.object_updated()));
        drop(store.object_added().connect(|object: &Rc<StubObject>| object.touch()));

        store.add_object(StubObject::new("a"));
        assert_eq!(updated.count(), 1);
    }

    #[test]
    fn test_questions_chained() {
        let store = store();
        let questions: SignalRecorder<Rc<Question>> = SignalRecorder::new();
        drop(questions.record(store.questions()));

        let a = StubObject::new("a");
        store.add_object(a.clone());
        a.raise(Question::new("auth", "password?", |_| {}));

        assert_eq!(questions.count(), 1);
        assert_eq!(questions.events()[0].title(), "auth");
    }

    #[test]
    fn test_add_object_completes_pending_bundle() {
        // Forwarding piggy-backed before registration must not swallow
        // the registration itself.
        let store = store();
        let added: SignalRecorder<Rc<StubObject>> = SignalRecorder::new();
        let removed: SignalRecorder<Rc<StubObject>> = SignalRecorder::new();
        drop(added.record(store.object_added()));
        drop(removed.record(store.object_removed()));

        let a = StubObject::new("a");
        let side = Signal::<()>::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        store.add_connection(&a, side.connect(move |_| h.set(h.get() + 1)));

        store.add_object(a.clone());
        assert_eq!(added.count(), 1);

        // The early connection is part of the same bundle.
        side.emit(&());
        assert_eq!(hits.get(), 1);

        // Lifecycle subscriptions were installed by the registration.
        a.vanish();
        assert_eq!(removed.count(), 1);
        assert!(store.is_empty());
        side.emit(&());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_pending_bundle_removal_is_silent() {
        let store = store();
        let removed: SignalRecorder<Rc<StubObject>> = SignalRecorder::new();
        drop(removed.record(store.object_removed()));

        let a = StubObject::new("a");
        let side = Signal::<()>::new();
        store.add_connection(&a, side.connect(|_| {}));

        // The object was never announced, so its removal is not either.
        store.remove_object(&a);
        assert_eq!(removed.count(), 0);
        assert!(!store.contains(&a));
    }

    #[test]
    fn test_visit_objects_short_circuits() {
        let store = store();
        for name in ["a", "b", "c"] {
            store.add_object(StubObject::new(name));
        }

        let mut seen = Vec::new();
        store.visit_objects(|object| {
            seen.push(object.name().to_string());
            seen.len() < 2
        });
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[test]
    fn test_add_connection_creates_bundle_without_event() {
        let store = store();
        let added: SignalRecorder<Rc<StubObject>> = SignalRecorder::new();
        drop(added.record(store.object_added()));

        let a = StubObject::new("a");
        let side = Signal::<()>::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        store.add_connection(&a, side.connect(move |_| h.set(h.get() + 1)));

        assert_eq!(added.count(), 0);
        assert!(store.contains(&a));

        side.emit(&());
        assert_eq!(hits.get(), 1);

        store.remove_object(&a);
        side.emit(&());
        assert_eq!(hits.get(), 1);
    }
}
