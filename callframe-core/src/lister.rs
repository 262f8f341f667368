//! Release-policy-parameterized collection
//!
//! [`Lister`] is the legacy sibling of
//! [`ObjectStore`](crate::store::ObjectStore): the same external
//! contract, plus a compile-time [`ReleasePolicy`] deciding what
//! happens to an object once it has left the collection. Two policies
//! ship with the engine: [`Retain`] (the collection never owns the
//! object beyond its shared reference) and [`Dispose`] (the collection
//! calls [`Disposable::dispose`] on release).
//!
//! The policy runs exactly once per removal, after every
//! `object_removed` observer, on both removal paths (explicit call and
//! self-announced `removed`).

use std::marker::PhantomData;
use std::rc::Rc;

use tracing::trace;

use crate::live::{LiveObject, Question};
use crate::signal::{Connection, Signal};
use crate::store::ObjectStore;

/// Objects a [`Dispose`]-managed [`Lister`] can shut down on release.
pub trait Disposable {
    /// Release the resources behind the object. Deallocation itself
    /// still follows the last shared reference.
    fn dispose(&self);
}

/// Strategy applied to an object after it has been removed and
/// announced.
pub trait ReleasePolicy<T: ?Sized>: 'static {
    fn release(object: &Rc<T>);
}

/// The collection never owns memory: release is a no-op.
pub struct Retain;

impl<T: ?Sized> ReleasePolicy<T> for Retain {
    fn release(_object: &Rc<T>) {}
}

/// The collection takes deletion responsibility: release disposes the
/// object before the collection drops its strong reference.
pub struct Dispose;

impl<T: ?Sized + Disposable + LiveObject> ReleasePolicy<T> for Dispose {
    fn release(object: &Rc<T>) {
        trace!(object = %object.name(), "disposing released object");
        object.dispose();
    }
}

/// Keyed collection with a pluggable release policy.
///
/// Storage and notification bookkeeping delegate to an internal
/// [`ObjectStore`]; the lister re-emits through its own signals so
/// that the policy, hooked behind the re-emission, runs only after all
/// external observers saw `object_removed`.
pub struct Lister<T: LiveObject + ?Sized, P: ReleasePolicy<T> = Retain> {
    store: ObjectStore<T>,
    object_added: Signal<Rc<T>>,
    object_updated: Signal<Rc<T>>,
    object_removed: Signal<Rc<T>>,
    _policy: PhantomData<P>,
}

impl<T: LiveObject + ?Sized, P: ReleasePolicy<T>> Default for Lister<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: LiveObject + ?Sized, P: ReleasePolicy<T>> Lister<T, P> {
    pub fn new() -> Self {
        let store = ObjectStore::new();
        let object_added = Signal::new();
        let object_updated = Signal::new();
        let object_removed = Signal::new();

        {
            let signal = object_added.clone();
            drop(store.object_added().connect(move |object| signal.emit(object)));
        }
        {
            let signal = object_updated.clone();
            drop(store.object_updated().connect(move |object| signal.emit(object)));
        }
        // Re-emission first, policy second: by the time the policy
        // slot runs, every observer of this lister has been notified.
        {
            let signal = object_removed.clone();
            drop(store.object_removed().connect(move |object| signal.emit(object)));
        }
        drop(store.object_removed().connect(|object| P::release(object)));

        Self {
            store,
            object_added,
            object_updated,
            object_removed,
            _policy: PhantomData,
        }
    }

    pub fn object_added(&self) -> &Signal<Rc<T>> {
        &self.object_added
    }

    pub fn object_updated(&self) -> &Signal<Rc<T>> {
        &self.object_updated
    }

    pub fn object_removed(&self) -> &Signal<Rc<T>> {
        &self.object_removed
    }

    pub fn questions(&self) -> &Signal<Rc<Question>> {
        self.store.questions()
    }

    pub fn add_object(&self, object: Rc<T>) {
        self.store.add_object(object);
    }

    pub fn add_connection(&self, object: &Rc<T>, connection: Connection) {
        self.store.add_connection(object, connection);
    }

    /// Remove, announce, then apply the release policy.
    pub fn remove_object(&self, object: &Rc<T>) {
        self.store.remove_object(object);
    }

    /// Have `object` announce its own removal; convergent with
    /// [`remove_object`](Lister::remove_object). Silent no-op if the
    /// lister does not hold `object`: nothing is announced and the
    /// policy does not run.
    pub fn announced_release(&self, object: &Rc<T>) {
        if !self.store.contains(object) {
            return;
        }
        object.removed().emit(&());
    }

    pub fn remove_all_objects(&self) {
        self.store.remove_all_objects();
    }

    pub fn visit_objects(&self, visitor: impl FnMut(&Rc<T>) -> bool) {
        self.store.visit_objects(visitor);
    }

    pub fn objects(&self) -> Vec<Rc<T>> {
        self.store.objects()
    }

    pub fn contains(&self, object: &Rc<T>) -> bool {
        self.store.contains(object)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl<T: LiveObject + ?Sized, P: ReleasePolicy<T>> std::fmt::Debug for Lister<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lister")
            .field("objects", &self.store.len())
            .finish()
    }
}
