//! Presence heaps
//!
//! Presence backends publish the people they watch as [`Presentity`]s
//! grouped in [`Heap`]s, owned by a [`Cluster`]. [`PresenceCore`]
//! aggregates every cluster. This is the deepest hierarchy in the
//! engine: a presentity appearing in a heap is observable at the heap,
//! at the owning cluster (scoped to the heap) and at the core, in that
//! order.

use std::rc::Rc;

use tracing::debug;

use crate::actor::Actor;
use crate::live::{LiveCell, LiveObject, Question};
use crate::signal::{Connection, Signal};
use crate::store::ObjectStore;

/// Someone whose presence is being watched.
pub trait Presentity: LiveObject {
    /// The runtime actions this presentity offers (chat, remove, ...).
    fn actor(&self) -> &Actor;
}

/// A collection of presentities.
pub trait Heap: LiveObject {
    fn presentity_added(&self) -> &Signal<Rc<dyn Presentity>>;
    fn presentity_updated(&self) -> &Signal<Rc<dyn Presentity>>;
    fn presentity_removed(&self) -> &Signal<Rc<dyn Presentity>>;
    fn visit_presentities(&self, visitor: &mut dyn FnMut(&Rc<dyn Presentity>) -> bool);
}

/// A collection of heaps, re-publishing presentity events scoped to
/// the owning heap.
pub trait Cluster: LiveObject {
    fn heap_added(&self) -> &Signal<Rc<dyn Heap>>;
    fn heap_updated(&self) -> &Signal<Rc<dyn Heap>>;
    fn heap_removed(&self) -> &Signal<Rc<dyn Heap>>;
    fn presentity_added(&self) -> &Signal<(Rc<dyn Heap>, Rc<dyn Presentity>)>;
    fn presentity_updated(&self) -> &Signal<(Rc<dyn Heap>, Rc<dyn Presentity>)>;
    fn presentity_removed(&self) -> &Signal<(Rc<dyn Heap>, Rc<dyn Presentity>)>;
    fn visit_heaps(&self, visitor: &mut dyn FnMut(&Rc<dyn Heap>) -> bool);
}

/// Reusable [`Heap`] implementation for backends to compose.
pub struct HeapImpl {
    live: LiveCell,
    store: ObjectStore<dyn Presentity>,
}

impl HeapImpl {
    pub fn new(name: impl Into<String>) -> Self {
        let live = LiveCell::new(name);
        let store: ObjectStore<dyn Presentity> = ObjectStore::new();

        {
            let updated = live.updated().clone();
            drop(store.object_added().connect_late(move |_| updated.emit(&())));
        }
        {
            let updated = live.updated().clone();
            drop(store.object_removed().connect_late(move |_| updated.emit(&())));
        }
        {
            let questions = live.questions().clone();
            drop(store.questions().connect(move |question| questions.emit(question)));
        }

        Self { live, store }
    }

    pub fn add_presentity(&self, presentity: Rc<dyn Presentity>) {
        self.store.add_object(presentity);
    }

    pub fn remove_presentity(&self, presentity: &Rc<dyn Presentity>) {
        self.store.remove_object(presentity);
    }

    pub fn remove_all_presentities(&self) {
        self.store.remove_all_objects();
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl LiveObject for HeapImpl {
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

impl Heap for HeapImpl {
    fn presentity_added(&self) -> &Signal<Rc<dyn Presentity>> {
        self.store.object_added()
    }

    fn presentity_updated(&self) -> &Signal<Rc<dyn Presentity>> {
        self.store.object_updated()
    }

    fn presentity_removed(&self) -> &Signal<Rc<dyn Presentity>> {
        self.store.object_removed()
    }

    fn visit_presentities(&self, visitor: &mut dyn FnMut(&Rc<dyn Presentity>) -> bool) {
        self.store.visit_objects(|presentity| visitor(presentity));
    }
}

impl std::fmt::Debug for HeapImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapImpl")
            .field("name", &self.live.name())
            .field("presentities", &self.store.len())
            .finish()
    }
}

/// Reusable [`Cluster`] implementation for backends to compose.
///
/// Each added heap's presentity events are re-emitted scoped to that
/// heap; the forwarding is installed before `heap_added` fires.
pub struct ClusterImpl {
    live: LiveCell,
    store: ObjectStore<dyn Heap>,
    presentity_added: Signal<(Rc<dyn Heap>, Rc<dyn Presentity>)>,
    presentity_updated: Signal<(Rc<dyn Heap>, Rc<dyn Presentity>)>,
    presentity_removed: Signal<(Rc<dyn Heap>, Rc<dyn Presentity>)>,
}

impl ClusterImpl {
    pub fn new(name: impl Into<String>) -> Self {
        let live = LiveCell::new(name);
        let store: ObjectStore<dyn Heap> = ObjectStore::new();

        {
            let updated = live.updated().clone();
            drop(store.object_added().connect_late(move |_| updated.emit(&())));
        }
        {
            let updated = live.updated().clone();
            drop(store.object_removed().connect_late(move |_| updated.emit(&())));
        }
        {
            let questions = live.questions().clone();
            drop(store.questions().connect(move |question| questions.emit(question)));
        }

        Self {
            live,
            store,
            presentity_added: Signal::new(),
            presentity_updated: Signal::new(),
            presentity_removed: Signal::new(),
        }
    }

    pub fn add_heap(&self, heap: Rc<dyn Heap>) {
        let added = self.presentity_added.clone();
        let updated = self.presentity_updated.clone();
        let removed = self.presentity_removed.clone();
        self.store.add_object_with(heap, move |heap| {
            debug!(heap = %heap.name(), "heap registered with cluster");
            vec![
                forward_scoped(heap, heap.presentity_added(), added),
                forward_scoped(heap, heap.presentity_updated(), updated),
                forward_scoped(heap, heap.presentity_removed(), removed),
            ]
        });
    }

    pub fn remove_heap(&self, heap: &Rc<dyn Heap>) {
        self.store.remove_object(heap);
    }

    pub fn remove_all_heaps(&self) {
        self.store.remove_all_objects();
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl LiveObject for ClusterImpl {
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

impl Cluster for ClusterImpl {
    fn heap_added(&self) -> &Signal<Rc<dyn Heap>> {
        self.store.object_added()
    }

    fn heap_updated(&self) -> &Signal<Rc<dyn Heap>> {
        self.store.object_updated()
    }

    fn heap_removed(&self) -> &Signal<Rc<dyn Heap>> {
        self.store.object_removed()
    }

    fn presentity_added(&self) -> &Signal<(Rc<dyn Heap>, Rc<dyn Presentity>)> {
        &self.presentity_added
    }

    fn presentity_updated(&self) -> &Signal<(Rc<dyn Heap>, Rc<dyn Presentity>)> {
        &self.presentity_updated
    }

    fn presentity_removed(&self) -> &Signal<(Rc<dyn Heap>, Rc<dyn Presentity>)> {
        &self.presentity_removed
    }

    fn visit_heaps(&self, visitor: &mut dyn FnMut(&Rc<dyn Heap>) -> bool) {
        self.store.visit_objects(|heap| visitor(heap));
    }
}

impl std::fmt::Debug for ClusterImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterImpl")
            .field("name", &self.live.name())
            .field("heaps", &self.store.len())
            .finish()
    }
}

/// Process-wide registry of presence clusters.
pub struct PresenceCore {
    clusters: ObjectStore<dyn Cluster>,
    heap_added: Signal<(Rc<dyn Cluster>, Rc<dyn Heap>)>,
    heap_updated: Signal<(Rc<dyn Cluster>, Rc<dyn Heap>)>,
    heap_removed: Signal<(Rc<dyn Cluster>, Rc<dyn Heap>)>,
    presentity_added: Signal<(Rc<dyn Heap>, Rc<dyn Presentity>)>,
    presentity_updated: Signal<(Rc<dyn Heap>, Rc<dyn Presentity>)>,
    presentity_removed: Signal<(Rc<dyn Heap>, Rc<dyn Presentity>)>,
}

impl Default for PresenceCore {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceCore {
    pub fn new() -> Self {
        Self {
            clusters: ObjectStore::new(),
            heap_added: Signal::new(),
            heap_updated: Signal::new(),
            heap_removed: Signal::new(),
            presentity_added: Signal::new(),
            presentity_updated: Signal::new(),
            presentity_removed: Signal::new(),
        }
    }

    pub fn add_cluster(&self, cluster: Rc<dyn Cluster>) {
        let heap_added = self.heap_added.clone();
        let heap_updated = self.heap_updated.clone();
        let heap_removed = self.heap_removed.clone();
        let presentity_added = self.presentity_added.clone();
        let presentity_updated = self.presentity_updated.clone();
        let presentity_removed = self.presentity_removed.clone();
        self.clusters.add_object_with(cluster, move |cluster| {
            debug!(cluster = %cluster.name(), "cluster registered with presence core");
            vec![
                forward_heap_scoped(cluster, cluster.heap_added(), heap_added),
                forward_heap_scoped(cluster, cluster.heap_updated(), heap_updated),
                forward_heap_scoped(cluster, cluster.heap_removed(), heap_removed),
                relay(cluster.presentity_added(), presentity_added),
                relay(cluster.presentity_updated(), presentity_updated),
                relay(cluster.presentity_removed(), presentity_removed),
            ]
        });
    }

    pub fn remove_cluster(&self, cluster: &Rc<dyn Cluster>) {
        self.clusters.remove_object(cluster);
    }

    pub fn cluster_added(&self) -> &Signal<Rc<dyn Cluster>> {
        self.clusters.object_added()
    }

    pub fn cluster_updated(&self) -> &Signal<Rc<dyn Cluster>> {
        self.clusters.object_updated()
    }

    pub fn cluster_removed(&self) -> &Signal<Rc<dyn Cluster>> {
        self.clusters.object_removed()
    }

    pub fn heap_added(&self) -> &Signal<(Rc<dyn Cluster>, Rc<dyn Heap>)> {
        &self.heap_added
    }

    pub fn heap_updated(&self) -> &Signal<(Rc<dyn Cluster>, Rc<dyn Heap>)> {
        &self.heap_updated
    }

    pub fn heap_removed(&self) -> &Signal<(Rc<dyn Cluster>, Rc<dyn Heap>)> {
        &self.heap_removed
    }

    /// Presentity events from every heap in every cluster, scoped to
    /// the owning heap.
    pub fn presentity_added(&self) -> &Signal<(Rc<dyn Heap>, Rc<dyn Presentity>)> {
        &self.presentity_added
    }

    pub fn presentity_updated(&self) -> &Signal<(Rc<dyn Heap>, Rc<dyn Presentity>)> {
        &self.presentity_updated
    }

    pub fn presentity_removed(&self) -> &Signal<(Rc<dyn Heap>, Rc<dyn Presentity>)> {
        &self.presentity_removed
    }

    pub fn questions(&self) -> &Signal<Rc<Question>> {
        self.clusters.questions()
    }

    pub fn visit_clusters(&self, visitor: impl FnMut(&Rc<dyn Cluster>) -> bool) {
        self.clusters.visit_objects(visitor);
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

impl std::fmt::Debug for PresenceCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceCore")
            .field("clusters", &self.clusters.len())
            .finish()
    }
}

fn forward_scoped(
    heap: &Rc<dyn Heap>,
    signal: &Signal<Rc<dyn Presentity>>,
    target: Signal<(Rc<dyn Heap>, Rc<dyn Presentity>)>,
) -> Connection {
    let weak = Rc::downgrade(heap);
    signal.connect_late(move |presentity| {
        if let Some(heap) = weak.upgrade() {
            target.emit(&(heap, Rc::clone(presentity)));
        }
    })
}

fn forward_heap_scoped(
    cluster: &Rc<dyn Cluster>,
    signal: &Signal<Rc<dyn Heap>>,
    target: Signal<(Rc<dyn Cluster>, Rc<dyn Heap>)>,
) -> Connection {
    let weak = Rc::downgrade(cluster);
    signal.connect_late(move |heap| {
        if let Some(cluster) = weak.upgrade() {
            target.emit(&(cluster, Rc::clone(heap)));
        }
    })
}

fn relay(
    signal: &Signal<(Rc<dyn Heap>, Rc<dyn Presentity>)>,
    target: Signal<(Rc<dyn Heap>, Rc<dyn Presentity>)>,
) -> Connection {
    signal.connect_late(move |event| target.emit(event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{SignalRecorder, StubObject};

    fn presentity(name: &str) -> Rc<dyn Presentity> {
        StubObject::new(name)
    }

    fn wired_core() -> (PresenceCore, Rc<ClusterImpl>, Rc<HeapImpl>) {
        let core = PresenceCore::new();
        let cluster = Rc::new(ClusterImpl::new("sip-presence"));
        let heap = Rc::new(HeapImpl::new("buddies"));
        core.add_cluster(cluster.clone());
        cluster.add_heap(heap.clone());
        (core, cluster, heap)
    }

    #[test]
    fn test_presentity_event_reaches_all_three_levels() {
        let (core, cluster, heap) = wired_core();

        let at_heap: SignalRecorder<Rc<dyn Presentity>> = SignalRecorder::new();
        drop(at_heap.record(heap.presentity_added()));
        let at_cluster: SignalRecorder<(Rc<dyn Heap>, Rc<dyn Presentity>)> =
            SignalRecorder::new();
        drop(at_cluster.record(cluster.presentity_added()));
        let at_core: SignalRecorder<(Rc<dyn Heap>, Rc<dyn Presentity>)> = SignalRecorder::new();
        drop(at_core.record(core.presentity_added()));

        heap.add_presentity(presentity("alice"));

        assert_eq!(at_heap.count(), 1);
        assert_eq!(at_cluster.count(), 1);
        assert_eq!(at_core.count(), 1);
        let (owner, added) = at_core.events().remove(0);
        assert_eq!(owner.name(), "buddies");
        assert_eq!(added.name(), "alice");
    }

    #[test]
    fn test_leaf_observers_fire_before_upper_levels() {
        let (core, _cluster, heap) = wired_core();

        let order = Rc::new(std::cell::RefCell::new(Vec::new()));
        let o1 = order.clone();
        drop(heap.presentity_added().connect(move |_| o1.borrow_mut().push("heap")));
        let o2 = order.clone();
        drop(core.presentity_added().connect(move |_| o2.borrow_mut().push("core")));

        heap.add_presentity(presentity("alice"));

        assert_eq!(*order.borrow(), vec!["heap", "core"]);
    }

    #[test]
    fn test_self_announced_presentity_removal_propagates() {
        let (core, _cluster, heap) = wired_core();
        let removed: SignalRecorder<(Rc<dyn Heap>, Rc<dyn Presentity>)> = SignalRecorder::new();
        drop(removed.record(core.presentity_removed()));

        let alice = StubObject::new("alice");
        heap.add_presentity(alice.clone());
        alice.vanish();

        assert_eq!(removed.count(), 1);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_removing_heap_stops_scoped_forwarding() {
        let (core, cluster, heap) = wired_core();
        let added: SignalRecorder<(Rc<dyn Heap>, Rc<dyn Presentity>)> = SignalRecorder::new();
        drop(added.record(core.presentity_added()));

        let as_heap: Rc<dyn Heap> = heap.clone();
        cluster.remove_heap(&as_heap);
        heap.add_presentity(presentity("late"));

        assert_eq!(added.count(), 0);
    }

    #[test]
    fn test_questions_propagate_three_levels() {
        let (core, _cluster, heap) = wired_core();
        let questions: SignalRecorder<Rc<Question>> = SignalRecorder::new();
        drop(questions.record(core.questions()));

        let alice = StubObject::new("alice");
        heap.add_presentity(alice.clone());
        alice.raise(Question::new("subscribe", "allow alice to see you?", |_| {}));

        assert_eq!(questions.count(), 1);
    }
}
