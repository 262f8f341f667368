//! Collection contract tests: idempotent insertion, removal
//! convergence and bulk teardown.

use std::rc::Rc;

use callframe::testing::{SignalRecorder, StubObject};
use callframe::{Dispose, Lister, LiveObject, ObjectStore};

#[test]
fn add_remove_scenario() {
    let store: ObjectStore<StubObject> = ObjectStore::new();
    let added: SignalRecorder<Rc<StubObject>> = SignalRecorder::new();
    let removed: SignalRecorder<Rc<StubObject>> = SignalRecorder::new();
    drop(added.record(store.object_added()));
    drop(removed.record(store.object_removed()));

    let a = StubObject::new("a");
    let b = StubObject::new("b");

    store.add_object(a.clone());
    assert_eq!(added.count(), 1);

    store.add_object(a.clone());
    assert_eq!(added.count(), 1, "duplicate add must not announce");
    assert_eq!(store.len(), 1);

    store.remove_object(&a);
    assert_eq!(removed.count(), 1);
    assert_eq!(store.len(), 0);

    store.add_object(b.clone());
    assert_eq!(store.len(), 1);

    b.vanish();
    assert_eq!(removed.count(), 2);
    assert_eq!(store.len(), 0);
}

#[test]
fn removal_paths_converge() {
    // Explicit removal and self-announced removal must produce the
    // same end state: one object_removed, no residual subscriptions.
    for explicit in [true, false] {
        let store: ObjectStore<StubObject> = ObjectStore::new();
        let removed: SignalRecorder<Rc<StubObject>> = SignalRecorder::new();
        drop(removed.record(store.object_removed()));

        let o = StubObject::new("o");
        store.add_object(o.clone());
        let live_slots = o.removed().slot_count();
        assert!(live_slots > 0);

        if explicit {
            store.remove_object(&o);
        } else {
            o.vanish();
        }

        assert_eq!(removed.count(), 1);
        assert_eq!(store.len(), 0);
        assert_eq!(o.removed().slot_count(), 0, "subscriptions must be torn down");
        assert_eq!(o.updated().slot_count(), 0);

        // Late lifecycle noise from the object must stay unobserved.
        o.vanish();
        o.touch();
        assert_eq!(removed.count(), 1);
    }
}

#[test]
fn bulk_removal_fires_once_per_object() {
    let store: ObjectStore<StubObject> = ObjectStore::new();
    let removed: SignalRecorder<Rc<StubObject>> = SignalRecorder::new();
    drop(removed.record(store.object_removed()));

    let objects: Vec<_> = (0..10)
        .map(|i| {
            let o = StubObject::new(format!("o{i}"));
            store.add_object(o.clone());
            o
        })
        .collect();

    store.remove_all_objects();

    assert_eq!(removed.count(), objects.len());
    assert_eq!(store.len(), 0);
    for o in &objects {
        assert_eq!(o.removed().slot_count(), 0);
    }
}

#[test]
fn lister_applies_policy_on_both_paths() {
    let lister: Lister<StubObject, Dispose> = Lister::new();

    let a = StubObject::new("a");
    let b = StubObject::new("b");
    lister.add_object(a.clone());
    lister.add_object(b.clone());

    lister.remove_object(&a);
    lister.announced_release(&b);

    assert!(a.was_disposed());
    assert!(b.was_disposed());
    assert!(lister.is_empty());
}

#[test]
fn visit_respects_insertion_order() {
    let store: ObjectStore<StubObject> = ObjectStore::new();
    for name in ["first", "second", "third"] {
        store.add_object(StubObject::new(name));
    }

    let mut names = Vec::new();
    store.visit_objects(|o| {
        names.push(o.name().to_string());
        true
    });
    assert_eq!(names, vec!["first", "second", "third"]);
}
