//! Dispatching backend work into the single-threaded engine context.
//!
//! The engine's collections are `Rc`-based and must only be touched on
//! the engine thread. Backends hand the engine `Send` closures through
//! the bridge; the closures reach engine state through thread-local
//! context, the way a real engine loop exposes its cores.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use callframe::testing::{SignalRecorder, StubObject};
use callframe::{channel, Account, Bank, BankImpl, LiveObject};

thread_local! {
    static ENGINE_BANK: RefCell<Option<Rc<BankImpl>>> = const { RefCell::new(None) };
}

fn with_engine_bank(f: impl FnOnce(&Rc<BankImpl>)) {
    ENGINE_BANK.with(|slot| {
        if let Some(bank) = slot.borrow().as_ref() {
            f(bank);
        }
    });
}

#[test]
fn backend_thread_mutations_land_in_engine_collections() {
    let bank = Rc::new(BankImpl::new("sip"));
    let added: SignalRecorder<Rc<dyn Account>> = SignalRecorder::new();
    drop(added.record(bank.account_added()));
    ENGINE_BANK.with(|slot| *slot.borrow_mut() = Some(bank.clone()));

    let (dispatcher, mut pump) = channel();

    let backend = std::thread::spawn(move || {
        for name in ["alice@example.net", "bob@example.net"] {
            dispatcher
                .dispatch(move || {
                    with_engine_bank(|bank| bank.add_account(StubObject::new(name)));
                })
                .unwrap();
        }
    });
    backend.join().unwrap();

    // Nothing is applied until the engine loop turns.
    assert!(bank.is_empty());

    assert_eq!(pump.drain(), 2);
    assert_eq!(bank.len(), 2);
    let names: Vec<String> = added.events().iter().map(|a| a.name().to_string()).collect();
    assert_eq!(names, vec!["alice@example.net", "bob@example.net"]);

    ENGINE_BANK.with(|slot| *slot.borrow_mut() = None);
}

#[tokio::test]
async fn pump_runs_until_every_backend_is_gone() {
    let (dispatcher, mut pump) = channel();
    let applied = Arc::new(AtomicUsize::new(0));

    let mut backends = Vec::new();
    for _ in 0..3 {
        let dispatcher = dispatcher.clone();
        let applied = applied.clone();
        backends.push(std::thread::spawn(move || {
            for _ in 0..2 {
                let applied = applied.clone();
                dispatcher
                    .dispatch(move || {
                        applied.fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap();
            }
        }));
    }
    for backend in backends {
        backend.join().unwrap();
    }
    drop(dispatcher);

    pump.run().await;
    assert_eq!(applied.load(Ordering::SeqCst), 6);
}

#[test]
fn backend_learns_when_the_engine_is_gone() {
    let (dispatcher, pump) = channel();
    drop(pump);

    let backend = std::thread::spawn(move || dispatcher.dispatch(|| {}));
    let outcome = backend.join().unwrap();

    assert!(outcome.is_err());
}
