//! Softphone - Minimal callframe example
//!
//! This example demonstrates the core pattern in one file:
//! - Backend: registers accounts from its own thread through the bridge
//! - Engine: single-threaded world of cores, banks and live objects
//! - Front-end: reacts to signals, renders actions, answers questions
//!
//! Run it and watch a simulated SIP backend come up, ask for a
//! password, and tear itself down again.

use std::cell::RefCell;
use std::rc::Rc;

use callframe::prelude::*;

// ============================================================================
// Engine world - lives on the engine thread only
// ============================================================================

struct Engine {
    accounts: AccountCore,
    sip: Rc<BankImpl>,
}

thread_local! {
    static ENGINE: RefCell<Option<Rc<Engine>>> = const { RefCell::new(None) };
}

/// Run `f` against the engine world. Dispatched closures use this to
/// re-enter the single-threaded context.
fn with_engine(f: impl FnOnce(&Engine)) {
    ENGINE.with(|slot| {
        if let Some(engine) = slot.borrow().as_ref() {
            f(engine);
        }
    });
}

// ============================================================================
// A backend's account type
// ============================================================================

struct SipAccount {
    live: LiveCell,
    actor: Actor,
}

impl SipAccount {
    fn new(uri: &str) -> Rc<Self> {
        let account = Rc::new(Self {
            live: LiveCell::new(uri),
            actor: Actor::new(),
        });
        let uri = uri.to_string();
        account.actor.add_action(Action::new("dial", "Place a call", move || {
            println!("  dialing {uri}...");
        }));
        account
    }

    /// Ask the front-end for credentials.
    fn request_credentials(&self) {
        let uri = self.live.name().to_string();
        self.live.ask(Question::new(
            "auth",
            format!("password for {}?", self.live.name()),
            move |reply| match reply {
                Some(_) => println!("  {uri} registered with the proxy"),
                None => println!("  {uri} stays offline"),
            },
        ));
    }
}

impl LiveObject for SipAccount {
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

impl Account for SipAccount {
    fn actor(&self) -> &Actor {
        &self.actor
    }
}

// ============================================================================
// Main - build the world, let a backend thread populate it
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let engine = Rc::new(Engine {
        accounts: AccountCore::new(),
        sip: Rc::new(BankImpl::new("sip")),
    });
    engine.accounts.add_bank(engine.sip.clone());

    // Front-end: watch the core, never a backend directly.
    drop(engine.accounts.account_added().connect(
        |(bank, account): &(Rc<dyn Bank>, Rc<dyn Account>)| {
            println!("+ {} appeared in bank {}", account.name(), bank.name());
        },
    ));
    drop(engine.accounts.account_removed().connect(
        |(bank, account): &(Rc<dyn Bank>, Rc<dyn Account>)| {
            println!("- {} left bank {}", account.name(), bank.name());
        },
    ));
    drop(engine.accounts.questions().connect(|question: &Rc<Question>| {
        println!("? [{}] {}", question.title(), question.prompt());
        question.answer("hunter2");
    }));

    ENGINE.with(|slot| *slot.borrow_mut() = Some(engine.clone()));

    let (dispatcher, mut pump) = channel();

    // Backend thread: discovers accounts and re-enters the engine
    // context; it never touches engine state itself.
    let backend = std::thread::spawn(move || {
        for uri in ["alice@example.net", "bob@example.net"] {
            let outcome = dispatcher.dispatch(move || {
                with_engine(|engine| {
                    let account = SipAccount::new(uri);
                    engine.sip.add_account(account.clone());
                    account.request_credentials();
                });
            });
            if outcome.is_err() {
                return;
            }
        }
    });
    // Dropping the backend's dispatcher ends the pump below.
    if backend.join().is_err() {
        eprintln!("backend thread panicked");
    }

    pump.run().await;

    // Render each account's actions, the way a menu builder would.
    engine.sip.visit_accounts(&mut |account| {
        let snapshot = ActorSnapshot::of(account.actor());
        for action in &snapshot.actions {
            println!("  [{}] {} - {}", account.name(), action.name, action.description);
        }
        if let Some(dial) = account.actor().get_action("dial") {
            dial.activate();
        }
        true
    });

    engine.sip.remove_all_accounts();
    ENGINE.with(|slot| *slot.borrow_mut() = None);
}
