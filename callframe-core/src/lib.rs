//! Core types for callframe
//!
//! This crate is the engine of a desktop VoIP client: independent
//! backends (SIP/H.323 account managers, address-book connectors,
//! presence stacks) register dynamically appearing and disappearing
//! domain objects into typed collections, and arbitrary front-ends
//! watch those collections and the objects' runtime actions without
//! compile-time coupling to any backend.
//!
//! # Core Concepts
//!
//! - **Signal**: synchronous multicast notification point
//! - **LiveObject**: the lifecycle surface (`removed`, `updated`,
//!   `questions`) of everything a collection can hold
//! - **ObjectStore**: generic keyed collection with idempotent add,
//!   convergent removal and leak-free subscription teardown
//! - **Actor / Action**: discoverable, enable/disable-able units of
//!   behavior a front-end renders as menus and buttons
//! - **Cores**: process-wide aggregation points (accounts, address
//!   books, presence) re-publishing child events scoped to their owner
//!
//! # Basic Example
//!
//! ```ignore
//! use callframe_core::prelude::*;
//!
//! let bank = Rc::new(BankImpl::new("sip"));
//! let core = AccountCore::new();
//! core.add_bank(bank.clone());
//!
//! core.account_added().connect(|(bank, account)| {
//!     println!("{} appeared in {}", account.name(), bank.name());
//! });
//!
//! bank.add_account(my_backend_account);
//! ```
//!
//! # Threading
//!
//! The whole engine is single-threaded and synchronous: every mutation
//! happens inside the notification call that triggered it, with the
//! ordering guarantees documented on [`store::ObjectStore`]. Backends
//! running on their own threads re-enter the engine context through
//! [`bridge::Dispatcher`].

pub mod account;
pub mod action;
pub mod actor;
pub mod addressbook;
pub mod bridge;
pub mod connections;
pub mod data_action;
pub mod lister;
pub mod live;
pub mod presence;
pub mod signal;
pub mod snapshot;
pub mod store;
pub mod testing;

// Foundation exports
pub use connections::ConnectionSet;
pub use live::{LiveCell, LiveObject, Question};
pub use signal::{Connection, Signal};

// Collection exports
pub use lister::{Disposable, Dispose, Lister, ReleasePolicy, Retain};
pub use store::ObjectStore;

// Action exports
pub use action::Action;
pub use actor::Actor;
pub use data_action::DataAction;

// Domain exports
pub use account::{Account, AccountCore, Bank, BankImpl};
pub use addressbook::{Book, BookImpl, Contact, ContactAction, ContactCore, Source, SourceImpl};
pub use presence::{Cluster, ClusterImpl, Heap, HeapImpl, Presentity, PresenceCore};

// Bridge exports
pub use bridge::{channel, DispatchError, Dispatcher, EnginePump};

// Snapshot exports
pub use snapshot::{ActionSnapshot, ActorSnapshot, StoreSnapshot};

// Testing exports
pub use testing::{SignalRecorder, StubObject};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::account::{Account, AccountCore, Bank, BankImpl};
    pub use crate::action::Action;
    pub use crate::actor::Actor;
    pub use crate::addressbook::{
        Book, BookImpl, Contact, ContactAction, ContactCore, Source, SourceImpl,
    };
    pub use crate::bridge::{channel, DispatchError, Dispatcher, EnginePump};
    pub use crate::connections::ConnectionSet;
    pub use crate::data_action::DataAction;
    pub use crate::lister::{Disposable, Dispose, Lister, ReleasePolicy, Retain};
    pub use crate::live::{LiveCell, LiveObject, Question};
    pub use crate::presence::{Cluster, ClusterImpl, Heap, HeapImpl, Presentity, PresenceCore};
    pub use crate::signal::{Connection, Signal};
    pub use crate::snapshot::{ActionSnapshot, ActorSnapshot, StoreSnapshot};
    pub use crate::store::ObjectStore;
}
