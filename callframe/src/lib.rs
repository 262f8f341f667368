//! callframe: engine framework for desktop VoIP clients
//!
//! Backends register live domain objects (accounts, contacts, presence
//! entries) into typed collections; front-ends watch the collections'
//! add/update/remove notifications and each object's runtime actions
//! to keep menus and views synchronized, with no compile-time coupling
//! between the two sides.
//!
//! # Example
//! ```ignore
//! use callframe::prelude::*;
//!
//! let core = AccountCore::new();
//! let bank = Rc::new(BankImpl::new("sip"));
//! core.add_bank(bank.clone());
//!
//! core.account_added().connect(|(bank, account)| {
//!     println!("{} appeared in {}", account.name(), bank.name());
//! });
//! ```

// Re-export everything from core
pub use callframe_core::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use callframe_core::prelude::*;
}
