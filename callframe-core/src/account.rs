//! Account banks
//!
//! Protocol backends (SIP, H.323) expose their accounts through a
//! [`Bank`]; the process-wide [`AccountCore`] aggregates every bank and
//! re-publishes account-level events scoped to the owning bank, so a
//! front-end can watch a single point for "some account somewhere
//! changed".

use std::rc::Rc;

use tracing::debug;

use crate::actor::Actor;
use crate::live::{LiveCell, LiveObject, Question};
use crate::signal::Signal;
use crate::store::ObjectStore;

/// A registrable account. The engine manages its lifecycle and
/// notifications only; what makes an account valid is the backend's
/// business.
pub trait Account: LiveObject {
    /// The runtime actions this account offers (enable, edit, remove,
    /// ...).
    fn actor(&self) -> &Actor;
}

/// A collection of accounts owned by one backend.
pub trait Bank: LiveObject {
    fn account_added(&self) -> &Signal<Rc<dyn Account>>;
    fn account_updated(&self) -> &Signal<Rc<dyn Account>>;
    fn account_removed(&self) -> &Signal<Rc<dyn Account>>;
    fn visit_accounts(&self, visitor: &mut dyn FnMut(&Rc<dyn Account>) -> bool);
}

/// Reusable [`Bank`] implementation for backends to compose.
///
/// Wraps one [`ObjectStore`] of accounts; a membership change also
/// surfaces as the bank's own `updated`, which is how the change
/// travels further up once the bank is registered in an
/// [`AccountCore`]. Questions from any account chain into the bank's
/// `questions` before the account's `account_added` fires.
pub struct BankImpl {
    live: LiveCell,
    store: ObjectStore<dyn Account>,
}

impl BankImpl {
    pub fn new(name: impl Into<String>) -> Self {
        let live = LiveCell::new(name);
        let store: ObjectStore<dyn Account> = ObjectStore::new();

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

    /// Register an account; idempotent, announces `account_added`.
    pub fn add_account(&self, account: Rc<dyn Account>) {
        self.store.add_object(account);
    }

    /// Deregister an account; silent no-op if absent.
    pub fn remove_account(&self, account: &Rc<dyn Account>) {
        self.store.remove_object(account);
    }

    pub fn remove_all_accounts(&self) {
        self.store.remove_all_objects();
    }

    pub fn find_account(&self, name: &str) -> Option<Rc<dyn Account>> {
        self.store.objects().into_iter().find(|a| a.name() == name)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl LiveObject for BankImpl {
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

impl Bank for BankImpl {
    fn account_added(&self) -> &Signal<Rc<dyn Account>> {
        self.store.object_added()
    }

    fn account_updated(&self) -> &Signal<Rc<dyn Account>> {
        self.store.object_updated()
    }

    fn account_removed(&self) -> &Signal<Rc<dyn Account>> {
        self.store.object_removed()
    }

    fn visit_accounts(&self, visitor: &mut dyn FnMut(&Rc<dyn Account>) -> bool) {
        self.store.visit_objects(|account| visitor(account));
    }
}

impl std::fmt::Debug for BankImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BankImpl")
            .field("name", &self.live.name())
            .field("accounts", &self.store.len())
            .finish()
    }
}

/// Process-wide registry of account banks.
pub struct AccountCore {
    banks: ObjectStore<dyn Bank>,
    account_added: Signal<(Rc<dyn Bank>, Rc<dyn Account>)>,
    account_updated: Signal<(Rc<dyn Bank>, Rc<dyn Account>)>,
    account_removed: Signal<(Rc<dyn Bank>, Rc<dyn Account>)>,
}

impl Default for AccountCore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountCore {
    pub fn new() -> Self {
        Self {
            banks: ObjectStore::new(),
            account_added: Signal::new(),
            account_updated: Signal::new(),
            account_removed: Signal::new(),
        }
    }

    /// Register a bank. The scoped account forwarding is installed
    /// before `bank_added` fires, so an observer reacting to the new
    /// bank cannot cause a missed account event.
    pub fn add_bank(&self, bank: Rc<dyn Bank>) {
        let added = self.account_added.clone();
        let updated = self.account_updated.clone();
        let removed = self.account_removed.clone();
        self.banks.add_object_with(bank, move |bank| {
            debug!(bank = %bank.name(), "bank registered with account core");
            vec![
                forward_scoped(bank, bank.account_added(), added),
                forward_scoped(bank, bank.account_updated(), updated),
                forward_scoped(bank, bank.account_removed(), removed),
            ]
        });
    }

    pub fn remove_bank(&self, bank: &Rc<dyn Bank>) {
        self.banks.remove_object(bank);
    }

    pub fn bank_added(&self) -> &Signal<Rc<dyn Bank>> {
        self.banks.object_added()
    }

    pub fn bank_updated(&self) -> &Signal<Rc<dyn Bank>> {
        self.banks.object_updated()
    }

    pub fn bank_removed(&self) -> &Signal<Rc<dyn Bank>> {
        self.banks.object_removed()
    }

    /// Account events from every registered bank, scoped to the owning
    /// bank.
    pub fn account_added(&self) -> &Signal<(Rc<dyn Bank>, Rc<dyn Account>)> {
        &self.account_added
    }

    pub fn account_updated(&self) -> &Signal<(Rc<dyn Bank>, Rc<dyn Account>)> {
        &self.account_updated
    }

    pub fn account_removed(&self) -> &Signal<(Rc<dyn Bank>, Rc<dyn Account>)> {
        &self.account_removed
    }

    /// Questions raised anywhere below, forwarded unmodified.
    pub fn questions(&self) -> &Signal<Rc<Question>> {
        self.banks.questions()
    }

    pub fn visit_banks(&self, visitor: impl FnMut(&Rc<dyn Bank>) -> bool) {
        self.banks.visit_objects(visitor);
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }
}

impl std::fmt::Debug for AccountCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountCore")
            .field("banks", &self.banks.len())
            .finish()
    }
}

fn forward_scoped(
    bank: &Rc<dyn Bank>,
    signal: &Signal<Rc<dyn Account>>,
    target: Signal<(Rc<dyn Bank>, Rc<dyn Account>)>,
) -> crate::signal::Connection {
    let weak = Rc::downgrade(bank);
    signal.connect_late(move |account| {
        if let Some(bank) = weak.upgrade() {
            target.emit(&(bank, Rc::clone(account)));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{SignalRecorder, StubObject};

    fn account(name: &str) -> Rc<dyn Account> {
        StubObject::new(name)
    }

    #[test]
    fn test_bank_forwards_account_events() {
        let bank = BankImpl::new("sip");
        let added: SignalRecorder<Rc<dyn Account>> = SignalRecorder::new();
        drop(added.record(bank.account_added()));

        let bank_updates: SignalRecorder<()> = SignalRecorder::new();
        drop(bank_updates.record(bank.updated()));

        let alice = account("alice@example.net");
        bank.add_account(alice.clone());

        assert_eq!(added.count(), 1);
        // Membership changes mark the bank itself updated.
        assert_eq!(bank_updates.count(), 1);

        bank.remove_account(&alice);
        assert_eq!(bank_updates.count(), 2);
        assert!(bank.is_empty());
    }

    #[test]
    fn test_find_account_by_name() {
        let bank = BankImpl::new("sip");
        bank.add_account(account("alice@example.net"));
        bank.add_account(account("bob@example.net"));

        assert!(bank.find_account("bob@example.net").is_some());
        assert!(bank.find_account("carol@example.net").is_none());
    }

    #[test]
    fn test_core_scopes_account_events_to_bank() {
        let core = AccountCore::new();
        let scoped: SignalRecorder<(Rc<dyn Bank>, Rc<dyn Account>)> = SignalRecorder::new();
        drop(scoped.record(core.account_added()));

        let bank: Rc<BankImpl> = Rc::new(BankImpl::new("sip"));
        core.add_bank(bank.clone());
        bank.add_account(account("alice@example.net"));

        assert_eq!(scoped.count(), 1);
        let (owner, added) = scoped.events().remove(0);
        assert_eq!(owner.name(), "sip");
        assert_eq!(added.name(), "alice@example.net");
    }

    #[test]
    fn test_forwarding_installed_before_bank_added_fires() {
        // An observer that populates the bank from inside bank_added
        // must not cause a missed scoped account event.
        let core = Rc::new(AccountCore::new());
        let scoped: SignalRecorder<(Rc<dyn Bank>, Rc<dyn Account>)> = SignalRecorder::new();
        drop(scoped.record(core.account_added()));

        let bank: Rc<BankImpl> = Rc::new(BankImpl::new("h323"));
        let to_add = bank.clone();
        drop(core.bank_added().connect(move |_| {
            to_add.add_account(StubObject::new("eager@example.net"));
        }));

        core.add_bank(bank);
        assert_eq!(scoped.count(), 1);
    }

    #[test]
    fn test_questions_reach_the_core() {
        let core = AccountCore::new();
        let questions: SignalRecorder<Rc<Question>> = SignalRecorder::new();
        drop(questions.record(core.questions()));

        let bank: Rc<BankImpl> = Rc::new(BankImpl::new("sip"));
        core.add_bank(bank.clone());

        let alice = StubObject::new("alice@example.net");
        bank.add_account(alice.clone());
        alice.raise(Question::new("auth", "password for alice?", |_| {}));

        assert_eq!(questions.count(), 1);
        assert_eq!(questions.events()[0].prompt(), "password for alice?");
    }

    #[test]
    fn test_removing_bank_stops_scoped_forwarding() {
        let core = AccountCore::new();
        let scoped: SignalRecorder<(Rc<dyn Bank>, Rc<dyn Account>)> = SignalRecorder::new();
        drop(scoped.record(core.account_added()));

        let concrete = Rc::new(BankImpl::new("sip"));
        let bank: Rc<dyn Bank> = concrete.clone();
        core.add_bank(bank.clone());
        core.remove_bank(&bank);

        // Adding to the deregistered bank must not reach the core.
        concrete.add_account(account("late@example.net"));

        assert_eq!(scoped.count(), 0);
    }
}
