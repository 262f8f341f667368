//! Address books
//!
//! Address-book connectors (LDAP, local roster, ...) expose their
//! entries as [`Contact`]s grouped in [`Book`]s, which in turn live in
//! a [`Source`]. The process-wide [`ContactCore`] aggregates every
//! source and re-publishes book-level events scoped to the owning
//! source.

use std::rc::Rc;

use tracing::debug;

use crate::actor::Actor;
use crate::data_action::DataAction;
use crate::live::{LiveCell, LiveObject, Question};
use crate::signal::{Connection, Signal};
use crate::store::ObjectStore;

/// An address-book entry.
pub trait Contact: LiveObject {
    /// The runtime actions this contact offers (call, message, edit,
    /// ...).
    fn actor(&self) -> &Actor;
}

/// A data action bound to an optional contact plus a free-form detail
/// string (typically the selected URI). Disabled whenever no contact is
/// bound.
pub type ContactAction = DataAction<Option<Rc<dyn Contact>>>;

/// A collection of contacts.
pub trait Book: LiveObject {
    fn contact_added(&self) -> &Signal<Rc<dyn Contact>>;
    fn contact_updated(&self) -> &Signal<Rc<dyn Contact>>;
    fn contact_removed(&self) -> &Signal<Rc<dyn Contact>>;
    fn visit_contacts(&self, visitor: &mut dyn FnMut(&Rc<dyn Contact>) -> bool);
}

/// A collection of books owned by one connector.
pub trait Source: LiveObject {
    fn book_added(&self) -> &Signal<Rc<dyn Book>>;
    fn book_updated(&self) -> &Signal<Rc<dyn Book>>;
    fn book_removed(&self) -> &Signal<Rc<dyn Book>>;
    fn visit_books(&self, visitor: &mut dyn FnMut(&Rc<dyn Book>) -> bool);
}

/// Reusable [`Book`] implementation for connectors to compose.
///
/// A contact appearing or disappearing inside the book surfaces as the
/// book's own `updated`, which the owning source's store then forwards
/// as `book_updated`.
pub struct BookImpl {
    live: LiveCell,
    store: ObjectStore<dyn Contact>,
}

impl BookImpl {
    pub fn new(name: impl Into<String>) -> Self {
        let live = LiveCell::new(name);
        let store: ObjectStore<dyn Contact> = ObjectStore::new();

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

    pub fn add_contact(&self, contact: Rc<dyn Contact>) {
        self.store.add_object(contact);
    }

    pub fn remove_contact(&self, contact: &Rc<dyn Contact>) {
        self.store.remove_object(contact);
    }

    pub fn remove_all_contacts(&self) {
        self.store.remove_all_objects();
    }

    pub fn find_contact(&self, name: &str) -> Option<Rc<dyn Contact>> {
        self.store.objects().into_iter().find(|c| c.name() == name)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl LiveObject for BookImpl {
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

impl Book for BookImpl {
    fn contact_added(&self) -> &Signal<Rc<dyn Contact>> {
        self.store.object_added()
    }

    fn contact_updated(&self) -> &Signal<Rc<dyn Contact>> {
        self.store.object_updated()
    }

    fn contact_removed(&self) -> &Signal<Rc<dyn Contact>> {
        self.store.object_removed()
    }

    fn visit_contacts(&self, visitor: &mut dyn FnMut(&Rc<dyn Contact>) -> bool) {
        self.store.visit_objects(|contact| visitor(contact));
    }
}

impl std::fmt::Debug for BookImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookImpl")
            .field("name", &self.live.name())
            .field("contacts", &self.store.len())
            .finish()
    }
}

/// Reusable [`Source`] implementation for connectors to compose.
pub struct SourceImpl {
    live: LiveCell,
    store: ObjectStore<dyn Book>,
}

impl SourceImpl {
    pub fn new(name: impl Into<String>) -> Self {
        let live = LiveCell::new(name);
        let store: ObjectStore<dyn Book> = ObjectStore::new();

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

    pub fn add_book(&self, book: Rc<dyn Book>) {
        self.store.add_object(book);
    }

    pub fn remove_book(&self, book: &Rc<dyn Book>) {
        self.store.remove_object(book);
    }

    pub fn remove_all_books(&self) {
        self.store.remove_all_objects();
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl LiveObject for SourceImpl {
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

impl Source for SourceImpl {
    fn book_added(&self) -> &Signal<Rc<dyn Book>> {
        self.store.object_added()
    }

    fn book_updated(&self) -> &Signal<Rc<dyn Book>> {
        self.store.object_updated()
    }

    fn book_removed(&self) -> &Signal<Rc<dyn Book>> {
        self.store.object_removed()
    }

    fn visit_books(&self, visitor: &mut dyn FnMut(&Rc<dyn Book>) -> bool) {
        self.store.visit_objects(|book| visitor(book));
    }
}

impl std::fmt::Debug for SourceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImpl")
            .field("name", &self.live.name())
            .field("books", &self.store.len())
            .finish()
    }
}

/// Process-wide registry of address-book sources.
pub struct ContactCore {
    sources: ObjectStore<dyn Source>,
    book_added: Signal<(Rc<dyn Source>, Rc<dyn Book>)>,
    book_updated: Signal<(Rc<dyn Source>, Rc<dyn Book>)>,
    book_removed: Signal<(Rc<dyn Source>, Rc<dyn Book>)>,
}

impl Default for ContactCore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactCore {
    pub fn new() -> Self {
        Self {
            sources: ObjectStore::new(),
            book_added: Signal::new(),
            book_updated: Signal::new(),
            book_removed: Signal::new(),
        }
    }

    /// Register a source; scoped book forwarding is installed before
    /// `source_added` fires.
    pub fn add_source(&self, source: Rc<dyn Source>) {
        let added = self.book_added.clone();
        let updated = self.book_updated.clone();
        let removed = self.book_removed.clone();
        self.sources.add_object_with(source, move |source| {
            debug!(source = %source.name(), "source registered with contact core");
            vec![
                forward_scoped(source, source.book_added(), added),
                forward_scoped(source, source.book_updated(), updated),
                forward_scoped(source, source.book_removed(), removed),
            ]
        });
    }

    pub fn remove_source(&self, source: &Rc<dyn Source>) {
        self.sources.remove_object(source);
    }

    pub fn source_added(&self) -> &Signal<Rc<dyn Source>> {
        self.sources.object_added()
    }

    pub fn source_updated(&self) -> &Signal<Rc<dyn Source>> {
        self.sources.object_updated()
    }

    pub fn source_removed(&self) -> &Signal<Rc<dyn Source>> {
        self.sources.object_removed()
    }

    /// Book events from every registered source, scoped to the owning
    /// source.
    pub fn book_added(&self) -> &Signal<(Rc<dyn Source>, Rc<dyn Book>)> {
        &self.book_added
    }

    pub fn book_updated(&self) -> &Signal<(Rc<dyn Source>, Rc<dyn Book>)> {
        &self.book_updated
    }

    pub fn book_removed(&self) -> &Signal<(Rc<dyn Source>, Rc<dyn Book>)> {
        &self.book_removed
    }

    pub fn questions(&self) -> &Signal<Rc<Question>> {
        self.sources.questions()
    }

    pub fn visit_sources(&self, visitor: impl FnMut(&Rc<dyn Source>) -> bool) {
        self.sources.visit_objects(visitor);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl std::fmt::Debug for ContactCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactCore")
            .field("sources", &self.sources.len())
            .finish()
    }
}

fn forward_scoped(
    source: &Rc<dyn Source>,
    signal: &Signal<Rc<dyn Book>>,
    target: Signal<(Rc<dyn Source>, Rc<dyn Book>)>,
) -> Connection {
    let weak = Rc::downgrade(source);
    signal.connect_late(move |book| {
        if let Some(source) = weak.upgrade() {
            target.emit(&(source, Rc::clone(book)));
        }
    })
}
