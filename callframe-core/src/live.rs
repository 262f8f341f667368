//! Lifecycle surface of domain objects
//!
//! Everything a collection can hold (accounts, contacts, books, heaps,
//! and the collections themselves when nested) exposes the same three
//! notification points: `removed`, `updated` and `questions`. The
//! [`LiveObject`] trait is that surface; [`LiveCell`] is the embeddable
//! implementation concrete object types compose.

use std::cell::RefCell;
use std::rc::Rc;

use crate::signal::Signal;

/// An interactive prompt raised by a backend (credential request,
/// confirmation) and forwarded unmodified up the collection hierarchy
/// to whatever presenter consumes it.
///
/// The responder is one-shot: the first `answer` or `cancel` consumes
/// it; later calls report `false` and do nothing.
pub struct Question {
    title: String,
    prompt: String,
    responder: RefCell<Option<Box<dyn FnOnce(Option<String>)>>>,
}

impl Question {
    /// Create a question. `on_reply` receives `Some(text)` on answer,
    /// `None` on cancel.
    pub fn new(
        title: impl Into<String>,
        prompt: impl Into<String>,
        on_reply: impl FnOnce(Option<String>) + 'static,
    ) -> Rc<Self> {
        Rc::new(Self {
            title: title.into(),
            prompt: prompt.into(),
            responder: RefCell::new(Some(Box::new(on_reply))),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Resolve the question with the user's reply.
    pub fn answer(&self, reply: impl Into<String>) -> bool {
        self.settle(Some(reply.into()))
    }

    /// Dismiss the question without a reply.
    pub fn cancel(&self) -> bool {
        self.settle(None)
    }

    /// Whether the question has been answered or cancelled.
    pub fn is_settled(&self) -> bool {
        self.responder.borrow().is_none()
    }

    fn settle(&self, reply: Option<String>) -> bool {
        let responder = self.responder.borrow_mut().take();
        match responder {
            Some(responder) => {
                responder(reply);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Question")
            .field("title", &self.title)
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// Lifecycle notifications every registrable domain object exposes.
///
/// Objects are shared (`Rc`) between the backend that created them and
/// the collection that holds them; identity is pointer identity, not
/// value equality.
pub trait LiveObject: 'static {
    /// Stable human-readable identifier, used for logging.
    fn name(&self) -> &str;

    /// Emitted by the object itself when it ceases to exist; the owning
    /// collection reacts by deregistering it.
    fn removed(&self) -> &Signal<()>;

    /// Emitted when any attribute of the object changed.
    fn updated(&self) -> &Signal<()>;

    /// Interactive prompts raised on behalf of this object.
    fn questions(&self) -> &Signal<Rc<Question>>;
}

/// Embeddable [`LiveObject`] state: the three signals plus the name.
///
/// Concrete object types hold a `LiveCell` and delegate the trait to
/// it; the emit helpers are what backends call to announce lifecycle
/// transitions.
#[derive(Debug)]
pub struct LiveCell {
    name: String,
    removed: Signal<()>,
    updated: Signal<()>,
    questions: Signal<Rc<Question>>,
}

impl LiveCell {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            removed: Signal::new(),
            updated: Signal::new(),
            questions: Signal::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn removed(&self) -> &Signal<()> {
        &self.removed
    }

    pub fn updated(&self) -> &Signal<()> {
        &self.updated
    }

    pub fn questions(&self) -> &Signal<Rc<Question>> {
        &self.questions
    }

    /// Announce that the object ceased to exist.
    pub fn emit_removed(&self) {
        self.removed.emit(&());
    }

    /// Announce that the object changed.
    pub fn emit_updated(&self) {
        self.updated.emit(&());
    }

    /// Raise an interactive prompt on behalf of the object.
    pub fn ask(&self, question: Rc<Question>) {
        self.questions.emit(&question);
    }
}
