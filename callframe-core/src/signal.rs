//! Synchronous multicast signals
//!
//! A [`Signal`] is the engine's notification point: any number of slots
//! can be connected, and [`Signal::emit`] runs them synchronously on the
//! emitting thread, in connection order. There is no queue and no
//! marshalling; everything in the engine core happens inside the
//! notification call that triggered it.
//!
//! Re-entrancy rules:
//! - a slot may disconnect itself or any other slot during an emission;
//!   a slot disconnected mid-emission does not run for that emission if
//!   it has not run yet
//! - slots connected during an emission do not run for that emission
//!
//! # Example
//!
//! ```ignore
//! let signal: Signal<String> = Signal::new();
//! let conn = signal.connect(|name: &String| println!("hello {name}"));
//! signal.emit(&"world".to_string());
//! conn.disconnect();
//! ```

use std::cell::RefCell;
use std::rc::Rc;

type Slot<T> = Rc<dyn Fn(&T)>;

struct SlotEntry<T> {
    id: u64,
    late: bool,
    callback: Slot<T>,
}

struct Slots<T> {
    entries: Vec<SlotEntry<T>>,
    next_id: u64,
}

/// A synchronous, single-threaded multicast notification point.
///
/// Cloning a `Signal` is cheap and yields a handle to the same slot
/// list, so a signal can be captured by forwarding closures while its
/// owner keeps emitting through the original handle.
pub struct Signal<T> {
    slots: Rc<RefCell<Slots<T>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            slots: Rc::clone(&self.slots),
        }
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("slots", &self.slots.borrow().entries.len())
            .finish()
    }
}

impl<T> Signal<T> {
    /// Create a signal with no connected slots.
    pub fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(Slots {
                entries: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Number of currently connected slots.
    pub fn slot_count(&self) -> usize {
        self.slots.borrow().entries.len()
    }
}

impl<T: 'static> Signal<T> {
    /// Connect a slot; it runs on every subsequent emission.
    ///
    /// Dropping the returned [`Connection`] without calling
    /// `disconnect` leaves the slot connected for the lifetime of the
    /// signal. Permanent forwarding links are made by discarding the
    /// handle; revocable subscriptions are stored in a
    /// [`ConnectionSet`](crate::connections::ConnectionSet).
    pub fn connect(&self, slot: impl Fn(&T) + 'static) -> Connection {
        self.connect_at(slot, false)
    }

    /// Connect a slot that runs after every normally connected slot.
    ///
    /// Hierarchical forwarding uses this so that observers at one level
    /// are notified before the event is re-emitted at the level above.
    pub fn connect_late(&self, slot: impl Fn(&T) + 'static) -> Connection {
        self.connect_at(slot, true)
    }

    fn connect_at(&self, slot: impl Fn(&T) + 'static, late: bool) -> Connection {
        let id = {
            let mut slots = self.slots.borrow_mut();
            let id = slots.next_id;
            slots.next_id += 1;
            slots.entries.push(SlotEntry {
                id,
                late,
                callback: Rc::new(slot),
            });
            id
        };
        let slots = Rc::downgrade(&self.slots);
        Connection::from_fn(move || {
            if let Some(slots) = slots.upgrade() {
                slots.borrow_mut().entries.retain(|entry| entry.id != id);
            }
        })
    }

    /// Run every connected slot with `arg`, normal slots first, then
    /// late ones, each group in connection order.
    pub fn emit(&self, arg: &T) {
        let order: Vec<u64> = {
            let slots = self.slots.borrow();
            let normal = slots.entries.iter().filter(|e| !e.late).map(|e| e.id);
            let late = slots.entries.iter().filter(|e| e.late).map(|e| e.id);
            normal.chain(late).collect()
        };
        for id in order {
            // Re-check liveness before each call: a previous slot may
            // have disconnected this one.
            let callback = {
                let slots = self.slots.borrow();
                slots
                    .entries
                    .iter()
                    .find(|entry| entry.id == id)
                    .map(|entry| Rc::clone(&entry.callback))
            };
            if let Some(callback) = callback {
                callback(arg);
            }
        }
    }
}

/// Handle to a single slot connection.
///
/// `disconnect` is idempotent; dropping the handle does *not*
/// disconnect the slot.
pub struct Connection {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Connection {
    fn from_fn(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Remove the slot from its signal. Safe to call more than once;
    /// only the first call has an effect.
    pub fn disconnect(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }

    /// Whether this handle can still sever its slot.
    pub fn is_live(&self) -> bool {
        self.detach.is_some()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("live", &self.is_live())
            .finish()
    }
}
