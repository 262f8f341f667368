//! Scoped ownership of signal connections
//!
//! A [`ConnectionSet`] models unique ownership of a bundle of
//! subscriptions: the set is the single point of teardown for every
//! connection it holds. Collections key one set per registered object
//! so the whole object-in-collection relationship can be severed in one
//! place, exactly once.

use crate::signal::Connection;

/// Owns a set of connections and disconnects all of them on [`clear`]
/// or on drop.
///
/// Not `Clone`: two owners of the same subscriptions would break the
/// single-point-of-teardown rule.
///
/// [`clear`]: ConnectionSet::clear
#[derive(Default)]
pub struct ConnectionSet {
    connections: Vec<Connection>,
}

impl ConnectionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a connection handle; it is disconnected when the set is
    /// cleared or dropped.
    pub fn add(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    /// Disconnect and discard all stored handles. Safe to call
    /// repeatedly; `Connection::disconnect` is itself idempotent.
    pub fn clear(&mut self) {
        for mut connection in self.connections.drain(..) {
            connection.disconnect();
        }
    }

    /// Number of stored handles.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the set holds no handles.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Drop for ConnectionSet {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for ConnectionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSet")
            .field("connections", &self.connections.len())
            .finish()
    }
}
