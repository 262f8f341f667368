//! Registry introspection snapshots
//!
//! Serializable point-in-time views of actors and collections, for
//! diagnostics panes and structured logging. Snapshots are plain data:
//! taking one never mutates the registry and holds no references into
//! it.

use serde::Serialize;

use crate::action::Action;
use crate::actor::Actor;
use crate::live::LiveObject;
use crate::store::ObjectStore;

/// View of a single action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionSnapshot {
    pub name: String,
    pub description: String,
    pub enabled: bool,
}

impl ActionSnapshot {
    pub fn of(action: &Action) -> Self {
        Self {
            name: action.name().to_string(),
            description: action.description().to_string(),
            enabled: action.is_enabled(),
        }
    }
}

/// View of an actor's actions, in registration order.
#[derive(Debug, Clone, Serialize)]
pub struct ActorSnapshot {
    pub actions: Vec<ActionSnapshot>,
}

impl ActorSnapshot {
    pub fn of(actor: &Actor) -> Self {
        let mut actions = Vec::new();
        actor.visit_actions(|action| {
            actions.push(ActionSnapshot::of(action));
            true
        });
        Self { actions }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// View of a collection's members, in registration order.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSnapshot {
    pub objects: Vec<String>,
}

impl StoreSnapshot {
    pub fn of<T: LiveObject + ?Sized>(store: &ObjectStore<T>) -> Self {
        let mut objects = Vec::new();
        store.visit_objects(|object| {
            objects.push(object.name().to_string());
            true
        });
        Self { objects }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
