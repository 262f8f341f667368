//! Action registries
//!
//! An [`Actor`] is the ordered, name-unique set of
//! [`Action`](crate::action::Action)s a domain object exposes. Menus
//! and button bars subscribe to the actor's structural signals
//! (`action_added` / `action_removed`) and state signals
//! (`action_enabled` / `action_disabled`, derived from the member
//! actions' own notifications) to stay synchronized without polling.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::action::Action;
use crate::connections::ConnectionSet;
use crate::signal::Signal;

struct ActionEntry {
    action: Rc<Action>,
    connections: ConnectionSet,
}

/// Ordered collection of actions, unique by name.
///
/// Registration is last-wins: adding an action whose name collides
/// removes the previous holder first, announcing its removal before the
/// newcomer's `action_added`.
#[derive(Default)]
pub struct Actor {
    actions: RefCell<Vec<ActionEntry>>,
    action_added: Signal<String>,
    action_removed: Signal<String>,
    action_enabled: Signal<String>,
    action_disabled: Signal<String>,
}

impl Actor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action_added(&self) -> &Signal<String> {
        &self.action_added
    }

    pub fn action_removed(&self) -> &Signal<String> {
        &self.action_removed
    }

    pub fn action_enabled(&self) -> &Signal<String> {
        &self.action_enabled
    }

    pub fn action_disabled(&self) -> &Signal<String> {
        &self.action_disabled
    }

    /// Register `action`, evicting any same-named predecessor first.
    pub fn add_action(&self, action: Rc<Action>) {
        self.remove_action(action.name());

        let name = action.name().to_string();
        let mut connections = ConnectionSet::new();
        {
            let signal = self.action_enabled.clone();
            let n = name.clone();
            connections.add(action.enabled().connect(move |_| signal.emit(&n)));
        }
        {
            let signal = self.action_disabled.clone();
            let n = name.clone();
            connections.add(action.disabled().connect(move |_| signal.emit(&n)));
        }
        self.actions
            .borrow_mut()
            .push(ActionEntry { action, connections });

        debug!(action = %name, "action registered");
        self.action_added.emit(&name);
    }

    /// Deregister the action called `name`. Returns whether one was
    /// found; the removal notification precedes the teardown of the
    /// enabled/disabled forwarding.
    pub fn remove_action(&self, name: &str) -> bool {
        let entry = {
            let mut actions = self.actions.borrow_mut();
            match actions.iter().position(|e| e.action.name() == name) {
                Some(index) => actions.remove(index),
                None => return false,
            }
        };
        self.action_removed.emit(&name.to_string());
        drop(entry);
        true
    }

    /// Enable the action called `name`; `false` if absent.
    pub fn enable_action(&self, name: &str) -> bool {
        match self.get_action(name) {
            Some(action) => {
                action.enable();
                true
            }
            None => false,
        }
    }

    /// Disable the action called `name`; `false` if absent.
    pub fn disable_action(&self, name: &str) -> bool {
        match self.get_action(name) {
            Some(action) => {
                action.disable();
                true
            }
            None => false,
        }
    }

    /// Announce the removal of every action, then clear the collection.
    /// Observers see all `action_removed` notifications before any
    /// action disappears.
    pub fn remove_actions(&self) {
        let names: Vec<String> = self
            .actions
            .borrow()
            .iter()
            .map(|e| e.action.name().to_string())
            .collect();
        for name in &names {
            self.action_removed.emit(name);
        }
        self.actions.borrow_mut().clear();
    }

    /// Look up an action by name.
    pub fn get_action(&self, name: &str) -> Option<Rc<Action>> {
        self.actions
            .borrow()
            .iter()
            .find(|e| e.action.name() == name)
            .map(|e| Rc::clone(&e.action))
    }

    /// Call `visitor` for each action in registration order, stopping
    /// when it returns `false`. This is the traversal menu builders
    /// use.
    pub fn visit_actions(&self, mut visitor: impl FnMut(&Rc<Action>) -> bool) {
        let actions: Vec<Rc<Action>> = self
            .actions
            .borrow()
            .iter()
            .map(|e| Rc::clone(&e.action))
            .collect();
        for action in &actions {
            if !visitor(action) {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.actions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.borrow().is_empty()
    }
}

impl std::fmt::Debug for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actor")
            .field("actions", &self.actions.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SignalRecorder;

    #[test]
    fn test_name_collision_is_last_wins() {
        let actor = Actor::new();
        let added: SignalRecorder<String> = SignalRecorder::new();
        let removed: SignalRecorder<String> = SignalRecorder::new();
        drop(added.record(actor.action_added()));
        drop(removed.record(actor.action_removed()));

        let first = Action::unbound("dial", "old");
        let second = Action::unbound("dial", "new");
        actor.add_action(first);
        actor.add_action(second.clone());

        assert_eq!(actor.len(), 1);
        assert_eq!(
            actor.get_action("dial").unwrap().description(),
            "new"
        );
        // Eviction of the first is announced before the second arrives.
        assert_eq!(added.events(), vec!["dial".to_string(), "dial".to_string()]);
        assert_eq!(removed.events(), vec!["dial".to_string()]);
    }

    #[test]
    fn test_enabled_state_forwarded_by_name() {
        let actor = Actor::new();
        let enabled: SignalRecorder<String> = SignalRecorder::new();
        let disabled: SignalRecorder<String> = SignalRecorder::new();
        drop(enabled.record(actor.action_enabled()));
        drop(disabled.record(actor.action_disabled()));

        let action = Action::unbound("hold", "Put the call on hold");
        actor.add_action(action.clone());

        action.disable();
        action.enable();

        assert_eq!(disabled.events(), vec!["hold".to_string()]);
        assert_eq!(enabled.events(), vec!["hold".to_string()]);
    }

    #[test]
    fn test_lookup_helpers_report_absence() {
        let actor = Actor::new();
        assert!(!actor.remove_action("missing"));
        assert!(!actor.enable_action("missing"));
        assert!(!actor.disable_action("missing"));
        assert!(actor.get_action("missing").is_none());
    }

    #[test]
    fn test_enable_disable_by_name() {
        let actor = Actor::new();
        let action = Action::unbound("transfer", "Transfer the call");
        actor.add_action(action.clone());

        assert!(actor.disable_action("transfer"));
        assert!(!action.is_enabled());
        assert!(actor.enable_action("transfer"));
        assert!(action.is_enabled());
    }

    #[test]
    fn test_remove_actions_notifies_then_clears() {
        let actor = Rc::new(Actor::new());
        actor.add_action(Action::unbound("dial", ""));
        actor.add_action(Action::unbound("hold", ""));

        // Every removal is announced while the actions are still held.
        let sizes_at_notify = Rc::new(RefCell::new(Vec::new()));
        let names = Rc::new(RefCell::new(Vec::new()));
        let s = sizes_at_notify.clone();
        let n = names.clone();
        let a = Rc::clone(&actor);
        drop(actor.action_removed().connect(move |name: &String| {
            n.borrow_mut().push(name.clone());
            s.borrow_mut().push(a.len());
        }));

        actor.remove_actions();

        assert_eq!(*names.borrow(), vec!["dial".to_string(), "hold".to_string()]);
        assert_eq!(*sizes_at_notify.borrow(), vec![2, 2]);
        assert!(actor.is_empty());
    }

    #[test]
    fn test_evicted_action_stops_forwarding() {
        let actor = Actor::new();
        let enabled: SignalRecorder<String> = SignalRecorder::new();
        drop(enabled.record(actor.action_enabled()));

        let first = Action::unbound("dial", "old");
        actor.add_action(first.clone());
        actor.add_action(Action::unbound("dial", "new"));

        first.disable();
        first.enable();
        assert_eq!(enabled.count(), 0);
    }

    #[test]
    fn test_visit_actions_in_order() {
        let actor = Actor::new();
        for name in ["dial", "hold", "transfer"] {
            actor.add_action(Action::unbound(name, ""));
        }
        let mut seen = Vec::new();
        actor.visit_actions(|action| {
            seen.push(action.name().to_string());
            true
        });
        assert_eq!(seen, vec!["dial", "hold", "transfer"]);
    }
}
