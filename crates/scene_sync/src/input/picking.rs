//! Picking invalidation
//!
//! A picker keeps acceleration data derived from the graph. It does not need
//! to know why the graph changed, only that it must rebuild before the next
//! pick. [`PickingNotifier`] bridges structural events to that flag.

use std::cell::RefCell;
use std::rc::Rc;

use log::trace;

use crate::events::{Event, EventHandler};
use crate::scene::NodeKey;

/// Anything holding data derived from the graph structure
pub trait PickingTarget {
    /// The graph changed structurally; `node` is the trigger when known
    fn needs_update(&mut self, node: Option<NodeKey>);
}

/// Dirty tracking for a picker
#[derive(Debug, Clone, Default)]
pub struct PickingState {
    dirty: bool,
    invalidations: u64,
    last_trigger: Option<NodeKey>,
}

impl PickingState {
    /// Create a clean state
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a rebuild is pending
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Invalidations seen since creation
    pub fn invalidations(&self) -> u64 {
        self.invalidations
    }

    /// Node that caused the most recent invalidation
    pub fn last_trigger(&self) -> Option<NodeKey> {
        self.last_trigger
    }

    /// Mark the rebuild as done; returns whether one was pending
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl PickingTarget for PickingState {
    fn needs_update(&mut self, node: Option<NodeKey>) {
        self.dirty = true;
        self.invalidations += 1;
        if node.is_some() {
            self.last_trigger = node;
        }
    }
}

/// Event handler forwarding graph changes to a shared picking target
pub struct PickingNotifier<T: PickingTarget> {
    target: Rc<RefCell<T>>,
}

impl<T: PickingTarget> PickingNotifier<T> {
    /// Wrap a shared target
    pub fn new(target: Rc<RefCell<T>>) -> Self {
        Self { target }
    }
}

impl<T: PickingTarget> EventHandler for PickingNotifier<T> {
    fn on_event(&mut self, event: &Event) -> bool {
        trace!("Picking invalidated by {:?}", event.event_type);
        self.target.borrow_mut().needs_update(event.get_node());
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventSystem, EventType};
    use crate::scene::{Node, SceneGraph};

    #[test]
    fn test_notifier_marks_state_dirty() {
        let mut graph = SceneGraph::new();
        let node = graph.insert(Node::group("n1"));
        let state = Rc::new(RefCell::new(PickingState::new()));
        let mut events = EventSystem::new();
        events.register_handler(
            EventType::StructureChanged,
            Box::new(PickingNotifier::new(Rc::clone(&state))),
        );

        events.send(Event::structure_changed(node));
        events.send(Event::structure_changed(node));
        assert!(!state.borrow().is_dirty());
        events.dispatch();

        let mut state = state.borrow_mut();
        assert_eq!(state.invalidations(), 2);
        assert_eq!(state.last_trigger(), Some(node));
        assert!(state.take_dirty());
        assert!(!state.is_dirty());
    }

    #[test]
    fn test_notifier_does_not_consume() {
        let first = Rc::new(RefCell::new(PickingState::new()));
        let second = Rc::new(RefCell::new(PickingState::new()));
        let mut events = EventSystem::new();
        events.register_handler(EventType::SceneUnloaded, Box::new(PickingNotifier::new(Rc::clone(&first))));
        events.register_handler(EventType::SceneUnloaded, Box::new(PickingNotifier::new(Rc::clone(&second))));

        events.send(Event::new(EventType::SceneUnloaded));
        events.dispatch();

        assert!(first.borrow().is_dirty());
        assert!(second.borrow().is_dirty());
        assert_eq!(second.borrow().last_trigger(), None);
    }
}
