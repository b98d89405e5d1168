//! Scene event system
//!
//! Key principles:
//! - Key-value arguments (no order dependency)
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Registration system (only notify interested handlers)
//! - Events queue up during a mutation and are dispatched once it completes

use std::collections::HashMap;

use crate::scene::NodeKey;

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Nodes were added, removed or spliced somewhere in the graph
    StructureChanged,
    /// A node or attachment was deleted by id
    NodeDeleted,
    /// A full scene replaced the previous graph
    SceneLoaded,
    /// The graph and all caches were dropped
    SceneUnloaded,
}

/// Variant for type-safe event arguments
#[derive(Debug, Clone, PartialEq)]
pub enum EventArg {
    /// Node that triggered the event
    Node(NodeKey),
    /// External id involved in the event
    Id(String),
    /// Number of nodes affected
    Count(usize),
}

/// Event with type ID and key-value arguments
#[derive(Debug, Clone)]
pub struct Event {
    /// Type of event
    pub event_type: EventType,
    /// Monotonic sequence number assigned when the event is queued
    pub sequence: u64,
    args: HashMap<&'static str, EventArg>,
}

impl Event {
    /// Create a new event with the given type
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            sequence: 0,
            args: HashMap::new(),
        }
    }

    /// Structural change triggered by `node`
    pub fn structure_changed(node: NodeKey) -> Self {
        Self::new(EventType::StructureChanged).with_arg("node", EventArg::Node(node))
    }

    /// Add an argument to the event (builder pattern)
    pub fn with_arg(mut self, key: &'static str, value: EventArg) -> Self {
        self.args.insert(key, value);
        self
    }

    /// Get an argument by key
    pub fn get_arg(&self, key: &str) -> Option<&EventArg> {
        self.args.get(key)
    }

    /// Get the triggering node if present
    pub fn get_node(&self) -> Option<NodeKey> {
        if let Some(EventArg::Node(node)) = self.get_arg("node") {
            Some(*node)
        } else {
            None
        }
    }

    /// Get the external id if present
    pub fn get_id(&self) -> Option<&str> {
        if let Some(EventArg::Id(id)) = self.get_arg("id") {
            Some(id)
        } else {
            None
        }
    }

    /// Get the affected node count if present
    pub fn get_count(&self) -> Option<usize> {
        if let Some(EventArg::Count(count)) = self.get_arg("count") {
            Some(*count)
        } else {
            None
        }
    }
}

/// Event handler trait
/// Returns true if event was consumed (stops forwarding)
/// Returns false to allow forwarding to other handlers
pub trait EventHandler {
    /// Handle an event, return true if consumed
    fn on_event(&mut self, event: &Event) -> bool;
}

/// Event system with registration and queuing
/// Follows chain of responsibility pattern
pub struct EventSystem {
    queue: Vec<Event>,
    handlers: HashMap<EventType, Vec<Box<dyn EventHandler>>>,
    next_sequence: u64,
}

impl EventSystem {
    /// Create a new empty event system
    pub fn new() -> Self {
        Self {
            queue: Vec::new(),
            handlers: HashMap::new(),
            next_sequence: 0,
        }
    }

    /// Register a handler for a specific event type
    /// Only handlers registered for this type will be notified
    pub fn register_handler(&mut self, event_type: EventType, handler: Box<dyn EventHandler>) {
        self.handlers
            .entry(event_type)
            .or_default()
            .push(handler);
    }

    /// Queue an event for the next dispatch
    pub fn send(&mut self, mut event: Event) {
        event.sequence = self.next_sequence;
        self.next_sequence += 1;
        self.queue.push(event);
    }

    /// Number of events waiting for dispatch
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Dispatch all pending events in the order they were sent
    pub fn dispatch(&mut self) {
        let pending = std::mem::take(&mut self.queue);
        for event in pending {
            self.dispatch_event(&event);
        }
    }

    /// Dispatch single event to registered handlers
    /// Stops on first handler that returns true (consumed)
    fn dispatch_event(&mut self, event: &Event) {
        if let Some(handlers) = self.handlers.get_mut(&event.event_type) {
            for handler in handlers.iter_mut() {
                if handler.on_event(event) {
                    break;
                }
            }
        }
    }

    /// Drop queued events without dispatching them
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSystem")
            .field("queued", &self.queue.len())
            .field("handler_types", &self.handlers.len())
            .field("next_sequence", &self.next_sequence)
            .finish()
    }
}
