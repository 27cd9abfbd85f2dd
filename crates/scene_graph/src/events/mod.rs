//! Hierarchy event dispatch
//!
//! Handlers are registered per [`EventType`] and invoked synchronously.
//! Dispatch takes a snapshot of the matching handlers before calling any of
//! them, so a handler may unregister itself (or others) mid-dispatch without
//! disturbing the current delivery.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::foundation::collections::NodeKey;

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A node was attached to a parent (target = child)
    Added,
    /// A node was detached from its parent (target = child)
    Removed,
    /// A parent gained a child (target = parent)
    ChildAdded,
    /// A parent lost a child (target = parent)
    ChildRemoved,
}

/// Hierarchy change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphEvent {
    /// Type of event
    pub event_type: EventType,
    /// Node the event is about
    pub target: NodeKey,
    /// The other side of the parent/child relation
    pub related: NodeKey,
}

impl GraphEvent {
    /// Create a new event
    pub fn new(event_type: EventType, target: NodeKey, related: NodeKey) -> Self {
        Self {
            event_type,
            target,
            related,
        }
    }
}

/// Identifier returned by [`EventSystem::register_handler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Rc<RefCell<dyn FnMut(&GraphEvent)>>;

struct Registration {
    id: HandlerId,
    event_type: EventType,
    handler: Handler,
}

/// Event system with registration and synchronous dispatch
#[derive(Default)]
pub struct EventSystem {
    handlers: RefCell<Vec<Registration>>,
    next_id: Cell<u64>,
}

impl EventSystem {
    /// Create a new empty event system
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a specific event type
    pub fn register_handler<F>(&self, event_type: EventType, handler: F) -> HandlerId
    where
        F: FnMut(&GraphEvent) + 'static,
    {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers.borrow_mut().push(Registration {
            id,
            event_type,
            handler: Rc::new(RefCell::new(handler)),
        });
        id
    }

    /// Remove a handler; returns false if it was not registered
    pub fn unregister_handler(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|registration| registration.id != id);
        handlers.len() != before
    }

    /// Check whether a handler is still registered
    pub fn has_handler(&self, id: HandlerId) -> bool {
        self.handlers.borrow().iter().any(|registration| registration.id == id)
    }

    /// Number of handlers registered for an event type
    pub fn handler_count(&self, event_type: EventType) -> usize {
        self.handlers
            .borrow()
            .iter()
            .filter(|registration| registration.event_type == event_type)
            .count()
    }

    /// Deliver an event to every handler registered for its type
    pub fn dispatch(&self, event: &GraphEvent) {
        let snapshot: Vec<Handler> = self
            .handlers
            .borrow()
            .iter()
            .filter(|registration| registration.event_type == event.event_type)
            .map(|registration| Rc::clone(&registration.handler))
            .collect();

        for handler in snapshot {
            // A handler that re-enters dispatch for its own type is skipped
            if let Ok(mut handler) = handler.try_borrow_mut() {
                (&mut *handler)(event);
            }
        }
    }

    /// Remove every handler
    pub fn clear(&self) {
        self.handlers.borrow_mut().clear();
    }
}

impl std::fmt::Debug for EventSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSystem")
            .field("handlers", &self.handlers.borrow().len())
            .finish()
    }
}
