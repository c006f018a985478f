//! # Event Bus
//!
//! Synchronous, in-process implementation of the event bus.

use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Type-erased argument delivered to every handler of an event.
pub type EventArgs = Arc<dyn Any + Send + Sync>;

/// A shareable event handler.
///
/// Handlers are compared by pointer identity when removed with
/// [`EventBus::off_handler`], so keep the `Arc` around if you need that.
pub type Handler = Arc<dyn Fn(&EventArgs) + Send + Sync>;

/// Identifier returned by [`EventBus::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    /// Raw numeric value.
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler-{}", self.0)
    }
}

/// A handler registered under one event name.
struct Registered {
    id: HandlerId,
    handler: Handler,
}

/// In-memory event bus keyed by event name.
///
/// Each event name keeps its handlers in registration order. The same
/// handler may be registered several times and then runs once per
/// registration.
pub struct EventBus {
    /// Handlers by event name, in registration order.
    handlers: RwLock<HashMap<String, Vec<Registered>>>,

    /// Next handler identifier.
    next_id: AtomicU64,

    /// Total number of `emit` calls.
    events_emitted: AtomicU64,
}

impl EventBus {
    /// Create an empty event bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            events_emitted: AtomicU64::new(0),
        }
    }

    /// Register `handler` for `event`.
    pub fn on(&self, event: impl Into<String>, handler: Handler) -> HandlerId {
        let event = event.into();
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));

        debug!(event = %event, handler_id = %id, "Registering event handler");

        self.handlers
            .write()
            .entry(event)
            .or_default()
            .push(Registered { id, handler });

        id
    }

    /// Remove the registration identified by `id`.
    ///
    /// Returns `false` when nothing was registered under that id.
    pub fn off(&self, event: &str, id: HandlerId) -> bool {
        self.remove_where(event, |registered| registered.id == id)
    }

    /// Remove the first registration of `handler` (by pointer identity).
    pub fn off_handler(&self, event: &str, handler: &Handler) -> bool {
        self.remove_where(event, |registered| same_handler(&registered.handler, handler))
    }

    /// Invoke every handler registered for `event` with `args`.
    ///
    /// Returns the number of handlers invoked.
    pub fn emit(&self, event: &str, args: EventArgs) -> usize {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);

        let snapshot: Vec<Handler> = match self.handlers.read().get(event) {
            Some(list) => list.iter().map(|r| Arc::clone(&r.handler)).collect(),
            None => Vec::new(),
        };

        trace!(event = %event, handlers = snapshot.len(), "Dispatching event");

        for handler in &snapshot {
            handler(&args);
        }

        snapshot.len()
    }

    /// Emit `value` wrapped into [`EventArgs`].
    pub fn emit_value<T>(&self, event: &str, value: T) -> usize
    where
        T: Any + Send + Sync,
    {
        self.emit(event, Arc::new(value))
    }

    /// Whether at least one handler is registered for `event`.
    #[must_use]
    pub fn has_listeners(&self, event: &str) -> bool {
        self.listener_count(event) > 0
    }

    /// Number of registrations for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.handlers.read().get(event).map_or(0, Vec::len)
    }

    /// Event names that currently have at least one handler.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Total number of `emit` calls since creation.
    #[must_use]
    pub fn events_emitted(&self) -> u64 {
        self.events_emitted.load(Ordering::Relaxed)
    }

    fn remove_where(&self, event: &str, matches: impl Fn(&Registered) -> bool) -> bool {
        // The removed handler is dropped after the table lock is released.
        let removed = {
            let mut handlers = self.handlers.write();
            let Some(list) = handlers.get_mut(event) else {
                return false;
            };
            let Some(position) = list.iter().position(|r| matches(r)) else {
                return false;
            };

            let removed = list.remove(position);
            if list.is_empty() {
                handlers.remove(event);
            }
            removed
        };

        debug!(event = %event, handler_id = %removed.id, "Removed event handler");
        true
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("events", &self.event_names())
            .field("events_emitted", &self.events_emitted())
            .finish()
    }
}

/// Pointer identity of two handlers, ignoring vtable metadata.
fn same_handler(a: &Handler, b: &Handler) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a).cast::<()>(),
        Arc::as_ptr(b).cast::<()>(),
    )
}
