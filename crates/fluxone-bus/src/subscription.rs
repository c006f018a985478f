//! # Subscription Guard
//!
//! RAII handle that unregisters its handler when dropped.

use crate::bus::{EventBus, Handler, HandlerId};
use std::sync::{Arc, Weak};
use tracing::debug;

/// A handler registration tied to the lifetime of this value.
///
/// Holds only a weak reference to the bus, so a subscription never keeps the
/// bus alive.
pub struct Subscription {
    bus: Weak<EventBus>,
    event: String,
    id: HandlerId,
    active: bool,
}

impl Subscription {
    /// Register `handler` on `bus` and return the guard.
    pub fn new(bus: &Arc<EventBus>, event: impl Into<String>, handler: Handler) -> Self {
        let event = event.into();
        let id = bus.on(event.clone(), handler);
        Self {
            bus: Arc::downgrade(bus),
            event,
            id,
            active: true,
        }
    }

    /// Event name this subscription listens to.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Identifier of the underlying registration.
    #[must_use]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Unregister now instead of on drop.
    ///
    /// Returns `true` if the handler was still registered.
    pub fn cancel(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.bus
            .upgrade()
            .is_some_and(|bus| bus.off(&self.event, self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.cancel() {
            debug!(event = %self.event, handler_id = %self.id, "Subscription dropped");
        }
    }
}
