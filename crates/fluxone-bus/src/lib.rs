//! # Fluxone Bus - Named Event Publish/Subscribe
//!
//! The event bus carries two kinds of traffic for the application core:
//!
//! - **Action dispatch:** actions emit an event name, every store handler
//!   registered for that name runs.
//! - **Change notification:** each store owns a private change-event name and
//!   UI listeners subscribe to it.
//!
//! ## Dispatch Model
//!
//! ```text
//!   emit("evt", args)
//!         │
//!         ▼
//!  ┌──────────────┐   snapshot   ┌───────────┐ ┌───────────┐ ┌───────────┐
//!  │   EventBus   │ ───────────→ │ handler 1 │→│ handler 2 │→│ handler N │
//!  └──────────────┘              └───────────┘ └───────────┘ └───────────┘
//! ```
//!
//! - Dispatch is synchronous and runs in registration order.
//! - Handlers are invoked from a snapshot taken when `emit` starts, so a
//!   handler removing itself (or adding others) only affects later emissions.
//! - No lock is held while handlers run; re-entrant emission is allowed.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod bus;
pub mod subscription;

pub use bus::{EventArgs, EventBus, Handler, HandlerId};
pub use subscription::Subscription;

/// Wrap a closure into a shareable [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&EventArgs) + Send + Sync + 'static,
{
    std::sync::Arc::new(f)
}

/// Wrap any value into the type-erased argument passed to handlers.
pub fn args<T>(value: T) -> EventArgs
where
    T: std::any::Any + Send + Sync,
{
    std::sync::Arc::new(value)
}
