//! # Store Subscriptions
//!
//! Listener sets for view code: resolve stores by name, register one
//! listener per store and remove all of them together.
//!
//! ```rust,ignore
//! // Same handler for every store
//! let subs = StoreSubscriptions::attach(&app, StoreBindings::all(["cart", "user"], on_change))?;
//!
//! // One handler per store
//! let bindings = StoreBindings::per_store()
//!     .bind("cart", on_cart_change)
//!     .bind("user", on_user_change);
//! let subs = StoreSubscriptions::attach(&app, bindings)?;
//! ```

use crate::application::Application;
use crate::error::{FluxError, Result};
use crate::store::Store;
use fluxone_bus::{Handler, Subscription};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Which listener goes on which store.
#[derive(Clone)]
pub enum StoreBindings {
    /// One handler for a list of stores.
    Default { stores: Vec<String>, handler: Handler },
    /// A handler per store, in order.
    PerStore(Vec<(String, Handler)>),
}

impl StoreBindings {
    /// Bind `handler` to every store in `stores`.
    pub fn all<I, S>(stores: I, handler: Handler) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Default {
            stores: stores.into_iter().map(Into::into).collect(),
            handler,
        }
    }

    /// Start an empty per-store binding list.
    #[must_use]
    pub fn per_store() -> Self {
        Self::PerStore(Vec::new())
    }

    /// Add a per-store binding. Turns a `Default` binding into per-store
    /// bindings first.
    #[must_use]
    pub fn bind(self, store: impl Into<String>, handler: Handler) -> Self {
        let mut entries = self.into_pairs();
        entries.push((store.into(), handler));
        Self::PerStore(entries)
    }

    fn into_pairs(self) -> Vec<(String, Handler)> {
        match self {
            Self::Default { stores, handler } => stores
                .into_iter()
                .map(|store| (store, Arc::clone(&handler)))
                .collect(),
            Self::PerStore(entries) => entries,
        }
    }
}

/// Active listener registrations on a set of stores.
///
/// Dropping the value removes every registration.
pub struct StoreSubscriptions {
    entries: Vec<(Arc<dyn Store>, Subscription)>,
}

impl StoreSubscriptions {
    /// Resolve every store and register its listener.
    ///
    /// Fails with `NotFound` before registering anything when a store is not
    /// registered in `app`.
    pub fn attach(app: &Application, bindings: StoreBindings) -> Result<Self> {
        let pairs = bindings.into_pairs();

        let mut resolved = Vec::with_capacity(pairs.len());
        for (name, handler) in pairs {
            let store = app.get_store(&name).ok_or_else(|| {
                FluxError::NotFound(format!(
                    "Store {name} has not been registered in the app container."
                ))
            })?;
            resolved.push((store, handler));
        }

        let mut subscriptions = Self {
            entries: Vec::with_capacity(resolved.len()),
        };
        for (store, handler) in resolved {
            // On failure the guards drop and unregister what was added.
            let subscription = store.subscribe(handler)?;
            subscriptions.entries.push((store, subscription));
        }

        debug!(count = subscriptions.entries.len(), "Store listeners attached");
        Ok(subscriptions)
    }

    /// Remove every registration now.
    ///
    /// Returns how many were removed.
    pub fn detach(&mut self) -> usize {
        let removed = self
            .entries
            .drain(..)
            .map(|(_, mut subscription)| subscription.cancel())
            .filter(|removed| *removed)
            .count();

        if removed > 0 {
            debug!(count = removed, "Store listeners detached");
        }
        removed
    }

    /// Names of the subscribed stores.
    #[must_use]
    pub fn stores(&self) -> Vec<&str> {
        self.entries.iter().map(|(store, _)| store.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for StoreSubscriptions {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for StoreSubscriptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSubscriptions")
            .field("stores", &self.stores())
            .finish()
    }
}
