//! # Store Protocol
//!
//! A store owns a table of action handlers and a private change channel.
//!
//! ## Lifecycle
//!
//! ```text
//!              set_app(app)                    detach()
//! Unattached ───────────────► Attached ──────────────────► Detached
//!                                ▲  │                          │
//!                                │  │ set_app(other)           │ set_app(app)
//!                                │  ▼                          │
//!                                └──┴──────────────────────────┘
//! ```
//!
//! Every change of the handler table or of the application first removes the
//! registrations made against the previous application, then registers the
//! whole table against the current one. Both steps run under one lock, so a
//! store is never half-wired. The target bus is resolved from the container
//! before that lock is taken.
//!
//! Registrations are [`Subscription`] guards: dropping the store drops its
//! core and takes every handler off the bus.
//!
//! ## Change Notifications
//!
//! `emit_changes()` publishes the store itself on
//! `CHANGE_ACTION.<name>.<instance id>`. Listeners receive the same
//! allocation the application holds and can downcast it to the concrete
//! store type.

use crate::application::{Application, WeakApplication};
use crate::error::{FluxError, Result};
use crate::ids::InstanceIds;
use fluxone_bus::{EventArgs, EventBus, Handler, HandlerId, Subscription};
use fluxone_telemetry::{metric_inc, STORE_CHANGES};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, trace, warn};

/// Serialized store state: a flat string-keyed mapping.
pub type StoreState = Map<String, Value>;

type SharedAny = Arc<dyn Any + Send + Sync>;
type MethodFn = Arc<dyn Fn(&SharedAny, &EventArgs) + Send + Sync>;

/// One entry of a store's handler table.
#[derive(Clone)]
pub enum ActionHandler {
    /// Called as is.
    Function(Handler),
    /// Called with the owning store, bound when the handler is registered.
    Method(MethodFn),
}

impl ActionHandler {
    /// A free-standing handler.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&EventArgs) + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }

    /// A handler invoked on the store of type `S` it belongs to.
    pub fn method<S, F>(f: F) -> Self
    where
        S: Store,
        F: Fn(&S, &EventArgs) + Send + Sync + 'static,
    {
        Self::Method(Arc::new(move |store: &SharedAny, args: &EventArgs| {
            match store.downcast_ref::<S>() {
                Some(store) => f(store, args),
                None => warn!(
                    expected = std::any::type_name::<S>(),
                    "Method handler bound to a store of another type"
                ),
            }
        }))
    }

    /// Turn the entry into a bus handler for the store behind `this`.
    fn bind(&self, this: Option<&Weak<dyn Any + Send + Sync>>) -> Option<Handler> {
        match self {
            Self::Function(handler) => Some(Arc::clone(handler)),
            Self::Method(method) => {
                let this = this?.clone();
                let method = Arc::clone(method);
                Some(Arc::new(move |args: &EventArgs| {
                    if let Some(store) = this.upgrade() {
                        method(&store, args);
                    }
                }))
            }
        }
    }
}

impl fmt::Debug for ActionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("ActionHandler::Function"),
            Self::Method(_) => f.write_str("ActionHandler::Method"),
        }
    }
}

/// Event name → handler table.
#[derive(Clone, Default)]
pub struct ActionHandlers {
    entries: BTreeMap<String, ActionHandler>,
}

impl ActionHandlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn on(mut self, event: impl Into<String>, handler: ActionHandler) -> Self {
        self.insert(event, handler);
        self
    }

    /// Insert or replace the handler for `event`.
    pub fn insert(&mut self, event: impl Into<String>, handler: ActionHandler) {
        self.entries.insert(event.into(), handler);
    }

    /// Overlay `overrides` on this table. Entries of `overrides` win.
    #[must_use]
    pub fn merge(mut self, overrides: ActionHandlers) -> Self {
        self.entries.extend(overrides.entries);
        self
    }

    #[must_use]
    pub fn get(&self, event: &str) -> Option<&ActionHandler> {
        self.entries.get(event)
    }

    #[must_use]
    pub fn contains(&self, event: &str) -> bool {
        self.entries.contains_key(event)
    }

    /// Event names, sorted.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
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

impl fmt::Debug for ActionHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

/// Handler table, application link and live registrations.
struct Wiring {
    handlers: ActionHandlers,
    app: Option<WeakApplication>,
    registered: Vec<Subscription>,
}

impl Wiring {
    /// Whether the link still matches `app` as seen before locking.
    fn links(&self, app: Option<&Application>) -> bool {
        match (&self.app, app) {
            (Some(weak), Some(app)) => weak.ptr_eq(app),
            (Some(weak), None) => !weak.is_alive(),
            (None, app) => app.is_none(),
        }
    }
}

/// State shared by every store implementation.
///
/// Built by [`StoreBuilder`] and owned by the concrete store.
pub struct StoreCore {
    instance_id: u64,
    this: OnceLock<Weak<dyn Any + Send + Sync>>,
    initialized: AtomicBool,
    wiring: Mutex<Wiring>,
}

impl StoreCore {
    pub(crate) fn new(instance_id: u64, handlers: ActionHandlers) -> Self {
        Self {
            instance_id,
            this: OnceLock::new(),
            initialized: AtomicBool::new(false),
            wiring: Mutex::new(Wiring {
                handlers,
                app: None,
                registered: Vec::new(),
            }),
        }
    }

    #[must_use]
    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    /// The application this store is attached to, if it is still alive.
    #[must_use]
    pub fn app(&self) -> Option<Application> {
        self.wiring.lock().app.as_ref().and_then(WeakApplication::upgrade)
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.app().is_some()
    }

    /// Whether this store is attached to exactly `app`.
    #[must_use]
    pub fn is_attached_to(&self, app: &Application) -> bool {
        self.wiring
            .lock()
            .app
            .as_ref()
            .is_some_and(|weak| weak.ptr_eq(app))
    }

    /// Current handler table.
    #[must_use]
    pub fn handlers(&self) -> ActionHandlers {
        self.wiring.lock().handlers.clone()
    }

    /// Number of live bus registrations.
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.wiring.lock().registered.len()
    }

    /// Replace the handler table and re-wire.
    pub fn set_handlers(&self, handlers: ActionHandlers) {
        loop {
            let app = self.app();
            let bus = app.as_ref().map(Application::event_bus);

            let mut wiring = self.wiring.lock();
            if !wiring.links(app.as_ref()) {
                // Re-attached in between; resolve the new bus.
                continue;
            }
            self.unregister(&mut wiring);
            wiring.handlers = handlers;
            self.register(&mut wiring, bus.as_ref());
            return;
        }
    }

    /// Attach to `app`, moving every registration over from the previous one.
    pub fn set_app(&self, app: &Application) {
        let bus = app.event_bus();

        let mut wiring = self.wiring.lock();
        self.unregister(&mut wiring);
        wiring.app = Some(app.downgrade());
        self.register(&mut wiring, Some(&bus));
    }

    /// Remove every registration and forget the application.
    ///
    /// Returns the number of registrations removed.
    pub fn detach(&self) -> usize {
        let mut wiring = self.wiring.lock();
        let removed = self.unregister(&mut wiring);
        wiring.app = None;
        removed
    }

    /// Whether this core was bound to its store by [`StoreBuilder`].
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.this.get().is_some()
    }

    /// The owning store as a shared `Any`.
    fn this(&self) -> Option<SharedAny> {
        self.this.get().and_then(Weak::upgrade)
    }

    fn bind(&self, this: Weak<dyn Any + Send + Sync>) {
        if self.this.set(this).is_err() {
            warn!(instance_id = self.instance_id, "Store core bound twice");
        }
    }

    fn unregister(&self, wiring: &mut Wiring) -> usize {
        let registered = std::mem::take(&mut wiring.registered);
        let count = registered.len();
        for mut subscription in registered {
            subscription.cancel();
        }

        if count > 0 {
            trace!(instance_id = self.instance_id, count, "Store handlers unregistered");
        }
        count
    }

    fn register(&self, wiring: &mut Wiring, bus: Option<&Arc<EventBus>>) {
        let Some(bus) = bus else {
            return;
        };

        let this = self.this.get();
        let mut registered = Vec::with_capacity(wiring.handlers.len());
        for (event, handler) in &wiring.handlers.entries {
            match handler.bind(this) {
                Some(bound) => registered.push(Subscription::new(bus, event.clone(), bound)),
                None => warn!(
                    event = %event,
                    instance_id = self.instance_id,
                    "Method handler skipped: store not built with StoreBuilder"
                ),
            }
        }

        trace!(
            instance_id = self.instance_id,
            count = registered.len(),
            "Store handlers registered"
        );
        wiring.registered = registered;
    }
}

impl fmt::Debug for StoreCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let wiring = self.wiring.lock();
        f.debug_struct("StoreCore")
            .field("instance_id", &self.instance_id)
            .field("handlers", &wiring.handlers)
            .field("registered", &wiring.registered.len())
            .finish()
    }
}

/// Flux store capability.
///
/// Implementors provide a name and the [`StoreCore`] handed to them by
/// [`StoreBuilder::build`]; everything else has a default.
pub trait Store: Send + Sync + 'static {
    /// Identifier used for the `store.<name>` container key.
    fn name(&self) -> &str;

    fn core(&self) -> &StoreCore;

    /// Handlers every instance of this store starts with.
    fn default_handlers() -> ActionHandlers
    where
        Self: Sized,
    {
        ActionHandlers::new()
    }

    /// Runs once, after the handler table is set.
    fn initialize(&self) {}

    /// State to carry from the server pass to the client pass.
    fn save_state(&self) -> Result<StoreState> {
        Err(FluxError::NotImplemented(format!(
            "the state of store '{}' is not saved to be reused on the client",
            self.name()
        )))
    }

    /// Read this store's keys back out of the combined state.
    fn restore_state(&self, _state: &StoreState) -> Result<()> {
        Err(FluxError::NotImplemented(format!(
            "the server state of store '{}' is not restored on the client",
            self.name()
        )))
    }

    fn instance_id(&self) -> u64 {
        self.core().instance_id()
    }

    /// Private channel used for change notifications.
    fn change_event_name(&self) -> String {
        format!("CHANGE_ACTION.{}.{}", self.name(), self.instance_id())
    }

    fn app(&self) -> Option<Application> {
        self.core().app()
    }

    /// Subscribe `listener` to change notifications.
    ///
    /// Fails with `ContractViolation` when the store is not attached.
    fn register_listener(&self, listener: Handler) -> Result<HandlerId> {
        let app = self.app().ok_or_else(|| {
            FluxError::ContractViolation(format!(
                "store '{}' is not attached to an application",
                self.name()
            ))
        })?;
        Ok(app.on(self.change_event_name(), listener))
    }

    /// Subscribe `listener` and return a guard that unsubscribes on drop.
    ///
    /// Fails with `ContractViolation` when the store is not attached.
    fn subscribe(&self, listener: Handler) -> Result<Subscription> {
        let app = self.app().ok_or_else(|| {
            FluxError::ContractViolation(format!(
                "store '{}' is not attached to an application",
                self.name()
            ))
        })?;
        Ok(Subscription::new(
            &app.event_bus(),
            self.change_event_name(),
            listener,
        ))
    }

    /// Unsubscribe one registration of `listener`.
    fn remove_listener(&self, listener: &Handler) -> bool {
        self.app()
            .is_some_and(|app| app.off(&self.change_event_name(), listener))
    }

    fn has_listeners(&self) -> bool {
        self.app()
            .is_some_and(|app| app.has_listeners(&self.change_event_name()))
    }

    /// Notify listeners with the store itself as the payload.
    ///
    /// Returns the number of listeners invoked.
    fn emit_changes(&self) -> usize {
        let Some(app) = self.app() else {
            debug!(store = %self.name(), "emit_changes on unattached store");
            return 0;
        };
        let Some(this) = self.core().this() else {
            warn!(store = %self.name(), "emit_changes on store not built with StoreBuilder");
            return 0;
        };

        metric_inc!(STORE_CHANGES);
        app.emit(&self.change_event_name(), this)
    }
}

/// Constructs stores: merges handlers, assigns the id, binds the core and
/// runs `initialize` once.
///
/// ```rust,ignore
/// let store = StoreBuilder::new()
///     .handlers(ActionHandlers::new().on("reset", ActionHandler::method(CartStore::reset)))
///     .build(|core| CartStore { core, items: Mutex::default() });
/// ```
pub struct StoreBuilder<'a> {
    overrides: ActionHandlers,
    ids: &'a InstanceIds,
    app: Option<Application>,
}

impl Default for StoreBuilder<'static> {
    fn default() -> Self {
        Self {
            overrides: ActionHandlers::new(),
            ids: InstanceIds::global(),
            app: None,
        }
    }
}

impl StoreBuilder<'static> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'a> StoreBuilder<'a> {
    /// Instance handlers, overriding the store's defaults on collision.
    #[must_use]
    pub fn handlers(mut self, overrides: ActionHandlers) -> Self {
        self.overrides = overrides;
        self
    }

    /// Draw the instance id from `ids` instead of the global allocator.
    #[must_use]
    pub fn ids<'b>(self, ids: &'b InstanceIds) -> StoreBuilder<'b> {
        StoreBuilder {
            overrides: self.overrides,
            ids,
            app: self.app,
        }
    }

    /// Attach to `app` right after construction.
    #[must_use]
    pub fn app(mut self, app: &Application) -> Self {
        self.app = Some(app.clone());
        self
    }

    pub fn build<S, F>(self, make: F) -> Arc<S>
    where
        S: Store,
        F: FnOnce(StoreCore) -> S,
    {
        let handlers = S::default_handlers().merge(self.overrides);
        let core = StoreCore::new(self.ids.next(), handlers);
        let store = Arc::new(make(core));

        let shared: SharedAny = store.clone();
        store.core().bind(Arc::downgrade(&shared));
        drop(shared);

        if let Some(app) = self.app {
            store.core().set_app(&app);
        }

        if !store.core().initialized.swap(true, Ordering::SeqCst) {
            store.initialize();
        }

        debug!(
            store = %store.name(),
            instance_id = store.instance_id(),
            handlers = store.core().handlers().len(),
            "Store built"
        );
        store
    }
}
