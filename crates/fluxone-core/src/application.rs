//! # Application - Composition Root
//!
//! One Application owns one [`Container`], seeded at construction with the
//! event bus and the configuration manager.
//!
//! ## Container Keys
//!
//! | Key | Kind | Holds |
//! |-----|------|-------|
//! | `event-emitter` | singleton, lazy | [`EventBus`] |
//! | `config` | singleton | [`ConfigManager`] |
//! | `store.<name>` | singleton | a [`Store`] |
//! | `action.<name>` | singleton | an [`Action`] |
//! | `service.<name>` | singleton | a [`Service`] |
//! | `util.<name>` | value | any utility |
//!
//! ## Dispatch
//!
//! ```text
//! execute_action(name, payload)
//!        │
//!        ▼
//!  Action::execute ──► app.emit(event, payload)
//!                             │
//!                             ▼
//!                    Store handler (bus) ──► store.emit_changes()
//!                                                    │
//!                                                    ▼
//!                                   listeners on CHANGE_ACTION.<name>.<id>
//! ```
//!
//! Stores, actions and services only hold a [`WeakApplication`]. The
//! Application is kept alive by its callers.

use crate::action::{Action, ActionOutcome};
use crate::config::{is_truthy, ConfigManager, Environment};
use crate::error::{FluxError, Result};
use crate::render::{Location, RenderRequest, Renderer, Routes};
use crate::service::Service;
use crate::site_title::SiteTitle;
use crate::store::{Store, StoreState};
use fluxone_bus::{EventArgs, EventBus, Handler, HandlerId};
use fluxone_container::{Container, Provider, Resolved};
use fluxone_telemetry::{
    metric_inc, ACTIONS_EXECUTED, ACTIONS_MISSING, CONTAINER_RESOLUTIONS, EVENTS_EMITTED,
};
use parking_lot::RwLock;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// Prefix for the stores contained in the container
pub const STORES_PREFIX: &str = "store.";

/// Prefix for the actions contained in the container
pub const ACTIONS_PREFIX: &str = "action.";

/// Prefix for the services contained in the container
pub const SERVICES_PREFIX: &str = "service.";

/// Prefix for the utilities contained in the container
pub const UTILS_PREFIX: &str = "util.";

/// Key of the configuration manager
pub const CONFIG_KEY: &str = "config";

/// Key of the event bus
pub const EVENT_EMITTER_KEY: &str = "event-emitter";

/// Container entry for stores, actions and services.
///
/// Keeps the trait object for dispatch and the concrete allocation for typed
/// lookups.
struct Registered<T: ?Sized> {
    object: Arc<T>,
    any: Resolved,
}

/// Named utilities added to the container under `util.<name>`.
#[derive(Clone, Default)]
pub struct UtilBundle {
    entries: Vec<(String, Provider)>,
}

impl UtilBundle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style push.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, util: impl Into<Provider>) -> Self {
        self.push(name, util);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, util: impl Into<Provider>) {
        self.entries.push((name.into(), util.into()));
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

impl From<Vec<(String, Provider)>> for UtilBundle {
    fn from(entries: Vec<(String, Provider)>) -> Self {
        Self { entries }
    }
}

impl From<HashMap<String, Provider>> for UtilBundle {
    fn from(map: HashMap<String, Provider>) -> Self {
        let mut entries: Vec<_> = map.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Self { entries }
    }
}

impl FromIterator<(String, Provider)> for UtilBundle {
    fn from_iter<I: IntoIterator<Item = (String, Provider)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

struct AppInner {
    container: Container,
    env: Environment,
    /// `store.<name>` keys in registration order.
    stores: RwLock<Vec<String>>,
    site_title: RwLock<Option<SiteTitle>>,
    routes: RwLock<Option<Routes>>,
    renderer: RwLock<Option<Arc<dyn Renderer>>>,
}

/// Composition root. Cloning is cheap and every clone is the same
/// application.
#[derive(Clone)]
pub struct Application {
    inner: Arc<AppInner>,
}

/// Non-owning handle to an [`Application`].
#[derive(Clone, Default)]
pub struct WeakApplication {
    inner: Weak<AppInner>,
}

impl WeakApplication {
    #[must_use]
    pub fn upgrade(&self) -> Option<Application> {
        self.inner.upgrade().map(|inner| Application { inner })
    }

    /// Whether the application is still alive.
    pub(crate) fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Whether this handle points at `app`.
    #[must_use]
    pub fn ptr_eq(&self, app: &Application) -> bool {
        std::ptr::eq(self.inner.as_ptr(), Arc::as_ptr(&app.inner))
    }
}

/// Builder for [`Application`].
#[derive(Default)]
pub struct ApplicationBuilder {
    config: Value,
    utils: Option<UtilBundle>,
    env: Environment,
    renderer: Option<Arc<dyn Renderer>>,
    routes: Option<Routes>,
}

impl ApplicationBuilder {
    /// Configuration bundle: an object or a list of `{name, content}`.
    #[must_use]
    pub fn config(mut self, bundle: Value) -> Self {
        self.config = bundle;
        self
    }

    #[must_use]
    pub fn utils(mut self, utils: UtilBundle) -> Self {
        self.utils = Some(utils);
        self
    }

    #[must_use]
    pub fn env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    #[must_use]
    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    #[must_use]
    pub fn routes(mut self, routes: Routes) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Seed the container and derive the site title from `main`.
    pub fn build(self) -> Result<Application> {
        let container = Container::new();
        container.register_singleton(EVENT_EMITTER_KEY, Provider::lazy(EventBus::new));
        container.register_singleton(
            CONFIG_KEY,
            Provider::value(ConfigManager::new(&self.config, self.env.clone())?),
        );

        let app = Application {
            inner: Arc::new(AppInner {
                container,
                env: self.env,
                stores: RwLock::new(Vec::new()),
                site_title: RwLock::new(None),
                routes: RwLock::new(self.routes),
                renderer: RwLock::new(self.renderer),
            }),
        };

        if let Some(utils) = self.utils {
            app.add_utils(utils)?;
        }
        app.prepare_site_title();

        debug!(env = %app.env(), "Application created");
        Ok(app)
    }
}

impl Application {
    /// Application with `bundle` as configuration.
    pub fn new(bundle: &Value, env: Environment) -> Result<Self> {
        Self::builder().config(bundle.clone()).env(env).build()
    }

    #[must_use]
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::default()
    }

    #[must_use]
    pub fn env(&self) -> &Environment {
        &self.inner.env
    }

    /// The underlying container.
    #[must_use]
    pub fn container(&self) -> &Container {
        &self.inner.container
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakApplication {
        WeakApplication {
            inner: Arc::downgrade(&self.inner),
        }
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn prepare_site_title(&self) {
        let Some(main) = self.config("main").filter(is_truthy) else {
            return;
        };
        let field = |key: &str| {
            main.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        self.set_site_title(SiteTitle::new(field("baseTitle"), field("titleSeparator")));
    }

    // =========================================================================
    // CONTAINER FACADES
    // =========================================================================

    /// Resolve any container entry.
    pub fn get(&self, name: &str) -> Option<Resolved> {
        let kind = self
            .inner
            .container
            .kind(name)
            .map_or("missing", |kind| kind.as_str());
        metric_inc!(CONTAINER_RESOLUTIONS, &[kind]);

        self.inner.container.get(name)
    }

    /// Resolve and downcast a container entry.
    pub fn get_as<T>(&self, name: &str) -> Result<Option<Arc<T>>>
    where
        T: Any + Send + Sync,
    {
        match self.get(name) {
            None => Ok(None),
            Some(value) => value.downcast::<T>().map(Some).map_err(|_| {
                FluxError::Container(fluxone_container::ContainerError::TypeMismatch {
                    name: name.to_string(),
                    expected: std::any::type_name::<T>(),
                })
            }),
        }
    }

    pub fn value(&self, name: impl Into<String>, provider: impl Into<Provider>) {
        self.inner.container.register_value(name, provider);
    }

    pub fn singleton(&self, name: impl Into<String>, provider: impl Into<Provider>) {
        self.inner.container.register_singleton(name, provider);
    }

    pub fn factory(&self, name: impl Into<String>, provider: impl Into<Provider>) {
        self.inner.container.register_factory(name, provider);
    }

    /// Remove any container entry.
    pub fn remove(&self, name: &str) -> bool {
        self.inner.container.remove(name)
    }

    // =========================================================================
    // CONFIGURATION AND UTILITIES
    // =========================================================================

    /// The configuration manager.
    #[must_use]
    pub fn config_manager(&self) -> Option<Arc<ConfigManager>> {
        self.inner
            .container
            .get_as::<ConfigManager>(CONFIG_KEY)
            .ok()
            .flatten()
    }

    /// Configuration value for `name`.
    #[must_use]
    pub fn config(&self, name: &str) -> Option<Value> {
        self.config_manager().and_then(|config| config.get(name))
    }

    /// Store a configuration value. Falsy values are ignored.
    pub fn set_config(&self, name: impl Into<String>, value: Value) {
        if let Some(config) = self.config_manager() {
            config.set(name, value);
        }
    }

    /// Resolve the utility registered as `name`.
    pub fn util(&self, name: &str) -> Option<Resolved> {
        self.get(&format!("{UTILS_PREFIX}{name}"))
    }

    /// Resolve and downcast the utility registered as `name`.
    pub fn util_as<T>(&self, name: &str) -> Result<Option<Arc<T>>>
    where
        T: Any + Send + Sync,
    {
        self.get_as::<T>(&format!("{UTILS_PREFIX}{name}"))
    }

    /// Register a utility under `util.<name>`.
    pub fn set_util(&self, name: &str, util: impl Into<Provider>) {
        self.value(format!("{UTILS_PREFIX}{name}"), util);
    }

    /// Register every utility of `utils`.
    ///
    /// Fails with `InvalidArgument`, registering nothing, when a name is
    /// empty.
    pub fn add_utils(&self, utils: UtilBundle) -> Result<()> {
        if let Some(position) = utils.entries.iter().position(|(name, _)| name.is_empty()) {
            return Err(FluxError::InvalidArgument(format!(
                "Invalid list of utilities, entry {position} has no name."
            )));
        }

        for (name, util) in utils.entries {
            self.set_util(&name, util);
        }
        Ok(())
    }

    // =========================================================================
    // SITE TITLE AND RENDERING
    // =========================================================================

    /// Copy of the current title manager.
    #[must_use]
    pub fn site_title(&self) -> Option<SiteTitle> {
        self.inner.site_title.read().clone()
    }

    pub fn set_site_title(&self, title: SiteTitle) {
        *self.inner.site_title.write() = Some(title);
    }

    /// Replace the title segments with `title`. No-op without a manager.
    pub fn set_page_title(&self, title: &str) {
        if let Some(site_title) = self.inner.site_title.write().as_mut() {
            site_title.set(title);
        }
    }

    /// Rendered title.
    #[must_use]
    pub fn page_title(&self) -> Option<String> {
        self.inner.site_title.read().as_ref().map(SiteTitle::full)
    }

    #[must_use]
    pub fn routes(&self) -> Option<Routes> {
        self.inner.routes.read().clone()
    }

    pub fn set_routes(&self, routes: Routes) {
        *self.inner.routes.write() = Some(routes);
    }

    pub fn set_renderer(&self, renderer: Arc<dyn Renderer>) {
        *self.inner.renderer.write() = Some(renderer);
    }

    #[must_use]
    pub fn has_renderer(&self) -> bool {
        self.inner.renderer.read().is_some()
    }

    /// Render `url` for a server response.
    pub fn render_server(&self, url: &str, props: Value) -> Result<String> {
        self.render(Location::Url(url.to_string()), props)
    }

    /// Render against the browser history.
    pub fn render_client(&self, props: Value) -> Result<String> {
        self.render(Location::History, props)
    }

    fn render(&self, location: Location, props: Value) -> Result<String> {
        let renderer = self.inner.renderer.read().clone().ok_or_else(|| {
            FluxError::ContractViolation("no renderer installed on the application".into())
        })?;

        let request = RenderRequest {
            app: self.clone(),
            routes: self.routes(),
            location,
            props,
        };
        debug!(location = ?request.location, "Rendering");
        Ok(renderer.render(&request)?)
    }

    // =========================================================================
    // STORES
    // =========================================================================

    fn registered<T>(&self, key: &str) -> Option<Arc<Registered<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get_as::<Registered<T>>(key).ok().flatten()
    }

    /// Register `store` as `store.<name>`.
    ///
    /// An unattached store is attached to this application first, which
    /// wires its handlers to the bus. A store attached elsewhere keeps its
    /// attachment. A different store already registered under the same name
    /// and attached here is detached.
    pub fn add_store<S: Store>(&self, store: Arc<S>) -> Result<()> {
        if !store.core().is_bound() {
            return Err(FluxError::ContractViolation(format!(
                "store '{}' was not built with StoreBuilder",
                store.name()
            )));
        }

        let key = format!("{STORES_PREFIX}{}", store.name());
        if let Some(previous) = self.registered::<dyn Store>(&key) {
            let same = std::ptr::eq(
                Arc::as_ptr(&previous.any).cast::<()>(),
                Arc::as_ptr(&store).cast::<()>(),
            );
            if !same && previous.object.core().is_attached_to(self) {
                let removed = previous.object.core().detach();
                debug!(key = %key, removed, "Replaced store detached");
            }
        }

        if !store.core().is_attached() {
            store.core().set_app(self);
        }

        let object: Arc<dyn Store> = store.clone();
        self.singleton(key.clone(), Provider::value(Registered { object, any: store }));

        let mut stores = self.inner.stores.write();
        if !stores.contains(&key) {
            stores.push(key.clone());
        }

        debug!(key = %key, "Store added");
        Ok(())
    }

    /// Unwire and unregister the store called `name`.
    pub fn remove_store(&self, name: &str) -> bool {
        let key = format!("{STORES_PREFIX}{name}");

        if let Some(entry) = self.registered::<dyn Store>(&key) {
            if entry.object.core().is_attached_to(self) {
                entry.object.core().detach();
            }
        }

        let removed = self.inner.container.remove(&key);
        self.inner.stores.write().retain(|k| k != &key);

        if removed {
            debug!(key = %key, "Store removed");
        }
        removed
    }

    #[must_use]
    pub fn get_store(&self, name: &str) -> Option<Arc<dyn Store>> {
        self.registered::<dyn Store>(&format!("{STORES_PREFIX}{name}"))
            .map(|entry| Arc::clone(&entry.object))
    }

    /// The store called `name`, as its concrete type.
    #[must_use]
    pub fn get_store_as<S: Store>(&self, name: &str) -> Option<Arc<S>> {
        self.registered::<dyn Store>(&format!("{STORES_PREFIX}{name}"))
            .and_then(|entry| Arc::clone(&entry.any).downcast::<S>().ok())
    }

    /// Names of the registered stores, in registration order.
    #[must_use]
    pub fn store_names(&self) -> Vec<String> {
        self.inner
            .stores
            .read()
            .iter()
            .filter_map(|key| key.strip_prefix(STORES_PREFIX))
            .map(str::to_string)
            .collect()
    }

    /// Merge the saved state of every store, in registration order.
    ///
    /// Later stores overwrite earlier ones on key collisions.
    pub fn save_state(&self) -> Result<StoreState> {
        let keys = self.inner.stores.read().clone();
        let mut state = StoreState::new();

        for key in keys {
            if let Some(entry) = self.registered::<dyn Store>(&key) {
                state.extend(entry.object.save_state()?);
            }
        }
        Ok(state)
    }

    /// Hand the full combined `state` to every store, in registration order.
    pub fn restore_state(&self, state: &StoreState) -> Result<()> {
        let keys = self.inner.stores.read().clone();

        for key in keys {
            if let Some(entry) = self.registered::<dyn Store>(&key) {
                entry.object.restore_state(state)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // ACTIONS AND SERVICES
    // =========================================================================

    /// Register `action` as `action.<name>`, linking it to this application
    /// if it is not linked yet.
    pub fn add_action<A: Action>(&self, action: Arc<A>) {
        if !action.app_link().is_attached() {
            action.app_link().attach(self);
        }

        let key = format!("{ACTIONS_PREFIX}{}", action.name());
        let object: Arc<dyn Action> = action.clone();
        self.singleton(key.clone(), Provider::value(Registered { object, any: action }));
        debug!(key = %key, "Action added");
    }

    pub fn remove_action(&self, name: &str) -> bool {
        self.inner.container.remove(&format!("{ACTIONS_PREFIX}{name}"))
    }

    #[must_use]
    pub fn get_action(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.registered::<dyn Action>(&format!("{ACTIONS_PREFIX}{name}"))
            .map(|entry| Arc::clone(&entry.object))
    }

    /// Execute the action registered as `name`.
    ///
    /// Fails with `NotFound` when no such action is registered. Errors from
    /// the action itself are returned unchanged.
    pub fn execute_action(&self, name: &str, payload: Value) -> Result<ActionOutcome> {
        let Some(action) = self.get_action(name) else {
            metric_inc!(ACTIONS_MISSING);
            warn!(action = %name, "Action not registered");
            return Err(FluxError::NotFound(format!(
                "Action '{name}' was not registered in the app container, therefore it cannot be executed."
            )));
        };

        metric_inc!(ACTIONS_EXECUTED);
        debug!(action = %name, "Executing action");
        action.execute(payload)
    }

    /// Register `service` as `service.<name>`, linking it to this application
    /// if it is not linked yet.
    pub fn add_service<S: Service>(&self, service: Arc<S>) {
        if !service.app_link().is_attached() {
            service.app_link().attach(self);
        }

        let key = format!("{SERVICES_PREFIX}{}", service.name());
        let object: Arc<dyn Service> = service.clone();
        self.singleton(key.clone(), Provider::value(Registered { object, any: service }));
        debug!(key = %key, "Service added");
    }

    pub fn remove_service(&self, name: &str) -> bool {
        self.inner
            .container
            .remove(&format!("{SERVICES_PREFIX}{name}"))
    }

    #[must_use]
    pub fn get_service(&self, name: &str) -> Option<Arc<dyn Service>> {
        self.registered::<dyn Service>(&format!("{SERVICES_PREFIX}{name}"))
            .map(|entry| Arc::clone(&entry.object))
    }

    /// The service called `name`, as its concrete type.
    #[must_use]
    pub fn get_service_as<S: Service>(&self, name: &str) -> Option<Arc<S>> {
        self.registered::<dyn Service>(&format!("{SERVICES_PREFIX}{name}"))
            .and_then(|entry| Arc::clone(&entry.any).downcast::<S>().ok())
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// The event bus, re-created if it was removed from the container.
    #[must_use]
    pub fn event_bus(&self) -> Arc<EventBus> {
        if let Ok(Some(bus)) = self.inner.container.get_as::<EventBus>(EVENT_EMITTER_KEY) {
            return bus;
        }

        warn!("Event bus missing from the container, registering a new one");
        let bus = Arc::new(EventBus::new());
        self.inner
            .container
            .register_singleton(EVENT_EMITTER_KEY, Provider::shared(Arc::clone(&bus)));
        bus
    }

    pub fn on(&self, event: impl Into<String>, handler: Handler) -> HandlerId {
        self.event_bus().on(event, handler)
    }

    /// Remove one registration of `handler`, matched by identity.
    pub fn off(&self, event: &str, handler: &Handler) -> bool {
        self.event_bus().off_handler(event, handler)
    }

    pub fn off_id(&self, event: &str, id: HandlerId) -> bool {
        self.event_bus().off(event, id)
    }

    /// Invoke every handler of `event`. Returns how many ran.
    pub fn emit(&self, event: &str, args: EventArgs) -> usize {
        metric_inc!(EVENTS_EMITTED);
        self.event_bus().emit(event, args)
    }

    /// Wrap `value` and emit it.
    pub fn emit_value<T>(&self, event: &str, value: T) -> usize
    where
        T: Any + Send + Sync,
    {
        self.emit(event, Arc::new(value))
    }

    #[must_use]
    pub fn has_listeners(&self, event: &str) -> bool {
        self.event_bus().has_listeners(event)
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("env", &self.inner.env)
            .field("stores", &*self.inner.stores.read())
            .field("site_title", &self.page_title())
            .finish_non_exhaustive()
    }
}
