//! # Container
//!
//! Owns the registration table and the cache of resolved values.
//!
//! ## Resolution
//!
//! ```text
//! get(name)
//!   │
//!   ├── registered?  no ──────────────────────► None
//!   │
//!   ├── Value / Singleton: cell filled? ──────► cached value
//!   │
//!   └── resolve provider (no table lock held)
//!         Instance  → the value itself
//!         Callable  → f()
//!         Injected  → inject(spec).call()
//!             │
//!             └── Value / Singleton: fill the entry's cell
//! ```
//!
//! Each caching registration owns a `OnceLock`. Concurrent first `get` calls
//! block on that cell, so the provider runs once per registration.
//! Re-registering a name installs a fresh cell.

use crate::error::ContainerError;
use crate::injection::{Dependencies, Injected, InjectionSpec, ResolvedArgs};
use crate::provider::{Provider, RegistrationKind, Resolved};
use parking_lot::RwLock;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, trace};

/// A registered provider and its kind.
#[derive(Clone)]
struct Registration {
    kind: RegistrationKind,
    provider: Provider,
    /// Memoized resolution; `None` for `Factory` entries.
    cache: Option<Arc<OnceLock<Resolved>>>,
}

impl Registration {
    fn new(kind: RegistrationKind, provider: Provider) -> Self {
        let cache = kind.caches().then(|| Arc::new(OnceLock::new()));
        Self {
            kind,
            provider,
            cache,
        }
    }

    fn is_resolved(&self) -> bool {
        self.cache.as_ref().is_some_and(|cell| cell.get().is_some())
    }
}

#[derive(Default)]
struct ContainerInner {
    /// Registrations by name.
    registry: RwLock<HashMap<String, Registration>>,
}

/// String-keyed dependency-injection container.
///
/// Cloning is cheap and every clone shares the same tables.
#[derive(Clone, Default)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

/// Non-owning handle to a [`Container`].
#[derive(Clone, Default)]
pub struct WeakContainer {
    inner: Weak<ContainerInner>,
}

impl WeakContainer {
    /// The container, if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Container> {
        self.inner.upgrade().map(|inner| Container { inner })
    }
}

impl Container {
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry computed at most once.
    pub fn register_value(&self, name: impl Into<String>, provider: impl Into<Provider>) {
        self.register(name, RegistrationKind::Value, provider);
    }

    /// Register an entry whose callable runs on every `get`.
    pub fn register_factory(&self, name: impl Into<String>, provider: impl Into<Provider>) {
        self.register(name, RegistrationKind::Factory, provider);
    }

    /// Register an entry computed at most once.
    pub fn register_singleton(&self, name: impl Into<String>, provider: impl Into<Provider>) {
        self.register(name, RegistrationKind::Singleton, provider);
    }

    /// Register `provider` under `name`, replacing any previous entry.
    ///
    /// A previously cached resolution of `name` is discarded with the entry.
    pub fn register(
        &self,
        name: impl Into<String>,
        kind: RegistrationKind,
        provider: impl Into<Provider>,
    ) {
        let name = name.into();
        let provider = provider.into();

        debug!(name = %name, kind = %kind, "[Container] Registering entry");

        let replaced = self
            .inner
            .registry
            .write()
            .insert(name.clone(), Registration::new(kind, provider))
            .is_some();

        if replaced {
            trace!(name = %name, "[Container] Replaced existing registration");
        }
    }

    /// Remove `name` and its cached resolution.
    ///
    /// Returns `true` if anything was removed.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.inner.registry.write().remove(name).is_some();
        if removed {
            debug!(name = %name, "[Container] Removed entry");
        }
        removed
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.registry.read().contains_key(name)
    }

    /// Whether `name` has a cached resolution.
    #[must_use]
    pub fn is_resolved(&self, name: &str) -> bool {
        self.inner
            .registry
            .read()
            .get(name)
            .is_some_and(Registration::is_resolved)
    }

    /// Kind of the registration under `name`.
    #[must_use]
    pub fn kind(&self, name: &str) -> Option<RegistrationKind> {
        self.inner.registry.read().get(name).map(|r| r.kind)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.registry.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.registry.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.registry.read().is_empty()
    }

    /// Resolve `name`.
    ///
    /// Returns `None` when nothing is registered under `name`. Callables run
    /// without any table lock held, so they may resolve other entries.
    /// A `Value` or `Singleton` callable runs at most once even when several
    /// threads race on the first `get`.
    pub fn get(&self, name: &str) -> Option<Resolved> {
        let registration = self.inner.registry.read().get(name).cloned()?;

        let Some(cell) = &registration.cache else {
            trace!(name = %name, kind = %registration.kind, "[Container] Resolved entry");
            return Some(self.resolve(&registration.provider));
        };

        if let Some(cached) = cell.get() {
            trace!(name = %name, "[Container] Cache hit");
            return Some(Arc::clone(cached));
        }

        let value = cell.get_or_init(|| {
            trace!(name = %name, kind = %registration.kind, "[Container] Resolved entry");
            self.resolve(&registration.provider)
        });
        Some(Arc::clone(value))
    }

    fn resolve(&self, provider: &Provider) -> Resolved {
        match provider {
            Provider::Instance(value) => Arc::clone(value),
            Provider::Callable(f) => f(),
            Provider::Injected(spec) => Injected::new(self.downgrade(), spec.clone()).call(),
        }
    }

    /// Resolve `name` and downcast it to `T`.
    ///
    /// `Ok(None)` when `name` is not registered; `TypeMismatch` when it
    /// resolves to something other than `T`.
    pub fn get_as<T>(&self, name: &str) -> Result<Option<Arc<T>>, ContainerError>
    where
        T: Any + Send + Sync,
    {
        match self.get(name) {
            None => Ok(None),
            Some(value) => {
                value
                    .downcast::<T>()
                    .map(Some)
                    .map_err(|_| ContainerError::TypeMismatch {
                        name: name.to_string(),
                        expected: type_name::<T>(),
                    })
            }
        }
    }

    /// Bind `f` to the entries named by `dependencies`.
    ///
    /// Nothing is resolved until the returned [`Injected`] is called.
    pub fn inject<T, F>(
        &self,
        dependencies: impl Into<Dependencies>,
        f: F,
    ) -> Result<Injected, ContainerError>
    where
        T: Any + Send + Sync,
        F: Fn(ResolvedArgs) -> T + Send + Sync + 'static,
    {
        Ok(self.inject_spec(InjectionSpec::new(dependencies, f)?))
    }

    /// Same as [`Container::inject`] for a pre-built spec.
    ///
    /// Specs are validated when they are built, so this cannot fail.
    #[must_use]
    pub fn inject_spec(&self, spec: InjectionSpec) -> Injected {
        Injected::new(self.downgrade(), spec)
    }

    /// Non-owning handle to this container.
    #[must_use]
    pub fn downgrade(&self) -> WeakContainer {
        WeakContainer {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether two handles share the same tables.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("names", &self.names())
            .field(
                "resolved",
                &self
                    .inner
                    .registry
                    .read()
                    .values()
                    .filter(|r| r.is_resolved())
                    .count(),
            )
            .finish()
    }
}
