//! # Positional Injection
//!
//! Binds a callable to named container entries. The entries are resolved each
//! time the returned [`Injected`] is called, never at bind time.
//!
//! ```text
//! container.inject(["foo", "bar"], f)      InjectionSpec::new(["foo", "bar"], f)?
//!              │                                        │
//!              └──────────────┬─────────────────────────┘
//!                             ▼
//!                    Injected::call()
//!                             │
//!          args = [get("foo"), get("bar")]   (absent entries → None)
//!                             │
//!                             ▼
//!                          f(args)
//! ```

use crate::container::WeakContainer;
use crate::error::ContainerError;
use crate::provider::Resolved;
use serde_json::Value as JsonValue;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased injection target.
pub type InjectFn = Arc<dyn Fn(ResolvedArgs) -> Resolved + Send + Sync>;

/// Names of the entries passed to an injected callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependencies {
    /// A single dependency, passed as the only argument.
    One(String),
    /// Several dependencies, passed positionally.
    Many(Vec<String>),
}

impl Dependencies {
    /// Dependency names in argument order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        match self {
            Self::One(name) => std::slice::from_ref(name),
            Self::Many(names) => names,
        }
    }

    /// Reject empty names.
    pub fn validate(&self) -> Result<(), ContainerError> {
        match self.names().iter().position(String::is_empty) {
            Some(index) => Err(ContainerError::invalid(format!(
                "dependency name at position {index} is empty"
            ))),
            None => Ok(()),
        }
    }

    /// Attach the callable, producing an [`InjectionSpec`].
    ///
    /// Fails with `InvalidArgument` when a name is empty.
    pub fn call<T, F>(self, f: F) -> Result<InjectionSpec, ContainerError>
    where
        T: Any + Send + Sync,
        F: Fn(ResolvedArgs) -> T + Send + Sync + 'static,
    {
        InjectionSpec::new(self, f)
    }
}

impl From<&str> for Dependencies {
    fn from(name: &str) -> Self {
        Self::One(name.to_string())
    }
}

impl From<String> for Dependencies {
    fn from(name: String) -> Self {
        Self::One(name)
    }
}

impl From<Vec<String>> for Dependencies {
    fn from(names: Vec<String>) -> Self {
        Self::Many(names)
    }
}

impl From<Vec<&str>> for Dependencies {
    fn from(names: Vec<&str>) -> Self {
        Self::Many(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Dependencies {
    fn from(names: &[&str]) -> Self {
        Self::Many(names.iter().map(|n| (*n).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Dependencies {
    fn from(names: [&str; N]) -> Self {
        Self::Many(names.iter().map(|n| (*n).to_string()).collect())
    }
}

impl TryFrom<&JsonValue> for Dependencies {
    type Error = ContainerError;

    /// Accepts a string or an array of strings.
    fn try_from(value: &JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::String(name) => Ok(Self::One(name.clone())),
            JsonValue::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        ContainerError::invalid(format!(
                            "dependency names must be strings, got {item}"
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Many),
            other => Err(ContainerError::invalid(format!(
                "dependencies must be a string or a list of strings, got {other}"
            ))),
        }
    }
}

/// Arguments resolved for one call of an injected callable.
///
/// Position `i` holds the entry named by dependency `i`, or `None` when that
/// name is not registered.
#[derive(Clone, Default)]
pub struct ResolvedArgs {
    names: Vec<String>,
    values: Vec<Option<Resolved>>,
}

impl ResolvedArgs {
    pub(crate) fn new(names: Vec<String>, values: Vec<Option<Resolved>>) -> Self {
        Self { names, values }
    }

    /// Downcast argument `index` to `T`.
    ///
    /// `None` when the index is out of range, the entry is absent, or the
    /// value has a different type.
    #[must_use]
    pub fn get<T>(&self, index: usize) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.raw(index)
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }

    /// Clone argument `index` out of its `Arc`.
    #[must_use]
    pub fn cloned<T>(&self, index: usize) -> Option<T>
    where
        T: Any + Send + Sync + Clone,
    {
        self.raw(index)
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    /// Type-erased argument `index`.
    #[must_use]
    pub fn raw(&self, index: usize) -> Option<&Resolved> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Dependency name at `index`.
    #[must_use]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for ResolvedArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present: Vec<_> = self
            .names
            .iter()
            .zip(&self.values)
            .map(|(name, value)| (name.as_str(), value.is_some()))
            .collect();
        f.debug_struct("ResolvedArgs")
            .field("present", &present)
            .finish()
    }
}

/// A dependency list bound to the callable that consumes it.
///
/// Replaces the "array whose last element is the function" notation with an
/// explicit value.
#[derive(Clone)]
pub struct InjectionSpec {
    dependencies: Dependencies,
    callable: InjectFn,
}

impl InjectionSpec {
    /// Bind `f` to `dependencies`.
    ///
    /// Fails with `InvalidArgument` when a name is empty.
    pub fn new<T, F>(dependencies: impl Into<Dependencies>, f: F) -> Result<Self, ContainerError>
    where
        T: Any + Send + Sync,
        F: Fn(ResolvedArgs) -> T + Send + Sync + 'static,
    {
        Self::from_fn(
            dependencies,
            Arc::new(move |args| Arc::new(f(args)) as Resolved),
        )
    }

    /// Bind an already type-erased callable.
    pub fn from_fn(
        dependencies: impl Into<Dependencies>,
        callable: InjectFn,
    ) -> Result<Self, ContainerError> {
        let dependencies = dependencies.into();
        dependencies.validate()?;
        Ok(Self {
            dependencies,
            callable,
        })
    }

    /// Start an incremental spec.
    #[must_use]
    pub fn builder() -> InjectionSpecBuilder {
        InjectionSpecBuilder::default()
    }

    #[must_use]
    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    pub(crate) fn callable(&self) -> &InjectFn {
        &self.callable
    }
}

impl fmt::Debug for InjectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionSpec")
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Builds an [`InjectionSpec`] one dependency at a time.
#[derive(Default)]
pub struct InjectionSpecBuilder {
    dependencies: Vec<String>,
    callable: Option<InjectFn>,
}

impl InjectionSpecBuilder {
    /// Append a dependency name.
    #[must_use]
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    /// Set the callable that receives the resolved dependencies.
    #[must_use]
    pub fn callable<T, F>(mut self, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(ResolvedArgs) -> T + Send + Sync + 'static,
    {
        self.callable = Some(Arc::new(move |args| Arc::new(f(args)) as Resolved));
        self
    }

    /// Finish the spec.
    ///
    /// Fails with `InvalidArgument` when no callable was set or a name is
    /// empty.
    pub fn build(self) -> Result<InjectionSpec, ContainerError> {
        let callable = self
            .callable
            .ok_or_else(|| ContainerError::invalid("injection spec has no callable"))?;
        InjectionSpec::from_fn(Dependencies::Many(self.dependencies), callable)
    }
}

/// Deferred call produced by [`Container::inject`](crate::Container::inject).
///
/// Holds the container weakly; once the container is gone every dependency
/// resolves to `None`.
#[derive(Clone)]
pub struct Injected {
    container: WeakContainer,
    spec: InjectionSpec,
}

impl Injected {
    pub(crate) fn new(container: WeakContainer, spec: InjectionSpec) -> Self {
        Self { container, spec }
    }

    /// Resolve the dependencies now and invoke the callable.
    pub fn call(&self) -> Resolved {
        let names = self.spec.dependencies().names().to_vec();
        let values = match self.container.upgrade() {
            Some(container) => names.iter().map(|name| container.get(name)).collect(),
            None => vec![None; names.len()],
        };
        (self.spec.callable())(ResolvedArgs::new(names, values))
    }

    /// Like [`Injected::call`], downcasting the result.
    #[must_use]
    pub fn call_as<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.call().downcast::<T>().ok()
    }

    #[must_use]
    pub fn dependencies(&self) -> &Dependencies {
        self.spec.dependencies()
    }
}

impl fmt::Debug for Injected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injected")
            .field("dependencies", self.spec.dependencies())
            .finish_non_exhaustive()
    }
}
