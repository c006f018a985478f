//! # Providers
//!
//! What a registration holds: a ready value, a zero-argument callable, or a
//! positional injection spec.

use crate::injection::InjectionSpec;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A resolved, type-erased value shared by every caller of `get`.
pub type Resolved = Arc<dyn Any + Send + Sync>;

/// Zero-argument callable producing a resolved value.
pub type LazyFn = Arc<dyn Fn() -> Resolved + Send + Sync>;

/// How a registration behaves on resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationKind {
    /// Computed once, then cached.
    Value,
    /// Re-evaluated on every `get`.
    Factory,
    /// Computed once, then cached.
    Singleton,
}

impl RegistrationKind {
    /// Whether resolutions of this kind are memoized.
    #[must_use]
    pub fn caches(&self) -> bool {
        matches!(self, Self::Value | Self::Singleton)
    }

    /// Label used in logs and metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Factory => "factory",
            Self::Singleton => "singleton",
        }
    }
}

impl fmt::Display for RegistrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a registration.
#[derive(Clone)]
pub enum Provider {
    /// A value used verbatim.
    Instance(Resolved),
    /// A callable invoked with no arguments to produce the value.
    Callable(LazyFn),
    /// A callable whose arguments are resolved from the container.
    Injected(InjectionSpec),
}

impl Provider {
    /// Wrap a plain value.
    pub fn value<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self::Instance(Arc::new(value))
    }

    /// Register an already shared value without wrapping it again.
    pub fn shared<T>(value: Arc<T>) -> Self
    where
        T: Any + Send + Sync,
    {
        Self::Instance(value)
    }

    /// Use an already type-erased value.
    pub fn resolved(value: Resolved) -> Self {
        Self::Instance(value)
    }

    /// Wrap a callable whose return value becomes the resolution.
    pub fn lazy<T, F>(f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::Callable(Arc::new(move || Arc::new(f()) as Resolved))
    }

    /// Like [`Provider::lazy`] for callables that already return an `Arc`.
    pub fn lazy_shared<T, F>(f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        Self::Callable(Arc::new(move || f() as Resolved))
    }

    /// Whether resolving this provider invokes a callable.
    #[must_use]
    pub fn is_callable(&self) -> bool {
        !matches!(self, Self::Instance(_))
    }
}

impl From<InjectionSpec> for Provider {
    fn from(spec: InjectionSpec) -> Self {
        Self::Injected(spec)
    }
}

impl From<LazyFn> for Provider {
    fn from(f: LazyFn) -> Self {
        Self::Callable(f)
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(_) => f.write_str("Provider::Instance"),
            Self::Callable(_) => f.write_str("Provider::Callable"),
            Self::Injected(spec) => f
                .debug_tuple("Provider::Injected")
                .field(&spec.dependencies())
                .finish(),
        }
    }
}
