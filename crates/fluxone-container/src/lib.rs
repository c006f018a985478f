//! # Fluxone Container - Dependency Injection Registry
//!
//! A string-keyed registry with three registration kinds and a positional
//! injection helper.
//!
//! ## Registration Kinds
//!
//! | Kind | Callable provider | Plain provider | Cached |
//! |------|-------------------|----------------|--------|
//! | `Value` | invoked once on first `get` | returned as is | yes |
//! | `Singleton` | invoked once on first `get` | returned as is | yes |
//! | `Factory` | invoked on every `get` | returned as is | no |
//!
//! ## Usage
//!
//! ```rust,ignore
//! let container = Container::new();
//! container.register_value("greeting", Provider::value("hello".to_string()));
//! container.register_factory("request-id", Provider::lazy(next_request_id));
//!
//! let shout = container.inject(["greeting"], |args| {
//!     args.get::<String>(0).map(|s| s.to_uppercase())
//! })?;
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod container;
pub mod error;
pub mod injection;
pub mod provider;

pub use container::{Container, WeakContainer};
pub use error::ContainerError;
pub use injection::{
    Dependencies, InjectFn, Injected, InjectionSpec, InjectionSpecBuilder, ResolvedArgs,
};
pub use provider::{LazyFn, Provider, RegistrationKind, Resolved};
