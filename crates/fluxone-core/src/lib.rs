//! # Fluxone Core
//!
//! Flux data flow on top of a dependency-injection container.
//!
//! ## Components
//!
//! - [`Application`]: composition root owning the container
//! - [`ConfigManager`]: environment-scoped configuration
//! - [`Store`], [`Action`], [`Service`]: capabilities registered by name
//! - [`StoreSubscriptions`]: grouped change listeners for view code
//! - [`Renderer`]: contract for the external rendering collaborator
//!
//! ## Data Flow
//!
//! ```text
//! view ──execute_action──► Action ──emit──► EventBus ──► Store handlers
//!  ▲                                                           │
//!  └──────────────── change listeners ◄──── emit_changes ◄─────┘
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod action;
pub mod application;
pub mod config;
pub mod error;
pub mod ids;
pub mod render;
pub mod service;
pub mod site_title;
pub mod store;
pub mod subscriptions;

pub use action::{Action, ActionOutcome, AppLink};
pub use application::{
    Application, ApplicationBuilder, UtilBundle, WeakApplication, ACTIONS_PREFIX, CONFIG_KEY,
    EVENT_EMITTER_KEY, SERVICES_PREFIX, STORES_PREFIX, UTILS_PREFIX,
};
pub use config::{is_truthy, ConfigManager, Environment};
pub use error::{ErrorKind, FluxError, Result};
pub use ids::InstanceIds;
pub use render::{Location, RenderError, RenderRequest, Renderer, Routes};
pub use service::Service;
pub use site_title::SiteTitle;
pub use store::{ActionHandler, ActionHandlers, Store, StoreBuilder, StoreCore, StoreState};
pub use subscriptions::{StoreBindings, StoreSubscriptions};

// Re-exported so stores and actions need only this crate.
pub use fluxone_bus::{EventArgs, Handler, HandlerId};
pub use fluxone_container::{Provider, Resolved};
