//! # Actions
//!
//! Named units of behavior registered under `action.<name>` and executed by
//! name through [`Application::execute_action`].

use crate::application::{Application, WeakApplication};
use crate::error::{FluxError, Result};
use futures::future::BoxFuture;
use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;

/// Non-owning link from an action or service back to its application.
#[derive(Default)]
pub struct AppLink {
    app: RwLock<Option<WeakApplication>>,
}

impl AppLink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A link already pointing at `app`.
    #[must_use]
    pub fn to(app: &Application) -> Self {
        let link = Self::new();
        link.attach(app);
        link
    }

    /// Point the link at `app`.
    pub fn attach(&self, app: &Application) {
        *self.app.write() = Some(app.downgrade());
    }

    /// The application, if linked and still alive.
    #[must_use]
    pub fn app(&self) -> Option<Application> {
        self.app.read().as_ref().and_then(WeakApplication::upgrade)
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.app().is_some()
    }

    /// The application, or `ContractViolation` when unlinked.
    pub fn require(&self) -> Result<Application> {
        self.app().ok_or_else(|| {
            FluxError::ContractViolation("not attached to an application".into())
        })
    }
}

impl fmt::Debug for AppLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppLink")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Result of [`Action::execute`].
///
/// The synchronous part of an action has finished by the time an outcome
/// exists. A `Pending` outcome is left for the caller to await.
pub enum ActionOutcome {
    Done(Option<Value>),
    Pending(BoxFuture<'static, Result<Value>>),
}

impl ActionOutcome {
    /// Finished, nothing to report.
    #[must_use]
    pub fn done() -> Self {
        Self::Done(None)
    }

    /// Finished with a value.
    #[must_use]
    pub fn value(value: Value) -> Self {
        Self::Done(Some(value))
    }

    /// Continue asynchronously.
    pub fn pending<F>(future: F) -> Self
    where
        F: std::future::Future<Output = Result<Value>> + Send + 'static,
    {
        Self::Pending(Box::pin(future))
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Await the outcome. Errors of a pending outcome are returned unchanged.
    pub async fn resolve(self) -> Result<Option<Value>> {
        match self {
            Self::Done(value) => Ok(value),
            Self::Pending(future) => future.await.map(Some),
        }
    }
}

impl fmt::Debug for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done(value) => f.debug_tuple("Done").field(value).finish(),
            Self::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// Flux action capability.
pub trait Action: Send + Sync + 'static {
    /// Identifier used for the `action.<name>` container key.
    fn name(&self) -> &str;

    fn app_link(&self) -> &AppLink;

    /// Run the action.
    fn execute(&self, _payload: Value) -> Result<ActionOutcome> {
        Err(FluxError::NotImplemented(format!(
            "action '{}' has not been implemented yet",
            self.name()
        )))
    }

    fn app(&self) -> Option<Application> {
        self.app_link().app()
    }
}
