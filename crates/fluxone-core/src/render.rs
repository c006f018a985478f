//! # Rendering Contract
//!
//! The core never produces markup itself. A [`Renderer`] installed on the
//! Application receives the route table, a location and root props.
//!
//! ```text
//! render_server(url, props) ──► RenderRequest { location: Url(url) }     ─┐
//!                                                                         ├─► Renderer::render
//! render_client(props)      ──► RenderRequest { location: History }      ─┘
//! ```

use crate::application::Application;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

/// Opaque route table handed through to the renderer.
pub type Routes = Arc<dyn Any + Send + Sync>;

/// Where the render pass takes its location from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Server pass: the requested URL.
    Url(String),
    /// Client pass: the browser history.
    History,
}

impl Location {
    /// The URL of a server pass.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            Self::History => None,
        }
    }
}

/// Everything a renderer gets for one pass.
pub struct RenderRequest {
    pub app: Application,
    pub routes: Option<Routes>,
    pub location: Location,
    pub props: Value,
}

impl RenderRequest {
    /// Downcast the route table.
    #[must_use]
    pub fn routes_as<T>(&self) -> Option<&T>
    where
        T: Any + Send + Sync,
    {
        self.routes.as_ref().and_then(|r| r.downcast_ref::<T>())
    }
}

/// Rendering failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    /// No route matches the location.
    #[error("No route matches '{0}'")]
    NoRoute(String),

    #[error("Render failed: {0}")]
    Failed(String),
}

/// Produces output for a render request.
pub trait Renderer: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<String, RenderError>;
}

impl<F> Renderer for F
where
    F: Fn(&RenderRequest) -> Result<String, RenderError> + Send + Sync,
{
    fn render(&self, request: &RenderRequest) -> Result<String, RenderError> {
        self(request)
    }
}
