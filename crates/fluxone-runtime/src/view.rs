//! # Demo View
//!
//! Route table and renderer for the hello-world page.
//!
//! ```text
//! RenderRequest ──► RouteTable::resolve(path) ──► HelloWorldStore::data ──► markup
//! ```

use crate::hello_world::{HelloWorldStore, HELLO_WORLD_STORE};
use fluxone_core::{Location, RenderError, RenderRequest, Renderer};

/// One named path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: String,
    pub path: String,
}

/// Ordered list of routes, first match wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes of the demo application.
    #[must_use]
    pub fn demo() -> Self {
        Self::new().route("app", "/")
    }

    #[must_use]
    pub fn route(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.routes.push(Route {
            name: name.into(),
            path: normalize(&path.into()).to_string(),
        });
        self
    }

    /// Route matching `url`, ignoring query string, fragment and trailing
    /// slashes.
    #[must_use]
    pub fn resolve(&self, url: &str) -> Option<&Route> {
        let path = normalize(url);
        self.routes.iter().find(|route| route.path == path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn normalize(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = url[..end].trim_end_matches('/');
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

/// Renders the hello-world page from the application's demo store.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelloWorldView;

impl Renderer for HelloWorldView {
    fn render(&self, request: &RenderRequest) -> Result<String, RenderError> {
        let path = match &request.location {
            Location::Url(url) => url.as_str(),
            Location::History => "/",
        };

        let routes = request
            .routes_as::<RouteTable>()
            .ok_or_else(|| RenderError::Failed("no route table installed".into()))?;
        if routes.resolve(path).is_none() {
            return Err(RenderError::NoRoute(path.to_string()));
        }

        let store = request
            .app
            .get_store_as::<HelloWorldStore>(HELLO_WORLD_STORE)
            .ok_or_else(|| RenderError::Failed(format!("store {HELLO_WORLD_STORE} is missing")))?;

        Ok(format!(
            "<div><h1>Welcome to fluxone</h1><h3>{}</h3></div>",
            escape_html(&store.data().sentence())
        ))
    }
}

/// Escape text for use inside HTML elements and attributes.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
