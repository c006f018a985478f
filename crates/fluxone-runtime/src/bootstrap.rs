//! # Bootstrap
//!
//! Builds a fully wired [`Application`]: default configuration, default
//! utilities, the demo route table and renderer, the demo store and action.
//!
//! ## Composition Order
//!
//! ```text
//! 1. Config: defaults first, caller entries override by name
//! 2. Utils:  `response` first, caller utilities override by name
//! 3. Application::builder() (event bus + config singletons, site title)
//! 4. HelloWorldStore, HelloWorldAction
//! ```

use crate::hello_world::{HelloWorldAction, HelloWorldStore};
use crate::response::{ResponseUtils, RESPONSE_UTIL};
use crate::view::{HelloWorldView, RouteTable};
use fluxone_core::{
    Application, Environment, FluxError, Provider, Renderer, Result, Routes, StoreBuilder,
    StoreState, UtilBundle,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Default `main` settings, one variant per environment.
#[must_use]
pub fn default_config() -> Value {
    let main = json!({
        "baseTitle": "fluxone app",
        "titleSeparator": " | ",
        "defaultLang": "en"
    });

    json!({
        "main": {
            "development": main.clone(),
            "testing": main.clone(),
            "production": main
        }
    })
}

/// Concatenate two bundles into one `{name, content}` list, `overrides`
/// last so its entries win.
pub fn merge_config(defaults: &Value, overrides: &Value) -> Result<Value> {
    let mut entries = bundle_entries(defaults)?;
    entries.extend(bundle_entries(overrides)?);
    Ok(Value::Array(entries))
}

fn bundle_entries(bundle: &Value) -> Result<Vec<Value>> {
    match bundle {
        Value::Null => Ok(Vec::new()),
        Value::Object(entries) => Ok(entries
            .iter()
            .map(|(name, content)| json!({ "name": name, "content": content }))
            .collect()),
        Value::Array(entries) => Ok(entries.clone()),
        _ => Err(FluxError::InvalidArgument(
            "Invalid config bundle, it must be an array or object.".into(),
        )),
    }
}

/// Options for [`Bootstrap::build`].
pub struct Bootstrap {
    env: Environment,
    config: Value,
    utils: UtilBundle,
    renderer: Arc<dyn Renderer>,
    routes: Routes,
}

impl Bootstrap {
    /// Defaults for `env`: demo routes, [`HelloWorldView`], the `response`
    /// utility.
    #[must_use]
    pub fn new(env: Environment) -> Self {
        Self {
            env,
            config: Value::Null,
            utils: UtilBundle::new().with(RESPONSE_UTIL, Provider::value(ResponseUtils)),
            renderer: Arc::new(HelloWorldView),
            routes: Arc::new(RouteTable::demo()),
        }
    }

    /// Caller configuration, applied over the defaults.
    #[must_use]
    pub fn config(mut self, bundle: Value) -> Self {
        self.config = bundle;
        self
    }

    /// Add or replace a utility.
    #[must_use]
    pub fn util(mut self, name: impl Into<String>, util: impl Into<Provider>) -> Self {
        self.utils.push(name, util);
        self
    }

    #[must_use]
    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    #[must_use]
    pub fn routes(mut self, routes: Routes) -> Self {
        self.routes = routes;
        self
    }

    pub fn build(self) -> Result<Application> {
        let config = merge_config(&default_config(), &self.config)?;

        let app = Application::builder()
            .env(self.env)
            .config(config)
            .utils(self.utils)
            .renderer(self.renderer)
            .routes(self.routes)
            .build()?;

        app.add_store(HelloWorldStore::build_with(StoreBuilder::new().app(&app)))?;
        app.add_action(HelloWorldAction::new());

        info!(env = %app.env(), stores = ?app.store_names(), "Application bootstrapped");
        Ok(app)
    }

    /// Build, then restore `state` into every store.
    pub fn hydrate(self, state: &StoreState) -> Result<Application> {
        let app = self.build()?;
        app.restore_state(state)?;
        info!(entries = state.len(), "Application hydrated");
        Ok(app)
    }
}

/// Bootstrap with the default options.
pub fn bootstrap(env: Environment) -> Result<Application> {
    Bootstrap::new(env).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hello_world::{HELLO_WORLD_ACTION, HELLO_WORLD_STORE};

    #[test]
    fn test_default_main_config() {
        let app = bootstrap(Environment::Testing).unwrap();

        assert_eq!(
            app.config("main"),
            Some(json!({ "baseTitle": "fluxone app", "titleSeparator": " | ", "defaultLang": "en" }))
        );
        assert_eq!(app.page_title().as_deref(), Some("fluxone app"));
    }

    #[test]
    fn test_caller_config_overrides_defaults() {
        let app = Bootstrap::new(Environment::Production)
            .config(json!({
                "main": { "production": { "baseTitle": "shop", "titleSeparator": " - " } },
                "api": "https://api"
            }))
            .build()
            .unwrap();

        app.set_page_title("cart");
        assert_eq!(app.page_title().as_deref(), Some("shop - cart"));
        assert_eq!(app.config("api"), Some(json!("https://api")));
    }

    #[test]
    fn test_list_config_is_accepted() {
        let app = Bootstrap::new(Environment::Development)
            .config(json!([{ "name": "api", "content": "http://localhost" }]))
            .build()
            .unwrap();

        assert_eq!(app.config("api"), Some(json!("http://localhost")));
        assert!(app.config("main").is_some());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = Bootstrap::new(Environment::Development)
            .config(json!(42))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), fluxone_core::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_demo_registrations() {
        let app = bootstrap(Environment::Testing).unwrap();

        assert_eq!(app.store_names(), [HELLO_WORLD_STORE]);
        assert!(app.get_action(HELLO_WORLD_ACTION).is_some());
        assert!(app.has_renderer());

        let response = app.util_as::<ResponseUtils>(RESPONSE_UTIL).unwrap().unwrap();
        assert!(response.parse_json(500, "{}").is_err());
    }

    #[test]
    fn test_caller_util_replaces_default() {
        let app = Bootstrap::new(Environment::Testing)
            .util(RESPONSE_UTIL, Provider::value(7_u32))
            .build()
            .unwrap();

        assert_eq!(app.util_as::<u32>(RESPONSE_UTIL).unwrap().as_deref(), Some(&7));
    }

    #[test]
    fn test_hydrate_restores_state() {
        let mut state = StoreState::new();
        state.insert(
            "helloWorldData".into(),
            json!({ "subject": "flux", "adjective": "the future" }),
        );

        let app = Bootstrap::new(Environment::Testing).hydrate(&state).unwrap();
        let store = app.get_store_as::<HelloWorldStore>(HELLO_WORLD_STORE).unwrap();
        assert_eq!(store.data().sentence(), "flux is the future!");
    }
}
