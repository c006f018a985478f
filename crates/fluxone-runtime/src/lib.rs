//! # Fluxone Runtime
//!
//! Ready-made composition of a Fluxone application and the two render
//! passes around it.
//!
//! ## Modules
//!
//! - `bootstrap` - default config and utilities, demo registrations
//! - `hello_world` - demo store and action
//! - `view` - route table and demo renderer
//! - `document` - server document with embedded state, client hydration
//! - `response` - the `response` utility

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod bootstrap;
pub mod document;
pub mod hello_world;
pub mod response;
pub mod view;

pub use bootstrap::{bootstrap, default_config, merge_config, Bootstrap};
pub use document::{extract_state, hydrate, render_document, ROOT_ELEMENT_ID, STATE_MARKER};
pub use hello_world::{
    HelloWorldAction, HelloWorldData, HelloWorldStore, HELLO_WORLD_ACTION, HELLO_WORLD_CHANGE,
    HELLO_WORLD_STORE,
};
pub use response::{ResponseUtils, RESPONSE_UTIL};
pub use view::{HelloWorldView, Route, RouteTable};
