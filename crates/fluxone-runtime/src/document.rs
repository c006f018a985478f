//! # Server and Client Passes
//!
//! The server pass renders a URL and embeds the saved store state in the
//! document. The client pass reads that state back and hydrates a fresh
//! application with it.
//!
//! ```text
//! server: bootstrap ─► render_server(url) ─► save_state ─► document
//!                                                              │
//! client: extract_state(document) ─► hydrate ─► render_client ◄┘
//! ```

use crate::bootstrap::Bootstrap;
use crate::view::escape_html;
use fluxone_core::{Application, Environment, FluxError, Result, StoreState};
use serde_json::{json, Value};
use tracing::debug;

/// Assignment that carries the state in the document.
pub const STATE_MARKER: &str = "window.__serverState = ";

/// Id of the element the page is rendered into.
pub const ROOT_ELEMENT_ID: &str = "fluxoneRoot";

const SCRIPT_END: &str = "</script>";

/// Render `url` and wrap it in a complete document.
///
/// The document's language comes from `main.defaultLang` and its title
/// from the site title. The state of every store is embedded as
/// `window.__serverState`.
pub fn render_document(app: &Application, url: &str) -> Result<String> {
    let content = app.render_server(url, json!({}))?;
    let state = app.save_state()?;

    let lang = app
        .config("main")
        .and_then(|main| main.get("defaultLang").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| "en".to_string());
    let title = app.page_title().unwrap_or_default();

    let document = format!(
        "<!DOCTYPE html>\n\
         <html lang=\"{lang}\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         </head>\n\
         <body>\n\
         <div id=\"{ROOT_ELEMENT_ID}\">{content}</div>\n\
         <script>{STATE_MARKER}{state};{SCRIPT_END}\n\
         </body>\n\
         </html>\n",
        lang = escape_html(&lang),
        title = escape_html(&title),
        state = embed_state(&state)?,
    );

    debug!(url = %url, bytes = document.len(), "Document rendered");
    Ok(document)
}

/// Serialize `state` so it can sit inside a script element.
fn embed_state(state: &StoreState) -> Result<String> {
    let json = serde_json::to_string(state)
        .map_err(|e| FluxError::InvalidArgument(format!("cannot serialize state: {e}")))?;
    Ok(json.replace("</", "<\\/"))
}

/// Recover the state embedded by [`render_document`].
pub fn extract_state(document: &str) -> Result<StoreState> {
    let start = document
        .find(STATE_MARKER)
        .map(|at| at + STATE_MARKER.len())
        .ok_or_else(|| FluxError::InvalidArgument("document carries no server state".into()))?;

    let rest = &document[start..];
    let end = rest
        .find(SCRIPT_END)
        .ok_or_else(|| FluxError::InvalidArgument("unterminated server state script".into()))?;
    let json = rest[..end].trim().trim_end_matches(';');

    serde_json::from_str(json)
        .map_err(|e| FluxError::InvalidArgument(format!("malformed server state: {e}")))
}

/// Bootstrap a client application for `env` and restore `state` into it.
pub fn hydrate(env: Environment, state: &StoreState) -> Result<Application> {
    Bootstrap::new(env).hydrate(state)
}
