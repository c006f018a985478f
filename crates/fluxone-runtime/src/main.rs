//! # Fluxone Runtime
//!
//! Runs both passes of the demo application in one process.
//!
//! ## Sequence
//!
//! 1. Initialize logging and metrics
//! 2. Server pass: bootstrap, render the requested URL into a document
//! 3. Client pass: extract the embedded state, hydrate a fresh application
//! 4. Tick the `helloWorldChange` action and print every store change
//! 5. Print the metrics
//!
//! ## Usage
//!
//! ```text
//! fluxone-runtime [URL]
//! ```
//!
//! `FLUXONE_TICKS` sets how many times the action runs (default 3) and
//! `FLUXONE_TICK_MS` the pause between runs (default 2000).

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use fluxone_core::{Environment, EventArgs, StoreBindings, StoreSubscriptions};
use fluxone_runtime::{
    bootstrap, extract_state, hydrate, render_document, HelloWorldStore, HELLO_WORLD_ACTION,
    HELLO_WORLD_STORE,
};
use fluxone_telemetry::{gather_metrics, init_logging, register_metrics, TelemetryConfig};
use serde_json::Value;
use tracing::{info, warn};

fn env_number(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, default, "Ignoring non-numeric setting");
            default
        }),
        Err(_) => default,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_logging(&telemetry).context("failed to initialize logging")?;
    register_metrics().context("failed to register metrics")?;

    let env = Environment::from_env();
    let url = std::env::args().nth(1).unwrap_or_else(|| "/".to_string());
    info!(service = %telemetry.service_name, env = %env, url = %url, "Starting Fluxone runtime");

    // Server pass
    let server = bootstrap(env.clone()).context("failed to bootstrap the server application")?;
    let document = render_document(&server, &url).context("failed to render the document")?;
    println!("{document}");
    drop(server);

    // Client pass
    let state = extract_state(&document).context("failed to read the embedded state")?;
    let client = hydrate(env, &state).context("failed to hydrate the client application")?;
    println!("{}", client.render_client(Value::Null)?);

    let bindings = StoreBindings::all(
        [HELLO_WORLD_STORE],
        Arc::new(|args: &EventArgs| {
            if let Some(store) = args.downcast_ref::<HelloWorldStore>() {
                println!("{}", store.data().sentence());
            }
        }),
    );
    let _subscriptions = StoreSubscriptions::attach(&client, bindings)?;

    let ticks = env_number("FLUXONE_TICKS", 3);
    let period = Duration::from_millis(env_number("FLUXONE_TICK_MS", 2000));
    let mut interval = tokio::time::interval(period);
    interval.tick().await;
    for _ in 0..ticks {
        interval.tick().await;
        client
            .execute_action(HELLO_WORLD_ACTION, Value::Null)?
            .resolve()
            .await?;
    }

    print!("{}", gather_metrics().context("failed to gather metrics")?);
    info!(ticks, "Fluxone runtime finished");
    Ok(())
}
