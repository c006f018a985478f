//! # Hello World Demo
//!
//! A store holding a `{subject, adjective}` pair and the action that asks
//! it for a new one.
//!
//! ```text
//! execute_action("helloWorldChange")
//!        │
//!        ▼
//! emit(HELLO_WORLD_CHANGE) ──► HelloWorldStore::on_change ──► emit_changes()
//! ```

use fluxone_core::{
    Action, ActionHandler, ActionHandlers, ActionOutcome, AppLink, EventArgs, FluxError, Result,
    Store, StoreBuilder, StoreCore, StoreState,
};
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Event the store listens on.
pub const HELLO_WORLD_CHANGE: &str = "HELLO_WORLD_CHANGE";

/// Name of the demo store.
pub const HELLO_WORLD_STORE: &str = "HelloWorldStore";

/// Name of the demo action.
pub const HELLO_WORLD_ACTION: &str = "helloWorldChange";

/// Key of the store's entry in the saved state.
pub const STATE_KEY: &str = "helloWorldData";

pub const SUBJECTS: &[&str] = &[
    "Isomorphism",
    "React",
    "Node",
    "io.js",
    "flux",
    "React router",
    "Jade",
    "Stylus",
    "express",
    "ES2015",
    "javascript",
];

pub const ADJECTIVES: &[&str] = &[
    "awesome",
    "great",
    "fast",
    "flexible",
    "the future",
    "the best",
    "easy",
    "incredible",
    "unbelievable",
    "very good",
];

/// What the demo view shows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HelloWorldData {
    pub subject: String,
    pub adjective: String,
}

impl HelloWorldData {
    /// `"<subject> is <adjective>!"`
    #[must_use]
    pub fn sentence(&self) -> String {
        format!("{} is {}!", self.subject, self.adjective)
    }
}

/// Demo store.
pub struct HelloWorldStore {
    core: StoreCore,
    data: RwLock<HelloWorldData>,
    generations: AtomicUsize,
}

impl HelloWorldStore {
    /// Build with the global id allocator and no extra handlers.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::build_with(StoreBuilder::new())
    }

    pub fn build_with(builder: StoreBuilder<'_>) -> Arc<Self> {
        builder.build(|core| Self {
            core,
            data: RwLock::new(HelloWorldData::default()),
            generations: AtomicUsize::new(0),
        })
    }

    #[must_use]
    pub fn data(&self) -> HelloWorldData {
        self.data.read().clone()
    }

    /// How many pairs this store has generated.
    #[must_use]
    pub fn generations(&self) -> usize {
        self.generations.load(Ordering::SeqCst)
    }

    /// The first pair is always the first subject and adjective.
    fn generate(&self) -> HelloWorldData {
        let generation = self.generations.fetch_add(1, Ordering::SeqCst);
        if generation == 0 {
            return HelloWorldData {
                subject: SUBJECTS[0].to_string(),
                adjective: ADJECTIVES[0].to_string(),
            };
        }

        let mut rng = rand::thread_rng();
        HelloWorldData {
            subject: SUBJECTS.choose(&mut rng).copied().unwrap_or(SUBJECTS[0]).to_string(),
            adjective: ADJECTIVES
                .choose(&mut rng)
                .copied()
                .unwrap_or(ADJECTIVES[0])
                .to_string(),
        }
    }

    fn on_change(&self, _args: &EventArgs) {
        let data = self.generate();
        debug!(subject = %data.subject, adjective = %data.adjective, "Hello world data changed");
        *self.data.write() = data;
        self.emit_changes();
    }
}

impl Store for HelloWorldStore {
    fn name(&self) -> &str {
        HELLO_WORLD_STORE
    }

    fn core(&self) -> &StoreCore {
        &self.core
    }

    fn default_handlers() -> ActionHandlers {
        ActionHandlers::new().on(HELLO_WORLD_CHANGE, ActionHandler::method(Self::on_change))
    }

    fn initialize(&self) {
        *self.data.write() = self.generate();
    }

    fn save_state(&self) -> Result<StoreState> {
        let data = serde_json::to_value(self.data())
            .map_err(|e| FluxError::InvalidArgument(format!("cannot save {STATE_KEY}: {e}")))?;

        let mut state = StoreState::new();
        state.insert(STATE_KEY.to_string(), data);
        Ok(state)
    }

    /// A state without `helloWorldData` leaves the current data in place.
    fn restore_state(&self, state: &StoreState) -> Result<()> {
        let Some(entry) = state.get(STATE_KEY).cloned() else {
            debug!(key = STATE_KEY, "No saved state, keeping generated data");
            return Ok(());
        };
        let data: HelloWorldData = serde_json::from_value(entry).map_err(|e| {
            FluxError::InvalidArgument(format!("cannot restore {STATE_KEY}: {e}"))
        })?;

        *self.data.write() = data;
        Ok(())
    }
}

/// Demo action: asks the store for a new pair.
#[derive(Debug, Default)]
pub struct HelloWorldAction {
    link: AppLink,
}

impl HelloWorldAction {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl Action for HelloWorldAction {
    fn name(&self) -> &str {
        HELLO_WORLD_ACTION
    }

    fn app_link(&self) -> &AppLink {
        &self.link
    }

    fn execute(&self, _payload: Value) -> Result<ActionOutcome> {
        let app = self.link.require()?;
        app.emit_value(HELLO_WORLD_CHANGE, Value::Null);
        Ok(ActionOutcome::done())
    }
}
