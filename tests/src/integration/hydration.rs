//! # Hydration Flows
//!
//! State saved by a server application and restored into a separate client
//! application, both through the plain state mapping and through a rendered
//! document.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fluxone_core::{
        Application, Environment, ErrorKind, InstanceIds, Result, Store, StoreBuilder, StoreCore,
        StoreState,
    };
    use fluxone_runtime::{
        bootstrap, extract_state, hydrate, render_document, HelloWorldStore, HELLO_WORLD_ACTION,
        HELLO_WORLD_STORE,
    };
    use parking_lot::RwLock;
    use serde_json::{json, Value};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Store persisting one key.
    struct KeyStore {
        core: StoreCore,
        name: &'static str,
        key: &'static str,
        value: RwLock<Value>,
        seen: RwLock<Option<StoreState>>,
    }

    impl KeyStore {
        fn build(
            ids: &InstanceIds,
            name: &'static str,
            key: &'static str,
            value: Value,
        ) -> Arc<Self> {
            StoreBuilder::new().ids(ids).build(|core| Self {
                core,
                name,
                key,
                value: RwLock::new(value),
                seen: RwLock::new(None),
            })
        }
    }

    impl Store for KeyStore {
        fn name(&self) -> &str {
            self.name
        }

        fn core(&self) -> &StoreCore {
            &self.core
        }

        fn save_state(&self) -> Result<StoreState> {
            let mut state = StoreState::new();
            state.insert(self.key.to_string(), self.value.read().clone());
            Ok(state)
        }

        fn restore_state(&self, state: &StoreState) -> Result<()> {
            *self.seen.write() = Some(state.clone());
            if let Some(value) = state.get(self.key) {
                *self.value.write() = value.clone();
            }
            Ok(())
        }
    }

    /// Store without hydration hooks.
    struct PlainStore {
        core: StoreCore,
    }

    impl Store for PlainStore {
        fn name(&self) -> &str {
            "plain"
        }

        fn core(&self) -> &StoreCore {
            &self.core
        }
    }

    fn app() -> Application {
        Application::new(&Value::Null, Environment::Testing).unwrap()
    }

    // =============================================================================
    // INTEGRATION TESTS: STATE MAPPING
    // =============================================================================

    #[test]
    fn test_round_trip_between_applications() {
        let ids = InstanceIds::new();

        let server = app();
        server
            .add_store(KeyStore::build(&ids, "cart", "cartItems", json!([1, 2])))
            .unwrap();
        server
            .add_store(KeyStore::build(&ids, "user", "userName", json!("ada")))
            .unwrap();
        let state = server.save_state().unwrap();

        let wire = serde_json::to_string(&state).unwrap();
        let state: StoreState = serde_json::from_str(&wire).unwrap();

        let client = app();
        let cart = KeyStore::build(&ids, "cart", "cartItems", Value::Null);
        let user = KeyStore::build(&ids, "user", "userName", Value::Null);
        client.add_store(Arc::clone(&cart)).unwrap();
        client.add_store(Arc::clone(&user)).unwrap();
        client.restore_state(&state).unwrap();

        assert_eq!(*cart.value.read(), json!([1, 2]));
        assert_eq!(*user.value.read(), json!("ada"));

        // Every store sees the whole mapping.
        assert_eq!(cart.seen.read().as_ref(), Some(&state));
        assert_eq!(user.seen.read().as_ref(), Some(&state));
    }

    #[test]
    fn test_later_store_wins_on_collision() {
        let ids = InstanceIds::new();
        let app = app();
        app.add_store(KeyStore::build(&ids, "a", "shared", json!("first")))
            .unwrap();
        app.add_store(KeyStore::build(&ids, "b", "shared", json!("second")))
            .unwrap();

        let state = app.save_state().unwrap();
        assert_eq!(state.get("shared"), Some(&json!("second")));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_store_without_hooks_fails_loudly() {
        let ids = InstanceIds::new();
        let app = app();
        app.add_store(KeyStore::build(&ids, "a", "k", json!(1)))
            .unwrap();
        app.add_store(StoreBuilder::new().ids(&ids).build(|core| PlainStore { core }))
            .unwrap();

        assert_eq!(app.save_state().unwrap_err().kind(), ErrorKind::NotImplemented);
        assert_eq!(
            app.restore_state(&StoreState::new()).unwrap_err().kind(),
            ErrorKind::NotImplemented
        );
    }

    #[test]
    fn test_removed_store_is_not_saved() {
        let ids = InstanceIds::new();
        let app = app();
        app.add_store(KeyStore::build(&ids, "a", "ka", json!(1)))
            .unwrap();
        app.add_store(KeyStore::build(&ids, "b", "kb", json!(2)))
            .unwrap();

        assert!(app.remove_store("a"));
        let state = app.save_state().unwrap();
        assert_eq!(Value::Object(state), json!({ "kb": 2 }));
        assert_eq!(app.store_names(), ["b"]);
    }

    // =============================================================================
    // INTEGRATION TESTS: DOCUMENT
    // =============================================================================

    #[test]
    fn test_server_document_hydrates_client() {
        let server = bootstrap(Environment::Testing).unwrap();
        server
            .execute_action(HELLO_WORLD_ACTION, Value::Null)
            .unwrap();
        let expected = server
            .get_store_as::<HelloWorldStore>(HELLO_WORLD_STORE)
            .unwrap()
            .data();

        let document = render_document(&server, "/").unwrap();
        drop(server);

        let client = hydrate(Environment::Testing, &extract_state(&document).unwrap()).unwrap();
        let store = client
            .get_store_as::<HelloWorldStore>(HELLO_WORLD_STORE)
            .unwrap();
        assert_eq!(store.data(), expected);

        let markup = client.render_client(json!({})).unwrap();
        assert!(document.contains(&markup));
    }
}
