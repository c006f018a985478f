//! # Subscription Flows
//!
//! View-side listener groups on the demo application.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fluxone_core::{
        Environment, ErrorKind, EventArgs, Handler, StoreBindings, StoreSubscriptions,
    };
    use fluxone_runtime::{
        bootstrap, HelloWorldData, HelloWorldStore, HELLO_WORLD_ACTION, HELLO_WORLD_STORE,
    };
    use parking_lot::Mutex;
    use serde_json::Value;

    fn sentences() -> (Handler, Arc<Mutex<Vec<HelloWorldData>>>) {
        let seen: Arc<Mutex<Vec<HelloWorldData>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let handler: Handler = Arc::new(move |args: &EventArgs| {
            if let Some(store) = args.downcast_ref::<HelloWorldStore>() {
                sink.lock().push(store.data());
            }
        });
        (handler, seen)
    }

    #[test]
    fn test_view_sees_every_tick() {
        let app = bootstrap(Environment::Testing).unwrap();
        let (handler, seen) = sentences();
        let _subs =
            StoreSubscriptions::attach(&app, StoreBindings::all([HELLO_WORLD_STORE], handler))
                .unwrap();

        for _ in 0..3 {
            app.execute_action(HELLO_WORLD_ACTION, Value::Null).unwrap();
        }

        let store = app
            .get_store_as::<HelloWorldStore>(HELLO_WORLD_STORE)
            .unwrap();
        let seen = seen.lock();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen.last(), Some(&store.data()));
        assert_eq!(store.generations(), 4);
    }

    #[test]
    fn test_unmounted_view_stops_listening() {
        let app = bootstrap(Environment::Testing).unwrap();
        let (handler, seen) = sentences();
        let store = app.get_store(HELLO_WORLD_STORE).unwrap();

        let subs =
            StoreSubscriptions::attach(&app, StoreBindings::all([HELLO_WORLD_STORE], handler))
                .unwrap();
        app.execute_action(HELLO_WORLD_ACTION, Value::Null).unwrap();
        assert!(store.has_listeners());

        drop(subs);
        assert!(!store.has_listeners());
        app.execute_action(HELLO_WORLD_ACTION, Value::Null).unwrap();

        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_missing_store_fails_attach() {
        let app = bootstrap(Environment::Testing).unwrap();
        let (handler, _seen) = sentences();

        let bindings = StoreBindings::per_store()
            .bind(HELLO_WORLD_STORE, Arc::clone(&handler))
            .bind("CartStore", handler);
        let err = StoreSubscriptions::attach(&app, bindings).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!app.get_store(HELLO_WORLD_STORE).unwrap().has_listeners());
    }

    #[test]
    fn test_removed_store_stops_reacting() {
        let app = bootstrap(Environment::Testing).unwrap();
        let store = app
            .get_store_as::<HelloWorldStore>(HELLO_WORLD_STORE)
            .unwrap();

        assert!(app.remove_store(HELLO_WORLD_STORE));
        app.execute_action(HELLO_WORLD_ACTION, Value::Null).unwrap();

        assert_eq!(store.generations(), 1);
        assert!(app.get_store(HELLO_WORLD_STORE).is_none());
    }
}
