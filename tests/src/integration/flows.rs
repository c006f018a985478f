//! # Dispatch Flows
//!
//! Action → event bus → store handler → change listener, across the
//! container, bus and core crates.
//!
//! ## Flows Tested:
//!
//! 1. **End-to-end dispatch**: an emitted event reaches the store method,
//!    which notifies its listener with the store itself
//! 2. **Action execution**: synchronous and pending outcomes
//! 3. **Re-entrant emission**: a handler that emits does not deadlock
//! 4. **Re-parenting**: a store moved to another application leaves no
//!    registration behind
//! 5. **Threads**: applications are shared across threads
//! 6. **Metrics**: dispatch shows up in the Prometheus registry

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use fluxone_core::{
        Action, ActionHandler, ActionHandlers, ActionOutcome, AppLink, Application, Environment,
        ErrorKind, EventArgs, FluxError, Handler, InstanceIds, Result, Store, StoreBuilder,
        StoreCore,
    };
    use fluxone_telemetry::{
        gather_metrics, ACTIONS_EXECUTED, ACTIONS_MISSING, EVENTS_EMITTED, STORE_CHANGES,
    };
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct CounterStore {
        core: StoreCore,
        counter: AtomicUsize,
        payloads: Mutex<Vec<Value>>,
    }

    impl CounterStore {
        fn build(ids: &InstanceIds) -> Arc<Self> {
            StoreBuilder::new().ids(ids).build(|core| Self {
                core,
                counter: AtomicUsize::new(0),
                payloads: Mutex::new(Vec::new()),
            })
        }

        fn on_evt(&self, args: &EventArgs) {
            self.counter.fetch_add(1, Ordering::SeqCst);
            if let Some(payload) = args.downcast_ref::<Value>() {
                self.payloads.lock().push(payload.clone());
            }
            self.emit_changes();
        }
    }

    impl Store for CounterStore {
        fn name(&self) -> &str {
            "S"
        }

        fn core(&self) -> &StoreCore {
            &self.core
        }

        fn default_handlers() -> ActionHandlers {
            ActionHandlers::new().on("evt", ActionHandler::method(CounterStore::on_evt))
        }
    }

    /// Emits `evt` with its payload.
    #[derive(Default)]
    struct EmitAction {
        link: AppLink,
    }

    impl Action for EmitAction {
        fn name(&self) -> &str {
            "emit"
        }

        fn app_link(&self) -> &AppLink {
            &self.link
        }

        fn execute(&self, payload: Value) -> Result<ActionOutcome> {
            self.link.require()?.emit_value("evt", payload);
            Ok(ActionOutcome::done())
        }
    }

    /// Emits synchronously, then finishes later.
    #[derive(Default)]
    struct FetchAction {
        link: AppLink,
    }

    impl Action for FetchAction {
        fn name(&self) -> &str {
            "fetch"
        }

        fn app_link(&self) -> &AppLink {
            &self.link
        }

        fn execute(&self, payload: Value) -> Result<ActionOutcome> {
            let app = self.link.require()?;
            app.emit_value("evt", json!({ "phase": "started" }));

            Ok(ActionOutcome::pending(async move {
                tokio::task::yield_now().await;
                match payload.get("fail") {
                    Some(Value::Bool(true)) => {
                        Err(FluxError::InvalidArgument("upstream refused".into()))
                    }
                    _ => Ok(json!({ "phase": "finished" })),
                }
            }))
        }
    }

    fn app() -> Application {
        Application::new(&Value::Null, Environment::Testing).unwrap()
    }

    fn recorder() -> (Handler, Arc<Mutex<Vec<EventArgs>>>) {
        let calls: Arc<Mutex<Vec<EventArgs>>> = Arc::default();
        let sink = Arc::clone(&calls);
        let handler: Handler = Arc::new(move |args: &EventArgs| sink.lock().push(Arc::clone(args)));
        (handler, calls)
    }

    // =============================================================================
    // INTEGRATION TESTS: DISPATCH
    // =============================================================================

    /// Emitting `evt` runs the store method once and notifies the listener
    /// with the store itself.
    #[test]
    fn test_end_to_end_dispatch() {
        let ids = InstanceIds::new();
        let app = app();
        let store = CounterStore::build(&ids);
        app.add_store(Arc::clone(&store)).unwrap();

        let (listener, calls) = recorder();
        store.register_listener(listener).unwrap();

        app.emit_value("evt", json!({ "x": 1 }));

        assert_eq!(store.counter.load(Ordering::SeqCst), 1);
        assert_eq!(*store.payloads.lock(), [json!({ "x": 1 })]);

        let calls = calls.lock();
        assert_eq!(calls.len(), 1);
        let received = calls[0].downcast_ref::<CounterStore>().unwrap();
        assert!(std::ptr::eq(received, Arc::as_ptr(&store)));
    }

    #[test]
    fn test_action_drives_store() {
        let ids = InstanceIds::new();
        let app = app();
        let store = CounterStore::build(&ids);
        app.add_store(Arc::clone(&store)).unwrap();
        app.add_action(Arc::new(EmitAction::default()));

        let outcome = app.execute_action("emit", json!({ "x": 2 })).unwrap();

        assert!(!outcome.is_pending());
        assert_eq!(store.counter.load(Ordering::SeqCst), 1);
        assert_eq!(*store.payloads.lock(), [json!({ "x": 2 })]);
    }

    /// Dispatch through the application is counted in the shared registry.
    #[test]
    fn test_dispatch_is_counted() {
        let ids = InstanceIds::new();
        let app = app();
        let store = CounterStore::build(&ids);
        app.add_store(Arc::clone(&store)).unwrap();
        app.add_action(Arc::new(EmitAction::default()));

        let executed = ACTIONS_EXECUTED.get();
        let missing = ACTIONS_MISSING.get();
        let emitted = EVENTS_EMITTED.get();
        let changes = STORE_CHANGES.get();

        app.execute_action("emit", json!({})).unwrap();
        app.execute_action("nope", json!({})).unwrap_err();

        assert!(ACTIONS_EXECUTED.get() >= executed + 1.0);
        assert!(ACTIONS_MISSING.get() >= missing + 1.0);
        assert!(EVENTS_EMITTED.get() >= emitted + 1.0);
        assert!(STORE_CHANGES.get() >= changes + 1.0);

        let text = gather_metrics().unwrap();
        assert!(text.contains("fluxone_actions_executed_total"));
        assert!(text.contains("fluxone_actions_missing_total"));
        assert!(text.contains("fluxone_events_emitted_total"));
        assert!(text.contains("fluxone_store_changes_total"));
    }

    /// The synchronous part runs inside `execute_action`; the rest is awaited.
    #[tokio::test]
    async fn test_pending_action_outcome() {
        let ids = InstanceIds::new();
        let app = app();
        let store = CounterStore::build(&ids);
        app.add_store(Arc::clone(&store)).unwrap();
        app.add_action(Arc::new(FetchAction::default()));

        let outcome = app.execute_action("fetch", json!({})).unwrap();
        assert!(outcome.is_pending());
        assert_eq!(store.counter.load(Ordering::SeqCst), 1);

        let value = outcome.resolve().await.unwrap();
        assert_eq!(value, Some(json!({ "phase": "finished" })));

        let err = app
            .execute_action("fetch", json!({ "fail": true }))
            .unwrap()
            .resolve()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(store.counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_missing_action_is_not_found_only() {
        let app = app();
        let err = app.execute_action("missing", json!({})).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            err.to_string(),
            "Action 'missing' was not registered in the app container, therefore it cannot be executed."
        );
    }

    /// A handler that emits runs the nested dispatch on the same stack.
    #[test]
    fn test_reentrant_emission() {
        let ids = InstanceIds::new();
        let app = app();
        let store = CounterStore::build(&ids);
        app.add_store(Arc::clone(&store)).unwrap();

        let weak = app.downgrade();
        app.on(
            "outer",
            Arc::new(move |_: &EventArgs| {
                if let Some(app) = weak.upgrade() {
                    app.emit_value("evt", json!("nested"));
                }
            }),
        );

        assert_eq!(app.emit_value("outer", Value::Null), 1);
        assert_eq!(store.counter.load(Ordering::SeqCst), 1);
        assert_eq!(*store.payloads.lock(), [json!("nested")]);
    }

    /// A handler removing itself still completes the current pass.
    #[test]
    fn test_self_removal_during_dispatch() {
        let app = app();
        let hits = Arc::new(AtomicUsize::new(0));

        let slot: Arc<Mutex<Option<Handler>>> = Arc::default();
        let weak = app.downgrade();
        let counter = Arc::clone(&hits);
        let own = Arc::clone(&slot);
        let once: Handler = Arc::new(move |_: &EventArgs| {
            counter.fetch_add(1, Ordering::SeqCst);
            let handler = own.lock().take();
            if let (Some(app), Some(handler)) = (weak.upgrade(), handler) {
                app.off("tick", &handler);
            }
        });
        *slot.lock() = Some(Arc::clone(&once));

        let (second, calls) = recorder();
        app.on("tick", once);
        app.on("tick", second);

        assert_eq!(app.emit_value("tick", Value::Null), 2);
        assert_eq!(app.emit_value("tick", Value::Null), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(calls.lock().len(), 2);
    }

    /// Moving a store to another application unwires it from the first.
    #[test]
    fn test_reparenting_store() {
        let ids = InstanceIds::new();
        let first = app();
        let second = app();
        let store = CounterStore::build(&ids);

        first.add_store(Arc::clone(&store)).unwrap();
        store.core().set_app(&second);

        assert!(!first.has_listeners("evt"));
        assert!(second.has_listeners("evt"));

        first.emit_value("evt", Value::Null);
        assert_eq!(store.counter.load(Ordering::SeqCst), 0);

        second.emit_value("evt", Value::Null);
        assert_eq!(store.counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handlers_replaced_at_runtime() {
        let ids = InstanceIds::new();
        let app = app();
        let store = CounterStore::build(&ids);
        app.add_store(Arc::clone(&store)).unwrap();

        let (handler, calls) = recorder();
        store
            .core()
            .set_handlers(ActionHandlers::new().on("other", ActionHandler::Function(handler)));

        app.emit_value("evt", Value::Null);
        app.emit_value("other", Value::Null);

        assert_eq!(store.counter.load(Ordering::SeqCst), 0);
        assert_eq!(calls.lock().len(), 1);
    }

    #[test]
    fn test_dispatch_from_many_threads() {
        let ids = InstanceIds::new();
        let app = app();
        let store = CounterStore::build(&ids);
        app.add_store(Arc::clone(&store)).unwrap();
        app.add_action(Arc::new(EmitAction::default()));

        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let app = app.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        app.execute_action("emit", json!({ "worker": worker, "i": i }))
                            .unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(store.counter.load(Ordering::SeqCst), 100);
        assert_eq!(store.payloads.lock().len(), 100);
    }
}
