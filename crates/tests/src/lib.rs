//! # Integration Tests
//!
//! End-to-end tests across the workspace crates.
//!
//! Covers:
//! - The four reference dispatch scenarios
//! - Forwarding, re-entrancy and extra-argument properties
//! - Suspending thunks on a tokio runtime
//! - Config-driven pipeline assembly

#[cfg(test)]
mod fixtures {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use contracts::{Action, StoreError};
    use store::Store;

    /// Plain record carrying only its type
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Rec(pub &'static str);

    impl Action for Rec {
        fn action_type(&self) -> &str {
            self.0
        }
    }

    /// Store whose state is the list of records the base sink accepted
    ///
    /// Records typed "REJECT" are refused. The counter tracks reducer calls.
    pub fn recording_store() -> (Store<Vec<Rec>, Rec>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let store = Store::with_name(
            "recording",
            Vec::new(),
            move |state: &mut Vec<Rec>, action: &Rec| -> Result<(), StoreError> {
                counted.fetch_add(1, Ordering::SeqCst);
                if action.0 == "REJECT" {
                    return Err(StoreError::rejected(action.0, "refused by test reducer"));
                }
                state.push(action.clone());
                Ok(())
            },
        );
        (store, calls)
    }
}

#[cfg(test)]
mod scenario_tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use contracts::StoreError;
    use dispatcher::{
        configure, ComposedDispatch, Dispatched, Middleware, PipelineBuilder, Thunk,
        ThunkMiddleware,
    };
    use tracing::Level;

    use crate::fixtures::{recording_store, Rec};

    #[test]
    fn test_scenario_plain_record_reaches_sink_once() {
        let (store, calls) = recording_store();
        let handlers: Vec<Arc<dyn Middleware<Vec<Rec>, Rec>>> =
            vec![Arc::new(ThunkMiddleware::new())];
        let dispatch = configure(store, handlers, ());

        let result = dispatch.dispatch_action(Rec("INC")).unwrap();

        assert_eq!(result, Dispatched::Action(Rec("INC")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(dispatch.get_state(), vec![Rec("INC")]);
    }

    #[test]
    fn test_scenario_thunk_dispatches_a_then_b_and_returns_seven() {
        let (store, calls) = recording_store();
        let dispatch: ComposedDispatch<Vec<Rec>, Rec, (), i32> =
            PipelineBuilder::new(store).thunk().build();

        let result = dispatch
            .dispatch_thunk(Thunk::new(|_read, dispatch, _extra| {
                dispatch.dispatch_action(Rec("A"))?;
                dispatch.dispatch_action(Rec("B"))?;
                Ok(7)
            }))
            .unwrap();

        assert_eq!(result, Dispatched::Output(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(dispatch.get_state(), vec![Rec("A"), Rec("B")]);
    }

    #[derive(Debug)]
    struct Services {
        api: Arc<String>,
    }

    #[test]
    fn test_scenario_thunk_returns_configured_extra() {
        let (store, _) = recording_store();
        let api = Arc::new("https://todos.example".to_string());
        let dispatch: ComposedDispatch<Vec<Rec>, Rec, Services, Arc<String>> =
            PipelineBuilder::with_extra_argument(
                store,
                Services {
                    api: Arc::clone(&api),
                },
            )
            .thunk()
            .build();

        let returned = dispatch
            .dispatch_thunk(Thunk::new(|_, _, extra: Arc<Services>| Ok(Arc::clone(&extra.api))))
            .unwrap()
            .output()
            .unwrap();

        assert!(Arc::ptr_eq(&returned, &api));
    }

    #[test]
    fn test_scenario_thunk_failure_propagates_uncaught() {
        let (store, calls) = recording_store();
        let dispatch: ComposedDispatch<Vec<Rec>, Rec> =
            PipelineBuilder::new(store).logger(Level::DEBUG).thunk().build();

        let result = dispatch.dispatch_thunk(Thunk::named("throws", |_, _, _| {
            Err(StoreError::thunk("throws", "boom"))
        }));

        match result {
            Err(StoreError::Thunk { name, source }) => {
                assert_eq!(name, "throws");
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("expected thunk failure, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(dispatch.get_state().is_empty());
    }
}

#[cfg(test)]
mod property_tests {
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};

    use contracts::StoreError;
    use dispatcher::{middleware_fn, ComposedDispatch, Dispatched, PipelineBuilder, Thunk};
    use tracing::Level;

    use crate::fixtures::{recording_store, Rec};

    type Dispatch<E = (), R = ()> = ComposedDispatch<Vec<Rec>, Rec, E, R>;

    #[test]
    fn test_forwarding_is_transparent_for_plain_records() {
        let (bare, _) = recording_store();
        let (store, _) = recording_store();
        let dispatch: Dispatch = PipelineBuilder::new(store)
            .logger(Level::INFO)
            .thunk()
            .logger(Level::TRACE)
            .build();

        for rec in [Rec("X"), Rec("REJECT"), Rec("Y")] {
            let piped = dispatch.dispatch_action(rec.clone());
            let direct = bare.apply(rec);
            match (piped, direct) {
                (Ok(Dispatched::Action(a)), Ok(b)) => assert_eq!(a, b),
                (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
                (piped, direct) => panic!("diverged: {piped:?} vs {direct:?}"),
            }
        }
        assert_eq!(dispatch.get_state(), bare.get_state());
    }

    #[test]
    fn test_thunk_never_reaches_base_sink() {
        let (store, calls) = recording_store();
        let dispatch: Dispatch<(), usize> = PipelineBuilder::new(store).thunk().build();

        let output = dispatch
            .dispatch_thunk(Thunk::new(|read, _, _| Ok(read.with(|s: &Vec<Rec>| s.len()))))
            .unwrap();

        assert_eq!(output, Dispatched::Output(0));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(dispatch.metrics_snapshot().applied_count, 0);
    }

    #[test]
    fn test_nested_record_is_applied_before_thunk_returns() {
        let (store, _) = recording_store();
        let dispatch: Dispatch<(), Vec<Rec>> = PipelineBuilder::new(store).thunk().build();

        let seen_inside = dispatch
            .dispatch_thunk(Thunk::new(|read, dispatch, _| {
                dispatch.dispatch_action(Rec("NESTED"))?;
                Ok(read.get())
            }))
            .unwrap()
            .output()
            .unwrap();

        assert_eq!(seen_inside, vec![Rec("NESTED")]);
    }

    #[test]
    fn test_extra_argument_identity_across_invocations() {
        let (store, _) = recording_store();
        let dispatch: Dispatch<Mutex<u32>, Arc<Mutex<u32>>> =
            PipelineBuilder::with_extra_argument(store, Mutex::new(0))
                .thunk()
                .build();

        let mut seen = Vec::new();
        for _ in 0..3 {
            let extra = dispatch
                .dispatch_thunk(Thunk::new(|_, _, extra: Arc<Mutex<u32>>| {
                    *extra.lock().unwrap() += 1;
                    Ok(extra)
                }))
                .unwrap()
                .output()
                .unwrap();
            seen.push(extra);
        }

        assert!(seen.iter().all(|e| Arc::ptr_eq(e, dispatch.extra_argument())));
        assert_eq!(*dispatch.extra_argument().lock().unwrap(), 3);
    }

    #[test]
    fn test_nested_dispatch_restarts_at_outermost_middleware() {
        let (store, _) = recording_store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let tracer_log = Arc::clone(&seen);

        let dispatch: Dispatch = PipelineBuilder::new(store)
            .middleware(middleware_fn("tracer", move |_api: &Dispatch, value, next| {
                tracer_log
                    .lock()
                    .unwrap()
                    .push(value.describe().to_string());
                next.run(value)
            }))
            .thunk()
            .build();

        dispatch
            .dispatch_thunk(Thunk::named("outer", |_, dispatch, _| {
                dispatch.dispatch_action(Rec("INNER"))?;
                Ok(())
            }))
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["outer", "INNER"]);
    }

    #[test]
    fn test_listener_may_dispatch_through_pipeline() {
        let (store, _) = recording_store();
        let dispatch: Dispatch = PipelineBuilder::new(store.clone()).thunk().build();

        let echo = dispatch.clone();
        store.subscribe(move |state: &Vec<Rec>| {
            if state.last() == Some(&Rec("PING")) {
                let _ = echo.dispatch_action(Rec("PONG"));
            }
        });

        dispatch.dispatch_action(Rec("PING")).unwrap();

        assert_eq!(dispatch.get_state(), vec![Rec("PING"), Rec("PONG")]);
    }

    #[test]
    fn test_reducer_rejection_inside_thunk_propagates() {
        let (store, _) = recording_store();
        let dispatch: Dispatch = PipelineBuilder::new(store).thunk().build();

        let result = dispatch.dispatch_thunk(Thunk::new(|_, dispatch, _| {
            dispatch.dispatch_action(Rec("OK"))?;
            dispatch.dispatch_action(Rec("REJECT"))?;
            dispatch.dispatch_action(Rec("NEVER"))?;
            Ok(())
        }));

        assert!(matches!(result, Err(StoreError::Rejected { .. })));
        assert_eq!(dispatch.get_state(), vec![Rec("OK")]);
        let snapshot = dispatch.metrics_snapshot();
        assert_eq!(snapshot.thunk_failures, 1);
        assert_eq!(snapshot.rejected_count, 1);
    }
}

#[cfg(test)]
mod async_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::StoreError;
    use dispatcher::{ready, ComposedDispatch, GetState, PipelineBuilder, Thunk, ThunkFuture};
    use tokio::sync::Notify;

    use crate::fixtures::{recording_store, Rec};

    type AsyncDispatch = ComposedDispatch<Vec<Rec>, Rec, Notify, ThunkFuture<usize>>;

    fn async_pipeline() -> AsyncDispatch {
        let (store, _) = recording_store();
        PipelineBuilder::with_extra_argument(store, Notify::new())
            .thunk()
            .build()
    }

    #[tokio::test]
    async fn test_other_dispatches_interleave_while_thunk_is_suspended() {
        let dispatch = async_pipeline();

        let pending = dispatch
            .dispatch_thunk(Thunk::future("wait_for_signal", |read: GetState<Vec<Rec>, Rec>, dispatch, signal: Arc<Notify>| async move {
                dispatch.dispatch_action(Rec("STARTED"))?;
                signal.notified().await;
                dispatch.dispatch_action(Rec("RESUMED"))?;
                Ok::<_, StoreError>(read.get().len())
            }))
            .unwrap()
            .output()
            .unwrap();

        let resume = async {
            dispatch.dispatch_action(Rec("MEANWHILE")).unwrap();
            dispatch.extra_argument().notify_one();
        };

        // The thunk future is polled first, so it suspends after STARTED
        let (result, ()) = tokio::join!(pending, resume);
        let len = result.unwrap();
        assert_eq!(len, 3);
        assert_eq!(
            dispatch.get_state(),
            vec![Rec("STARTED"), Rec("MEANWHILE"), Rec("RESUMED")]
        );
    }

    #[tokio::test]
    async fn test_concurrent_thunks_share_one_store() {
        let dispatch = async_pipeline();

        let mut handles = Vec::new();
        for (label, delay) in [("SLOW", 20u64), ("FAST", 1)] {
            let pending = dispatch
                .dispatch_thunk(Thunk::future(label, move |read: GetState<Vec<Rec>, Rec>, dispatch, _| async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    dispatch.dispatch_action(Rec(label))?;
                    Ok::<_, StoreError>(read.get().len())
                }))
                .unwrap()
                .output()
                .unwrap();
            handles.push(tokio::spawn(pending));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(dispatch.get_state(), vec![Rec("FAST"), Rec("SLOW")]);
        assert_eq!(dispatch.metrics().thunks_invoked(), 2);
    }

    #[tokio::test]
    async fn test_synchronous_thunk_in_async_pipeline() {
        let dispatch = async_pipeline();

        let pending = dispatch
            .dispatch_thunk(Thunk::new(|read: GetState<Vec<Rec>, Rec>, dispatch, _| {
                dispatch.dispatch_action(Rec("NOW"))?;
                Ok(ready(Ok(read.get().len())))
            }))
            .unwrap()
            .output()
            .unwrap();

        // Applied at dispatch time, before the future is polled
        assert_eq!(dispatch.get_state(), vec![Rec("NOW")]);
        assert_eq!(pending.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_from_blocking_thread() {
        let dispatch = Arc::new(async_pipeline());
        let worker = Arc::clone(&dispatch);

        tokio::task::spawn_blocking(move || worker.dispatch_action(Rec("BLOCKING")))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(dispatch.get_state(), vec![Rec("BLOCKING")]);
    }
}

#[cfg(test)]
mod config_tests {
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{LogLevel, MiddlewareKind, PipelineConfig, StoreError};
    use dispatcher::{
        configure, ComposedDispatch, Dispatched, GetState, LoggerMiddleware, Middleware, Thunk,
        ThunkMiddleware,
    };
    use tracing::Level;

    use crate::fixtures::{recording_store, Rec};

    type Handler = Arc<dyn Middleware<Vec<Rec>, Rec, (), usize>>;

    fn handlers(config: &PipelineConfig) -> Vec<Handler> {
        config
            .middleware
            .iter()
            .map(|m| -> Handler {
                match m.kind {
                    MiddlewareKind::Thunk => Arc::new(ThunkMiddleware::named(m.display_name())),
                    MiddlewareKind::Logger => {
                        let level = match m.level {
                            LogLevel::Trace => Level::TRACE,
                            LogLevel::Debug => Level::DEBUG,
                            LogLevel::Info => Level::INFO,
                            LogLevel::Warn => Level::WARN,
                            LogLevel::Error => Level::ERROR,
                        };
                        Arc::new(LoggerMiddleware::named(m.display_name(), level))
                    }
                }
            })
            .collect()
    }

    fn pipeline(toml: &str) -> ComposedDispatch<Vec<Rec>, Rec, (), usize> {
        observability::init_for_tests();
        let config = ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap();
        let (store, _) = recording_store();
        configure(store, handlers(&config), ())
    }

    #[test]
    fn test_configured_chain_runs_thunks() {
        let dispatch = pipeline(
            r#"
[store]
name = "configured"

[[middleware]]
kind = "logger"
name = "outer_log"
level = "trace"

[[middleware]]
kind = "thunk"
"#,
        );

        assert_eq!(dispatch.middleware_names(), vec!["outer_log", "thunk"]);
        let result = dispatch
            .dispatch_thunk(Thunk::new(|read: GetState<Vec<Rec>, Rec>, dispatch, _| {
                dispatch.dispatch_action(Rec("FROM_CONFIG"))?;
                Ok::<_, StoreError>(read.get().len())
            }))
            .unwrap();
        assert_eq!(result, Dispatched::Output(1));
    }

    #[test]
    fn test_configured_chain_without_thunk() {
        let dispatch = pipeline(
            r#"
[store]
name = "plain"

[[middleware]]
kind = "logger"
"#,
        );

        assert!(matches!(
            dispatch.dispatch_thunk(Thunk::named("orphan", |_, _, _| Ok(0))),
            Err(StoreError::UnhandledThunk { .. })
        ));
        assert!(dispatch.dispatch_action(Rec("STILL_WORKS")).is_ok());
    }

    #[test]
    fn test_invalid_config_is_rejected_before_assembly() {
        let err = ConfigLoader::load_from_str(
            r#"
[store]
name = "dup"

[[middleware]]
kind = "logger"

[[middleware]]
kind = "logger"
"#,
            ConfigFormat::Toml,
        )
        .unwrap_err();

        assert!(matches!(err, StoreError::ConfigValidation { .. }));
    }
}
