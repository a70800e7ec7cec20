//! Pipeline - builds the composed dispatch and walks the middleware chain

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use contracts::{Action, StoreError};
use store::Store;
use tracing::{info, instrument, warn, Level};

use crate::dispatchable::{DispatchResult, Dispatchable, Dispatched, GetState, Thunk};
use crate::metrics::{PipelineMetrics, PipelineMetricsSnapshot};
use crate::middleware::{LoggerMiddleware, Middleware, ThunkMiddleware};

type Chain<S, A, E, R> = Vec<Arc<dyn Middleware<S, A, E, R>>>;

struct PipelineInner<S, A, E, R> {
    store: Store<S, A>,
    /// Outermost first
    chain: Chain<S, A, E, R>,
    extra: Arc<E>,
    metrics: PipelineMetrics,
}

/// Builder for a `ComposedDispatch`
///
/// Middleware is listed outermost first: the first one added sees every value
/// before the others, the last one added sits directly in front of the base sink.
/// This is the order of Redux `applyMiddleware(a, b, c)`: the list is folded
/// right-to-left, so the last fold step (the first entry) runs first.
pub struct PipelineBuilder<S, A, E = (), R = ()> {
    store: Store<S, A>,
    extra: Arc<E>,
    chain: Chain<S, A, E, R>,
}

impl<S, A, R> PipelineBuilder<S, A, (), R> {
    /// Builder without an extra argument
    pub fn new(store: Store<S, A>) -> Self {
        Self::with_shared_extra_argument(store, Arc::new(()))
    }
}

impl<S, A, E, R> PipelineBuilder<S, A, E, R> {
    /// Builder whose thunks receive `extra` as their third argument
    pub fn with_extra_argument(store: Store<S, A>, extra: E) -> Self {
        Self::with_shared_extra_argument(store, Arc::new(extra))
    }

    /// Same as `with_extra_argument`, for a value that is already shared
    pub fn with_shared_extra_argument(store: Store<S, A>, extra: Arc<E>) -> Self {
        Self {
            store,
            extra,
            chain: Vec::new(),
        }
    }

    /// Append a middleware (it runs after the ones already added)
    pub fn middleware(mut self, middleware: impl Middleware<S, A, E, R> + 'static) -> Self {
        self.chain.push(Arc::new(middleware));
        self
    }

    /// Append an already shared middleware
    pub fn shared_middleware(mut self, middleware: Arc<dyn Middleware<S, A, E, R>>) -> Self {
        self.chain.push(middleware);
        self
    }

    /// Number of middleware added so far
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

impl<S, A, E, R> PipelineBuilder<S, A, E, R>
where
    S: Clone + Send + 'static,
    A: Action,
    E: Send + Sync + 'static,
    R: 'static,
{
    /// Append the thunk interceptor
    pub fn thunk(self) -> Self {
        self.middleware(ThunkMiddleware::new())
    }

    /// Append a logger at `level`
    pub fn logger(self, level: Level) -> Self {
        self.middleware(LoggerMiddleware::new(level))
    }

    /// Fold the chain around the store's base sink
    #[instrument(
        name = "pipeline_build",
        skip(self),
        fields(store = %self.store.name(), middleware = self.chain.len())
    )]
    pub fn build(self) -> ComposedDispatch<S, A, E, R> {
        let dispatch = ComposedDispatch {
            inner: Arc::new(PipelineInner {
                store: self.store,
                chain: self.chain,
                extra: self.extra,
                metrics: PipelineMetrics::new(),
            }),
        };

        info!(
            store = %dispatch.store().name(),
            chain = ?dispatch.middleware_names(),
            "Pipeline configured"
        );

        dispatch
    }
}

/// Build a composed dispatch from an ordered handler list (outermost first)
pub fn configure<S, A, E, R>(
    store: Store<S, A>,
    handlers: impl IntoIterator<Item = Arc<dyn Middleware<S, A, E, R>>>,
    extra: E,
) -> ComposedDispatch<S, A, E, R>
where
    S: Clone + Send + 'static,
    A: Action,
    E: Send + Sync + 'static,
    R: 'static,
{
    handlers
        .into_iter()
        .fold(
            PipelineBuilder::with_extra_argument(store, extra),
            PipelineBuilder::shared_middleware,
        )
        .build()
}

/// The composed dispatch function
///
/// Cheap to clone; clones share the store, the chain and the extra argument.
/// This is the handle thunks receive as their `dispatch` argument, so values
/// they dispatch pass through the whole chain again.
pub struct ComposedDispatch<S, A, E = (), R = ()> {
    inner: Arc<PipelineInner<S, A, E, R>>,
}

impl<S, A, E, R> Clone for ComposedDispatch<S, A, E, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A, E, R> fmt::Debug for ComposedDispatch<S, A, E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.inner.chain.iter().map(|m| m.name()).collect();
        f.debug_struct("ComposedDispatch")
            .field("store", &self.inner.store)
            .field("chain", &names)
            .finish()
    }
}

impl<S, A, E, R> ComposedDispatch<S, A, E, R>
where
    S: Clone + Send + 'static,
    A: Action,
    E: Send + Sync + 'static,
    R: 'static,
{
    /// Submit a value to the outermost handler
    ///
    /// # Errors
    /// Propagates whatever the chain produces: a thunk's failure, a reducer
    /// rejection, or `StoreError::UnhandledThunk` when no middleware took a thunk.
    pub fn dispatch(&self, value: Dispatchable<S, A, E, R>) -> DispatchResult<A, R> {
        self.inner.metrics.inc_dispatched_count();
        let started = Instant::now();

        let result = Next::new(&self.inner.chain, self).run(value);

        observability::record_dispatch_latency_ms(started.elapsed().as_secs_f64() * 1000.0);
        result
    }

    /// Dispatch a plain action
    pub fn dispatch_action(&self, action: A) -> DispatchResult<A, R> {
        self.dispatch(Dispatchable::Action(action))
    }

    /// Dispatch a thunk
    pub fn dispatch_thunk(&self, thunk: Thunk<S, A, E, R>) -> DispatchResult<A, R> {
        self.dispatch(Dispatchable::Thunk(thunk))
    }

    /// Snapshot of the store's state
    pub fn get_state(&self) -> S {
        self.inner.store.get_state()
    }

    /// Read accessor, as handed to thunks
    pub fn state_reader(&self) -> GetState<S, A> {
        GetState::new(self.inner.store.clone())
    }
}

impl<S, A, E, R> ComposedDispatch<S, A, E, R> {
    /// The extra argument every thunk receives
    pub fn extra_argument(&self) -> &Arc<E> {
        &self.inner.extra
    }

    pub fn store(&self) -> &Store<S, A> {
        &self.inner.store
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.inner.metrics
    }

    /// Pipeline counters merged with the store's
    pub fn metrics_snapshot(&self) -> PipelineMetricsSnapshot {
        self.inner
            .metrics
            .snapshot()
            .with_store(self.inner.store.metrics().snapshot())
    }

    /// Names of the middleware, outermost first
    pub fn middleware_names(&self) -> Vec<&str> {
        self.inner.chain.iter().map(|m| m.name()).collect()
    }
}

/// The rest of the chain after the current middleware
///
/// Consumed by `run`, so a middleware forwards a value at most once per call.
pub struct Next<'a, S, A, E = (), R = ()> {
    remaining: &'a [Arc<dyn Middleware<S, A, E, R>>],
    api: &'a ComposedDispatch<S, A, E, R>,
}

impl<'a, S, A, E, R> Next<'a, S, A, E, R>
where
    S: Clone + Send + 'static,
    A: Action,
    E: Send + Sync + 'static,
    R: 'static,
{
    fn new(
        remaining: &'a [Arc<dyn Middleware<S, A, E, R>>],
        api: &'a ComposedDispatch<S, A, E, R>,
    ) -> Self {
        Self { remaining, api }
    }

    /// Hand `value` to the next middleware, or to the base sink after the last one
    pub fn run(self, value: Dispatchable<S, A, E, R>) -> DispatchResult<A, R> {
        match self.remaining.split_first() {
            Some((middleware, rest)) => {
                middleware.handle(self.api, value, Next::new(rest, self.api))
            }
            None => base_sink(self.api.store(), value),
        }
    }

    /// Number of middleware left before the base sink
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

/// Terminal handler: plain actions go to the reducer, anything else is misuse
fn base_sink<S, A, E, R>(
    store: &Store<S, A>,
    value: Dispatchable<S, A, E, R>,
) -> DispatchResult<A, R>
where
    S: Clone + Send + 'static,
    A: Action,
{
    match value {
        Dispatchable::Action(action) => store.apply(action).map(Dispatched::Action),
        Dispatchable::Thunk(thunk) => {
            warn!(
                store = %store.name(),
                thunk = thunk.name(),
                "Thunk reached the base sink"
            );
            Err(StoreError::UnhandledThunk {
                name: thunk.name().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::middleware_fn;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Inc,
        Named(&'static str),
        Boom,
    }

    impl Action for Op {
        fn action_type(&self) -> &str {
            match self {
                Self::Inc => "INC",
                Self::Named(name) => name,
                Self::Boom => "BOOM",
            }
        }
    }

    /// State records every action the reducer saw, in order
    fn recording_store() -> Store<Vec<String>, Op> {
        Store::new(
            Vec::new(),
            |state: &mut Vec<String>, action: &Op| -> Result<(), StoreError> {
                if let Op::Boom = action {
                    return Err(StoreError::rejected("BOOM", "reducer refuses"));
                }
                state.push(action.action_type().to_string());
                Ok(())
            },
        )
    }

    type Dispatch<R = i32> = ComposedDispatch<Vec<String>, Op, (), R>;

    #[test]
    fn test_plain_action_reaches_base_sink_once() {
        let dispatch: Dispatch = PipelineBuilder::new(recording_store()).thunk().build();

        let result = dispatch.dispatch_action(Op::Inc).unwrap();

        assert_eq!(result, Dispatched::Action(Op::Inc));
        assert_eq!(dispatch.get_state(), vec!["INC"]);
        assert_eq!(dispatch.store().metrics().applied_count(), 1);
    }

    #[test]
    fn test_forwarding_matches_base_sink() {
        let piped: Dispatch = PipelineBuilder::new(recording_store())
            .logger(Level::DEBUG)
            .thunk()
            .build();
        let bare = recording_store();

        for op in [Op::Inc, Op::Named("A"), Op::Boom] {
            let through_pipeline = piped.dispatch_action(op.clone()).map(|d| d.action());
            let direct = bare.apply(op).map(Some);
            match (through_pipeline, direct) {
                (Ok(a), Ok(b)) => assert_eq!(a, b),
                (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
                other => panic!("pipeline diverged from base sink: {other:?}"),
            }
        }
        assert_eq!(piped.get_state(), bare.get_state());
    }

    #[test]
    fn test_thunk_dispatches_in_order_and_returns_value() {
        let dispatch: Dispatch = PipelineBuilder::new(recording_store()).thunk().build();

        let result = dispatch
            .dispatch_thunk(Thunk::new(|_get_state, dispatch, _extra| {
                dispatch.dispatch_action(Op::Named("A"))?;
                dispatch.dispatch_action(Op::Named("B"))?;
                Ok(7)
            }))
            .unwrap();

        assert_eq!(result, Dispatched::Output(7));
        assert_eq!(dispatch.get_state(), vec!["A", "B"]);
    }

    #[test]
    fn test_thunk_without_interceptor_is_rejected() {
        let dispatch: Dispatch = PipelineBuilder::new(recording_store()).build();

        let result = dispatch.dispatch_thunk(Thunk::named("orphan", |_, _, _| Ok(1)));

        match result {
            Err(StoreError::UnhandledThunk { name }) => assert_eq!(name, "orphan"),
            other => panic!("expected UnhandledThunk, got {other:?}"),
        }
        assert!(dispatch.get_state().is_empty());
    }

    #[test]
    fn test_middleware_runs_outermost_first() {
        let order = Arc::new(Mutex::new(Vec::new()));

        let tracer = |label: &'static str, order: Arc<Mutex<Vec<String>>>| {
            middleware_fn(label, move |_api: &Dispatch, value, next| {
                order.lock().unwrap().push(format!("{label}>"));
                let result = next.run(value);
                order.lock().unwrap().push(format!("<{label}"));
                result
            })
        };

        let dispatch: Dispatch = PipelineBuilder::new(recording_store())
            .middleware(tracer("first", Arc::clone(&order)))
            .middleware(tracer("second", Arc::clone(&order)))
            .build();

        dispatch.dispatch_action(Op::Inc).unwrap();

        assert_eq!(dispatch.middleware_names(), vec!["first", "second"]);
        assert_eq!(
            *order.lock().unwrap(),
            vec!["first>", "second>", "<second", "<first"]
        );
    }

    #[test]
    fn test_middleware_can_short_circuit() {
        let swallow = middleware_fn("swallow", |_api: &Dispatch, value, next| match value {
            Dispatchable::Action(Op::Named("ignored")) => Ok(Dispatched::Output(-1)),
            other => next.run(other),
        });

        let dispatch: Dispatch = PipelineBuilder::new(recording_store())
            .middleware(swallow)
            .build();

        let swallowed = dispatch.dispatch_action(Op::Named("ignored")).unwrap();
        dispatch.dispatch_action(Op::Inc).unwrap();

        assert_eq!(swallowed, Dispatched::Output(-1));
        assert_eq!(dispatch.get_state(), vec!["INC"]);
    }

    #[test]
    fn test_configure_from_list() {
        let handlers: Vec<Arc<dyn Middleware<Vec<String>, Op, u8, i32>>> = vec![
            Arc::new(LoggerMiddleware::new(Level::TRACE)),
            Arc::new(ThunkMiddleware::new()),
        ];

        let dispatch = configure(recording_store(), handlers, 42u8);
        let seen = dispatch
            .dispatch_thunk(Thunk::new(|_, _, extra| Ok(i32::from(*extra))))
            .unwrap();

        assert_eq!(seen, Dispatched::Output(42));
        assert_eq!(dispatch.middleware_names(), vec!["logger", "thunk"]);
    }

    #[test]
    fn test_metrics_snapshot() {
        let dispatch: Dispatch = PipelineBuilder::new(recording_store()).thunk().build();

        dispatch.dispatch_action(Op::Inc).unwrap();
        let _ = dispatch.dispatch_action(Op::Boom);
        let _ = dispatch.dispatch_thunk(Thunk::new(|_, dispatch, _| {
            dispatch.dispatch_action(Op::Inc)?;
            Ok(0)
        }));

        let snapshot = dispatch.metrics_snapshot();
        assert_eq!(snapshot.dispatched_count, 4);
        assert_eq!(snapshot.thunks_invoked, 1);
        assert_eq!(snapshot.applied_count, 2);
        assert_eq!(snapshot.rejected_count, 1);
    }
}
