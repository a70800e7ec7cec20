//! # Dispatcher
//!
//! Middleware dispatch pipeline.
//!
//! Responsibilities:
//! - Fold an ordered middleware list around a store's base sink
//! - Route plain actions through the chain to the reducer
//! - Intercept thunks and run them with `(get_state, dispatch, extra)`
//!
//! ## Example
//!
//! ```ignore
//! use dispatcher::{PipelineBuilder, Thunk};
//!
//! let dispatch = PipelineBuilder::with_extra_argument(store, api)
//!     .logger(tracing::Level::DEBUG)
//!     .thunk()
//!     .build();
//!
//! dispatch.dispatch_action(CounterAction::Increment)?;
//! let total = dispatch
//!     .dispatch_thunk(Thunk::named("increment_twice", |get_state, dispatch, _api| {
//!         dispatch.dispatch_action(CounterAction::Increment)?;
//!         dispatch.dispatch_action(CounterAction::Increment)?;
//!         Ok(get_state.get())
//!     }))?
//!     .output();
//! ```

pub mod dispatchable;
pub mod metrics;
pub mod middleware;
pub mod pipeline;

pub use contracts::{Action, StoreError};
pub use dispatchable::{
    ready, DispatchResult, Dispatchable, Dispatched, GetState, Thunk, ThunkFuture,
};
pub use metrics::{PipelineMetrics, PipelineMetricsSnapshot};
pub use middleware::{middleware_fn, FnMiddleware, LoggerMiddleware, Middleware, ThunkMiddleware};
pub use pipeline::{configure, ComposedDispatch, Next, PipelineBuilder};
pub use store::Store;
