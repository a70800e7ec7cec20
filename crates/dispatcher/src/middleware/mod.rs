//! Middleware implementations
//!
//! Contains the `Middleware` trait, ThunkMiddleware, LoggerMiddleware and the
//! closure adapter.

mod func;
mod logger;
mod thunk;

pub use self::func::{middleware_fn, FnMiddleware};
pub use self::logger::LoggerMiddleware;
pub use self::thunk::ThunkMiddleware;

use crate::dispatchable::{DispatchResult, Dispatchable};
use crate::pipeline::{ComposedDispatch, Next};

/// One link of the dispatch chain
///
/// A middleware either forwards the value with `next.run(value)` (possibly
/// after inspecting or replacing it) or answers it itself without calling
/// `next`. `api` is the full composed dispatch: dispatching through it starts
/// again at the outermost middleware.
pub trait Middleware<S, A, E = (), R = ()>: Send + Sync {
    /// Middleware name (used for logging)
    fn name(&self) -> &str;

    /// Handle one dispatched value
    fn handle(
        &self,
        api: &ComposedDispatch<S, A, E, R>,
        value: Dispatchable<S, A, E, R>,
        next: Next<'_, S, A, E, R>,
    ) -> DispatchResult<A, R>;
}
