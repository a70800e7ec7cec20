//! Closure adapter

use crate::dispatchable::{DispatchResult, Dispatchable};
use crate::middleware::Middleware;
use crate::pipeline::{ComposedDispatch, Next};

/// Middleware backed by a closure
pub struct FnMiddleware<F> {
    name: String,
    f: F,
}

/// Wrap a closure as a named middleware
pub fn middleware_fn<S, A, E, R, F>(name: impl Into<String>, f: F) -> FnMiddleware<F>
where
    F: Fn(
            &ComposedDispatch<S, A, E, R>,
            Dispatchable<S, A, E, R>,
            Next<'_, S, A, E, R>,
        ) -> DispatchResult<A, R>
        + Send
        + Sync
        + 'static,
{
    FnMiddleware {
        name: name.into(),
        f,
    }
}

impl<S, A, E, R, F> Middleware<S, A, E, R> for FnMiddleware<F>
where
    F: Fn(
            &ComposedDispatch<S, A, E, R>,
            Dispatchable<S, A, E, R>,
            Next<'_, S, A, E, R>,
        ) -> DispatchResult<A, R>
        + Send
        + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(
        &self,
        api: &ComposedDispatch<S, A, E, R>,
        value: Dispatchable<S, A, E, R>,
        next: Next<'_, S, A, E, R>,
    ) -> DispatchResult<A, R> {
        (self.f)(api, value, next)
    }
}
