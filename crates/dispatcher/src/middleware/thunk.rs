//! ThunkMiddleware - runs thunks instead of forwarding them

use std::sync::Arc;

use contracts::Action;
use tracing::{debug, instrument, warn};

use crate::dispatchable::{DispatchResult, Dispatchable, Dispatched, Thunk};
use crate::middleware::Middleware;
use crate::pipeline::{ComposedDispatch, Next};

/// Intercepts `Dispatchable::Thunk` and invokes it with
/// `(get_state, dispatch, extra)`; forwards everything else untouched.
///
/// The thunk's result is returned as-is and never reaches later middleware or
/// the base sink. Failures are counted but not handled.
#[derive(Debug, Clone)]
pub struct ThunkMiddleware {
    name: String,
}

impl ThunkMiddleware {
    pub fn new() -> Self {
        Self::named("thunk")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for ThunkMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A, E, R> Middleware<S, A, E, R> for ThunkMiddleware
where
    S: Clone + Send + 'static,
    A: Action,
    E: Send + Sync + 'static,
    R: 'static,
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
        match value {
            Dispatchable::Thunk(thunk) => run_thunk(api, thunk).map(Dispatched::Output),
            action => next.run(action),
        }
    }
}

#[instrument(name = "thunk_invoke", skip(api, thunk), fields(thunk = thunk.name()))]
fn run_thunk<S, A, E, R>(
    api: &ComposedDispatch<S, A, E, R>,
    thunk: Thunk<S, A, E, R>,
) -> Result<R, contracts::StoreError>
where
    S: Clone + Send + 'static,
    A: Action,
    E: Send + Sync + 'static,
    R: 'static,
{
    let name = thunk.name().to_string();
    api.metrics().inc_thunks_invoked();
    debug!(thunk = %name, "Invoking thunk");

    let result = thunk.invoke(
        api.state_reader(),
        api.clone(),
        Arc::clone(api.extra_argument()),
    );

    match &result {
        Ok(_) => {
            observability::record_thunk_invoked(&name, true);
            debug!(thunk = %name, "Thunk returned");
        }
        Err(e) => {
            api.metrics().inc_thunk_failures();
            observability::record_thunk_invoked(&name, false);
            warn!(thunk = %name, error = %e, "Thunk failed");
        }
    }

    result
}
