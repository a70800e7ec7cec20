//! Thunks of the demo store

use std::sync::Arc;
use std::time::Duration;

use dispatcher::{ready, ComposedDispatch, GetState, StoreError, Thunk, ThunkFuture};
use serde::Serialize;
use tracing::{debug, warn};

use super::api::{InMemoryTodoApi, TodoApi};
use super::state::{AppAction, AppState};

/// What a demo thunk reports back once its future resolves
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ThunkReport {
    /// Nothing dispatched
    Skipped,
    Counter { value: i64 },
    Todos { count: usize },
    /// The service failed; the failure was recorded in the state
    FetchFailed { error: String },
}

pub type AppOutput = ThunkFuture<ThunkReport>;
pub type AppDispatch = ComposedDispatch<AppState, AppAction, InMemoryTodoApi, AppOutput>;
pub type AppThunk = Thunk<AppState, AppAction, InMemoryTodoApi, AppOutput>;

/// Increment only when the counter is odd, decided at dispatch time
pub fn increment_if_odd() -> AppThunk {
    Thunk::named("increment_if_odd", |get_state, dispatch, _api| {
        let counter = get_state.with(|state: &AppState| state.counter);
        if counter % 2 == 0 {
            debug!(counter, "Counter is even, skipping increment");
            return Ok(ready(Ok(ThunkReport::Skipped)));
        }

        dispatch.dispatch_action(AppAction::Increment)?;
        Ok(ready(Ok(ThunkReport::Counter {
            value: get_state.get().counter,
        })))
    })
}

/// Increment after `delay`
pub fn increment_async(delay: Duration) -> AppThunk {
    Thunk::future("increment_async", move |get_state: GetState<AppState, AppAction>, dispatch, _api| async move {
        tokio::time::sleep(delay).await;
        dispatch
            .dispatch_action(AppAction::Increment)
            .map(|_| ThunkReport::Counter {
                value: get_state.get().counter,
            })
    })
}

/// Load the todo list from the service
///
/// Marks the list as loading before suspending. Service failures end up in the
/// state as a failed load; reducer errors are not caught and reach the caller.
pub fn fetch_todos() -> AppThunk {
    Thunk::named("fetch_todos", |_get_state, dispatch, api| {
        dispatch.dispatch_action(AppAction::TodosLoading)?;
        let load: AppOutput = Box::pin(load_todos(dispatch, api));
        Ok(load)
    })
}

async fn load_todos(
    dispatch: AppDispatch,
    api: Arc<InMemoryTodoApi>,
) -> Result<ThunkReport, StoreError> {
    match api.fetch_todos().await {
        Ok(todos) => {
            let count = todos.len();
            dispatch.dispatch_action(AppAction::TodosLoaded { todos })?;
            Ok(ThunkReport::Todos { count })
        }
        Err(e) => {
            warn!(error = %e, "Todo fetch failed");
            dispatch.dispatch_action(AppAction::TodosFailed {
                error: e.to_string(),
            })?;
            Ok(ThunkReport::FetchFailed {
                error: e.to_string(),
            })
        }
    }
}
