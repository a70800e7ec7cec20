//! Demo application driven by `thunkctl run`.
//!
//! A counter plus a todo list fetched from a simulated service; the service is
//! the extra argument every thunk receives.

mod api;
mod state;
mod thunks;

pub use api::{InMemoryTodoApi, TodoApi};
pub use state::{app_reducer, AppAction, AppState, LoadStatus};
pub use thunks::{
    fetch_todos, increment_async, increment_if_odd, AppDispatch, AppOutput, AppThunk, ThunkReport,
};
