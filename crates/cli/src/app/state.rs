//! Demo store: a counter and a todo list loaded from a remote service.

use contracts::{Action, StoreError};
use serde::{Deserialize, Serialize};

/// One todo item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

/// Load status of the todo list
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// Whole application state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AppState {
    pub counter: i64,
    pub todos: Vec<Todo>,
    pub status: LoadStatus,
}

impl AppState {
    pub fn with_counter(counter: i64) -> Self {
        Self {
            counter,
            ..Default::default()
        }
    }

    fn next_todo_id(&self) -> u64 {
        self.todos.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }
}

/// Plain actions understood by `app_reducer`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppAction {
    Increment,
    Decrement,
    IncrementBy { amount: i64 },
    Reset,
    AddTodo { title: String },
    ToggleTodo { id: u64 },
    RemoveTodo { id: u64 },
    TodosLoading,
    TodosLoaded { todos: Vec<Todo> },
    TodosFailed { error: String },
}

impl Action for AppAction {
    fn action_type(&self) -> &str {
        match self {
            Self::Increment => "increment",
            Self::Decrement => "decrement",
            Self::IncrementBy { .. } => "increment_by",
            Self::Reset => "reset",
            Self::AddTodo { .. } => "add_todo",
            Self::ToggleTodo { .. } => "toggle_todo",
            Self::RemoveTodo { .. } => "remove_todo",
            Self::TodosLoading => "todos_loading",
            Self::TodosLoaded { .. } => "todos_loaded",
            Self::TodosFailed { .. } => "todos_failed",
        }
    }
}

/// Reducer for the demo store
///
/// Rejects counter overflow, empty titles and unknown todo ids.
pub fn app_reducer(state: &mut AppState, action: &AppAction) -> Result<(), StoreError> {
    match action {
        AppAction::Increment => add_to_counter(state, action, 1),
        AppAction::Decrement => add_to_counter(state, action, -1),
        AppAction::IncrementBy { amount } => add_to_counter(state, action, *amount),
        AppAction::Reset => {
            state.counter = 0;
            Ok(())
        }
        AppAction::AddTodo { title } => {
            let title = title.trim();
            if title.is_empty() {
                return Err(StoreError::rejected(
                    action.action_type(),
                    "todo title cannot be empty",
                ));
            }
            let id = state.next_todo_id();
            state.todos.push(Todo {
                id,
                title: title.to_string(),
                done: false,
            });
            Ok(())
        }
        AppAction::ToggleTodo { id } => {
            let todo = state
                .todos
                .iter_mut()
                .find(|t| t.id == *id)
                .ok_or_else(|| unknown_todo(action, *id))?;
            todo.done = !todo.done;
            Ok(())
        }
        AppAction::RemoveTodo { id } => {
            let before = state.todos.len();
            state.todos.retain(|t| t.id != *id);
            if state.todos.len() == before {
                return Err(unknown_todo(action, *id));
            }
            Ok(())
        }
        AppAction::TodosLoading => {
            state.status = LoadStatus::Loading;
            Ok(())
        }
        AppAction::TodosLoaded { todos } => {
            state.todos = todos.clone();
            state.status = LoadStatus::Loaded;
            Ok(())
        }
        AppAction::TodosFailed { error } => {
            state.status = LoadStatus::Failed(error.clone());
            Ok(())
        }
    }
}

fn add_to_counter(state: &mut AppState, action: &AppAction, delta: i64) -> Result<(), StoreError> {
    state.counter = state
        .counter
        .checked_add(delta)
        .ok_or_else(|| StoreError::rejected(action.action_type(), "counter overflow"))?;
    Ok(())
}

fn unknown_todo(action: &AppAction, id: u64) -> StoreError {
    StoreError::rejected(action.action_type(), format!("unknown todo id {id}"))
}
