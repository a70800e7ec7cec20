//! Step scripts for `thunkctl run`.
//!
//! ```json
//! {
//!   "name": "smoke",
//!   "steps": [
//!     { "action": { "type": "increment" } },
//!     { "thunk": { "name": "increment_if_odd" } },
//!     { "parallel": [
//!         { "name": "fetch_todos" },
//!         { "name": "increment_async", "delay_ms": 10 }
//!     ] }
//!   ]
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::app::{fetch_todos, increment_async, increment_if_odd, AppAction, AppThunk};
use crate::error::{CliError, Result};

/// Ordered list of steps
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub name: Option<String>,
    pub steps: Vec<Step>,
}

/// One script step
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Dispatch a plain action
    Action(AppAction),
    /// Dispatch a thunk and await its result
    Thunk(ThunkStep),
    /// Dispatch every thunk first, then await them together
    Parallel(Vec<ThunkStep>),
}

/// Named demo thunk
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ThunkStep {
    IncrementIfOdd,
    IncrementAsync {
        #[serde(default)]
        delay_ms: u64,
    },
    FetchTodos,
}

impl ThunkStep {
    pub fn name(&self) -> &'static str {
        match self {
            Self::IncrementIfOdd => "increment_if_odd",
            Self::IncrementAsync { .. } => "increment_async",
            Self::FetchTodos => "fetch_todos",
        }
    }

    pub fn to_thunk(&self) -> AppThunk {
        match self {
            Self::IncrementIfOdd => increment_if_odd(),
            Self::IncrementAsync { delay_ms } => increment_async(Duration::from_millis(*delay_ms)),
            Self::FetchTodos => fetch_todos(),
        }
    }
}

impl Script {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::script_not_found(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let script: Script =
            serde_json::from_str(content).map_err(|e| CliError::script_parse(e.to_string()))?;
        if script.steps.is_empty() {
            return Err(CliError::script_parse("script has no steps"));
        }
        Ok(script)
    }

    /// Number of dispatches the script performs
    pub fn dispatch_count(&self) -> usize {
        self.steps
            .iter()
            .map(|step| match step {
                Step::Parallel(thunks) => thunks.len(),
                _ => 1,
            })
            .sum()
    }
}
