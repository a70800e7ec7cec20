//! LoggerMiddleware - traces every value passing through the chain

use std::time::Instant;

use contracts::Action;
use tracing::{event, Level};

use crate::dispatchable::{DispatchResult, Dispatchable, Dispatched};
use crate::middleware::Middleware;
use crate::pipeline::{ComposedDispatch, Next};

/// Emits one event per dispatched value at a configurable level
///
/// Logs the action type (or thunk name), the outcome and the elapsed time.
/// Never alters or swallows the value.
#[derive(Debug, Clone)]
pub struct LoggerMiddleware {
    name: String,
    level: Level,
}

impl LoggerMiddleware {
    pub fn new(level: Level) -> Self {
        Self::named("logger", level)
    }

    pub fn named(name: impl Into<String>, level: Level) -> Self {
        Self {
            name: name.into(),
            level,
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl Default for LoggerMiddleware {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

// `event!` needs a constant level
macro_rules! log_at {
    ($level:expr, $($rest:tt)+) => {{
        let level: Level = $level;
        if level == Level::TRACE {
            event!(Level::TRACE, $($rest)+)
        } else if level == Level::DEBUG {
            event!(Level::DEBUG, $($rest)+)
        } else if level == Level::INFO {
            event!(Level::INFO, $($rest)+)
        } else if level == Level::WARN {
            event!(Level::WARN, $($rest)+)
        } else {
            event!(Level::ERROR, $($rest)+)
        }
    }};
}

impl<S, A, E, R> Middleware<S, A, E, R> for LoggerMiddleware
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
        _api: &ComposedDispatch<S, A, E, R>,
        value: Dispatchable<S, A, E, R>,
        next: Next<'_, S, A, E, R>,
    ) -> DispatchResult<A, R> {
        let kind = if value.is_thunk() { "thunk" } else { "action" };
        let label = value.describe().to_string();
        let started = Instant::now();

        log_at!(self.level, kind, value = %label, "Dispatching");

        let result = next.run(value);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(Dispatched::Action(_)) => {
                log_at!(self.level, kind, value = %label, elapsed_ms, outcome = "applied", "Dispatched")
            }
            Ok(Dispatched::Output(_)) => {
                log_at!(self.level, kind, value = %label, elapsed_ms, outcome = "returned", "Dispatched")
            }
            Err(e) => {
                log_at!(self.level, kind, value = %label, elapsed_ms, error = %e, "Dispatch failed")
            }
        }

        result
    }
}
