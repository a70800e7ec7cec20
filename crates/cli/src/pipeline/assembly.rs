//! Builds the demo store's composed dispatch from a `PipelineConfig`.

use std::sync::Arc;

use contracts::{LogLevel, MiddlewareConfig, MiddlewareKind, PipelineConfig};
use dispatcher::{configure, LoggerMiddleware, Middleware, ThunkMiddleware};
use store::Store;
use tracing::{info, Level};

use crate::app::{app_reducer, AppAction, AppDispatch, AppOutput, AppState, InMemoryTodoApi};

type AppMiddleware = Arc<dyn Middleware<AppState, AppAction, InMemoryTodoApi, AppOutput>>;

/// Store, middleware chain (outermost first) and todo service per `config`
pub fn build_dispatch(config: &PipelineConfig) -> AppDispatch {
    let store = Store::with_name(
        config.store.name.clone(),
        AppState::with_counter(config.store.initial_counter),
        app_reducer,
    );
    let api = InMemoryTodoApi::from_config(&config.extra);

    info!(
        store = %config.store.name,
        initial_counter = config.store.initial_counter,
        seed_todos = config.extra.seed_todos.len(),
        api_latency_ms = config.extra.api_latency_ms,
        "Assembling pipeline"
    );

    configure(store, config.middleware.iter().map(middleware_for), api)
}

/// Instantiate one configured middleware
pub fn middleware_for(config: &MiddlewareConfig) -> AppMiddleware {
    let name = config.display_name();
    match config.kind {
        MiddlewareKind::Thunk => Arc::new(ThunkMiddleware::named(name)),
        MiddlewareKind::Logger => {
            Arc::new(LoggerMiddleware::named(name, tracing_level(config.level)))
        }
    }
}

fn tracing_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}
