//! Todo service handed to thunks as their extra argument

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use contracts::ExtraConfig;
use thiserror::Error;
use tracing::debug;

use super::state::Todo;

/// Network-level failure of the todo service
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("todo service unavailable")]
    Unavailable,
}

/// Remote todo service
#[trait_variant::make(TodoApi: Send)]
pub trait LocalTodoApi {
    /// Fetch the full todo list
    async fn fetch_todos(&self) -> Result<Vec<Todo>, ApiError>;

    /// Number of requests served so far
    fn request_count(&self) -> u64;
}

/// In-process stand-in for the todo service
///
/// Answers from a fixed seed list after an optional delay, or fails every
/// request when configured to.
#[derive(Debug, Default)]
pub struct InMemoryTodoApi {
    latency: Duration,
    fail_requests: bool,
    seed: Vec<String>,
    requests: AtomicU64,
}

impl InMemoryTodoApi {
    pub fn new(seed: Vec<String>) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    pub fn from_config(config: &ExtraConfig) -> Self {
        let api = Self::new(config.seed_todos.clone())
            .with_latency(Duration::from_millis(config.api_latency_ms));
        if config.fail_requests {
            api.failing()
        } else {
            api
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_requests = true;
        self
    }
}

impl TodoApi for InMemoryTodoApi {
    async fn fetch_todos(&self) -> Result<Vec<Todo>, ApiError> {
        let request = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(request, latency_ms = self.latency.as_millis() as u64, "Fetching todos");

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.fail_requests {
            return Err(ApiError::Unavailable);
        }

        Ok(self
            .seed
            .iter()
            .zip(1u64..)
            .map(|(title, id)| Todo {
                id,
                title: title.clone(),
                done: false,
            })
            .collect())
    }

    fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    // Only the `Send` variant, so method calls resolve unambiguously
    use super::{ApiError, InMemoryTodoApi, TodoApi};
    use contracts::ExtraConfig;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fetch_returns_seed() {
        let api = InMemoryTodoApi::new(vec!["a".into(), "b".into()]);
        let todos = api.fetch_todos().await.unwrap();

        assert_eq!(todos.len(), 2);
        assert_eq!(todos[1].id, 2);
        assert_eq!(todos[1].title, "b");
        assert_eq!(api.request_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_service() {
        let api = InMemoryTodoApi::new(vec!["a".into()])
            .with_latency(Duration::from_millis(1))
            .failing();
        assert_eq!(api.fetch_todos().await, Err(ApiError::Unavailable));
        assert_eq!(api.request_count(), 1);
    }

    #[test]
    fn test_from_config() {
        let config = ExtraConfig {
            api_latency_ms: 15,
            fail_requests: true,
            seed_todos: vec!["x".into()],
        };
        let api = InMemoryTodoApi::from_config(&config);
        assert_eq!(api.latency, Duration::from_millis(15));
        assert!(api.fail_requests);
        assert_eq!(api.seed, vec!["x"]);
    }
}
