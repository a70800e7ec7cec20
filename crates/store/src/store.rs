//! Store - state cell, reducer and base dispatch sink

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, ThreadId};

use contracts::{Action, Reducer, StoreError};
use tracing::{debug, instrument, warn};

use crate::listener::{Listener, ListenerSet, SubscriberId};
use crate::metrics::StoreMetrics;

/// Recover the guard from a poisoned lock
///
/// The reducer only ever mutates a working copy, so a panic while a lock is held
/// cannot leave a half-applied state behind.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct StoreInner<S, A> {
    name: String,
    state: Mutex<S>,
    reducer: RwLock<Arc<dyn Reducer<S, A>>>,
    listeners: Mutex<ListenerSet<S>>,
    /// Thread currently running the reducer, and the action it is reducing
    reducing: Mutex<Option<(ThreadId, String)>>,
    metrics: StoreMetrics,
}

/// Handle to a store
///
/// Cheap to clone; all clones share the same state cell. Only `apply` mutates
/// the state, synchronously and atomically per action.
pub struct Store<S, A> {
    inner: Arc<StoreInner<S, A>>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.name)
            .field("listeners", &lock(&self.inner.listeners).len())
            .field("metrics", &self.inner.metrics.snapshot())
            .finish()
    }
}

impl<S, A> Store<S, A> {
    /// Store name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Store counters
    pub fn metrics(&self) -> &StoreMetrics {
        &self.inner.metrics
    }
}

impl<S, A> Store<S, A>
where
    S: Clone + Send + 'static,
    A: Action,
{
    /// Create a store with the default name
    pub fn new(initial_state: S, reducer: impl Reducer<S, A> + 'static) -> Self {
        Self::with_name("store", initial_state, reducer)
    }

    /// Create a named store (the name shows up in logs and metrics)
    pub fn with_name(
        name: impl Into<String>,
        initial_state: S,
        reducer: impl Reducer<S, A> + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                name: name.into(),
                state: Mutex::new(initial_state),
                reducer: RwLock::new(Arc::new(reducer)),
                listeners: Mutex::new(ListenerSet::new()),
                reducing: Mutex::new(None),
                metrics: StoreMetrics::new(),
            }),
        }
    }

    /// Snapshot of the current state
    pub fn get_state(&self) -> S {
        lock(&self.inner.state).clone()
    }

    /// Borrow the current state without cloning it
    ///
    /// The state lock is held while `f` runs; `f` must not dispatch.
    pub fn with_state<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        f(&lock(&self.inner.state))
    }

    /// Base dispatch sink
    ///
    /// Runs the reducer against a working copy of the state and commits it only
    /// on success, then notifies subscribers with the latest state. Returns the
    /// applied action.
    ///
    /// # Errors
    /// - `StoreError::ReducerDispatch` if called from inside this store's reducer
    /// - whatever the reducer returns to refuse the action
    #[instrument(
        name = "store_apply",
        skip(self, action),
        fields(store = %self.inner.name, action_type = action.action_type())
    )]
    pub fn apply(&self, action: A) -> Result<A, StoreError> {
        self.ensure_not_reducing(&action)?;

        let reducer = Arc::clone(
            &self
                .inner
                .reducer
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        );

        {
            let mut state = lock(&self.inner.state);
            let _reducing = ReducingGuard::enter(&self.inner.reducing, action.action_type());

            let mut draft = state.clone();
            if let Err(e) = reducer.reduce(&mut draft, &action) {
                self.inner.metrics.inc_rejected_count();
                observability::record_action_rejected(&self.inner.name, action.action_type());
                warn!(store = %self.inner.name, error = %e, "Action rejected by reducer");
                return Err(e);
            }
            *state = draft;
        }

        self.inner.metrics.inc_applied_count();
        observability::record_action_applied(&self.inner.name, action.action_type());
        debug!(store = %self.inner.name, action = ?action, "Action applied");

        self.notify();

        Ok(action)
    }

    /// Register a change listener
    pub fn subscribe(&self, listener: impl Fn(&S) + Send + Sync + 'static) -> SubscriberId {
        let listener: Listener<S> = Arc::new(listener);
        let id = lock(&self.inner.listeners).insert(listener);
        debug!(store = %self.inner.name, subscriber = %id, "Listener subscribed");
        id
    }

    /// Remove a change listener
    ///
    /// Returns false if the id was not (or no longer) subscribed.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = lock(&self.inner.listeners).remove(id);
        if removed {
            debug!(store = %self.inner.name, subscriber = %id, "Listener unsubscribed");
        }
        removed
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        lock(&self.inner.listeners).len()
    }

    /// Swap the reducer; subsequent applies use the new one
    pub fn replace_reducer(&self, reducer: impl Reducer<S, A> + 'static) {
        let mut slot = self
            .inner
            .reducer
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Arc::new(reducer);
        debug!(store = %self.inner.name, "Reducer replaced");
    }

    fn ensure_not_reducing(&self, action: &A) -> Result<(), StoreError> {
        let reducing = lock(&self.inner.reducing);
        match reducing.as_ref() {
            Some((thread_id, active)) if *thread_id == thread::current().id() => {
                warn!(
                    store = %self.inner.name,
                    reducing = %active,
                    incoming = action.action_type(),
                    "Dispatch from inside reducer refused"
                );
                Err(StoreError::ReducerDispatch {
                    action_type: active.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Call every listener registered at the time of the commit
    ///
    /// Each listener reads the state when it is called, so a listener running
    /// after a nested dispatch sees the newer state.
    fn notify(&self) {
        let listeners = lock(&self.inner.listeners).snapshot();
        for listener in &listeners {
            let state = self.get_state();
            listener(&state);
        }
        self.inner.metrics.add_notify_count(listeners.len() as u64);
    }
}

/// Marks the current thread as reducing until dropped (also on panic)
struct ReducingGuard<'a> {
    slot: &'a Mutex<Option<(ThreadId, String)>>,
}

impl<'a> ReducingGuard<'a> {
    fn enter(slot: &'a Mutex<Option<(ThreadId, String)>>, action_type: &str) -> Self {
        *lock(slot) = Some((thread::current().id(), action_type.to_string()));
        Self { slot }
    }
}

impl Drop for ReducingGuard<'_> {
    fn drop(&mut self) {
        *lock(self.slot) = None;
    }
}
