//! Values accepted by the pipeline and what it returns for them

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use contracts::{Action, StoreError};
use store::Store;

use crate::pipeline::ComposedDispatch;

/// Boxed future returned by suspending thunks
pub type ThunkFuture<T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'static>>;

/// Result of one dispatch through the chain
pub type DispatchResult<A, R> = Result<Dispatched<A, R>, StoreError>;

/// Already-resolved `ThunkFuture`
///
/// For synchronous thunks in a pipeline whose output type is a future.
pub fn ready<T: Send + 'static>(result: Result<T, StoreError>) -> ThunkFuture<T> {
    Box::pin(std::future::ready(result))
}

type ThunkBody<S, A, E, R> = Box<
    dyn FnOnce(GetState<S, A>, ComposedDispatch<S, A, E, R>, Arc<E>) -> Result<R, StoreError>
        + Send,
>;

/// Read accessor handed to thunks
///
/// Exposes the store's state but not its base sink, so every write a thunk makes
/// goes back through the pipeline.
pub struct GetState<S, A> {
    store: Store<S, A>,
}

impl<S, A> Clone for GetState<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S, A> GetState<S, A>
where
    S: Clone + Send + 'static,
    A: Action,
{
    pub(crate) fn new(store: Store<S, A>) -> Self {
        Self { store }
    }

    /// Snapshot of the current state
    pub fn get(&self) -> S {
        self.store.get_state()
    }

    /// Run `f` against a snapshot of the current state
    ///
    /// No lock is held while `f` runs, so `f` may dispatch.
    pub fn with<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        f(&self.store.get_state())
    }
}

/// Unit of delayed work
///
/// Invoked by `ThunkMiddleware` with the state reader, the composed dispatch and
/// the pipeline's extra argument. Its return value is handed back verbatim from
/// `ComposedDispatch::dispatch`.
pub struct Thunk<S, A, E = (), R = ()> {
    name: Cow<'static, str>,
    body: ThunkBody<S, A, E, R>,
}

impl<S, A, E, R> Thunk<S, A, E, R> {
    /// Anonymous thunk
    pub fn new<F>(body: F) -> Self
    where
        F: FnOnce(GetState<S, A>, ComposedDispatch<S, A, E, R>, Arc<E>) -> Result<R, StoreError>
            + Send
            + 'static,
    {
        Self::named("anonymous", body)
    }

    /// Named thunk (the name shows up in logs, metrics and errors)
    pub fn named<F>(name: impl Into<Cow<'static, str>>, body: F) -> Self
    where
        F: FnOnce(GetState<S, A>, ComposedDispatch<S, A, E, R>, Arc<E>) -> Result<R, StoreError>
            + Send
            + 'static,
    {
        Self {
            name: name.into(),
            body: Box::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the body
    pub(crate) fn invoke(
        self,
        get_state: GetState<S, A>,
        dispatch: ComposedDispatch<S, A, E, R>,
        extra: Arc<E>,
    ) -> Result<R, StoreError> {
        (self.body)(get_state, dispatch, extra)
    }
}

impl<S, A, E, T> Thunk<S, A, E, ThunkFuture<T>>
where
    S: 'static,
    A: 'static,
    E: 'static,
    T: 'static,
{
    /// Suspending thunk
    ///
    /// `body` runs synchronously when dispatched and returns a future; the future
    /// is handed back to the caller, who drives it. While it is suspended the
    /// pipeline stays usable by everyone else.
    pub fn future<F, Fut>(name: impl Into<Cow<'static, str>>, body: F) -> Self
    where
        F: FnOnce(GetState<S, A>, ComposedDispatch<S, A, E, ThunkFuture<T>>, Arc<E>) -> Fut
            + Send
            + 'static,
        Fut: Future<Output = Result<T, StoreError>> + Send + 'static,
    {
        Self::named(name, move |get_state, dispatch, extra| {
            let future: ThunkFuture<T> = Box::pin(body(get_state, dispatch, extra));
            Ok(future)
        })
    }
}

impl<S, A, E, R> fmt::Debug for Thunk<S, A, E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thunk").field("name", &self.name).finish()
    }
}

/// A value submitted to the pipeline
pub enum Dispatchable<S, A, E = (), R = ()> {
    /// Plain record, destined for the reducer
    Action(A),
    /// Delayed work, intercepted by `ThunkMiddleware`
    Thunk(Thunk<S, A, E, R>),
}

impl<S, A: Action, E, R> Dispatchable<S, A, E, R> {
    pub fn is_thunk(&self) -> bool {
        matches!(self, Self::Thunk(_))
    }

    /// Action type or thunk name
    pub fn describe(&self) -> &str {
        match self {
            Self::Action(action) => action.action_type(),
            Self::Thunk(thunk) => thunk.name(),
        }
    }
}

impl<S, A, E, R> From<Thunk<S, A, E, R>> for Dispatchable<S, A, E, R> {
    fn from(thunk: Thunk<S, A, E, R>) -> Self {
        Self::Thunk(thunk)
    }
}

impl<S, A: fmt::Debug, E, R> fmt::Debug for Dispatchable<S, A, E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(action) => f.debug_tuple("Action").field(action).finish(),
            Self::Thunk(thunk) => f.debug_tuple("Thunk").field(&thunk.name).finish(),
        }
    }
}

/// What a dispatch produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched<A, R> {
    /// A plain record, as returned by the base sink (or a middleware)
    Action(A),
    /// A thunk's return value
    Output(R),
}

impl<A, R> Dispatched<A, R> {
    pub fn action(self) -> Option<A> {
        match self {
            Self::Action(action) => Some(action),
            Self::Output(_) => None,
        }
    }

    pub fn output(self) -> Option<R> {
        match self {
            Self::Output(output) => Some(output),
            Self::Action(_) => None,
        }
    }

    pub fn is_action(&self) -> bool {
        matches!(self, Self::Action(_))
    }
}
