//! Reducer trait - the state transition run by the base sink

use crate::StoreError;

/// State transition function
///
/// Called by the store with a working copy of the state. Returning an error
/// discards the working copy, so a rejected action never leaves a partial update.
pub trait Reducer<S, A>: Send + Sync {
    /// Apply `action` to `state`
    ///
    /// # Errors
    /// Returns `StoreError::Rejected` (or any other variant) to refuse the action
    fn reduce(&self, state: &mut S, action: &A) -> Result<(), StoreError>;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(&mut S, &A) -> Result<(), StoreError> + Send + Sync,
{
    fn reduce(&self, state: &mut S, action: &A) -> Result<(), StoreError> {
        self(state, action)
    }
}
