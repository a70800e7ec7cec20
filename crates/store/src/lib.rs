//! # Store
//!
//! The single shared state cell and its base dispatch sink.
//!
//! Responsibilities:
//! - Hold the state and hand out snapshots
//! - Run the reducer for plain actions, atomically per action
//! - Notify subscribers after every committed change
//!
//! ## Example
//!
//! ```ignore
//! use store::Store;
//!
//! let store = Store::new(0i64, |state: &mut i64, action: &CounterAction| {
//!     *state += action.delta();
//!     Ok(())
//! });
//!
//! store.subscribe(|state: &i64| println!("counter = {state}"));
//! store.apply(CounterAction::Increment)?;
//! ```

mod listener;
mod metrics;
mod store;

pub use contracts::{Action, Reducer, StoreError};
pub use listener::{Listener, SubscriberId};
pub use metrics::{StoreMetrics, StoreMetricsSnapshot};
pub use store::Store;
