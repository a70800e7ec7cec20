//! # Contracts
//!
//! Shared interface contracts for the store, the dispatch pipeline and the
//! configuration loader. Business crates depend on this crate only; reverse
//! dependencies are prohibited.
//!
//! ## Dispatch Model
//! - A store owns one state cell and one reducer (the base sink)
//! - Plain action records reach the reducer; everything else is intercepted by
//!   middleware before it gets there

mod action;
mod config;
mod error;
mod reducer;

pub use action::*;
pub use config::*;
pub use error::*;
pub use reducer::*;
