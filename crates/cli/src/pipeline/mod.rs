//! Pipeline assembly and script orchestration.

mod assembly;
mod orchestrator;
mod stats;

pub use assembly::build_dispatch;
pub use orchestrator::{Pipeline, RunConfig};
pub use stats::RunStats;
