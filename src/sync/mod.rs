//! Synchronization engine
//!
//! - **reconcile**: computes the set difference between freshly fetched items
//!   and the existing board snapshot for one label
//! - **coordinator**: runs one polling cycle, fanning out one worker per due
//!   source under a global deadline

mod coordinator;
mod reconcile;

pub use coordinator::{http_sources, run_cycle, CycleReport, SourceEntry};
pub use reconcile::{reconcile, ReconciliationResult};
