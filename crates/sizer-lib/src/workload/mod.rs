//! Workload sources
//!
//! This module turns declarative input into the fixed [`WorkloadSet`] a plan
//! is computed for. The engine only consumes the finished set, so other
//! sources (a live cluster snapshot, a generated set) can be plugged in by
//! implementing [`WorkloadSource`].

mod exclusions;
mod file;

pub use exclusions::WorkloadExclusions;
pub use file::WorkloadFile;

use crate::error::WorkloadError;
use crate::models::WorkloadSet;

/// Trait for anything that can supply the finalized workload set
pub trait WorkloadSource {
    /// Load the workloads to plan for
    fn load(&self) -> Result<WorkloadSet, WorkloadError>;
}
