//! Host analysis and build sizing module
//!
//! Provides host resource snapshots and the adaptive job throttling used
//! to size the native compilation fan-out.

mod jobs;
mod resources;

pub use jobs::{
    compute_job_limit, JobPolicy, DEFAULT_CPU_UTILIZATION, DEFAULT_PER_JOB_MEMORY_COST,
};
pub use resources::*;
