//! Adaptive build-job throttling
//!
//! Heavy native/GPU compilation jobs have a large peak memory footprint;
//! launching one per core can push a build host into OOM kills or swap
//! thrash. This module computes a safe concurrent-job count from a
//! [`ResourceSnapshot`] and a fixed cost policy, before any compiler
//! subprocess is spawned. The computation is pure: the caller hands the
//! result to the build orchestrator explicitly instead of round-tripping
//! it through ambient environment state.

use crate::error::{GemmForgeError, Result};
use crate::system::ResourceSnapshot;
use serde::{Deserialize, Serialize};

/// Peak memory cost of one compilation job. Measured on the GEMM solver
/// translation units at their default internal thread count.
pub const DEFAULT_PER_JOB_MEMORY_COST: u64 = 9 * 1024 * 1024 * 1024;

/// Share of logical cores the build is allowed to occupy.
pub const DEFAULT_CPU_UTILIZATION: f64 = 0.8;

/// Fixed policy constants for job throttling
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JobPolicy {
    /// Peak memory footprint of one job, in bytes. Must be > 0.
    pub per_job_memory_cost: u64,
    /// Maximum fraction of logical cores usable for jobs, in (0, 1].
    pub cpu_utilization: f64,
}

impl Default for JobPolicy {
    fn default() -> Self {
        Self {
            per_job_memory_cost: DEFAULT_PER_JOB_MEMORY_COST,
            cpu_utilization: DEFAULT_CPU_UTILIZATION,
        }
    }
}

impl JobPolicy {
    /// Validate the policy constants
    pub fn validate(&self) -> Result<()> {
        if self.per_job_memory_cost == 0 {
            return Err(GemmForgeError::invalid_policy(
                "per-job memory cost must be positive",
            ));
        }
        if !(self.cpu_utilization > 0.0 && self.cpu_utilization <= 1.0) {
            return Err(GemmForgeError::invalid_policy(format!(
                "CPU utilization fraction {} outside (0, 1]",
                self.cpu_utilization
            )));
        }
        Ok(())
    }

    /// Maximum job count justified by the core count: at least 1, at most
    /// `floor(cores * utilization)`
    pub fn cpu_ceiling(&self, snapshot: &ResourceSnapshot) -> usize {
        let scaled = (snapshot.available_cpu_count() as f64 * self.cpu_utilization).floor();
        (scaled as usize).max(1)
    }

    /// Maximum job count justified by available memory. May be 0.
    pub fn memory_ceiling(&self, snapshot: &ResourceSnapshot) -> usize {
        (snapshot.available_memory_bytes() / self.per_job_memory_cost) as usize
    }
}

/// Compute the final concurrent-job count for a build.
///
/// Memory throttling only activates when `requested_jobs` is below the
/// CPU ceiling: a conservative request signals a resource-constrained
/// host worth double-checking against free memory. A request at or above
/// the ceiling passes through unchanged, without a memory check.
///
/// The result is always ≥ 1, so a build makes forward progress even with
/// no free memory at sampling time.
pub fn compute_job_limit(
    requested_jobs: usize,
    snapshot: &ResourceSnapshot,
    policy: &JobPolicy,
) -> Result<usize> {
    policy.validate()?;

    let cpu_ceiling = policy.cpu_ceiling(snapshot);
    if requested_jobs >= cpu_ceiling {
        return Ok(requested_jobs);
    }

    let memory_ceiling = policy.memory_ceiling(snapshot);
    Ok(cpu_ceiling.min(memory_ceiling).max(1))
}
