//! # GemmForge - Build Planning for GPU GEMM Solver Extensions
//!
//! GemmForge resolves the build configuration for GPU GEMM solver
//! extension modules and emits an explicit, serializable build plan for
//! a downstream native build orchestrator. It never compiles device code
//! itself.
//!
//! ## Features
//!
//! - **GPU Arch Validation**: Allow-listed offload targets with
//!   `--offload-arch` flag assembly
//! - **Toolkit-Aware Flags**: Device compiler flags gated on the
//!   detected ROCm/HIP toolkit version
//! - **Adaptive Job Throttling**: Concurrent compile jobs sized from a
//!   host CPU/memory snapshot to avoid OOM and swap thrash
//! - **Source Staging**: Meta-tree assembly and `.cpp` → `.cu`
//!   translation-unit renaming into the build directory
//! - **Explicit Hand-off**: The computed job limit travels inside the
//!   emitted plan, not through ambient environment state
//!
//! ## Quick Start
//!
//! ```no_run
//! use gemmforge::config::{CliArgs, ForgeConfig};
//! use gemmforge::plan::BuildPlan;
//! use clap::Parser;
//!
//! let args = CliArgs::parse_from(["gemmforge", "--target", "rocm"]);
//! let config = ForgeConfig::from_cli(&args).unwrap();
//!
//! let plan = BuildPlan::assemble(&config).unwrap();
//! println!("{}", plan.to_json().unwrap());
//! ```
//!
//! ## Job Throttling
//!
//! ```
//! use gemmforge::system::{compute_job_limit, JobPolicy, ResourceSnapshot};
//!
//! // 16 cores at 0.8 utilization cap 12 jobs; 40 GiB free at 9 GiB per
//! // job caps 4. A conservative request of 1 is raised to 4.
//! let snapshot = ResourceSnapshot::from_raw(16, 40 * 1024 * 1024 * 1024);
//! let jobs = compute_job_limit(1, &snapshot, &JobPolicy::default()).unwrap();
//! assert_eq!(jobs, 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod plan;
pub mod staging;
pub mod system;
pub mod toolchain;

// Re-export commonly used types
pub use config::ForgeConfig;
pub use error::{GemmForgeError, Result};
pub use plan::BuildPlan;
pub use system::{compute_job_limit, JobPolicy, ResourceSnapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use gemmforge::prelude::*;
    //! ```

    pub use crate::config::{CliArgs, Commands, ForgeConfig};
    pub use crate::error::{GemmForgeError, Result};
    pub use crate::plan::{BuildPlan, ExtensionModule, PrebuildRequest};
    pub use crate::staging::{rename_cpp_to_cu, stage_meta_tree, StagingStats};
    pub use crate::system::{compute_job_limit, JobPolicy, ResourceSnapshot};
    pub use crate::toolchain::{BuildTarget, HipToolchain, ResolvedTarget, ToolkitVersion};
}
