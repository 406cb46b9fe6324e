//! Configuration settings for GemmForge
//!
//! Defines all configuration options, CLI arguments, and defaults
//! for plan assembly. Every knob the original build surface read from
//! the environment stays reachable the same way (`MAX_JOBS`,
//! `GPU_ARCHS`, `BUILD_TARGET`, `CK_DIR`, `PREBUILD_KERNELS`), with a
//! CLI flag layered on top.

use crate::toolchain::{parse_arch_list, BuildTarget, ToolkitVersion, DEFAULT_ARCHS};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// GemmForge - build planning for GPU GEMM solver extensions
#[derive(Parser, Debug, Clone)]
#[command(name = "gemmforge")]
#[command(author = "GemmForge Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Plan and stage GPU GEMM solver extension builds")]
#[command(long_about = r#"
GemmForge resolves the build configuration for GPU GEMM solver extension
modules and emits an explicit build plan for the native build orchestrator.

Features:
  - GPU arch validation and offload flag assembly
  - Toolkit-version-conditional device compiler flags
  - Adaptive build-job throttling from host CPU/memory
  - Meta-tree staging for the packaging step

Examples:
  gemmforge plan --archs "gfx90a;gfx942" -o plan.json
  MAX_JOBS=4 gemmforge plan                 # conservative job request
  gemmforge analyze                         # show host resources and job limit
  gemmforge flags --toolkit-version 6.2.41133-65
"#)]
pub struct CliArgs {
    /// Project root containing the solver sources and staged subtrees
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub root: PathBuf,

    /// Requested parallel compile jobs (0 = use default of 1)
    #[arg(short = 'j', long, env = "MAX_JOBS", default_value = "1", value_name = "NUM")]
    pub jobs: usize,

    /// GPU architectures, ';'-separated
    #[arg(long, env = "GPU_ARCHS", default_value = DEFAULT_ARCHS, value_name = "LIST")]
    pub archs: String,

    /// Build target
    #[arg(long, env = "BUILD_TARGET", value_enum, default_value = "auto")]
    pub target: BuildTarget,

    /// Kernel library checkout (defaults to <root>/3rdparty/composable_kernel)
    #[arg(long, env = "CK_DIR", value_name = "DIR")]
    pub kernel_dir: Option<PathBuf>,

    /// Prebuild all tuned operators (1 = on, 0 = off)
    #[arg(long, env = "PREBUILD_KERNELS", default_value = "0", value_name = "0|1")]
    pub prebuild_kernels: u8,

    /// Build directory (defaults to <root>/build)
    #[arg(long, value_name = "DIR")]
    pub build_dir: Option<PathBuf>,

    /// Host ML framework installation, probed for legacy generator headers
    #[arg(long, value_name = "DIR")]
    pub framework_dir: Option<PathBuf>,

    /// Host framework exposes the fp8 e4m3 dtype
    #[arg(long)]
    pub fp8: bool,

    /// Toolkit version override (skip the hipconfig probe)
    #[arg(long, value_name = "VERSION")]
    pub toolkit_version: Option<String>,

    /// Write the plan to this path instead of stdout
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Assemble the full build plan (default)
    #[command(name = "plan")]
    Plan,

    /// Show host resources and the computed job limit
    #[command(name = "analyze")]
    Analyze,

    /// Run source staging only
    #[command(name = "stage")]
    Stage,

    /// Print the assembled device flags
    #[command(name = "flags")]
    Flags,
}

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgeConfig {
    /// Project root
    pub root: PathBuf,
    /// Build directory
    pub build_dir: PathBuf,
    /// Meta-tree destination consumed by the packaging step
    pub meta_dir: PathBuf,
    /// Kernel library checkout
    pub kernel_dir: PathBuf,
    /// Host sources of the tuned solver modules
    pub solver_src_dir: PathBuf,
    /// Requested parallel jobs, normalized to >= 1
    pub requested_jobs: usize,
    /// Validated later; raw arch list elements
    pub archs: Vec<String>,
    /// Requested build target
    pub target: BuildTarget,
    /// Prebuild all tuned operators
    pub prebuild: bool,
    /// Host framework fp8 support
    pub fp8: bool,
    /// Host framework installation, if known
    pub framework_dir: Option<PathBuf>,
    /// Toolkit version override
    pub toolkit_version: Option<ToolkitVersion>,
}

impl ForgeConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        let root = args.root.clone();

        let build_dir = args
            .build_dir
            .clone()
            .unwrap_or_else(|| root.join("build"));
        let kernel_dir = args
            .kernel_dir
            .clone()
            .unwrap_or_else(|| root.join("3rdparty").join("composable_kernel"));

        let archs = parse_arch_list(&args.archs);
        if archs.is_empty() {
            return Err(format!("No GPU archs in '{}'", args.archs));
        }

        let toolkit_version = args
            .toolkit_version
            .as_deref()
            .map(|raw| {
                raw.parse::<ToolkitVersion>()
                    .map_err(|e| format!("Invalid toolkit version: {}", e))
            })
            .transpose()?;

        Ok(Self {
            meta_dir: root.join("gemmforge_meta"),
            solver_src_dir: root.join("solverlib").join("csrc"),
            build_dir,
            kernel_dir,
            requested_jobs: args.jobs.max(1),
            archs,
            target: args.target,
            prebuild: args.prebuild_kernels == 1,
            fp8: args.fp8,
            framework_dir: args.framework_dir.clone(),
            toolkit_version,
            root,
        })
    }
}
