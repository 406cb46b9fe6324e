//! Build plan assembly module
//!
//! The single orchestration entry point: snapshot the host, resolve the
//! target, validate archs, assemble flags, compute the job limit, stage
//! sources, and emit the plan the native build orchestrator consumes.
//! The job limit travels inside the plan instead of being written back
//! into ambient environment state, so every step stays independently
//! testable.

mod extension;

pub use extension::*;

use crate::config::ForgeConfig;
use crate::error::{GemmForgeError, IoResultExt, Result};
use crate::staging::{ensure_build_dirs, rename_cpp_to_cu, stage_meta_tree, StagingStats};
use crate::system::{compute_job_limit, JobPolicy, ResourceSnapshot};
use crate::toolchain::{
    assemble_device_flags, validate_archs, HipToolchain, ResolvedTarget, ToolkitVersion,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Complete build plan handed to the native build orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildPlan {
    /// Resolved platform
    pub target: ResolvedTarget,
    /// Toolkit version the flags were gated on
    pub toolkit_version: ToolkitVersion,
    /// Validated GPU archs
    pub archs: Vec<String>,
    /// Concurrent compile jobs the orchestrator may launch
    pub max_jobs: usize,
    /// Build directory holding the renamed device sources
    pub build_dir: PathBuf,
    /// Staged meta tree consumed by the packaging step
    pub meta_dir: PathBuf,
    /// Staging outcome
    pub staging: StagingStats,
    /// Extension modules to compile
    pub modules: Vec<ExtensionModule>,
    /// Full tuned-operator prebuild, when requested
    pub prebuild: Option<PrebuildRequest>,
}

impl BuildPlan {
    /// Assemble a plan for the current host
    pub fn assemble(config: &ForgeConfig) -> Result<Self> {
        let snapshot = ResourceSnapshot::collect();
        let hip = HipToolchain::detect();
        Self::assemble_with(config, &snapshot, hip.as_ref())
    }

    /// Assemble a plan against an explicit snapshot and toolchain probe
    pub fn assemble_with(
        config: &ForgeConfig,
        snapshot: &ResourceSnapshot,
        hip: Option<&HipToolchain>,
    ) -> Result<Self> {
        let target = config.target.resolve(hip)?;
        let toolkit_version = config
            .toolkit_version
            .or_else(|| hip.map(|h| h.version))
            .ok_or_else(|| {
                GemmForgeError::config(
                    "toolkit version unknown: no HIP toolchain detected and no --toolkit-version given",
                )
            })?;

        if !config.kernel_dir.is_dir() {
            return Err(GemmForgeError::KernelLibraryMissing(
                config.kernel_dir.clone(),
            ));
        }

        validate_archs(&config.archs)?;
        let toolchain_flags = assemble_device_flags(&config.archs, toolkit_version);

        let max_jobs = compute_job_limit(config.requested_jobs, snapshot, &JobPolicy::default())?;
        info!(
            requested = config.requested_jobs,
            max_jobs, "computed build-job limit"
        );

        ensure_build_dirs(&config.build_dir)?;
        let renamed = rename_cpp_to_cu(
            std::slice::from_ref(&config.solver_src_dir),
            &config.build_dir,
        )?;
        let mut staging = stage_meta_tree(&config.root, &config.meta_dir)?;
        staging.sources_renamed = renamed.len();

        let generator_define = legacy_generator_define(config.framework_dir.as_deref());
        let modules = solver_modules(
            &config.build_dir,
            &toolchain_flags,
            config.fp8,
            generator_define,
        );

        let prebuild = config
            .prebuild
            .then(|| PrebuildRequest::full(&config.root));

        Ok(Self {
            target,
            toolkit_version,
            archs: config.archs.clone(),
            max_jobs,
            build_dir: config.build_dir.clone(),
            meta_dir: config.meta_dir.clone(),
            staging,
            modules,
            prebuild,
        })
    }

    /// Serialize the plan as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the plan to a file
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?).with_path(path)
    }

    /// Print plan summary to console
    pub fn print_summary(&self) {
        println!("=== Build Plan ===\n");
        println!("Target:    {:?}", self.target);
        println!("Toolkit:   {}", self.toolkit_version);
        println!("Archs:     {}", self.archs.join(", "));
        println!("Max jobs:  {}", self.max_jobs);
        println!("Build dir: {}", self.build_dir.display());
        println!(
            "Staged:    {} files ({}) into {}",
            self.staging.files_staged,
            humansize::format_size(self.staging.bytes_staged, humansize::BINARY),
            self.meta_dir.display()
        );
        println!("\nModules:");
        for module in &self.modules {
            println!(
                "  {} <- {} (links: {})",
                module.name,
                module
                    .sources
                    .iter()
                    .map(|s| s.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                module.libraries.join(", ")
            );
        }
        if let Some(prebuild) = &self.prebuild {
            println!(
                "\nPrebuild: {} (excluding {} ops)",
                prebuild.op_selection,
                prebuild.excluded_ops.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CliArgs, ForgeConfig};
    use crate::toolchain::BuildTarget;
    use clap::Parser;
    use std::fs;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn project_root() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("3rdparty/composable_kernel")).unwrap();
        fs::write(root.join("3rdparty/composable_kernel/README"), "ck").unwrap();
        fs::create_dir_all(root.join("hsa")).unwrap();
        fs::write(root.join("hsa/solver.co"), "blob").unwrap();
        fs::create_dir_all(root.join("csrc")).unwrap();
        fs::write(root.join("csrc/ops.cpp"), "// ops").unwrap();
        fs::create_dir_all(root.join("solverlib/csrc")).unwrap();
        fs::write(root.join("solverlib/csrc/rocsolgemm.cpp"), "// rocblas").unwrap();
        fs::write(root.join("solverlib/csrc/hipbsolgemm.cpp"), "// hipblaslt").unwrap();
        tmp
    }

    fn config_for(root: &Path) -> ForgeConfig {
        for var in ["MAX_JOBS", "GPU_ARCHS", "BUILD_TARGET", "CK_DIR", "PREBUILD_KERNELS"] {
            std::env::remove_var(var);
        }
        let args = CliArgs::try_parse_from([
            "gemmforge",
            "--root",
            root.to_str().unwrap(),
            "--target",
            "rocm",
            "--toolkit-version",
            "6.2.41133-65",
        ])
        .unwrap();
        ForgeConfig::from_cli(&args).unwrap()
    }

    #[test]
    fn test_assemble_full_plan() {
        let tmp = project_root();
        let config = config_for(tmp.path());
        let snapshot = ResourceSnapshot::from_raw(16, 40 * GIB);

        let plan = BuildPlan::assemble_with(&config, &snapshot, None).unwrap();

        assert_eq!(plan.target, ResolvedTarget::Rocm);
        assert_eq!(plan.archs, vec!["native"]);
        // Conservative default request of 1 gets memory-throttled to 4
        assert_eq!(plan.max_jobs, 4);
        assert_eq!(plan.modules.len(), 2);
        assert_eq!(plan.staging.sources_renamed, 2);
        assert!(config.build_dir.join("rocsolgemm.cu").is_file());
        assert!(config.build_dir.join("hipbsolgemm.cu").is_file());
        assert!(config.meta_dir.join("csrc/ops.cpp").is_file());
        assert!(plan.prebuild.is_none());
    }

    #[test]
    fn test_assemble_requires_kernel_library() {
        let tmp = project_root();
        let mut config = config_for(tmp.path());
        config.kernel_dir = tmp.path().join("missing");

        let snapshot = ResourceSnapshot::from_raw(8, 32 * GIB);
        let err = BuildPlan::assemble_with(&config, &snapshot, None).unwrap_err();
        assert!(matches!(err, GemmForgeError::KernelLibraryMissing(_)));
    }

    #[test]
    fn test_assemble_rejects_bad_arch() {
        let tmp = project_root();
        let mut config = config_for(tmp.path());
        config.archs = vec!["gfx1030".to_string()];

        let snapshot = ResourceSnapshot::from_raw(8, 32 * GIB);
        let err = BuildPlan::assemble_with(&config, &snapshot, None).unwrap_err();
        assert!(matches!(err, GemmForgeError::UnsupportedArch { .. }));
    }

    #[test]
    fn test_assemble_needs_a_toolkit_version() {
        let tmp = project_root();
        let mut config = config_for(tmp.path());
        config.toolkit_version = None;

        let snapshot = ResourceSnapshot::from_raw(8, 32 * GIB);
        let err = BuildPlan::assemble_with(&config, &snapshot, None).unwrap_err();
        assert!(matches!(err, GemmForgeError::ConfigError(_)));
    }

    #[test]
    fn test_assemble_auto_target_without_toolchain_fails() {
        let tmp = project_root();
        let mut config = config_for(tmp.path());
        config.target = BuildTarget::Auto;

        let snapshot = ResourceSnapshot::from_raw(8, 32 * GIB);
        let err = BuildPlan::assemble_with(&config, &snapshot, None).unwrap_err();
        assert!(matches!(err, GemmForgeError::UnsupportedTarget(_)));
    }

    #[test]
    fn test_prebuild_request_carried_in_plan() {
        let tmp = project_root();
        let mut config = config_for(tmp.path());
        config.prebuild = true;

        let snapshot = ResourceSnapshot::from_raw(8, 32 * GIB);
        let plan = BuildPlan::assemble_with(&config, &snapshot, None).unwrap();
        let prebuild = plan.prebuild.unwrap();
        assert_eq!(prebuild.excluded_ops.len(), 4);
    }

    #[test]
    fn test_plan_serializes_to_json() {
        let tmp = project_root();
        let config = config_for(tmp.path());
        let snapshot = ResourceSnapshot::from_raw(8, 32 * GIB);

        let plan = BuildPlan::assemble_with(&config, &snapshot, None).unwrap();
        let json = plan.to_json().unwrap();
        assert!(json.contains("rocsolidxgemm_"));
        assert!(json.contains("\"max_jobs\""));

        let parsed: BuildPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.max_jobs, plan.max_jobs);
    }
}
