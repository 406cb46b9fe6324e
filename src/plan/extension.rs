//! Extension module descriptors
//!
//! Describes each native extension module the orchestrator compiles:
//! sources, link libraries, and the host/device flag lists. The two
//! tuned GEMM solver modules are defined here; everything else about
//! their kernels lives in the kernel library.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Host compiler flags shared by the solver modules
pub const SOLVER_CXX_FLAGS: &[&str] = &["-O3", "-DLEGACY_HIPBLAS_DIRECT=ON"];

/// Device compiler flags shared by the solver modules, before the
/// toolchain flags are appended
pub const SOLVER_DEVICE_FLAGS: &[&str] = &[
    "-O3",
    "-U__CUDA_NO_HALF_OPERATORS__",
    "-U__CUDA_NO_HALF_CONVERSIONS__",
    "-ftemplate-depth=1024",
    "-DLEGACY_HIPBLAS_DIRECT=ON",
];

/// Define emitted when the host framework exposes the fp8 e4m3 dtype
pub const FP8_DEFINE: &str = "-DENABLE_TORCH_FP8";

/// Define emitted when the host framework still ships the pre-move
/// generator header
pub const LEGACY_GENERATOR_DEFINE: &str = "-DOLD_GENERATOR_PATH";

/// Relative path of the generator header that moved between framework
/// releases
const LEGACY_GENERATOR_HEADER: &str = "include/ATen/CUDAGeneratorImpl.h";

/// One native extension module to compile and link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionModule {
    /// Module name as exposed to the host framework
    pub name: String,
    /// Device source files
    pub sources: Vec<PathBuf>,
    /// Extra include directories
    pub include_dirs: Vec<PathBuf>,
    /// Libraries to link
    pub libraries: Vec<String>,
    /// Host compiler flags
    pub cxx_flags: Vec<String>,
    /// Device compiler flags
    pub device_flags: Vec<String>,
}

impl ExtensionModule {
    fn solver(
        name: &str,
        source: PathBuf,
        library: &str,
        toolchain_flags: &[String],
        generator_define: Option<&str>,
    ) -> Self {
        let mut cxx_flags: Vec<String> = SOLVER_CXX_FLAGS.iter().map(|s| s.to_string()).collect();
        let mut device_flags: Vec<String> =
            SOLVER_DEVICE_FLAGS.iter().map(|s| s.to_string()).collect();
        device_flags.extend(toolchain_flags.iter().cloned());

        if let Some(define) = generator_define {
            cxx_flags.push(define.to_string());
            device_flags.push(define.to_string());
        }

        Self {
            name: name.to_string(),
            sources: vec![source],
            include_dirs: Vec::new(),
            libraries: vec![library.to_string()],
            cxx_flags,
            device_flags,
        }
    }
}

/// Probe the host framework installation for the legacy generator header
pub fn legacy_generator_define(framework_dir: Option<&Path>) -> Option<&'static str> {
    let dir = framework_dir?;
    dir.join(LEGACY_GENERATOR_HEADER)
        .exists()
        .then_some(LEGACY_GENERATOR_DEFINE)
}

/// Build the descriptors for the two tuned GEMM solver modules. Sources
/// are the renamed `.cu` files the staging pass placed in the build dir.
pub fn solver_modules(
    build_dir: &Path,
    toolchain_flags: &[String],
    fp8: bool,
    generator_define: Option<&str>,
) -> Vec<ExtensionModule> {
    let rocblas_solver = ExtensionModule::solver(
        "rocsolidxgemm_",
        build_dir.join("rocsolgemm.cu"),
        "rocblas",
        toolchain_flags,
        generator_define,
    );

    let mut hipblaslt_solver = ExtensionModule::solver(
        "hipbsolidxgemm_",
        build_dir.join("hipbsolgemm.cu"),
        "hipblaslt",
        toolchain_flags,
        generator_define,
    );
    if fp8 {
        hipblaslt_solver.device_flags.push(FP8_DEFINE.to_string());
    }

    vec![rocblas_solver, hipblaslt_solver]
}

/// Operators excluded from a full prebuild: the attention modules carry
/// their own bindings and would collide with the tuned-op set
pub const EXCLUDED_PREBUILD_OPS: &[&str] = &[
    "module_mha_fwd",
    "module_mha_varlen_fwd",
    "module_mha_bwd",
    "module_mha_varlen_bwd",
];

/// Request to prebuild the full tuned-operator set, executed by the
/// downstream orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrebuildRequest {
    /// Operator selection ("all" minus the exclusions)
    pub op_selection: String,
    /// Operators left out of the prebuild
    pub excluded_ops: Vec<String>,
    /// Drop binding sources from the prebuild source set; the combined
    /// module ships its own
    pub skip_binding_sources: bool,
    /// Extra host source tree compiled into the combined module
    pub extra_src_dir: PathBuf,
}

impl PrebuildRequest {
    /// Standard full-prebuild request for a project root
    pub fn full(root: &Path) -> Self {
        Self {
            op_selection: "all".to_string(),
            excluded_ops: EXCLUDED_PREBUILD_OPS.iter().map(|s| s.to_string()).collect(),
            skip_binding_sources: true,
            extra_src_dir: root.join("csrc"),
        }
    }
}
