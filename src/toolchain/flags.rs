//! Device compiler flag assembly
//!
//! Builds the device flag list for the solver translation units: offload
//! targets first, then the baseline backend tuning set, then flags gated
//! on the toolkit version. The gate table mirrors what the kernel
//! library's own build system enables per ROCm release. Newer toolkits
//! re-append a couple of baseline flags; the duplicates are harmless to
//! the compiler and kept as-is.

use crate::toolchain::{offload_flags, ToolkitVersion};

/// Backend tuning and warning-suppression flags applied on every toolkit
pub const BASE_DEVICE_FLAGS: &[&str] = &[
    "-mllvm",
    "-enable-post-misched=0",
    "-mllvm",
    "-amdgpu-early-inline-all=true",
    "-mllvm",
    "-amdgpu-function-calls=false",
    "-mllvm",
    "--amdgpu-kernarg-preload-count=16",
    "-mllvm",
    "-amdgpu-coerce-illegal-types=1",
    "-Wno-unused-result",
    "-Wno-switch-bool",
    "-Wno-vla-cxx-extension",
    "-Wno-undefined-func-template",
    "-fgpu-flush-denormals-to-zero",
];

/// Flags enabled by toolkit version gates
pub fn version_gated_flags(version: ToolkitVersion) -> Vec<String> {
    let mut flags = Vec::new();

    if version > ToolkitVersion::new(5, 7, 23302) {
        flags.push("-fno-offload-uniform-block".to_string());
    }
    if version > ToolkitVersion::new(6, 1, 40090) {
        flags.extend(["-mllvm", "-enable-post-misched=0"].map(String::from));
    }
    if version > ToolkitVersion::new(6, 2, 41132) {
        flags.extend(
            [
                "-mllvm",
                "-amdgpu-early-inline-all=true",
                "-mllvm",
                "-amdgpu-function-calls=false",
            ]
            .map(String::from),
        );
    }
    if version > ToolkitVersion::new(6, 2, 41133) && version < ToolkitVersion::new(6, 3, 0) {
        flags.extend(["-mllvm", "-amdgpu-coerce-illegal-types=1"].map(String::from));
    }

    flags
}

/// Assemble the full device flag list for a validated arch selection and
/// toolkit version
pub fn assemble_device_flags(archs: &[String], version: ToolkitVersion) -> Vec<String> {
    let mut flags = offload_flags(archs);
    flags.extend(BASE_DEVICE_FLAGS.iter().map(|s| s.to_string()));
    flags.extend(version_gated_flags(version));
    flags
}
