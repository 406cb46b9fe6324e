//! Build target resolution
//!
//! Maps the requested target (CLI/env, default `auto`) onto the platform
//! the plan will be built for. `auto` follows the detected toolchain;
//! only the ROCm path is buildable today.

use crate::error::{GemmForgeError, Result};
use crate::toolchain::ToolkitVersion;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Command;

/// Requested build target
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BuildTarget {
    /// Follow the detected toolchain
    #[default]
    Auto,
    /// Force the CUDA toolchain
    Cuda,
    /// Force the ROCm/HIP toolchain
    Rocm,
}

impl BuildTarget {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cuda => "cuda",
            Self::Rocm => "rocm",
        }
    }

    /// Resolve against the probed toolchain. `hip` carries the detected
    /// HIP toolkit, if any.
    pub fn resolve(&self, hip: Option<&HipToolchain>) -> Result<ResolvedTarget> {
        match (self, hip) {
            (Self::Rocm, _) | (Self::Auto, Some(_)) => Ok(ResolvedTarget::Rocm),
            (Self::Cuda, _) | (Self::Auto, None) => {
                Err(GemmForgeError::UnsupportedTarget(self.name().to_string()))
            }
        }
    }
}

/// Platform a plan is resolved for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedTarget {
    /// ROCm/HIP toolchain
    Rocm,
}

/// Detected HIP toolchain installation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HipToolchain {
    /// Installation root
    pub root: PathBuf,
    /// Toolkit version reported by the installation
    pub version: ToolkitVersion,
}

impl HipToolchain {
    /// Probe the host for a HIP toolchain: `ROCM_PATH`/`HIP_PATH` first,
    /// then the stock `/opt/rocm` location, confirmed via `hipconfig`.
    pub fn detect() -> Option<Self> {
        let root = std::env::var_os("ROCM_PATH")
            .or_else(|| std::env::var_os("HIP_PATH"))
            .map(PathBuf::from)
            .or_else(|| {
                let stock = PathBuf::from("/opt/rocm");
                stock.is_dir().then_some(stock)
            })?;

        let version = Self::query_version(&root)?;
        Some(Self { root, version })
    }

    fn query_version(root: &std::path::Path) -> Option<ToolkitVersion> {
        let hipconfig = root.join("bin").join("hipconfig");
        let output = Command::new(&hipconfig).arg("--version").output().ok()?;
        if !output.status.success() {
            return None;
        }
        let raw = String::from_utf8_lossy(&output.stdout);
        ToolkitVersion::from_raw(raw.trim()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toolchain() -> HipToolchain {
        HipToolchain {
            root: PathBuf::from("/opt/rocm"),
            version: ToolkitVersion::new(6, 2, 41133),
        }
    }

    #[test]
    fn test_auto_resolves_to_rocm_when_hip_present() {
        let resolved = BuildTarget::Auto.resolve(Some(&toolchain())).unwrap();
        assert_eq!(resolved, ResolvedTarget::Rocm);
    }

    #[test]
    fn test_forced_rocm_resolves_without_probe() {
        let resolved = BuildTarget::Rocm.resolve(None).unwrap();
        assert_eq!(resolved, ResolvedTarget::Rocm);
    }

    #[test]
    fn test_cuda_is_unsupported() {
        let err = BuildTarget::Cuda.resolve(Some(&toolchain())).unwrap_err();
        assert!(err.to_string().contains("cuda"));
    }

    #[test]
    fn test_auto_without_hip_is_unsupported() {
        assert!(BuildTarget::Auto.resolve(None).is_err());
    }
}
