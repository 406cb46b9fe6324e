//! GPU architecture allow-list
//!
//! Arch lists arrive as `;`-separated strings (`GPU_ARCHS` or CLI) and
//! every element must be a target the solver kernels are tuned for.

use crate::error::{GemmForgeError, Result};

/// Architectures the solver kernels build for. `native` asks the device
/// compiler to target whatever the build host has installed.
pub const ALLOWED_ARCHS: &[&str] = &[
    "native", "gfx90a", "gfx940", "gfx941", "gfx942", "gfx1100",
];

/// Default arch selection when none is configured
pub const DEFAULT_ARCHS: &str = "native";

/// Split a `;`-separated arch list into elements
pub fn parse_arch_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Validate every element against the allow-list
pub fn validate_archs(archs: &[String]) -> Result<()> {
    for arch in archs {
        if !ALLOWED_ARCHS.contains(&arch.as_str()) {
            return Err(GemmForgeError::unsupported_arch(arch, ALLOWED_ARCHS));
        }
    }
    if archs.is_empty() {
        return Err(GemmForgeError::config("empty GPU arch list"));
    }
    Ok(())
}

/// Map validated archs onto `--offload-arch=` device flags
pub fn offload_flags(archs: &[String]) -> Vec<String> {
    archs
        .iter()
        .map(|arch| format!("--offload-arch={}", arch))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arch_list() {
        assert_eq!(parse_arch_list("native"), vec!["native"]);
        assert_eq!(
            parse_arch_list("gfx90a;gfx942"),
            vec!["gfx90a", "gfx942"]
        );
        assert_eq!(parse_arch_list(" gfx90a ; gfx1100 "), vec!["gfx90a", "gfx1100"]);
        assert!(parse_arch_list("").is_empty());
    }

    #[test]
    fn test_validate_accepts_allowed() {
        let archs = parse_arch_list("native;gfx90a;gfx940;gfx941;gfx942;gfx1100");
        assert!(validate_archs(&archs).is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown() {
        let archs = parse_arch_list("gfx90a;gfx1030");
        let err = validate_archs(&archs).unwrap_err();
        assert!(err.to_string().contains("gfx1030"));
    }

    #[test]
    fn test_validate_rejects_empty_list() {
        assert!(validate_archs(&[]).is_err());
    }

    #[test]
    fn test_offload_flags() {
        let archs = parse_arch_list("gfx90a;gfx942");
        assert_eq!(
            offload_flags(&archs),
            vec!["--offload-arch=gfx90a", "--offload-arch=gfx942"]
        );
    }
}
