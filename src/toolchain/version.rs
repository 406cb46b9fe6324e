//! Toolkit version parsing
//!
//! The ROCm/HIP toolchain reports its version in slightly different
//! shapes depending on the release channel: `"6.2.41133"`,
//! `"6.2.41133-65"`, sometimes with a dangling `-` or a leading tool
//! banner. Flag gating needs a total order over those, so everything is
//! normalized into a numeric triple plus an optional build number.

use crate::error::{GemmForgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parsed toolkit version with a total order matching release order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToolkitVersion {
    /// Major release
    pub major: u64,
    /// Minor release
    pub minor: u64,
    /// Patch level
    pub patch: u64,
    /// Trailing build number, when the channel appends one. A build
    /// number sorts after the bare triple.
    pub build: Option<u64>,
}

impl ToolkitVersion {
    /// Construct a bare triple
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            build: None,
        }
    }

    /// Parse the raw version string a toolchain reports. Takes the last
    /// whitespace-separated token, tolerates a dangling `-` and a
    /// `-`-separated build suffix.
    pub fn from_raw(raw: &str) -> Result<Self> {
        let token = raw
            .split_whitespace()
            .last()
            .ok_or_else(|| GemmForgeError::InvalidVersion(raw.to_string()))?;
        token.trim_end_matches('-').parse()
    }
}

impl FromStr for ToolkitVersion {
    type Err = GemmForgeError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || GemmForgeError::InvalidVersion(s.to_string());

        let (core, suffix) = match s.split_once('-') {
            Some((core, suffix)) => (core, Some(suffix)),
            None => (s, None),
        };

        let mut numbers = core.split('.');
        let major = numbers
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(invalid)?
            .parse()
            .map_err(|_| invalid())?;
        let minor = match numbers.next() {
            Some(p) => p.parse().map_err(|_| invalid())?,
            None => 0,
        };
        let patch = match numbers.next() {
            Some(p) => p.parse().map_err(|_| invalid())?,
            None => 0,
        };
        if numbers.next().is_some() {
            return Err(invalid());
        }

        // Non-numeric suffixes (rc tags etc.) are dropped rather than
        // rejected; only numeric build components participate in ordering
        let build = suffix.and_then(|b| b.parse().ok());

        Ok(Self {
            major,
            minor,
            patch,
            build,
        })
    }
}

impl fmt::Display for ToolkitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(build) = self.build {
            write!(f, "-{}", build)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_triple() {
        let v: ToolkitVersion = "6.2.41133".parse().unwrap();
        assert_eq!(v, ToolkitVersion::new(6, 2, 41133));
    }

    #[test]
    fn test_parse_with_build_suffix() {
        let v: ToolkitVersion = "6.2.41133-65".parse().unwrap();
        assert_eq!(v.build, Some(65));
        assert!(v > ToolkitVersion::new(6, 2, 41133));
    }

    #[test]
    fn test_from_raw_cleans_banner_and_dangling_dash() {
        let v = ToolkitVersion::from_raw("HIP version: 5.7.23302-").unwrap();
        assert_eq!(v, ToolkitVersion::new(5, 7, 23302));
    }

    #[test]
    fn test_short_versions_zero_fill() {
        let v: ToolkitVersion = "6.3".parse().unwrap();
        assert_eq!(v, ToolkitVersion::new(6, 3, 0));
    }

    #[test]
    fn test_ordering_matches_release_order() {
        let older: ToolkitVersion = "5.7.23302".parse().unwrap();
        let newer: ToolkitVersion = "6.1.40091".parse().unwrap();
        assert!(older < newer);
        assert!(newer < ToolkitVersion::new(6, 3, 0));
    }

    #[test]
    fn test_invalid_strings_are_errors() {
        assert!("".parse::<ToolkitVersion>().is_err());
        assert!("abc".parse::<ToolkitVersion>().is_err());
        assert!("6.2.1.9".parse::<ToolkitVersion>().is_err());
        assert!(ToolkitVersion::from_raw("   ").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let v: ToolkitVersion = "6.2.41133-65".parse().unwrap();
        assert_eq!(v.to_string(), "6.2.41133-65");
    }
}
