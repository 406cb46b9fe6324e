//! Error types for GemmForge
//!
//! This module defines all error types used throughout the application,
//! providing detailed error information for debugging and user feedback.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for GemmForge operations
#[derive(Error, Debug)]
pub enum GemmForgeError {
    /// I/O error during staging or probing
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File or directory not found
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Kernel library checkout is missing
    #[error("Kernel library not found at '{0}': clone the project with submodules or point CK_DIR at a checkout")]
    KernelLibraryMissing(PathBuf),

    /// GPU architecture not in the allow-list
    #[error("GPU arch '{arch}' is invalid or not supported (allowed: {allowed})")]
    UnsupportedArch { arch: String, allowed: String },

    /// Build target cannot be built on this host
    #[error("Unsupported build target '{0}': only the ROCm toolchain is supported")]
    UnsupportedTarget(String),

    /// Toolkit version string could not be parsed
    #[error("Invalid toolkit version '{0}'")]
    InvalidVersion(String),

    /// Job-throttling policy constant outside its valid range
    #[error("Invalid policy constant: {0}")]
    InvalidPolicyConstant(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Staging error with custom message
    #[error("Staging error at '{path}': {message}")]
    StagingError { path: PathBuf, message: String },

    /// Plan serialization error
    #[error("Plan serialization error: {0}")]
    PlanError(String),

    /// Multiple errors occurred
    #[error("Multiple errors occurred ({count} errors)")]
    MultipleErrors {
        count: usize,
        errors: Vec<GemmForgeError>,
    },
}

impl GemmForgeError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an unsupported-arch error listing the allow-list
    pub fn unsupported_arch(arch: impl Into<String>, allowed: &[&str]) -> Self {
        Self::UnsupportedArch {
            arch: arch.into(),
            allowed: allowed.join(", "),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a staging error
    pub fn staging(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::StagingError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-policy-constant error
    pub fn invalid_policy(message: impl Into<String>) -> Self {
        Self::InvalidPolicyConstant(message.into())
    }

    /// Check if this error is a permission issue
    pub fn is_permission_error(&self) -> bool {
        match self {
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. }
            | Self::NotFound(path)
            | Self::KernelLibraryMissing(path)
            | Self::StagingError { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for GemmForge operations
pub type Result<T> = std::result::Result<T, GemmForgeError>;

impl From<std::io::Error> for GemmForgeError {
    fn from(err: std::io::Error) -> Self {
        GemmForgeError::Io {
            path: std::path::PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for GemmForgeError {
    fn from(err: serde_json::Error) -> Self {
        GemmForgeError::PlanError(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| GemmForgeError::io(path, e))
    }
}

/// Collects multiple results into a single result
pub fn collect_errors<T>(results: Vec<Result<T>>) -> Result<Vec<T>> {
    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(value) => successes.push(value),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(successes)
    } else if errors.len() == 1 {
        Err(errors.into_iter().next().unwrap())
    } else {
        Err(GemmForgeError::MultipleErrors {
            count: errors.len(),
            errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = GemmForgeError::io("/test/path", io_err);
        assert!(err.path().is_some());
        assert_eq!(err.path().unwrap(), &PathBuf::from("/test/path"));
    }

    #[test]
    fn test_unsupported_arch_lists_allowed() {
        let err = GemmForgeError::unsupported_arch("gfx1234", &["native", "gfx90a"]);
        let msg = err.to_string();
        assert!(msg.contains("gfx1234"));
        assert!(msg.contains("native, gfx90a"));
    }

    #[test]
    fn test_permission_error_detection() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = GemmForgeError::io("/test", io_err);
        assert!(err.is_permission_error());

        let other = GemmForgeError::config("bad value");
        assert!(!other.is_permission_error());
    }

    #[test]
    fn test_collect_errors() {
        let results: Vec<Result<i32>> = vec![Ok(1), Ok(2), Ok(3)];
        let collected = collect_errors(results);
        assert!(collected.is_ok());
        assert_eq!(collected.unwrap(), vec![1, 2, 3]);

        let results: Vec<Result<i32>> = vec![
            Ok(1),
            Err(GemmForgeError::config("a")),
            Err(GemmForgeError::config("b")),
        ];
        let collected = collect_errors(results);
        assert!(collected.is_err());
    }
}
