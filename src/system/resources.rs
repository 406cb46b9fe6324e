//! Host resource detection
//!
//! Samples CPU and memory state once per invocation so the planner can
//! size the native compilation fan-out for the current host.

use serde::{Deserialize, Serialize};
use sysinfo::System;

/// Point-in-time snapshot of the host resources relevant to build sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// CPU information
    pub cpu: CpuInfo,
    /// Memory information
    pub memory: MemoryInfo,
}

/// CPU information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuInfo {
    /// Total number of logical CPUs, normalized to at least 1
    pub logical_cores: usize,
    /// Number of physical cores
    pub physical_cores: usize,
    /// CPU model name
    pub model: String,
    /// CPU architecture
    pub arch: String,
}

/// Memory information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryInfo {
    /// Total physical memory in bytes
    pub total: u64,
    /// Available memory in bytes
    pub available: u64,
    /// Used memory in bytes
    pub used: u64,
    /// Swap total in bytes
    pub swap_total: u64,
    /// Swap used in bytes
    pub swap_used: u64,
}

impl ResourceSnapshot {
    /// Collect a snapshot of the current host
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        ResourceSnapshot {
            cpu: CpuInfo::collect(&sys),
            memory: MemoryInfo::collect(&sys),
        }
    }

    /// Build a snapshot from raw values (used by tests and callers that
    /// already know the host shape, e.g. inside a scheduler allocation)
    pub fn from_raw(logical_cores: usize, available_memory: u64) -> Self {
        ResourceSnapshot {
            cpu: CpuInfo {
                logical_cores: logical_cores.max(1),
                physical_cores: logical_cores.max(1),
                model: String::new(),
                arch: std::env::consts::ARCH.to_string(),
            },
            memory: MemoryInfo {
                total: available_memory,
                available: available_memory,
                used: 0,
                swap_total: 0,
                swap_used: 0,
            },
        }
    }

    /// Logical core count, guaranteed ≥ 1
    pub fn available_cpu_count(&self) -> usize {
        self.cpu.logical_cores
    }

    /// Available physical memory in bytes
    pub fn available_memory_bytes(&self) -> u64 {
        self.memory.available
    }

    /// Print snapshot summary to console
    pub fn print_summary(&self) {
        println!("=== Host Resources ===\n");

        println!("CPU:");
        println!("  Model: {}", self.cpu.model);
        println!("  Logical cores: {}", self.cpu.logical_cores);
        println!("  Physical cores: {}", self.cpu.physical_cores);
        println!("  Architecture: {}", self.cpu.arch);

        println!("\nMemory:");
        println!(
            "  Total: {}",
            humansize::format_size(self.memory.total, humansize::BINARY)
        );
        println!(
            "  Available: {}",
            humansize::format_size(self.memory.available, humansize::BINARY)
        );
        println!(
            "  Used: {}",
            humansize::format_size(self.memory.used, humansize::BINARY)
        );
        if self.memory.swap_total > 0 {
            println!(
                "  Swap used: {} / {}",
                humansize::format_size(self.memory.swap_used, humansize::BINARY),
                humansize::format_size(self.memory.swap_total, humansize::BINARY)
            );
        }
    }
}

impl CpuInfo {
    /// Collect CPU information
    pub fn collect(sys: &System) -> Self {
        let model = sys
            .cpus()
            .first()
            .map(|c| c.brand().to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        CpuInfo {
            logical_cores: num_cpus::get().max(1),
            physical_cores: num_cpus::get_physical().max(1),
            model,
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

impl MemoryInfo {
    /// Collect memory information
    pub fn collect(sys: &System) -> Self {
        MemoryInfo {
            total: sys.total_memory(),
            available: sys.available_memory(),
            used: sys.used_memory(),
            swap_total: sys.total_swap(),
            swap_used: sys.used_swap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_collection() {
        let snapshot = ResourceSnapshot::collect();
        assert!(snapshot.available_cpu_count() >= 1);
        assert!(snapshot.memory.total > 0);
    }

    #[test]
    fn test_from_raw_normalizes_zero_cores() {
        let snapshot = ResourceSnapshot::from_raw(0, 1024);
        assert_eq!(snapshot.available_cpu_count(), 1);
        assert_eq!(snapshot.available_memory_bytes(), 1024);
    }
}
