// tuneforge-core/src/core/request.rs
// ============================================================================
// Module: Tuning Request
// Description: Immutable-for-a-run input bundle for one tuning run.
// Purpose: Carry hardware, workload, ratio, and sizing inputs to the engines.
// Dependencies: crate::core::sizing, serde
// ============================================================================

//! ## Overview
//! A [`Request`] is owned exclusively by one tuning run. Every field is
//! read-only for the duration of the run except the two pool ratios inside
//! [`TuningRatios`], which only the convergence solver may adjust, and only
//! inside its own bump/decay loop.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::sizing::OptimizationLevel;
use crate::core::sizing::ScopeTerm;
use crate::core::sizing::SizeTier;
use crate::core::sizing::Workload;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Memory reserved for the operating system and auxiliary processes.
pub const BASE_RESERVED_BYTES: u64 = 256 * 1024 * 1024;

// ============================================================================
// SECTION: Hardware Specification
// ============================================================================

/// Disk performance characteristics of the data volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiskPerfSpec {
    /// Sustained random IOPS of a single device.
    pub random_iops: f64,
    /// Sustained sequential throughput in MiB/s of a single device.
    pub throughput_mibs: f64,
    /// Multiplier applied for striped RAID layouts; `1.0` for single disks.
    pub raid_scale: f64,
}

impl DiskPerfSpec {
    /// Effective random IOPS after RAID scaling.
    #[must_use]
    pub fn effective_iops(&self) -> f64 {
        self.random_iops * self.raid_scale
    }

    /// Effective sequential throughput in MiB/s after RAID scaling.
    #[must_use]
    pub fn effective_throughput(&self) -> f64 {
        self.throughput_mibs * self.raid_scale
    }
}

/// Hardware inputs for one tuning run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HardwareSpec {
    /// Number of virtual CPUs.
    pub vcpu: u32,
    /// Total physical memory in bytes.
    pub ram_bytes: u64,
    /// Disk performance of the data volume.
    pub disk: DiskPerfSpec,
}

impl HardwareSpec {
    /// Memory usable by the database after the base OS reservation.
    #[must_use]
    pub const fn usable_ram(&self) -> u64 {
        self.ram_bytes.saturating_sub(BASE_RESERVED_BYTES)
    }
}

// ============================================================================
// SECTION: Tuning Ratios
// ============================================================================

/// Numeric tuning ratios supplied by the caller.
///
/// `shared_buffers_ratio` and `max_work_buffer_ratio` are the two fields the
/// convergence solver mutates in place; everything else is read-only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuningRatios {
    /// Fraction of usable RAM assigned to the shared buffer pool.
    pub shared_buffers_ratio: f64,
    /// Fraction of the non-shared remainder assigned to work buffers.
    pub max_work_buffer_ratio: f64,
    /// Per-step increment applied to `shared_buffers_ratio`.
    pub shared_buffers_increment: f64,
    /// Per-step increment applied to `max_work_buffer_ratio`.
    pub work_buffer_increment: f64,
    /// Target ceiling for predicted memory use, as a fraction of usable RAM.
    pub memory_target_fraction: f64,
    /// Rollback ceiling slightly above the target; crossing it decays a step.
    pub memory_rollback_fraction: f64,
    /// Multiplier modeling concurrent use of the work-buffer allowance.
    pub usage_multiplier: f64,
    /// Fraction of the WAL buffer assumed dirty at flush time.
    pub wal_amount_ratio: f64,
    /// Scale factor feeding the hash-memory-multiplier adjustment.
    pub hash_mem_scale: f64,
}

impl Default for TuningRatios {
    fn default() -> Self {
        Self {
            shared_buffers_ratio: 0.25,
            max_work_buffer_ratio: 0.10,
            shared_buffers_increment: 0.0025,
            work_buffer_increment: 0.005,
            memory_target_fraction: 0.85,
            memory_rollback_fraction: 0.90,
            usage_multiplier: 1.0,
            wal_amount_ratio: 1.0,
            hash_mem_scale: 4.0,
        }
    }
}

// ============================================================================
// SECTION: Sizing Map
// ============================================================================

/// Resolved size tier for every hardware scope term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingMap {
    /// Tier derived from processor capacity.
    pub cpu: SizeTier,
    /// Tier derived from memory capacity.
    pub mem: SizeTier,
    /// Tier derived from network capacity.
    pub net: SizeTier,
    /// Tier derived from disk performance.
    pub disk: SizeTier,
    /// Blended overall tier.
    pub overall: SizeTier,
}

impl SizingMap {
    /// Builds a map assigning the same tier to every term.
    #[must_use]
    pub const fn uniform(tier: SizeTier) -> Self {
        Self {
            cpu: tier,
            mem: tier,
            net: tier,
            disk: tier,
            overall: tier,
        }
    }

    /// Translates a scope term into its resolved size tier.
    #[must_use]
    pub const fn tier_for(&self, term: ScopeTerm) -> SizeTier {
        match term {
            ScopeTerm::Cpu => self.cpu,
            ScopeTerm::Mem => self.mem,
            ScopeTerm::Net => self.net,
            ScopeTerm::Disk => self.disk,
            ScopeTerm::Overall => self.overall,
        }
    }
}

// ============================================================================
// SECTION: Request
// ============================================================================

/// Input bundle for one tuning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Hardware inputs.
    pub hardware: HardwareSpec,
    /// Workload class of the deployment.
    pub workload: Workload,
    /// Operator-chosen correction-tuning aggressiveness.
    pub optimization: OptimizationLevel,
    /// Numeric tuning ratios.
    pub ratios: TuningRatios,
    /// Resolved size tier per hardware scope term.
    pub sizing: SizingMap,
}
