// tuneforge-core/src/core/sizing.rs
// ============================================================================
// Module: Sizing Enumerations
// Description: Size tiers, hardware scope terms, scopes, and workloads.
// Purpose: Define the closed ordered enums the resolver dispatches on.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Sizing enums are closed and totally ordered. The size tier carries an
//! explicit ordinal table rather than relying on declaration position, so
//! tier comparisons are stable even if variants are ever reordered. Workload
//! class membership is expressed through explicit helper sets, never through
//! positional or container-identity tricks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Size Tier
// ============================================================================

/// Discrete sizing bucket derived from the hardware and workload profile.
///
/// Tiers are totally ordered: `Mini < Medium < Large < Mall < Bigt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeTier {
    /// Smallest deployments, typically below 4 GiB of RAM.
    Mini,
    /// Small to mid-size deployments.
    Medium,
    /// Standard production deployments.
    Large,
    /// Large multi-tenant deployments.
    Mall,
    /// The biggest supported deployments.
    Bigt,
}

impl SizeTier {
    /// All tiers in ascending order.
    pub const ALL: [Self; 5] = [Self::Mini, Self::Medium, Self::Large, Self::Mall, Self::Bigt];

    /// Explicit ordinal of the tier within the total order.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::Mini => 0,
            Self::Medium => 1,
            Self::Large => 2,
            Self::Mall => 3,
            Self::Bigt => 4,
        }
    }

    /// Canonical lowercase key of the tier as used in profile tables.
    #[must_use]
    pub const fn as_key(self) -> &'static str {
        match self {
            Self::Mini => "mini",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Mall => "mall",
            Self::Bigt => "bigt",
        }
    }

    /// Parses a tier from its canonical profile-table key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.as_key() == key)
    }
}

impl PartialOrd for SizeTier {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SizeTier {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ordinal().cmp(&other.ordinal())
    }
}

// ============================================================================
// SECTION: Hardware Scope Term
// ============================================================================

/// Sizing axis a rule entry is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeTerm {
    /// Sized by processor capacity.
    Cpu,
    /// Sized by memory capacity.
    Mem,
    /// Sized by network capacity.
    Net,
    /// Sized by disk performance.
    Disk,
    /// Sized by the overall blended profile.
    Overall,
}

impl ScopeTerm {
    /// Canonical lowercase key of the term as used in profile tables.
    #[must_use]
    pub const fn as_key(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Mem => "mem",
            Self::Net => "net",
            Self::Disk => "disk",
            Self::Overall => "overall",
        }
    }

    /// Parses a term from its canonical profile-table key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        [Self::Cpu, Self::Mem, Self::Net, Self::Disk, Self::Overall]
            .into_iter()
            .find(|term| term.as_key() == key)
    }
}

// ============================================================================
// SECTION: Tuning Scope
// ============================================================================

/// Named partition of configuration keys with its own cache namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TuningScope {
    /// Connection and authentication parameters.
    Connection,
    /// Memory pool parameters.
    Memory,
    /// Disk and I/O parameters.
    Disk,
    /// Write-ahead-log parameters.
    Wal,
    /// Query planner parameters.
    Query,
    /// Maintenance and vacuum parameters.
    Maintenance,
}

impl TuningScope {
    /// Canonical lowercase key of the scope as used in profile tables.
    #[must_use]
    pub const fn as_key(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Memory => "memory",
            Self::Disk => "disk",
            Self::Wal => "wal",
            Self::Query => "query",
            Self::Maintenance => "maintenance",
        }
    }

    /// Parses a scope from its canonical profile-table key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        [
            Self::Connection,
            Self::Memory,
            Self::Disk,
            Self::Wal,
            Self::Query,
            Self::Maintenance,
        ]
        .into_iter()
        .find(|scope| scope.as_key() == key)
    }
}

// ============================================================================
// SECTION: Workload
// ============================================================================

/// Workload class of the database deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workload {
    /// Read-mostly web application traffic.
    Web,
    /// Short transactional writes at high rate.
    Oltp,
    /// Long analytical scans and aggregation.
    Olap,
    /// Mixed transactional and analytical traffic.
    Mixed,
    /// Single-user desktop installation.
    Desktop,
}

impl Workload {
    /// Membership in the analytics-heavy class.
    #[must_use]
    pub const fn is_analytics_class(self) -> bool {
        matches!(self, Self::Olap | Self::Mixed)
    }

    /// Membership in the transaction-heavy class.
    #[must_use]
    pub const fn is_transactional_class(self) -> bool {
        matches!(self, Self::Web | Self::Oltp | Self::Mixed)
    }

    /// Membership in the class that tolerates larger per-query memory.
    #[must_use]
    pub const fn allows_large_work_buffers(self) -> bool {
        matches!(self, Self::Olap | Self::Desktop)
    }
}

// ============================================================================
// SECTION: Optimization Level
// ============================================================================

/// Aggressiveness tier chosen by the operator for correction tuning.
///
/// The level controls how much WAL flush latency the calibration loop is
/// allowed to trade for larger buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationLevel {
    /// No correction-tuning budget; accept generous flush latency.
    None,
    /// Conservative latency budget.
    Conservative,
    /// Balanced default budget.
    Balanced,
    /// Aggressive latency budget.
    Aggressive,
    /// Extreme latency budget for latency-critical deployments.
    Extreme,
}

impl OptimizationLevel {
    /// Allowed WAL flush loss time in milliseconds for this level.
    #[must_use]
    pub const fn allowed_loss_ms(self) -> f64 {
        match self {
            Self::None => 3000.0,
            Self::Conservative => 1000.0,
            Self::Balanced => 500.0,
            Self::Aggressive => 250.0,
            Self::Extreme => 100.0,
        }
    }
}
