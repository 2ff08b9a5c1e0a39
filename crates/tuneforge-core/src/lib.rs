// tuneforge-core/src/lib.rs
// ============================================================================
// Module: TuneForge Core
// Description: Database-parameter tuning data model and computation engines.
// Purpose: Resolve declarative tuning profiles and converge numeric settings.
// Dependencies: serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! This crate derives database server parameter recommendations from a
//! hardware and workload description. A tuning run has two stages: general
//! tuning resolves a declarative, deep-mergeable profile table into valued
//! items with full provenance, and correction tuning refines the numeric
//! settings with a disk-catalogue classifier, a WAL flush-time calibration,
//! and a closed-form memory-pool convergence.
//! Invariants:
//! - Runs are deterministic: identical inputs produce identical responses.
//! - Per-entry computation failures are contained and logged, never fatal.
//! - Published items are append-only; only named engines update or remove.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::core::ManagedResponse;
pub use self::core::OptimizationLevel;
pub use self::core::ParamValue;
pub use self::core::ProfileTable;
pub use self::core::Request;
pub use self::core::ScopeTerm;
pub use self::core::SizeTier;
pub use self::core::TuningItem;
pub use self::core::TuningNamespace;
pub use self::core::TuningScope;
pub use self::core::Workload;
pub use self::core::compile_table;
pub use interfaces::ComputeCtx;
pub use interfaces::ComputeError;
pub use interfaces::ComputeRef;
pub use interfaces::ComputeRegistry;
pub use runtime::DiskCatalogue;
pub use runtime::MemoryModel;
pub use runtime::MergeOptions;
pub use runtime::SolverError;
pub use runtime::resolve_table;
pub use runtime::run_correction;
