// tuneforge-core/src/runtime/mod.rs
// ============================================================================
// Module: Runtime Engines
// Description: Merge, numeric, disk, resolver, and solver engines.
// Purpose: House the computation stages that run over the core data model.
// Dependencies: crate::core, crate::interfaces, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! The runtime module holds the computation stages of a tuning run: the
//! depth-bounded deep merge that layers profile-table overlays, the pure
//! numeric helpers, the disk-catalogue interval matcher, the general-tune
//! resolver, and the correction-tuning convergence solver.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod disk;
pub mod merge;
pub mod numeric;
pub mod resolver;
pub mod solver;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use disk::DeviceClass;
pub use disk::DiskCatalogue;
pub use disk::DiskError;
pub use disk::DiskMetric;
pub use disk::SeriesBand;
pub use merge::AbsentAction;
pub use merge::DELETION_MARKER;
pub use merge::ListAction;
pub use merge::MergeError;
pub use merge::MergeOptions;
pub use merge::PresentAction;
pub use merge::apply_deletion_markers;
pub use merge::merge_all;
pub use merge::merge_into;
pub use merge::merge_owned;
pub use numeric::cap;
pub use numeric::cap_with_redirect;
pub use numeric::generalized_mean;
pub use numeric::realign;
pub use resolver::RunStats;
pub use resolver::ScopeStats;
pub use resolver::resolve_table;
pub use solver::CONVERGENCE_DRIFT_STEPS;
pub use solver::CONVERGENCE_ITERATION_CAP;
pub use solver::ConvergenceReport;
pub use solver::CorrectionOutcome;
pub use solver::FlushEstimate;
pub use solver::MemoryModel;
pub use solver::SEGMENT_ROTATION_MS;
pub use solver::SolverError;
pub use solver::WAL_BUFFER_FLOOR_BYTES;
pub use solver::WAL_DECAY_PAGES;
pub use solver::WAL_PAGE_BYTES;
pub use solver::WAL_SEGMENT_BYTES;
pub use solver::WAL_WRITER_DELAY_MS;
pub use solver::WalCalibration;
pub use solver::calibrate_wal_buffers;
pub use solver::converge_memory_pool;
pub use solver::estimate_flush_time;
pub use solver::run_correction;
pub use solver::solve_step_count;
