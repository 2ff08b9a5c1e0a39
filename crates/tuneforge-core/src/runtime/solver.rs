// tuneforge-core/src/runtime/solver.rs
// ============================================================================
// Module: Convergence Solver
// Description: WAL flush-time calibration and memory-pool convergence.
// Purpose: Correction-tuning numeric core over the managed response.
// Dependencies: crate::core, crate::runtime::{disk, numeric}, tracing
// ============================================================================

//! ## Overview
//! Two independent numeric procedures share this module. The WAL calibration
//! estimates flush time for a candidate buffer size and decays the candidate
//! by a fixed page step until the estimate satisfies the allowed-loss budget;
//! the estimate is non-decreasing in buffer size and the candidate strictly
//! decreases, so the loop terminates. The memory-pool convergence solves a
//! quadratic for the step count that lands predicted memory use on the
//! target ceiling, applies the rounded step count in one shot, and then runs
//! a bump/decay stabilization loop that must settle within a couple of
//! iterations; needing three or more signals an inaccurate closed-form solve
//! and is logged, and a defensive cap turns a runaway loop into a hard
//! error instead of spinning.
//!
//! The solver is the only component allowed to mutate the request's pool
//! ratios, and it re-reads them on every loop iteration rather than caching
//! them across steps.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use tracing::warn;

use crate::core::request::Request;
use crate::core::request::TuningRatios;
use crate::core::response::ManagedResponse;
use crate::core::response::TuningItem;
use crate::core::response::TuningNamespace;
use crate::core::sizing::ScopeTerm;
use crate::core::sizing::TuningScope;
use crate::core::value::ParamValue;
use crate::runtime::disk::DiskCatalogue;
use crate::runtime::disk::DiskMetric;
use crate::runtime::numeric::cap;
use crate::runtime::numeric::realign;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// WAL page size in bytes.
pub const WAL_PAGE_BYTES: u64 = 8192;

/// WAL segment file size in bytes.
pub const WAL_SEGMENT_BYTES: u64 = 16 * 1024 * 1024;

/// Fixed open/close overhead per segment file rotation, in milliseconds.
pub const SEGMENT_ROTATION_MS: f64 = 0.5;

/// Pages subtracted per WAL calibration decay step.
pub const WAL_DECAY_PAGES: u64 = 16;

/// Smallest WAL buffer the calibration will decay to.
pub const WAL_BUFFER_FLOOR_BYTES: u64 = 64 * 1024;

/// Background writer delay assumed by the flush model, in milliseconds.
pub const WAL_WRITER_DELAY_MS: f64 = 200.0;

/// Defensive ceiling on stabilization iterations.
pub const CONVERGENCE_ITERATION_CAP: u32 = 16;

/// Combined step count at which the stabilization loop reports drift.
pub const CONVERGENCE_DRIFT_STEPS: u32 = 3;

/// One MiB in bytes, as a float.
const MIB: f64 = 1024.0 * 1024.0;

/// Coefficient magnitude below which the quadratic degenerates to linear.
const QUADRATIC_EPSILON: f64 = 1e-9;

// ============================================================================
// SECTION: Solver Errors
// ============================================================================

/// Error raised by the convergence solver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// The quadratic step-count solve has no usable root.
    #[error(
        "memory step solve is degenerate: a={a}, b={b}, c={c}, discriminant={discriminant}"
    )]
    DegenerateSolve {
        /// Quadratic coefficient.
        a: f64,
        /// Linear coefficient.
        b: f64,
        /// Constant coefficient.
        c: f64,
        /// Discriminant of the quadratic, NaN for the linear degenerate case.
        discriminant: f64,
    },
    /// The stabilization loop exceeded its defensive iteration cap.
    #[error("memory stabilization needed {iterations} iterations (cap {cap})")]
    IterationCapExceeded {
        /// Iterations consumed before aborting.
        iterations: u32,
        /// Configured cap.
        cap: u32,
    },
}

// ============================================================================
// SECTION: WAL Flush Model
// ============================================================================

/// Decomposed flush-time estimate for one candidate buffer size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlushEstimate {
    /// Bytes assumed dirty at flush time.
    pub data_amount: u64,
    /// Segment files the flush touches.
    pub segment_files: u64,
    /// Time spent rotating segment files, in milliseconds.
    pub rotation_ms: f64,
    /// Time spent writing data, in milliseconds.
    pub write_ms: f64,
    /// Extra writer-delay time, in milliseconds.
    pub delay_ms: f64,
    /// Total estimated flush time, in milliseconds.
    pub total_ms: f64,
}

/// Estimates the time to flush a WAL buffer of `buffer_bytes`.
///
/// The estimate is non-decreasing in `buffer_bytes` for fixed remaining
/// inputs, which is what guarantees the calibration loop terminates. For an
/// `amount_ratio` above one, `floor(amount_ratio)` writer delays apply, one
/// fewer when the ratio is exactly integral.
#[must_use]
pub fn estimate_flush_time(
    buffer_bytes: u64,
    amount_ratio: f64,
    segment_bytes: u64,
    writer_delay_ms: f64,
    throughput_mibs: f64,
) -> FlushEstimate {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "Buffer sizes stay far below the f64 mantissa limit and the ratio is non-negative."
    )]
    let data_amount = (buffer_bytes as f64 * amount_ratio.max(0.0)).floor() as u64;
    let segment_files = if segment_bytes == 0 {
        1
    } else {
        data_amount / segment_bytes + 1
    };
    #[allow(
        clippy::cast_precision_loss,
        reason = "Segment counts stay far below the f64 mantissa limit."
    )]
    let rotation_ms = segment_files as f64 * SEGMENT_ROTATION_MS;
    #[allow(
        clippy::cast_precision_loss,
        reason = "Byte counts stay far below the f64 mantissa limit."
    )]
    let write_ms = if throughput_mibs > 0.0 {
        (data_amount as f64 / MIB) / throughput_mibs * 1000.0
    } else {
        f64::INFINITY
    };
    let delay_ms = if amount_ratio > 1.0 {
        let mut rounds = amount_ratio.floor();
        if amount_ratio.fract() == 0.0 {
            rounds -= 1.0;
        }
        rounds * writer_delay_ms
    } else {
        0.0
    };
    FlushEstimate {
        data_amount,
        segment_files,
        rotation_ms,
        write_ms,
        delay_ms,
        total_ms: rotation_ms + write_ms + delay_ms,
    }
}

/// Outcome of the WAL buffer decay calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalCalibration {
    /// Calibrated buffer size in bytes.
    pub buffer_bytes: u64,
    /// Decay iterations performed; zero when the start already satisfied
    /// the budget.
    pub iterations: u32,
    /// Flush estimate for the calibrated size.
    pub estimate: FlushEstimate,
}

/// Decays a candidate WAL buffer until its flush estimate fits the budget.
///
/// The candidate starts page-realigned upward and shrinks by
/// [`WAL_DECAY_PAGES`] pages per iteration, never below
/// [`WAL_BUFFER_FLOOR_BYTES`].
#[must_use]
pub fn calibrate_wal_buffers(
    initial_bytes: u64,
    amount_ratio: f64,
    segment_bytes: u64,
    writer_delay_ms: f64,
    throughput_mibs: f64,
    allowed_loss_ms: f64,
) -> WalCalibration {
    let (_, upper) = realign(initial_bytes, WAL_PAGE_BYTES);
    let mut candidate = upper.max(WAL_BUFFER_FLOOR_BYTES);
    let decay_bytes = WAL_DECAY_PAGES * WAL_PAGE_BYTES;
    let mut iterations = 0u32;
    loop {
        let estimate = estimate_flush_time(
            candidate,
            amount_ratio,
            segment_bytes,
            writer_delay_ms,
            throughput_mibs,
        );
        if estimate.total_ms <= allowed_loss_ms || candidate <= WAL_BUFFER_FLOOR_BYTES {
            return WalCalibration {
                buffer_bytes: candidate,
                iterations,
                estimate,
            };
        }
        candidate = candidate.saturating_sub(decay_bytes).max(WAL_BUFFER_FLOOR_BYTES);
        iterations += 1;
    }
}

// ============================================================================
// SECTION: Memory Model
// ============================================================================

/// Affine-in-ratio model of total predicted memory use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryModel {
    /// Usable RAM in bytes, as a float.
    pub usable_ram: f64,
    /// Connection estimate used for per-connection work-buffer sizing.
    pub connections: f64,
    /// Multiplier modeling concurrent use of the work-buffer allowance.
    pub usage_multiplier: f64,
}

impl MemoryModel {
    /// Builds a model from a request and a connection estimate.
    #[must_use]
    pub fn from_request(request: &Request, connections: f64) -> Self {
        #[allow(
            clippy::cast_precision_loss,
            reason = "RAM sizes stay far below the f64 mantissa limit."
        )]
        Self {
            usable_ram: request.hardware.usable_ram() as f64,
            connections: connections.max(1.0),
            usage_multiplier: request.ratios.usage_multiplier,
        }
    }

    /// Total predicted memory use for a ratio pair.
    #[must_use]
    pub fn predicted_usage(&self, shared_ratio: f64, work_ratio: f64) -> f64 {
        let shared = self.usable_ram * shared_ratio;
        let work_pool = self.usable_ram * (1.0 - shared_ratio) * work_ratio;
        shared + self.usage_multiplier * work_pool
    }

    /// Per-connection work-buffer estimate for a ratio pair.
    #[must_use]
    pub fn work_buffer_bytes(&self, shared_ratio: f64, work_ratio: f64) -> f64 {
        self.usable_ram * (1.0 - shared_ratio) * work_ratio / self.connections
    }
}

// ============================================================================
// SECTION: Step Count Solve
// ============================================================================

/// Solves the closed-form step count landing usage on the target ceiling.
///
/// With per-step increments `ia`/`id` applied `x` times, predicted usage is
/// quadratic in `x`; the smallest non-negative root is the first crossing of
/// the target. A request already at or above the target solves to zero and
/// leaves the adjustment to the stabilization loop.
///
/// # Errors
///
/// Returns [`SolverError::DegenerateSolve`] when the increments produce a
/// non-real or unusable root.
pub fn solve_step_count(
    model: &MemoryModel,
    ratios: &TuningRatios,
) -> Result<f64, SolverError> {
    let ram = model.usable_ram;
    let multiplier = model.usage_multiplier;
    let shared = ratios.shared_buffers_ratio;
    let work = ratios.max_work_buffer_ratio;
    let shared_step = ratios.shared_buffers_increment;
    let work_step = ratios.work_buffer_increment;
    let target = ram * ratios.memory_target_fraction;

    // usage(x) = ram(shared + x*ia) + K*ram*(1 - shared - x*ia)(work + x*id)
    let a = -multiplier * ram * shared_step * work_step;
    let b = ram * shared_step
        + multiplier * ram * ((1.0 - shared) * work_step - shared_step * work);
    let c = ram * shared + multiplier * ram * (1.0 - shared) * work - target;

    if a.abs() < QUADRATIC_EPSILON {
        if b.abs() < QUADRATIC_EPSILON {
            return Err(SolverError::DegenerateSolve {
                a,
                b,
                c,
                discriminant: f64::NAN,
            });
        }
        let root = -c / b;
        if !root.is_finite() {
            return Err(SolverError::DegenerateSolve {
                a,
                b,
                c,
                discriminant: f64::NAN,
            });
        }
        return Ok(root.max(0.0));
    }

    let discriminant = b.mul_add(b, -4.0 * a * c);
    if discriminant < 0.0 {
        return Err(SolverError::DegenerateSolve {
            a,
            b,
            c,
            discriminant,
        });
    }
    let sqrt = discriminant.sqrt();
    let first = (-b + sqrt) / (2.0 * a);
    let second = (-b - sqrt) / (2.0 * a);
    let usable = [first, second]
        .into_iter()
        .filter(|root| root.is_finite() && *root >= 0.0)
        .fold(f64::INFINITY, f64::min);
    if usable.is_finite() {
        Ok(usable)
    } else if first.is_finite() || second.is_finite() {
        // Both roots negative: already at or above the target.
        Ok(0.0)
    } else {
        Err(SolverError::DegenerateSolve {
            a,
            b,
            c,
            discriminant,
        })
    }
}

// ============================================================================
// SECTION: Memory-Pool Convergence
// ============================================================================

/// Report of one memory-pool convergence run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceReport {
    /// Closed-form step count before rounding.
    pub solved_steps: f64,
    /// Steps applied in the one-shot adjustment.
    pub applied_steps: i64,
    /// Bump/decay iterations the stabilization loop needed.
    pub stabilization_iterations: u32,
    /// Whether the loop drifted past [`CONVERGENCE_DRIFT_STEPS`].
    pub drifted: bool,
    /// Final predicted memory use in bytes.
    pub final_usage: f64,
    /// Target ceiling in bytes.
    pub target: f64,
}

/// Converges the memory-pool ratios onto the target ceiling.
///
/// Applies the rounded closed-form step count in one shot, adjusts the
/// hash-memory multiplier, re-triggers the named dependent items, and then
/// bump/decays until predicted usage sits inside the target/rollback window.
/// This is the only place the request's pool ratios are mutated.
///
/// # Errors
///
/// Returns [`SolverError::DegenerateSolve`] from the closed-form solve and
/// [`SolverError::IterationCapExceeded`] when stabilization fails to settle
/// within [`CONVERGENCE_ITERATION_CAP`] iterations.
pub fn converge_memory_pool(
    request: &mut Request,
    response: &mut ManagedResponse,
    model: &MemoryModel,
    dependents: &[(TuningScope, &str)],
) -> Result<ConvergenceReport, SolverError> {
    let solved_steps = solve_step_count(model, &request.ratios)?;
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Step counts are small integers by construction."
    )]
    let applied_steps = solved_steps.round() as i64;
    #[allow(
        clippy::cast_precision_loss,
        reason = "Step counts are small integers by construction."
    )]
    let scale = applied_steps as f64;
    request.ratios.shared_buffers_ratio += scale * request.ratios.shared_buffers_increment;
    request.ratios.max_work_buffer_ratio += scale * request.ratios.work_buffer_increment;

    adjust_hash_mem_multiplier(request, response);
    retrigger_dependents(response, request, dependents);

    let target = model.usable_ram * request.ratios.memory_target_fraction;
    let rollback = model.usable_ram * request.ratios.memory_rollback_fraction;
    let mut iterations = 0u32;
    let final_usage = loop {
        // Ratios are re-read on every iteration; no value is carried across
        // loop steps.
        let usage = model.predicted_usage(
            request.ratios.shared_buffers_ratio,
            request.ratios.max_work_buffer_ratio,
        );
        if usage >= target && usage < rollback {
            break usage;
        }
        if iterations >= CONVERGENCE_ITERATION_CAP {
            return Err(SolverError::IterationCapExceeded {
                iterations,
                cap: CONVERGENCE_ITERATION_CAP,
            });
        }
        if usage < target {
            request.ratios.shared_buffers_ratio += request.ratios.shared_buffers_increment;
            request.ratios.max_work_buffer_ratio += request.ratios.work_buffer_increment;
        } else {
            request.ratios.shared_buffers_ratio -= request.ratios.shared_buffers_increment;
            request.ratios.max_work_buffer_ratio -= request.ratios.work_buffer_increment;
        }
        iterations += 1;
    };

    let drifted = iterations >= CONVERGENCE_DRIFT_STEPS;
    if drifted {
        warn!(
            iterations,
            solved_steps,
            "memory convergence drifted; closed-form solve was inaccurate"
        );
    }

    adjust_hash_mem_multiplier(request, response);
    retrigger_dependents(response, request, dependents);

    Ok(ConvergenceReport {
        solved_steps,
        applied_steps,
        stabilization_iterations: iterations,
        drifted,
        final_usage,
        target,
    })
}

/// Publishes or updates the hash-memory multiplier for the current ratios.
fn adjust_hash_mem_multiplier(request: &Request, response: &mut ManagedResponse) {
    let multiplier = cap(
        2.0 + request.ratios.hash_mem_scale * request.ratios.max_work_buffer_ratio,
        2.0,
        8.0,
    );
    let namespace = TuningNamespace::Correction;
    let scope = TuningScope::Memory;
    let key = "hash_mem_multiplier";
    if !response.update_value(namespace, scope, key, ParamValue::Float(multiplier)) {
        response.publish(
            namespace,
            scope,
            TuningItem {
                key: key.to_string(),
                before: None,
                after: ParamValue::Float(multiplier),
                trigger: None,
                hardware_scope: (ScopeTerm::Mem, request.sizing.mem),
                formatter: None,
            },
        );
    }
}

/// Re-invokes the bounded, explicitly named dependent items.
fn retrigger_dependents(
    response: &mut ManagedResponse,
    request: &Request,
    dependents: &[(TuningScope, &str)],
) {
    for (scope, key) in dependents {
        response.retrigger(TuningNamespace::General, *scope, key, request);
    }
}

// ============================================================================
// SECTION: Correction Driver
// ============================================================================

/// Outcome of one correction-tuning pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionOutcome {
    /// Device class the data volume classified into, when any matched.
    pub disk_class: Option<String>,
    /// WAL buffer calibration result.
    pub wal: WalCalibration,
    /// Memory-pool convergence report.
    pub memory: ConvergenceReport,
}

/// Runs the correction-tuning pass over a resolved response.
///
/// Sequencing follows the correction stage ordering: disk classification,
/// WAL buffer calibration against the optimization level's loss budget, then
/// memory-pool convergence. Runs strictly after all general-tuning scopes
/// have published.
///
/// # Errors
///
/// Propagates [`SolverError`] from the memory-pool convergence.
pub fn run_correction(
    request: &mut Request,
    response: &mut ManagedResponse,
    catalogue: &DiskCatalogue,
    model: &MemoryModel,
    dependents: &[(TuningScope, &str)],
) -> Result<CorrectionOutcome, SolverError> {
    let disk = request.hardware.disk;
    let disk_class = catalogue
        .classify(disk.effective_iops(), DiskMetric::RandomIops)
        .map(|class| class.code.clone());

    let initial = response
        .cached_global(TuningNamespace::General, "wal_buffers")
        .and_then(ParamValue::as_i64)
        .and_then(|bytes| u64::try_from(bytes).ok())
        .unwrap_or_else(|| default_wal_buffer(request));
    let wal = calibrate_wal_buffers(
        initial,
        request.ratios.wal_amount_ratio,
        WAL_SEGMENT_BYTES,
        WAL_WRITER_DELAY_MS,
        disk.effective_throughput(),
        request.optimization.allowed_loss_ms(),
    );
    publish_wal_buffers(request, response, wal.buffer_bytes);

    let memory = converge_memory_pool(request, response, model, dependents)?;

    Ok(CorrectionOutcome {
        disk_class,
        wal,
        memory,
    })
}

/// Default WAL buffer candidate derived from the shared-buffer allowance.
fn default_wal_buffer(request: &Request) -> u64 {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "RAM sizes stay far below the f64 mantissa limit and ratios are non-negative."
    )]
    let candidate = (request.hardware.usable_ram() as f64 * request.ratios.shared_buffers_ratio
        / 32.0) as u64;
    candidate.clamp(WAL_BUFFER_FLOOR_BYTES, 512 * 1024 * 1024)
}

/// Publishes or updates the calibrated WAL buffer item.
fn publish_wal_buffers(request: &Request, response: &mut ManagedResponse, buffer_bytes: u64) {
    let namespace = TuningNamespace::Correction;
    let scope = TuningScope::Wal;
    let key = "wal_buffers";
    let value = ParamValue::Integer(i64::try_from(buffer_bytes).unwrap_or(i64::MAX));
    if !response.update_value(namespace, scope, key, value.clone()) {
        response.publish(
            namespace,
            scope,
            TuningItem {
                key: key.to_string(),
                before: None,
                after: value,
                trigger: None,
                hardware_scope: (ScopeTerm::Disk, request.sizing.disk),
                formatter: None,
            },
        );
    }
}
