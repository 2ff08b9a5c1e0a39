// crates/tuneforge-core/tests/solver.rs
// ============================================================================
// Module: Convergence Solver Tests
// Description: Validate WAL calibration and memory-pool convergence.
// Purpose: Pin the correction-tuning numeric contracts.
// Dependencies: tuneforge-core
// ============================================================================

//! Integration tests for the convergence solver.

use tuneforge_core::ManagedResponse;
use tuneforge_core::MemoryModel;
use tuneforge_core::OptimizationLevel;
use tuneforge_core::Request;
use tuneforge_core::SizeTier;
use tuneforge_core::SolverError;
use tuneforge_core::Workload;
use tuneforge_core::core::DiskPerfSpec;
use tuneforge_core::core::HardwareSpec;
use tuneforge_core::core::SizingMap;
use tuneforge_core::core::TuningRatios;
use tuneforge_core::runtime::WAL_BUFFER_FLOOR_BYTES;
use tuneforge_core::runtime::WAL_PAGE_BYTES;
use tuneforge_core::runtime::WAL_SEGMENT_BYTES;
use tuneforge_core::runtime::WAL_WRITER_DELAY_MS;
use tuneforge_core::runtime::calibrate_wal_buffers;
use tuneforge_core::runtime::converge_memory_pool;
use tuneforge_core::runtime::estimate_flush_time;
use tuneforge_core::runtime::solve_step_count;

/// Request with 16 GiB of RAM and default ratios.
fn sixteen_gib_request() -> Request {
    Request {
        hardware: HardwareSpec {
            vcpu: 8,
            ram_bytes: 16 * 1024 * 1024 * 1024,
            disk: DiskPerfSpec {
                random_iops: 10_000.0,
                throughput_mibs: 800.0,
                raid_scale: 1.0,
            },
        },
        workload: Workload::Mixed,
        optimization: OptimizationLevel::Balanced,
        ratios: TuningRatios::default(),
        sizing: SizingMap::uniform(SizeTier::Large),
    }
}

/// One combined-step usage delta of the model at the current ratios.
fn step_delta(model: &MemoryModel, ratios: &TuningRatios) -> f64 {
    let bumped = model.predicted_usage(
        ratios.shared_buffers_ratio + ratios.shared_buffers_increment,
        ratios.max_work_buffer_ratio + ratios.work_buffer_increment,
    );
    bumped - model.predicted_usage(ratios.shared_buffers_ratio, ratios.max_work_buffer_ratio)
}

#[test]
fn flush_time_is_nondecreasing_in_buffer_size() {
    let mut previous = 0.0_f64;
    for pages in 1 .. 512_u64 {
        let estimate = estimate_flush_time(
            pages * WAL_PAGE_BYTES,
            1.0,
            WAL_SEGMENT_BYTES,
            WAL_WRITER_DELAY_MS,
            300.0,
        );
        assert!(estimate.total_ms >= previous);
        previous = estimate.total_ms;
    }
}

#[test]
fn flush_time_decomposes_into_rotation_write_and_delay() {
    let estimate = estimate_flush_time(
        32 * 1024 * 1024,
        1.0,
        WAL_SEGMENT_BYTES,
        WAL_WRITER_DELAY_MS,
        320.0,
    );
    // 32 MiB at ratio 1.0 touches three segment files (floor(32/16) + 1).
    assert_eq!(estimate.data_amount, 32 * 1024 * 1024);
    assert_eq!(estimate.segment_files, 3);
    assert!((estimate.write_ms - 100.0).abs() < 1e-9);
    assert!((estimate.total_ms - (estimate.rotation_ms + estimate.write_ms)).abs() < 1e-9);
    assert_eq!(estimate.delay_ms, 0.0);
}

#[test]
fn integral_amount_ratio_charges_one_fewer_delay_round() {
    let exact = estimate_flush_time(1024, 2.0, WAL_SEGMENT_BYTES, 100.0, 300.0);
    assert!((exact.delay_ms - 100.0).abs() < 1e-9);

    let fractional = estimate_flush_time(1024, 2.5, WAL_SEGMENT_BYTES, 100.0, 300.0);
    assert!((fractional.delay_ms - 200.0).abs() < 1e-9);

    let below_one = estimate_flush_time(1024, 0.8, WAL_SEGMENT_BYTES, 100.0, 300.0);
    assert_eq!(below_one.delay_ms, 0.0);
}

#[test]
fn satisfied_initial_candidate_runs_zero_decay_iterations() {
    let initial = 16 * WAL_PAGE_BYTES;
    let calibration = calibrate_wal_buffers(
        initial,
        1.0,
        WAL_SEGMENT_BYTES,
        WAL_WRITER_DELAY_MS,
        10_000.0,
        OptimizationLevel::None.allowed_loss_ms(),
    );
    assert_eq!(calibration.iterations, 0);
    assert_eq!(calibration.buffer_bytes, initial);
}

#[test]
fn decay_loop_shrinks_the_candidate_until_the_budget_holds() {
    let initial = 512 * 1024 * 1024;
    let allowed = OptimizationLevel::Extreme.allowed_loss_ms();
    let calibration = calibrate_wal_buffers(
        initial,
        1.0,
        WAL_SEGMENT_BYTES,
        WAL_WRITER_DELAY_MS,
        50.0,
        allowed,
    );
    assert!(calibration.iterations > 0);
    assert!(calibration.buffer_bytes < initial);
    assert!(
        calibration.estimate.total_ms <= allowed
            || calibration.buffer_bytes == WAL_BUFFER_FLOOR_BYTES
    );
}

#[test]
fn unaligned_candidate_is_realigned_upward_first() {
    let calibration = calibrate_wal_buffers(
        16 * WAL_PAGE_BYTES + 1,
        1.0,
        WAL_SEGMENT_BYTES,
        WAL_WRITER_DELAY_MS,
        10_000.0,
        OptimizationLevel::None.allowed_loss_ms(),
    );
    assert_eq!(calibration.buffer_bytes, 17 * WAL_PAGE_BYTES);
    assert_eq!(calibration.buffer_bytes % WAL_PAGE_BYTES, 0);
}

#[test]
fn closed_form_solve_lands_within_one_step_of_the_target() -> Result<(), SolverError> {
    let request = sixteen_gib_request();
    let model = MemoryModel::from_request(&request, 200.0);
    let steps = solve_step_count(&model, &request.ratios)?;
    assert!(steps > 0.0);

    // Applied the way the solver applies it: rounded to whole steps.
    let applied = steps.round();
    let mut landed = request.ratios;
    landed.shared_buffers_ratio += applied * landed.shared_buffers_increment;
    landed.max_work_buffer_ratio += applied * landed.work_buffer_increment;
    let usage =
        model.predicted_usage(landed.shared_buffers_ratio, landed.max_work_buffer_ratio);
    let target = model.usable_ram * landed.memory_target_fraction;
    assert!((usage - target).abs() <= step_delta(&model, &landed));
    Ok(())
}

#[test]
fn stabilization_settles_within_two_iterations() -> Result<(), SolverError> {
    let mut request = sixteen_gib_request();
    let model = MemoryModel::from_request(&request, 200.0);
    let mut response = ManagedResponse::new();
    let report = converge_memory_pool(&mut request, &mut response, &model, &[])?;

    assert!(report.stabilization_iterations <= 2);
    assert!(!report.drifted);
    assert!(report.final_usage >= report.target);
    assert!(
        report.final_usage
            < model.usable_ram * request.ratios.memory_rollback_fraction
    );
    Ok(())
}

#[test]
fn convergence_mutates_only_the_two_pool_ratios() -> Result<(), SolverError> {
    let mut request = sixteen_gib_request();
    let original = request.ratios;
    let model = MemoryModel::from_request(&request, 200.0);
    let mut response = ManagedResponse::new();
    converge_memory_pool(&mut request, &mut response, &model, &[])?;

    assert!(request.ratios.shared_buffers_ratio > original.shared_buffers_ratio);
    assert!(request.ratios.max_work_buffer_ratio > original.max_work_buffer_ratio);
    assert_eq!(request.ratios.shared_buffers_increment, original.shared_buffers_increment);
    assert_eq!(request.ratios.work_buffer_increment, original.work_buffer_increment);
    assert_eq!(request.ratios.memory_target_fraction, original.memory_target_fraction);
    assert_eq!(request.ratios.memory_rollback_fraction, original.memory_rollback_fraction);
    assert_eq!(request.ratios.usage_multiplier, original.usage_multiplier);
    assert_eq!(request.ratios.wal_amount_ratio, original.wal_amount_ratio);
    assert_eq!(request.ratios.hash_mem_scale, original.hash_mem_scale);
    Ok(())
}

#[test]
fn zero_increments_are_a_degenerate_solve() {
    let mut request = sixteen_gib_request();
    request.ratios.shared_buffers_increment = 0.0;
    request.ratios.work_buffer_increment = 0.0;
    let model = MemoryModel::from_request(&request, 200.0);
    let result = solve_step_count(&model, &request.ratios);
    assert!(matches!(result, Err(SolverError::DegenerateSolve { .. })));
}

#[test]
fn empty_target_window_hits_the_iteration_cap() {
    let mut request = sixteen_gib_request();
    // Rollback at the target leaves no usage window to settle into.
    request.ratios.memory_rollback_fraction = request.ratios.memory_target_fraction;
    let model = MemoryModel::from_request(&request, 200.0);
    let mut response = ManagedResponse::new();
    let result = converge_memory_pool(&mut request, &mut response, &model, &[]);
    assert!(matches!(result, Err(SolverError::IterationCapExceeded { .. })));
}
