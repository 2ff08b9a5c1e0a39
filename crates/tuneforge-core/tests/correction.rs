// crates/tuneforge-core/tests/correction.rs
// ============================================================================
// Module: Correction Pass Tests
// Description: Validate the end-to-end correction-tuning driver.
// Purpose: Pin stage ordering and response mutation across a full pass.
// Dependencies: tuneforge-core, serde_json
// ============================================================================

//! End-to-end tests: general resolution followed by correction tuning.

use serde_json::json;
use tuneforge_core::ComputeRegistry;
use tuneforge_core::ManagedResponse;
use tuneforge_core::MemoryModel;
use tuneforge_core::OptimizationLevel;
use tuneforge_core::ParamValue;
use tuneforge_core::Request;
use tuneforge_core::SizeTier;
use tuneforge_core::SolverError;
use tuneforge_core::TuningNamespace;
use tuneforge_core::TuningScope;
use tuneforge_core::Workload;
use tuneforge_core::compile_table;
use tuneforge_core::core::DiskPerfSpec;
use tuneforge_core::core::HardwareSpec;
use tuneforge_core::core::SizingMap;
use tuneforge_core::core::TuningRatios;
use tuneforge_core::resolve_table;
use tuneforge_core::run_correction;
use tuneforge_core::runtime::DeviceClass;
use tuneforge_core::runtime::DiskCatalogue;

/// Request for a mid-size NVMe-backed deployment.
fn nvme_request() -> Request {
    Request {
        hardware: HardwareSpec {
            vcpu: 16,
            ram_bytes: 32 * 1024 * 1024 * 1024,
            disk: DiskPerfSpec {
                random_iops: 90_000.0,
                throughput_mibs: 1800.0,
                raid_scale: 1.0,
            },
        },
        workload: Workload::Oltp,
        optimization: OptimizationLevel::Aggressive,
        ratios: TuningRatios::default(),
        sizing: SizingMap::uniform(SizeTier::Mall),
    }
}

/// Catalogue covering spinning disks through NVMe.
fn catalogue() -> Result<DiskCatalogue, Box<dyn std::error::Error>> {
    Ok(DiskCatalogue::new(vec![
        DeviceClass::new("hdd_7200", 150.0, 300.0),
        DeviceClass::new("ssd_sata", 450.0, 40_000.0),
        DeviceClass::new("ssd_nvme", 2500.0, 120_000.0),
    ])?)
}

#[test]
fn correction_pass_runs_all_three_stages() -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = ComputeRegistry::new();
    // work_mem re-derives from the current work-buffer ratio, so the
    // convergence pass can re-trigger it after mutating the ratios.
    registry.register_compute("work_mem_from_ratio", |ctx| {
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            reason = "Test RAM sizes stay far below the f64 mantissa limit."
        )]
        let bytes = (ctx.request.hardware.usable_ram() as f64
            * ctx.request.ratios.max_work_buffer_ratio
            / 100.0) as i64;
        Ok(Some(ParamValue::Integer(bytes)))
    });
    let raw = json!({
        "memory": ["memory", {
            "work_mem": {"default": 4_194_304, "compute": "work_mem_from_ratio"}
        }, null],
        "wal": ["wal", {
            "wal_buffers": {"default": 16_777_216}
        }, null]
    });
    let table = compile_table(&raw, &registry)?;

    let mut request = nvme_request();
    let mut response = ManagedResponse::new();
    resolve_table(&table, &request, &mut response);

    let before_work_mem = response
        .cached(TuningNamespace::General, TuningScope::Memory, "work_mem")
        .and_then(ParamValue::as_i64);

    let model = MemoryModel::from_request(&request, 400.0);
    let outcome = run_correction(
        &mut request,
        &mut response,
        &catalogue()?,
        &model,
        &[(TuningScope::Memory, "work_mem")],
    )?;

    // Stage 1: the NVMe volume classifies into the NVMe class.
    assert_eq!(outcome.disk_class.as_deref(), Some("ssd_nvme"));

    // Stage 2: the calibrated WAL buffer is published into the correction
    // namespace and satisfies the aggressive loss budget.
    let calibrated = response
        .cached(TuningNamespace::Correction, TuningScope::Wal, "wal_buffers")
        .and_then(ParamValue::as_i64);
    assert_eq!(calibrated, i64::try_from(outcome.wal.buffer_bytes).ok());
    assert!(outcome.wal.estimate.total_ms <= OptimizationLevel::Aggressive.allowed_loss_ms());

    // Stage 3: convergence raised the pool ratios and re-triggered work_mem.
    assert!(outcome.memory.final_usage >= outcome.memory.target);
    let after_work_mem = response
        .cached(TuningNamespace::General, TuningScope::Memory, "work_mem")
        .and_then(ParamValue::as_i64);
    assert!(after_work_mem > before_work_mem);

    // The hash-memory multiplier tracks the converged work-buffer ratio.
    let multiplier = response
        .cached(TuningNamespace::Correction, TuningScope::Memory, "hash_mem_multiplier")
        .and_then(ParamValue::as_f64);
    assert!(multiplier.is_some_and(|value| (2.0 ..= 8.0).contains(&value)));
    Ok(())
}

#[test]
fn correction_pass_surfaces_a_degenerate_solve() -> Result<(), Box<dyn std::error::Error>> {
    let mut request = nvme_request();
    request.ratios.shared_buffers_increment = 0.0;
    request.ratios.work_buffer_increment = 0.0;
    let model = MemoryModel::from_request(&request, 400.0);
    let mut response = ManagedResponse::new();
    let result = run_correction(&mut request, &mut response, &catalogue()?, &model, &[]);
    assert!(matches!(result, Err(SolverError::DegenerateSolve { .. })));
    Ok(())
}

#[test]
fn correction_uses_the_generally_resolved_wal_buffer_as_its_start()
-> Result<(), Box<dyn std::error::Error>> {
    let registry = ComputeRegistry::new();
    let raw = json!({
        "wal": ["wal", {"wal_buffers": {"default": 67_108_864}}, null]
    });
    let table = compile_table(&raw, &registry)?;

    let mut request = nvme_request();
    let mut response = ManagedResponse::new();
    resolve_table(&table, &request, &mut response);

    let model = MemoryModel::from_request(&request, 400.0);
    let outcome = run_correction(&mut request, &mut response, &catalogue()?, &model, &[])?;

    // A fast volume leaves the published 64 MiB candidate untouched.
    assert_eq!(outcome.wal.buffer_bytes, 67_108_864);
    assert_eq!(outcome.wal.iterations, 0);
    Ok(())
}
