// crates/tuneforge-core/tests/disk.rs
// ============================================================================
// Module: Disk Matcher Tests
// Description: Validate interval classification over the device catalogue.
// Purpose: Pin the midpoint-interval membership semantics.
// Dependencies: tuneforge-core
// ============================================================================

//! Integration tests for the disk performance matcher.

use tuneforge_core::runtime::DeviceClass;
use tuneforge_core::runtime::DiskCatalogue;
use tuneforge_core::runtime::DiskError;
use tuneforge_core::runtime::DiskMetric;
use tuneforge_core::runtime::SeriesBand;

/// Three-class catalogue from the matcher contract examples.
fn small_catalogue() -> Result<DiskCatalogue, DiskError> {
    DiskCatalogue::new(vec![
        DeviceClass::new("hdd_d1", 100.0, 250.0),
        DeviceClass::new("ssd_d2", 200.0, 1000.0),
        DeviceClass::new("ssd_d3", 260.0, 2500.0),
    ])
}

/// Wider catalogue with two device families for series tests.
fn series_catalogue() -> Result<DiskCatalogue, DiskError> {
    DiskCatalogue::new(vec![
        DeviceClass::new("hdd_slow", 80.0, 150.0),
        DeviceClass::new("hdd_fast", 150.0, 400.0),
        DeviceClass::new("ssd_sata", 400.0, 5000.0),
        DeviceClass::new("ssd_nvme", 2000.0, 100_000.0),
        DeviceClass::new("ssd_nvme_pro", 5000.0, 500_000.0),
    ])
}

#[test]
fn value_inside_middle_interval_matches() -> Result<(), DiskError> {
    let catalogue = small_catalogue()?;
    // D2 owns [625, 1750) on IOPS: midpoints with D1 (250) and D3 (2500).
    assert!(catalogue.match_class(1000.0, DiskMetric::RandomIops, "ssd_d2")?);
    Ok(())
}

#[test]
fn value_in_neighbor_interval_does_not_match() -> Result<(), DiskError> {
    let catalogue = small_catalogue()?;
    assert!(!catalogue.match_class(250.0, DiskMetric::RandomIops, "ssd_d2")?);
    assert!(catalogue.match_class(250.0, DiskMetric::RandomIops, "hdd_d1")?);
    Ok(())
}

#[test]
fn last_interval_extends_to_double_its_value() -> Result<(), DiskError> {
    let catalogue = small_catalogue()?;
    assert!(catalogue.match_class(3000.0, DiskMetric::RandomIops, "ssd_d3")?);
    assert!(catalogue.match_class(4999.0, DiskMetric::RandomIops, "ssd_d3")?);
    assert!(!catalogue.match_class(5000.0, DiskMetric::RandomIops, "ssd_d3")?);
    Ok(())
}

#[test]
fn first_interval_starts_at_zero() -> Result<(), DiskError> {
    let catalogue = small_catalogue()?;
    assert!(catalogue.match_class(0.0, DiskMetric::RandomIops, "hdd_d1")?);
    assert!(catalogue.match_class(100.0, DiskMetric::RandomIops, "hdd_d1")?);
    Ok(())
}

#[test]
fn interval_lookup_past_the_catalogue_is_an_error() -> Result<(), DiskError> {
    let catalogue = small_catalogue()?;
    let result = catalogue.match_one_disk(100.0, DiskMetric::RandomIops, 3);
    assert!(matches!(result, Err(DiskError::IndexOutOfRange { index: 3, len: 3 })));
    Ok(())
}

#[test]
fn series_match_spans_the_filtered_family() -> Result<(), DiskError> {
    let catalogue = series_catalogue()?;
    // The ssd family spans sata through nvme_pro on throughput.
    assert!(catalogue.match_disk_series(600.0, DiskMetric::Throughput, "ssd", SeriesBand::Full)?);
    assert!(!catalogue.match_disk_series(
        100.0,
        DiskMetric::Throughput,
        "ssd",
        SeriesBand::Full
    )?);
    Ok(())
}

#[test]
fn weak_and_strong_bands_split_the_series() -> Result<(), DiskError> {
    let catalogue = series_catalogue()?;
    // Weak ssd band covers sata and nvme; strong covers nvme and nvme_pro.
    assert!(catalogue.match_disk_series(600.0, DiskMetric::Throughput, "ssd", SeriesBand::Weak)?);
    assert!(!catalogue.match_disk_series(
        600.0,
        DiskMetric::Throughput,
        "ssd",
        SeriesBand::Strong
    )?);
    assert!(catalogue.match_disk_series(
        4000.0,
        DiskMetric::Throughput,
        "ssd",
        SeriesBand::Strong
    )?);
    Ok(())
}

#[test]
fn values_at_or_beyond_the_global_maximum_always_match() -> Result<(), DiskError> {
    let catalogue = series_catalogue()?;
    assert!(catalogue.match_disk_series(
        5000.0,
        DiskMetric::Throughput,
        "hdd",
        SeriesBand::Full
    )?);
    assert!(catalogue.match_disk_series(
        9999.0,
        DiskMetric::Throughput,
        "hdd",
        SeriesBand::Weak
    )?);
    Ok(())
}

#[test]
fn unknown_type_prefix_is_a_fatal_error() -> Result<(), DiskError> {
    let catalogue = series_catalogue()?;
    let result = catalogue.match_disk_series(100.0, DiskMetric::Throughput, "tape", SeriesBand::Full);
    assert!(matches!(result, Err(DiskError::InvalidDiskType(prefix)) if prefix == "tape"));
    Ok(())
}

#[test]
fn range_match_unions_two_family_spans() -> Result<(), DiskError> {
    let catalogue = series_catalogue()?;
    // The union of hdd and ssd spans the whole catalogue.
    assert!(catalogue.match_disk_series_in_range(
        300.0,
        DiskMetric::Throughput,
        "hdd",
        "ssd"
    )?);
    // A value below the hdd family's lower bound stays out.
    assert!(!catalogue.match_disk_series_in_range(
        10.0,
        DiskMetric::Throughput,
        "ssd",
        "ssd_nvme"
    )?);
    Ok(())
}

#[test]
fn range_match_rejects_unknown_prefixes() -> Result<(), DiskError> {
    let catalogue = series_catalogue()?;
    let result = catalogue.match_disk_series_in_range(100.0, DiskMetric::Throughput, "hdd", "tape");
    assert!(matches!(result, Err(DiskError::InvalidDiskType(prefix)) if prefix == "tape"));
    Ok(())
}

#[test]
fn classify_returns_the_owning_class() -> Result<(), DiskError> {
    let catalogue = small_catalogue()?;
    let class = catalogue.classify(1000.0, DiskMetric::RandomIops);
    assert_eq!(class.map(|found| found.code.as_str()), Some("ssd_d2"));
    // Beyond every interval clamps to the largest class.
    let class = catalogue.classify(1_000_000.0, DiskMetric::RandomIops);
    assert_eq!(class.map(|found| found.code.as_str()), Some("ssd_d3"));
    Ok(())
}

#[test]
fn empty_catalogue_is_rejected_at_construction() {
    let result = DiskCatalogue::new(Vec::new());
    assert!(matches!(result, Err(DiskError::EmptyCatalogue)));
}

#[test]
fn construction_sorts_classes_ascending() -> Result<(), DiskError> {
    let catalogue = DiskCatalogue::new(vec![
        DeviceClass::new("big", 500.0, 9000.0),
        DeviceClass::new("small", 50.0, 120.0),
    ])?;
    let codes: Vec<&str> = catalogue.classes().iter().map(|class| class.code.as_str()).collect();
    assert_eq!(codes, ["small", "big"]);
    Ok(())
}
