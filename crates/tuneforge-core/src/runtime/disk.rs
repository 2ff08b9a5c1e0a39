// tuneforge-core/src/runtime/disk.rs
// ============================================================================
// Module: Disk Performance Matcher
// Description: Interval classification over an ordered device-class catalogue.
// Purpose: Classify throughput/IOPS figures for correction tuning.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! The catalogue is an ordered, read-only list of named device classes. A
//! query value is classified by half-open midpoint intervals: each class
//! owns the span from the midpoint with its predecessor (zero for the first
//! class) up to the midpoint with its successor (double its own value for
//! the last class). Series matching filters the catalogue by a device-code
//! prefix and tests membership across the filtered sub-range's endpoint
//! intervals; an empty filter is a fatal input error, never a silent false.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Metric and Device Class
// ============================================================================

/// Performance metric a classification runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskMetric {
    /// Sequential throughput in MiB/s.
    Throughput,
    /// Random IOPS.
    RandomIops,
}

/// One named device class in the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceClass {
    /// Device code; series filters match on its prefix.
    pub code: String,
    /// Sequential throughput in MiB/s.
    pub throughput: f64,
    /// Random IOPS.
    pub random_iops: f64,
}

impl DeviceClass {
    /// Builds a device class from its code and metrics.
    #[must_use]
    pub fn new(code: impl Into<String>, throughput: f64, random_iops: f64) -> Self {
        Self {
            code: code.into(),
            throughput,
            random_iops,
        }
    }

    /// Reads the requested metric.
    #[must_use]
    pub const fn metric(&self, metric: DiskMetric) -> f64 {
        match metric {
            DiskMetric::Throughput => self.throughput,
            DiskMetric::RandomIops => self.random_iops,
        }
    }
}

// ============================================================================
// SECTION: Series Band
// ============================================================================

/// Portion of a filtered device series to test against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeriesBand {
    /// The whole filtered series.
    #[default]
    Full,
    /// The lower half of the filtered series.
    Weak,
    /// The upper half of the filtered series.
    Strong,
}

// ============================================================================
// SECTION: Disk Errors
// ============================================================================

/// Error raised by catalogue classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiskError {
    /// A requested device-type prefix matched nothing in the catalogue.
    #[error("no catalogue entry for disk type: {0}")]
    InvalidDiskType(String),
    /// A device code is not present in the catalogue.
    #[error("unknown device class: {0}")]
    UnknownClass(String),
    /// An index is outside the catalogue.
    #[error("catalogue index {index} out of range ({len} classes)")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Catalogue length.
        len: usize,
    },
    /// The catalogue holds no classes at all.
    #[error("disk catalogue is empty")]
    EmptyCatalogue,
}

// ============================================================================
// SECTION: Catalogue
// ============================================================================

/// Ordered, read-only catalogue of device classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskCatalogue {
    /// Classes sorted ascending by (throughput, random IOPS, code).
    classes: Vec<DeviceClass>,
}

impl DiskCatalogue {
    /// Builds a catalogue, sorting the classes ascending.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::EmptyCatalogue`] when no classes are supplied.
    pub fn new(mut classes: Vec<DeviceClass>) -> Result<Self, DiskError> {
        if classes.is_empty() {
            return Err(DiskError::EmptyCatalogue);
        }
        classes.sort_by(|a, b| {
            a.throughput
                .total_cmp(&b.throughput)
                .then(a.random_iops.total_cmp(&b.random_iops))
                .then_with(|| a.code.cmp(&b.code))
        });
        Ok(Self {
            classes,
        })
    }

    /// The classes in catalogue order.
    #[must_use]
    pub fn classes(&self) -> &[DeviceClass] {
        &self.classes
    }

    /// Number of classes in the catalogue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the catalogue is empty; construction forbids this.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Finds the catalogue position of a device code.
    #[must_use]
    pub fn position(&self, code: &str) -> Option<usize> {
        self.classes.iter().position(|class| class.code == code)
    }

    /// Largest value of the metric anywhere in the catalogue.
    #[must_use]
    pub fn global_max(&self, metric: DiskMetric) -> f64 {
        self.classes.iter().map(|class| class.metric(metric)).fold(f64::MIN, f64::max)
    }

    /// Half-open ownership interval `[lower, upper)` of one class.
    ///
    /// The first class starts at zero; the last class extends to double its
    /// own metric value.
    fn bounds(&self, index: usize, metric: DiskMetric) -> (f64, f64) {
        let current = self.classes[index].metric(metric);
        let lower = if index == 0 {
            0.0
        } else {
            midpoint(self.classes[index - 1].metric(metric), current)
        };
        let upper = if index + 1 == self.classes.len() {
            current * 2.0
        } else {
            midpoint(current, self.classes[index + 1].metric(metric))
        };
        (lower, upper)
    }

    /// Tests whether `value` falls inside one class's ownership interval.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::IndexOutOfRange`] for an index past the
    /// catalogue.
    pub fn match_one_disk(
        &self,
        value: f64,
        metric: DiskMetric,
        index: usize,
    ) -> Result<bool, DiskError> {
        if index >= self.classes.len() {
            return Err(DiskError::IndexOutOfRange {
                index,
                len: self.classes.len(),
            });
        }
        let (lower, upper) = self.bounds(index, metric);
        Ok(value >= lower && value < upper)
    }

    /// Tests membership against the class named by `code`.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::UnknownClass`] for a code not in the catalogue.
    pub fn match_class(
        &self,
        value: f64,
        metric: DiskMetric,
        code: &str,
    ) -> Result<bool, DiskError> {
        let index = self.position(code).ok_or_else(|| DiskError::UnknownClass(code.to_string()))?;
        self.match_one_disk(value, metric, index)
    }

    /// Tests membership across a prefix-filtered series band.
    ///
    /// Values at or beyond the global catalogue maximum always match.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::InvalidDiskType`] when the prefix filters the
    /// catalogue down to nothing.
    pub fn match_disk_series(
        &self,
        value: f64,
        metric: DiskMetric,
        prefix: &str,
        band: SeriesBand,
    ) -> Result<bool, DiskError> {
        let indices = self.filtered(prefix)?;
        if value >= self.global_max(metric) {
            return Ok(true);
        }
        let banded = band_slice(&indices, band);
        self.span_contains(value, metric, banded)
    }

    /// Tests membership across the union of two prefix-filtered series.
    ///
    /// The span runs from the lowest entry of either series to the highest
    /// entry of either series. Values at or beyond the global catalogue
    /// maximum always match.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::InvalidDiskType`] when either prefix filters the
    /// catalogue down to nothing.
    pub fn match_disk_series_in_range(
        &self,
        value: f64,
        metric: DiskMetric,
        first_prefix: &str,
        second_prefix: &str,
    ) -> Result<bool, DiskError> {
        let first = self.filtered(first_prefix)?;
        let second = self.filtered(second_prefix)?;
        if value >= self.global_max(metric) {
            return Ok(true);
        }
        let lowest = first[0].min(second[0]);
        let highest = first[first.len() - 1].max(second[second.len() - 1]);
        let (lower, _) = self.bounds(lowest, metric);
        let (_, upper) = self.bounds(highest, metric);
        Ok(value >= lower && value < upper)
    }

    /// Finds the class whose ownership interval contains `value`.
    ///
    /// Values beyond every interval clamp to the last (largest) class.
    #[must_use]
    pub fn classify(&self, value: f64, metric: DiskMetric) -> Option<&DeviceClass> {
        for index in 0 .. self.classes.len() {
            let (lower, upper) = self.bounds(index, metric);
            if value >= lower && value < upper {
                return Some(&self.classes[index]);
            }
        }
        if value >= self.global_max(metric) {
            return self.classes.last();
        }
        None
    }

    /// Catalogue positions of classes whose code starts with `prefix`.
    fn filtered(&self, prefix: &str) -> Result<Vec<usize>, DiskError> {
        let indices: Vec<usize> = self
            .classes
            .iter()
            .enumerate()
            .filter(|(_, class)| class.code.starts_with(prefix))
            .map(|(index, _)| index)
            .collect();
        if indices.is_empty() {
            return Err(DiskError::InvalidDiskType(prefix.to_string()));
        }
        Ok(indices)
    }

    /// Membership across the endpoint intervals of a position slice.
    fn span_contains(
        &self,
        value: f64,
        metric: DiskMetric,
        indices: &[usize],
    ) -> Result<bool, DiskError> {
        let Some((&first, &last)) = indices.first().zip(indices.last()) else {
            return Err(DiskError::EmptyCatalogue);
        };
        let (lower, _) = self.bounds(first, metric);
        let (_, upper) = self.bounds(last, metric);
        Ok(value >= lower && value < upper)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Midpoint of two metric values.
fn midpoint(a: f64, b: f64) -> f64 {
    f64::midpoint(a, b)
}

/// Restricts a position slice to the requested band.
///
/// With an odd number of entries the middle position belongs to both halves.
fn band_slice(indices: &[usize], band: SeriesBand) -> &[usize] {
    let len = indices.len();
    match band {
        SeriesBand::Full => indices,
        SeriesBand::Weak => &indices[.. len.div_ceil(2)],
        SeriesBand::Strong => &indices[len / 2 ..],
    }
}
