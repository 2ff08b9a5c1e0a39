// tuneforge-core/src/runtime/merge.rs
// ============================================================================
// Module: Deep Merge
// Description: Recursive record merge with safety caps and conflict policy.
// Purpose: Layer version-specific overrides onto base profile tables.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Profile tables are deep JSON literals assembled at build time across many
//! product versions. The merge walks the overlay's keys into the base with a
//! per-kind conflict policy, and enforces hard recursion and size caps so a
//! pathological or typo'd structure fails fast instead of recursing without
//! bound. The caps are enforced, not advisory: exceeding any of them aborts
//! the merge with a typed error.
//!
//! The base is mutated in place; overlay values are cloned as they are
//! copied, so overlay literals are never shared with the merged result.
//! Callers that want to hand an overlay over wholesale use
//! [`merge_owned`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::profile::ALIAS_DELIMITER;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum merge depth.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Absolute ceiling on the configurable merge depth.
pub const ABSOLUTE_MAX_DEPTH: usize = 6;

/// Combined key budget at depth one; the budget halves per depth level.
pub const DEPTH_BUDGET_CEILING: usize = 768;

/// Floor the per-depth key budget never shrinks below.
pub const DEPTH_BUDGET_FLOOR: usize = 12;

/// Aggregate item-count ceiling for the base record.
pub const MAX_BASE_ITEMS: usize = 8192;

/// Aggregate item-count ceiling for all overlays combined.
pub const MAX_OVERLAY_ITEMS: usize = 4096;

/// Maximum number of overlays merged into one base.
pub const MAX_OVERLAYS: usize = 100;

/// Prefix marking an alias for post-merge deletion.
pub const DELETION_MARKER: char = '-';

// ============================================================================
// SECTION: Merge Options
// ============================================================================

/// Action applied when an overlay key is absent from the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbsentAction {
    /// Insert a clone of the overlay value.
    #[default]
    Copy,
    /// Skip the key.
    Bypass,
    /// Abort the merge.
    Terminate,
}

/// Action applied when both sides hold unequal scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentAction {
    /// Replace the base scalar with the overlay scalar.
    #[default]
    Override,
    /// Keep the base scalar.
    Bypass,
    /// Abort the merge.
    Terminate,
}

/// Action applied when both sides hold ordered sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListAction {
    /// Replace the base list with a clone of the overlay list.
    #[default]
    Copy,
    /// Append every overlay element to the base list.
    Extend,
    /// Append only overlay elements not already present in the base list.
    ExtendCopy,
}

/// Merge behavior configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Maximum recursion depth; clamped to [`ABSOLUTE_MAX_DEPTH`].
    pub max_depth: usize,
    /// Skip conflicts and terminate actions instead of raising them.
    pub skip_errors: bool,
    /// Action for absent scalar keys.
    pub scalar_absent: AbsentAction,
    /// Action for absent record keys.
    pub map_absent: AbsentAction,
    /// Action for present, unequal scalar keys.
    pub scalar_present: PresentAction,
    /// Action for list/list conflicts.
    pub list_conflict: ListAction,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            skip_errors: false,
            scalar_absent: AbsentAction::Copy,
            map_absent: AbsentAction::Copy,
            scalar_present: PresentAction::Override,
            list_conflict: ListAction::Copy,
        }
    }
}

impl MergeOptions {
    /// Effective depth limit after clamping against the absolute ceiling.
    #[must_use]
    pub const fn effective_max_depth(&self) -> usize {
        if self.max_depth == 0 {
            1
        } else if self.max_depth > ABSOLUTE_MAX_DEPTH {
            ABSOLUTE_MAX_DEPTH
        } else {
            self.max_depth
        }
    }
}

// ============================================================================
// SECTION: Merge Errors
// ============================================================================

/// Error raised by the deep merge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// Recursion exceeded the configured depth limit.
    #[error("merge recursion exceeded depth {max} at depth {depth}")]
    RecursionLimit {
        /// Depth at which the limit was hit.
        depth: usize,
        /// Effective depth limit.
        max: usize,
    },
    /// Combined key count exceeded the per-depth budget.
    #[error("merge size budget {budget} exceeded at depth {depth}: {count} keys")]
    SizeLimit {
        /// Depth at which the budget was exceeded.
        depth: usize,
        /// Combined key count of both operands at that depth.
        count: usize,
        /// Budget for that depth.
        budget: usize,
    },
    /// A record's aggregate item count exceeded its ceiling.
    #[error("{side} record holds {count} items, over the {max} ceiling")]
    AggregateLimit {
        /// Which operand exceeded the ceiling (`base` or `overlay`).
        side: &'static str,
        /// Aggregate item count found.
        count: usize,
        /// Ceiling for that operand.
        max: usize,
    },
    /// Too many overlays for one base.
    #[error("{count} overlays exceed the {max} overlay limit")]
    OverlayLimit {
        /// Number of overlays supplied.
        count: usize,
        /// Overlay ceiling.
        max: usize,
    },
    /// Scalar and record met at the same key.
    #[error("type conflict at {path}: base is {base_kind}, overlay is {overlay_kind}")]
    TypeConflict {
        /// Dotted path of the conflicting key.
        path: String,
        /// JSON kind on the base side.
        base_kind: &'static str,
        /// JSON kind on the overlay side.
        overlay_kind: &'static str,
    },
    /// A terminate action fired.
    #[error("merge terminated by policy at {path}")]
    Terminated {
        /// Dotted path of the terminating key.
        path: String,
    },
}

// ============================================================================
// SECTION: Merge Entry Points
// ============================================================================

/// Merges `overlay` into `base` in place.
///
/// # Errors
///
/// Returns [`MergeError`] when a safety cap is exceeded or a conflict is
/// raised under the configured policy.
pub fn merge_into(
    base: &mut Map<String, Value>,
    overlay: &Map<String, Value>,
    options: &MergeOptions,
) -> Result<(), MergeError> {
    check_aggregate(base, "base", MAX_BASE_ITEMS)?;
    check_aggregate(overlay, "overlay", MAX_OVERLAY_ITEMS)?;
    let mut path = Vec::new();
    merge_level(base, overlay, options, 1, &mut path)
}

/// Merges an owned overlay into `base`, consuming the overlay.
///
/// Semantically identical to [`merge_into`]; provided for callers that no
/// longer need the overlay and want to signal the handover in the type.
///
/// # Errors
///
/// Returns [`MergeError`] exactly as [`merge_into`] does.
pub fn merge_owned(
    base: &mut Map<String, Value>,
    overlay: Map<String, Value>,
    options: &MergeOptions,
) -> Result<(), MergeError> {
    merge_into(base, &overlay, options)
}

/// Merges a sequence of overlays into `base` in order.
///
/// # Errors
///
/// Returns [`MergeError::OverlayLimit`] when too many overlays are supplied,
/// [`MergeError::AggregateLimit`] when the overlays' combined item count
/// exceeds the overlay ceiling, and any error [`merge_into`] raises.
pub fn merge_all(
    base: &mut Map<String, Value>,
    overlays: &[&Map<String, Value>],
    options: &MergeOptions,
) -> Result<(), MergeError> {
    if overlays.len() > MAX_OVERLAYS {
        return Err(MergeError::OverlayLimit {
            count: overlays.len(),
            max: MAX_OVERLAYS,
        });
    }
    let combined: usize = overlays.iter().map(|overlay| count_items(overlay)).sum();
    if combined > MAX_OVERLAY_ITEMS {
        return Err(MergeError::AggregateLimit {
            side: "overlay",
            count: combined,
            max: MAX_OVERLAY_ITEMS,
        });
    }
    for overlay in overlays {
        check_aggregate(base, "base", MAX_BASE_ITEMS)?;
        let mut path = Vec::new();
        merge_level(base, overlay, options, 1, &mut path)?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Merge Recursion
// ============================================================================

/// Per-depth combined key budget; halves per level, clamped to the floor.
#[must_use]
pub const fn depth_budget(depth: usize) -> usize {
    let shift = depth.saturating_sub(1);
    if shift >= usize::BITS as usize {
        return DEPTH_BUDGET_FLOOR;
    }
    let budget = DEPTH_BUDGET_CEILING >> shift;
    if budget < DEPTH_BUDGET_FLOOR {
        DEPTH_BUDGET_FLOOR
    } else {
        budget
    }
}

/// Merges one nesting level; `depth` starts at one for the table roots.
fn merge_level(
    base: &mut Map<String, Value>,
    overlay: &Map<String, Value>,
    options: &MergeOptions,
    depth: usize,
    path: &mut Vec<String>,
) -> Result<(), MergeError> {
    let max = options.effective_max_depth();
    if depth > max {
        return Err(MergeError::RecursionLimit {
            depth,
            max,
        });
    }
    let count = base.len() + overlay.len();
    let budget = depth_budget(depth);
    if count > budget {
        return Err(MergeError::SizeLimit {
            depth,
            count,
            budget,
        });
    }

    for (key, overlay_value) in overlay {
        match base.get_mut(key) {
            None => {
                let action = if is_container(overlay_value) {
                    options.map_absent
                } else {
                    options.scalar_absent
                };
                match action {
                    AbsentAction::Copy => {
                        base.insert(key.clone(), overlay_value.clone());
                    }
                    AbsentAction::Bypass => {}
                    AbsentAction::Terminate => {
                        if !options.skip_errors {
                            return Err(MergeError::Terminated {
                                path: joined_path(path, key),
                            });
                        }
                    }
                }
            }
            Some(existing) => {
                merge_present(existing, overlay_value, options, depth, path, key)?;
            }
        }
    }
    Ok(())
}

/// Resolves a key present on both sides.
fn merge_present(
    existing: &mut Value,
    overlay_value: &Value,
    options: &MergeOptions,
    depth: usize,
    path: &mut Vec<String>,
    key: &str,
) -> Result<(), MergeError> {
    match (existing, overlay_value) {
        (Value::Object(base_child), Value::Object(overlay_child)) => {
            path.push(key.to_string());
            let merged = merge_level(base_child, overlay_child, options, depth + 1, path);
            path.pop();
            merged
        }
        (Value::Array(base_list), Value::Array(overlay_list)) => {
            match options.list_conflict {
                ListAction::Copy => {
                    *base_list = overlay_list.clone();
                }
                ListAction::Extend => {
                    base_list.extend(overlay_list.iter().cloned());
                }
                ListAction::ExtendCopy => {
                    for element in overlay_list {
                        if !base_list.contains(element) {
                            base_list.push(element.clone());
                        }
                    }
                }
            }
            Ok(())
        }
        (base_scalar, overlay_scalar)
            if !is_container(base_scalar) && !is_container(overlay_scalar) =>
        {
            if base_scalar == overlay_scalar {
                return Ok(());
            }
            match options.scalar_present {
                PresentAction::Override => {
                    *base_scalar = overlay_scalar.clone();
                    Ok(())
                }
                PresentAction::Bypass => Ok(()),
                PresentAction::Terminate => {
                    if options.skip_errors {
                        Ok(())
                    } else {
                        Err(MergeError::Terminated {
                            path: joined_path(path, key),
                        })
                    }
                }
            }
        }
        (base_other, overlay_other) => {
            if options.skip_errors {
                Ok(())
            } else {
                Err(MergeError::TypeConflict {
                    path: joined_path(path, key),
                    base_kind: kind_name(base_other),
                    overlay_kind: kind_name(overlay_other),
                })
            }
        }
    }
}

// ============================================================================
// SECTION: Deletion Rewrite
// ============================================================================

/// Applies the post-merge deletion rewrite.
///
/// Every key prefixed with [`DELETION_MARKER`] is removed together with the
/// key it names. The target matches either the exact remaining key string or
/// any key whose canonical (first) alias equals the marker's target. The
/// rewrite recurses into nested records after handling each level's markers.
pub fn apply_deletion_markers(map: &mut Map<String, Value>) {
    let markers: Vec<String> = map
        .keys()
        .filter(|key| key.starts_with(DELETION_MARKER))
        .cloned()
        .collect();
    for marker in markers {
        map.remove(&marker);
        if let Some(target) = marker.strip_prefix(DELETION_MARKER) {
            map.remove(target);
            let aliased: Vec<String> = map
                .keys()
                .filter(|key| key.split(ALIAS_DELIMITER).next().map(str::trim) == Some(target))
                .cloned()
                .collect();
            for key in aliased {
                map.remove(&key);
            }
        }
    }
    for value in map.values_mut() {
        if let Value::Object(child) = value {
            apply_deletion_markers(child);
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Whether a JSON value is a container rather than a scalar.
const fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Short JSON kind name for error messages.
const fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "record",
    }
}

/// Joins the current path with the offending key for error messages.
fn joined_path(path: &[String], key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{key}", path.join("."))
    }
}

/// Counts the aggregate item total of a record, containers included.
#[must_use]
pub fn count_items(map: &Map<String, Value>) -> usize {
    map.values().map(count_value).sum::<usize>() + map.len()
}

/// Counts nested items below one value.
fn count_value(value: &Value) -> usize {
    match value {
        Value::Object(child) => count_items(child),
        Value::Array(elements) => {
            elements.len() + elements.iter().map(count_value).sum::<usize>()
        }
        _ => 0,
    }
}

/// Verifies an aggregate item ceiling for one operand.
fn check_aggregate(
    map: &Map<String, Value>,
    side: &'static str,
    max: usize,
) -> Result<(), MergeError> {
    let count = count_items(map);
    if count > max {
        return Err(MergeError::AggregateLimit {
            side,
            count,
            max,
        });
    }
    Ok(())
}
