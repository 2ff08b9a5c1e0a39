// tuneforge-core/src/core/profile.rs
// ============================================================================
// Module: Profile Table Model
// Description: Declarative rule entries and their load-time compilation.
// Purpose: Turn raw JSON profile tables into tagged rule records.
// Dependencies: crate::core, crate::interfaces, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Profile tables arrive as nested JSON keyed by scope:
//! `scope name -> [scope tag, { key: raw entry }, extra defaults record]`.
//! Entries are compiled exactly once into a tagged [`RuleCompute`] union so
//! the resolver switches on an explicit variant instead of probing record
//! shape at run time. Extra-defaults fields are back-filled onto every entry
//! missing them before compilation.
//!
//! Multi-alias keys encode several aliases in one key string separated by
//! [`ALIAS_DELIMITER`]; the first alias is canonical and all aliases receive
//! the same resolved value via cloning.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::sizing::ScopeTerm;
use crate::core::sizing::SizeTier;
use crate::core::sizing::TuningScope;
use crate::core::value::ParamValue;
use crate::interfaces::ComputeRef;
use crate::interfaces::ComputeRegistry;
use crate::interfaces::ItemCheckRef;
use crate::interfaces::ScopeCheckRef;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Delimiter separating aliases inside one rule-entry key string.
pub const ALIAS_DELIMITER: char = ';';

/// Suffix marking a tier-specific constant default inside `instructions`.
const TIER_DEFAULT_SUFFIX: &str = "_default";

// ============================================================================
// SECTION: Rule Records
// ============================================================================

/// Tier-specific resolution instruction.
#[derive(Debug, Clone, Default)]
pub struct TierInstruction {
    /// Tier-specific compute function, if declared.
    pub compute: Option<ComputeRef>,
    /// Tier-specific constant default, if declared.
    pub default: Option<ParamValue>,
}

/// Active computation of a rule entry, resolved once at load time.
#[derive(Debug, Clone)]
pub enum RuleCompute {
    /// The entry is a constant; only the default applies.
    Static,
    /// The entry computes its value with one generic function.
    Computed(ComputeRef),
    /// The entry dispatches on the resolved size tier.
    Tiered {
        /// Instruction per declared tier.
        instructions: BTreeMap<SizeTier, TierInstruction>,
        /// Generic function used when the tier declares no instruction.
        fallback: Option<ComputeRef>,
    },
}

/// One compiled rule entry.
#[derive(Debug, Clone)]
pub struct RuleEntry {
    /// Aliases receiving the resolved value; the first is canonical.
    pub aliases: Vec<String>,
    /// Required constant default.
    pub default: ParamValue,
    /// Active computation variant.
    pub compute: RuleCompute,
    /// Sizing axis driving tier selection.
    pub hardware_scope: ScopeTerm,
    /// Optional per-value post-condition.
    pub item_check: Option<ItemCheckRef>,
    /// Optional entry-level post-condition applied after the scope completes.
    pub scope_check: Option<ScopeCheckRef>,
    /// Optional display transform name; opaque to the engine.
    pub formatter: Option<String>,
}

impl RuleEntry {
    /// Canonical alias of the entry.
    #[must_use]
    pub fn canonical(&self) -> &str {
        self.aliases.first().map_or("", String::as_str)
    }
}

/// Compiled rule entries of one scope, in declaration order.
#[derive(Debug, Clone)]
pub struct ScopeProfile {
    /// Scope the entries publish into.
    pub scope: TuningScope,
    /// Entries in table-declaration order.
    pub entries: Vec<RuleEntry>,
}

/// Fully compiled profile table.
#[derive(Debug, Clone, Default)]
pub struct ProfileTable {
    /// Scope profiles in table-declaration order.
    pub scopes: Vec<ScopeProfile>,
}

// ============================================================================
// SECTION: Profile Errors
// ============================================================================

/// Error raised while compiling a raw profile table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// The raw table or one of its records has the wrong JSON shape.
    #[error("malformed profile table: {0}")]
    BadShape(String),
    /// A scope tag does not name a known tuning scope.
    #[error("unknown tuning scope: {0}")]
    UnknownScope(String),
    /// An instruction key does not name a known size tier.
    #[error("unknown size tier in instructions: {0}")]
    UnknownTier(String),
    /// A hardware-scope field does not name a known scope term.
    #[error("unknown hardware scope term: {0}")]
    UnknownScopeTerm(String),
    /// A function name is not present in the registry.
    #[error("unknown {kind} function: {name}")]
    UnknownFunction {
        /// Function category (`compute`, `item_check`, or `scope_check`).
        kind: &'static str,
        /// The unresolved registry name.
        name: String,
    },
    /// An entry's default is missing, null, or not a scalar constant.
    #[error("entry {key} has no usable default")]
    InvalidDefault {
        /// Key of the offending entry.
        key: String,
    },
}

// ============================================================================
// SECTION: Table Compilation
// ============================================================================

/// Compiles a raw JSON profile table against a function registry.
///
/// Scope and entry order follow the table's declaration order, which the
/// resolver depends on for dependency visibility.
///
/// # Errors
///
/// Returns [`ProfileError`] when the table shape, a tier key, or a function
/// name cannot be resolved.
pub fn compile_table(
    raw: &Value,
    registry: &ComputeRegistry,
) -> Result<ProfileTable, ProfileError> {
    let Value::Object(scopes) = raw else {
        return Err(ProfileError::BadShape("table root must be an object".to_string()));
    };

    let mut compiled = ProfileTable::default();
    for (scope_name, scope_value) in scopes {
        compiled.scopes.push(compile_scope(scope_name, scope_value, registry)?);
    }
    Ok(compiled)
}

/// Compiles one `[tag, entries, extras]` scope record.
fn compile_scope(
    scope_name: &str,
    scope_value: &Value,
    registry: &ComputeRegistry,
) -> Result<ScopeProfile, ProfileError> {
    let Value::Array(parts) = scope_value else {
        return Err(ProfileError::BadShape(format!(
            "scope {scope_name} must be a [tag, entries, extras] array"
        )));
    };
    let Some(tag) = parts.first().and_then(Value::as_str) else {
        return Err(ProfileError::BadShape(format!("scope {scope_name} is missing its tag")));
    };
    let Some(scope) = TuningScope::from_key(tag) else {
        return Err(ProfileError::UnknownScope(tag.to_string()));
    };
    let Some(Value::Object(entries)) = parts.get(1) else {
        return Err(ProfileError::BadShape(format!(
            "scope {scope_name} is missing its entry record"
        )));
    };
    let extras = match parts.get(2) {
        None | Some(Value::Null) => None,
        Some(Value::Object(extras)) => Some(extras),
        Some(_) => {
            return Err(ProfileError::BadShape(format!(
                "scope {scope_name} extra defaults must be an object"
            )));
        }
    };

    let mut profile = ScopeProfile {
        scope,
        entries: Vec::with_capacity(entries.len()),
    };
    for (key, entry_value) in entries {
        profile.entries.push(compile_entry(key, entry_value, extras, registry)?);
    }
    Ok(profile)
}

/// Compiles one raw rule entry, back-filling extra defaults.
fn compile_entry(
    key: &str,
    entry_value: &Value,
    extras: Option<&Map<String, Value>>,
    registry: &ComputeRegistry,
) -> Result<RuleEntry, ProfileError> {
    let Value::Object(fields) = entry_value else {
        return Err(ProfileError::BadShape(format!("entry {key} must be an object")));
    };

    // Entry-declared fields win; extra defaults only fill gaps.
    let field = |name: &str| fields.get(name).or_else(|| extras.and_then(|map| map.get(name)));

    let aliases: Vec<String> = key
        .split(ALIAS_DELIMITER)
        .map(str::trim)
        .filter(|alias| !alias.is_empty())
        .map(ToString::to_string)
        .collect();
    if aliases.is_empty() {
        return Err(ProfileError::BadShape(format!("entry key {key:?} has no usable alias")));
    }

    let default = field("default")
        .and_then(ParamValue::from_json)
        .ok_or_else(|| ProfileError::InvalidDefault {
            key: key.to_string(),
        })?;

    let generic = match field("compute") {
        None => None,
        Some(Value::String(name)) => Some(lookup_compute(registry, name)?),
        Some(_) => {
            return Err(ProfileError::BadShape(format!(
                "entry {key} compute must be a function name"
            )));
        }
    };

    let compute = match field("instructions") {
        None => generic.map_or(RuleCompute::Static, RuleCompute::Computed),
        Some(Value::Object(instructions)) => RuleCompute::Tiered {
            instructions: compile_instructions(key, instructions, registry)?,
            fallback: generic,
        },
        Some(_) => {
            return Err(ProfileError::BadShape(format!(
                "entry {key} instructions must be an object"
            )));
        }
    };

    let hardware_scope = match field("hardware_scope") {
        None => ScopeTerm::Overall,
        Some(Value::String(term)) => ScopeTerm::from_key(term)
            .ok_or_else(|| ProfileError::UnknownScopeTerm(term.clone()))?,
        Some(_) => {
            return Err(ProfileError::BadShape(format!(
                "entry {key} hardware_scope must be a term name"
            )));
        }
    };

    let item_check = match field("item_check") {
        None => None,
        Some(Value::String(name)) => {
            Some(registry.item_check(name).ok_or_else(|| ProfileError::UnknownFunction {
                kind: "item_check",
                name: name.clone(),
            })?)
        }
        Some(_) => {
            return Err(ProfileError::BadShape(format!(
                "entry {key} item_check must be a function name"
            )));
        }
    };

    let scope_check = match field("scope_check") {
        None => None,
        Some(Value::String(name)) => {
            Some(registry.scope_check(name).ok_or_else(|| ProfileError::UnknownFunction {
                kind: "scope_check",
                name: name.clone(),
            })?)
        }
        Some(_) => {
            return Err(ProfileError::BadShape(format!(
                "entry {key} scope_check must be a function name"
            )));
        }
    };

    let formatter = match field("formatter") {
        None => None,
        Some(Value::String(name)) => Some(name.clone()),
        Some(_) => {
            return Err(ProfileError::BadShape(format!(
                "entry {key} formatter must be a name"
            )));
        }
    };

    Ok(RuleEntry {
        aliases,
        default,
        compute,
        hardware_scope,
        item_check,
        scope_check,
        formatter,
    })
}

/// Compiles the `instructions` record of one entry.
fn compile_instructions(
    key: &str,
    instructions: &Map<String, Value>,
    registry: &ComputeRegistry,
) -> Result<BTreeMap<SizeTier, TierInstruction>, ProfileError> {
    let mut compiled: BTreeMap<SizeTier, TierInstruction> = BTreeMap::new();
    for (instruction_key, instruction_value) in instructions {
        if let Some(tier_key) = instruction_key.strip_suffix(TIER_DEFAULT_SUFFIX) {
            let tier = SizeTier::from_key(tier_key)
                .ok_or_else(|| ProfileError::UnknownTier(instruction_key.clone()))?;
            let default = ParamValue::from_json(instruction_value).ok_or_else(|| {
                ProfileError::InvalidDefault {
                    key: format!("{key}.{instruction_key}"),
                }
            })?;
            compiled.entry(tier).or_default().default = Some(default);
        } else {
            let tier = SizeTier::from_key(instruction_key)
                .ok_or_else(|| ProfileError::UnknownTier(instruction_key.clone()))?;
            let Some(name) = instruction_value.as_str() else {
                return Err(ProfileError::BadShape(format!(
                    "entry {key} tier {instruction_key} must name a function"
                )));
            };
            compiled.entry(tier).or_default().compute = Some(lookup_compute(registry, name)?);
        }
    }
    Ok(compiled)
}

/// Resolves a compute function name through the registry.
fn lookup_compute(registry: &ComputeRegistry, name: &str) -> Result<ComputeRef, ProfileError> {
    registry.compute(name).ok_or_else(|| ProfileError::UnknownFunction {
        kind: "compute",
        name: name.to_string(),
    })
}
