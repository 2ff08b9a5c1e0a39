// tuneforge-core/src/runtime/resolver.rs
// ============================================================================
// Module: General Tune Resolver
// Description: Profile-table resolution into the managed response.
// Purpose: Turn declarative rule entries into published tuning items.
// Dependencies: crate::core, crate::interfaces, tracing
// ============================================================================

//! ## Overview
//! The resolver walks each scope's entries in table-declaration order, so a
//! later entry may read an earlier entry's published cache value within the
//! same scope, and a later scope may read any earlier scope's cache
//! read-only. Per-entry computation failures are contained: a throwing
//! compute falls back to the entry's resolved default, a null result or a
//! rejected post-condition drops the item, and the run always continues.
//!
//! Resolution per entry:
//! 1. split aliases; the first is canonical;
//! 2. translate the entry's hardware-scope term into a size tier;
//! 3. pick the active function and default (tier instruction first, then the
//!    generic function, then the generic default with a logged degradation);
//! 4. invoke, falling back to the default on failure;
//! 5. validate and publish the canonical alias, then clone to the rest,
//!    each independently re-validated;
//! 6. after the scope completes, apply entry-level second-chance gates.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::core::profile::ProfileTable;
use crate::core::profile::RuleCompute;
use crate::core::profile::RuleEntry;
use crate::core::profile::ScopeProfile;
use crate::core::request::Request;
use crate::core::response::ManagedResponse;
use crate::core::response::TuningItem;
use crate::core::response::TuningNamespace;
use crate::core::sizing::SizeTier;
use crate::core::sizing::TuningScope;
use crate::core::value::ParamValue;
use crate::interfaces::ComputeCtx;
use crate::interfaces::ComputeRef;
use crate::interfaces::ScopeCheckRef;

// ============================================================================
// SECTION: Run Statistics
// ============================================================================

/// Resolution counters for one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeStats {
    /// Scope the counters belong to.
    pub scope: TuningScope,
    /// Items published and still present after the second-chance gate.
    pub resolved: usize,
    /// Entries whose compute failed and fell back to their default.
    pub fallbacks: usize,
    /// Items dropped by null results, post-conditions, or overwrite refusal.
    pub dropped: usize,
}

/// Resolution counters for a whole run.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Per-scope counters in processing order.
    pub scopes: Vec<ScopeStats>,
}

impl RunStats {
    /// Sums the counters across all scopes as (resolved, fallbacks, dropped).
    #[must_use]
    pub fn totals(&self) -> (usize, usize, usize) {
        self.scopes.iter().fold((0, 0, 0), |(resolved, fallbacks, dropped), stats| {
            (
                resolved + stats.resolved,
                fallbacks + stats.fallbacks,
                dropped + stats.dropped,
            )
        })
    }
}

// ============================================================================
// SECTION: Entry Plan
// ============================================================================

/// Active function and default picked for one entry at one tier.
struct EntryPlan<'entry> {
    /// Function to invoke, when any applies.
    func: Option<&'entry ComputeRef>,
    /// Default used on failure or when no function applies.
    default: &'entry ParamValue,
}

/// Picks the active function and default for an entry.
///
/// Tier instructions win over the generic function; a tier default without a
/// tier function is used directly, bypassing the generic function entirely.
/// A tier with no instruction at all degrades to the generic function, or to
/// the generic default with a logged (expected) fallback.
fn entry_plan(entry: &RuleEntry, tier: SizeTier) -> EntryPlan<'_> {
    match &entry.compute {
        RuleCompute::Static => EntryPlan {
            func: None,
            default: &entry.default,
        },
        RuleCompute::Computed(func) => EntryPlan {
            func: Some(func),
            default: &entry.default,
        },
        RuleCompute::Tiered {
            instructions,
            fallback,
        } => match instructions.get(&tier) {
            Some(instruction) => {
                if let Some(func) = &instruction.compute {
                    EntryPlan {
                        func: Some(func),
                        default: instruction.default.as_ref().unwrap_or(&entry.default),
                    }
                } else if let Some(default) = &instruction.default {
                    EntryPlan {
                        func: None,
                        default,
                    }
                } else {
                    degraded_plan(entry, tier, fallback.as_ref())
                }
            }
            None => degraded_plan(entry, tier, fallback.as_ref()),
        },
    }
}

/// Plan for a tier without usable instructions.
fn degraded_plan<'entry>(
    entry: &'entry RuleEntry,
    tier: SizeTier,
    fallback: Option<&'entry ComputeRef>,
) -> EntryPlan<'entry> {
    if fallback.is_none() {
        debug!(
            key = entry.canonical(),
            tier = tier.as_key(),
            "no tier instruction; degrading to generic default"
        );
    }
    EntryPlan {
        func: fallback,
        default: &entry.default,
    }
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolves a compiled profile table into the response's general namespace.
///
/// Scopes resolve in table order; state is strictly additive within a scope
/// and cross-scope reads are read-only.
pub fn resolve_table(
    table: &ProfileTable,
    request: &Request,
    response: &mut ManagedResponse,
) -> RunStats {
    let mut stats = RunStats::default();
    for profile in &table.scopes {
        stats.scopes.push(resolve_scope(profile, request, response));
    }
    stats
}

/// Resolves one scope's entries and applies its second-chance gates.
fn resolve_scope(
    profile: &ScopeProfile,
    request: &Request,
    response: &mut ManagedResponse,
) -> ScopeStats {
    let scope = profile.scope;
    let namespace = TuningNamespace::General;
    let mut stats = ScopeStats {
        scope,
        resolved: 0,
        fallbacks: 0,
        dropped: 0,
    };
    let mut gated: Vec<(String, ScopeCheckRef)> = Vec::new();

    for entry in &profile.entries {
        let tier = request.sizing.tier_for(entry.hardware_scope);
        let plan = entry_plan(entry, tier);

        let produced = match plan.func {
            Some(func) => {
                let outcome = {
                    let ctx = ComputeCtx {
                        scope,
                        namespace,
                        request,
                        response,
                    };
                    func.call(&ctx)
                };
                match outcome {
                    Ok(Some(value)) => Some((value, Some(func.clone()))),
                    Ok(None) => {
                        info!(
                            scope = scope.as_key(),
                            key = entry.canonical(),
                            compute = %func.name,
                            "compute produced no value; dropping item"
                        );
                        stats.dropped += entry.aliases.len();
                        None
                    }
                    Err(error) => {
                        warn!(
                            scope = scope.as_key(),
                            key = entry.canonical(),
                            compute = %func.name,
                            error = %error,
                            "compute failed; falling back to default"
                        );
                        stats.fallbacks += 1;
                        Some((plan.default.clone(), None))
                    }
                }
            }
            None => Some((plan.default.clone(), None)),
        };
        let Some((value, trigger)) = produced else {
            continue;
        };

        // Canonical alias first, then identical clones to the rest, each
        // independently re-validated by the item-level post-condition.
        for alias in &entry.aliases {
            if let Some(check) = &entry.item_check
                && !check.accepts(alias, &value)
            {
                info!(
                    scope = scope.as_key(),
                    key = %alias,
                    check = %check.name,
                    "post-condition rejected item"
                );
                stats.dropped += 1;
                continue;
            }
            let item = TuningItem {
                key: alias.clone(),
                before: None,
                after: value.clone(),
                trigger: trigger.clone(),
                hardware_scope: (entry.hardware_scope, tier),
                formatter: entry.formatter.clone(),
            };
            if response.publish(namespace, scope, item) {
                stats.resolved += 1;
                if let Some(gate) = &entry.scope_check {
                    gated.push((alias.clone(), gate.clone()));
                }
            } else {
                stats.dropped += 1;
            }
        }
    }

    // Entry-level second-chance gate over the completed scope.
    for (key, gate) in gated {
        let rejected = {
            let ctx = ComputeCtx {
                scope,
                namespace,
                request,
                response,
            };
            ctx.cached(&key).is_some_and(|value| !gate.accepts(value, &ctx))
        };
        if rejected {
            response.remove(namespace, scope, &key);
            info!(
                scope = scope.as_key(),
                key = %key,
                check = %gate.name,
                "scope post-condition dropped item"
            );
            stats.resolved = stats.resolved.saturating_sub(1);
            stats.dropped += 1;
        }
    }

    stats
}
