// tuneforge-core/src/core/response.rs
// ============================================================================
// Module: Managed Response
// Description: Per-run value/provenance store populated by tuning passes.
// Purpose: Hold resolved tuning items across namespaces and scopes.
// Dependencies: crate::core, crate::interfaces, tracing
// ============================================================================

//! ## Overview
//! A [`ManagedResponse`] is created empty at run start, populated
//! monotonically by the general resolver, then mutated item-by-item by the
//! correction passes. It is discarded after the caller extracts a rendering.
//! Two disjoint namespaces exist for the two tuning stages; both share the
//! same scope/key shape.
//!
//! Publication is strictly additive: an attempt to overwrite an existing key
//! is refused and logged, never applied. Correction passes update items
//! through [`ManagedResponse::update_value`] and
//! [`ManagedResponse::retrigger`], which preserve provenance by moving the
//! previous value into `before`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::core::request::Request;
use crate::core::sizing::ScopeTerm;
use crate::core::sizing::SizeTier;
use crate::core::sizing::TuningScope;
use crate::core::value::ParamValue;
use crate::interfaces::ComputeCtx;
use crate::interfaces::ComputeRef;

// ============================================================================
// SECTION: Tuning Namespace
// ============================================================================

/// Disjoint store namespace for one tuning stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TuningNamespace {
    /// First declarative resolution pass.
    General,
    /// Second numeric correction pass.
    Correction,
}

// ============================================================================
// SECTION: Tuning Item
// ============================================================================

/// One resolved configuration entry with provenance.
#[derive(Debug, Clone)]
pub struct TuningItem {
    /// Key unique within its scope.
    pub key: String,
    /// Value the entry held before the most recent update, if any.
    pub before: Option<ParamValue>,
    /// Current resolved value; never null once published.
    pub after: ParamValue,
    /// Resolution function last used to produce `after`, retained so
    /// dependent passes can re-invoke it with fresh inputs.
    pub trigger: Option<ComputeRef>,
    /// Sizing axis and discrete tier that drove resolution.
    pub hardware_scope: (ScopeTerm, SizeTier),
    /// Optional display transform name; opaque to the engine.
    pub formatter: Option<String>,
}

// ============================================================================
// SECTION: Scope Store
// ============================================================================

/// Cache and item store for one scope.
#[derive(Debug, Clone, Default)]
struct ScopeStore {
    /// Flat key-to-value map for fast dependency lookup.
    cache: BTreeMap<String, ParamValue>,
    /// Full provenance records keyed like the cache.
    items: BTreeMap<String, TuningItem>,
}

// ============================================================================
// SECTION: Managed Response
// ============================================================================

/// Per-run mutable store of resolved tuning items.
#[derive(Debug, Clone, Default)]
pub struct ManagedResponse {
    /// Stores for the general resolution pass.
    general: BTreeMap<TuningScope, ScopeStore>,
    /// Stores for the correction pass.
    correction: BTreeMap<TuningScope, ScopeStore>,
}

impl ManagedResponse {
    /// Creates an empty response for a new run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrows the namespace map for reads.
    const fn namespace(&self, namespace: TuningNamespace) -> &BTreeMap<TuningScope, ScopeStore> {
        match namespace {
            TuningNamespace::General => &self.general,
            TuningNamespace::Correction => &self.correction,
        }
    }

    /// Borrows the namespace map for writes.
    const fn namespace_mut(
        &mut self,
        namespace: TuningNamespace,
    ) -> &mut BTreeMap<TuningScope, ScopeStore> {
        match namespace {
            TuningNamespace::General => &mut self.general,
            TuningNamespace::Correction => &mut self.correction,
        }
    }

    /// Publishes a new item into a scope.
    ///
    /// Returns `false` without modifying anything when the key is already
    /// present; published keys are never overwritten by later entries.
    pub fn publish(
        &mut self,
        namespace: TuningNamespace,
        scope: TuningScope,
        item: TuningItem,
    ) -> bool {
        let store = self.namespace_mut(namespace).entry(scope).or_default();
        if store.cache.contains_key(&item.key) {
            warn!(
                scope = scope.as_key(),
                key = %item.key,
                "refusing to overwrite published item"
            );
            return false;
        }
        store.cache.insert(item.key.clone(), item.after.clone());
        store.items.insert(item.key.clone(), item);
        true
    }

    /// Looks up a cached value in one scope.
    #[must_use]
    pub fn cached(
        &self,
        namespace: TuningNamespace,
        scope: TuningScope,
        key: &str,
    ) -> Option<&ParamValue> {
        self.namespace(namespace).get(&scope).and_then(|store| store.cache.get(key))
    }

    /// Looks up a cached value across all scopes of a namespace.
    ///
    /// Scopes are searched in processing order; the first match wins.
    #[must_use]
    pub fn cached_global(&self, namespace: TuningNamespace, key: &str) -> Option<&ParamValue> {
        self.namespace(namespace).values().find_map(|store| store.cache.get(key))
    }

    /// Looks up a full item record.
    #[must_use]
    pub fn item(
        &self,
        namespace: TuningNamespace,
        scope: TuningScope,
        key: &str,
    ) -> Option<&TuningItem> {
        self.namespace(namespace).get(&scope).and_then(|store| store.items.get(key))
    }

    /// Iterates the item records of one scope in key order.
    pub fn items(
        &self,
        namespace: TuningNamespace,
        scope: TuningScope,
    ) -> impl Iterator<Item = &TuningItem> {
        self.namespace(namespace).get(&scope).into_iter().flat_map(|store| store.items.values())
    }

    /// Removes an item and its cache entry, returning the record.
    ///
    /// Used by the entry-level post-condition gate; a removed item is gone
    /// from both maps so later scopes can never observe a dropped value.
    pub fn remove(
        &mut self,
        namespace: TuningNamespace,
        scope: TuningScope,
        key: &str,
    ) -> Option<TuningItem> {
        let store = self.namespace_mut(namespace).get_mut(&scope)?;
        store.cache.remove(key);
        store.items.remove(key)
    }

    /// Replaces the value of a published item, preserving provenance.
    ///
    /// Returns `false` when the key is not published.
    pub fn update_value(
        &mut self,
        namespace: TuningNamespace,
        scope: TuningScope,
        key: &str,
        value: ParamValue,
    ) -> bool {
        let Some(store) = self.namespace_mut(namespace).get_mut(&scope) else {
            return false;
        };
        let Some(item) = store.items.get_mut(key) else {
            return false;
        };
        item.before = Some(item.after.clone());
        item.after = value.clone();
        store.cache.insert(key.to_string(), value);
        true
    }

    /// Re-invokes a published item's trigger with fresh inputs.
    ///
    /// Returns `true` when the trigger produced a new value and the item was
    /// updated. An item without a trigger is left untouched. A trigger
    /// failure or an empty result keeps the previous value; correction
    /// passes treat both as contained, logged conditions.
    pub fn retrigger(
        &mut self,
        namespace: TuningNamespace,
        scope: TuningScope,
        key: &str,
        request: &Request,
    ) -> bool {
        let Some(trigger) = self.item(namespace, scope, key).and_then(|item| item.trigger.clone())
        else {
            return false;
        };
        let outcome = {
            let ctx = ComputeCtx {
                scope,
                namespace,
                request,
                response: self,
            };
            trigger.call(&ctx)
        };
        match outcome {
            Ok(Some(value)) => self.update_value(namespace, scope, key, value),
            Ok(None) => {
                warn!(
                    scope = scope.as_key(),
                    key,
                    trigger = %trigger.name,
                    "retrigger produced no value; keeping previous"
                );
                false
            }
            Err(error) => {
                warn!(
                    scope = scope.as_key(),
                    key,
                    trigger = %trigger.name,
                    error = %error,
                    "retrigger failed; keeping previous value"
                );
                false
            }
        }
    }

    /// Number of published items in one namespace.
    #[must_use]
    pub fn len(&self, namespace: TuningNamespace) -> usize {
        self.namespace(namespace).values().map(|store| store.items.len()).sum()
    }

    /// Whether a namespace holds no items.
    #[must_use]
    pub fn is_empty(&self, namespace: TuningNamespace) -> bool {
        self.len(namespace) == 0
    }
}
