// tuneforge-core/src/interfaces/mod.rs
// ============================================================================
// Module: Compute Interfaces
// Description: Function contracts between profile tables and the engines.
// Purpose: Define compute/check signatures and the name registry.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Profile tables are declarative JSON; behavior is attached by name through
//! a [`ComputeRegistry`] that collaborators populate before table
//! compilation. Every function receives an explicit [`ComputeCtx`] rather
//! than ambient state, which is what makes the "only the solver mutates
//! ratios" invariant enforceable by ownership.
//!
//! A compute function distinguishes two failure shapes:
//! - `Err(ComputeError)` models a computation that threw; the resolver logs
//!   it and falls back to the resolved default.
//! - `Ok(None)` models a computation that produced nothing; the item is
//!   dropped, not defaulted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::core::request::Request;
use crate::core::response::ManagedResponse;
use crate::core::response::TuningNamespace;
use crate::core::sizing::TuningScope;
use crate::core::value::ParamValue;

// ============================================================================
// SECTION: Compute Context
// ============================================================================

/// Read-only view handed to compute functions and post-condition checks.
///
/// Constructed once per invocation; never stored. Cache reads always go
/// through this context so a function observes the response exactly as
/// published at call time.
#[derive(Clone, Copy)]
pub struct ComputeCtx<'run> {
    /// Scope the current entry belongs to.
    pub scope: TuningScope,
    /// Namespace the current pass publishes into.
    pub namespace: TuningNamespace,
    /// The run's input bundle.
    pub request: &'run Request,
    /// The run's response store, read-only from inside a function.
    pub response: &'run ManagedResponse,
}

impl ComputeCtx<'_> {
    /// Looks up a value published earlier in the current scope.
    #[must_use]
    pub fn cached(&self, key: &str) -> Option<&ParamValue> {
        self.response.cached(self.namespace, self.scope, key)
    }

    /// Looks up a value published in any scope of the current namespace.
    ///
    /// Scopes are searched in processing order, so an earlier scope's value
    /// shadows a later one under a duplicate key.
    #[must_use]
    pub fn cached_global(&self, key: &str) -> Option<&ParamValue> {
        self.response.cached_global(self.namespace, key)
    }
}

// ============================================================================
// SECTION: Function Signatures
// ============================================================================

/// Computation producing a parameter value from the run context.
pub type ComputeFn =
    dyn Fn(&ComputeCtx<'_>) -> Result<Option<ParamValue>, ComputeError> + Send + Sync;

/// Post-condition over a single resolved value under one alias key.
///
/// The key is passed because each alias of a multi-alias entry is validated
/// independently; a predicate may reject one clone without affecting the
/// others.
pub type ItemCheckFn = dyn Fn(&str, &ParamValue) -> bool + Send + Sync;

/// Entry-level post-condition over the final value and the run context.
pub type ScopeCheckFn = dyn Fn(&ParamValue, &ComputeCtx<'_>) -> bool + Send + Sync;

/// Error raised by a compute function.
///
/// A compute error is always contained to its rule entry; the resolver logs
/// it, falls back to the entry's resolved default, and continues the run.
#[derive(Debug, Clone, Error)]
#[error("compute failed: {message}")]
pub struct ComputeError {
    /// Human-readable failure description.
    pub message: String,
}

impl ComputeError {
    /// Builds a compute error from any displayable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Named Function References
// ============================================================================

/// Named handle to a compute function.
///
/// The name is the registry key the profile table referenced; it is kept for
/// provenance and logging.
#[derive(Clone)]
pub struct ComputeRef {
    /// Registry name of the function.
    pub name: String,
    /// The function itself.
    func: Arc<ComputeFn>,
}

impl ComputeRef {
    /// Builds a reference from a registry name and function.
    #[must_use]
    pub fn new(name: impl Into<String>, func: Arc<ComputeFn>) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }

    /// Invokes the compute function.
    ///
    /// # Errors
    ///
    /// Propagates the [`ComputeError`] raised by the function.
    pub fn call(&self, ctx: &ComputeCtx<'_>) -> Result<Option<ParamValue>, ComputeError> {
        (self.func)(ctx)
    }
}

impl std::fmt::Debug for ComputeRef {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_tuple("ComputeRef").field(&self.name).finish()
    }
}

/// Named handle to a single-value post-condition.
#[derive(Clone)]
pub struct ItemCheckRef {
    /// Registry name of the predicate.
    pub name: String,
    /// The predicate itself.
    func: Arc<ItemCheckFn>,
}

impl ItemCheckRef {
    /// Builds a reference from a registry name and predicate.
    #[must_use]
    pub fn new(name: impl Into<String>, func: Arc<ItemCheckFn>) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }

    /// Evaluates the predicate against one alias key and its resolved value.
    #[must_use]
    pub fn accepts(&self, key: &str, value: &ParamValue) -> bool {
        (self.func)(key, value)
    }
}

impl std::fmt::Debug for ItemCheckRef {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_tuple("ItemCheckRef").field(&self.name).finish()
    }
}

/// Named handle to an entry-level post-condition.
#[derive(Clone)]
pub struct ScopeCheckRef {
    /// Registry name of the predicate.
    pub name: String,
    /// The predicate itself.
    func: Arc<ScopeCheckFn>,
}

impl ScopeCheckRef {
    /// Builds a reference from a registry name and predicate.
    #[must_use]
    pub fn new(name: impl Into<String>, func: Arc<ScopeCheckFn>) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }

    /// Evaluates the predicate against a final value and the run context.
    #[must_use]
    pub fn accepts(&self, value: &ParamValue, ctx: &ComputeCtx<'_>) -> bool {
        (self.func)(value, ctx)
    }
}

impl std::fmt::Debug for ScopeCheckRef {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_tuple("ScopeCheckRef").field(&self.name).finish()
    }
}

// ============================================================================
// SECTION: Compute Registry
// ============================================================================

/// Name-to-function registry populated by collaborators before compilation.
#[derive(Default)]
pub struct ComputeRegistry {
    /// Registered compute functions.
    computes: BTreeMap<String, Arc<ComputeFn>>,
    /// Registered single-value post-conditions.
    item_checks: BTreeMap<String, Arc<ItemCheckFn>>,
    /// Registered entry-level post-conditions.
    scope_checks: BTreeMap<String, Arc<ScopeCheckFn>>,
}

impl ComputeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a compute function under a name, replacing any previous one.
    pub fn register_compute<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&ComputeCtx<'_>) -> Result<Option<ParamValue>, ComputeError> + Send + Sync + 'static,
    {
        self.computes.insert(name.into(), Arc::new(func));
    }

    /// Registers a single-value post-condition under a name.
    pub fn register_item_check<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&str, &ParamValue) -> bool + Send + Sync + 'static,
    {
        self.item_checks.insert(name.into(), Arc::new(func));
    }

    /// Registers an entry-level post-condition under a name.
    pub fn register_scope_check<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&ParamValue, &ComputeCtx<'_>) -> bool + Send + Sync + 'static,
    {
        self.scope_checks.insert(name.into(), Arc::new(func));
    }

    /// Resolves a compute function by name.
    #[must_use]
    pub fn compute(&self, name: &str) -> Option<ComputeRef> {
        self.computes.get(name).map(|func| ComputeRef::new(name, Arc::clone(func)))
    }

    /// Resolves a single-value post-condition by name.
    #[must_use]
    pub fn item_check(&self, name: &str) -> Option<ItemCheckRef> {
        self.item_checks.get(name).map(|func| ItemCheckRef::new(name, Arc::clone(func)))
    }

    /// Resolves an entry-level post-condition by name.
    #[must_use]
    pub fn scope_check(&self, name: &str) -> Option<ScopeCheckRef> {
        self.scope_checks.get(name).map(|func| ScopeCheckRef::new(name, Arc::clone(func)))
    }
}

impl std::fmt::Debug for ComputeRegistry {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ComputeRegistry")
            .field("computes", &self.computes.keys().collect::<Vec<_>>())
            .field("item_checks", &self.item_checks.keys().collect::<Vec<_>>())
            .field("scope_checks", &self.scope_checks.keys().collect::<Vec<_>>())
            .finish()
    }
}
