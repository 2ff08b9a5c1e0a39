// tuneforge-core/src/core/mod.rs
// ============================================================================
// Module: Core Data Model
// Description: Values, sizing enums, requests, profiles, and responses.
// Purpose: Define the records shared by every tuning engine.
// Dependencies: crate::interfaces, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The core module holds the pure data model of a tuning run: the scalar
//! value domain, the closed sizing enums, the immutable request bundle, the
//! compiled profile table, and the managed response the engines populate.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod profile;
pub mod request;
pub mod response;
pub mod sizing;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use profile::ALIAS_DELIMITER;
pub use profile::ProfileError;
pub use profile::ProfileTable;
pub use profile::RuleCompute;
pub use profile::RuleEntry;
pub use profile::ScopeProfile;
pub use profile::TierInstruction;
pub use profile::compile_table;
pub use request::BASE_RESERVED_BYTES;
pub use request::DiskPerfSpec;
pub use request::HardwareSpec;
pub use request::Request;
pub use request::SizingMap;
pub use request::TuningRatios;
pub use response::ManagedResponse;
pub use response::TuningItem;
pub use response::TuningNamespace;
pub use sizing::OptimizationLevel;
pub use sizing::ScopeTerm;
pub use sizing::SizeTier;
pub use sizing::TuningScope;
pub use sizing::Workload;
pub use value::ParamValue;
