//! # lineage-core
//!
//! Person records and family-graph traversal for the Lineage service.
//!
//! People reference their parents through `father_id`/`mother_id`, forming
//! a child→parent graph. This crate stores those records and answers
//! relationship queries over them:
//! - immediate family (self, parents, children)
//! - paternal-line generation depth
//! - gender counts and family size
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - Holds no global store: every query takes an explicit `PersonStore`
//! - Never assumes referential integrity; dangling parent ids end a branch
//! - Every walk is bounded by the store's record count, even on cyclic data

// =============================================================================
// MODULES
// =============================================================================

pub mod backend;
pub mod family;
pub mod formats;
pub mod primitives;
pub mod registry;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Gender, GenderCounts, LineageError, Person, PersonDraft, PersonId};

// =============================================================================
// RE-EXPORTS: Stores and Queries
// =============================================================================

pub use backend::StorageBackend;
pub use family::FamilyGraph;
pub use registry::{PersonStore, Registry, RegistrySnapshot};
pub use storage::RedbRegistry;

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{SnapshotHeader, registry_from_bytes, registry_to_bytes};
