//! # Storage
//!
//! Disk-backed person stores.

pub mod redb_registry;

pub use redb_registry::RedbRegistry;
