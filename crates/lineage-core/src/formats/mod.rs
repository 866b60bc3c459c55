//! # Formats
//!
//! Byte-level encodings shared by the file backend and export.

pub mod persistence;

pub use persistence::{
    MAX_SNAPSHOT_SIZE, SnapshotHeader, registry_from_bytes, registry_to_bytes,
    snapshot_from_bytes, snapshot_to_bytes,
};
