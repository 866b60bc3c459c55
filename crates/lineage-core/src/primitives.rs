//! # Primitives
//!
//! Fixed limits and format constants for the lineage core.
//!
//! These are compiled into the binary and are immutable at runtime.

/// First id handed out by an empty store.
pub const FIRST_PERSON_ID: i64 = 1;

/// Maximum length of `full_name` in bytes.
pub const MAX_FULL_NAME_LENGTH: usize = 512;

/// Maximum length of a gender label in bytes.
pub const MAX_GENDER_LABEL_LENGTH: usize = 64;

/// Magic bytes for the lineage snapshot header.
pub const MAGIC_BYTES: &[u8; 4] = b"LINE";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot layout.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// TESTS
// =============================================================================
