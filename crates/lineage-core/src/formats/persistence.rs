//! # Snapshot Format
//!
//! Binary serialization for person registries.
//!
//! File I/O lives in the app layer; this module only converts between
//! `Registry` and bytes.
//!
//! Format: Header (5 bytes) + postcard-serialized `RegistrySnapshot`.
//! - 4 bytes: Magic ("LINE")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded.

use crate::registry::{Registry, RegistrySnapshot};
use crate::{LineageError, primitives};

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum accepted snapshot size (256 MB).
///
/// Checked before any decoding so a corrupted length cannot drive allocation.
pub const MAX_SNAPSHOT_SIZE: usize = 256 * 1024 * 1024;

/// Header length in bytes.
const HEADER_LEN: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The header that precedes every snapshot payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Create a header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate magic bytes and version.
    pub fn validate(&self) -> Result<(), LineageError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(LineageError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(LineageError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LineageError> {
        let Some(head) = bytes.get(..HEADER_LEN) else {
            return Err(LineageError::DeserializationError(
                "Header too short".to_string(),
            ));
        };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&head[0..4]);
        Ok(Self {
            magic,
            version: head[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a snapshot to bytes (header + payload).
pub fn snapshot_to_bytes(snapshot: &RegistrySnapshot) -> Result<Vec<u8>, LineageError> {
    let payload = postcard::to_stdvec(snapshot)
        .map_err(|e| LineageError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_LEN + payload.len());
    result.extend_from_slice(&SnapshotHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Serialize a registry to bytes.
pub fn registry_to_bytes(registry: &Registry) -> Result<Vec<u8>, LineageError> {
    snapshot_to_bytes(&RegistrySnapshot::from(registry))
}

/// Deserialize a snapshot from bytes.
///
/// Validates, in order: minimum size, maximum size, header. Only then is
/// the payload decoded.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<RegistrySnapshot, LineageError> {
    if bytes.len() < HEADER_LEN {
        return Err(LineageError::DeserializationError(format!(
            "Data too short: minimum {} bytes required",
            HEADER_LEN
        )));
    }
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(LineageError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    SnapshotHeader::from_bytes(bytes)?.validate()?;

    postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|e| {
        LineageError::DeserializationError(format!("Failed to decode snapshot: {}", e))
    })
}

/// Deserialize a registry from bytes, preserving ids.
pub fn registry_from_bytes(bytes: &[u8]) -> Result<Registry, LineageError> {
    snapshot_from_bytes(bytes).and_then(Registry::try_from)
}

// =============================================================================
// TESTS
// =============================================================================
