//! # Snapshot Format
//!
//! Binary serialization for portal snapshots. File I/O lives in the app.
//!
//! Format: Header (5 bytes) + postcard-serialized [`PortalSnapshot`].
//! - 4 bytes: Magic ("HBPT")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded.

use crate::primitives;
use crate::store::PortalSnapshot;
use crate::PortalError;

/// Maximum accepted snapshot size.
pub const MAX_SNAPSHOT_SIZE: usize = 64 * 1024 * 1024;

/// Header only.
const HEADER_SIZE: usize = 5;

// =============================================================================
// HEADER
// =============================================================================

/// The header that precedes every snapshot payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Reject foreign magic bytes and unknown versions.
    pub fn validate(&self) -> Result<(), PortalError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(PortalError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(PortalError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PortalError> {
        let Some(header) = bytes.get(..HEADER_SIZE) else {
            return Err(PortalError::DeserializationError(
                "Header too short".to_string(),
            ));
        };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&header[0..4]);
        Ok(Self {
            magic,
            version: header[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION
// =============================================================================

/// Encode a snapshot as header + postcard payload.
pub fn snapshot_to_bytes(snapshot: &PortalSnapshot) -> Result<Vec<u8>, PortalError> {
    let payload = postcard::to_stdvec(snapshot)
        .map_err(|e| PortalError::SerializationError(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
    bytes.extend_from_slice(&SnapshotHeader::new().to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode a snapshot written by [`snapshot_to_bytes`].
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<PortalSnapshot, PortalError> {
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(PortalError::DeserializationError(format!(
            "Snapshot of {} bytes exceeds maximum {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = bytes.get(HEADER_SIZE..).unwrap_or_default();
    postcard::from_bytes(payload).map_err(|e| {
        PortalError::DeserializationError(format!("Failed to decode snapshot: {}", e))
    })
}
