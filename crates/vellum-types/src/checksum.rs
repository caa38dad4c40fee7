use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Domain-separated BLAKE3 digest of one version's payload.
///
/// The checksum is computed at upload time, stored on the ledger entry, and
/// re-verified on every download. It detects payload corruption in the blob
/// store; it is not a storage address (blob keys are generated per upload).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum([u8; 32]);

impl Checksum {
    /// Compute the checksum of a payload.
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"vellum-payload-v1:");
        hasher.update(data);
        Self(*hasher.finalize().as_bytes())
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full hex-encoded digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string (64 hex characters).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Returns `true` if `data` hashes to this checksum.
    pub fn matches(&self, data: &[u8]) -> bool {
        *self == Self::of(data)
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..8])
    }
}
