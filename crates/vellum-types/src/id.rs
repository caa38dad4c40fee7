use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

fn short(uuid: &Uuid) -> String {
    uuid.simple().to_string()[..8].to_string()
}

fn parse_uuid(s: &str) -> Result<Uuid, TypeError> {
    Uuid::parse_str(s).map_err(|e| TypeError::InvalidId(e.to_string()))
}

/// Stable identifier for a document, unique for the document's lifetime.
///
/// Deleting a document retires its id permanently; re-uploading the same
/// title afterwards produces a brand-new identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a fresh, time-ordered identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Short identifier (first 8 hex characters) for logs and messages.
    pub fn short_id(&self) -> String {
        short(&self.0)
    }
}

impl FromStr for DocumentId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_uuid(s).map(Self)
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.short_id())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier for a registered user.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn short_id(&self) -> String {
        short(&self.0)
    }
}

impl FromStr for UserId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_uuid(s).map(Self)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.short_id())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generated storage key for one uploaded payload.
///
/// Keys are minted by the service at upload time and are independent of the
/// original filename, so payloads from different documents and users can
/// never collide in the blob store. A key addresses exactly one immutable
/// payload for its whole life.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobKey(Uuid);

impl BlobKey {
    /// Mint a fresh storage key.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn short_id(&self) -> String {
        short(&self.0)
    }
}

impl FromStr for BlobKey {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_uuid(s).map(Self)
    }
}

impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobKey({})", self.short_id())
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(DocumentId::generate(), DocumentId::generate());
        assert_ne!(UserId::generate(), UserId::generate());
        assert_ne!(BlobKey::generate(), BlobKey::generate());
    }

    #[test]
    fn display_parse_roundtrip() {
        let id = DocumentId::generate();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("not-a-uuid".parse::<DocumentId>().is_err());
        assert!("".parse::<BlobKey>().is_err());
    }

    #[test]
    fn short_id_is_eight_hex_chars() {
        let id = UserId::generate();
        let s = id.short_id();
        assert_eq!(s.len(), 8);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn serde_roundtrip_is_transparent() {
        let key = BlobKey::generate();
        let json = serde_json::to_string(&key).unwrap();
        // Transparent: serializes as a bare UUID string.
        assert_eq!(json, format!("\"{key}\""));
        let parsed: BlobKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, parsed);
    }

    #[test]
    fn debug_uses_short_form() {
        let id = DocumentId::generate();
        let debug = format!("{id:?}");
        assert!(debug.starts_with("DocumentId("));
        assert!(debug.contains(&id.short_id()));
    }
}
