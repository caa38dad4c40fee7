use thiserror::Error;

/// Errors produced by type-level parsing and construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Violations of the document aggregate's invariants.
///
/// A record that fails any of these checks must never be persisted; the
/// catalog store validates every insert and update against them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("document has no versions")]
    EmptyLedger,

    #[error("version numbers are not contiguous: expected {expected}, found {found}")]
    NonContiguous { expected: u32, found: u32 },

    #[error("current version {current} does not match ledger head {head}")]
    HeadMismatch { current: u32, head: u32 },

    #[error("storage pointer does not match the current version's blob")]
    PointerMismatch,

    #[error("owner cannot be a collaborator")]
    OwnerIsCollaborator,

    #[error("user is already a collaborator")]
    DuplicateCollaborator,
}
