//! Foundation types for Vellum.
//!
//! This crate provides the identity, integrity, and structural types used
//! throughout the versioned document store. Every other Vellum crate depends
//! on `vellum-types`.
//!
//! # Key Types
//!
//! - [`DocumentId`] / [`UserId`] — stable UUID identities
//! - [`BlobKey`] — generated storage key for one version's payload
//! - [`Checksum`] — domain-separated BLAKE3 payload digest
//! - [`Actor`] — the authenticated identity attached to every operation
//! - [`DocumentRecord`] — the document aggregate embedding its version ledger
//! - [`VersionEntry`] — one immutable ledger entry

pub mod actor;
pub mod checksum;
pub mod document;
pub mod error;
pub mod id;
pub mod user;

pub use actor::Actor;
pub use checksum::Checksum;
pub use document::{
    normalize_tags, DocumentRecord, VersionEntry, VersionInput, Visibility,
};
pub use error::{DocumentError, TypeError};
pub use id::{BlobKey, DocumentId, UserId};
pub use user::UserRecord;
