//! The Vellum document service.
//!
//! This crate is the heart of Vellum. It orchestrates the catalog and blob
//! stores behind every user-facing operation, enforcing the version ledger
//! invariants and consulting the access evaluator before any store access:
//!
//! - Upload: create-or-version decision, duplicate-filename guard,
//!   blob-then-catalog ordering with orphan cleanup on failure
//! - Listing: visibility filters and substring search, newest first
//! - Downloads: checksum-verified payloads for the current or any
//!   historical version
//! - Deletion: best-effort blob removal, authoritative catalog removal
//! - Collaborator and visibility management, plus the administrator surface
//!
//! Mutations are serialized per document through the catalog's optimistic
//! revision check, retried on conflict.

pub mod config;
pub mod error;
pub mod request;
pub mod service;
pub mod view;

pub use config::ServiceConfig;
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use request::{parse_tags, ListFilter, ListQuery, UploadRequest};
pub use service::DocumentService;
pub use view::{DocumentView, DownloadPayload, VersionView};
