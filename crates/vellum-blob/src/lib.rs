//! Blob storage for Vellum.
//!
//! One durable payload per document version, keyed by a generated
//! [`BlobKey`](vellum_types::BlobKey) that is independent of the original
//! filename. This crate provides:
//!
//! - The [`BlobStore`] trait boundary
//! - [`InMemoryBlobStore`] for tests and embedding
//! - [`FsBlobStore`] — a flat payload directory with write-then-rename
//!
//! The store never interprets payload contents; integrity checksums live on
//! the catalog's ledger entries and are verified by the service.

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{BlobError, BlobResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use traits::BlobStore;
