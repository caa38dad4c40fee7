use chrono::{DateTime, Utc};
use serde::Serialize;
use vellum_types::{DocumentId, Visibility};

/// One ledger entry as exposed to callers: user references resolved to
/// display names, storage keys omitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VersionView {
    pub version: u32,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: String,
    pub note: String,
}

/// A document as exposed to callers.
///
/// Size and media type describe the current version; `versions` lists the
/// full history, newest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DocumentView {
    pub id: DocumentId,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub owner: String,
    pub visibility: Visibility,
    pub size: u64,
    pub media_type: String,
    pub current_version: u32,
    pub collaborators: Vec<String>,
    pub updated_at: DateTime<Utc>,
    pub versions: Vec<VersionView>,
}

/// Raw bytes plus the hints a caller needs to save them.
///
/// `filename` distinguishes a historical version from the current one
/// (`report_v2.pdf` vs `report.pdf`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadPayload {
    pub filename: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}
