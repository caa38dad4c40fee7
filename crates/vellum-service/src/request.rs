use std::str::FromStr;

use vellum_types::{normalize_tags, Visibility};

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};

/// Everything the boundary collects for one upload.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub visibility: Visibility,
    /// Filename as supplied by the client.
    pub original_filename: String,
    /// Declared media type; the core does not sniff payloads.
    pub media_type: String,
    pub bytes: Vec<u8>,
    pub change_note: Option<String>,
}

impl UploadRequest {
    /// Check preconditions before anything is written.
    pub(crate) fn validate(&self, config: &ServiceConfig) -> ServiceResult<()> {
        if self.title.trim().is_empty() {
            return Err(ServiceError::InvalidInput("title must not be empty".into()));
        }
        if self.original_filename.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "filename must not be empty".into(),
            ));
        }
        if self.bytes.is_empty() {
            return Err(ServiceError::InvalidInput(
                "payload must not be empty".into(),
            ));
        }
        let size = self.bytes.len() as u64;
        if size > config.max_payload_bytes {
            return Err(ServiceError::PayloadTooLarge {
                size,
                limit: config.max_payload_bytes,
            });
        }
        Ok(())
    }
}

/// Parse the boundary's comma-separated tag string into a normalized set.
pub fn parse_tags(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(',').map(str::to_string).collect())
}

/// Which slice of the catalog a listing exposes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListFilter {
    /// Public, owned, or shared-with documents.
    #[default]
    All,
    /// Public documents regardless of owner.
    Public,
    /// Private documents the actor owns or collaborates on.
    Private,
    /// Documents the actor owns.
    Mine,
    /// Documents shared with the actor as a collaborator.
    Shared,
}

impl FromStr for ListFilter {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(Self::All),
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            // "my-documents" is the legacy spelling some clients still send.
            "mine" | "my-documents" => Ok(Self::Mine),
            "shared" => Ok(Self::Shared),
            other => Err(ServiceError::InvalidInput(format!(
                "unknown filter \"{other}\""
            ))),
        }
    }
}

/// Query parameters for a listing.
#[derive(Clone, Debug, Default)]
pub struct ListQuery {
    /// Case-insensitive substring over title, description, and tags.
    pub search: Option<String>,
    pub filter: ListFilter,
}

impl ListQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filtered(filter: ListFilter) -> Self {
        Self {
            search: None,
            filter,
        }
    }

    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            filter: ListFilter::All,
        }
    }
}
