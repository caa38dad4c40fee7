use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// A registered user as stored in the catalog.
///
/// Credential material (password hashes, tokens) lives with the external
/// authentication service and is never part of this record. Users are
/// created at registration and never deleted in normal operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::generate(),
            username: username.into(),
            email: email.into(),
            created_at: Utc::now(),
        }
    }
}
