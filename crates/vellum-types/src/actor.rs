use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// The authenticated identity performing an operation.
///
/// Actors arrive fully resolved from the authentication boundary; the core
/// never parses credentials or tokens. The `is_admin` flag unlocks the
/// administrator surface (cross-user listing, privacy toggle, force-delete).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
}

impl Actor {
    /// A regular, non-administrator actor.
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            is_admin: false,
        }
    }

    /// An actor carrying the administrator flag.
    pub fn admin(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            is_admin: true,
        }
    }
}
