//! Access control evaluation for Vellum.
//!
//! A single pure function, [`decide`], maps an (actor, document, operation)
//! triple to an allow/deny outcome. The evaluator never mutates state and
//! never touches a store; the document service calls it before any store
//! access on every operation that exposes or changes a document.
//!
//! Rules:
//!
//! - `Read`: public documents, or the owner, or a collaborator.
//! - `Write` (covers delete): the owner or a collaborator. Collaborators
//!   may delete; this is a deliberate, documented permission.
//! - `Manage` (collaborator changes, title/visibility metadata): the owner
//!   only.
//! - `Administer` (cross-user listing, privacy toggle, force-delete):
//!   administrators only.
//!
//! Administrators are allowed every operation; the flag bypasses the
//! owner/collaborator checks entirely.

use std::fmt;

use serde::{Deserialize, Serialize};
use vellum_types::{Actor, DocumentRecord};

/// The kind of access an operation needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// View metadata, list versions, download payloads.
    Read,
    /// Upload a new version or delete the document.
    Write,
    /// Owner-only subset of write: collaborators, title, visibility.
    Manage,
    /// Administrator surface.
    Administer,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Manage => write!(f, "manage"),
            Self::Administer => write!(f, "administer"),
        }
    }
}

/// The outcome of an access decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny { reason: String },
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    fn deny(operation: Operation, document: &DocumentRecord) -> Self {
        Self::Deny {
            reason: format!(
                "{operation} access to document {} denied",
                document.id.short_id()
            ),
        }
    }
}

/// Decide whether `actor` may perform `operation` on `document`.
pub fn decide(actor: &Actor, document: &DocumentRecord, operation: Operation) -> Access {
    if actor.is_admin {
        return Access::Allow;
    }

    let allowed = match operation {
        Operation::Read => {
            document.visibility.is_public()
                || document.is_owner(&actor.id)
                || document.is_collaborator(&actor.id)
        }
        Operation::Write => document.is_owner(&actor.id) || document.is_collaborator(&actor.id),
        Operation::Manage => document.is_owner(&actor.id),
        Operation::Administer => false,
    };

    if allowed {
        Access::Allow
    } else {
        Access::deny(operation, document)
    }
}
