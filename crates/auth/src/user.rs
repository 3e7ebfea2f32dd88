//! Cached user profile as returned by the `users/self` endpoint.
//!
//! The profile is a snapshot. It can be stale relative to the server and
//! must never be used as proof of authentication.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use ecowiser_core::{TenantId, UserId};

use crate::Role;

/// Profile of the signed-in user.
///
/// Fields the client does not model are kept in `extra` so that writing the
/// cache back does not lose anything the server sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    /// Missing roles are treated as `Member`.
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub tenant: Option<TenantRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The tenant a user belongs to, either as a bare id or an embedded record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TenantRef {
    Id(TenantId),
    Record(TenantSummary),
}

/// Minimal embedded tenant record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantSummary {
    pub id: TenantId,
    #[serde(default)]
    pub name: Option<String>,
}

impl TenantRef {
    pub fn id(&self) -> TenantId {
        match self {
            TenantRef::Id(id) => *id,
            TenantRef::Record(summary) => summary.id,
        }
    }
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant.as_ref().map(TenantRef::id)
    }

    pub fn has_tenant(&self) -> bool {
        self.tenant.is_some()
    }
}
