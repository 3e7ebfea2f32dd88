use thiserror::Error;

use ecowiser_core::UserId;

use crate::{Capability, Role, UserProfile};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not signed in")]
    Anonymous,

    #[error("forbidden: role '{role}' lacks '{capability}'")]
    Forbidden { role: Role, capability: Capability },
}

/// Check a capability against the cached profile.
///
/// - No IO
/// - An absent profile is treated as anonymous
pub fn authorize(user: Option<&UserProfile>, capability: Capability) -> Result<(), AuthzError> {
    let user = user.ok_or(AuthzError::Anonymous)?;
    if user.role.can(capability) {
        Ok(())
    } else {
        tracing::debug!(role = %user.role, %capability, "capability denied");
        Err(AuthzError::Forbidden {
            role: user.role,
            capability,
        })
    }
}

/// Whether `actor` may change the role of, or remove, a member holding `target`.
///
/// Owners manage everyone; Admins manage everyone except Owners.
pub fn can_manage_member(actor: Role, target: Role) -> bool {
    match actor {
        Role::Owner => true,
        Role::Admin => target != Role::Owner,
        Role::Member => false,
    }
}

/// Whether `user` may delete a resource uploaded by `uploader`.
///
/// Uploaders can always remove their own files.
pub fn can_delete_upload(user: Option<&UserProfile>, uploader: Option<UserId>) -> bool {
    let Some(user) = user else {
        return false;
    };
    user.role.can(Capability::DeleteResource) || uploader == Some(user.id)
}

/// Roles `actor` may hand out when inviting or promoting members.
pub fn assignable_roles(actor: Role) -> Vec<Role> {
    match actor {
        Role::Owner => Role::ALL.to_vec(),
        Role::Admin => vec![Role::Member, Role::Admin],
        Role::Member => Vec::new(),
    }
}
