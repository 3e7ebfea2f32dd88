use serde::{Deserialize, Serialize};

use crate::Role;

/// An action the dashboard may offer to the signed-in user.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewProjects,
    CreateProject,
    EditProject,
    UploadResource,
    DeleteResource,
    ChangeVisibility,
    ManageMembers,
    ManageTenant,
    ViewBilling,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewProjects => "view_projects",
            Capability::CreateProject => "create_project",
            Capability::EditProject => "edit_project",
            Capability::UploadResource => "upload_resource",
            Capability::DeleteResource => "delete_resource",
            Capability::ChangeVisibility => "change_visibility",
            Capability::ManageMembers => "manage_members",
            Capability::ManageTenant => "manage_tenant",
            Capability::ViewBilling => "view_billing",
        }
    }

    /// Lowest role that is offered this capability.
    pub fn minimum_role(&self) -> Role {
        match self {
            Capability::ViewProjects | Capability::UploadResource => Role::Member,
            Capability::CreateProject
            | Capability::EditProject
            | Capability::DeleteResource
            | Capability::ChangeVisibility
            | Capability::ManageMembers
            | Capability::ViewBilling => Role::Admin,
            Capability::ManageTenant => Role::Owner,
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Role {
    pub fn can(&self, capability: Capability) -> bool {
        *self >= capability.minimum_role()
    }
}
