use core::str::FromStr;

use serde::{Deserialize, Serialize};

use ecowiser_core::CoreError;

/// Tenant-scoped role of a user.
///
/// Ordered by privilege: `Member < Admin < Owner`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Member,
    Admin,
    Owner,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Member, Role::Admin, Role::Owner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "Member",
            Role::Admin => "Admin",
            Role::Owner => "Owner",
        }
    }

    /// Admin or Owner.
    pub fn is_privileged(&self) -> bool {
        *self >= Role::Admin
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "member" => Ok(Role::Member),
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            other => Err(CoreError::validation(format!(
                "unknown role '{other}' (expected Member, Admin or Owner)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_are_capitalised() {
        assert_eq!(serde_json::to_string(&Role::Owner).unwrap(), "\"Owner\"");
        let role: Role = serde_json::from_str("\"Admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("owner".parse::<Role>().unwrap(), Role::Owner);
        assert_eq!(" MEMBER ".parse::<Role>().unwrap(), Role::Member);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn privilege_ordering() {
        assert!(Role::Owner > Role::Admin && Role::Admin > Role::Member);
        assert!(!Role::Member.is_privileged());
        assert!(Role::Admin.is_privileged());
    }
}
