//! User, role and credential types.

use serde::{Deserialize, Serialize};

/// Role granting full access to every storage.
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// Role allowing storage management for non-owners.
pub const ROLE_STORAGE_MANAGER: &str = "ROLE_STORAGE_MANAGER";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub name: String,
}

/// The signed-in user as returned by the `whoami` endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(default)]
    pub id: u64,
    pub user_name: String,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl CurrentUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.name == role)
    }

    pub fn is_admin(&self) -> bool {
        self.admin || self.has_role(ROLE_ADMIN)
    }
}

/// API access token issued for CLI use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub token: String,
    #[serde(default)]
    pub expiration: Option<String>,
}

/// Credentials for the platform's git server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCredentials {
    pub url: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Options of a users CSV import.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    pub create_user: bool,
    pub create_group: bool,
    pub create_metadata: bool,
}

/// Columns included in a users CSV export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    pub include_id: bool,
    pub include_user_name: bool,
    pub include_groups: bool,
    pub include_roles: bool,
    pub include_attributes: bool,
    pub include_header: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_id: false,
            include_user_name: true,
            include_groups: true,
            include_roles: false,
            include_attributes: true,
            include_header: true,
        }
    }
}

/// Outcome of one import step reported by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportEvent {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_by_flag_or_role() {
        let mut user = CurrentUser {
            user_name: "alice".into(),
            ..Default::default()
        };
        assert!(!user.is_admin());
        user.roles.push(Role {
            name: ROLE_ADMIN.into(),
        });
        assert!(user.is_admin());
    }

    #[test]
    fn test_user_decoding() {
        let json = r#"{"id": 3, "userName": "BOB", "roles": [{"name": "ROLE_USER"}]}"#;
        let user: CurrentUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.user_name, "BOB");
        assert!(user.has_role("ROLE_USER"));
        assert!(!user.admin);
    }
}
