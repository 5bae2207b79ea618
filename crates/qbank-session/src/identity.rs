//! Identity and role wire types.

use serde::{Deserialize, Serialize};

/// User role, as serialized by the remote API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
    Parent,
}

/// The resolved user profile, fetched from `/api/v1/auth/me` after
/// authentication.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format_is_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Teacher).unwrap(), "\"teacher\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_identity_decodes_without_optional_fields() {
        let identity: Identity = serde_json::from_value(serde_json::json!({
            "id": 7,
            "username": "alice",
            "role": "teacher",
            "is_active": true,
            "is_verified": false,
            "created_at": "2025-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.role, Role::Teacher);
        assert!(identity.email.is_none());
    }
}
