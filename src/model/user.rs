//! Account records.

use serde::{Deserialize, Serialize};

/// Payload for `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response from `POST /auth/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub role: Option<String>,

    /// Some deployments send a role list instead of a single role.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl LoginResponse {
    /// The single role, falling back to the first entry of `roles`.
    pub fn effective_role(&self) -> Option<&str> {
        self.role
            .as_deref()
            .or_else(|| self.roles.first().map(String::as_str))
    }
}

/// Payload for `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Response from `GET /auth/me`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,

    #[serde(default)]
    pub profile_image_url: Option<String>,
}

impl UserProfile {
    pub fn effective_role(&self) -> &str {
        self.role
            .as_deref()
            .or_else(|| self.roles.first().map(String::as_str))
            .unwrap_or("")
    }

    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("User")
    }

    /// Uppercased first letter of the display name, shown in place of a
    /// missing profile image.
    pub fn initial(&self) -> String {
        self.display_name()
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_falls_back_to_roles_list() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"token": "t", "roles": ["ROLE_ADMIN", "ROLE_USER"]}"#).unwrap();
        assert_eq!(response.effective_role(), Some("ROLE_ADMIN"));

        let profile: UserProfile = serde_json::from_str(r#"{"username": "anna"}"#).unwrap();
        assert_eq!(profile.effective_role(), "");
    }

    #[test]
    fn test_initial() {
        let profile = UserProfile {
            username: Some("élodie".to_string()),
            ..Default::default()
        };
        assert_eq!(profile.initial(), "É");
        assert_eq!(UserProfile::default().initial(), "U");
    }
}
