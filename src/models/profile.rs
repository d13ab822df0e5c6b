//! Account payloads: current-user profile and auth request bodies.

use serde::{Deserialize, Serialize};

/// Authenticated user as returned by `/api/current_user`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    #[serde(alias = "_id")]
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    pub genres: Vec<String>,
}

impl Profile {
    /// Name, or email when the account has no name.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

/// Body of `POST /api/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /api/signup`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub genres: Vec<String>,
}

/// Response of `POST /api/login`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_from_mongo_shape() {
        let profile: Profile = serde_json::from_value(json!({
            "_id": "65a1f0",
            "name": "Ada",
            "email": "ada@example.com",
            "genres": ["Drama"],
            "signin_date": "2024-01-01T00:00:00"
        }))
        .unwrap();
        assert_eq!(profile.id.as_deref(), Some("65a1f0"));
        assert_eq!(profile.display_name(), "Ada");
        assert_eq!(profile.genres, vec!["Drama".to_string()]);
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let profile = Profile {
            email: "x@y.z".to_string(),
            ..Default::default()
        };
        assert_eq!(profile.display_name(), "x@y.z");
    }

    #[test]
    fn test_signup_body_shape() {
        let body = serde_json::to_value(SignupRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "pw".into(),
            genres: vec!["Comedy".into()],
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"name": "Ada", "email": "ada@example.com", "password": "pw", "genres": ["Comedy"]})
        );
    }
}
