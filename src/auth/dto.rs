use serde::{Deserialize, Serialize};

use crate::auth::repo::User;

/// Request body for account creation. Missing fields deserialize to empty
/// strings so they fail validation with 400 rather than a body-rejection.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Public view of a user. Exactly `{email, name}`; the password hash and the
/// account flags stay internal.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_empty() {
        let req: TokenRequest = serde_json::from_str(r#"{"email": "a@b.com"}"#).unwrap();
        assert_eq!(req.email, "a@b.com");
        assert!(req.password.is_empty());
    }

    #[test]
    fn user_response_is_exactly_email_and_name() {
        let out = UserResponse {
            email: "test@example.com".into(),
            name: "Test".into(),
        };
        let value: serde_json::Value = serde_json::to_value(&out).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["email"], "test@example.com");
        assert_eq!(obj["name"], "Test");
    }
}
