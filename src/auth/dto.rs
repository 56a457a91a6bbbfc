use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::User;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_email_verified: bool,
    pub token: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_email_verified: bool,
    pub token: String,
}

/// Profile view; never carries the hash or any opaque token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_email_verified: bool,
    pub pending_email: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
}

impl From<&User> for ProfileResponse {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            is_email_verified: u.is_email_verified,
            pending_email: u.pending_email.clone(),
            created_at: u.created_at,
            last_login: u.last_login,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileResponse {
    #[serde(flatten)]
    pub profile: ProfileResponse,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyEmailResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_reads_camel_case() {
        let req: UpdateProfileRequest = serde_json::from_str(
            r#"{"username":"bob","currentPassword":"old123","newPassword":"new123"}"#,
        )
        .unwrap();
        assert_eq!(req.username.as_deref(), Some("bob"));
        assert_eq!(req.current_password.as_deref(), Some("old123"));
        assert_eq!(req.new_password.as_deref(), Some("new123"));
        assert!(req.email.is_none());
    }

    #[test]
    fn profile_serializes_without_secrets() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            is_email_verified: false,
            pending_email: Some("new@x.com".into()),
            email_verification_token: Some("tok".into()),
            email_verification_expires: None,
            password_reset_token: None,
            password_reset_expires: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            last_login: None,
        };
        let json = serde_json::to_value(ProfileResponse::from(&user)).unwrap();
        assert_eq!(json["pendingEmail"], "new@x.com");
        assert_eq!(json["isEmailVerified"], false);
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00Z");
        assert!(json["lastLogin"].is_null());
        let text = json.to_string();
        assert!(!text.contains("argon2"));
        assert!(!text.contains("tok"));
    }
}
