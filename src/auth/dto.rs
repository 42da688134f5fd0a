use serde::{Deserialize, Serialize};

use crate::dto::PublicUser;

/// Request body for user registration. Missing keys deserialize as empty.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after register or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequestResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub token: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_password_request_uses_camel_case() {
        let req: ResetPasswordRequest = serde_json::from_str(
            r#"{"email":"a@example.com","token":"t","newPassword":"pw123456"}"#,
        )
        .unwrap();
        assert_eq!(req.new_password, "pw123456");
    }

    #[test]
    fn missing_keys_become_empty() {
        let req: RegisterRequest = serde_json::from_str(r#"{"email":"a@example.com"}"#).unwrap();
        assert!(req.password.is_empty());
        assert!(req.name.is_empty());
    }

    #[test]
    fn reset_link_is_omitted_when_absent() {
        let res = ResetRequestResponse {
            success: true,
            message: "ok".into(),
            reset_link: None,
        };
        let json = serde_json::to_string(&res).unwrap();
        assert!(!json.contains("resetLink"));
    }
}
