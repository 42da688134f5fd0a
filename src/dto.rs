use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::account::repo_types::{Role, User};

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            phone: u.phone.clone(),
            role: u.role,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::repo_types::NewUser;

    #[test]
    fn public_user_hides_secrets() {
        let mut user = NewUser::new("Asha", "asha@example.com", "98765", "$argon2id$secret".into())
            .into_user();
        user.reset_token = Some("reset-me".into());

        let json = serde_json::to_string(&PublicUser::from(&user)).unwrap();
        assert!(json.contains("asha@example.com"));
        assert!(json.contains("\"role\":\"user\""));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("reset-me"));
        assert!(!json.contains("token_version"));
    }
}
