use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => anyhow::bail!("unknown role {other:?}"),
        }
    }
}

/// Raw `users` row.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: String,
    pub token_version: i32,
    pub reset_token: Option<String>,
    pub reset_expires: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// User record. Never serialized directly; clients get [`crate::dto::PublicUser`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String, // Argon2 PHC string
    pub role: Role,
    pub token_version: i32, // must match the `ver` claim of a live token
    pub reset_token: Option<String>,
    pub reset_expires: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True when `token` is the outstanding reset token and it has not expired at `now`.
    pub fn reset_token_matches(&self, token: &str, now: OffsetDateTime) -> bool {
        match (self.reset_token.as_deref(), self.reset_expires) {
            (Some(stored), Some(expires)) => !token.is_empty() && stored == token && now < expires,
            _ => false,
        }
    }
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            name: r.name,
            email: r.email,
            phone: r.phone,
            password_hash: r.password_hash,
            role: r.role.parse()?,
            token_version: r.token_version,
            reset_token: r.reset_token,
            reset_expires: r.reset_expires,
            created_at: r.created_at,
        })
    }
}

/// Fields supplied on registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

impl NewUser {
    pub fn new(name: &str, email: &str, phone: &str, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: email.to_string(),
            phone: phone.trim().to_string(),
            password_hash,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn into_user(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            password_hash: self.password_hash,
            role: Role::User,
            token_version: 0,
            reset_token: None,
            reset_expires: None,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn user_with_reset(token: Option<&str>, expires: Option<OffsetDateTime>) -> User {
        let mut user = NewUser::new("Asha", "asha@example.com", "", "hash".into()).into_user();
        user.reset_token = token.map(str::to_string);
        user.reset_expires = expires;
        user
    }

    #[test]
    fn role_parses_and_displays() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
    }

    #[test]
    fn row_with_unknown_role_is_rejected() {
        let row = UserRow {
            id: Uuid::new_v4(),
            name: String::new(),
            email: "x@example.com".into(),
            phone: String::new(),
            password_hash: "h".into(),
            role: "superuser".into(),
            token_version: 0,
            reset_token: None,
            reset_expires: None,
            created_at: OffsetDateTime::now_utc(),
        };
        assert!(User::try_from(row).is_err());
    }

    #[test]
    fn reset_token_must_match_and_be_unexpired() {
        let now = OffsetDateTime::now_utc();
        let live = user_with_reset(Some("abc"), Some(now + Duration::minutes(5)));
        assert!(live.reset_token_matches("abc", now));
        assert!(!live.reset_token_matches("abd", now));
        assert!(!live.reset_token_matches("", now));

        let expired = user_with_reset(Some("abc"), Some(now - Duration::seconds(1)));
        assert!(!expired.reset_token_matches("abc", now));

        let none = user_with_reset(None, None);
        assert!(!none.reset_token_matches("abc", now));
    }

    #[test]
    fn new_user_trims_profile_fields() {
        let user = NewUser::new("  Asha ", "asha@example.com", " 98765 ", "h".into()).into_user();
        assert_eq!(user.name, "Asha");
        assert_eq!(user.phone, "98765");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.token_version, 0);
    }
}
