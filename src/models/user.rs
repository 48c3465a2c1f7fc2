use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A registered account as stored by the user directory.
///
/// `password_hash` always holds a bcrypt hash, never plaintext.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker. Deleted users are invisible to every lookup.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A user that has not been persisted yet. The directory assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Payload for changing a user's name and email. Passwords are not rotated here.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 1, max = 100),
        regex(
            path = "crate::auth::NAME_REGEX",
            message = "Name must not start or end with whitespace"
        )
    )]
    pub name: String,
    #[validate(email)]
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_update_user_request_validation() {
        let input = UpdateUserRequest {
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
        };
        assert!(input.validate().is_ok());

        let input = UpdateUserRequest {
            name: "Ann".to_string(),
            email: "invalid-email".to_string(),
        };
        assert!(input.validate().is_err());

        let input = UpdateUserRequest {
            name: "".to_string(),
            email: "ann@example.com".to_string(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_profile_omits_password_hash() {
        let now = Utc::now();
        let user = User {
            id: 1,
            name: "Ann".into(),
            email: "ann@x.com".into(),
            password_hash: "$2b$04$hash".into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let json = serde_json::to_value(UserProfile::from(user)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "ann@x.com");
    }
}
