pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

// Re-export necessary items
pub use extractors::AuthenticatedUserId;
pub use middleware::{AuthMiddleware, TOKEN_COOKIE};
pub use password::CredentialService;
pub use token::{Claims, TokenError, TokenService};

lazy_static! {
    // Display names: no leading or trailing whitespace, no control characters
    pub(crate) static ref NAME_REGEX: regex::Regex =
        regex::Regex::new(r"^[^\s\p{Cc}](?:[^\p{Cc}]*[^\s\p{Cc}])?$").unwrap();
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// User's email address.
    #[validate(email)]
    pub email: String,
    /// User's password. Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name, 1 to 100 characters without surrounding whitespace.
    #[validate(
        length(min = 1, max = 100),
        regex(path = "NAME_REGEX", message = "Name must not start or end with whitespace")
    )]
    pub name: String,
    /// Email address for the new account.
    #[validate(email)]
    pub email: String,
    /// Password for the new account. Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Response structure after a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The JWT to present as a bearer credential.
    pub token: String,
    /// The unique identifier of the authenticated user.
    pub user_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_login_request_validation() {
        let valid_login = LoginRequest {
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid_login.validate().is_ok());

        let invalid_email_login = LoginRequest {
            email: "testexample.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(invalid_email_login.validate().is_err());

        let short_password_login = LoginRequest {
            email: "test@example.com".to_string(),
            password: "123".to_string(),
        };
        assert!(short_password_login.validate().is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let valid_register = RegisterRequest {
            name: "Ann Smith".to_string(),
            email: "ann@example.com".to_string(),
            password: "secret1".to_string(),
        };
        assert!(valid_register.validate().is_ok());

        let padded_name = RegisterRequest {
            name: " Ann".to_string(),
            email: "ann@example.com".to_string(),
            password: "secret1".to_string(),
        };
        assert!(padded_name.validate().is_err());

        let empty_name = RegisterRequest {
            name: "".to_string(),
            email: "ann@example.com".to_string(),
            password: "secret1".to_string(),
        };
        assert!(empty_name.validate().is_err());

        let short_password = RegisterRequest {
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            password: "12345".to_string(),
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_single_character_name_is_accepted() {
        assert!(NAME_REGEX.is_match("A"));
        assert!(!NAME_REGEX.is_match("Ann\n"));
    }
}
