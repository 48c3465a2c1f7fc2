use std::sync::Arc;

use crate::auth::{AuthResponse, CredentialService, TokenService};
use crate::error::AppError;
use crate::models::{NewUser, UserProfile};
use crate::store::{StoreError, UserRepository};

/// Registration, login and self-service account management.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    credentials: CredentialService,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        credentials: CredentialService,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            users,
            credentials,
            tokens,
        }
    }

    /// Creates an account. No token is issued; the caller logs in separately.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, AppError> {
        if self.users.find_by_email(email).await?.is_some() {
            log::warn!("Registration rejected, email already exists: {}", email);
            return Err(AppError::EmailAlreadyRegistered);
        }

        let password_hash = self.credentials.hash(password).await?;

        let user = self
            .users
            .save(NewUser {
                name: name.to_owned(),
                email: email.to_owned(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration
                StoreError::UniqueViolation(_) => AppError::EmailAlreadyRegistered,
                other => other.into(),
            })?;

        log::info!("User created: {} ({})", user.id, user.email);
        Ok(user.into())
    }

    /// Verifies the credentials and issues a bearer token.
    ///
    /// An unknown email and a wrong password both yield `InvalidCredentials`, after
    /// the same amount of hashing work.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = match self.users.find_by_email(email).await {
            Ok(user) => user,
            Err(e) => {
                log::error!("Storage error during login: {}", e);
                return Err(e.into());
            }
        };

        let user = match user {
            Some(user) => user,
            None => {
                self.credentials.verify_dummy(password).await;
                log::warn!("Login failed: invalid credentials");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !self.credentials.verify(password, &user.password_hash).await {
            log::warn!("Login failed: invalid credentials");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id).map_err(|e| {
            log::error!("Token generation failed for user {}: {}", user.id, e);
            e
        })?;

        log::info!("User logged in: {}", user.id);
        Ok(AuthResponse {
            token,
            user_id: user.id,
        })
    }

    pub async fn profile(&self, user_id: i32) -> Result<UserProfile, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(UserProfile::from)
            .ok_or(AppError::UserNotFound)
    }

    /// Changes name and email. The password hash is untouched.
    pub async fn update_user(
        &self,
        user_id: i32,
        name: &str,
        email: &str,
    ) -> Result<UserProfile, AppError> {
        let mut user = match self.users.find_by_id(user_id).await? {
            Some(user) => user,
            None => {
                log::warn!("Update failed: user {} not found", user_id);
                return Err(AppError::UserNotFound);
            }
        };

        if user.email != email {
            if let Some(holder) = self.users.find_by_email(email).await? {
                if holder.id != user_id {
                    log::warn!("Update failed: email already registered: {}", email);
                    return Err(AppError::EmailAlreadyRegistered);
                }
            }
        }

        user.name = name.to_owned();
        user.email = email.to_owned();

        self.users.update(&user).await.map_err(|e| match e {
            StoreError::UniqueViolation(_) => AppError::EmailAlreadyRegistered,
            other => other.into(),
        })?;

        log::info!("User updated: {}", user_id);
        Ok(user.into())
    }

    /// Soft-deletes the account. The user's tasks are left in place.
    pub async fn delete_user(&self, user_id: i32) -> Result<(), AppError> {
        if self.users.find_by_id(user_id).await?.is_none() {
            log::warn!("Delete failed: user {} not found", user_id);
            return Err(AppError::UserNotFound);
        }

        self.users.delete(user_id).await?;
        log::info!("User deleted: {}", user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryUserRepository;
    use async_trait::async_trait;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    use crate::models::User;

    fn service_with(users: Arc<dyn UserRepository>) -> (AuthService, Arc<TokenService>) {
        let tokens = Arc::new(TokenService::new("unit-test-secret", Duration::hours(2)));
        let service = AuthService::new(users, CredentialService::new(4).unwrap(), tokens.clone());
        (service, tokens)
    }

    fn service() -> (AuthService, Arc<TokenService>) {
        service_with(Arc::new(MemoryUserRepository::new()))
    }

    #[test_log::test(actix_rt::test)]
    async fn test_register_then_login() {
        let (auth, tokens) = service();
        let profile = auth.register("Ann", "ann@x.com", "secret1").await.unwrap();
        assert_eq!(profile.name, "Ann");

        let session = auth.login("ann@x.com", "secret1").await.unwrap();
        assert_eq!(session.user_id, profile.id);
        assert_eq!(tokens.verify(&session.token), Ok(profile.id));
    }

    #[actix_rt::test]
    async fn test_duplicate_email_is_rejected_regardless_of_other_fields() {
        let (auth, _) = service();
        auth.register("Ann", "ann@x.com", "secret1").await.unwrap();

        let err = auth
            .register("Somebody Else", "ann@x.com", "different-password")
            .await
            .unwrap_err();
        assert_eq!(err, AppError::EmailAlreadyRegistered);
    }

    #[actix_rt::test]
    async fn test_login_failures_are_indistinguishable() {
        let (auth, _) = service();
        auth.register("Ann", "ann@x.com", "secret1").await.unwrap();

        let wrong_password = auth.login("ann@x.com", "wrong-password").await.unwrap_err();
        let unknown_email = auth.login("nobody@x.com", "secret1").await.unwrap_err();

        assert_eq!(wrong_password, AppError::InvalidCredentials);
        assert_eq!(wrong_password, unknown_email);
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[actix_rt::test]
    async fn test_stored_password_is_hashed() {
        let users = Arc::new(MemoryUserRepository::new());
        let (auth, _) = service_with(users.clone());
        auth.register("Ann", "ann@x.com", "secret1").await.unwrap();

        let stored = users.find_by_email("ann@x.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "secret1");
        assert!(stored.password_hash.starts_with("$2"));
    }

    #[actix_rt::test]
    async fn test_update_user() {
        let (auth, _) = service();
        let ann = auth.register("Ann", "ann@x.com", "secret1").await.unwrap();
        let bob = auth.register("Bob", "bob@x.com", "secret2").await.unwrap();

        let updated = auth.update_user(ann.id, "Ann B", "ann.b@x.com").await.unwrap();
        assert_eq!(updated.name, "Ann B");
        assert_eq!(updated.email, "ann.b@x.com");

        // Keeping one's own email is not a conflict
        assert!(auth.update_user(ann.id, "Ann C", "ann.b@x.com").await.is_ok());

        let err = auth.update_user(ann.id, "Ann", "bob@x.com").await.unwrap_err();
        assert_eq!(err, AppError::EmailAlreadyRegistered);

        let err = auth.update_user(9999, "Ghost", "ghost@x.com").await.unwrap_err();
        assert_eq!(err, AppError::UserNotFound);

        // Password still works after an update
        assert!(auth.login("ann.b@x.com", "secret1").await.is_ok());
        assert_eq!(auth.profile(bob.id).await.unwrap().email, "bob@x.com");
    }

    #[actix_rt::test]
    async fn test_delete_user() {
        let (auth, _) = service();
        let ann = auth.register("Ann", "ann@x.com", "secret1").await.unwrap();

        auth.delete_user(ann.id).await.unwrap();

        assert_eq!(auth.profile(ann.id).await.unwrap_err(), AppError::UserNotFound);
        assert_eq!(auth.delete_user(ann.id).await.unwrap_err(), AppError::UserNotFound);
        assert_eq!(
            auth.login("ann@x.com", "secret1").await.unwrap_err(),
            AppError::InvalidCredentials
        );
        // The email is free again
        assert!(auth.register("Ann", "ann@x.com", "secret1").await.is_ok());
    }

    struct BrokenDirectory;

    #[async_trait]
    impl UserRepository for BrokenDirectory {
        async fn save(&self, _: NewUser) -> Result<User, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn find_by_email(&self, _: &str) -> Result<Option<User>, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn find_by_id(&self, _: i32) -> Result<Option<User>, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn update(&self, _: &User) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn delete(&self, _: i32) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
    }

    #[actix_rt::test]
    async fn test_storage_failures_are_internal_errors() {
        let (auth, _) = service_with(Arc::new(BrokenDirectory));

        let err = auth.login("ann@x.com", "secret1").await.unwrap_err();
        assert!(matches!(err, AppError::InternalError(_)));
        assert_eq!(err.public_message(), "Internal server error");

        let err = auth.register("Ann", "ann@x.com", "secret1").await.unwrap_err();
        assert!(matches!(err, AppError::InternalError(_)));
    }

    struct RacingDirectory;

    #[async_trait]
    impl UserRepository for RacingDirectory {
        async fn save(&self, _: NewUser) -> Result<User, StoreError> {
            Err(StoreError::UniqueViolation("users_email_key".into()))
        }
        async fn find_by_email(&self, _: &str) -> Result<Option<User>, StoreError> {
            Ok(None)
        }
        async fn find_by_id(&self, _: i32) -> Result<Option<User>, StoreError> {
            Ok(None)
        }
        async fn update(&self, _: &User) -> Result<(), StoreError> {
            Ok(())
        }
        async fn delete(&self, _: i32) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[actix_rt::test]
    async fn test_unique_violation_on_save_maps_to_email_conflict() {
        let (auth, _) = service_with(Arc::new(RacingDirectory));
        let err = auth.register("Ann", "ann@x.com", "secret1").await.unwrap_err();
        assert_eq!(err, AppError::EmailAlreadyRegistered);
    }
}
