use crate::error::AppError;
use bcrypt::{hash, verify};

/// Lowest bcrypt cost accepted from configuration.
pub const MIN_PRODUCTION_COST: u32 = 10;

/// Salted one-way password hashing backed by bcrypt.
///
/// The hashing work is CPU bound, so both operations run on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct CredentialService {
    cost: u32,
    // Verified against when a login names an unknown email, so that both login
    // failure paths perform the same amount of work.
    dummy_hash: String,
}

impl CredentialService {
    pub fn new(cost: u32) -> Result<Self, AppError> {
        let dummy_hash = hash("taskkeeper-timing-equalizer", cost)
            .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))?;
        Ok(Self { cost, dummy_hash })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hashes `password` with a fresh random salt.
    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || hash(password, cost))
            .await
            .map_err(|e| AppError::internal(format!("Hashing task failed: {}", e)))?
            .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))
    }

    /// Returns `false` for any mismatch, including a malformed stored hash.
    pub async fn verify(&self, password: &str, hashed_password: &str) -> bool {
        let password = password.to_owned();
        let hashed_password = hashed_password.to_owned();
        match tokio::task::spawn_blocking(move || verify(password, &hashed_password)).await {
            Ok(Ok(matches)) => matches,
            Ok(Err(e)) => {
                log::warn!("Stored password hash could not be parsed: {}", e);
                false
            }
            Err(e) => {
                log::error!("Password verification task failed: {}", e);
                false
            }
        }
    }

    /// Burns one verification against a throwaway hash. The result is always `false`.
    pub async fn verify_dummy(&self, password: &str) -> bool {
        let dummy = self.dummy_hash.clone();
        let _ = self.verify(password, &dummy).await;
        false
    }
}
