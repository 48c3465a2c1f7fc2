use std::env;
use std::str::FromStr;

use crate::auth::password::MIN_PRODUCTION_COST;
use crate::error::AppError;
use crate::services::PastDuePolicy;

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string. Without one the in-memory store is used.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub bcrypt_cost: u32,
    pub past_due_policy: PastDuePolicy,
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::internal(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| AppError::internal("JWT_SECRET must be set"))?;

        let bcrypt_cost = parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(MIN_PRODUCTION_COST..=31).contains(&bcrypt_cost) {
            return Err(AppError::internal(format!(
                "BCRYPT_COST must be between {} and 31",
                MIN_PRODUCTION_COST
            )));
        }

        let token_ttl_minutes = parse_var("TOKEN_TTL_MINUTES", 120)?;
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&token_ttl_minutes) {
            return Err(AppError::internal(format!(
                "TOKEN_TTL_MINUTES must be between 1 and {}",
                MAX_TOKEN_TTL_MINUTES
            )));
        }

        let past_due_policy = match env::var("PAST_DUE_POLICY") {
            Ok(raw) => raw.parse::<PastDuePolicy>().map_err(AppError::internal)?,
            Err(_) => PastDuePolicy::default(),
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout_secs: parse_var("DB_ACQUIRE_TIMEOUT_SECS", 5)?,
            server_port: parse_var("SERVER_PORT", 8080)?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            jwt_secret,
            token_ttl_minutes,
            bcrypt_cost,
            past_due_policy,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
