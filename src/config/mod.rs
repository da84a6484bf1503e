//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing.
//! The database URL is wrapped in secrecy::SecretString to prevent log leaks.

pub mod secrets;

use crate::error::{Error, Result};
use crate::model::UserId;
use secrecy::SecretString;

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
    /// User the CLI acts as when `--as-user` is not given.
    pub session_user: Option<UserId>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            session_user: optional_id("TRACKER_USER_ID")?,
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}

fn optional_id(name: &str) -> Result<Option<UserId>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<i32>()
            .map(|id| Some(UserId(id)))
            .map_err(|_| Error::Config(format!("{name} must be an integer user id, got '{raw}'"))),
        Err(_) => Ok(None),
    }
}
