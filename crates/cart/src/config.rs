//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CART_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `CART_SNAPSHOT_PATH` - Guest cart snapshot location (default: `.lockerroom/cart.json`)

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

/// Default guest cart snapshot location, relative to the working directory.
pub const DEFAULT_SNAPSHOT_PATH: &str = ".lockerroom/cart.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Cart subsystem configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Where the guest cart snapshot is written
    pub snapshot_path: PathBuf,
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("CART_DATABASE_URL")?;
        let snapshot_path =
            PathBuf::from(get_env_or_default("CART_SNAPSHOT_PATH", DEFAULT_SNAPSHOT_PATH));

        Ok(Self {
            database_url,
            snapshot_path,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    // Try primary key first (e.g., CART_DATABASE_URL)
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    // Fallback to generic DATABASE_URL (set by Fly.io postgres attach)
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, unsafe_code)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    // The environment is process-global, so every test owns uniquely named
    // keys and only one test writes DATABASE_URL.

    #[test]
    fn database_url_prefers_the_subsystem_key() {
        unsafe { std::env::set_var("CART_TEST_PRIMARY_DB", "postgres://primary/lockerroom") };

        let url = get_database_url("CART_TEST_PRIMARY_DB").unwrap();
        assert_eq!(url.expose_secret(), "postgres://primary/lockerroom");
    }

    #[test]
    fn database_url_falls_back_to_the_generic_key() {
        unsafe { std::env::set_var("DATABASE_URL", "postgres://generic/lockerroom") };

        let url = get_database_url("CART_TEST_UNSET_PRIMARY_DB").unwrap();
        assert_eq!(url.expose_secret(), "postgres://generic/lockerroom");
    }

    #[test]
    fn missing_variable_error_names_the_key() {
        let err = ConfigError::MissingEnvVar("CART_DATABASE_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: CART_DATABASE_URL"
        );
    }

    #[test]
    fn snapshot_path_defaults_when_unset() {
        assert_eq!(
            get_env_or_default("CART_TEST_UNSET_SNAPSHOT_PATH", DEFAULT_SNAPSHOT_PATH),
            ".lockerroom/cart.json"
        );
    }

    #[test]
    fn snapshot_path_overrides_the_default() {
        unsafe { std::env::set_var("CART_TEST_SNAPSHOT_PATH", "/var/lib/lockerroom/cart.json") };

        assert_eq!(
            get_env_or_default("CART_TEST_SNAPSHOT_PATH", DEFAULT_SNAPSHOT_PATH),
            "/var/lib/lockerroom/cart.json"
        );
    }
}
