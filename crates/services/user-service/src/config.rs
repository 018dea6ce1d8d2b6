//! User service configuration.

use std::env;

use common::{lookup_setting, parse_setting, AppError, AppResult, DatabaseConfig, HashingConfig};
use domain::HashAlgorithm;

/// Salt used when none is configured in debug builds
const DEV_HASH_SALT: &str = "dev-credential-salt";

/// User service configuration.
#[derive(Debug, Clone, Default)]
pub struct UserServiceConfig {
    pub database: DatabaseConfig,
    pub hashing: HashingConfig,
}

impl UserServiceConfig {
    /// Load configuration from environment variables (and `.env`).
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(&|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> AppResult<Self> {
        let defaults = DatabaseConfig::default();
        let database = DatabaseConfig {
            url: lookup_setting(lookup, &["USER_SERVICE_DATABASE_URL", "DATABASE_URL"])
                .unwrap_or(defaults.url),
            max_connections: parse_setting(
                lookup,
                &["DATABASE_MAX_CONNECTIONS"],
                defaults.max_connections,
            )?,
            min_connections: defaults.min_connections,
        };

        let algorithm = match lookup_setting(lookup, &["CREDENTIAL_HASH_ALGORITHM"]) {
            Some(raw) => raw
                .parse::<HashAlgorithm>()
                .map_err(|e| AppError::configuration(e.to_string()))?,
            None => HashAlgorithm::default(),
        };

        let salt = match lookup_setting(lookup, &["CREDENTIAL_HASH_SALT"]) {
            Some(salt) => salt,
            None if cfg!(debug_assertions) => {
                tracing::warn!("CREDENTIAL_HASH_SALT not set, using insecure default for development");
                DEV_HASH_SALT.to_string()
            }
            None => {
                return Err(AppError::configuration(
                    "CREDENTIAL_HASH_SALT must be set in production",
                ))
            }
        };

        Ok(Self {
            database,
            hashing: HashingConfig { algorithm, salt },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_specific_url_wins() {
        let config = UserServiceConfig::from_lookup(&|key| match key {
            "USER_SERVICE_DATABASE_URL" => Some("postgres://svc/identity".to_string()),
            "DATABASE_URL" => Some("postgres://shared/identity".to_string()),
            "CREDENTIAL_HASH_SALT" => Some("a-long-enough-salt".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.database.url, "postgres://svc/identity");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.hashing.algorithm, HashAlgorithm::Sha512);
    }

    #[test]
    fn test_algorithm_is_parsed() {
        let config = UserServiceConfig::from_lookup(&|key| match key {
            "CREDENTIAL_HASH_ALGORITHM" => Some("Argon2".to_string()),
            "CREDENTIAL_HASH_SALT" => Some("a-long-enough-salt".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.hashing.algorithm, HashAlgorithm::Argon2);
    }

    #[test]
    fn test_bad_values_are_configuration_errors() {
        let err = UserServiceConfig::from_lookup(&|key| match key {
            "CREDENTIAL_HASH_ALGORITHM" => Some("md5".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));

        let err = UserServiceConfig::from_lookup(&|key| match key {
            "DATABASE_MAX_CONNECTIONS" => Some("lots".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
