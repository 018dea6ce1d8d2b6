//! Auth service configuration.

use std::env;

use common::{lookup_setting, parse_setting, AppError, AppResult, JwtConfig};
use domain::{DEFAULT_JWT_EXPIRATION_HOURS, DEFAULT_JWT_ISSUER};

/// Secret used when none is configured in debug builds
const DEV_JWT_SECRET: &str = "dev-secret-key-minimum-32-chars!!";

/// Auth service configuration.
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    pub jwt: JwtConfig,
}

impl AuthServiceConfig {
    /// Load configuration from environment variables (and `.env`).
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(&|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns a configuration error if the secret is missing in a release
    /// build, too short, or any numeric setting fails to parse.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> AppResult<Self> {
        let secret = match lookup_setting(lookup, &["JWT_SECRET", "AUTH_SERVICE_JWT_SECRET"]) {
            Some(secret) => secret,
            None if cfg!(debug_assertions) => {
                // Development mode: use default but warn
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                DEV_JWT_SECRET.to_string()
            }
            None => {
                return Err(AppError::configuration(
                    "JWT_SECRET environment variable must be set in production",
                ))
            }
        };

        let jwt = JwtConfig {
            secret,
            expiration_hours: parse_setting(
                lookup,
                &["JWT_EXPIRATION_HOURS", "AUTH_SERVICE_JWT_EXPIRATION_HOURS"],
                DEFAULT_JWT_EXPIRATION_HOURS,
            )?,
            issuer: lookup_setting(lookup, &["JWT_ISSUER"])
                .unwrap_or_else(|| DEFAULT_JWT_ISSUER.to_string()),
        };
        jwt.validate()?;

        Ok(Self { jwt })
    }
}
