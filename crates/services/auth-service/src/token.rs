//! Session tokens.

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use common::{AppError, AppResult, JwtConfig};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id in decimal
    pub sub: String,
    /// One entry per role name
    pub roles: Vec<String>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Encodes a subject and its role claims into an opaque signed string.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait TokenIssuer: Send + Sync {
    fn encode(&self, subject: &str, claims: &[String]) -> AppResult<String>;

    /// Verify signature, expiry and issuer of a token this issuer produced
    fn decode(&self, token: &str) -> AppResult<TokenClaims>;
}

/// HS256 JWT issuer
#[derive(Clone)]
pub struct JwtIssuer {
    secret: String,
    expiration_hours: i64,
    issuer: String,
}

impl JwtIssuer {
    /// Create an issuer from validated settings
    pub fn new(config: &JwtConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            secret: config.secret.clone(),
            expiration_hours: config.expiration_hours,
            issuer: config.issuer.clone(),
        })
    }

    /// Get JWT secret as bytes
    fn secret_bytes(&self) -> &[u8] {
        self.secret.as_bytes()
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation
    }
}

impl fmt::Debug for JwtIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtIssuer")
            .field("secret", &"[REDACTED]")
            .field("expiration_hours", &self.expiration_hours)
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl TokenIssuer for JwtIssuer {
    fn encode(&self, subject: &str, claims: &[String]) -> AppResult<String> {
        let now = Utc::now();
        let expires_at = Duration::try_hours(self.expiration_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AppError::configuration(format!(
                    "JWT expiration of {} hours is out of range",
                    self.expiration_hours
                ))
            })?;

        let claims = TokenClaims {
            sub: subject.to_string(),
            roles: claims.to_vec(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret_bytes()),
        )?;

        Ok(token)
    }

    fn decode(&self, token: &str) -> AppResult<TokenClaims> {
        let token_data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret_bytes()),
            &self.validation(),
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{MAX_JWT_EXPIRATION_HOURS, SECONDS_PER_HOUR};

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            ..Default::default()
        }
    }

    fn issuer() -> JwtIssuer {
        JwtIssuer::new(&config("test-secret-key-for-testing-only-32chars")).unwrap()
    }

    #[test]
    fn test_claims_round_trip() {
        let issuer = issuer();
        let token = issuer.encode("1", &["user".to_string()]).unwrap();
        let claims = issuer.decode(&token).unwrap();

        assert_eq!(claims.sub, "1");
        assert_eq!(claims.roles, vec!["user".to_string()]);
        assert_eq!(claims.iss, "identity");
        assert_eq!(claims.exp - claims.iat, 24 * SECONDS_PER_HOUR);
    }

    #[test]
    fn test_multiple_roles_stay_separate() {
        let issuer = issuer();
        let roles = vec!["user".to_string(), "admin".to_string()];
        let claims = issuer.decode(&issuer.encode("5", &roles).unwrap()).unwrap();
        assert_eq!(claims.roles.len(), 2);
        assert_eq!(claims.roles, roles);
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let token = issuer().encode("1", &[]).unwrap();
        let other = JwtIssuer::new(&config("another-secret-key-that-is-32-chars!")).unwrap();

        assert!(matches!(other.decode(&token), Err(AppError::Jwt(_))));
    }

    #[test]
    fn test_foreign_issuer_is_rejected() {
        let token = issuer().encode("1", &[]).unwrap();
        let other = JwtIssuer::new(&JwtConfig {
            issuer: "someone-else".to_string(),
            ..config("test-secret-key-for-testing-only-32chars")
        })
        .unwrap();

        assert!(other.decode(&token).is_err());
    }

    #[test]
    fn test_short_secret_is_rejected() {
        assert!(matches!(
            JwtIssuer::new(&config("short")),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn test_oversized_lifetime_is_rejected_up_front() {
        let result = JwtIssuer::new(&JwtConfig {
            expiration_hours: i64::MAX / 1000,
            ..config("test-secret-key-for-testing-only-32chars")
        });
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_longest_lifetime_encodes() {
        let issuer = JwtIssuer::new(&JwtConfig {
            expiration_hours: MAX_JWT_EXPIRATION_HOURS,
            ..config("test-secret-key-for-testing-only-32chars")
        })
        .unwrap();
        let claims = issuer.decode(&issuer.encode("1", &[]).unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, MAX_JWT_EXPIRATION_HOURS * SECONDS_PER_HOUR);
    }

    #[test]
    fn test_out_of_range_lifetime_errors_instead_of_panicking() {
        let issuer = JwtIssuer {
            secret: "test-secret-key-for-testing-only-32chars".to_string(),
            expiration_hours: i64::MAX / 1000,
            issuer: "identity".to_string(),
        };
        assert!(matches!(
            issuer.encode("1", &["user".to_string()]),
            Err(AppError::Configuration(_))
        ));
    }
}
