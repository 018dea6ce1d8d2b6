//! Credential hashing.
//!
//! Logins and passwords are stored only in hashed form. Verification works by
//! hashing the supplied credentials again and comparing for equality, so every
//! hasher here must be deterministic: equal input, equal output.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use crate::constants::{HASH_ALGORITHM_ARGON2, HASH_ALGORITHM_SHA512, MIN_HASH_SALT_LENGTH};
use crate::error::{DomainError, DomainResult};

/// One-way deterministic transform of a raw credential.
///
/// The same instance is used when a user is created and when the user signs
/// in; a stored hash only matches a hash produced with the same algorithm and
/// salt.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, raw: &str) -> DomainResult<String>;
}

/// Salted SHA-512, rendered as lowercase hex.
#[derive(Clone)]
pub struct Sha512Hasher {
    salt: String,
}

impl Sha512Hasher {
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }
}

impl fmt::Debug for Sha512Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sha512Hasher")
            .field("salt", &"[REDACTED]")
            .finish()
    }
}

impl CredentialHasher for Sha512Hasher {
    fn hash(&self, raw: &str) -> DomainResult<String> {
        let mut hasher = Sha512::new();
        hasher.update(self.salt.as_bytes());
        hasher.update(raw.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Argon2id with a fixed, configured salt.
///
/// Output is a PHC string. The salt is fixed so that the output can be
/// compared for equality.
#[derive(Clone)]
pub struct Argon2Hasher {
    salt: SaltString,
}

impl Argon2Hasher {
    /// Build a hasher from raw salt text.
    ///
    /// # Errors
    /// Returns a validation error if the salt cannot be used as an Argon2 salt
    /// (too short or too long once encoded).
    pub fn new(salt: &str) -> DomainResult<Self> {
        let salt = SaltString::encode_b64(salt.as_bytes())
            .map_err(|e| DomainError::validation(format!("Invalid Argon2 salt: {}", e)))?;
        Ok(Self { salt })
    }

    #[inline]
    fn argon2() -> Argon2<'static> {
        Argon2::default()
    }
}

impl fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("salt", &"[REDACTED]")
            .finish()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, raw: &str) -> DomainResult<String> {
        let hash = Self::argon2()
            .hash_password(raw.as_bytes(), &self.salt)
            .map_err(|e| DomainError::hashing(e.to_string()))?;
        Ok(hash.to_string())
    }
}

/// Selects the hasher implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha512,
    Argon2,
}

impl HashAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            HashAlgorithm::Sha512 => HASH_ALGORITHM_SHA512,
            HashAlgorithm::Argon2 => HASH_ALGORITHM_ARGON2,
        }
    }

    /// Build the configured hasher.
    ///
    /// # Errors
    /// Returns a validation error if the salt is shorter than
    /// `MIN_HASH_SALT_LENGTH` or unusable by the algorithm.
    pub fn build(self, salt: &str) -> DomainResult<Arc<dyn CredentialHasher>> {
        if salt.len() < MIN_HASH_SALT_LENGTH {
            return Err(DomainError::validation(format!(
                "Credential salt must be at least {} characters",
                MIN_HASH_SALT_LENGTH
            )));
        }

        let hasher: Arc<dyn CredentialHasher> = match self {
            HashAlgorithm::Sha512 => Arc::new(Sha512Hasher::new(salt)),
            HashAlgorithm::Argon2 => Arc::new(Argon2Hasher::new(salt)?),
        };
        Ok(hasher)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            HASH_ALGORITHM_SHA512 => Ok(HashAlgorithm::Sha512),
            HASH_ALGORITHM_ARGON2 => Ok(HashAlgorithm::Argon2),
            other => Err(DomainError::validation(format!(
                "Unknown hash algorithm: {}",
                other
            ))),
        }
    }
}
