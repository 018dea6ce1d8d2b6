//! Sign-in inputs and the identity they resolve to.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::DomainResult;
use crate::hasher::CredentialHasher;
use crate::role::Roles;

/// Raw credentials as supplied by a caller. Never persisted.
#[derive(Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "Login is required"))]
    pub login: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Hash both parts with `hasher`.
    ///
    /// This is the only way credentials reach a repository, both when a user
    /// is stored and when a sign-in is verified.
    pub fn hash_with(&self, hasher: &dyn CredentialHasher) -> DomainResult<HashedCredentials> {
        Ok(HashedCredentials {
            login_hash: hasher.hash(&self.login)?,
            password_hash: hasher.hash(&self.password)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Credentials after hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedCredentials {
    pub login_hash: String,
    pub password_hash: String,
}

/// Identity resolved by a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInIdentity {
    pub user_id: i64,
    pub roles: Roles,
}

impl SignedInIdentity {
    pub fn new(user_id: i64, roles: Roles) -> Self {
        Self { user_id, roles }
    }

    /// Token subject: the user id in decimal
    pub fn subject(&self) -> String {
        self.user_id.to_string()
    }
}
