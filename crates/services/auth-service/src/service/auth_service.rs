//! Authentication service - sign-in and sign-out.
//!
//! A sign-in runs strictly in order: validate the input, hash it, verify it
//! against the store, validate the resolved identity, record the login, and
//! only then issue a token. Any failing step ends the call with its error.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use common::{AppError, AppResult};
use domain::validation::{validate_credentials, validate_signed_in};
use domain::{AuditEvent, CredentialHasher, Credentials};
use user_service_lib::repository::UserRepository;
use user_service_lib::service::AuditLog;

use crate::token::TokenIssuer;

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Verify credentials and return a signed token
    async fn sign_in(&self, credentials: Credentials) -> AppResult<String>;

    /// Record a logout for `user_id`. Always audited; no token handling.
    async fn sign_out(&self, user_id: i64) -> AppResult<()>;
}

/// Concrete implementation of AuthService.
pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    audit: Arc<dyn AuditLog>,
    tokens: Arc<dyn TokenIssuer>,
    hasher: Arc<dyn CredentialHasher>,
}

impl Authenticator {
    /// Create new auth service instance
    pub fn new(
        users: Arc<dyn UserRepository>,
        audit: Arc<dyn AuditLog>,
        tokens: Arc<dyn TokenIssuer>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        Self {
            users,
            audit,
            tokens,
            hasher,
        }
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn sign_in(&self, credentials: Credentials) -> AppResult<String> {
        if let Err(e) = validate_credentials(&credentials) {
            warn!(error = %e, "Rejected malformed sign-in");
            return Err(e.into());
        }

        let hashed = credentials.hash_with(self.hasher.as_ref())?;
        let identity = self.users.verify_sign_in(&hashed).await?;

        let identity = validate_signed_in(identity).map_err(|e| {
            warn!("Rejected sign-in with invalid credentials");
            AppError::from(e)
        })?;

        // The login must be on record before a token exists
        self.audit.add(AuditEvent::login(identity.user_id)).await?;

        let token = self
            .tokens
            .encode(&identity.subject(), &identity.roles.names())?;

        info!(user_id = identity.user_id, "User signed in");
        Ok(token)
    }

    async fn sign_out(&self, user_id: i64) -> AppResult<()> {
        self.audit.add(AuditEvent::logout(user_id)).await?;
        info!(user_id, "User signed out");
        Ok(())
    }
}
