//! Audit events recorded for sign-in and sign-out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Kind of authentication event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditKind {
    Login,
    Logout,
}

impl AuditKind {
    /// Stored representation
    pub fn code(self) -> i32 {
        match self {
            AuditKind::Login => 1,
            AuditKind::Logout => 2,
        }
    }

    pub fn from_code(code: i32) -> DomainResult<Self> {
        match code {
            1 => Ok(AuditKind::Login),
            2 => Ok(AuditKind::Logout),
            other => Err(DomainError::internal(format!("Unknown audit kind code {}", other))),
        }
    }
}

impl std::fmt::Display for AuditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditKind::Login => f.write_str("login"),
            AuditKind::Logout => f.write_str("logout"),
        }
    }
}

/// An authentication event. Append-only: never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub user_id: i64,
    pub kind: AuditKind,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    /// Create a new audit event with the current timestamp.
    pub fn new(user_id: i64, kind: AuditKind) -> Self {
        Self::with_timestamp(user_id, kind, Utc::now())
    }

    /// Create a new audit event with a specific timestamp.
    pub fn with_timestamp(user_id: i64, kind: AuditKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            user_id,
            kind,
            timestamp,
        }
    }

    pub fn login(user_id: i64) -> Self {
        Self::new(user_id, AuditKind::Login)
    }

    pub fn logout(user_id: i64) -> Self {
        Self::new(user_id, AuditKind::Logout)
    }
}
