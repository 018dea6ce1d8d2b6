//! Audit log service - records authentication events.

use std::sync::Arc;

use async_trait::async_trait;

use common::AppResult;
use domain::AuditEvent;

use crate::repository::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Audit log trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append one event; it is durable once this returns `Ok`.
    async fn add(&self, event: AuditEvent) -> AppResult<()>;

    /// Events of a user in timestamp order
    async fn list(&self, user_id: i64) -> AppResult<Vec<AuditEvent>>;
}

/// Concrete implementation of AuditLog using the unit of work.
pub struct UserLogManager {
    uow: Arc<dyn UnitOfWork>,
}

impl UserLogManager {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl AuditLog for UserLogManager {
    async fn add(&self, event: AuditEvent) -> AppResult<()> {
        let scope = self.uow.begin().await?;
        scope.user_logs().add(event).await?;
        scope.commit().await
    }

    async fn list(&self, user_id: i64) -> AppResult<Vec<AuditEvent>> {
        self.uow.user_logs().list_by_user(user_id).await
    }
}
