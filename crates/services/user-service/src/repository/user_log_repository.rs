//! Append-only persistence of audit events.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, NotSet, QueryFilter, QueryOrder, Set,
};

use super::entities::user_log::{self, ActiveModel, Entity as UserLogEntity};
use common::AppResult;
use domain::AuditEvent;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User log repository trait. Events are never updated or deleted.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserLogRepository: Send + Sync {
    async fn add(&self, event: AuditEvent) -> AppResult<()>;

    /// Events of one user, oldest first
    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<AuditEvent>>;
}

/// Concrete implementation of UserLogRepository over a pooled connection
pub struct UserLogStore {
    db: DatabaseConnection,
}

impl UserLogStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserLogRepository for UserLogStore {
    async fn add(&self, event: AuditEvent) -> AppResult<()> {
        insert(&self.db, event).await
    }

    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<AuditEvent>> {
        list_by_user(&self.db, user_id).await
    }
}

/// Transaction-aware user log repository
pub struct TxUserLogStore<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxUserLogStore<'a> {
    pub fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }
}

#[async_trait]
impl<'a> UserLogRepository for TxUserLogStore<'a> {
    async fn add(&self, event: AuditEvent) -> AppResult<()> {
        insert(self.txn, event).await
    }

    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<AuditEvent>> {
        list_by_user(self.txn, user_id).await
    }
}

async fn insert<C: ConnectionTrait>(db: &C, event: AuditEvent) -> AppResult<()> {
    let active_model = ActiveModel {
        id: NotSet,
        user_id: Set(event.user_id),
        log_type: Set(event.kind.code()),
        date_time: Set(event.timestamp),
    };

    active_model.insert(db).await?;
    tracing::debug!(user_id = event.user_id, kind = %event.kind, "User log appended");
    Ok(())
}

async fn list_by_user<C: ConnectionTrait>(db: &C, user_id: i64) -> AppResult<Vec<AuditEvent>> {
    UserLogEntity::find()
        .filter(user_log::Column::UserId.eq(user_id))
        .order_by_asc(user_log::Column::DateTime)
        .order_by_asc(user_log::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(AuditEvent::try_from)
        .collect()
}
