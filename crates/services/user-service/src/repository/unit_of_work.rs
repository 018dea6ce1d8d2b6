//! Unit of Work pattern implementation.
//!
//! Reads go through the pooled repositories. Mutations happen inside a
//! scope: everything done through a scope's repositories becomes visible on
//! `commit`, and a scope dropped without commit rolls back.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    AccessMode, DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait,
};

use super::user_log_repository::{TxUserLogStore, UserLogRepository, UserLogStore};
use super::user_repository::{TxUserStore, UserRepository, UserStore};
use common::{AppError, AppResult};

/// Unit of Work trait for dependency injection.
///
/// Not mockable directly because scopes hand out borrowed repositories.
/// For testing, use the in-memory implementation.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Get user repository
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Get user log repository
    fn user_logs(&self) -> Arc<dyn UserLogRepository>;

    /// Open a transactional scope
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWorkScope>>;
}

/// One transaction. Repositories obtained here share it.
#[async_trait]
pub trait UnitOfWorkScope: Send + Sync {
    fn users(&self) -> Box<dyn UserRepository + '_>;

    fn user_logs(&self) -> Box<dyn UserLogRepository + '_>;

    /// Make every change made through this scope visible.
    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// Concrete implementation of UnitOfWork over SeaORM
pub struct Persistence {
    db: DatabaseConnection,
    user_repo: Arc<UserStore>,
    log_repo: Arc<UserLogStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        let user_repo = Arc::new(UserStore::new(db.clone()));
        let log_repo = Arc::new(UserLogStore::new(db.clone()));
        Self {
            db,
            user_repo,
            log_repo,
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn user_logs(&self) -> Arc<dyn UserLogRepository> {
        self.log_repo.clone()
    }

    async fn begin(&self) -> AppResult<Box<dyn UnitOfWorkScope>> {
        // ReadCommitted for balanced consistency/performance
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::ReadCommitted),
                Some(AccessMode::ReadWrite),
            )
            .await
            .map_err(AppError::from)?;

        Ok(Box::new(DatabaseScope { txn }))
    }
}

/// Scope backed by a database transaction.
///
/// SeaORM rolls the transaction back when it is dropped uncommitted.
struct DatabaseScope {
    txn: DatabaseTransaction,
}

#[async_trait]
impl UnitOfWorkScope for DatabaseScope {
    fn users(&self) -> Box<dyn UserRepository + '_> {
        Box::new(TxUserStore::new(&self.txn))
    }

    fn user_logs(&self) -> Box<dyn UserLogRepository + '_> {
        Box::new(TxUserLogStore::new(&self.txn))
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.txn
            .commit()
            .await
            .map_err(|e| AppError::persistence(format!("Commit failed: {}", e)))
    }
}
