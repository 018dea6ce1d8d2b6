//! User service - validates input, hashes credentials and delegates to the
//! repository inside a unit of work.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use common::{AppError, AppResult, OptionExt, Paginated, PaginationParams};
use domain::validation::{validate_add_user, validate_update_user};
use domain::{AddUserModel, CredentialHasher, DomainError, UpdateUserModel, UserModel};

use crate::repository::UnitOfWork;

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Create a user and return its id
    async fn add(&self, model: AddUserModel) -> AppResult<i64>;

    /// Update profile fields; stored credentials are kept
    async fn update(&self, model: UpdateUserModel) -> AppResult<()>;

    async fn delete(&self, user_id: i64) -> AppResult<()>;

    async fn list(&self) -> AppResult<Vec<UserModel>>;

    async fn list_paged(&self, params: PaginationParams) -> AppResult<Paginated<UserModel>>;

    /// Get user by ID
    async fn select(&self, user_id: i64) -> AppResult<UserModel>;
}

/// Concrete implementation of UserService.
pub struct UserManager {
    uow: Arc<dyn UnitOfWork>,
    hasher: Arc<dyn CredentialHasher>,
}

impl UserManager {
    /// `hasher` must be the one sign-in verification uses.
    pub fn new(uow: Arc<dyn UnitOfWork>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { uow, hasher }
    }
}

fn rejected(operation: &'static str, err: DomainError) -> AppError {
    warn!(operation, error = %err, "Rejected invalid input");
    err.into()
}

#[async_trait]
impl UserService for UserManager {
    async fn add(&self, model: AddUserModel) -> AppResult<i64> {
        validate_add_user(&model).map_err(|e| rejected("add_user", e))?;

        let hashed = model.credentials().hash_with(self.hasher.as_ref())?;
        let record = model.into_record(hashed);

        let scope = self.uow.begin().await?;
        let user_id = scope.users().add(record).await?;
        scope.commit().await?;

        info!(user_id, "User created");
        Ok(user_id)
    }

    async fn update(&self, model: UpdateUserModel) -> AppResult<()> {
        validate_update_user(&model).map_err(|e| rejected("update_user", e))?;

        let user_id = model.user_id;
        let mut record = model.into_record();

        let scope = self.uow.begin().await?;
        {
            let users = scope.users();
            let stored = users.select_record(user_id).await?.ok_or_not_found()?;
            record.retain_credentials_of(&stored);
            users.update(user_id, record).await?;
        }
        scope.commit().await?;

        info!(user_id, "User updated");
        Ok(())
    }

    async fn delete(&self, user_id: i64) -> AppResult<()> {
        let scope = self.uow.begin().await?;
        scope.users().delete(user_id).await?;
        scope.commit().await?;

        info!(user_id, "User deleted");
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<UserModel>> {
        self.uow.users().list().await
    }

    async fn list_paged(&self, params: PaginationParams) -> AppResult<Paginated<UserModel>> {
        self.uow.users().list_paged(params).await
    }

    async fn select(&self, user_id: i64) -> AppResult<UserModel> {
        self.uow.users().select(user_id).await?.ok_or_not_found()
    }
}
