//! User repository: persistence of user records and sign-in verification.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, NotSet, PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use common::{AppError, AppResult, Paginated, PaginationParams};
use domain::{HashedCredentials, Roles, SignedInIdentity, UserModel, UserRecord, UserStatus};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// Credentials only ever reach the repository in hashed form.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Match stored hashes of an active user.
    async fn verify_sign_in(
        &self,
        credentials: &HashedCredentials,
    ) -> AppResult<Option<SignedInIdentity>>;

    /// Insert a new record and return its assigned id
    async fn add(&self, record: UserRecord) -> AppResult<i64>;

    /// Overwrite the record stored under `user_id`
    async fn update(&self, user_id: i64, record: UserRecord) -> AppResult<()>;

    async fn delete(&self, user_id: i64) -> AppResult<()>;

    async fn select(&self, user_id: i64) -> AppResult<Option<UserModel>>;

    /// Full stored record, credential hashes included
    async fn select_record(&self, user_id: i64) -> AppResult<Option<UserRecord>>;

    async fn list(&self) -> AppResult<Vec<UserModel>>;

    async fn list_paged(&self, params: PaginationParams) -> AppResult<Paginated<UserModel>>;
}

/// Concrete implementation of UserRepository over a pooled connection
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn verify_sign_in(
        &self,
        credentials: &HashedCredentials,
    ) -> AppResult<Option<SignedInIdentity>> {
        query::verify_sign_in(&self.db, credentials).await
    }

    async fn add(&self, record: UserRecord) -> AppResult<i64> {
        query::add(&self.db, record).await
    }

    async fn update(&self, user_id: i64, record: UserRecord) -> AppResult<()> {
        query::update(&self.db, user_id, record).await
    }

    async fn delete(&self, user_id: i64) -> AppResult<()> {
        query::delete(&self.db, user_id).await
    }

    async fn select(&self, user_id: i64) -> AppResult<Option<UserModel>> {
        Ok(query::select_record(&self.db, user_id)
            .await?
            .map(UserModel::from))
    }

    async fn select_record(&self, user_id: i64) -> AppResult<Option<UserRecord>> {
        query::select_record(&self.db, user_id).await
    }

    async fn list(&self) -> AppResult<Vec<UserModel>> {
        query::list(&self.db).await
    }

    async fn list_paged(&self, params: PaginationParams) -> AppResult<Paginated<UserModel>> {
        query::list_paged(&self.db, params).await
    }
}

/// Transaction-aware user repository.
///
/// Executes all operations within the borrowed transaction.
pub struct TxUserStore<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxUserStore<'a> {
    pub fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }
}

#[async_trait]
impl<'a> UserRepository for TxUserStore<'a> {
    async fn verify_sign_in(
        &self,
        credentials: &HashedCredentials,
    ) -> AppResult<Option<SignedInIdentity>> {
        query::verify_sign_in(self.txn, credentials).await
    }

    async fn add(&self, record: UserRecord) -> AppResult<i64> {
        query::add(self.txn, record).await
    }

    async fn update(&self, user_id: i64, record: UserRecord) -> AppResult<()> {
        query::update(self.txn, user_id, record).await
    }

    async fn delete(&self, user_id: i64) -> AppResult<()> {
        query::delete(self.txn, user_id).await
    }

    async fn select(&self, user_id: i64) -> AppResult<Option<UserModel>> {
        Ok(query::select_record(self.txn, user_id)
            .await?
            .map(UserModel::from))
    }

    async fn select_record(&self, user_id: i64) -> AppResult<Option<UserRecord>> {
        query::select_record(self.txn, user_id).await
    }

    async fn list(&self) -> AppResult<Vec<UserModel>> {
        query::list(self.txn).await
    }

    async fn list_paged(&self, params: PaginationParams) -> AppResult<Paginated<UserModel>> {
        query::list_paged(self.txn, params).await
    }
}

/// Unique login violations surface as a conflict
fn map_write_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict("Login"),
        _ => AppError::from(err),
    }
}

fn to_views(models: Vec<user::Model>) -> AppResult<Vec<UserModel>> {
    models
        .into_iter()
        .map(|model| UserRecord::try_from(model).map(UserModel::from))
        .collect()
}

/// Queries shared by the pooled and transactional stores.
mod query {
    use super::*;

    pub(super) async fn verify_sign_in<C: ConnectionTrait>(
        db: &C,
        credentials: &HashedCredentials,
    ) -> AppResult<Option<SignedInIdentity>> {
        tracing::debug!("Verifying sign-in against stored hashes");

        let model = UserEntity::find()
            .filter(user::Column::Login.eq(credentials.login_hash.as_str()))
            .filter(user::Column::Password.eq(credentials.password_hash.as_str()))
            .filter(user::Column::Status.eq(UserStatus::Active.code()))
            .one(db)
            .await?;

        Ok(model.map(|m| SignedInIdentity::new(m.id, Roles::from_bits(m.roles))))
    }

    pub(super) async fn add<C: ConnectionTrait>(db: &C, record: UserRecord) -> AppResult<i64> {
        let active_model = ActiveModel {
            id: NotSet,
            name: Set(record.name),
            surname: Set(record.surname),
            email: Set(record.email),
            login: Set(record.login_hash),
            password: Set(record.password_hash),
            roles: Set(record.roles.bits()),
            status: Set(record.status.code()),
        };

        let model = active_model.insert(db).await.map_err(map_write_error)?;
        tracing::debug!(user_id = model.id, "User row inserted");
        Ok(model.id)
    }

    pub(super) async fn update<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        record: UserRecord,
    ) -> AppResult<()> {
        let existing = UserEntity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        active.name = Set(record.name);
        active.surname = Set(record.surname);
        active.email = Set(record.email);
        active.login = Set(record.login_hash);
        active.password = Set(record.password_hash);
        active.roles = Set(record.roles.bits());
        active.status = Set(record.status.code());

        active.update(db).await.map_err(map_write_error)?;
        tracing::debug!(user_id, "User row updated");
        Ok(())
    }

    pub(super) async fn delete<C: ConnectionTrait>(db: &C, user_id: i64) -> AppResult<()> {
        let result = UserEntity::delete_by_id(user_id).exec(db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        tracing::debug!(user_id, "User row deleted");
        Ok(())
    }

    pub(super) async fn select_record<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
    ) -> AppResult<Option<UserRecord>> {
        UserEntity::find_by_id(user_id)
            .one(db)
            .await?
            .map(UserRecord::try_from)
            .transpose()
    }

    pub(super) async fn list<C: ConnectionTrait>(db: &C) -> AppResult<Vec<UserModel>> {
        let models = UserEntity::find()
            .order_by_asc(user::Column::Id)
            .all(db)
            .await?;

        to_views(models)
    }

    pub(super) async fn list_paged<C: ConnectionTrait>(
        db: &C,
        params: PaginationParams,
    ) -> AppResult<Paginated<UserModel>> {
        let paginator = UserEntity::find()
            .order_by_asc(user::Column::Id)
            .paginate(db, params.limit());
        let total = paginator.num_items().await?;
        // page_index is clamped, so the paginator's page * limit cannot overflow
        let models = paginator.fetch_page(params.page_index()).await?;

        Ok(Paginated::from_params(to_views(models)?, &params, total))
    }
}
