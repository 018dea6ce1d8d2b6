//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use common::{AppError, AppResult};
use domain::{Roles, UserRecord, UserStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
    /// Hashed login
    #[sea_orm(unique)]
    pub login: String,
    /// Hashed password
    pub password: String,
    /// Role bitmask
    pub roles: i32,
    pub status: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain record
impl TryFrom<Model> for UserRecord {
    type Error = AppError;

    fn try_from(model: Model) -> AppResult<Self> {
        Ok(UserRecord {
            user_id: model.id,
            name: model.name,
            surname: model.surname,
            email: model.email,
            login_hash: model.login,
            password_hash: model.password,
            roles: Roles::from_bits(model.roles),
            status: UserStatus::from_code(model.status)?,
        })
    }
}
