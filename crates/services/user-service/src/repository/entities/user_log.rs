//! User log (audit event) database entity for SeaORM.

use sea_orm::entity::prelude::*;

use common::{AppError, AppResult};
use domain::{AuditEvent, AuditKind};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub log_type: i32,
    pub date_time: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for AuditEvent {
    type Error = AppError;

    fn try_from(model: Model) -> AppResult<Self> {
        Ok(AuditEvent::with_timestamp(
            model.user_id,
            AuditKind::from_code(model.log_type)?,
            model.date_time,
        ))
    }
}
