//! Migration: Create user_logs table.
//!
//! No foreign key to `users`: sign-out is recorded for any user id.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserLogs::UserId).big_integer().not_null())
                    .col(ColumnDef::new(UserLogs::LogType).integer().not_null())
                    .col(
                        ColumnDef::new(UserLogs::DateTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_logs_user_id")
                    .table(UserLogs::Table)
                    .col(UserLogs::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_user_logs_user_id")
                    .table(UserLogs::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(UserLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum UserLogs {
    Table,
    Id,
    UserId,
    LogType,
    DateTime,
}
