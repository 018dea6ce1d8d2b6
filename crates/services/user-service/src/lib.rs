//! User Service Library
//!
//! User lifecycle (add, update, delete, list, select) and the audit log of
//! authentication events, over a unit of work backed by SeaORM.

pub mod config;
pub mod infra;
pub mod repository;
pub mod service;

use tracing::{info, warn};

use common::AppResult;

use crate::config::UserServiceConfig;
use crate::infra::Database;

/// Schema operation requested from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Apply `action` and report every migration with its applied flag.
pub async fn run_migrations(
    config: &UserServiceConfig,
    action: MigrateAction,
) -> AppResult<Vec<(String, bool)>> {
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {}
        MigrateAction::Fresh => {
            warn!("Dropping all tables before re-running migrations");
            db.fresh_migrations().await?;
            info!("Schema rebuilt");
        }
    }

    Ok(db.migration_status().await?)
}
