//! SeaORM connection handling and schema migrations.

mod db;
pub mod migrations;

pub use db::Database;
