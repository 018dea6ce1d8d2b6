//! Common utilities shared across the identity services.
//!
//! This crate provides:
//! - Unified error handling (`AppError` / `AppResult`)
//! - Pagination types for list operations
//! - Configuration structures

pub mod config;
pub mod error;
pub mod pagination;

pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
