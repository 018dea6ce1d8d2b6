//! User and audit log business logic.

mod user_log_service;
mod user_service;

pub use user_log_service::{AuditLog, UserLogManager};
pub use user_service::{UserManager, UserService};

#[cfg(any(test, feature = "test-utils"))]
pub use user_log_service::MockAuditLog;
