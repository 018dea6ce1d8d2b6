//! Repository layer for data access.

pub mod entities;
pub mod memory;
mod unit_of_work;
mod user_log_repository;
mod user_repository;

pub use memory::InMemoryStore;
pub use unit_of_work::{Persistence, UnitOfWork, UnitOfWorkScope};
pub use user_log_repository::{TxUserLogStore, UserLogRepository, UserLogStore};
pub use user_repository::{TxUserStore, UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use user_log_repository::MockUserLogRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
