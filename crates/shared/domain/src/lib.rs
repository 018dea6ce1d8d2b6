//! Domain layer - Core identity entities, value objects and validators.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! Services in the workspace share these types for credentials, users, roles
//! and audit events.

pub mod audit;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod hasher;
pub mod role;
pub mod user;
pub mod validation;

pub use audit::{AuditEvent, AuditKind};
pub use constants::*;
pub use credentials::{Credentials, HashedCredentials, SignedInIdentity};
pub use error::{DomainError, DomainResult};
pub use hasher::{Argon2Hasher, CredentialHasher, HashAlgorithm, Sha512Hasher};
pub use role::{Role, Roles};
pub use user::{AddUserModel, UpdateUserModel, UserModel, UserRecord, UserStatus};
