//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// User Roles
// =============================================================================

/// Role granted to every regular account
pub const ROLE_USER: &str = "user";

/// Administrator role with elevated privileges
pub const ROLE_ADMIN: &str = "admin";

// =============================================================================
// Validation
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: u64 = 8;

/// Minimum login length requirement
pub const MIN_LOGIN_LENGTH: usize = 3;

/// Maximum login length requirement
pub const MAX_LOGIN_LENGTH: usize = 64;

/// Minimum name length requirement
pub const MIN_NAME_LENGTH: u64 = 1;

/// Maximum name / surname length
pub const MAX_NAME_LENGTH: u64 = 100;

// =============================================================================
// Credential hashing
// =============================================================================

/// Minimum length of the configured credential salt
pub const MIN_HASH_SALT_LENGTH: usize = 8;

/// Hash algorithm identifier for salted SHA-512
pub const HASH_ALGORITHM_SHA512: &str = "sha512";

/// Hash algorithm identifier for fixed-salt Argon2id
pub const HASH_ALGORITHM_ARGON2: &str = "argon2";

// =============================================================================
// Authentication
// =============================================================================

/// Default JWT token expiration in hours
pub const DEFAULT_JWT_EXPIRATION_HOURS: i64 = 24;

/// Minimum JWT secret length (security requirement)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Default `iss` claim written into issued tokens
pub const DEFAULT_JWT_ISSUER: &str = "identity";

/// Longest token lifetime accepted from configuration (one year)
pub const MAX_JWT_EXPIRATION_HOURS: i64 = 24 * 365;

/// Seconds per hour (for token expiration calculation)
pub const SECONDS_PER_HOUR: i64 = 3600;

// =============================================================================
// Pagination
// =============================================================================

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Maximum allowed items per page to prevent excessive queries
pub const MAX_PAGE_SIZE: u64 = 100;

/// Default starting page number (1-indexed)
pub const DEFAULT_PAGE_NUMBER: u64 = 1;

/// Highest page number honoured; larger requests are clamped to it so the
/// row offset always fits a signed 64-bit SQL `OFFSET`.
pub const MAX_PAGE_NUMBER: u64 = i64::MAX as u64 / MAX_PAGE_SIZE;
