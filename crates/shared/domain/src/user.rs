//! User domain entity and related types.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::constants::{MAX_NAME_LENGTH, MIN_NAME_LENGTH};
use crate::credentials::{Credentials, HashedCredentials};
use crate::error::{DomainError, DomainResult};
use crate::role::{Role, Roles};
use crate::validation::{validate_password_strength, validate_roles, LOGIN_PATTERN};

/// Account status. Only active users can sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

impl UserStatus {
    /// Stored representation
    pub fn code(self) -> i32 {
        match self {
            UserStatus::Active => 1,
            UserStatus::Inactive => 2,
        }
    }

    pub fn from_code(code: i32) -> DomainResult<Self> {
        match code {
            1 => Ok(UserStatus::Active),
            2 => Ok(UserStatus::Inactive),
            other => Err(DomainError::internal(format!("Unknown user status code {}", other))),
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, UserStatus::Active)
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserStatus::Active => f.write_str("active"),
            UserStatus::Inactive => f.write_str("inactive"),
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(UserStatus::Active),
            "inactive" => Ok(UserStatus::Inactive),
            other => Err(DomainError::validation(format!("Unknown user status: {}", other))),
        }
    }
}

/// Persistable user record.
///
/// `login_hash` and `password_hash` are written once, when the record is
/// created. Updates carry the stored values forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub login_hash: String,
    pub password_hash: String,
    pub roles: Roles,
    pub status: UserStatus,
}

impl UserRecord {
    /// Replace this record's credential hashes with the stored ones.
    pub fn retain_credentials_of(&mut self, stored: &UserRecord) {
        self.login_hash = stored.login_hash.clone();
        self.password_hash = stored.password_hash.clone();
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

fn default_roles() -> Roles {
    Roles::single(Role::User)
}

/// User creation input.
#[derive(Clone, Deserialize, Validate)]
pub struct AddUserModel {
    #[validate(length(
        min = MIN_NAME_LENGTH,
        max = MAX_NAME_LENGTH,
        message = "Name is required"
    ))]
    pub name: String,
    #[validate(length(
        min = MIN_NAME_LENGTH,
        max = MAX_NAME_LENGTH,
        message = "Surname is required"
    ))]
    pub surname: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(regex(
        path = *LOGIN_PATTERN,
        message = "Login must be 3-64 characters of letters, digits, '.', '_' or '-'"
    ))]
    pub login: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    #[serde(default = "default_roles")]
    #[validate(custom(function = "validate_roles"))]
    pub roles: Roles,
}

impl AddUserModel {
    /// New user input with the default `user` role
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        email: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            email: email.into(),
            login: login.into(),
            password: password.into(),
            roles: default_roles(),
        }
    }

    pub fn with_roles(mut self, roles: Roles) -> Self {
        self.roles = roles;
        self
    }

    /// The raw sign-in credentials this user will use
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.login.clone(), self.password.clone())
    }

    /// Map into a new, active record holding `hashed` credentials.
    ///
    /// `user_id` is left at 0; the repository assigns it.
    pub fn into_record(self, hashed: HashedCredentials) -> UserRecord {
        UserRecord {
            user_id: 0,
            name: self.name,
            surname: self.surname,
            email: self.email,
            login_hash: hashed.login_hash,
            password_hash: hashed.password_hash,
            roles: self.roles,
            status: UserStatus::Active,
        }
    }
}

impl fmt::Debug for AddUserModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddUserModel")
            .field("name", &self.name)
            .field("surname", &self.surname)
            .field("email", &self.email)
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .field("roles", &self.roles)
            .finish()
    }
}

/// User update input. Profile fields only; credentials cannot change here.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserModel {
    #[validate(range(min = 1, message = "User id must be positive"))]
    pub user_id: i64,
    #[validate(length(
        min = MIN_NAME_LENGTH,
        max = MAX_NAME_LENGTH,
        message = "Name is required"
    ))]
    pub name: String,
    #[validate(length(
        min = MIN_NAME_LENGTH,
        max = MAX_NAME_LENGTH,
        message = "Surname is required"
    ))]
    pub surname: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(custom(function = "validate_roles"))]
    pub roles: Roles,
    #[serde(default)]
    pub status: UserStatus,
}

impl UpdateUserModel {
    /// Map into a record with empty credential hashes.
    ///
    /// The caller must fill the hashes from the stored record before
    /// persisting.
    pub fn into_record(self) -> UserRecord {
        UserRecord {
            user_id: self.user_id,
            name: self.name,
            surname: self.surname,
            email: self.email,
            login_hash: String::new(),
            password_hash: String::new(),
            roles: self.roles,
            status: self.status,
        }
    }
}

/// User view (safe to return to callers). Never carries credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserModel {
    pub user_id: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub roles: Roles,
    pub status: UserStatus,
}

impl From<UserRecord> for UserModel {
    fn from(record: UserRecord) -> Self {
        Self {
            user_id: record.user_id,
            name: record.name,
            surname: record.surname,
            email: record.email,
            roles: record.roles,
            status: record.status,
        }
    }
}

impl From<&UserRecord> for UserModel {
    fn from(record: &UserRecord) -> Self {
        Self {
            user_id: record.user_id,
            name: record.name.clone(),
            surname: record.surname.clone(),
            email: record.email.clone(),
            roles: record.roles.clone(),
            status: record.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashed() -> HashedCredentials {
        HashedCredentials {
            login_hash: "login-hash".to_string(),
            password_hash: "password-hash".to_string(),
        }
    }

    #[test]
    fn test_add_model_maps_to_active_record() {
        let record = AddUserModel::new("Alice", "Liddell", "alice@example.com", "alice", "Passw0rd!")
            .into_record(hashed());

        assert_eq!(record.user_id, 0);
        assert_eq!(record.login_hash, "login-hash");
        assert_eq!(record.password_hash, "password-hash");
        assert_eq!(record.roles, Roles::single(Role::User));
        assert!(record.is_active());
    }

    #[test]
    fn test_update_keeps_stored_credentials() {
        let stored = AddUserModel::new("Alice", "Liddell", "alice@example.com", "alice", "Passw0rd!")
            .into_record(hashed());

        let mut updated = UpdateUserModel {
            user_id: 1,
            name: "Alicia".to_string(),
            surname: "Liddell".to_string(),
            email: "alicia@example.com".to_string(),
            roles: Roles::single(Role::Admin),
            status: UserStatus::Inactive,
        }
        .into_record();
        assert!(updated.login_hash.is_empty());

        updated.retain_credentials_of(&stored);
        assert_eq!(updated.login_hash, stored.login_hash);
        assert_eq!(updated.password_hash, stored.password_hash);
        assert_eq!(updated.name, "Alicia");
    }

    #[test]
    fn test_view_has_no_credentials() {
        let record = AddUserModel::new("Alice", "Liddell", "alice@example.com", "alice", "Passw0rd!")
            .into_record(hashed());
        let view = UserModel::from(&record);
        let json = serde_json::to_string(&view).unwrap();

        assert!(!json.contains("login-hash"));
        assert!(!json.contains("password-hash"));
        assert_eq!(view.email, "alice@example.com");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(UserStatus::from_code(UserStatus::Inactive.code()).unwrap(), UserStatus::Inactive);
        assert!(UserStatus::from_code(9).is_err());
        assert_eq!("Active".parse::<UserStatus>().unwrap(), UserStatus::Active);
    }
}
