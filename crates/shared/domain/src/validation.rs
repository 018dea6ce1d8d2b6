//! Validators for every input the services accept.
//!
//! Each validator is a pure function returning `DomainResult<()>`; a failure
//! carries a human-readable message and nothing else.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::constants::{MAX_LOGIN_LENGTH, MIN_LOGIN_LENGTH, MIN_PASSWORD_LENGTH};
use crate::credentials::{Credentials, SignedInIdentity};
use crate::error::{DomainError, DomainResult};
use crate::role::Roles;
use crate::user::{AddUserModel, UpdateUserModel};

/// Allowed login shape
pub static LOGIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^[A-Za-z0-9._-]{{{},{}}}$",
        MIN_LOGIN_LENGTH, MAX_LOGIN_LENGTH
    ))
    .expect("login pattern is a valid regex")
});

fn rule(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Password strength: minimum length, at least one letter and one digit.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if (password.chars().count() as u64) < MIN_PASSWORD_LENGTH {
        return Err(rule(
            "password_length",
            format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
        ));
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err(rule("password_letter", "Password must contain a letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(rule("password_digit", "Password must contain a digit"));
    }
    Ok(())
}

/// A user must hold at least one role.
pub fn validate_roles(roles: &Roles) -> Result<(), ValidationError> {
    if roles.is_empty() {
        return Err(rule("roles", "At least one role is required"));
    }
    Ok(())
}

/// Format validation errors into a single message, ordered by field name.
fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Run derived validation on any model.
pub fn validate_model<T: Validate>(model: &T) -> DomainResult<()> {
    model
        .validate()
        .map_err(|e| DomainError::validation(format_validation_errors(&e)))
}

/// Sign-in input: login and password must both be present.
pub fn validate_credentials(credentials: &Credentials) -> DomainResult<()> {
    validate_model(credentials)
}

/// Identity returned by a credential check.
///
/// Absent identities, non-positive ids and empty role sets are all rejected
/// as invalid credentials.
pub fn validate_signed_in(identity: Option<SignedInIdentity>) -> DomainResult<SignedInIdentity> {
    match identity {
        Some(identity) if identity.user_id > 0 && !identity.roles.is_empty() => Ok(identity),
        _ => Err(DomainError::InvalidCredentials),
    }
}

pub fn validate_add_user(model: &AddUserModel) -> DomainResult<()> {
    validate_model(model)
}

pub fn validate_update_user(model: &UpdateUserModel) -> DomainResult<()> {
    validate_model(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_NAME_LENGTH;
    use crate::role::Role;
    use crate::user::UserStatus;

    fn valid_add() -> AddUserModel {
        AddUserModel::new("Alice", "Liddell", "alice@example.com", "alice", "Passw0rd!")
    }

    #[test]
    fn test_credentials_require_login_and_password() {
        assert!(validate_credentials(&Credentials::new("alice", "secret")).is_ok());

        let err = validate_credentials(&Credentials::new("", "secret")).unwrap_err();
        assert_eq!(err, DomainError::validation("Login is required"));

        let err = validate_credentials(&Credentials::new("alice", "")).unwrap_err();
        assert_eq!(err, DomainError::validation("Password is required"));
    }

    #[test]
    fn test_multiple_errors_are_joined_in_field_order() {
        let err = validate_credentials(&Credentials::new("", "")).unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("Login is required, Password is required")
        );
    }

    #[test]
    fn test_signed_in_identity_shape() {
        let ok = SignedInIdentity::new(1, Roles::single(Role::User));
        assert_eq!(validate_signed_in(Some(ok.clone())).unwrap(), ok);

        assert_eq!(validate_signed_in(None), Err(DomainError::InvalidCredentials));
        assert_eq!(
            validate_signed_in(Some(SignedInIdentity::new(0, Roles::single(Role::User)))),
            Err(DomainError::InvalidCredentials)
        );
        assert_eq!(
            validate_signed_in(Some(SignedInIdentity::new(5, Roles::new()))),
            Err(DomainError::InvalidCredentials)
        );
    }

    #[test]
    fn test_add_user_valid() {
        assert!(validate_add_user(&valid_add()).is_ok());
    }

    #[test]
    fn test_add_user_rejects_bad_login() {
        let mut model = valid_add();
        model.login = "al".to_string();
        assert!(validate_add_user(&model).is_err());

        model.login = "alice smith".to_string();
        assert!(validate_add_user(&model).is_err());
    }

    #[test]
    fn test_add_user_rejects_bad_email() {
        let mut model = valid_add();
        model.email = "not-an-email".to_string();
        let err = validate_add_user(&model).unwrap_err();
        assert_eq!(err, DomainError::validation("Invalid email format"));
    }

    #[test]
    fn test_add_user_name_length_bounds() {
        let mut model = valid_add();
        model.name = "a".repeat(MAX_NAME_LENGTH as usize);
        assert!(validate_add_user(&model).is_ok());

        model.name.push('a');
        let err = validate_add_user(&model).unwrap_err();
        assert_eq!(err, DomainError::validation("Name is required"));
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("Passw0rd!").is_ok());
        assert!(validate_password_strength("Pa0").is_err());
        assert!(validate_password_strength("12345678").is_err());
        assert!(validate_password_strength("Password").is_err());
    }

    #[test]
    fn test_add_user_requires_roles() {
        let model = valid_add().with_roles(Roles::new());
        let err = validate_add_user(&model).unwrap_err();
        assert_eq!(err, DomainError::validation("At least one role is required"));
    }

    #[test]
    fn test_update_user_requires_positive_id() {
        let model = UpdateUserModel {
            user_id: 0,
            name: "Alice".to_string(),
            surname: "Liddell".to_string(),
            email: "alice@example.com".to_string(),
            roles: Roles::single(Role::User),
            status: UserStatus::Active,
        };
        let err = validate_update_user(&model).unwrap_err();
        assert_eq!(err, DomainError::validation("User id must be positive"));
    }
}
