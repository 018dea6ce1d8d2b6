//! Roles and role sets.
//!
//! A user holds a set of roles. The set is persisted as a bitmask and is
//! rendered into tokens as a list of role names, one entry per role.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{ROLE_ADMIN, ROLE_USER};
use crate::error::DomainError;

/// A single role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Every role, in canonical order
    pub const ALL: [Role; 2] = [Role::User, Role::Admin];

    /// Bit used for this role in the stored bitmask
    pub fn bit(self) -> i32 {
        match self {
            Role::User => 1,
            Role::Admin => 2,
        }
    }

    /// Canonical textual form
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => ROLE_USER,
            Role::Admin => ROLE_ADMIN,
        }
    }

    /// Check if this role has admin privileges
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            ROLE_USER => Ok(Role::User),
            ROLE_ADMIN => Ok(Role::Admin),
            other => Err(DomainError::validation(format!("Unknown role: {}", other))),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// Set of distinct roles held by a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roles(BTreeSet<Role>);

impl Roles {
    /// Empty role set
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Role set holding only `role`
    pub fn single(role: Role) -> Self {
        Self(BTreeSet::from([role]))
    }

    /// Decode a stored bitmask. Unknown bits are ignored.
    pub fn from_bits(bits: i32) -> Self {
        Role::ALL
            .into_iter()
            .filter(|role| bits & role.bit() != 0)
            .collect()
    }

    /// Encode as a bitmask for storage
    pub fn bits(&self) -> i32 {
        self.0.iter().fold(0, |acc, role| acc | role.bit())
    }

    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    /// Role names, one per distinct role, in canonical order.
    pub fn names(&self) -> Vec<String> {
        self.iter().map(String::from).collect()
    }

    /// Check if any held role has admin privileges
    pub fn is_admin(&self) -> bool {
        self.iter().any(Role::is_admin)
    }
}

impl FromIterator<Role> for Roles {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Roles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(","))
    }
}

/// Parses a comma-separated list of role names, e.g. `"user,admin"`.
impl FromStr for Roles {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Role::from_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_round_trip() {
        let roles: Roles = [Role::User, Role::Admin].into_iter().collect();
        assert_eq!(roles.bits(), 3);
        assert_eq!(Roles::from_bits(3), roles);
        assert_eq!(Roles::from_bits(2), Roles::single(Role::Admin));
        assert!(Roles::from_bits(0).is_empty());
    }

    #[test]
    fn test_unknown_bits_ignored() {
        assert_eq!(Roles::from_bits(1 | 64), Roles::single(Role::User));
    }

    #[test]
    fn test_names_are_distinct_entries() {
        let mut roles = Roles::single(Role::Admin);
        roles.insert(Role::User);
        roles.insert(Role::Admin);

        assert_eq!(roles.len(), 2);
        assert_eq!(roles.names(), vec!["user".to_string(), "admin".to_string()]);
    }

    #[test]
    fn test_parse_role_list() {
        let roles: Roles = "admin, user".parse().unwrap();
        assert!(roles.contains(Role::User));
        assert!(roles.is_admin());

        assert!("root".parse::<Roles>().is_err());
        assert!("".parse::<Roles>().unwrap().is_empty());
    }

    #[test]
    fn test_serializes_as_list() {
        let roles: Roles = [Role::User, Role::Admin].into_iter().collect();
        let json = serde_json::to_string(&roles).unwrap();
        assert_eq!(json, r#"["user","admin"]"#);
    }
}
