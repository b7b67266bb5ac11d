//! Authentication: passwords, roles and session tokens.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Password verification and length policy
//! - User role definitions
//! - Opaque session token generation and hashing

mod password;
pub mod session;

pub use password::{
    MIN_PASSWORD_LEN, PasswordError, check_password_policy, hash_password, verify_password,
};
pub use session::{SessionToken, hash_token};

use serde::{Deserialize, Serialize};

/// User roles within a company.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    /// Manages users and company settings in addition to everything else.
    Admin,
    /// Manages catalog, customers, templates and quotes.
    #[default]
    User,
}

impl UserRole {
    /// Returns the string representation stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }

    /// Parses a role, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Self::Admin),
            "USER" => Some(Self::User),
            _ => None,
        }
    }

    /// Returns true if this role can create, edit and delete users.
    #[must_use]
    pub const fn can_manage_users(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns true if this role can modify company settings.
    #[must_use]
    pub const fn can_modify_settings(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permissions() {
        assert!(UserRole::Admin.can_manage_users());
        assert!(UserRole::Admin.can_modify_settings());
        assert!(!UserRole::User.can_manage_users());
        assert!(!UserRole::User.can_modify_settings());
    }

    #[test]
    fn test_role_parse_roundtrip() {
        assert_eq!(UserRole::parse("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("USER"), Some(UserRole::User));
        assert_eq!(UserRole::parse("owner"), None);
        assert_eq!(UserRole::Admin.to_string(), "ADMIN");
        assert_eq!(
            serde_json::to_string(&UserRole::User).unwrap(),
            "\"USER\""
        );
    }
}
