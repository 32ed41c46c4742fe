//! Authentication types for the domain layer.
//!
//! Sessions are owned by an upstream identity gateway. By the time a request
//! reaches us the caller has been verified and is described by an
//! [`AuthenticatedUser`]; the HTTP adapter builds one from forwarded headers.

use super::UserId;
use thiserror::Error;

/// Role granted by the identity gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    /// Parses the forwarded role claim. Anything unrecognised is a customer.
    pub fn from_claim(claim: &str) -> Self {
        if claim.trim().eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Customer
        }
    }
}

/// A verified caller.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: UserId,

    /// Email from the identity claims, if the gateway forwarded one.
    pub email: Option<String>,

    pub role: Role,
}

impl AuthenticatedUser {
    pub fn new(id: UserId, email: Option<String>, role: Role) -> Self {
        Self { id, email, role }
    }

    pub fn customer(id: UserId) -> Self {
        Self::new(id, None, Role::Customer)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Returns an error unless the caller holds the admin role.
    pub fn require_admin(&self) -> Result<(), AuthError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AuthError::InsufficientPermissions)
        }
    }
}

/// Authentication errors raised while identifying the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingIdentity,

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Insufficient permissions")]
    InsufficientPermissions,
}
