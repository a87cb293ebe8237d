//! Role-based authorization gate.
//!
//! Role sets are compile-time constants. `RoleSet` has no public constructor, so
//! callers can pick a set but never build or widen one at runtime.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Account role as stored by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Therapist,
    Receptionist,
    Supervisor,
    Hr,
    Patient,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Therapist => "therapist",
            Role::Receptionist => "receptionist",
            Role::Supervisor => "supervisor",
            Role::Hr => "hr",
            Role::Patient => "patient",
            Role::Guest => "guest",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

/// A fixed set of roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet(&'static [Role]);

impl RoleSet {
    /// Anyone working at the clinic.
    pub const STAFF: RoleSet = RoleSet(&[
        Role::Admin,
        Role::Therapist,
        Role::Receptionist,
        Role::Supervisor,
        Role::Hr,
    ]);

    /// Roles allowed near clinical records.
    pub const CLINICAL: RoleSet = RoleSet(&[Role::Admin, Role::Therapist, Role::Supervisor]);

    pub const ADMIN: RoleSet = RoleSet(&[Role::Admin]);

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn roles(&self) -> &'static [Role] {
        self.0
    }
}

/// Authorization failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// No caller identity was presented.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The caller is known but lacks permission.
    #[error("forbidden")]
    Forbidden,
}

/// Return the principal if its role is in `allowed`.
pub fn require_role(
    principal: Option<&Principal>,
    allowed: RoleSet,
) -> Result<&Principal, AccessError> {
    let principal = principal.ok_or(AccessError::Unauthenticated)?;
    if allowed.contains(principal.role) {
        Ok(principal)
    } else {
        Err(AccessError::Forbidden)
    }
}

/// Non-authoritative membership check for display decisions.
pub fn is_in_role_set(role: Option<Role>, set: RoleSet) -> bool {
    role.is_some_and(|r| set.contains(r))
}

/// Only the owner of a record or an admin may touch it.
pub fn require_owner_or_admin(principal: &Principal, owner_id: &str) -> Result<(), AccessError> {
    if principal.role == Role::Admin || principal.id == owner_id {
        Ok(())
    } else {
        Err(AccessError::Forbidden)
    }
}
