//! Permission gate and user/role resolution for external writes.
//!
//! Only externally sourced writes pass through the [`PermissionGate`].
//! Simulator writes go straight to the variable store. The gate is the
//! only consumer of the [`UserResolver`]; the simulation engine never
//! looks at users or roles.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use plantsim_types::{AccessLevel, Role};

use crate::variable::VariableDefinition;

/// User name and password presented by an external client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// User name.
    pub user: String,
    /// Plain-text password.
    pub password: String,
}

impl Credentials {
    /// Build credentials from borrowed strings.
    pub fn new(user: &str, password: &str) -> Self {
        Self {
            user: user.to_owned(),
            password: password.to_owned(),
        }
    }
}

/// Resolves credentials to the roles they grant.
pub trait UserResolver: Send + Sync {
    /// Return the user's roles, or `None` if the credentials are not valid.
    fn resolve(&self, credentials: &Credentials) -> Option<BTreeSet<Role>>;
}

/// One configured user.
#[derive(Debug, Clone, PartialEq, Eq)]
struct UserEntry {
    password: String,
    roles: BTreeSet<Role>,
}

/// Static in-memory user table.
#[derive(Debug, Clone, Default)]
pub struct UserTable {
    users: BTreeMap<String, UserEntry>,
}

impl UserTable {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            users: BTreeMap::new(),
        }
    }

    /// Add or replace a user.
    pub fn insert(&mut self, user: &str, password: &str, roles: impl IntoIterator<Item = Role>) {
        self.users.insert(
            user.to_owned(),
            UserEntry {
                password: password.to_owned(),
                roles: roles.into_iter().collect(),
            },
        );
    }

    /// Number of configured users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the table has no users.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserResolver for UserTable {
    fn resolve(&self, credentials: &Credentials) -> Option<BTreeSet<Role>> {
        let entry = self.users.get(&credentials.user)?;
        if entry.password != credentials.password {
            return None;
        }
        let mut roles = entry.roles.clone();
        roles.insert(Role::AuthenticatedUser);
        Some(roles)
    }
}

/// Outcome of a permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// The write may proceed.
    Granted,
    /// The write is refused.
    Denied(DenyReason),
}

/// Why the gate refused a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The variable is not externally writable.
    ReadOnly,
    /// Credentials were presented but not accepted.
    BadCredentials,
    /// The caller lacks every role allowed to write.
    MissingRole,
}

impl core::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ReadOnly => f.write_str("variable is read-only"),
            Self::BadCredentials => f.write_str("invalid credentials"),
            Self::MissingRole => f.write_str("missing required role"),
        }
    }
}

/// Decides whether an external write may proceed.
pub trait PermissionGate: Send + Sync {
    /// Check a write of the variable described by `definition` made with
    /// `credentials` (`None` for anonymous clients).
    fn check_write(
        &self,
        credentials: Option<&Credentials>,
        definition: &VariableDefinition,
    ) -> AccessDecision;
}

/// Gate that allows every write to a read-write variable.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionGate for AllowAll {
    fn check_write(
        &self,
        _credentials: Option<&Credentials>,
        definition: &VariableDefinition,
    ) -> AccessDecision {
        match definition.access {
            AccessLevel::ReadOnly => AccessDecision::Denied(DenyReason::ReadOnly),
            AccessLevel::ReadWrite => AccessDecision::Granted,
        }
    }
}

/// Role-based gate backed by a [`UserResolver`].
///
/// A variable with an empty `write_roles` set is writable by anyone,
/// anonymous callers included. Otherwise the caller needs one of the listed
/// roles, or [`Role::Admin`].
#[derive(Clone)]
pub struct RoleGate {
    resolver: Arc<dyn UserResolver>,
}

impl RoleGate {
    /// Create a gate consulting `resolver`.
    pub fn new(resolver: Arc<dyn UserResolver>) -> Self {
        Self { resolver }
    }
}

impl core::fmt::Debug for RoleGate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RoleGate").finish_non_exhaustive()
    }
}

impl PermissionGate for RoleGate {
    fn check_write(
        &self,
        credentials: Option<&Credentials>,
        definition: &VariableDefinition,
    ) -> AccessDecision {
        if definition.access == AccessLevel::ReadOnly {
            return AccessDecision::Denied(DenyReason::ReadOnly);
        }

        let roles = match credentials {
            None => BTreeSet::from([Role::Anonymous]),
            Some(creds) => match self.resolver.resolve(creds) {
                Some(roles) => roles,
                None => return AccessDecision::Denied(DenyReason::BadCredentials),
            },
        };

        if definition.write_roles.is_empty()
            || roles.contains(&Role::Admin)
            || !definition.write_roles.is_disjoint(&roles)
        {
            AccessDecision::Granted
        } else {
            AccessDecision::Denied(DenyReason::MissingRole)
        }
    }
}
