//! Request-time access decisions
//!
//! `evaluate` is a pure function over the current identity. Denials are values,
//! never errors, so the presentation layer can map each reason to a message.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::registry::roles_for_route;
use crate::auth::user::{Identity, UserRole};

/// What a caller needs before it may proceed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Requirement {
    None,
    AnyRole { roles: Vec<UserRole> },
    Permission { resource: String, action: String },
    Route { route: String },
}

impl Requirement {
    pub fn any_role(roles: &[UserRole]) -> Self {
        Requirement::AnyRole { roles: roles.to_vec() }
    }

    pub fn permission(resource: &str, action: &str) -> Self {
        Requirement::Permission {
            resource: resource.to_string(),
            action: action.to_string(),
        }
    }

    pub fn route(route: &str) -> Self {
        Requirement::Route { route: route.to_string() }
    }
}

/// Why access was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenyReason {
    Unauthenticated,
    /// Also used for routes, carrying the roles whose table lists the route
    WrongRole { required: Vec<UserRole> },
    MissingPermission { resource: String, action: String },
    InactiveAccount,
}

impl DenyReason {
    /// Machine-readable reason code
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::WrongRole { .. } => "wrong_role",
            DenyReason::MissingPermission { .. } => "missing_permission",
            DenyReason::InactiveAccount => "inactive_account",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::Unauthenticated => write!(f, "Please sign in to continue"),
            DenyReason::WrongRole { required } if required.is_empty() => {
                write!(f, "This page is not available to your role")
            }
            DenyReason::WrongRole { required } => {
                let roles: Vec<&str> = required.iter().map(|r| r.as_str()).collect();
                write!(f, "This page requires one of the following roles: {}", roles.join(", "))
            }
            DenyReason::MissingPermission { resource, action } => {
                write!(f, "You do not have permission to {} {}", action, resource)
            }
            DenyReason::InactiveAccount => write!(
                f,
                "Your account has been deactivated. Please contact an administrator"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn reason(&self) -> Option<&DenyReason> {
        match self {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(reason),
        }
    }
}

/// Decide whether `identity` satisfies `requirement`.
///
/// First match wins: authentication, then role, then permission, then the
/// active-account gate, which overrides an otherwise allowed outcome.
pub fn evaluate(
    identity: Option<&Identity>,
    is_authenticated: bool,
    requirement: &Requirement,
) -> Decision {
    let identity = match identity {
        Some(identity) if is_authenticated => identity,
        _ => return Decision::Deny(DenyReason::Unauthenticated),
    };

    match requirement {
        Requirement::None => {}
        Requirement::AnyRole { roles } => {
            if !roles.contains(&identity.role) {
                return Decision::Deny(DenyReason::WrongRole {
                    required: roles.clone(),
                });
            }
        }
        Requirement::Permission { resource, action } => {
            if !identity.has_permission(resource, action) {
                return Decision::Deny(DenyReason::MissingPermission {
                    resource: resource.clone(),
                    action: action.clone(),
                });
            }
        }
        Requirement::Route { route } => {
            if !identity.role.can_access_route(route) {
                return Decision::Deny(DenyReason::WrongRole {
                    required: roles_for_route(route),
                });
            }
        }
    }

    if !identity.is_active {
        return Decision::Deny(DenyReason::InactiveAccount);
    }

    Decision::Allow
}
