//! Identity, permission and access-decision module

pub mod guard;
pub mod provider;
pub mod registry;
pub mod user;

// Re-export main components
pub use guard::{evaluate, Decision, DenyReason, Requirement};
pub use provider::{CredentialVerifier, FixtureDirectory, IdentitySource, SharedSecretVerifier};
pub use registry::{permissions_for, roles_for_route, routes_for};
pub use user::{Identity, IdentityUpdate, Permission, UserRole};
