use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{HmsError, Result};

/// Hospital job functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Doctor,
    Nurse,
    Receptionist,
    Diagnostician,
}

impl UserRole {
    /// Every defined role, in a stable order
    pub fn all() -> [UserRole; 5] {
        [
            UserRole::Admin,
            UserRole::Doctor,
            UserRole::Nurse,
            UserRole::Receptionist,
            UserRole::Diagnostician,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Doctor => "doctor",
            UserRole::Nurse => "nurse",
            UserRole::Receptionist => "receptionist",
            UserRole::Diagnostician => "diagnostician",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = HmsError;

    fn from_str(s: &str) -> Result<Self> {
        UserRole::all()
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| HmsError::ValidationError(format!("unknown role: {}", s)))
    }
}

/// Actions granted on a single resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub resource: String,
    pub actions: BTreeSet<String>,
}

impl Permission {
    pub fn new(resource: &str, actions: &[&str]) -> Self {
        Self {
            resource: resource.to_string(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn allows(&self, action: &str) -> bool {
        self.actions.contains(action)
    }
}

/// A staff member known to the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Creates an active identity with no permissions attached yet
    pub fn new(id: &str, display_name: &str, email: &str, role: UserRole) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            role,
            department: None,
            license_number: None,
            is_active: true,
            permissions: Vec::new(),
            last_login: None,
            updated_at: None,
        }
    }

    pub fn with_department(mut self, department: &str) -> Self {
        self.department = Some(department.to_string());
        self
    }

    pub fn with_license(mut self, license_number: &str) -> Self {
        self.license_number = Some(license_number.to_string());
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Check the attached permission entries for `action` on `resource`
    pub fn has_permission(&self, resource: &str, action: &str) -> bool {
        self.permissions
            .iter()
            .any(|p| p.resource == resource && p.allows(action))
    }

    /// Apply a profile update, field by field
    pub fn apply(&mut self, update: &IdentityUpdate, now: DateTime<Utc>) {
        if let Some(ref display_name) = update.display_name {
            self.display_name = display_name.clone();
        }
        if let Some(ref email) = update.email {
            self.email = email.clone();
        }
        if let Some(ref department) = update.department {
            self.department = Some(department.clone());
        }
        if let Some(ref license_number) = update.license_number {
            self.license_number = Some(license_number.clone());
        }
        self.updated_at = Some(now);
    }
}

/// Profile fields a signed-in user may change about themselves.
///
/// Role, permissions and the active flag are deliberately absent: those change
/// only through administrative provisioning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityUpdate {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub license_number: Option<String>,
}

impl IdentityUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.display_name {
            if name.trim().is_empty() {
                return Err(HmsError::ValidationError(
                    "display name must not be empty".to_string(),
                ));
            }
        }
        if let Some(ref email) = self.email {
            let valid = email
                .split_once('@')
                .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
                .unwrap_or(false);
            if !valid {
                return Err(HmsError::ValidationError(format!(
                    "invalid email address: {}",
                    email
                )));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.email.is_none()
            && self.department.is_none()
            && self.license_number.is_none()
    }
}
