//! Static role tables
//!
//! Every role maps to a fixed list of resource permissions and a fixed list of
//! route names. The tables are built from constant data on each call and are
//! never mutated at runtime.

use crate::auth::user::{Permission, UserRole};

const CRUD: &[&str] = &["create", "read", "update", "delete"];
const CRU: &[&str] = &["create", "read", "update"];
const CR: &[&str] = &["create", "read"];
const RU: &[&str] = &["read", "update"];
const R: &[&str] = &["read"];

const ADMIN_ROUTES: &[&str] = &[
    "dashboard",
    "patients",
    "patient-details",
    "emr",
    "appointments",
    "beds",
    "vital-signs",
    "nursing-notes",
    "care-plans",
    "discharge-summaries",
    "diagnostics",
    "users",
    "reports",
    "settings",
    "profile",
];

const DOCTOR_ROUTES: &[&str] = &[
    "dashboard",
    "patients",
    "patient-details",
    "emr",
    "appointments",
    "vital-signs",
    "care-plans",
    "discharge-summaries",
    "diagnostics",
    "reports",
    "profile",
];

const NURSE_ROUTES: &[&str] = &[
    "dashboard",
    "patients",
    "patient-details",
    "beds",
    "vital-signs",
    "nursing-notes",
    "care-plans",
    "profile",
];

const RECEPTIONIST_ROUTES: &[&str] = &[
    "dashboard",
    "patients",
    "appointments",
    "beds",
    "profile",
];

const DIAGNOSTICIAN_ROUTES: &[&str] = &[
    "dashboard",
    "patients",
    "patient-details",
    "diagnostics",
    "reports",
    "profile",
];

impl UserRole {
    /// Returns the permissions associated with this role
    pub fn permissions(&self) -> Vec<Permission> {
        match self {
            UserRole::Admin => vec![
                Permission::new("users", CRUD),
                Permission::new("patients", CRUD),
                Permission::new("emr", CRUD),
                Permission::new("appointments", CRUD),
                Permission::new("beds", CRUD),
                Permission::new("vital-signs", CRUD),
                Permission::new("reports", CRUD),
                Permission::new("settings", RU),
            ],
            UserRole::Doctor => vec![
                Permission::new("patients", CRU),
                Permission::new("emr", CRU),
                Permission::new("appointments", CRU),
                Permission::new("vital-signs", R),
                Permission::new("care-plans", CRU),
                Permission::new("discharge-summaries", CRU),
                Permission::new("diagnostics", CR),
                Permission::new("reports", R),
            ],
            UserRole::Nurse => vec![
                Permission::new("patients", RU),
                Permission::new("vital-signs", CRU),
                Permission::new("nursing-notes", CRU),
                Permission::new("care-plans", RU),
                Permission::new("beds", RU),
            ],
            UserRole::Receptionist => vec![
                Permission::new("patients", CRU),
                Permission::new("appointments", CRUD),
                Permission::new("beds", R),
            ],
            UserRole::Diagnostician => vec![
                Permission::new("patients", R),
                Permission::new("diagnostics", CRU),
                Permission::new("reports", CR),
            ],
        }
    }

    /// Returns the route names this role may open
    pub fn routes(&self) -> &'static [&'static str] {
        match self {
            UserRole::Admin => ADMIN_ROUTES,
            UserRole::Doctor => DOCTOR_ROUTES,
            UserRole::Nurse => NURSE_ROUTES,
            UserRole::Receptionist => RECEPTIONIST_ROUTES,
            UserRole::Diagnostician => DIAGNOSTICIAN_ROUTES,
        }
    }

    /// Check if this role's table grants `action` on `resource`
    pub fn has_permission(&self, resource: &str, action: &str) -> bool {
        self.permissions()
            .iter()
            .any(|p| p.resource == resource && p.allows(action))
    }

    pub fn can_access_route(&self, route: &str) -> bool {
        self.routes().contains(&route)
    }
}

pub fn permissions_for(role: UserRole) -> Vec<Permission> {
    role.permissions()
}

pub fn routes_for(role: UserRole) -> &'static [&'static str] {
    role.routes()
}

/// Roles whose route table contains `route`; empty for unknown routes
pub fn roles_for_route(route: &str) -> Vec<UserRole> {
    UserRole::all()
        .into_iter()
        .filter(|role| role.can_access_route(route))
        .collect()
}
