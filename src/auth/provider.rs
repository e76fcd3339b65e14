//! Pluggable identity lookup and credential verification
//!
//! The access core does not provision identities. It only needs a lookup by
//! login id and a verifier that decides whether a credential is acceptable.

use async_trait::async_trait;
use std::time::Duration;

use crate::auth::user::{Identity, UserRole};
use crate::error::Result;

/// Source of known identities
pub trait IdentitySource: Send + Sync {
    /// Find an identity by email (case-insensitive) or by id
    fn find_identity_by_login_id(&self, login_id: &str) -> Option<Identity>;

    /// All known identities
    fn identities(&self) -> Vec<Identity>;
}

/// Trait for credential verifiers
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Decide whether `credential` is valid for `login_id`.
    ///
    /// Called for every attempt, known identifier or not, so unknown users
    /// take the same path as wrong passwords.
    async fn verify(&self, login_id: &str, credential: &str) -> Result<bool>;

    /// Get the verifier name for logging/debugging
    fn verifier_name(&self) -> &'static str;
}

/// Staff directory seeded with fixture identities
pub struct FixtureDirectory {
    identities: Vec<Identity>,
}

impl FixtureDirectory {
    pub fn new(identities: Vec<Identity>) -> Self {
        Self { identities }
    }

    /// Directory holding one account per role plus a deactivated doctor
    pub fn seeded() -> Self {
        Self::new(vec![
            Identity::new("admin-001", "Alex Morgan", "admin@hospital.com", UserRole::Admin)
                .with_department("Administration"),
            Identity::new("doc-001", "Dr. Sarah Chen", "doctor@hospital.com", UserRole::Doctor)
                .with_department("Internal Medicine")
                .with_license("MD-48213"),
            Identity::new("nurse-001", "James Okafor", "nurse@hospital.com", UserRole::Nurse)
                .with_department("Ward 3B")
                .with_license("RN-99120"),
            Identity::new(
                "rec-001",
                "Priya Nair",
                "reception@hospital.com",
                UserRole::Receptionist,
            )
            .with_department("Front Desk"),
            Identity::new(
                "diag-001",
                "Dr. Tomas Varga",
                "diagnostics@hospital.com",
                UserRole::Diagnostician,
            )
            .with_department("Radiology")
            .with_license("MD-51877"),
            Identity::new(
                "doc-002",
                "Dr. Helen Brooks",
                "inactive.doctor@hospital.com",
                UserRole::Doctor,
            )
            .with_department("Cardiology")
            .with_license("MD-30544")
            .deactivated(),
        ])
    }
}

impl IdentitySource for FixtureDirectory {
    fn find_identity_by_login_id(&self, login_id: &str) -> Option<Identity> {
        let login_id = login_id.trim();
        self.identities
            .iter()
            .find(|i| i.email.eq_ignore_ascii_case(login_id) || i.id == login_id)
            .cloned()
    }

    fn identities(&self) -> Vec<Identity> {
        self.identities.clone()
    }
}

/// Mock verifier: one shared credential for every identity
pub struct SharedSecretVerifier {
    credential: String,
    delay: Duration,
}

impl SharedSecretVerifier {
    pub fn new(credential: String) -> Self {
        Self {
            credential,
            delay: Duration::ZERO,
        }
    }

    /// Simulate verification latency
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl CredentialVerifier for SharedSecretVerifier {
    async fn verify(&self, _login_id: &str, credential: &str) -> Result<bool> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(constant_time_eq(credential, &self.credential))
    }

    fn verifier_name(&self) -> &'static str {
        "shared-secret"
    }
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        result |= byte_a ^ byte_b;
    }

    result == 0
}
