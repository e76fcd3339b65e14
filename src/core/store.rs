//! Authenticated-identity state machine
//!
//! One `AuthStore` exists per process and is shared as `Arc<AuthStore>`. Its
//! only mutable state is the `AuthState` value behind a single mutex; every
//! transition writes the persisted record before the lock is released, so the
//! stored copy always matches the last transition.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::auth::guard::{evaluate, Decision, Requirement};
use crate::auth::provider::{
    CredentialVerifier, FixtureDirectory, IdentitySource, SharedSecretVerifier,
};
use crate::auth::registry::permissions_for;
use crate::auth::user::{Identity, IdentityUpdate, UserRole};
use crate::config::AccessConfig;
use crate::core::clock::{Clock, SessionClock, SessionPolicy, SystemClock};
use crate::error::Result;
use crate::storage::{FileStorage, MemoryStorage, PersistedAuth, StateStorage};

/// Proof that an identity is signed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity_id: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    SignedOut,
    SignedIn { identity: Identity, session: Session },
}

impl AuthState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, AuthState::SignedIn { .. })
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::SignedOut => None,
            AuthState::SignedIn { identity, .. } => Some(identity),
        }
    }

    pub fn session_clock(&self) -> SessionClock {
        match self {
            AuthState::SignedOut => SessionClock::new(None),
            AuthState::SignedIn { session, .. } => SessionClock::new(Some(session.expires_at)),
        }
    }

    fn to_persisted(&self) -> PersistedAuth {
        match self {
            AuthState::SignedOut => PersistedAuth::signed_out(),
            AuthState::SignedIn { identity, session } => {
                PersistedAuth::signed_in(identity.clone(), session.expires_at)
            }
        }
    }
}

/// Resets the loading flag when the login attempt ends, however it ends
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct AuthStore {
    policy: SessionPolicy,
    storage_key: String,
    directory: Arc<dyn IdentitySource>,
    verifier: Arc<dyn CredentialVerifier>,
    storage: Arc<dyn StateStorage>,
    clock: Arc<dyn Clock>,
    state: Mutex<AuthState>,
    loading: AtomicBool,
}

impl AuthStore {
    pub fn builder(config: AccessConfig) -> AuthStoreBuilder {
        AuthStoreBuilder::new(config)
    }

    fn lock(&self) -> MutexGuard<'_, AuthState> {
        // The state is always a complete value, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the state and persist it while the lock is held
    fn transition(&self, state: &mut AuthState, next: AuthState) {
        *state = next;
        self.persist(state);
    }

    fn persist(&self, state: &AuthState) {
        let written = state
            .to_persisted()
            .to_json()
            .and_then(|raw| self.storage.save(&self.storage_key, &raw));
        if let Err(e) = written {
            warn!("Failed to persist auth state: {}", e);
        }
    }

    /// Sign in `identifier` with `credential`.
    ///
    /// Returns `false` for an unknown identifier, a rejected credential, a
    /// verifier error, or when another login is still in flight.
    pub async fn login(&self, identifier: &str, credential: &str) -> bool {
        let _loading = match LoadingGuard::acquire(&self.loading) {
            Some(guard) => guard,
            None => {
                warn!("Login ignored: another login attempt is in progress");
                return false;
            }
        };

        let verified = match self.verifier.verify(identifier, credential).await {
            Ok(verified) => verified,
            Err(e) => {
                warn!("{} verifier failed: {}", self.verifier.verifier_name(), e);
                false
            }
        };

        let identity = if verified {
            self.directory.find_identity_by_login_id(identifier)
        } else {
            None
        };

        let mut identity = match identity {
            Some(identity) => identity,
            None => {
                info!("Login failed for {}", identifier);
                return false;
            }
        };

        let now = self.clock.now();
        let expires_at = match now.checked_add_signed(self.policy.timeout) {
            Some(expires_at) => expires_at,
            None => {
                warn!("Session timeout overflows the clock; login for {} refused", identity.id);
                return false;
            }
        };
        identity.permissions = permissions_for(identity.role);
        identity.last_login = Some(now);
        let session = Session {
            identity_id: identity.id.clone(),
            expires_at,
        };

        if !identity.is_active {
            warn!("Inactive account {} signed in; access checks will deny it", identity.id);
        }
        info!(
            "Signed in {} ({}) until {}",
            identity.id, identity.role, session.expires_at
        );

        let mut state = self.lock();
        self.transition(&mut state, AuthState::SignedIn { identity, session });
        true
    }

    /// Sign out from any state
    pub fn logout(&self) {
        let mut state = self.lock();
        if let Some(identity) = state.identity() {
            info!("Signed out {}", identity.id);
        }
        self.transition(&mut state, AuthState::SignedOut);
    }

    /// Extend the session to a full timeout from now; no-op when signed out
    pub fn refresh_session(&self) {
        let now = self.clock.now();
        let mut state = self.lock();
        if let AuthState::SignedIn { session, .. } = &mut *state {
            // Never shorten: expiry is non-decreasing while the session lives
            if let Some(extended) = now.checked_add_signed(self.policy.timeout) {
                session.expires_at = session.expires_at.max(extended);
            }
            debug!("Session for {} extended to {}", session.identity_id, session.expires_at);
            self.persist(&state);
        }
    }

    /// Force sign-out if the session has expired at `now`. Returns whether it did.
    pub fn check_session_at(&self, now: DateTime<Utc>) -> bool {
        let mut state = self.lock();
        if !state.session_clock().is_expired(now) {
            return false;
        }
        if let Some(identity) = state.identity() {
            info!("Session for {} expired; signing out", identity.id);
        }
        self.transition(&mut state, AuthState::SignedOut);
        true
    }

    pub fn check_session(&self) -> bool {
        self.check_session_at(self.clock.now())
    }

    /// Merge profile fields into the signed-in identity; no-op when signed out
    /// or when the update carries no fields
    pub fn update_identity(&self, update: &IdentityUpdate) -> Result<()> {
        update.validate()?;
        if update.is_empty() {
            return Ok(());
        }
        let now = self.clock.now();
        let mut state = self.lock();
        if let AuthState::SignedIn { identity, .. } = &mut *state {
            identity.apply(update, now);
            debug!("Profile updated for {}", identity.id);
            self.persist(&state);
        }
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().is_signed_in()
    }

    /// True while a login attempt is being verified
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.lock().identity().cloned()
    }

    pub fn state(&self) -> AuthState {
        self.lock().clone()
    }

    pub fn session_clock(&self) -> SessionClock {
        self.lock().session_clock()
    }

    pub fn session_expiry(&self) -> Option<DateTime<Utc>> {
        self.session_clock().expires_at()
    }

    /// Whole minutes left in the session, `None` when signed out
    pub fn remaining_session_minutes(&self) -> Option<i64> {
        self.session_clock().remaining_minutes(self.clock.now())
    }

    pub fn authorize(&self, requirement: &Requirement) -> Decision {
        let state = self.lock();
        evaluate(state.identity(), state.is_signed_in(), requirement)
    }

    pub fn has_role(&self, roles: &[UserRole]) -> bool {
        self.authorize(&Requirement::any_role(roles)).is_allowed()
    }

    pub fn has_permission(&self, resource: &str, action: &str) -> bool {
        self.authorize(&Requirement::permission(resource, action)).is_allowed()
    }

    pub fn can_access_route(&self, route: &str) -> bool {
        self.authorize(&Requirement::route(route)).is_allowed()
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Known identities, for login pickers
    pub fn known_identities(&self) -> Vec<Identity> {
        self.directory.identities()
    }
}

/// Assembles an `AuthStore` and restores its persisted state
pub struct AuthStoreBuilder {
    config: AccessConfig,
    directory: Option<Arc<dyn IdentitySource>>,
    verifier: Option<Arc<dyn CredentialVerifier>>,
    storage: Option<Arc<dyn StateStorage>>,
    clock: Option<Arc<dyn Clock>>,
}

impl AuthStoreBuilder {
    pub fn new(config: AccessConfig) -> Self {
        Self {
            config,
            directory: None,
            verifier: None,
            storage: None,
            clock: None,
        }
    }

    pub fn with_directory(mut self, directory: Arc<dyn IdentitySource>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn StateStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    fn default_storage(config: &AccessConfig) -> Arc<dyn StateStorage> {
        match config.storage_dir {
            Some(ref dir) => match FileStorage::open(dir) {
                Ok(storage) => Arc::new(storage),
                Err(e) => {
                    warn!(
                        "Cannot open storage at {}: {}; falling back to memory",
                        dir.display(),
                        e
                    );
                    Arc::new(MemoryStorage::new())
                }
            },
            None => Arc::new(MemoryStorage::new()),
        }
    }

    /// Build the store. The persisted record is resolved before the store is
    /// returned, so an expired session is never observable as signed in.
    pub fn build(self) -> AuthStore {
        let config = self.config;
        let directory: Arc<dyn IdentitySource> = match self.directory {
            Some(directory) => directory,
            None => Arc::new(FixtureDirectory::seeded()),
        };
        let verifier: Arc<dyn CredentialVerifier> = match self.verifier {
            Some(verifier) => verifier,
            None => Arc::new(
                SharedSecretVerifier::new(config.shared_credential.clone())
                    .with_delay(config.login_delay),
            ),
        };
        let storage: Arc<dyn StateStorage> = match self.storage {
            Some(storage) => storage,
            None => Self::default_storage(&config),
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };

        let restored = restore(storage.as_ref(), &config.storage_key, clock.now());

        let store = AuthStore {
            policy: config.session_policy(),
            storage_key: config.storage_key,
            directory,
            verifier,
            storage,
            clock,
            state: Mutex::new(restored),
            loading: AtomicBool::new(false),
        };

        // Rewrite so a stale or unreadable record does not linger
        store.persist(&store.lock());
        store
    }
}

fn restore(storage: &dyn StateStorage, key: &str, now: DateTime<Utc>) -> AuthState {
    let raw = match storage.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return AuthState::SignedOut,
        Err(e) => {
            warn!("Failed to read persisted auth state: {}", e);
            return AuthState::SignedOut;
        }
    };

    let record = match PersistedAuth::from_json(&raw) {
        Ok(record) => record,
        Err(e) => {
            warn!("Discarding unreadable persisted auth state: {}", e);
            return AuthState::SignedOut;
        }
    };

    match record.live_session(now) {
        Some((mut identity, expires_at)) => {
            // Permissions come from the role table, never from the stored copy
            identity.permissions = permissions_for(identity.role);
            info!("Restored session for {} until {}", identity.id, expires_at);
            let session = Session {
                identity_id: identity.id.clone(),
                expires_at,
            };
            AuthState::SignedIn { identity, session }
        }
        None => {
            debug!("No live session in persisted auth state");
            AuthState::SignedOut
        }
    }
}
