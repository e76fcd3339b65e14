//! Abstract storage interface for the persisted auth record
//!
//! Storage is a best-effort cache, never the source of truth: callers log
//! failures and fall back to the signed-out state.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::user::Identity;
use crate::error::Result;

/// Record written under the application namespace key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedAuth {
    pub identity: Option<Identity>,
    pub is_authenticated: bool,
    /// Epoch milliseconds
    pub session_expiry: Option<i64>,
}

impl PersistedAuth {
    pub fn signed_out() -> Self {
        Self {
            identity: None,
            is_authenticated: false,
            session_expiry: None,
        }
    }

    pub fn signed_in(identity: Identity, expires_at: DateTime<Utc>) -> Self {
        Self {
            identity: Some(identity),
            is_authenticated: true,
            session_expiry: Some(expires_at.timestamp_millis()),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.session_expiry
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
    }

    /// The identity and expiry, if this record describes a session alive at `now`
    pub fn live_session(self, now: DateTime<Utc>) -> Option<(Identity, DateTime<Utc>)> {
        if !self.is_authenticated {
            return None;
        }
        let expires_at = self.expires_at()?;
        if now >= expires_at {
            return None;
        }
        self.identity.map(|identity| (identity, expires_at))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Local durable key/value storage
pub trait StateStorage: Send + Sync {
    /// Read the value under `key`, `None` if absent
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value
    fn save(&self, key: &str, value: &str) -> Result<()>;
}
