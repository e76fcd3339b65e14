//! Time sources and pure session-expiry queries

use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, PoisonError};

/// Source of the current wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Session lifetime and the two trailing thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub timeout: Duration,
    pub warning: Duration,
    pub refresh: Duration,
}

impl SessionPolicy {
    /// Out-of-range minute counts saturate instead of panicking
    pub fn from_minutes(timeout: i64, warning: i64, refresh: i64) -> Self {
        let minutes = |m: i64| Duration::try_minutes(m).unwrap_or(Duration::MAX);
        Self {
            timeout: minutes(timeout),
            warning: minutes(warning),
            refresh: minutes(refresh),
        }
    }
}

/// A single nullable expiry instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionClock {
    expires_at: Option<DateTime<Utc>>,
}

impl SessionClock {
    pub fn new(expires_at: Option<DateTime<Utc>>) -> Self {
        Self { expires_at }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Time left before expiry, clamped at zero; `None` when there is no session
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at
            .map(|expires_at| (expires_at - now).max(Duration::zero()))
    }

    pub fn remaining_millis(&self, now: DateTime<Utc>) -> Option<i64> {
        self.remaining(now).map(|r| r.num_milliseconds())
    }

    /// Whole minutes left, rounded down
    pub fn remaining_minutes(&self, now: DateTime<Utc>) -> Option<i64> {
        self.remaining(now).map(|r| r.num_minutes())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if now >= expires_at)
    }

    /// `0 < remaining <= warning`
    pub fn is_in_warning_window(&self, now: DateTime<Utc>, warning: Duration) -> bool {
        match self.remaining(now) {
            Some(remaining) => remaining > Duration::zero() && remaining <= warning,
            None => false,
        }
    }

    /// `warning < remaining <= refresh`; the band above the warning window
    pub fn is_in_refresh_window(
        &self,
        now: DateTime<Utc>,
        refresh: Duration,
        warning: Duration,
    ) -> bool {
        match self.remaining(now) {
            Some(remaining) => remaining <= refresh && remaining > warning,
            None => false,
        }
    }
}
