//! Access core configuration
//! Handles the tunable session parameters and persistence settings

use crate::constants::{
    DEFAULT_LOGIN_DELAY_MILLIS, DEFAULT_SESSION_POLL_SECONDS, DEFAULT_SESSION_REFRESH_MINUTES,
    DEFAULT_SESSION_TIMEOUT_MINUTES, DEFAULT_SESSION_WARNING_MINUTES, DEFAULT_SHARED_CREDENTIAL,
    DEFAULT_STORAGE_KEY, MAX_SESSION_TIMEOUT_MINUTES,
};
use crate::core::clock::SessionPolicy;
use crate::error::{HmsError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Access core configuration parameters
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Session lifetime granted by login and refresh, in minutes
    pub session_timeout_minutes: i64,
    /// Remaining minutes at which the expiry warning becomes visible
    pub session_warning_minutes: i64,
    /// Remaining minutes at which the session is silently extended
    pub session_refresh_minutes: i64,
    /// How often the session monitor polls
    pub poll_interval: Duration,
    /// Namespace key of the persisted auth record
    pub storage_key: String,
    /// Directory for file-backed persistence; memory only when unset
    pub storage_dir: Option<PathBuf>,
    /// Credential accepted for every known identity
    pub shared_credential: String,
    /// Simulated credential verification latency
    pub login_delay: Duration,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            session_timeout_minutes: DEFAULT_SESSION_TIMEOUT_MINUTES,
            session_warning_minutes: DEFAULT_SESSION_WARNING_MINUTES,
            session_refresh_minutes: DEFAULT_SESSION_REFRESH_MINUTES,
            poll_interval: Duration::from_secs(DEFAULT_SESSION_POLL_SECONDS),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_dir: None,
            shared_credential: DEFAULT_SHARED_CREDENTIAL.to_string(),
            login_delay: Duration::from_millis(DEFAULT_LOGIN_DELAY_MILLIS),
        }
    }
}

impl AccessConfig {
    /// Configuration with no simulated latency, for tests and demos
    pub fn for_testing() -> Self {
        Self {
            login_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Session thresholds derived from this configuration
    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy::from_minutes(
            self.session_timeout_minutes,
            self.session_warning_minutes,
            self.session_refresh_minutes,
        )
    }

    /// Check that the thresholds nest: warning < refresh < timeout
    pub fn validate(&self) -> Result<()> {
        if self.session_warning_minutes <= 0 {
            return Err(HmsError::ConfigError(
                "session warning threshold must be positive".to_string(),
            ));
        }
        if self.session_refresh_minutes <= self.session_warning_minutes {
            return Err(HmsError::ConfigError(format!(
                "session refresh threshold ({} min) must be above the warning threshold ({} min)",
                self.session_refresh_minutes, self.session_warning_minutes
            )));
        }
        if self.session_timeout_minutes <= self.session_refresh_minutes {
            return Err(HmsError::ConfigError(format!(
                "session timeout ({} min) must be above the refresh threshold ({} min)",
                self.session_timeout_minutes, self.session_refresh_minutes
            )));
        }
        if self.session_timeout_minutes > MAX_SESSION_TIMEOUT_MINUTES {
            return Err(HmsError::ConfigError(format!(
                "session timeout ({} min) exceeds the maximum of {} min",
                self.session_timeout_minutes, MAX_SESSION_TIMEOUT_MINUTES
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(HmsError::ConfigError(
                "session poll interval must be non-zero".to_string(),
            ));
        }
        if self.storage_key.trim().is_empty() {
            return Err(HmsError::ConfigError("storage key must not be empty".to_string()));
        }
        if self.shared_credential.is_empty() {
            return Err(HmsError::ConfigError(
                "shared credential must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from environment variables if available
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let session_timeout_minutes = env::var("HMS_SESSION_TIMEOUT_MINUTES")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(defaults.session_timeout_minutes);

        let session_warning_minutes = env::var("HMS_SESSION_WARNING_MINUTES")
            .ok()
            .and_then(|w| w.parse().ok())
            .unwrap_or(defaults.session_warning_minutes);

        let session_refresh_minutes = env::var("HMS_SESSION_REFRESH_MINUTES")
            .ok()
            .and_then(|r| r.parse().ok())
            .unwrap_or(defaults.session_refresh_minutes);

        let poll_secs = env::var("HMS_SESSION_POLL_SECONDS")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_SESSION_POLL_SECONDS);

        let storage_key = env::var("HMS_STORAGE_KEY").unwrap_or(defaults.storage_key);
        let storage_dir = env::var("HMS_STORAGE_DIR").ok().map(PathBuf::from);

        let shared_credential =
            env::var("HMS_SHARED_CREDENTIAL").unwrap_or(defaults.shared_credential);

        let login_delay_millis = env::var("HMS_LOGIN_DELAY_MILLIS")
            .ok()
            .and_then(|d| d.parse().ok())
            .unwrap_or(DEFAULT_LOGIN_DELAY_MILLIS);

        let config = Self {
            session_timeout_minutes,
            session_warning_minutes,
            session_refresh_minutes,
            poll_interval: Duration::from_secs(poll_secs),
            storage_key,
            storage_dir,
            shared_credential,
            login_delay: Duration::from_millis(login_delay_millis),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = AccessConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session_timeout_minutes, 30);
        assert_eq!(config.session_warning_minutes, 5);
        assert_eq!(config.session_refresh_minutes, 10);
    }

    #[test]
    fn test_for_testing_has_no_delay() {
        let config = AccessConfig::for_testing();
        assert!(config.login_delay.is_zero());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_refresh_must_exceed_warning() {
        let config = AccessConfig {
            session_refresh_minutes: 5,
            ..AccessConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("refresh threshold"));
    }

    #[test]
    fn test_timeout_must_exceed_refresh() {
        let config = AccessConfig {
            session_timeout_minutes: 10,
            ..AccessConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_timeout_rejected() {
        for minutes in [MAX_SESSION_TIMEOUT_MINUTES + 1, 1_000_000_000_000, i64::MAX] {
            let config = AccessConfig {
                session_timeout_minutes: minutes,
                ..AccessConfig::for_testing()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("exceeds the maximum"));
        }
    }

    #[test]
    fn test_maximum_timeout_accepted() {
        let config = AccessConfig {
            session_timeout_minutes: MAX_SESSION_TIMEOUT_MINUTES,
            ..AccessConfig::for_testing()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.session_policy().timeout, chrono::Duration::days(7));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let config = AccessConfig {
            poll_interval: Duration::ZERO,
            ..AccessConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_session_policy_matches_minutes() {
        let policy = AccessConfig::default().session_policy();
        assert_eq!(policy.timeout, chrono::Duration::minutes(30));
        assert_eq!(policy.warning, chrono::Duration::minutes(5));
        assert_eq!(policy.refresh, chrono::Duration::minutes(10));
    }
}
