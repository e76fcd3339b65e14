// Session lifecycle defaults
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: i64 = 30;
pub const DEFAULT_SESSION_WARNING_MINUTES: i64 = 5;
pub const DEFAULT_SESSION_REFRESH_MINUTES: i64 = 10;
pub const DEFAULT_SESSION_POLL_SECONDS: u64 = 30;
pub const MAX_SESSION_TIMEOUT_MINUTES: i64 = 7 * 24 * 60;

// Persisted state
pub const DEFAULT_STORAGE_KEY: &str = "hms-auth-storage";

// Mock login: every known identity accepts the same credential
pub const DEFAULT_SHARED_CREDENTIAL: &str = "password123";
pub const DEFAULT_LOGIN_DELAY_MILLIS: u64 = 1000;
