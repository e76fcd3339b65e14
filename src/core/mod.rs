//! Session lifecycle: clock, auth store and monitor

pub mod clock;
pub mod monitor;
pub mod store;

// Re-export main components for convenience
pub use clock::{Clock, ManualClock, SessionClock, SessionPolicy, SystemClock};
pub use monitor::{SessionMonitor, TickOutcome, WarningBanner};
pub use store::{AuthState, AuthStore, AuthStoreBuilder, Session};
