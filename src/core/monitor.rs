//! Periodic session supervision
//!
//! The monitor polls the store on a fixed interval: it signs out expired
//! sessions, silently extends sessions in the refresh band, and publishes the
//! expiry warning banner while the session is inside the warning band.

use log::{debug, info};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::store::AuthStore;

/// Warning state shown to the user before the session ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningBanner {
    pub visible: bool,
    pub minutes_remaining: i64,
}

impl WarningBanner {
    pub fn hidden() -> Self {
        Self::default()
    }

    pub fn showing(minutes_remaining: i64) -> Self {
        Self {
            visible: true,
            minutes_remaining,
        }
    }
}

/// What a single poll did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    SignedOut,
    Active,
    Refreshed,
    Warning { minutes_remaining: i64 },
    Expired,
}

/// State shared with the polling task. Holds no reference back to the task,
/// so dropping the monitor is enough to release everything.
struct MonitorCore {
    store: Arc<AuthStore>,
    banner: watch::Sender<WarningBanner>,
}

impl MonitorCore {
    fn set_banner(&self, next: WarningBanner) {
        self.banner.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    fn tick(&self) -> TickOutcome {
        let now = self.store.now();
        let clock = self.store.session_clock();
        let policy = self.store.policy();

        let outcome = match clock.remaining(now) {
            None => TickOutcome::SignedOut,
            Some(remaining) if remaining <= chrono::Duration::zero() => {
                self.store.check_session_at(now);
                TickOutcome::Expired
            }
            Some(_) if clock.is_in_refresh_window(now, policy.refresh, policy.warning) => {
                self.store.refresh_session();
                TickOutcome::Refreshed
            }
            Some(remaining) if clock.is_in_warning_window(now, policy.warning) => {
                TickOutcome::Warning {
                    minutes_remaining: remaining.num_minutes(),
                }
            }
            Some(_) => TickOutcome::Active,
        };

        match outcome {
            TickOutcome::Warning { minutes_remaining } => {
                self.set_banner(WarningBanner::showing(minutes_remaining))
            }
            _ => self.set_banner(WarningBanner::hidden()),
        }

        debug!("Session monitor tick: {:?}", outcome);
        outcome
    }
}

pub struct SessionMonitor {
    core: Arc<MonitorCore>,
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionMonitor {
    pub fn new(store: Arc<AuthStore>, interval: Duration) -> Self {
        let (banner, _) = watch::channel(WarningBanner::hidden());
        Self {
            core: Arc::new(MonitorCore { store, banner }),
            interval,
            task: Mutex::new(None),
        }
    }

    /// Start polling: once immediately, then every interval.
    ///
    /// Must be called from within a tokio runtime. Starting an already running
    /// monitor replaces its task rather than adding a second one.
    pub fn start(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = task.take() {
            previous.abort();
        }

        let core = Arc::clone(&self.core);
        let period = self.interval;
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                core.tick();
            }
        }));
        info!("Session monitor started ({:?} interval)", period);
    }

    /// Stop polling and hide the banner. Safe to call when not running.
    pub fn stop(&self) {
        let previous = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(previous) = previous {
            previous.abort();
            info!("Session monitor stopped");
        }
        self.core.set_banner(WarningBanner::hidden());
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Run one poll now, outside the timer
    pub fn tick(&self) -> TickOutcome {
        self.core.tick()
    }

    pub fn banner(&self) -> WarningBanner {
        *self.core.banner.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<WarningBanner> {
        self.core.banner.subscribe()
    }

    /// "Extend" from the warning banner
    pub fn extend(&self) {
        self.core.store.refresh_session();
        self.core.set_banner(WarningBanner::hidden());
    }

    /// "Log out now" from the warning banner
    pub fn logout_now(&self) {
        self.core.store.logout();
        self.core.set_banner(WarningBanner::hidden());
    }
}

impl Drop for SessionMonitor {
    fn drop(&mut self) {
        let task = self
            .task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }
}
