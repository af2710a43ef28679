// Background session refresh for active users

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::activity::ActivityTracker;
use super::service::AuthService;
use crate::error::Result;

/// Periodically refreshes the session while the user is active
pub struct SessionKeeper {
    service: Arc<dyn AuthService>,
    tracker: ActivityTracker,

    /// Time between checks
    interval: std::time::Duration,

    /// How recent the last activity must be for a refresh
    window: Duration,
}

impl SessionKeeper {
    pub fn new(
        service: Arc<dyn AuthService>,
        tracker: ActivityTracker,
        interval: std::time::Duration,
        window: Duration,
    ) -> Self {
        Self {
            service,
            tracker,
            interval,
            window,
        }
    }

    /// One check: refresh only if the user was active within the window.
    /// Returns whether a refresh was performed.
    pub async fn check_and_refresh(&self, now: DateTime<Utc>) -> Result<bool> {
        if !self.tracker.was_active_within(self.window, now) {
            tracing::debug!(
                last_activity = %self.tracker.last_activity().to_rfc3339(),
                "User idle, skipping session refresh"
            );
            return Ok(false);
        }

        self.service.refresh_session().await?;
        Ok(true)
    }

    /// Run checks on a fixed interval until the task is aborted
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match self.check_and_refresh(Utc::now()).await {
                    Ok(true) => tracing::debug!("Session refreshed"),
                    Ok(false) => {}
                    Err(e) => tracing::warn!("Session refresh failed: {}", e),
                }
            }
        })
    }
}
