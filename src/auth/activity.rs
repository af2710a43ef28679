// User activity tracking
// Owned replacement for page-level "last activity" state

use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default window in which a user counts as active
pub const DEFAULT_ACTIVITY_WINDOW_SECS: i64 = 5 * 60;

/// Interaction that counts as user activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityEvent {
    Click,
    Touch,
}

/// Shared handle to the last-activity timestamp
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    /// Milliseconds since the Unix epoch
    last_activity_ms: Arc<AtomicI64>,
}

impl ActivityTracker {
    /// A tracker that considers the user active right now
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    pub fn starting_at(at: DateTime<Utc>) -> Self {
        Self {
            last_activity_ms: Arc::new(AtomicI64::new(at.timestamp_millis())),
        }
    }

    pub fn record_activity(&self) {
        self.record_at(Utc::now());
    }

    pub fn record_at(&self, at: DateTime<Utc>) {
        self.last_activity_ms
            .store(at.timestamp_millis(), Ordering::Relaxed);
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        let ms = self.last_activity_ms.load(Ordering::Relaxed);
        DateTime::from_timestamp_millis(ms).unwrap_or_default()
    }

    /// True when the last activity happened strictly less than `window` before `now`
    pub fn was_active_within(&self, window: Duration, now: DateTime<Utc>) -> bool {
        now - self.last_activity() < window
    }

    /// Record every event received on `events` until the sender side closes
    pub fn listen(&self, mut events: mpsc::UnboundedReceiver<ActivityEvent>) -> JoinHandle<()> {
        let tracker = self.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                tracing::trace!(?event, "User activity");
                tracker.record_activity();
            }
            tracing::debug!("Activity event stream closed");
        })
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_within_window() {
        let start = Utc::now();
        let tracker = ActivityTracker::starting_at(start);
        let window = Duration::seconds(DEFAULT_ACTIVITY_WINDOW_SECS);

        assert!(tracker.was_active_within(window, start + Duration::minutes(4)));
        assert!(!tracker.was_active_within(window, start + Duration::minutes(5)));
        assert!(!tracker.was_active_within(window, start + Duration::minutes(10)));
    }

    #[test]
    fn test_record_moves_window() {
        let start = Utc::now() - Duration::hours(1);
        let tracker = ActivityTracker::starting_at(start);
        let window = Duration::minutes(5);
        let now = Utc::now();

        assert!(!tracker.was_active_within(window, now));
        tracker.record_at(now - Duration::minutes(1));
        assert!(tracker.was_active_within(window, now));
    }

    #[test]
    fn test_clones_share_timestamp() {
        let tracker = ActivityTracker::starting_at(Utc::now() - Duration::hours(1));
        let handle = tracker.clone();
        handle.record_activity();
        assert!(tracker.was_active_within(Duration::minutes(1), Utc::now()));
    }

    #[tokio::test]
    async fn test_listen_records_events() {
        let tracker = ActivityTracker::starting_at(Utc::now() - Duration::hours(1));
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tracker.listen(rx);

        tx.send(ActivityEvent::Click).unwrap();
        tx.send(ActivityEvent::Touch).unwrap();
        drop(tx);
        task.await.unwrap();

        assert!(tracker.was_active_within(Duration::minutes(1), Utc::now()));
    }
}
