//! Foreground/background tracking driven by screen lifecycle events.

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, error};

use crate::types::ScreenKey;

/// Point-in-time view of application visibility.
///
/// Both fields come from the same lock acquisition, so they always agree:
/// `is_background` is true exactly when `active_screen` is `None`. A
/// foreground snapshot therefore always names an active screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilitySnapshot {
    pub is_background: bool,
    pub active_screen: Option<ScreenKey>,
}

/// Outcome of [`AppVisibilityTracker::on_screen_stopped`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenStop {
    /// The screen was not started; nothing changed.
    NotStarted,
    /// Other instances of the same screen are still started.
    InstancesRemaining(usize),
    /// The last instance stopped.
    Stopped,
}

#[derive(Debug, Default)]
struct VisibilityState {
    /// Started screens with their live instance counts, least recently
    /// started first.
    started: Vec<(ScreenKey, usize)>,
    active: Option<ScreenKey>,
}

impl VisibilityState {
    fn instances(&self) -> usize {
        self.started.iter().map(|(_, count)| count).sum()
    }
}

/// Tracks which screens are started and which one is active.
///
/// The same screen key may be started more than once (two instances of one
/// screen stacked on each other); it stays started until every instance has
/// stopped. Safe to call from any thread.
#[derive(Debug, Default)]
pub struct AppVisibilityTracker {
    state: Mutex<VisibilityState>,
}

impl AppVisibilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VisibilityState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!(event = "core.visibility.lock_poisoned");
                poisoned.into_inner()
            }
        }
    }

    /// Record one more started instance of `screen` and make it active.
    pub fn on_screen_started(&self, screen: &ScreenKey) {
        let mut state = self.lock();
        let count = match state.started.iter().position(|(s, _)| s == screen) {
            Some(index) => state.started.remove(index).1 + 1,
            None => 1,
        };
        state.started.push((screen.clone(), count));
        state.active = Some(screen.clone());

        debug!(
            event = "core.visibility.screen_started",
            screen = %screen,
            instances = count,
            started_count = state.started.len()
        );
    }

    /// Record that one instance of `screen` stopped.
    ///
    /// Once its last instance stops, the screen is forgotten. If it was the
    /// active screen, the most recently started remaining screen takes over;
    /// with none left the app is backgrounded.
    pub fn on_screen_stopped(&self, screen: &ScreenKey) -> ScreenStop {
        let mut state = self.lock();
        let Some(index) = state.started.iter().position(|(s, _)| s == screen) else {
            debug!(event = "core.visibility.stop_ignored", screen = %screen);
            return ScreenStop::NotStarted;
        };

        let remaining = state.started[index].1 - 1;
        let outcome = if remaining > 0 {
            state.started[index].1 = remaining;
            ScreenStop::InstancesRemaining(remaining)
        } else {
            state.started.remove(index);
            if state.active.as_ref() == Some(screen) {
                state.active = state.started.last().map(|(s, _)| s.clone());
            }
            ScreenStop::Stopped
        };

        debug!(
            event = "core.visibility.screen_stopped",
            screen = %screen,
            instances = remaining,
            started_count = state.started.len(),
            is_background = state.started.is_empty()
        );
        outcome
    }

    pub fn is_background(&self) -> bool {
        self.lock().started.is_empty()
    }

    pub fn active_screen(&self) -> Option<ScreenKey> {
        self.lock().active.clone()
    }

    pub fn snapshot(&self) -> VisibilitySnapshot {
        let state = self.lock();
        VisibilitySnapshot {
            is_background: state.started.is_empty(),
            active_screen: state.active.clone(),
        }
    }

    /// Number of distinct started screens.
    pub fn started_count(&self) -> usize {
        self.lock().started.len()
    }

    /// Number of started screen instances, counting repeats of one key.
    pub fn instance_count(&self) -> usize {
        self.lock().instances()
    }

    /// Forget all started screens.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.started.clear();
        state.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn key(s: &str) -> ScreenKey {
        ScreenKey::new(s)
    }

    #[test]
    fn test_starts_in_background() {
        let tracker = AppVisibilityTracker::new();
        assert!(tracker.is_background());
        assert_eq!(tracker.active_screen(), None);
    }

    #[test]
    fn test_start_then_stop() {
        let tracker = AppVisibilityTracker::new();
        tracker.on_screen_started(&key("main"));
        assert!(!tracker.is_background());
        assert_eq!(tracker.active_screen(), Some(key("main")));

        assert_eq!(tracker.on_screen_stopped(&key("main")), ScreenStop::Stopped);
        assert!(tracker.is_background());
        assert_eq!(tracker.active_screen(), None);
    }

    #[test]
    fn test_transition_keeps_foreground() {
        let tracker = AppVisibilityTracker::new();
        tracker.on_screen_started(&key("list"));
        tracker.on_screen_started(&key("detail"));
        tracker.on_screen_stopped(&key("list"));

        assert!(!tracker.is_background());
        assert_eq!(tracker.active_screen(), Some(key("detail")));
    }

    #[test]
    fn test_active_falls_back_to_latest_remaining() {
        let tracker = AppVisibilityTracker::new();
        tracker.on_screen_started(&key("a"));
        tracker.on_screen_started(&key("b"));
        tracker.on_screen_started(&key("c"));
        tracker.on_screen_stopped(&key("c"));

        assert_eq!(tracker.active_screen(), Some(key("b")));
    }

    #[test]
    fn test_second_instance_keeps_screen_started() {
        let tracker = AppVisibilityTracker::new();
        tracker.on_screen_started(&key("detail"));
        tracker.on_screen_started(&key("detail"));
        assert_eq!(tracker.started_count(), 1);
        assert_eq!(tracker.instance_count(), 2);

        assert_eq!(
            tracker.on_screen_stopped(&key("detail")),
            ScreenStop::InstancesRemaining(1)
        );
        assert!(!tracker.is_background());
        assert_eq!(tracker.active_screen(), Some(key("detail")));

        assert_eq!(tracker.on_screen_stopped(&key("detail")), ScreenStop::Stopped);
        assert!(tracker.is_background());
        assert_eq!(tracker.active_screen(), None);
    }

    #[test]
    fn test_restart_moves_screen_to_front() {
        let tracker = AppVisibilityTracker::new();
        tracker.on_screen_started(&key("a"));
        tracker.on_screen_started(&key("b"));
        tracker.on_screen_started(&key("a"));
        assert_eq!(tracker.started_count(), 2);
        assert_eq!(tracker.active_screen(), Some(key("a")));

        // One instance of "a" is still started, so it stays active.
        tracker.on_screen_stopped(&key("a"));
        assert_eq!(tracker.active_screen(), Some(key("a")));

        tracker.on_screen_stopped(&key("a"));
        assert_eq!(tracker.active_screen(), Some(key("b")));
    }

    #[test]
    fn test_stop_unknown_screen_is_noop() {
        let tracker = AppVisibilityTracker::new();
        tracker.on_screen_started(&key("a"));
        assert_eq!(
            tracker.on_screen_stopped(&key("ghost")),
            ScreenStop::NotStarted
        );
        assert_eq!(tracker.active_screen(), Some(key("a")));
    }

    #[test]
    fn test_background_iff_no_started_screens() {
        // Deterministic pseudo-random start/stop sequence over a few screens,
        // including repeated starts of the same key.
        let tracker = AppVisibilityTracker::new();
        let screens = ["a", "b", "c", "d"];
        let mut started: std::collections::HashMap<&str, usize> = Default::default();
        let mut seed: u32 = 7;

        for _ in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let screen = screens[(seed >> 16) as usize % screens.len()];
            if (seed >> 8) % 2 == 0 {
                tracker.on_screen_started(&key(screen));
                *started.entry(screen).or_default() += 1;
            } else {
                tracker.on_screen_stopped(&key(screen));
                if let Some(count) = started.get_mut(screen) {
                    *count -= 1;
                    if *count == 0 {
                        started.remove(screen);
                    }
                }
            }

            let snapshot = tracker.snapshot();
            assert_eq!(snapshot.is_background, started.is_empty());
            assert_eq!(snapshot.active_screen.is_none(), started.is_empty());
            assert_eq!(tracker.instance_count(), started.values().sum::<usize>());
            if let Some(active) = &snapshot.active_screen {
                assert!(started.contains_key(active.as_str()));
            }
        }
    }

    #[test]
    fn test_snapshot_never_torn_under_concurrency() {
        let tracker = Arc::new(AppVisibilityTracker::new());

        let writers: Vec<_> = (0..4)
            .map(|i| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    let screen = key(&format!("screen-{i}"));
                    for _ in 0..1_000 {
                        tracker.on_screen_started(&screen);
                        tracker.on_screen_stopped(&screen);
                    }
                })
            })
            .collect();

        for _ in 0..5_000 {
            let snapshot = tracker.snapshot();
            assert_eq!(snapshot.is_background, snapshot.active_screen.is_none());
        }

        for writer in writers {
            writer.join().unwrap();
        }
        assert!(tracker.is_background());
    }

    #[test]
    fn test_reset_backgrounds_app() {
        let tracker = AppVisibilityTracker::new();
        tracker.on_screen_started(&key("a"));
        tracker.reset();
        assert!(tracker.is_background());
        assert_eq!(tracker.started_count(), 0);
    }
}
