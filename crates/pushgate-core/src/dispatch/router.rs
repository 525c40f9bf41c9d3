use std::sync::Arc;

use tracing::debug;

use crate::errors::PushError;
use crate::receivers::BackgroundReceiver;
use crate::registry::RegistrationRegistry;
use crate::types::{Message, RouteOutcome};
use crate::visibility::AppVisibilityTracker;

/// Chooses the UI receiver for a message whose data stage has completed.
#[derive(Clone)]
pub struct UiDispatchRouter {
    visibility: Arc<AppVisibilityTracker>,
    registry: Arc<RegistrationRegistry>,
    background: Arc<dyn BackgroundReceiver>,
    target_key: String,
}

impl UiDispatchRouter {
    pub fn new(
        visibility: Arc<AppVisibilityTracker>,
        registry: Arc<RegistrationRegistry>,
        background: Arc<dyn BackgroundReceiver>,
        target_key: impl Into<String>,
    ) -> Self {
        Self {
            visibility,
            registry,
            background,
            target_key: target_key.into(),
        }
    }

    /// Deliver `message` to exactly one UI receiver.
    ///
    /// Visibility is read once; a screen stopping mid-route does not change
    /// the decision. Must only be called after the data stage for the same
    /// message has completed successfully.
    pub fn route(&self, message: &Message) -> Result<RouteOutcome, PushError> {
        let snapshot = self.visibility.snapshot();

        if snapshot.is_background {
            debug!(
                event = "core.dispatch.route_background",
                sender = message.sender()
            );
            self.background.on_notification(message);
            return Ok(RouteOutcome::Background);
        }

        let screen = snapshot.active_screen.ok_or(PushError::NoActiveScreen)?;
        let registration = self.registry.lookup(&screen).ok_or_else(|| {
            PushError::NoForegroundReceiverRegistered {
                screen: screen.clone(),
            }
        })?;

        let receiver = registration.factory().instance();
        let target_matched = match message.target(&self.target_key) {
            Some(target) => receiver.matches_target(target),
            None => true,
        };

        debug!(
            event = "core.dispatch.route_foreground",
            sender = message.sender(),
            screen = %screen,
            policy = registration.factory().policy(),
            target_matched = target_matched
        );

        if target_matched {
            receiver.on_target_notification(message);
        } else {
            receiver.on_mismatch_target_notification(message, &screen);
        }

        Ok(RouteOutcome::Foreground {
            screen,
            target_matched,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receivers::{ForegroundFactory, ForegroundReceiver};
    use crate::types::ScreenKey;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBackground {
        senders: Mutex<Vec<String>>,
    }

    impl BackgroundReceiver for RecordingBackground {
        fn on_notification(&self, message: &Message) {
            self.senders
                .lock()
                .unwrap()
                .push(message.sender().to_string());
        }
    }

    #[derive(Default)]
    struct RecordingForeground {
        target: Option<&'static str>,
        targeted: Mutex<Vec<String>>,
        mismatched: Mutex<Vec<(String, ScreenKey)>>,
    }

    impl ForegroundReceiver for RecordingForeground {
        fn on_target_notification(&self, message: &Message) {
            self.targeted
                .lock()
                .unwrap()
                .push(message.sender().to_string());
        }

        fn on_mismatch_target_notification(&self, message: &Message, screen: &ScreenKey) {
            self.mismatched
                .lock()
                .unwrap()
                .push((message.sender().to_string(), screen.clone()));
        }

        fn matches_target(&self, target: &str) -> bool {
            self.target == Some(target)
        }
    }

    struct Fixture {
        visibility: Arc<AppVisibilityTracker>,
        registry: Arc<RegistrationRegistry>,
        background: Arc<RecordingBackground>,
        router: UiDispatchRouter,
    }

    fn fixture() -> Fixture {
        let visibility = Arc::new(AppVisibilityTracker::new());
        let registry = Arc::new(RegistrationRegistry::new());
        let background = Arc::new(RecordingBackground::default());
        let router = UiDispatchRouter::new(
            Arc::clone(&visibility),
            Arc::clone(&registry),
            background.clone(),
            "push_target",
        );
        Fixture {
            visibility,
            registry,
            background,
            router,
        }
    }

    fn message(sender: &str) -> Message {
        Message::new(sender, BTreeMap::new())
    }

    fn targeted(sender: &str, target: &str) -> Message {
        let mut payload = BTreeMap::new();
        payload.insert("push_target".to_string(), target.to_string());
        Message::new(sender, payload)
    }

    #[test]
    fn test_background_routes_to_background_receiver() {
        let f = fixture();
        let outcome = f.router.route(&message("MockServer1")).unwrap();
        assert_eq!(outcome, RouteOutcome::Background);
        assert_eq!(*f.background.senders.lock().unwrap(), vec!["MockServer1"]);
    }

    #[test]
    fn test_foreground_routes_to_active_screen() {
        let f = fixture();
        let screen = ScreenKey::new("main");
        let receiver = Arc::new(RecordingForeground::default());
        f.registry
            .register(screen.clone(), ForegroundFactory::shared(receiver.clone()));
        f.visibility.on_screen_started(&screen);

        let outcome = f.router.route(&message("MockServer1")).unwrap();
        assert_eq!(
            outcome,
            RouteOutcome::Foreground {
                screen,
                target_matched: true,
            }
        );
        assert_eq!(*receiver.targeted.lock().unwrap(), vec!["MockServer1"]);
        assert!(f.background.senders.lock().unwrap().is_empty());
    }

    #[test]
    fn test_foreground_without_registration_is_dropped() {
        let f = fixture();
        f.visibility.on_screen_started(&ScreenKey::new("settings"));

        let err = f.router.route(&message("MockServer1")).unwrap_err();
        assert_eq!(
            err,
            PushError::NoForegroundReceiverRegistered {
                screen: ScreenKey::new("settings"),
            }
        );
        assert!(f.background.senders.lock().unwrap().is_empty());
    }

    #[test]
    fn test_target_match_and_mismatch() {
        let f = fixture();
        let screen = ScreenKey::new("inbox");
        let receiver = Arc::new(RecordingForeground {
            target: Some("inbox"),
            ..Default::default()
        });
        f.registry
            .register(screen.clone(), ForegroundFactory::shared(receiver.clone()));
        f.visibility.on_screen_started(&screen);

        let hit = f.router.route(&targeted("a", "inbox")).unwrap();
        let miss = f.router.route(&targeted("b", "profile")).unwrap();

        assert_eq!(
            hit,
            RouteOutcome::Foreground {
                screen: screen.clone(),
                target_matched: true,
            }
        );
        assert_eq!(
            miss,
            RouteOutcome::Foreground {
                screen: screen.clone(),
                target_matched: false,
            }
        );
        assert_eq!(*receiver.targeted.lock().unwrap(), vec!["a"]);
        assert_eq!(
            *receiver.mismatched.lock().unwrap(),
            vec![("b".to_string(), screen)]
        );
    }

    #[test]
    fn test_per_call_factory_builds_fresh_receivers() {
        let f = fixture();
        let screen = ScreenKey::new("chat");
        let built: Arc<Mutex<Vec<Arc<RecordingForeground>>>> = Arc::default();
        let built_in_factory = Arc::clone(&built);
        f.registry.register(
            screen.clone(),
            ForegroundFactory::per_call(move || {
                let receiver = Arc::new(RecordingForeground::default());
                built_in_factory.lock().unwrap().push(receiver.clone());
                receiver
            }),
        );
        f.visibility.on_screen_started(&screen);

        f.router.route(&message("one")).unwrap();
        f.router.route(&message("two")).unwrap();

        let built = built.lock().unwrap();
        assert_eq!(built.len(), 2);
        assert!(!Arc::ptr_eq(&built[0], &built[1]));
        assert_eq!(*built[0].targeted.lock().unwrap(), vec!["one"]);
        assert_eq!(*built[1].targeted.lock().unwrap(), vec!["two"]);
    }

    #[test]
    fn test_screen_stop_switches_to_background() {
        let f = fixture();
        let screen = ScreenKey::new("a");
        let receiver = Arc::new(RecordingForeground::default());
        f.registry
            .register(screen.clone(), ForegroundFactory::shared(receiver.clone()));
        f.visibility.on_screen_started(&screen);
        f.router.route(&message("MockServer1")).unwrap();

        f.visibility.on_screen_stopped(&screen);
        f.registry.unregister(&screen);
        f.router.route(&message("MockServer2")).unwrap();

        assert_eq!(*receiver.targeted.lock().unwrap(), vec!["MockServer1"]);
        assert_eq!(*f.background.senders.lock().unwrap(), vec!["MockServer2"]);
    }
}
