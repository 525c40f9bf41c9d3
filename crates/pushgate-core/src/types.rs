use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::receivers::ForegroundFactory;

/// Identity of a screen that can own foreground notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenKey(String);

impl ScreenKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ScreenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScreenKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ScreenKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// An inbound push notification.
///
/// Immutable once constructed. The payload is opaque to routing except for
/// the optional target entry read by [`Message::target`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    sender: String,
    #[serde(default)]
    payload: BTreeMap<String, String>,
}

impl Message {
    pub fn new(sender: impl Into<String>, payload: BTreeMap<String, String>) -> Self {
        Self {
            sender: sender.into(),
            payload,
        }
    }

    /// Identifier of the server that sent the notification.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn payload(&self) -> &BTreeMap<String, String> {
        &self.payload
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.payload.get(key).map(String::as_str)
    }

    /// The screen this notification is aimed at, if the payload names one
    /// under `target_key`. Blank values count as no target.
    pub fn target(&self, target_key: &str) -> Option<&str> {
        self.get(target_key).filter(|t| !t.trim().is_empty())
    }
}

/// A freshly obtained push registration token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUpdate {
    token: String,
}

impl TokenUpdate {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Which UI receiver a message was routed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum RouteOutcome {
    /// The app was backgrounded; the background receiver got the message.
    Background,
    /// The active screen's foreground receiver got the message.
    Foreground {
        screen: ScreenKey,
        /// `false` when the message named a different target screen and was
        /// delivered through the mismatch callback.
        target_matched: bool,
    },
}

impl std::fmt::Display for RouteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteOutcome::Background => write!(f, "background"),
            RouteOutcome::Foreground {
                screen,
                target_matched: true,
            } => write!(f, "foreground({})", screen),
            RouteOutcome::Foreground {
                screen,
                target_matched: false,
            } => write!(f, "foreground({}, mismatch)", screen),
        }
    }
}

/// Application and screen lifecycle transitions delivered by the host.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// The host process started. Resets visibility and registrations.
    ApplicationCreated,
    /// A screen became visible, optionally registering its foreground receiver.
    ScreenStarted {
        screen: ScreenKey,
        receiver: Option<ForegroundFactory>,
    },
    /// A screen is no longer visible.
    ScreenStopped { screen: ScreenKey },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_message_accessors() {
        let message = Message::new("MockServer1", payload(&[("title", "Hello")]));
        assert_eq!(message.sender(), "MockServer1");
        assert_eq!(message.get("title"), Some("Hello"));
        assert_eq!(message.get("missing"), None);
    }

    #[test]
    fn test_message_target() {
        let message = Message::new("s", payload(&[("push_target", "inbox")]));
        assert_eq!(message.target("push_target"), Some("inbox"));
        assert_eq!(message.target("screen"), None);
    }

    #[test]
    fn test_blank_target_is_none() {
        let message = Message::new("s", payload(&[("push_target", "  ")]));
        assert_eq!(message.target("push_target"), None);
    }

    #[test]
    fn test_message_deserialize_without_payload() {
        let message: Message = serde_json::from_str(r#"{"sender":"MockServer2"}"#).unwrap();
        assert_eq!(message.sender(), "MockServer2");
        assert!(message.payload().is_empty());
    }

    #[test]
    fn test_screen_key_serializes_transparently() {
        let json = serde_json::to_string(&ScreenKey::new("inbox")).unwrap();
        assert_eq!(json, r#""inbox""#);
    }

    #[test]
    fn test_route_outcome_display() {
        assert_eq!(RouteOutcome::Background.to_string(), "background");
        assert_eq!(
            RouteOutcome::Foreground {
                screen: ScreenKey::new("inbox"),
                target_matched: false,
            }
            .to_string(),
            "foreground(inbox, mismatch)"
        );
    }

    #[test]
    fn test_route_outcome_serializes_tagged() {
        let json = serde_json::to_string(&RouteOutcome::Foreground {
            screen: ScreenKey::new("inbox"),
            target_matched: true,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"route":"foreground","screen":"inbox","target_matched":true}"#
        );
    }
}
