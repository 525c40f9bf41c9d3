use std::error::Error;

use crate::types::ScreenKey;

/// Base trait for all pushgate errors
pub trait PushgateError: Error + Send + Sync + 'static {
    /// Error code for programmatic handling
    fn error_code(&self) -> &'static str;

    /// Whether this error prevents the pipeline from starting at all
    fn is_fatal(&self) -> bool {
        false
    }
}

/// Errors surfaced by the notification pipeline and token state.
///
/// Initialization errors (`Missing*`) are fatal. Everything else is scoped
/// to a single message or a single refresh and never stops the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PushError {
    #[error("no push token has been obtained yet")]
    TokenUnavailable,

    #[error("token fetch failed: {message}")]
    TokenFetchFailed { message: String },

    #[error("no active screen to receive a foreground notification")]
    NoActiveScreen,

    #[error("no foreground receiver registered for screen '{screen}'")]
    NoForegroundReceiverRegistered { screen: ScreenKey },

    #[error("a data receiver must be registered before the pipeline starts")]
    MissingDataReceiver,

    #[error("a background receiver must be registered before the pipeline starts")]
    MissingBackgroundReceiver,

    #[error("a token source must be registered before the pipeline starts")]
    MissingTokenSource,

    #[error("data receiver failed: {message}")]
    DataReceiverFailed { message: String },

    #[error("UI receiver failed: {message}")]
    UiReceiverFailed { message: String },

    #[error("notification pipeline is closed")]
    PipelineClosed,
}

impl PushError {
    /// Whether the notification was dropped by routing rather than by a
    /// receiver failure.
    pub fn is_dropped_notification(&self) -> bool {
        matches!(
            self,
            PushError::NoActiveScreen | PushError::NoForegroundReceiverRegistered { .. }
        )
    }
}

impl PushgateError for PushError {
    fn error_code(&self) -> &'static str {
        match self {
            PushError::TokenUnavailable => "TOKEN_UNAVAILABLE",
            PushError::TokenFetchFailed { .. } => "TOKEN_FETCH_FAILED",
            PushError::NoActiveScreen => "NO_ACTIVE_SCREEN",
            PushError::NoForegroundReceiverRegistered { .. } => {
                "NO_FOREGROUND_RECEIVER_REGISTERED"
            }
            PushError::MissingDataReceiver => "MISSING_DATA_RECEIVER",
            PushError::MissingBackgroundReceiver => "MISSING_BACKGROUND_RECEIVER",
            PushError::MissingTokenSource => "MISSING_TOKEN_SOURCE",
            PushError::DataReceiverFailed { .. } => "DATA_RECEIVER_FAILED",
            PushError::UiReceiverFailed { .. } => "UI_RECEIVER_FAILED",
            PushError::PipelineClosed => "PIPELINE_CLOSED",
        }
    }

    fn is_fatal(&self) -> bool {
        matches!(
            self,
            PushError::MissingDataReceiver
                | PushError::MissingBackgroundReceiver
                | PushError::MissingTokenSource
        )
    }
}

impl PushgateError for pushgate_config::ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            pushgate_config::ConfigError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            pushgate_config::ConfigError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            pushgate_config::ConfigError::PathUnavailable { .. } => "CONFIG_PATH_UNAVAILABLE",
            pushgate_config::ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
        }
    }

    fn is_fatal(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_errors_are_fatal() {
        assert!(PushError::MissingDataReceiver.is_fatal());
        assert!(PushError::MissingBackgroundReceiver.is_fatal());
        assert!(PushError::MissingTokenSource.is_fatal());

        assert!(!PushError::NoActiveScreen.is_fatal());
        assert!(!PushError::TokenUnavailable.is_fatal());
        assert!(!PushError::PipelineClosed.is_fatal());
    }

    #[test]
    fn test_dropped_notification_classification() {
        assert!(PushError::NoActiveScreen.is_dropped_notification());
        assert!(
            PushError::NoForegroundReceiverRegistered {
                screen: ScreenKey::new("settings"),
            }
            .is_dropped_notification()
        );
        assert!(
            !PushError::DataReceiverFailed {
                message: "db locked".to_string(),
            }
            .is_dropped_notification()
        );
    }

    #[test]
    fn test_error_display() {
        let error = PushError::NoForegroundReceiverRegistered {
            screen: ScreenKey::new("inbox"),
        };
        assert_eq!(
            error.to_string(),
            "no foreground receiver registered for screen 'inbox'"
        );
        assert_eq!(error.error_code(), "NO_FOREGROUND_RECEIVER_REGISTERED");
    }

    #[test]
    fn test_error_codes() {
        let cases: Vec<(PushError, &str)> = vec![
            (PushError::TokenUnavailable, "TOKEN_UNAVAILABLE"),
            (
                PushError::TokenFetchFailed {
                    message: "offline".to_string(),
                },
                "TOKEN_FETCH_FAILED",
            ),
            (PushError::NoActiveScreen, "NO_ACTIVE_SCREEN"),
            (PushError::MissingDataReceiver, "MISSING_DATA_RECEIVER"),
            (
                PushError::UiReceiverFailed {
                    message: "panicked".to_string(),
                },
                "UI_RECEIVER_FAILED",
            ),
            (PushError::PipelineClosed, "PIPELINE_CLOSED"),
        ];

        for (err, expected_code) in cases {
            assert_eq!(err.error_code(), expected_code);
        }
    }

    #[test]
    fn test_config_error_is_fatal() {
        let error = pushgate_config::ConfigError::InvalidConfiguration {
            message: "pipeline.queue_capacity must be > 0".to_string(),
        };
        assert_eq!(error.error_code(), "INVALID_CONFIGURATION");
        assert!(error.is_fatal());
    }
}
