//! pushgate-core: push notification routing.
//!
//! Every inbound message is handed to the data receiver first. Once that
//! work has completed, the message goes to exactly one UI receiver: the
//! background receiver when no screen is visible, otherwise the foreground
//! receiver registered for the active screen.
//!
//! # Main Entry Points
//!
//! - [`PushContext`] - Build once at startup, feed it platform callbacks
//! - [`receivers`] - Capabilities the host application implements
//! - [`token`] - Push token cache and refresh channel

pub mod context;
pub mod dispatch;
pub mod errors;
pub mod events;
pub mod logging;
pub mod receivers;
pub mod registry;
pub mod token;
pub mod types;
pub mod visibility;

pub use context::{Delivery, PushContext, PushContextBuilder};
pub use errors::{PushError, PushgateError};
pub use receivers::{
    BackgroundReceiver, DataReceiver, ForegroundFactory, ForegroundReceiver, ReceiverError,
    TokenRefreshReceiver, TokenSource, TokenSourceError,
};
pub use token::{TokenEvent, TokenSubscription};
pub use types::{LifecycleEvent, Message, RouteOutcome, ScreenKey, TokenUpdate};
pub use visibility::{ScreenStop, VisibilitySnapshot};

pub use pushgate_config::{ConfigError, PipelineSettings, PushgateConfig};

// Re-export logging initialization
pub use logging::init_logging;
