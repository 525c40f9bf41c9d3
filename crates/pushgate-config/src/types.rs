//! Configuration type definitions.
//!
//! # Example Configuration
//!
//! ```toml
//! [pipeline]
//! queue_capacity = 64
//!
//! [routing]
//! target_key = "push_target"
//!
//! [token]
//! channel_capacity = 16
//! ```
//!
//! Fields are `Option<T>` so that hierarchy merging only overrides values
//! that a file sets explicitly. Accessors apply the defaults.

use serde::{Deserialize, Serialize};

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_TARGET_KEY: &str = "push_target";
pub const DEFAULT_TOKEN_CHANNEL_CAPACITY: usize = 16;

/// Main configuration loaded from TOML config files.
///
/// Loaded from `~/.pushgate/config.toml`, then `./.pushgate/config.toml`.
/// Project values override user values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushgateConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub token: TokenConfig,
}

/// Inbound notification queue settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of notifications that may wait for the pipeline worker.
    /// Default: 64
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,
}

impl PipelineConfig {
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY)
    }
}

/// Foreground routing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Payload key naming the screen a notification targets.
    /// Default: "push_target"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_key: Option<String>,
}

impl RoutingConfig {
    pub fn target_key(&self) -> &str {
        self.target_key.as_deref().unwrap_or(DEFAULT_TARGET_KEY)
    }
}

/// Token refresh channel settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Buffered refresh events per subscriber before lagging.
    /// Default: 16
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_capacity: Option<usize>,
}

impl TokenConfig {
    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity.unwrap_or(DEFAULT_TOKEN_CHANNEL_CAPACITY)
    }
}

/// Resolved settings handed to the notification pipeline.
///
/// Flattened from [`PushgateConfig`] so the core never deals with
/// unset values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub queue_capacity: usize,
    pub target_key: String,
    pub token_channel_capacity: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PushgateConfig::default().pipeline_settings()
    }
}

impl PushgateConfig {
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            queue_capacity: self.pipeline.queue_capacity(),
            target_key: self.routing.target_key().to_string(),
            token_channel_capacity: self.token.channel_capacity(),
        }
    }
}
