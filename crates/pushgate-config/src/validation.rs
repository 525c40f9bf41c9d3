//! Configuration validation logic.

use crate::errors::ConfigError;
use crate::types::PushgateConfig;

/// Validate a PushgateConfig, returning an error if any values are invalid.
///
/// # Validation Rules
///
/// - `pipeline.queue_capacity`, if set, must be > 0
/// - `token.channel_capacity`, if set, must be > 0
/// - `routing.target_key`, if set, must not be blank
pub fn validate_config(config: &PushgateConfig) -> Result<(), ConfigError> {
    if config.pipeline.queue_capacity == Some(0) {
        return Err(ConfigError::InvalidConfiguration {
            message: "pipeline.queue_capacity must be > 0".to_string(),
        });
    }

    if config.token.channel_capacity == Some(0) {
        return Err(ConfigError::InvalidConfiguration {
            message: "token.channel_capacity must be > 0".to_string(),
        });
    }

    if let Some(ref key) = config.routing.target_key
        && key.trim().is_empty()
    {
        return Err(ConfigError::InvalidConfiguration {
            message: "routing.target_key must not be empty".to_string(),
        });
    }

    Ok(())
}
