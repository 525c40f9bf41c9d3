//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Later sources override earlier ones:
//! 1. **Hardcoded defaults** - accessor fallbacks in [`crate::types`]
//! 2. **User config** - `~/.pushgate/config.toml`
//! 3. **Project config** - `./.pushgate/config.toml`

use std::fs;
use std::path::Path;

use pushgate_paths::PushgatePaths;
use tracing::debug;

use crate::errors::ConfigError;
use crate::types::{PipelineConfig, PushgateConfig, RoutingConfig, TokenConfig};
use crate::validation::validate_config;

/// Load configuration from the user and project config files.
///
/// # Errors
///
/// Returns an error if a present file fails to parse or the merged result
/// fails validation. Missing config files are not errors.
pub fn load_hierarchy() -> Result<PushgateConfig, ConfigError> {
    let paths = PushgatePaths::resolve().map_err(|e| ConfigError::PathUnavailable {
        message: e.to_string(),
    })?;
    let project_root = std::env::current_dir()?;

    load_hierarchy_from(
        &paths.user_config(),
        &PushgatePaths::project_config(&project_root),
    )
}

/// Load and merge the two config files at explicit locations.
pub fn load_hierarchy_from(
    user_config: &Path,
    project_config: &Path,
) -> Result<PushgateConfig, ConfigError> {
    let mut config = PushgateConfig::default();

    if let Some(user) = load_optional_config_file(user_config)? {
        config = merge_configs(config, user);
    }

    if let Some(project) = load_optional_config_file(project_config)? {
        config = merge_configs(config, project);
    }

    validate_config(&config)?;

    Ok(config)
}

/// Load a config file, treating "file not found" as `Ok(None)`.
fn load_optional_config_file(path: &Path) -> Result<Option<PushgateConfig>, ConfigError> {
    match load_config_file(path) {
        Ok(config) => Ok(Some(config)),
        Err(ConfigError::IoError { source }) if source.kind() == std::io::ErrorKind::NotFound => {
            debug!(
                event = "config.loading.file_not_found",
                path = %path.display()
            );
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Load a configuration file from the given path.
pub fn load_config_file(path: &Path) -> Result<PushgateConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    debug!(event = "config.loading.file_loaded", path = %path.display());
    Ok(config)
}

/// Merge two configurations, with `override_config` taking precedence.
///
/// Override values replace base values only when present.
pub fn merge_configs(base: PushgateConfig, override_config: PushgateConfig) -> PushgateConfig {
    PushgateConfig {
        pipeline: PipelineConfig {
            queue_capacity: override_config
                .pipeline
                .queue_capacity
                .or(base.pipeline.queue_capacity),
        },
        routing: RoutingConfig {
            target_key: override_config.routing.target_key.or(base.routing.target_key),
        },
        token: TokenConfig {
            channel_capacity: override_config
                .token
                .channel_capacity
                .or(base.token.channel_capacity),
        },
    }
}
