use tracing::warn;

use pushgate_core::PushgateConfig;

/// Load the merged config, falling back to defaults when it cannot be read
/// or does not validate.
pub fn load_config_with_warning() -> PushgateConfig {
    match PushgateConfig::load_hierarchy() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "{}",
                crate::color::warning(&format!(
                    "Warning: Could not load config: {}. Using defaults.\n\
                     Tip: Check ~/.pushgate/config.toml and ./.pushgate/config.toml.",
                    e
                ))
            );
            warn!(
                event = "cli.config.load_failed",
                error = %e,
                "Config load failed, using defaults"
            );
            PushgateConfig::default()
        }
    }
}
