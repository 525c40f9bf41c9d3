use clap::ArgMatches;
use tracing::{error, info};

use pushgate_config::{PipelineConfig, RoutingConfig, TokenConfig};
use pushgate_core::{PushgateConfig, events};

use crate::color;

pub(crate) fn handle_config_command(
    _matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(event = "cli.config_started");

    let config = match PushgateConfig::load_hierarchy() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", color::error(&format!("Invalid configuration: {}", e)));
            error!(event = "cli.config_failed", error = %e);
            events::log_app_error(&e);
            return Err(e.into());
        }
    };

    print!("{}", toml::to_string_pretty(&effective_config(&config))?);

    info!(event = "cli.config_completed");
    Ok(())
}

/// The config with every default written out.
fn effective_config(config: &PushgateConfig) -> PushgateConfig {
    PushgateConfig {
        pipeline: PipelineConfig {
            queue_capacity: Some(config.pipeline.queue_capacity()),
        },
        routing: RoutingConfig {
            target_key: Some(config.routing.target_key().to_string()),
        },
        token: TokenConfig {
            channel_capacity: Some(config.token.channel_capacity()),
        },
    }
}
