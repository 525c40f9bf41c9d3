use clap::ArgMatches;
use tracing::error;

use pushgate_core::events;

mod config;
mod helpers;
mod replay;

use config::handle_config_command;
use replay::handle_replay_command;

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    events::log_app_startup();

    match matches.subcommand() {
        Some(("replay", sub_matches)) => handle_replay_command(sub_matches),
        Some(("config", sub_matches)) => handle_config_command(sub_matches),
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    }
}
