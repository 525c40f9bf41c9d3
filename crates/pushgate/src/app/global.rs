use clap::{Arg, ArgAction, Command};

pub fn root_command() -> Command {
    Command::new("pushgate")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Route push notifications through a data stage and then a UI receiver")
        .long_about("pushgate drives the notification routing pipeline from recorded scenarios. Each scenario is a JSONL file of lifecycle, notification and token events; pushgate reports which receiver handled every message.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
}

pub fn config_command() -> Command {
    Command::new("config")
        .about("Print the effective configuration")
        .long_about("Loads ~/.pushgate/config.toml and ./.pushgate/config.toml, merges them with project values winning, and prints the result with defaults filled in.")
}
