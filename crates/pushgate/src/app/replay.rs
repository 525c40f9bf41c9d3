use clap::{Arg, ArgAction, Command};

pub fn replay_command() -> Command {
    Command::new("replay")
        .about("Replay a notification scenario through the pipeline")
        .arg(
            Arg::new("scenario")
                .help("Path to a JSONL scenario, or the name of one in ~/.pushgate/scenarios")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Output one JSON record per line")
                .action(ArgAction::SetTrue),
        )
}
