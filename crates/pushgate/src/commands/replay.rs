use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use clap::ArgMatches;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use pushgate_core::{
    BackgroundReceiver, DataReceiver, ForegroundFactory, ForegroundReceiver, LifecycleEvent,
    Message, PipelineSettings, PushContext, PushError, PushgateError, ReceiverError,
    RouteOutcome, ScreenKey, TokenSource, TokenSourceError, events,
};
use pushgate_paths::PushgatePaths;

use super::helpers::load_config_with_warning;
use crate::color;
use crate::scenario::{
    ReceiverPolicy, ScenarioEvent, ScenarioLine, load_scenario, resolve_scenario_path,
};

pub(crate) fn handle_replay_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = matches
        .get_one::<String>("scenario")
        .ok_or("Scenario argument is required")?;
    let json_output = matches.get_flag("json");

    info!(
        event = "cli.replay_started",
        scenario = %scenario,
        json_output = json_output
    );

    let paths = match PushgatePaths::resolve() {
        Ok(paths) => Some(paths),
        Err(e) => {
            warn!(event = "cli.replay.paths_unavailable", error = %e);
            None
        }
    };
    let path = resolve_scenario_path(scenario, paths.as_ref());

    let lines = match load_scenario(&path) {
        Ok(lines) => lines,
        Err(e) => {
            eprintln!("{}", color::error(&format!("Failed to load scenario: {}", e)));
            error!(event = "cli.replay_failed", error = %e);
            return Err(e.into());
        }
    };

    let settings = load_config_with_warning().pipeline_settings();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let records = match runtime.block_on(replay(lines, settings)) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("{}", color::error(&format!("Replay failed: {}", e)));
            error!(event = "cli.replay_failed", error = %e);
            events::log_app_error(&e);
            return Err(e.into());
        }
    };

    for record in &records {
        if json_output {
            println!("{}", serde_json::to_string(record)?);
        } else {
            println!("{}", render(record));
        }
    }

    info!(event = "cli.replay_completed", records = records.len());
    Ok(())
}

/// One observable result of a scenario line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum ReplayRecord {
    Delivered {
        line: usize,
        sender: String,
        outcome: RouteOutcome,
    },
    Dropped {
        line: usize,
        sender: String,
        error_code: &'static str,
        error: String,
    },
    Failed {
        line: usize,
        sender: String,
        error_code: &'static str,
        error: String,
    },
    TokenRefreshed {
        line: usize,
        token: String,
    },
    TokenFailed {
        line: usize,
        error: String,
    },
}

fn render(record: &ReplayRecord) -> String {
    match record {
        ReplayRecord::Delivered {
            line,
            sender,
            outcome,
        } => format!(
            "{} {} -> {}",
            color::muted(&format!("{:>4}", line)),
            color::signal(sender),
            color::delivered(&outcome.to_string())
        ),
        ReplayRecord::Dropped {
            line,
            sender,
            error,
            ..
        } => format!(
            "{} {} -> {}",
            color::muted(&format!("{:>4}", line)),
            color::signal(sender),
            color::dropped(&format!("dropped ({})", error))
        ),
        ReplayRecord::Failed {
            line,
            sender,
            error,
            ..
        } => format!(
            "{} {} -> {}",
            color::muted(&format!("{:>4}", line)),
            color::signal(sender),
            color::failed(&format!("failed ({})", error))
        ),
        ReplayRecord::TokenRefreshed { line, token } => format!(
            "{} token -> {}",
            color::muted(&format!("{:>4}", line)),
            color::delivered(token)
        ),
        ReplayRecord::TokenFailed { line, error } => format!(
            "{} token -> {}",
            color::muted(&format!("{:>4}", line)),
            color::failed(error)
        ),
    }
}

/// Drive a fresh [`PushContext`] through `lines`.
///
/// Each notification is awaited before the next line runs, so lifecycle
/// changes in the scenario apply between messages exactly as written.
pub(crate) async fn replay(
    lines: Vec<ScenarioLine>,
    settings: PipelineSettings,
) -> Result<Vec<ReplayRecord>, PushError> {
    let tokens = Arc::new(ScriptedTokens::default());
    let ctx = PushContext::builder()
        .data_receiver(Arc::new(LoggingData))
        .background_receiver(Arc::new(LoggingBackground))
        .token_source(Arc::clone(&tokens))
        .settings(settings)
        .build()?;

    let mut records = Vec::new();
    for ScenarioLine { line, event } in lines {
        debug!(event = "cli.replay.line_started", line = line);
        match event {
            ScenarioEvent::ApplicationCreated => {
                ctx.handle_lifecycle(LifecycleEvent::ApplicationCreated)
            }
            ScenarioEvent::ScreenStarted { screen, receiver } => {
                let factory = receiver.map(|policy| foreground_factory(&screen, policy));
                ctx.on_screen_started(ScreenKey::new(screen), factory);
            }
            ScenarioEvent::ScreenStopped { screen } => {
                ctx.on_screen_stopped(&ScreenKey::new(screen));
            }
            ScenarioEvent::Notification { sender, payload } => {
                let result = ctx
                    .on_notification_received(sender.clone(), payload)
                    .await
                    .await;
                records.push(match result {
                    Ok(outcome) => ReplayRecord::Delivered {
                        line,
                        sender,
                        outcome,
                    },
                    Err(e) if e.is_dropped_notification() => ReplayRecord::Dropped {
                        line,
                        sender,
                        error_code: e.error_code(),
                        error: e.to_string(),
                    },
                    Err(e) => ReplayRecord::Failed {
                        line,
                        sender,
                        error_code: e.error_code(),
                        error: e.to_string(),
                    },
                });
            }
            ScenarioEvent::Token { value, error } => {
                tokens.push(value.ok_or_else(|| error.unwrap_or_default()));
            }
            ScenarioEvent::RefreshToken => {
                records.push(match ctx.on_token_refreshed() {
                    Ok(update) => ReplayRecord::TokenRefreshed {
                        line,
                        token: update.token().to_string(),
                    },
                    Err(e) => ReplayRecord::TokenFailed {
                        line,
                        error: e.to_string(),
                    },
                });
            }
        }
    }

    ctx.shutdown().await;
    Ok(records)
}

fn foreground_factory(screen: &str, policy: ReceiverPolicy) -> ForegroundFactory {
    let screen = screen.to_string();
    match policy {
        ReceiverPolicy::Shared => ForegroundFactory::shared(Arc::new(LoggingForeground {
            screen,
            instance: 0,
        })),
        ReceiverPolicy::Fresh => {
            let built = AtomicUsize::new(0);
            ForegroundFactory::per_call(move || {
                Arc::new(LoggingForeground {
                    screen: screen.clone(),
                    instance: built.fetch_add(1, Ordering::Relaxed) + 1,
                })
            })
        }
    }
}

struct LoggingData;

impl DataReceiver for LoggingData {
    fn on_notification(&self, message: Message) -> BoxFuture<'static, Result<(), ReceiverError>> {
        async move {
            debug!(
                event = "cli.replay.data_received",
                sender = message.sender(),
                fields = message.payload().len()
            );
            Ok(())
        }
        .boxed()
    }
}

struct LoggingBackground;

impl BackgroundReceiver for LoggingBackground {
    fn on_notification(&self, message: &Message) {
        info!(
            event = "cli.replay.background_received",
            sender = message.sender()
        );
    }
}

struct LoggingForeground {
    screen: String,
    instance: usize,
}

impl ForegroundReceiver for LoggingForeground {
    fn on_target_notification(&self, message: &Message) {
        info!(
            event = "cli.replay.foreground_received",
            screen = %self.screen,
            instance = self.instance,
            sender = message.sender()
        );
    }

    fn on_mismatch_target_notification(&self, message: &Message, screen: &ScreenKey) {
        info!(
            event = "cli.replay.foreground_mismatched",
            screen = %screen,
            instance = self.instance,
            sender = message.sender()
        );
    }

    fn matches_target(&self, target: &str) -> bool {
        target == self.screen
    }
}

/// Token source fed by `token` lines in the scenario.
#[derive(Default)]
struct ScriptedTokens {
    queue: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedTokens {
    fn push(&self, result: Result<String, String>) {
        match self.queue.lock() {
            Ok(mut queue) => queue.push_back(result),
            Err(poisoned) => poisoned.into_inner().push_back(result),
        }
    }
}

impl TokenSource for ScriptedTokens {
    fn retrieve(&self) -> Result<String, TokenSourceError> {
        let next = match self.queue.lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        match next {
            Some(Ok(token)) => Ok(token),
            Some(Err(message)) => Err(TokenSourceError::new(message)),
            None => Err(TokenSourceError::new("no token scripted")),
        }
    }
}
