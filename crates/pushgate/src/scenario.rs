//! JSONL scenario files for `pushgate replay`.
//!
//! One event per line. Blank lines and lines starting with `#` are skipped.
//!
//! ```text
//! {"event":"screen_started","screen":"inbox","receiver":"shared"}
//! {"event":"notification","sender":"MockServer1","payload":{"push_target":"inbox"}}
//! {"event":"screen_stopped","screen":"inbox"}
//! {"event":"token","value":"mock_token"}
//! {"event":"refresh_token"}
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pushgate_paths::PushgatePaths;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to read scenario '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// How a started screen's foreground receiver is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiverPolicy {
    Shared,
    Fresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScenarioEvent {
    ApplicationCreated,
    ScreenStarted {
        screen: String,
        #[serde(default)]
        receiver: Option<ReceiverPolicy>,
    },
    ScreenStopped {
        screen: String,
    },
    Notification {
        sender: String,
        #[serde(default)]
        payload: BTreeMap<String, String>,
    },
    /// Queue the next result the scripted token source will return.
    Token {
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
    RefreshToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioLine {
    pub line: usize,
    pub event: ScenarioEvent,
}

pub fn parse_scenario(input: &str) -> Result<Vec<ScenarioLine>, ScenarioError> {
    let mut events = Vec::new();
    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let event: ScenarioEvent =
            serde_json::from_str(trimmed).map_err(|e| ScenarioError::Parse {
                line,
                message: e.to_string(),
            })?;

        if let ScenarioEvent::Token { value, error } = &event
            && value.is_some() == error.is_some()
        {
            return Err(ScenarioError::Parse {
                line,
                message: "token event needs exactly one of 'value' or 'error'".to_string(),
            });
        }

        events.push(ScenarioLine { line, event });
    }
    Ok(events)
}

pub fn load_scenario(path: &Path) -> Result<Vec<ScenarioLine>, ScenarioError> {
    let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scenario(&content)
}

/// An existing path is used as-is. Anything else is looked up by name in
/// the scenarios directory.
pub fn resolve_scenario_path(arg: &str, paths: Option<&PushgatePaths>) -> PathBuf {
    let direct = PathBuf::from(arg);
    if direct.exists() {
        return direct;
    }
    match paths {
        Some(paths) => paths.scenario_file(arg),
        None => direct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_event_kinds() {
        let input = r#"
# warm up
{"event":"application_created"}
{"event":"screen_started","screen":"inbox","receiver":"fresh"}
{"event":"screen_started","screen":"settings"}
{"event":"notification","sender":"MockServer1","payload":{"push_target":"inbox"}}
{"event":"notification","sender":"MockServer2"}
{"event":"screen_stopped","screen":"inbox"}
{"event":"token","value":"mock_token"}
{"event":"token","error":"offline"}
{"event":"refresh_token"}
"#;
        let events = parse_scenario(input).unwrap();
        assert_eq!(events.len(), 9);
        assert_eq!(events[0].line, 3);
        assert_eq!(
            events[1].event,
            ScenarioEvent::ScreenStarted {
                screen: "inbox".to_string(),
                receiver: Some(ReceiverPolicy::Fresh),
            }
        );
        assert_eq!(
            events[2].event,
            ScenarioEvent::ScreenStarted {
                screen: "settings".to_string(),
                receiver: None,
            }
        );
        match &events[4].event {
            ScenarioEvent::Notification { sender, payload } => {
                assert_eq!(sender, "MockServer2");
                assert!(payload.is_empty());
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(events[8].event, ScenarioEvent::RefreshToken);
    }

    #[test]
    fn test_parse_reports_line_number() {
        let input = "{\"event\":\"refresh_token\"}\n{\"event\":\"explode\"}\n";
        let err = parse_scenario(input).unwrap_err();
        assert!(matches!(err, ScenarioError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_token_event_needs_exactly_one_field() {
        let err = parse_scenario(r#"{"event":"token"}"#).unwrap_err();
        assert!(err.to_string().contains("exactly one"));

        let err = parse_scenario(r#"{"event":"token","value":"a","error":"b"}"#).unwrap_err();
        assert!(matches!(err, ScenarioError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_scenario(Path::new("/nonexistent/pushgate/scenario.jsonl")).unwrap_err();
        assert!(matches!(err, ScenarioError::Read { .. }));
    }

    #[test]
    fn test_resolve_prefers_existing_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("smoke.jsonl");
        std::fs::write(&file, "").unwrap();

        let paths = PushgatePaths::from_dir(dir.path().join(".pushgate"));
        let resolved = resolve_scenario_path(file.to_str().unwrap(), Some(&paths));
        assert_eq!(resolved, file);
    }

    #[test]
    fn test_resolve_falls_back_to_scenarios_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = PushgatePaths::from_dir(dir.path().to_path_buf());
        let resolved = resolve_scenario_path("smoke", Some(&paths));
        assert_eq!(resolved, paths.scenario_file("smoke"));
    }
}
