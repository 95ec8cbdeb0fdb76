use std::time::Duration;

use crosslane_core::prelude::{parse_duration, ConfigError};
use serde::{Deserialize, Serialize};
use url::Url;

/// One validated step of a story.
///
/// The set of kinds is closed: configuration documents are checked exhaustively at load time
/// and an unknown kind is rejected as a [ConfigError] rather than becoming a runtime no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Navigate the session to a URL.
    Get { url: Url },
    /// Suspend execution for the given duration, without touching the session.
    Wait { duration: Duration },
    /// Scroll the page in the given direction; the duration bounds the whole gesture.
    Scroll {
        direction: Direction,
        duration: Duration,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Get { .. } => ActionKind::Get,
            Action::Wait { .. } => ActionKind::Wait,
            Action::Scroll { .. } => ActionKind::Scroll,
        }
    }
}

/// The kind of an [Action], used for logging and action records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Get,
    Wait,
    Scroll,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActionKind::Get => "get",
            ActionKind::Wait => "wait",
            ActionKind::Scroll => "scroll",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    #[default]
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

/// An action object exactly as it appears in a story document, before validation.
#[derive(Debug, Deserialize)]
pub(crate) struct RawAction {
    action: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    duration: Option<RawDuration>,
    #[serde(default)]
    direction: Option<Direction>,
}

/// Durations can appear as strings in documents. A bare number still deserializes here so
/// that the missing-suffix case produces a duration error instead of a serde type error.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Text(String),
    Number(f64),
}

impl RawDuration {
    fn parse(&self) -> Result<Duration, ConfigError> {
        match self {
            RawDuration::Text(text) => parse_duration(text),
            RawDuration::Number(number) => Err(ConfigError::InvalidDuration {
                value: number.to_string(),
                reason: "missing unit suffix".to_string(),
            }),
        }
    }
}

impl RawAction {
    pub(crate) fn validate(self, story: &str) -> Result<Action, ConfigError> {
        match self.action.as_str() {
            "get" => {
                let url = self.url.or(self.value).ok_or(ConfigError::MissingActionField {
                    story: story.to_string(),
                    kind: self.action.clone(),
                    field: "url",
                })?;
                let url = Url::parse(&url).map_err(|e| ConfigError::InvalidUrl {
                    value: url.clone(),
                    reason: e.to_string(),
                })?;
                Ok(Action::Get { url })
            }
            "wait" => {
                let duration = self.required_duration(story)?;
                Ok(Action::Wait { duration })
            }
            "scroll" => {
                let duration = self.required_duration(story)?;
                Ok(Action::Scroll {
                    direction: self.direction.unwrap_or_default(),
                    duration,
                })
            }
            other => Err(ConfigError::UnknownActionKind {
                story: story.to_string(),
                kind: other.to_string(),
            }),
        }
    }

    fn required_duration(&self, story: &str) -> Result<Duration, ConfigError> {
        self.duration
            .as_ref()
            .ok_or(ConfigError::MissingActionField {
                story: story.to_string(),
                kind: self.action.clone(),
                field: "duration",
            })?
            .parse()
    }
}
