use crosslane_core::prelude::ConfigError;
use serde::Deserialize;

use crate::action::{Action, RawAction};

/// A named, ordered sequence of timed browser actions.
///
/// The order of actions is the execution order. A story is immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    name: String,
    actions: Vec<Action>,
}

impl Story {
    pub fn new(name: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            name: name.into(),
            actions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}

#[derive(Debug, Deserialize)]
struct StoryDocument {
    pages: serde_yaml::Mapping,
}

/// Load stories from a story document.
///
/// The document is a JSON-superset mapping with a top level `pages` key, mapping story name
/// to an ordered list of action objects. Every action is validated here, so a malformed
/// story is rejected before any browser is launched for it.
pub fn load_stories(text: &str) -> Result<Vec<Story>, ConfigError> {
    let document: StoryDocument =
        serde_yaml::from_str(text).map_err(|e| ConfigError::Document(e.to_string()))?;

    let mut stories = Vec::with_capacity(document.pages.len());
    for (name, value) in document.pages {
        let name = name
            .as_str()
            .ok_or_else(|| ConfigError::Document(format!("story name is not a string: {name:?}")))?
            .to_string();

        let raw_actions: Vec<RawAction> = serde_yaml::from_value(value)
            .map_err(|e| ConfigError::Document(format!("story `{name}`: {e}")))?;
        if raw_actions.is_empty() {
            return Err(ConfigError::Document(format!("story `{name}` has no actions")));
        }

        let actions = raw_actions
            .into_iter()
            .map(|raw| raw.validate(&name))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("Loaded story `{}` with {} actions", name, actions.len());
        stories.push(Story::new(name, actions));
    }

    Ok(stories)
}

/// Filter stories by name, preserving the document order.
///
/// An empty selection means all stories. A name that matches no story is a configuration
/// error rather than a silent skip.
pub fn select_stories(stories: Vec<Story>, names: &[String]) -> Result<Vec<Story>, ConfigError> {
    if names.is_empty() {
        return Ok(stories);
    }
    for name in names {
        if !stories.iter().any(|story| story.name() == name.as_str()) {
            return Err(ConfigError::UnknownStory { name: name.clone() });
        }
    }
    Ok(stories
        .into_iter()
        .filter(|story| names.iter().any(|name| name == story.name()))
        .collect())
}
