use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A browser selected for benchmarking: an identifier, the executable to launch and the
/// launch flags in their configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    pub name: String,
    pub path: PathBuf,
    pub flags: Vec<Flag>,
}

impl BrowserConfig {
    /// The executable file name, used by the environment precheck to spot already running
    /// browser processes.
    pub fn executable_name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// Whether the configured flags request a headless session.
    pub fn is_headless(&self) -> bool {
        self.flags.iter().any(|flag| flag.key() == "--headless")
    }
}

/// One browser launch flag, either a bare switch or a key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flag {
    Switch(String),
    Value { key: String, value: String },
}

impl Flag {
    /// Parse a flag from its command line form, `--switch` or `--key=value`.
    pub fn parse(text: &str) -> Self {
        match text.split_once('=') {
            Some((key, value)) => Flag::Value {
                key: key.to_string(),
                value: value.to_string(),
            },
            None => Flag::Switch(text.to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Flag::Switch(key) => key,
            Flag::Value { key, .. } => key,
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flag::Switch(key) => f.write_str(key),
            Flag::Value { key, value } => write!(f, "{key}={value}"),
        }
    }
}

/// A browser entry as it appears in the benchmark document.
#[derive(Debug, Deserialize)]
pub(crate) struct RawBrowser {
    pub(crate) path: PathBuf,
    #[serde(default)]
    pub(crate) flags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_switch_and_value_flags() {
        assert_eq!(Flag::parse("--headless"), Flag::Switch("--headless".to_string()));
        assert_eq!(
            Flag::parse("--user-data-dir=/tmp/profile"),
            Flag::Value {
                key: "--user-data-dir".to_string(),
                value: "/tmp/profile".to_string(),
            }
        );
    }

    #[test]
    fn round_trips_through_display() {
        for text in ["--headless", "--window-size=1200,800"] {
            assert_eq!(Flag::parse(text).to_string(), text);
        }
    }

    #[test]
    fn detects_headless_flag() {
        let browser = BrowserConfig {
            name: "chrome-stable".to_string(),
            path: PathBuf::from("/usr/bin/google-chrome"),
            flags: vec![Flag::parse("--headless=new")],
        };
        assert!(browser.is_headless());
        assert_eq!(browser.executable_name().unwrap(), "google-chrome");
    }
}
