use crosslane_core::prelude::ConfigError;
use serde::Deserialize;

use crate::browser::{BrowserConfig, Flag, RawBrowser};
use crate::env::EnvironmentPolicy;
use crate::probe::ProbeConfig;

/// The benchmark configuration document: which browsers to drive, the host environment
/// policy to enforce, and which probes to attach.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkConfig {
    pub browsers: Vec<BrowserConfig>,
    pub env: EnvironmentPolicy,
    pub probes: Vec<ProbeConfig>,
}

impl BenchmarkConfig {
    /// Keep only the named browsers, preserving document order.
    pub fn select_browsers(&mut self, names: &[String]) -> Result<(), ConfigError> {
        if names.is_empty() {
            return Ok(());
        }
        for name in names {
            if !self.browsers.iter().any(|b| b.name == *name) {
                return Err(ConfigError::UnknownBrowser { name: name.clone() });
            }
        }
        self.browsers.retain(|b| names.contains(&b.name));
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBenchmarkDocument {
    #[serde(default)]
    browsers: serde_yaml::Mapping,
    #[serde(default)]
    env: EnvironmentPolicy,
    #[serde(default)]
    probes: serde_yaml::Mapping,
}

/// Load a benchmark configuration from a JSON-superset document with top level `browsers`,
/// `env` and `probes` keys. Browser and probe order follows the document.
pub fn load_benchmark_config(text: &str) -> Result<BenchmarkConfig, ConfigError> {
    let document: RawBenchmarkDocument =
        serde_yaml::from_str(text).map_err(|e| ConfigError::Document(e.to_string()))?;

    let mut browsers = Vec::with_capacity(document.browsers.len());
    for (name, value) in document.browsers {
        let name = name
            .as_str()
            .ok_or_else(|| {
                ConfigError::Document(format!("browser name is not a string: {name:?}"))
            })?
            .to_string();
        let raw: RawBrowser = serde_yaml::from_value(value)
            .map_err(|e| ConfigError::Document(format!("browser `{name}`: {e}")))?;
        browsers.push(BrowserConfig {
            name,
            path: raw.path,
            flags: raw.flags.iter().map(|flag| Flag::parse(flag)).collect(),
        });
    }

    let mut probes = Vec::with_capacity(document.probes.len());
    for (name, value) in document.probes {
        let name = name
            .as_str()
            .ok_or_else(|| ConfigError::Document(format!("probe name is not a string: {name:?}")))?
            .to_string();
        probes.push(ProbeConfig::from_document(name, value)?);
    }

    log::debug!(
        "Loaded benchmark config with {} browsers and {} probes",
        browsers.len(),
        probes.len()
    );

    Ok(BenchmarkConfig {
        browsers,
        env: document.env,
        probes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOCUMENT: &str = r#"
browsers:
  chrome-stable:
    path: /usr/bin/google-chrome
    flags:
      - --headless=new
      - --no-first-run
  firefox:
    path: /usr/bin/firefox
env:
  disk_min_free_space_gib: 4
  browser_allow_existing_process: false
probes:
  v8.log:
    prof: true
  system.stats:
    interval: 100ms
"#;

    #[test]
    fn loads_browsers_in_document_order() {
        let config = load_benchmark_config(DOCUMENT).unwrap();
        let names: Vec<&str> = config.browsers.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["chrome-stable", "firefox"]);
        assert_eq!(config.browsers[0].flags.len(), 2);
        assert_eq!(config.browsers[0].flags[0].key(), "--headless");
    }

    #[test]
    fn loads_env_and_probes() {
        let config = load_benchmark_config(DOCUMENT).unwrap();
        assert_eq!(config.env.disk_min_free_space_gib, Some(4.0));
        assert_eq!(config.probes.len(), 2);
        assert_eq!(config.probes[0].name, "v8.log");
    }

    #[test]
    fn browser_selection_rejects_unknown_names() {
        let mut config = load_benchmark_config(DOCUMENT).unwrap();
        let err = config.select_browsers(&["opera".to_string()]).unwrap_err();
        assert_eq!(err, ConfigError::UnknownBrowser { name: "opera".to_string() });

        config.select_browsers(&["firefox".to_string()]).unwrap();
        assert_eq!(config.browsers.len(), 1);
        assert_eq!(config.browsers[0].name, "firefox");
    }

    #[test]
    fn all_top_level_keys_are_optional() {
        let config = load_benchmark_config("browsers: {}").unwrap();
        assert!(config.browsers.is_empty());
        assert!(config.env.is_unchecked());
    }
}
