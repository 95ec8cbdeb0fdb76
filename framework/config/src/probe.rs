use crosslane_core::prelude::ConfigError;

/// Configuration for one probe: the probe type name and its probe-specific parameters.
///
/// The parameter values are opaque at this level; each probe implementation interprets its
/// own parameters and rejects invalid ones with a [ConfigError]. The one parameter shared by
/// all probes is `required`: a required probe's failure aborts the whole planned run instead
/// of being isolated.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    pub name: String,
    pub required: bool,
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl ProbeConfig {
    /// A probe selected by name only, with default parameters.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            params: serde_json::Map::new(),
        }
    }

    pub(crate) fn from_document(
        name: String,
        value: serde_yaml::Value,
    ) -> Result<Self, ConfigError> {
        let params = serde_json::to_value(&value)
            .map_err(|e| ConfigError::Document(format!("probe `{name}`: {e}")))?;
        let mut params = match params {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            other => {
                return Err(ConfigError::Document(format!(
                    "probe `{name}`: expected a parameter mapping, got {other}"
                )))
            }
        };

        let required = match params.remove("required") {
            None => false,
            Some(serde_json::Value::Bool(required)) => required,
            Some(other) => {
                return Err(ConfigError::InvalidProbeParam {
                    probe: name,
                    param: "required".to_string(),
                    reason: format!("expected a boolean, got {other}"),
                })
            }
        };

        Ok(Self {
            name,
            required,
            params,
        })
    }
}
