use serde::{Deserialize, Serialize};

/// Required host-environment conditions, checked once before any browser session opens.
///
/// Every field is optional; an absent option is simply not checked. Unknown option names in
/// the document are rejected so that a typo never silently disables a check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentPolicy {
    /// Minimum free disk space, in GiB, on the results filesystem.
    pub disk_min_free_space_gib: Option<f64>,
    /// Whether the host must (or must not) be running on battery power.
    pub power_use_battery: Option<bool>,
    /// Required main display brightness in percent.
    pub screen_brightness_percent: Option<u8>,
    /// Whether automatic brightness adjustment is acceptable during a run.
    pub screen_allow_autobrightness: Option<bool>,
    /// Maximum acceptable host CPU usage in percent.
    pub cpu_max_usage_percent: Option<f64>,
    /// Minimum relative CPU speed; below 1.0 indicates thermal throttling.
    pub cpu_min_relative_speed: Option<f64>,
    /// Whether background monitoring daemons are acceptable during a run.
    pub system_allow_monitoring: Option<bool>,
    /// Process names that must not be running on the host.
    pub system_forbidden_process_names: Option<Vec<String>>,
    /// Whether a pre-existing process of a benchmarked browser is acceptable.
    pub browser_allow_existing_process: Option<bool>,
    /// Whether the browsers are expected to run headless.
    pub browser_is_headless: Option<bool>,
    /// Whether the run requires at least one probe to be configured.
    pub require_probes: Option<bool>,
}

impl EnvironmentPolicy {
    /// True when no option is declared, meaning the precheck has nothing to evaluate.
    pub fn is_unchecked(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_options_are_unchecked() {
        let policy: EnvironmentPolicy = serde_yaml::from_str("{}").unwrap();
        assert!(policy.is_unchecked());
    }

    #[test]
    fn declared_options_deserialize() {
        let policy: EnvironmentPolicy = serde_yaml::from_str(
            r#"
disk_min_free_space_gib: 8
screen_allow_autobrightness: false
system_forbidden_process_names: [dropbox, backupd]
"#,
        )
        .unwrap();
        assert_eq!(policy.disk_min_free_space_gib, Some(8.0));
        assert_eq!(policy.screen_allow_autobrightness, Some(false));
        assert_eq!(
            policy.system_forbidden_process_names.as_deref().unwrap(),
            ["dropbox".to_string(), "backupd".to_string()]
        );
        assert!(!policy.is_unchecked());
    }

    #[test]
    fn unknown_option_is_rejected() {
        let result: Result<EnvironmentPolicy, _> = serde_yaml::from_str("full_moon_only: true");
        assert!(result.is_err());
    }
}
