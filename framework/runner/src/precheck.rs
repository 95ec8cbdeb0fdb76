use crosslane_config::{BrowserConfig, EnvironmentPolicy};
use crosslane_core::prelude::{EnvironmentPrecheckError, Violation};

use crate::host::HostState;

/// Validate the host against the declared environment policy.
///
/// Runs exactly once per invocation, before any browser session opens. Every declared option
/// is evaluated even after one fails, so the returned error carries the complete violation
/// list. Absent options check nothing.
pub fn validate(
    policy: &EnvironmentPolicy,
    host: &dyn HostState,
    browsers: &[BrowserConfig],
    probe_count: usize,
) -> Result<(), EnvironmentPrecheckError> {
    if policy.is_unchecked() {
        return Ok(());
    }

    let mut violations = Vec::new();
    let mut violate = |option: &str, message: String| {
        violations.push(Violation {
            option: option.to_string(),
            message,
        });
    };

    if let Some(min_gib) = policy.disk_min_free_space_gib {
        let free = host.free_disk_space_gib();
        if free < min_gib {
            violate(
                "disk_min_free_space_gib",
                format!("{free:.1} GiB free, need at least {min_gib:.1} GiB; free up disk space"),
            );
        }
    }

    if let Some(expect_battery) = policy.power_use_battery {
        let on_battery = host.battery_powered();
        if on_battery != expect_battery {
            let message = if expect_battery {
                "host is on mains power, unplug it to run on battery"
            } else {
                "host is on battery power, connect it to mains"
            };
            violate("power_use_battery", message.to_string());
        }
    }

    if let Some(expected) = policy.screen_brightness_percent {
        match host.screen_brightness_percent() {
            Some(actual) if actual == expected => {}
            Some(actual) => violate(
                "screen_brightness_percent",
                format!("display brightness is {actual}%, set it to {expected}%"),
            ),
            None => violate(
                "screen_brightness_percent",
                "display brightness cannot be read on this host".to_string(),
            ),
        }
    }

    if policy.screen_allow_autobrightness == Some(false)
        && host.autobrightness_enabled() == Some(true)
    {
        violate(
            "screen_allow_autobrightness",
            "automatic brightness adjustment is enabled, disable it".to_string(),
        );
    }

    if let Some(max_usage) = policy.cpu_max_usage_percent {
        let usage = host.cpu_usage_percent();
        if usage > max_usage {
            violate(
                "cpu_max_usage_percent",
                format!("CPU usage is {usage:.1}%, must be at most {max_usage:.1}%; close other programs"),
            );
        }
    }

    if let Some(min_speed) = policy.cpu_min_relative_speed {
        let speed = host.relative_cpu_speed();
        if speed < min_speed {
            violate(
                "cpu_min_relative_speed",
                format!(
                    "relative CPU speed is {speed:.2}, must be at least {min_speed:.2}; the CPU may be thermally throttled"
                ),
            );
        }
    }

    if policy.system_allow_monitoring == Some(false) && host.monitoring_active() {
        violate(
            "system_allow_monitoring",
            "a monitoring or profiling tool is running, close it".to_string(),
        );
    }

    let process_names = host.process_names();

    if let Some(forbidden) = &policy.system_forbidden_process_names {
        for name in forbidden {
            if process_names.contains(&name.to_lowercase()) {
                violate(
                    "system_forbidden_process_names",
                    format!("forbidden process `{name}` is running, stop it"),
                );
            }
        }
    }

    if policy.browser_allow_existing_process == Some(false) {
        for browser in browsers {
            let Some(executable) = browser.executable_name() else {
                continue;
            };
            if process_names.contains(&executable.to_lowercase()) {
                violate(
                    "browser_allow_existing_process",
                    format!(
                        "`{executable}` is already running, close it before benchmarking `{}`",
                        browser.name
                    ),
                );
            }
        }
    }

    if let Some(expect_headless) = policy.browser_is_headless {
        for browser in browsers {
            if browser.is_headless() != expect_headless {
                let message = if expect_headless {
                    format!("browser `{}` is not configured headless", browser.name)
                } else {
                    format!("browser `{}` is configured headless", browser.name)
                };
                violate("browser_is_headless", message);
            }
        }
        if !expect_headless && !host.has_display() {
            violate(
                "browser_is_headless",
                "headful browsers requested but the host has no display".to_string(),
            );
        }
    }

    if policy.require_probes == Some(true) && probe_count == 0 {
        violate(
            "require_probes",
            "no probes are configured, add at least one".to_string(),
        );
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(EnvironmentPrecheckError { violations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosslane_config::Flag;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    struct StubHost {
        free_disk_gib: f64,
        on_battery: bool,
        cpu_usage: f64,
        cpu_speed: f64,
        brightness: Option<u8>,
        autobrightness: Option<bool>,
        processes: Vec<String>,
        display: bool,
    }

    impl Default for StubHost {
        fn default() -> Self {
            Self {
                free_disk_gib: 100.0,
                on_battery: false,
                cpu_usage: 5.0,
                cpu_speed: 1.0,
                brightness: Some(80),
                autobrightness: Some(false),
                processes: vec!["systemd".to_string(), "sshd".to_string()],
                display: true,
            }
        }
    }

    impl HostState for StubHost {
        fn free_disk_space_gib(&self) -> f64 {
            self.free_disk_gib
        }
        fn battery_powered(&self) -> bool {
            self.on_battery
        }
        fn cpu_usage_percent(&self) -> f64 {
            self.cpu_usage
        }
        fn relative_cpu_speed(&self) -> f64 {
            self.cpu_speed
        }
        fn screen_brightness_percent(&self) -> Option<u8> {
            self.brightness
        }
        fn autobrightness_enabled(&self) -> Option<bool> {
            self.autobrightness
        }
        fn process_names(&self) -> Vec<String> {
            self.processes.clone()
        }
        fn has_display(&self) -> bool {
            self.display
        }
    }

    fn browser(name: &str, flags: &[&str]) -> BrowserConfig {
        BrowserConfig {
            name: name.to_string(),
            path: PathBuf::from(format!("/usr/bin/{name}")),
            flags: flags.iter().map(|f| Flag::parse(f)).collect(),
        }
    }

    fn violated_options(error: &EnvironmentPrecheckError) -> Vec<&str> {
        error
            .violations
            .iter()
            .map(|v| v.option.as_str())
            .collect()
    }

    #[test]
    fn empty_policy_checks_nothing() {
        let host = StubHost {
            free_disk_gib: 0.0,
            cpu_usage: 100.0,
            ..StubHost::default()
        };
        assert!(validate(&EnvironmentPolicy::default(), &host, &[], 0).is_ok());
    }

    #[test]
    fn satisfied_policy_passes() {
        let policy = EnvironmentPolicy {
            disk_min_free_space_gib: Some(8.0),
            cpu_max_usage_percent: Some(50.0),
            power_use_battery: Some(false),
            require_probes: Some(true),
            ..EnvironmentPolicy::default()
        };
        assert!(validate(&policy, &StubHost::default(), &[], 1).is_ok());
    }

    #[test]
    fn all_violations_are_reported_not_just_the_first() {
        let policy = EnvironmentPolicy {
            disk_min_free_space_gib: Some(8.0),
            cpu_max_usage_percent: Some(50.0),
            require_probes: Some(true),
            ..EnvironmentPolicy::default()
        };
        let host = StubHost {
            free_disk_gib: 2.0,
            cpu_usage: 90.0,
            ..StubHost::default()
        };

        let error = validate(&policy, &host, &[], 0).unwrap_err();
        assert_eq!(
            violated_options(&error),
            vec![
                "disk_min_free_space_gib",
                "cpu_max_usage_percent",
                "require_probes",
            ]
        );
    }

    #[test]
    fn battery_mismatch_is_reported_both_ways() {
        let must_be_on_battery = EnvironmentPolicy {
            power_use_battery: Some(true),
            ..EnvironmentPolicy::default()
        };
        let on_mains = StubHost::default();
        assert!(validate(&must_be_on_battery, &on_mains, &[], 0).is_err());

        let must_be_on_mains = EnvironmentPolicy {
            power_use_battery: Some(false),
            ..EnvironmentPolicy::default()
        };
        let on_battery = StubHost {
            on_battery: true,
            ..StubHost::default()
        };
        assert!(validate(&must_be_on_mains, &on_battery, &[], 0).is_err());
    }

    #[test]
    fn running_browser_process_violates_the_policy() {
        let policy = EnvironmentPolicy {
            browser_allow_existing_process: Some(false),
            ..EnvironmentPolicy::default()
        };
        let host = StubHost {
            processes: vec!["google-chrome".to_string()],
            ..StubHost::default()
        };

        let error = validate(&policy, &host, &[browser("google-chrome", &[])], 0).unwrap_err();
        assert_eq!(violated_options(&error), vec!["browser_allow_existing_process"]);

        // The same host passes when the benchmarked browser is a different binary.
        assert!(validate(&policy, &host, &[browser("firefox", &[])], 0).is_ok());
    }

    #[test]
    fn forbidden_process_names_match_case_insensitively() {
        let policy = EnvironmentPolicy {
            system_forbidden_process_names: Some(vec!["Dropbox".to_string()]),
            ..EnvironmentPolicy::default()
        };
        let host = StubHost {
            processes: vec!["dropbox".to_string()],
            ..StubHost::default()
        };
        assert!(validate(&policy, &host, &[], 0).is_err());
    }

    #[test]
    fn headless_expectation_checks_flags_and_display() {
        let policy = EnvironmentPolicy {
            browser_is_headless: Some(true),
            ..EnvironmentPolicy::default()
        };
        let headful = browser("chrome", &[]);
        let headless = browser("chrome", &["--headless=new"]);
        let host = StubHost::default();

        assert!(validate(&policy, &host, &[headful], 0).is_err());
        assert!(validate(&policy, &host, &[headless.clone()], 0).is_ok());

        let headful_policy = EnvironmentPolicy {
            browser_is_headless: Some(false),
            ..EnvironmentPolicy::default()
        };
        let no_display = StubHost {
            display: false,
            ..StubHost::default()
        };
        let error =
            validate(&headful_policy, &no_display, &[browser("chrome", &[])], 0).unwrap_err();
        assert_eq!(violated_options(&error), vec!["browser_is_headless"]);
    }

    #[test]
    fn throttled_cpu_is_a_violation() {
        let policy = EnvironmentPolicy {
            cpu_min_relative_speed: Some(0.9),
            ..EnvironmentPolicy::default()
        };
        let throttled = StubHost {
            cpu_speed: 0.5,
            ..StubHost::default()
        };
        assert!(validate(&policy, &throttled, &[], 0).is_err());
    }
}
