use std::path::Path;

use sysinfo::{Disks, ProcessesToUpdate, System};

/// Process names that indicate an active monitoring or profiling tool on the host.
const MONITORING_PROCESS_NAMES: &[&str] = &["activity monitor", "perf", "dtrace", "instruments"];

/// Read-only view of the host machine, consumed by the environment precheck.
///
/// Separated behind a trait so the precheck logic is testable without a real machine; the
/// production implementation is [SysinfoHost].
pub trait HostState {
    /// Free space on the filesystem holding the results directory, in GiB.
    fn free_disk_space_gib(&self) -> f64;

    /// Whether the host is currently running on battery power.
    fn battery_powered(&self) -> bool;

    /// Current overall CPU usage across all cores, in percent.
    fn cpu_usage_percent(&self) -> f64;

    /// Current CPU speed relative to the nominal maximum. Below 1.0 suggests thermal
    /// throttling or a power-saving governor.
    fn relative_cpu_speed(&self) -> f64;

    /// Main display brightness in percent, if the host exposes it.
    fn screen_brightness_percent(&self) -> Option<u8>;

    /// Whether automatic brightness adjustment is enabled, if the host exposes it.
    fn autobrightness_enabled(&self) -> Option<bool>;

    /// Names of all processes currently running on the host, lowercased.
    fn process_names(&self) -> Vec<String>;

    /// Whether a monitoring or profiling tool is active on the host.
    fn monitoring_active(&self) -> bool {
        let names = self.process_names();
        MONITORING_PROCESS_NAMES
            .iter()
            .any(|monitor| names.iter().any(|name| name == monitor))
    }

    /// Whether the host has a graphical display attached.
    fn has_display(&self) -> bool;
}

/// Host sensing backed by `sysinfo`, with sysfs fallbacks for values sysinfo does not cover.
#[derive(Debug, Default)]
pub struct SysinfoHost;

impl SysinfoHost {
    pub fn new() -> Self {
        Self
    }
}

impl HostState for SysinfoHost {
    fn free_disk_space_gib(&self) -> f64 {
        let disks = Disks::new_with_refreshed_list();
        let cwd = std::env::current_dir().unwrap_or_else(|_| "/".into());

        // The disk whose mount point is the deepest prefix of the working directory holds
        // the results.
        disks
            .iter()
            .filter(|disk| cwd.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .map(|disk| disk.available_space() as f64 / (1024.0 * 1024.0 * 1024.0))
            .unwrap_or(0.0)
    }

    fn battery_powered(&self) -> bool {
        let Ok(entries) = std::fs::read_dir("/sys/class/power_supply") else {
            return false;
        };
        for entry in entries.flatten() {
            let kind = read_sysfs_string(&entry.path().join("type"));
            if kind.as_deref() == Some("Mains") {
                if let Some(online) = read_sysfs_u64(&entry.path().join("online")) {
                    return online == 0;
                }
            }
        }
        false
    }

    fn cpu_usage_percent(&self) -> f64 {
        let mut system = System::new();
        system.refresh_cpu_usage();
        // CPU usage is a delta, two refreshes are needed for a meaningful value.
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_cpu_usage();
        system.global_cpu_usage() as f64
    }

    fn relative_cpu_speed(&self) -> f64 {
        let cpufreq = Path::new("/sys/devices/system/cpu/cpu0/cpufreq");
        match (
            read_sysfs_u64(&cpufreq.join("scaling_cur_freq")),
            read_sysfs_u64(&cpufreq.join("scaling_max_freq")),
        ) {
            (Some(current), Some(max)) if max > 0 => current as f64 / max as f64,
            _ => 1.0,
        }
    }

    fn screen_brightness_percent(&self) -> Option<u8> {
        let entries = std::fs::read_dir("/sys/class/backlight").ok()?;
        for entry in entries.flatten() {
            let current = read_sysfs_u64(&entry.path().join("brightness"));
            let max = read_sysfs_u64(&entry.path().join("max_brightness"));
            if let (Some(current), Some(max)) = (current, max) {
                if max > 0 {
                    return Some((current * 100 / max) as u8);
                }
            }
        }
        None
    }

    fn autobrightness_enabled(&self) -> Option<bool> {
        // Not exposed uniformly across platforms.
        None
    }

    fn process_names(&self) -> Vec<String> {
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::All, true);
        let mut names: Vec<String> = system
            .processes()
            .values()
            .map(|process| process.name().to_string_lossy().to_lowercase())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn has_display(&self) -> bool {
        std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some()
    }
}

fn read_sysfs_string(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
}

fn read_sysfs_u64(path: &Path) -> Option<u64> {
    read_sysfs_string(path)?.parse().ok()
}
