//! Host metrics shared by every platform probe, read through `sysinfo`.

use super::types::{HealthSnapshot, HostInfo};
use std::sync::Mutex;
use sysinfo::{Disks, Networks, Pid, ProcessesToUpdate, System};

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Wraps long-lived `sysinfo::System`s so CPU usage can be computed as a
/// delta between consecutive refreshes.
///
/// Health sampling and pid lookup use separate instances: a full process
/// refresh on the health path never holds up the switch path.
pub struct SystemSampler {
    system: Mutex<System>,
    lookup: Mutex<System>,
}

impl SystemSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        // Baseline refresh so the first real sample has something to diff against.
        system.refresh_cpu_usage();
        Self {
            system: Mutex::new(system),
            lookup: Mutex::new(System::new()),
        }
    }

    /// Take a health snapshot. Metrics that cannot be read are left at zero.
    pub fn health(&self) -> HealthSnapshot {
        let Ok(mut system) = self.system.lock() else {
            return HealthSnapshot::default();
        };

        system.refresh_cpu_usage();
        system.refresh_memory();
        system.refresh_processes(ProcessesToUpdate::All, true);

        let memory_percent = percent(system.used_memory(), system.total_memory());
        let cpu_percent = f64::from(system.global_cpu_usage());
        let process_count = system.processes().len();
        drop(system);

        let (network_in_bytes, network_out_bytes) = network_totals();

        HealthSnapshot {
            cpu_percent,
            memory_percent,
            disk_percent: root_disk_percent(),
            network_in_bytes,
            network_out_bytes,
            battery_percent: battery_percent(),
            process_count,
        }
    }

    /// Describe the host for device snapshots.
    pub fn host_info(&self) -> HostInfo {
        let (processor, total_memory) = match self.system.lock() {
            Ok(mut system) => {
                system.refresh_cpu_all();
                system.refresh_memory();
                let processor = system
                    .cpus()
                    .first()
                    .map(|cpu| cpu.brand().trim().to_string())
                    .unwrap_or_default();
                (processor, system.total_memory())
            }
            Err(_) => (String::new(), 0),
        };

        let name = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .ok()
            .or_else(System::host_name)
            .unwrap_or_else(|| "unknown".to_string());

        HostInfo {
            name,
            os: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
            os_version: System::os_version().unwrap_or_default(),
            processor,
            memory_gb: total_memory as f64 / BYTES_PER_GIB,
            has_battery: battery_percent().is_some(),
        }
    }

    /// Number of live processes.
    pub fn process_count(&self) -> usize {
        match self.system.lock() {
            Ok(mut system) => {
                system.refresh_processes(ProcessesToUpdate::All, true);
                system.processes().len()
            }
            Err(_) => 0,
        }
    }

    /// Resolve a pid to its process name.
    pub fn process_name(&self, pid: u32) -> Option<String> {
        let mut system = self.lookup.lock().ok()?;
        let pid = Pid::from_u32(pid);
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        system
            .process(pid)
            .map(|process| process.name().to_string_lossy().to_string())
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}

/// Usage of the disk mounted at the filesystem root (or the first disk).
fn root_disk_percent() -> f64 {
    let disks = Disks::new_with_refreshed_list();
    let root = disks
        .iter()
        .find(|disk| disk.mount_point().parent().is_none())
        .or_else(|| disks.iter().next());

    root.map(|disk| {
        let total = disk.total_space();
        percent(total.saturating_sub(disk.available_space()), total)
    })
    .unwrap_or(0.0)
}

fn network_totals() -> (u64, u64) {
    let networks = Networks::new_with_refreshed_list();
    networks.iter().fold((0, 0), |(rx, tx), (_, data)| {
        (
            rx.saturating_add(data.total_received()),
            tx.saturating_add(data.total_transmitted()),
        )
    })
}

#[cfg(target_os = "linux")]
fn battery_percent() -> Option<f64> {
    let entries = std::fs::read_dir("/sys/class/power_supply").ok()?;
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("BAT"))
        .find_map(|entry| {
            std::fs::read_to_string(entry.path().join("capacity"))
                .ok()
                .and_then(|s| s.trim().parse::<f64>().ok())
        })
}

#[cfg(not(target_os = "linux"))]
fn battery_percent() -> Option<f64> {
    None
}
