//! Observation types returned by platform probes.
//!
//! Every field has an "unavailable" representation (empty string, `None`, zero)
//! so a probe can always answer, even when the host denies a capability.

use serde::{Deserialize, Serialize};

/// The application currently holding input focus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForegroundWindow {
    /// Process/application name, empty when unknown
    pub application_name: String,
    /// Title of the focused window, empty when unknown
    pub window_title: String,
    /// Owning process id, if the host reported one
    pub pid: Option<u32>,
}

impl ForegroundWindow {
    pub fn new(application_name: impl Into<String>, window_title: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            window_title: window_title.into(),
            pid: None,
        }
    }

    /// The empty observation returned when the foreground window cannot be read.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Whether this observation names an application.
    pub fn is_known(&self) -> bool {
        !self.application_name.trim().is_empty()
    }
}

/// Coarse device classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Desktop,
    Laptop,
    Mobile,
}

impl DeviceClass {
    /// Classify the host: mobile targets first, then battery presence.
    pub fn detect(has_battery: bool, processor: &str) -> Self {
        if cfg!(any(target_os = "android", target_os = "ios")) {
            return DeviceClass::Mobile;
        }
        if has_battery || processor.to_lowercase().contains("mobile") {
            DeviceClass::Laptop
        } else {
            DeviceClass::Desktop
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Desktop => "desktop",
            DeviceClass::Laptop => "laptop",
            DeviceClass::Mobile => "mobile",
        }
    }
}

/// Static description of the host used to build a device snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostInfo {
    pub name: String,
    pub os: String,
    pub os_version: String,
    pub processor: String,
    /// Total physical memory in GiB
    pub memory_gb: f64,
    pub has_battery: bool,
}

/// Point-in-time system health metrics.
///
/// Unmeasurable metrics are reported as zero, except battery which is `None`
/// on hosts without one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    /// Cumulative bytes received across all interfaces
    pub network_in_bytes: u64,
    /// Cumulative bytes sent across all interfaces
    pub network_out_bytes: u64,
    pub battery_percent: Option<f64>,
    pub process_count: usize,
}
