//! Null-object probe for hosts without a supported foreground-window API.
//!
//! This exists so the tracker can be constructed and run everywhere; it simply
//! never observes an application.

use super::types::{ForegroundWindow, HealthSnapshot, HostInfo};
use super::PlatformProbe;
use uuid::Uuid;

/// A probe that observes nothing.
#[derive(Debug)]
pub struct NoopProbe {
    hardware_id: String,
}

impl NoopProbe {
    pub fn new() -> Self {
        Self {
            hardware_id: Uuid::new_v4().to_string(),
        }
    }
}

impl Default for NoopProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformProbe for NoopProbe {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn foreground_window(&self) -> ForegroundWindow {
        ForegroundWindow::unavailable()
    }

    fn health(&self) -> HealthSnapshot {
        HealthSnapshot::default()
    }

    fn hardware_id(&self) -> String {
        self.hardware_id.clone()
    }

    fn host_info(&self) -> HostInfo {
        HostInfo {
            name: "unknown".to_string(),
            os: std::env::consts::OS.to_string(),
            ..HostInfo::default()
        }
    }

    fn process_count(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_probe_observes_nothing() {
        let probe = NoopProbe::new();
        assert!(!probe.foreground_window().is_known());
        assert_eq!(probe.health(), HealthSnapshot::default());
        assert_eq!(probe.hardware_id(), probe.hardware_id());
    }
}
