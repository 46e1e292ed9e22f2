//! Probe backed by the current host's native APIs.

use super::hardware_id::HardwareIdResolver;
use super::platform;
use super::system::SystemSampler;
use super::types::{ForegroundWindow, HealthSnapshot, HostInfo};
use super::{PlatformProbe, ProbeConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// The probe for supported operating systems.
pub struct HostProbe {
    config: ProbeConfig,
    sampler: SystemSampler,
    hardware: HardwareIdResolver,
    foreground_warned: AtomicBool,
}

impl HostProbe {
    pub fn new(config: ProbeConfig) -> Self {
        let hardware = HardwareIdResolver::new(config.hardware_id_path.clone());
        Self {
            config,
            sampler: SystemSampler::new(),
            hardware,
            foreground_warned: AtomicBool::new(false),
        }
    }
}

impl PlatformProbe for HostProbe {
    fn name(&self) -> &'static str {
        platform::PLATFORM_NAME
    }

    fn foreground_window(&self) -> ForegroundWindow {
        match platform::foreground_window(&self.sampler, self.config.timeout) {
            Ok(window) => window,
            Err(e) => {
                // Capability loss is logged once; repeats go to debug.
                if !self.foreground_warned.swap(true, Ordering::Relaxed) {
                    warn!(platform = self.name(), "foreground window unavailable: {e}");
                } else {
                    debug!("foreground window unavailable: {e}");
                }
                ForegroundWindow::unavailable()
            }
        }
    }

    fn health(&self) -> HealthSnapshot {
        self.sampler.health()
    }

    fn hardware_id(&self) -> String {
        let timeout = self.config.timeout;
        self.hardware
            .resolve(|| platform::native_hardware_id(timeout))
            .value
            .clone()
    }

    fn host_info(&self) -> HostInfo {
        self.sampler.host_info()
    }

    fn process_count(&self) -> usize {
        self.sampler.process_count()
    }
}
