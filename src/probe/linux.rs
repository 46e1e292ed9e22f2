//! Linux foreground window lookup via `xdotool` (X11).
//!
//! Wayland compositors do not expose the focused window to other clients,
//! so on those sessions every lookup fails and the probe reports an empty window.

use super::command::run_with_timeout;
use super::system::SystemSampler;
use super::types::ForegroundWindow;
use super::ProbeError;
use std::time::Duration;

const MACHINE_ID_PATHS: [&str; 2] = ["/etc/machine-id", "/var/lib/dbus/machine-id"];

pub const PLATFORM_NAME: &str = "linux";

pub fn foreground_window(
    sampler: &SystemSampler,
    timeout: Duration,
) -> Result<ForegroundWindow, ProbeError> {
    let window_id = run_with_timeout("xdotool", &["getactivewindow"], timeout)?;
    if window_id.is_empty() {
        return Err(ProbeError::Unavailable("no active window".to_string()));
    }

    let window_title = run_with_timeout("xdotool", &["getwindowname", &window_id], timeout)?;
    let pid = run_with_timeout("xdotool", &["getwindowpid", &window_id], timeout)?
        .parse::<u32>()
        .map_err(|e| ProbeError::Parse(format!("window pid: {e}")))?;

    let application_name = sampler
        .process_name(pid)
        .ok_or_else(|| ProbeError::Unavailable(format!("process {pid} not found")))?;

    Ok(ForegroundWindow {
        application_name,
        window_title,
        pid: Some(pid),
    })
}

pub fn native_hardware_id(_timeout: Duration) -> Option<String> {
    MACHINE_ID_PATHS.iter().find_map(|path| {
        std::fs::read_to_string(path)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}
