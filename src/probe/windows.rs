//! Windows foreground window lookup via the Win32 window manager API.

use super::command::run_with_timeout;
use super::system::SystemSampler;
use super::types::ForegroundWindow;
use super::ProbeError;
use std::time::Duration;
use windows::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, GetWindowTextW, GetWindowThreadProcessId,
};

pub const PLATFORM_NAME: &str = "windows";

const MAX_TITLE_LEN: usize = 512;

pub fn foreground_window(
    sampler: &SystemSampler,
    _timeout: Duration,
) -> Result<ForegroundWindow, ProbeError> {
    // SAFETY: these calls only read window manager state for the handle
    // returned by GetForegroundWindow; the title buffer outlives the call.
    let (window_title, pid) = unsafe {
        let hwnd = GetForegroundWindow();
        if hwnd.0.is_null() {
            return Err(ProbeError::Unavailable("no foreground window".to_string()));
        }

        let mut buffer = [0u16; MAX_TITLE_LEN];
        let len = GetWindowTextW(hwnd, &mut buffer);
        let title = String::from_utf16_lossy(&buffer[..len.max(0) as usize]);

        let mut pid: u32 = 0;
        GetWindowThreadProcessId(hwnd, Some(&mut pid));
        (title, pid)
    };

    if pid == 0 {
        return Err(ProbeError::Unavailable("foreground window has no process".to_string()));
    }

    let application_name = sampler
        .process_name(pid)
        .ok_or_else(|| ProbeError::Unavailable(format!("process {pid} not found")))?;

    Ok(ForegroundWindow {
        application_name,
        window_title,
        pid: Some(pid),
    })
}

pub fn native_hardware_id(timeout: Duration) -> Option<String> {
    let output = run_with_timeout("wmic", &["csproduct", "get", "uuid"], timeout).ok()?;
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.eq_ignore_ascii_case("uuid"))
        .map(str::to_string)
}
