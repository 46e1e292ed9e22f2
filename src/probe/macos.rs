//! macOS foreground window lookup via System Events (AppleScript).
//!
//! Reading the window title requires the Accessibility permission; without it
//! the title comes back empty while the application name still resolves.

use super::command::run_with_timeout;
use super::system::SystemSampler;
use super::types::ForegroundWindow;
use super::ProbeError;
use std::time::Duration;

pub const PLATFORM_NAME: &str = "macos";

/// Fields are joined with a line feed so titles containing commas survive.
const FRONT_WINDOW_SCRIPT: &str = r#"
tell application "System Events"
    set frontProc to first application process whose frontmost is true
    set frontApp to name of frontProc
    set frontPid to unix id of frontProc
    set windowTitle to ""
    try
        tell frontProc
            if exists (1st window whose value of attribute "AXMain" is true) then
                set windowTitle to name of 1st window whose value of attribute "AXMain" is true
            end if
        end tell
    end try
    return frontApp & linefeed & (frontPid as text) & linefeed & windowTitle
end tell
"#;

pub fn foreground_window(
    _sampler: &SystemSampler,
    timeout: Duration,
) -> Result<ForegroundWindow, ProbeError> {
    let output = run_with_timeout("osascript", &["-e", FRONT_WINDOW_SCRIPT], timeout)?;
    parse_script_output(&output)
}

fn parse_script_output(output: &str) -> Result<ForegroundWindow, ProbeError> {
    let mut lines = output.lines();
    let application_name = lines
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProbeError::Parse("empty osascript output".to_string()))?
        .to_string();
    let pid = lines.next().and_then(|s| s.trim().parse::<u32>().ok());
    let window_title = lines.collect::<Vec<_>>().join("\n").trim().to_string();

    Ok(ForegroundWindow {
        application_name,
        window_title,
        pid,
    })
}

pub fn native_hardware_id(timeout: Duration) -> Option<String> {
    let output = run_with_timeout(
        "ioreg",
        &["-rd1", "-c", "IOPlatformExpertDevice"],
        timeout,
    )
    .ok()?;

    ["IOPlatformUUID", "IOPlatformSerialNumber"]
        .iter()
        .find_map(|key| {
            output
                .lines()
                .find(|line| line.contains(key))
                .and_then(|line| line.rsplit('"').nth(1))
                .map(str::to_string)
        })
}
