//! Platform probes for the Workflow Sensor Agent.
//!
//! A probe answers three questions about the host: which application is in
//! the foreground, how healthy the system is, and what stable identifier the
//! hardware has. Each supported OS gets a native implementation; every other
//! target gets [`NoopProbe`], which answers with empty observations.

pub mod command;
pub mod hardware_id;
pub mod noop;
pub mod system;
pub mod types;

#[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
pub mod host;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
use linux as platform;

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
use macos as platform;

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
use self::windows as platform;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub use hardware_id::{HardwareId, HardwareIdResolver, HardwareIdSource, HARDWARE_ID_FILE};
pub use noop::NoopProbe;
pub use types::{DeviceClass, ForegroundWindow, HealthSnapshot, HostInfo};

#[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
pub use host::HostProbe;

/// Configuration for host probes.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Upper bound for each external utility call
    pub timeout: Duration,
    /// Cache file for the fallback hardware identifier
    pub hardware_id_path: PathBuf,
}

/// Capability interface over the host OS.
///
/// Implementations never fail towards the caller: an unavailable capability
/// yields an empty or partial answer.
pub trait PlatformProbe: Send + Sync {
    /// Short platform label used in logs.
    fn name(&self) -> &'static str;

    /// The application and window currently holding input focus.
    fn foreground_window(&self) -> ForegroundWindow;

    /// A system health snapshot.
    fn health(&self) -> HealthSnapshot;

    /// A hardware identifier, stable across runs when the host allows it.
    fn hardware_id(&self) -> String;

    /// Static host description used to build device snapshots.
    fn host_info(&self) -> HostInfo;

    /// Number of running processes.
    fn process_count(&self) -> usize;
}

/// Errors raised inside probe implementations.
///
/// These never cross the [`PlatformProbe`] boundary; they are logged and
/// converted into empty observations.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("capability unavailable: {0}")]
    Unavailable(String),
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },
    #[error("{program} exited with status {code:?}")]
    ExitStatus { program: String, code: Option<i32> },
    #[error("unexpected output: {0}")]
    Parse(String),
}

/// Select the probe for the current host.
#[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
pub fn default_probe(config: ProbeConfig) -> Arc<dyn PlatformProbe> {
    Arc::new(HostProbe::new(config))
}

/// Select the probe for the current host.
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub fn default_probe(_config: ProbeConfig) -> Arc<dyn PlatformProbe> {
    Arc::new(NoopProbe::new())
}
