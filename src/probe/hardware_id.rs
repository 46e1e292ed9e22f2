//! Stable hardware identifier resolution.
//!
//! Resolution order:
//! 1. An OS-native identifier supplied by the platform probe
//! 2. A locally cached identifier (created once, read thereafter)
//! 3. A random identifier that only lives as long as the process
//!
//! The last tier is not stable across restarts, so records produced under it
//! cannot be deduplicated against earlier runs.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Name of the cache file inside the agent's data directory.
pub const HARDWARE_ID_FILE: &str = "hardware_id";

/// Where a resolved identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardwareIdSource {
    Native,
    Cached,
    Ephemeral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareId {
    pub value: String,
    pub source: HardwareIdSource,
}

/// Resolves the hardware identifier once per process and memoises it.
#[derive(Debug)]
pub struct HardwareIdResolver {
    cache_path: PathBuf,
    resolved: OnceLock<HardwareId>,
}

impl HardwareIdResolver {
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            resolved: OnceLock::new(),
        }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Resolve the identifier, consulting `native` only on first use.
    pub fn resolve<F>(&self, native: F) -> &HardwareId
    where
        F: FnOnce() -> Option<String>,
    {
        self.resolved.get_or_init(|| {
            if let Some(value) = native().map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
                debug!("using native hardware id");
                return HardwareId {
                    value,
                    source: HardwareIdSource::Native,
                };
            }

            match read_or_create_cached(&self.cache_path) {
                Ok(value) => HardwareId {
                    value,
                    source: HardwareIdSource::Cached,
                },
                Err(e) => {
                    warn!(
                        path = %self.cache_path.display(),
                        "hardware id cache unusable ({e}); using a process-lifetime id, \
                         records from this run will not deduplicate across restarts"
                    );
                    HardwareId {
                        value: Uuid::new_v4().to_string(),
                        source: HardwareIdSource::Ephemeral,
                    }
                }
            }
        })
    }
}

/// Read the cached id, creating it if absent.
///
/// Creation uses create-new semantics so that when two processes race, the
/// first writer wins and the loser reads the winner's value.
fn read_or_create_cached(path: &Path) -> std::io::Result<String> {
    if let Some(existing) = read_cached(path)? {
        return Ok(existing);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let generated = generate_host_id();
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(generated.as_bytes())?;
            file.sync_all()?;
            Ok(generated)
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => read_cached(path)?.ok_or_else(|| {
            std::io::Error::new(ErrorKind::InvalidData, "hardware id cache is empty")
        }),
        Err(e) => Err(e),
    }
}

fn read_cached(path: &Path) -> std::io::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let value = content.trim();
            Ok((!value.is_empty()).then(|| value.to_string()))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Name-based id derived from the hostname, so a lost cache regenerates the same value.
fn generate_host_id() -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| Uuid::new_v4().to_string());
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, host.as_bytes()).to_string()
}
