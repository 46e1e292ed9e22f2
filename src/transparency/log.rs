//! Transparency log of what the agent observed and produced.
//!
//! Only counts are kept here. Application names, window titles and
//! suggestion text never enter this log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Transparency counters for the current process.
#[derive(Debug)]
pub struct TransparencyLog {
    /// Activity records handed to consumers
    activity_records: AtomicU64,
    /// Switches whose outgoing dwell was too short to record
    debounced_switches: AtomicU64,
    /// Health samples taken
    health_samples: AtomicU64,
    /// Foreground probes that returned nothing
    probe_failures: AtomicU64,
    /// Events dropped because the consumer fell behind
    events_dropped: AtomicU64,
    /// Suggestions generated (fallbacks included)
    suggestions_generated: AtomicU64,
    /// Feedback events that updated a value estimate
    feedback_applied: AtomicU64,
    /// Feedback events that matched no retained suggestion
    feedback_unmatched: AtomicU64,
    session_start: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl TransparencyLog {
    pub fn new() -> Self {
        Self {
            activity_records: AtomicU64::new(0),
            debounced_switches: AtomicU64::new(0),
            health_samples: AtomicU64::new(0),
            probe_failures: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            suggestions_generated: AtomicU64::new(0),
            feedback_applied: AtomicU64::new(0),
            feedback_unmatched: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a log that loads from and saves to `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            warn!("could not load previous transparency stats: {e}");
        }

        log
    }

    pub fn record_activity(&self) {
        self.activity_records.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_debounced_switch(&self) {
        self.debounced_switches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_health_sample(&self) {
        self.health_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_probe_failure(&self) {
        self.probe_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_suggestions(&self, count: u64) {
        self.suggestions_generated.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_feedback_applied(&self) {
        self.feedback_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_feedback_unmatched(&self) {
        self.feedback_unmatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> TransparencyStats {
        TransparencyStats {
            activity_records: self.activity_records.load(Ordering::Relaxed),
            debounced_switches: self.debounced_switches.load(Ordering::Relaxed),
            health_samples: self.health_samples.load(Ordering::Relaxed),
            probe_failures: self.probe_failures.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            suggestions_generated: self.suggestions_generated.load(Ordering::Relaxed),
            feedback_applied: self.feedback_applied.load(Ordering::Relaxed),
            feedback_unmatched: self.feedback_unmatched.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Activity records emitted: {}\n\
             - Switches debounced: {}\n\
             - Health samples taken: {}\n\
             - Empty foreground probes: {}\n\
             - Events dropped: {}\n\
             - Suggestions generated: {}\n\
             - Feedback applied: {} (unmatched: {})\n\
             - Session duration: {} seconds\n\
             \n\
             Privacy Guarantee:\n\
             - No keystrokes or screen contents captured\n\
             - Window titles stay in memory and in the event stream only\n\
             - Nothing is sent over the network",
            stats.activity_records,
            stats.debounced_switches,
            stats.health_samples,
            stats.probe_failures,
            stats.events_dropped,
            stats.suggestions_generated,
            stats.feedback_applied,
            stats.feedback_unmatched,
            stats.session_duration_secs
        )
    }

    /// Save cumulative counters to disk. A no-op without a persistence path.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                activity_records: stats.activity_records,
                debounced_switches: stats.debounced_switches,
                health_samples: stats.health_samples,
                probe_failures: stats.probe_failures,
                events_dropped: stats.events_dropped,
                suggestions_generated: stats.suggestions_generated,
                feedback_applied: stats.feedback_applied,
                feedback_unmatched: stats.feedback_unmatched,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.activity_records
                    .store(persisted.activity_records, Ordering::Relaxed);
                self.debounced_switches
                    .store(persisted.debounced_switches, Ordering::Relaxed);
                self.health_samples
                    .store(persisted.health_samples, Ordering::Relaxed);
                self.probe_failures
                    .store(persisted.probe_failures, Ordering::Relaxed);
                self.events_dropped
                    .store(persisted.events_dropped, Ordering::Relaxed);
                self.suggestions_generated
                    .store(persisted.suggestions_generated, Ordering::Relaxed);
                self.feedback_applied
                    .store(persisted.feedback_applied, Ordering::Relaxed);
                self.feedback_unmatched
                    .store(persisted.feedback_unmatched, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    pub fn reset(&self) {
        for counter in [
            &self.activity_records,
            &self.debounced_switches,
            &self.health_samples,
            &self.probe_failures,
            &self.events_dropped,
            &self.suggestions_generated,
            &self.feedback_applied,
            &self.feedback_unmatched,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of transparency counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub activity_records: u64,
    pub debounced_switches: u64,
    pub health_samples: u64,
    pub probe_failures: u64,
    pub events_dropped: u64,
    pub suggestions_generated: u64,
    pub feedback_applied: u64,
    pub feedback_unmatched: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    #[serde(default)]
    activity_records: u64,
    #[serde(default)]
    debounced_switches: u64,
    #[serde(default)]
    health_samples: u64,
    #[serde(default)]
    probe_failures: u64,
    #[serde(default)]
    events_dropped: u64,
    #[serde(default)]
    suggestions_generated: u64,
    #[serde(default)]
    feedback_applied: u64,
    #[serde(default)]
    feedback_unmatched: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedTransparencyLog {
    Arc::new(TransparencyLog::with_persistence(path))
}
