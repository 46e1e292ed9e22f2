//! Records produced by the activity tracker.

use crate::probe::{DeviceClass, HealthSnapshot, HostInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The only activity type the tracker currently produces.
pub const APP_USAGE: &str = "app_usage";

/// Default context label for new sessions.
pub const DEFAULT_SESSION_CONTEXT: &str = "work";

/// Snapshot of the machine being tracked, taken once per `start()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: Uuid,
    pub name: String,
    pub device_class: DeviceClass,
    pub os: String,
    pub os_version: String,
    pub processor: String,
    /// Total memory in GiB
    pub memory_gb: f64,
    pub hardware_id: String,
}

impl Device {
    /// The id is name-based on `hardware_id`, so a machine keeps its id across restarts.
    pub fn from_host(host: HostInfo, hardware_id: String) -> Self {
        Self {
            id: Uuid::new_v5(&Uuid::NAMESPACE_OID, hardware_id.as_bytes()),
            device_class: DeviceClass::detect(host.has_battery, &host.processor),
            name: host.name,
            os: host.os,
            os_version: host.os_version,
            processor: host.processor,
            memory_gb: host.memory_gb,
            hardware_id,
        }
    }
}

/// A contiguous tracking period on one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub device_id: Uuid,
    pub start_time: DateTime<Utc>,
    /// `None` while the session is open
    pub end_time: Option<DateTime<Utc>>,
    pub context: String,
}

impl Session {
    pub fn open(device_id: Uuid, context: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            device_id,
            start_time: Utc::now(),
            end_time: None,
            context: context.into(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Close the session. The end time never precedes the start time.
    pub fn close(&mut self, at: DateTime<Utc>) {
        self.end_time = Some(at.max(self.start_time));
    }

    /// Length in whole seconds, if closed.
    pub fn duration_secs(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_seconds())
    }
}

/// One finalized stretch of foreground use of an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default = "default_activity_type")]
    pub activity_type: String,
    pub application_name: String,
    #[serde(default)]
    pub window_title: String,
    /// Foreground time in whole seconds
    #[serde(default)]
    pub duration_secs: u64,
    #[serde(default)]
    pub device_id: Option<Uuid>,
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// When the record was finalized
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub idle_time_secs: u64,
}

fn default_activity_type() -> String {
    APP_USAGE.to_string()
}

impl ActivityRecord {
    pub fn app_usage(
        application_name: impl Into<String>,
        window_title: impl Into<String>,
        duration_secs: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            activity_type: default_activity_type(),
            application_name: application_name.into(),
            window_title: window_title.into(),
            duration_secs,
            device_id: None,
            session_id: None,
            timestamp,
            idle_time_secs: 0,
        }
    }

    pub fn with_origin(mut self, device_id: Uuid, session_id: Uuid) -> Self {
        self.device_id = Some(device_id);
        self.session_id = Some(session_id);
        self
    }
}

/// A periodic system health measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSample {
    pub device_id: Uuid,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub network_in_bytes: u64,
    pub network_out_bytes: u64,
    pub battery_percent: Option<f64>,
    pub process_count: usize,
    pub timestamp: DateTime<Utc>,
}

impl HealthSample {
    pub fn from_snapshot(device_id: Uuid, snapshot: HealthSnapshot, timestamp: DateTime<Utc>) -> Self {
        Self {
            device_id,
            cpu_percent: snapshot.cpu_percent,
            memory_percent: snapshot.memory_percent,
            disk_percent: snapshot.disk_percent,
            network_in_bytes: snapshot.network_in_bytes,
            network_out_bytes: snapshot.network_out_bytes,
            battery_percent: snapshot.battery_percent,
            process_count: snapshot.process_count,
            timestamp,
        }
    }
}

/// Everything the tracker hands to its consumers, in emission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrackerEvent {
    SessionStarted { device: Device, session: Session },
    Activity(ActivityRecord),
    Health(HealthSample),
    SessionClosed(Session),
}

impl TrackerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            TrackerEvent::SessionStarted { .. } => "session_started",
            TrackerEvent::Activity(_) => "activity",
            TrackerEvent::Health(_) => "health",
            TrackerEvent::SessionClosed(_) => "session_closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_device_id_is_stable_per_hardware_id() {
        let host = HostInfo {
            name: "desk".to_string(),
            ..HostInfo::default()
        };
        let first = Device::from_host(host.clone(), "hw-1".to_string());
        let again = Device::from_host(host.clone(), "hw-1".to_string());
        let other = Device::from_host(host, "hw-2".to_string());

        assert_eq!(first.id, again.id);
        assert_ne!(first.id, other.id);
    }

    #[test]
    fn test_session_close_never_precedes_start() {
        let mut session = Session::open(Uuid::new_v4(), DEFAULT_SESSION_CONTEXT);
        assert!(session.is_open());

        session.close(session.start_time - Duration::seconds(30));
        assert!(!session.is_open());
        assert!(session.end_time.unwrap() >= session.start_time);
        assert_eq!(session.duration_secs(), Some(0));
    }

    #[test]
    fn test_record_deserializes_with_defaults() {
        let json = r#"{
            "application_name": "Editor",
            "timestamp": "2024-03-04T09:30:00Z"
        }"#;
        let record: ActivityRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.activity_type, APP_USAGE);
        assert_eq!(record.duration_secs, 0);
        assert!(record.session_id.is_none());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let record = ActivityRecord::app_usage("Editor", "main.rs", 12, Utc::now());
        let json = serde_json::to_value(TrackerEvent::Activity(record)).unwrap();
        assert_eq!(json["event"], "activity");
        assert_eq!(json["application_name"], "Editor");
    }
}
