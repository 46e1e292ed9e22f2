//! Integration tests for the activity tracker driven by a scripted probe

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use workflow_sensor_agent::probe::{ForegroundWindow, HealthSnapshot, HostInfo, PlatformProbe};
use workflow_sensor_agent::transparency::create_shared_log;
use workflow_sensor_agent::{
    ActivityRecord, ActivityTracker, StartOutcome, StopOutcome, TrackerConfig, TrackerEvent,
};

/// Reports Editor for the first `switch_after` calls, then Terminal.
struct ScriptedProbe {
    calls: AtomicUsize,
    switch_after: usize,
}

impl ScriptedProbe {
    fn new(switch_after: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            switch_after,
        }
    }
}

impl PlatformProbe for ScriptedProbe {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn foreground_window(&self) -> ForegroundWindow {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.switch_after {
            ForegroundWindow::new("Editor", "main.rs")
        } else {
            ForegroundWindow::new("Terminal", "bash")
        }
    }

    fn health(&self) -> HealthSnapshot {
        HealthSnapshot {
            cpu_percent: 12.5,
            memory_percent: 40.0,
            disk_percent: 55.0,
            process_count: 42,
            ..HealthSnapshot::default()
        }
    }

    fn hardware_id(&self) -> String {
        "scripted-hardware".to_string()
    }

    fn host_info(&self) -> HostInfo {
        HostInfo {
            name: "test-host".to_string(),
            os: "testos".to_string(),
            ..HostInfo::default()
        }
    }

    fn process_count(&self) -> usize {
        42
    }
}

/// Every fourth call from the second panics and every fourth from the third
/// sees no window; the rest report Editor, then Terminal from call 12.
struct UnreliableProbe {
    calls: AtomicUsize,
}

impl PlatformProbe for UnreliableProbe {
    fn name(&self) -> &'static str {
        "unreliable"
    }

    fn foreground_window(&self) -> ForegroundWindow {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match call % 4 {
            1 => panic!("foreground lookup crashed on call {call}"),
            2 => ForegroundWindow::unavailable(),
            _ if call < 12 => ForegroundWindow::new("Editor", "main.rs"),
            _ => ForegroundWindow::new("Terminal", "bash"),
        }
    }

    fn health(&self) -> HealthSnapshot {
        HealthSnapshot::default()
    }

    fn hardware_id(&self) -> String {
        "unreliable-hardware".to_string()
    }

    fn host_info(&self) -> HostInfo {
        HostInfo::default()
    }

    fn process_count(&self) -> usize {
        0
    }
}

fn fast_config() -> TrackerConfig {
    TrackerConfig {
        sample_interval: Duration::from_millis(100),
        health_interval: Duration::from_millis(500),
        min_dwell: Duration::from_secs(1),
        ..TrackerConfig::default()
    }
}

fn activities(events: &[TrackerEvent]) -> Vec<&ActivityRecord> {
    events
        .iter()
        .filter_map(|event| match event {
            TrackerEvent::Activity(record) => Some(record),
            _ => None,
        })
        .collect()
}

#[test]
fn test_switch_produces_activity_record() {
    let log = create_shared_log();
    let tracker = ActivityTracker::new(
        Arc::new(ScriptedProbe::new(15)),
        fast_config(),
        Some(Arc::clone(&log)),
    );
    let receiver = tracker.events();

    let StartOutcome::Started { device, session } = tracker.start().unwrap() else {
        panic!("tracker should start");
    };
    thread::sleep(Duration::from_millis(3500));
    assert!(matches!(tracker.stop(), StopOutcome::Stopped(_)));

    let events: Vec<TrackerEvent> = receiver.try_iter().collect();
    let records = activities(&events);

    let editor = records
        .iter()
        .find(|r| r.application_name == "Editor")
        .expect("editor dwell should be recorded");
    assert!(editor.duration_secs >= 1);
    assert_eq!(editor.window_title, "main.rs");
    assert_eq!(editor.device_id, Some(device.id));
    assert_eq!(editor.session_id, Some(session.id));

    // Terminal is flushed on stop
    assert!(records.iter().any(|r| r.application_name == "Terminal"));
    assert_eq!(log.stats().activity_records, records.len() as u64);
}

#[test]
fn test_event_order_and_health_samples() {
    let tracker = ActivityTracker::new(Arc::new(ScriptedProbe::new(usize::MAX)), fast_config(), None);
    let receiver = tracker.events();

    tracker.start().unwrap();
    thread::sleep(Duration::from_millis(1200));
    tracker.stop();

    let events: Vec<TrackerEvent> = receiver.try_iter().collect();
    assert_eq!(events.first().map(TrackerEvent::kind), Some("session_started"));
    assert_eq!(events.last().map(TrackerEvent::kind), Some("session_closed"));

    let health: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            TrackerEvent::Health(sample) => Some(sample),
            _ => None,
        })
        .collect();
    assert!(!health.is_empty());
    assert_eq!(health[0].process_count, 42);
    assert!((health[0].cpu_percent - 12.5).abs() < f64::EPSILON);
}

#[test]
fn test_restart_opens_new_session() {
    let tracker = ActivityTracker::new(Arc::new(ScriptedProbe::new(usize::MAX)), fast_config(), None);

    let StartOutcome::Started { session: first, .. } = tracker.start().unwrap() else {
        panic!("first start");
    };
    tracker.stop();
    let StartOutcome::Started { session: second, .. } = tracker.start().unwrap() else {
        panic!("second start");
    };
    tracker.stop();

    assert_ne!(first.id, second.id);
    assert_eq!(first.device_id, second.device_id);
}

#[test]
fn test_concurrent_start_opens_one_session() {
    let tracker = Arc::new(ActivityTracker::new(
        Arc::new(ScriptedProbe::new(usize::MAX)),
        fast_config(),
        None,
    ));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || tracker.start().unwrap())
        })
        .collect();
    let started = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|outcome| matches!(outcome, StartOutcome::Started { .. }))
        .count();

    assert_eq!(started, 1);
    assert!(matches!(tracker.stop(), StopOutcome::Stopped(_)));
    assert_eq!(tracker.stop(), StopOutcome::NotRunning);
}

#[test]
fn test_failed_ticks_do_not_stop_tracking() {
    let log = create_shared_log();
    let probe = UnreliableProbe {
        calls: AtomicUsize::new(0),
    };
    let tracker = ActivityTracker::new(Arc::new(probe), fast_config(), Some(Arc::clone(&log)));
    let receiver = tracker.events();

    tracker.start().unwrap();
    thread::sleep(Duration::from_millis(3500));
    assert!(tracker.is_running());
    assert!(matches!(tracker.stop(), StopOutcome::Stopped(_)));

    let events: Vec<TrackerEvent> = receiver.try_iter().collect();
    let records = activities(&events);
    assert!(records.iter().any(|r| r.application_name == "Editor" && r.duration_secs >= 1));
    assert!(records.iter().any(|r| r.application_name == "Terminal"));
    assert_eq!(events.last().map(TrackerEvent::kind), Some("session_closed"));
    assert!(log.stats().probe_failures > 0);
}
