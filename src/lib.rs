//! Workflow Sensor Agent - activity sensing and adaptive workflow suggestions.
//!
//! This library watches which application holds the foreground, turns that
//! signal into behavioral features and proposes workflow improvements that
//! adapt to user feedback.
//!
//! # Privacy Guarantees
//!
//! - **No content**: Only application names and window titles are read, never keystrokes or screen contents
//! - **No persistence**: Records are handed to the caller; the library stores nothing itself
//! - **Local only**: Nothing leaves the machine
//! - **Transparency**: What was observed and produced is counted and auditable
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Workflow Sensor Agent                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐           │
//! │  │    Probe    │──▶│   Tracker   │──▶│  Features   │           │
//! │  │ (per  OS)   │   │ (5s / 60s)  │   │ (extract)   │           │
//! │  └─────────────┘   └─────────────┘   └─────────────┘           │
//! │                           │                 │                   │
//! │                           ▼                 ▼                   │
//! │                    ┌─────────────┐   ┌─────────────┐           │
//! │                    │Transparency │   │   Engine    │◀─ feedback│
//! │                    │    Log      │   │ (ε-greedy)  │           │
//! │                    └─────────────┘   └─────────────┘           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use workflow_sensor_agent::{probe, tracker, Config};
//!
//! let config = Config::default();
//! let probe = probe::default_probe(config.probe_config());
//! let tracker = tracker::ActivityTracker::new(probe, config.tracker_config(), None);
//!
//! tracker.start().expect("failed to start tracker");
//! for event in tracker.events().iter().take(10) {
//!     println!("{}", event.kind());
//! }
//! tracker.stop();
//! ```

pub mod config;
pub mod engine;
pub mod features;
pub mod probe;
pub mod tracker;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use engine::{
    Category, EngineConfig, EngineError, FeedbackEvent, FeedbackLabel, FeedbackOutcome,
    Suggestion, SuggestionBatch, SuggestionEngine, ValueTable,
};
pub use features::{
    parse_activity_batch, ExtractionScope, FeatureError, FeatureExtractor, FeatureSet,
};
pub use probe::{default_probe, ForegroundWindow, PlatformProbe, ProbeConfig, ProbeError};
pub use tracker::{
    ActivityRecord, ActivityTracker, Device, HealthSample, Session, StartOutcome, StopOutcome,
    TrackerConfig, TrackerError, TrackerEvent,
};
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║          WORKFLOW SENSOR AGENT - PRIVACY DECLARATION             ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This agent observes your application usage to suggest           ║
║  workflow improvements.                                          ║
║                                                                  ║
║  ✓ WHAT WE CAPTURE:                                              ║
║    • Which application is in the foreground, and for how long    ║
║    • The title of the foreground window                          ║
║    • System load (CPU, memory, disk, network totals, battery)    ║
║                                                                  ║
║  ✗ WHAT WE NEVER CAPTURE:                                        ║
║    • Keystrokes or anything you type                             ║
║    • Screenshots or any screen content                           ║
║    • Files, documents or browsing history                        ║
║                                                                  ║
║  All data is processed locally and handed to you; the agent      ║
║  stores nothing but a hardware id and its own counters.          ║
║                                                                  ║
║  You can view collection statistics anytime with:                ║
║    workflow-sensor status                                        ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
