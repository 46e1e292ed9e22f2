//! Activity tracking.
//!
//! The tracker polls a [`PlatformProbe`](crate::probe::PlatformProbe) for the
//! foreground window, turns application switches into [`ActivityRecord`]s and
//! emits periodic [`HealthSample`]s, all as [`TrackerEvent`]s on one channel.

pub mod controller;
pub mod schedule;
pub mod switch;
pub mod types;

pub use controller::{
    ActivityTracker, StartOutcome, StopOutcome, TrackerConfig, TrackerError, TrackerState,
    EVENT_CHANNEL_CAPACITY,
};
pub use schedule::{cancel_pair, CancelHandle, CancelToken, Ticker};
pub use switch::{FinishedDwell, SwitchDetector, SwitchOutcome, MIN_DWELL};
pub use types::{
    ActivityRecord, Device, HealthSample, Session, TrackerEvent, APP_USAGE,
    DEFAULT_SESSION_CONTEXT,
};
