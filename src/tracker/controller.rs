//! Tracker lifecycle: start/stop, the switch loop and the health loop.

use super::schedule::{cancel_pair, CancelHandle, CancelToken, Ticker};
use super::switch::{SwitchDetector, SwitchOutcome, MIN_DWELL};
use super::types::{
    ActivityRecord, Device, HealthSample, Session, TrackerEvent, DEFAULT_SESSION_CONTEXT,
};
use crate::probe::{ForegroundWindow, PlatformProbe};
use crate::transparency::SharedTransparencyLog;
use chrono::Utc;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Capacity of the event channel. A full channel drops events.
pub const EVENT_CHANNEL_CAPACITY: usize = 10_000;

/// Tracker timing and labelling.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// How often the foreground window is probed
    pub sample_interval: Duration,
    /// How often a health sample is taken
    pub health_interval: Duration,
    /// Shortest dwell that produces an activity record
    pub min_dwell: Duration,
    /// Context label for new sessions
    pub session_context: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(5),
            health_interval: Duration::from_secs(60),
            min_dwell: MIN_DWELL,
            session_context: DEFAULT_SESSION_CONTEXT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TrackerState {
    Idle = 0,
    Running = 1,
    Stopping = 2,
}

impl TrackerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => TrackerState::Running,
            2 => TrackerState::Stopping,
            _ => TrackerState::Idle,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    Started { device: Device, session: Session },
    AlreadyRunning,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    /// The closed session
    Stopped(Session),
    NotRunning,
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

struct ActiveRun {
    cancel: CancelHandle,
    switch_loop: JoinHandle<()>,
    health_loop: JoinHandle<()>,
    session: Session,
}

/// Shared by both loop threads.
#[derive(Clone)]
struct LoopContext {
    probe: Arc<dyn PlatformProbe>,
    sender: Sender<TrackerEvent>,
    log: Option<SharedTransparencyLog>,
    device: Device,
    session: Session,
}

/// Samples the foreground application and system health on background threads.
///
/// Events are delivered through [`ActivityTracker::events`] in emission
/// order. At most one session is open per tracker.
pub struct ActivityTracker {
    probe: Arc<dyn PlatformProbe>,
    config: TrackerConfig,
    log: Option<SharedTransparencyLog>,
    state: AtomicU8,
    active: Mutex<Option<ActiveRun>>,
    sender: Sender<TrackerEvent>,
    receiver: Receiver<TrackerEvent>,
}

impl ActivityTracker {
    pub fn new(
        probe: Arc<dyn PlatformProbe>,
        config: TrackerConfig,
        log: Option<SharedTransparencyLog>,
    ) -> Self {
        let (sender, receiver) = bounded(EVENT_CHANNEL_CAPACITY);
        Self {
            probe,
            config,
            log,
            state: AtomicU8::new(TrackerState::Idle as u8),
            active: Mutex::new(None),
            sender,
            receiver,
        }
    }

    pub fn state(&self) -> TrackerState {
        TrackerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.state() == TrackerState::Running
    }

    /// Receiver for tracker events. Clones share the same queue.
    pub fn events(&self) -> Receiver<TrackerEvent> {
        self.receiver.clone()
    }

    /// The currently open session, if any.
    pub fn current_session(&self) -> Option<Session> {
        self.lock_active().as_ref().map(|run| run.session.clone())
    }

    /// Begin tracking. A second call while running reports `AlreadyRunning`.
    pub fn start(&self) -> Result<StartOutcome, TrackerError> {
        let mut active = self.lock_active();

        if self
            .state
            .compare_exchange(
                TrackerState::Idle as u8,
                TrackerState::Running as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            info!("tracker already running");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let device = Device::from_host(self.probe.host_info(), self.probe.hardware_id());
        let session = Session::open(device.id, self.config.session_context.clone());
        info!(
            device = %device.id,
            session = %session.id,
            platform = self.probe.name(),
            processes = self.probe.process_count(),
            "tracking started"
        );

        let ctx = LoopContext {
            probe: Arc::clone(&self.probe),
            sender: self.sender.clone(),
            log: self.log.clone(),
            device: device.clone(),
            session: session.clone(),
        };
        ctx.emit(TrackerEvent::SessionStarted {
            device: device.clone(),
            session: session.clone(),
        });

        let (cancel, token) = cancel_pair();
        let switch_loop = match spawn_loop("switch", {
            let ctx = ctx.clone();
            let token = token.clone();
            let interval = self.config.sample_interval;
            let min_dwell = self.config.min_dwell;
            move || run_switch_loop(ctx, token, interval, min_dwell)
        }) {
            Ok(handle) => handle,
            Err(e) => {
                self.state.store(TrackerState::Idle as u8, Ordering::SeqCst);
                return Err(e);
            }
        };

        let health_loop = match spawn_loop("health", {
            let interval = self.config.health_interval;
            move || run_health_loop(ctx, token, interval)
        }) {
            Ok(handle) => handle,
            Err(e) => {
                cancel.cancel();
                join_loop("switch", switch_loop);
                self.state.store(TrackerState::Idle as u8, Ordering::SeqCst);
                return Err(e);
            }
        };

        *active = Some(ActiveRun {
            cancel,
            switch_loop,
            health_loop,
            session: session.clone(),
        });

        Ok(StartOutcome::Started { device, session })
    }

    /// Stop tracking, flush the last record and close the session.
    ///
    /// Blocks until both loops have exited; this is bounded by one probe call.
    pub fn stop(&self) -> StopOutcome {
        let mut active = self.lock_active();

        if self
            .state
            .compare_exchange(
                TrackerState::Running as u8,
                TrackerState::Stopping as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            info!("tracker not running");
            return StopOutcome::NotRunning;
        }

        let Some(run) = active.take() else {
            self.state.store(TrackerState::Idle as u8, Ordering::SeqCst);
            return StopOutcome::NotRunning;
        };

        run.cancel.cancel();
        join_loop("switch", run.switch_loop);
        join_loop("health", run.health_loop);

        let mut session = run.session;
        session.close(Utc::now());
        info!(
            session = %session.id,
            duration_secs = session.duration_secs().unwrap_or_default(),
            "tracking stopped"
        );

        let ctx_log = self.log.as_ref();
        emit_event(&self.sender, ctx_log, TrackerEvent::SessionClosed(session.clone()));

        self.state.store(TrackerState::Idle as u8, Ordering::SeqCst);
        StopOutcome::Stopped(session)
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ActivityTracker {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}

impl LoopContext {
    fn emit(&self, event: TrackerEvent) {
        emit_event(&self.sender, self.log.as_ref(), event);
    }

    fn activity(&self, record: ActivityRecord) {
        if let Some(log) = &self.log {
            log.record_activity();
        }
        self.emit(TrackerEvent::Activity(record));
    }

    fn handle_outcome(&self, outcome: SwitchOutcome) {
        match outcome {
            SwitchOutcome::Finished(dwell) => {
                debug!(
                    app = %dwell.application_name,
                    secs = dwell.duration_secs,
                    "activity finalized"
                );
                let record = ActivityRecord::app_usage(
                    dwell.application_name,
                    dwell.window_title,
                    dwell.duration_secs,
                    dwell.finished_at,
                )
                .with_origin(self.device.id, self.session.id);
                self.activity(record);
            }
            SwitchOutcome::Debounced {
                application_name,
                duration,
            } => {
                debug!(app = %application_name, ?duration, "dwell below minimum, dropped");
                if let Some(log) = &self.log {
                    log.record_debounced_switch();
                }
            }
            SwitchOutcome::NoObservation => {
                if let Some(log) = &self.log {
                    log.record_probe_failure();
                }
            }
            SwitchOutcome::Started => {}
        }
    }

    /// One probe call. A panicking probe is logged and treated as no observation.
    fn probe_window(&self) -> ForegroundWindow {
        let probe = Arc::clone(&self.probe);
        match panic::catch_unwind(AssertUnwindSafe(move || probe.foreground_window())) {
            Ok(window) => window,
            Err(_) => {
                error!("foreground probe panicked; skipping tick");
                ForegroundWindow::unavailable()
            }
        }
    }
}

fn emit_event(
    sender: &Sender<TrackerEvent>,
    log: Option<&SharedTransparencyLog>,
    event: TrackerEvent,
) {
    match sender.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            warn!(kind = event.kind(), "event channel full, dropping event");
            if let Some(log) = log {
                log.record_event_dropped();
            }
        }
        Err(TrySendError::Disconnected(event)) => {
            debug!(kind = event.kind(), "no event consumer");
        }
    }
}

fn spawn_loop<F>(name: &'static str, body: F) -> Result<JoinHandle<()>, TrackerError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(format!("tracker-{name}"))
        .spawn(body)
        .map_err(|source| TrackerError::Spawn { name, source })
}

fn join_loop(name: &'static str, handle: JoinHandle<()>) {
    if handle.join().is_err() {
        error!("{name} loop panicked");
    }
}

fn run_switch_loop(ctx: LoopContext, cancel: CancelToken, interval: Duration, min_dwell: Duration) {
    let mut detector = SwitchDetector::new(min_dwell);
    let mut ticker = Ticker::new(interval);

    while ticker.wait(&cancel) {
        let window = ctx.probe_window();
        for outcome in detector.observe(&window, Instant::now(), Utc::now()) {
            ctx.handle_outcome(outcome);
        }
    }

    for outcome in detector.flush(Instant::now(), Utc::now()) {
        ctx.handle_outcome(outcome);
    }
    debug!("switch loop exited");
}

fn run_health_loop(ctx: LoopContext, cancel: CancelToken, interval: Duration) {
    let mut ticker = Ticker::new(interval);

    while ticker.wait(&cancel) {
        let probe = Arc::clone(&ctx.probe);
        let snapshot = match panic::catch_unwind(AssertUnwindSafe(move || probe.health())) {
            Ok(snapshot) => snapshot,
            Err(_) => {
                error!("health probe panicked; skipping sample");
                continue;
            }
        };

        let sample = HealthSample::from_snapshot(ctx.device.id, snapshot, Utc::now());
        debug!(cpu = sample.cpu_percent, memory = sample.memory_percent, "health sample");
        if let Some(log) = &ctx.log {
            log.record_health_sample();
        }
        ctx.emit(TrackerEvent::Health(sample));
    }
    debug!("health loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::NoopProbe;

    fn tracker() -> ActivityTracker {
        let config = TrackerConfig {
            sample_interval: Duration::from_millis(20),
            health_interval: Duration::from_millis(50),
            ..TrackerConfig::default()
        };
        ActivityTracker::new(Arc::new(NoopProbe::new()), config, None)
    }

    #[test]
    fn test_double_start_reports_already_running() {
        let tracker = tracker();
        assert!(matches!(tracker.start().unwrap(), StartOutcome::Started { .. }));
        assert_eq!(tracker.start().unwrap(), StartOutcome::AlreadyRunning);
        assert!(matches!(tracker.stop(), StopOutcome::Stopped(_)));
    }

    #[test]
    fn test_stop_when_idle_reports_not_running() {
        let tracker = tracker();
        assert_eq!(tracker.stop(), StopOutcome::NotRunning);
        assert_eq!(tracker.state(), TrackerState::Idle);
    }

    #[test]
    fn test_session_closed_after_stop() {
        let tracker = tracker();
        let StartOutcome::Started { session, .. } = tracker.start().unwrap() else {
            panic!("expected start");
        };
        assert!(tracker.current_session().is_some());

        let StopOutcome::Stopped(closed) = tracker.stop() else {
            panic!("expected stop");
        };
        assert_eq!(closed.id, session.id);
        assert!(closed.end_time.unwrap() >= closed.start_time);
        assert!(tracker.current_session().is_none());
    }

    #[test]
    fn test_first_event_is_session_started() {
        let tracker = tracker();
        let events = tracker.events();
        tracker.start().unwrap();
        tracker.stop();

        let first = events.try_recv().unwrap();
        assert_eq!(first.kind(), "session_started");
        let last = events.try_iter().last().unwrap();
        assert_eq!(last.kind(), "session_closed");
    }
}
