//! Application-switch detection with dwell debouncing.
//!
//! A different foreground application first becomes a *candidate*. It
//! replaces the current application once it is seen again at least the
//! minimum dwell after its first sighting. A candidate displaced by another
//! application is judged by how long it was in front: a shorter stay is
//! flicker and its time is absorbed into the current dwell, a longer one
//! finishes both the current dwell (at the candidate's first sighting) and
//! the candidate's own dwell.

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

use crate::probe::ForegroundWindow;

/// Shortest foreground stretch worth recording.
pub const MIN_DWELL: Duration = Duration::from_secs(2);

/// A finished dwell, ready to be turned into an activity record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedDwell {
    pub application_name: String,
    pub window_title: String,
    /// Whole seconds, floored
    pub duration_secs: u64,
    /// Wall-clock time the dwell was finalized
    pub finished_at: DateTime<Utc>,
}

/// Something a single observation produced. An observation that changes
/// nothing produces no outcome at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The probe returned no application; the sample was ignored
    NoObservation,
    /// The first application was picked up
    Started,
    /// A dwell ended and was long enough to keep
    Finished(FinishedDwell),
    /// A dwell ended but was too short to keep
    Debounced { application_name: String, duration: Duration },
}

#[derive(Debug, Clone)]
struct Dwell {
    application_name: String,
    window_title: String,
    since: Instant,
}

/// Tracks the current foreground application across probe samples.
#[derive(Debug)]
pub struct SwitchDetector {
    min_dwell: Duration,
    current: Option<Dwell>,
    candidate: Option<Dwell>,
}

impl SwitchDetector {
    pub fn new(min_dwell: Duration) -> Self {
        Self {
            min_dwell,
            current: None,
            candidate: None,
        }
    }

    /// Name of the application currently being timed.
    pub fn current_application(&self) -> Option<&str> {
        self.current.as_ref().map(|d| d.application_name.as_str())
    }

    /// Feed one probe sample taken at `now` (monotonic) / `wall` (wall clock).
    pub fn observe(
        &mut self,
        window: &ForegroundWindow,
        now: Instant,
        wall: DateTime<Utc>,
    ) -> Vec<SwitchOutcome> {
        if !window.is_known() {
            return vec![SwitchOutcome::NoObservation];
        }

        let Some(current) = self.current.as_mut() else {
            self.current = Some(Dwell::from_window(window, now));
            return vec![SwitchOutcome::Started];
        };

        let same_as_current = current.application_name == window.application_name;
        if same_as_current && self.candidate.is_none() {
            current.window_title = window.window_title.clone();
            return Vec::new();
        }

        if let Some(candidate) = self.candidate.as_mut() {
            if candidate.application_name == window.application_name {
                candidate.window_title = window.window_title.clone();
                if now.saturating_duration_since(candidate.since) < self.min_dwell {
                    return Vec::new();
                }
                return self.confirm_candidate(wall).into_iter().collect();
            }
        }

        // The candidate, if any, has been displaced by `window`.
        match self.take_long_candidate(now) {
            Some(candidate) => self.finish_both(candidate, window, now, wall),
            None if same_as_current => {
                if let Some(current) = self.current.as_mut() {
                    current.window_title = window.window_title.clone();
                }
                Vec::new()
            }
            None => {
                self.candidate = Some(Dwell::from_window(window, now));
                Vec::new()
            }
        }
    }

    /// Close the open dwells at `now`, e.g. when tracking stops.
    pub fn flush(&mut self, now: Instant, wall: DateTime<Utc>) -> Vec<SwitchOutcome> {
        let Some(current) = self.current.take() else {
            self.candidate = None;
            return Vec::new();
        };

        match self.take_long_candidate(now) {
            Some(candidate) => vec![
                self.finish(current, candidate.since, wall),
                self.finish(candidate, now, wall),
            ],
            None => vec![self.finish(current, now, wall)],
        }
    }

    /// Drop the candidate, returning it only if it stayed long enough to count.
    fn take_long_candidate(&mut self, now: Instant) -> Option<Dwell> {
        self.candidate
            .take()
            .filter(|c| now.saturating_duration_since(c.since) >= self.min_dwell)
    }

    /// The candidate becomes current from its first sighting.
    fn confirm_candidate(&mut self, wall: DateTime<Utc>) -> Option<SwitchOutcome> {
        let candidate = self.candidate.take()?;
        let switched_at = candidate.since;
        let outgoing = self.current.replace(candidate)?;
        Some(self.finish(outgoing, switched_at, wall))
    }

    /// Finish the current dwell where `candidate` began, then the candidate
    /// itself at `now`; `window` takes over from `now`.
    fn finish_both(
        &mut self,
        candidate: Dwell,
        window: &ForegroundWindow,
        now: Instant,
        wall: DateTime<Utc>,
    ) -> Vec<SwitchOutcome> {
        let mut outcomes = Vec::with_capacity(2);
        if let Some(outgoing) = self.current.replace(Dwell::from_window(window, now)) {
            outcomes.push(self.finish(outgoing, candidate.since, wall));
        }
        outcomes.push(self.finish(candidate, now, wall));
        outcomes
    }

    fn finish(&self, outgoing: Dwell, until: Instant, finished_at: DateTime<Utc>) -> SwitchOutcome {
        let duration = until.saturating_duration_since(outgoing.since);
        if duration < self.min_dwell {
            return SwitchOutcome::Debounced {
                application_name: outgoing.application_name,
                duration,
            };
        }

        SwitchOutcome::Finished(FinishedDwell {
            application_name: outgoing.application_name,
            window_title: outgoing.window_title,
            duration_secs: duration.as_secs(),
            finished_at,
        })
    }
}

impl Default for SwitchDetector {
    fn default() -> Self {
        Self::new(MIN_DWELL)
    }
}

impl Dwell {
    fn from_window(window: &ForegroundWindow, since: Instant) -> Self {
        Self {
            application_name: window.application_name.clone(),
            window_title: window.window_title.clone(),
            since,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays `(seconds since start, app)` samples and collects finished dwells.
    fn replay(samples: &[(f64, &str)], stop_at: Option<f64>) -> Vec<FinishedDwell> {
        let origin = Instant::now();
        let wall = Utc::now();
        let at = |secs: f64| {
            (
                origin + Duration::from_secs_f64(secs),
                wall + chrono::Duration::milliseconds((secs * 1000.0) as i64),
            )
        };

        let mut detector = SwitchDetector::default();
        let mut outcomes = Vec::new();
        for &(secs, app) in samples {
            let (now, wall) = at(secs);
            let window = ForegroundWindow::new(app, format!("{app} window"));
            outcomes.extend(detector.observe(&window, now, wall));
        }
        if let Some(secs) = stop_at {
            let (now, wall) = at(secs);
            outcomes.extend(detector.flush(now, wall));
        }
        outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                SwitchOutcome::Finished(dwell) => Some(dwell),
                _ => None,
            })
            .collect()
    }

    fn summary(finished: &[FinishedDwell]) -> Vec<(&str, u64)> {
        finished
            .iter()
            .map(|d| (d.application_name.as_str(), d.duration_secs))
            .collect()
    }

    #[test]
    fn test_confirmed_switch_emits_outgoing_dwell() {
        let finished = replay(&[(0.0, "Editor"), (5.0, "Browser"), (10.0, "Browser")], None);
        assert_eq!(summary(&finished), vec![("Editor", 5)]);
    }

    #[test]
    fn test_duration_is_floored_to_whole_seconds() {
        let finished = replay(&[(0.0, "Editor"), (3.9, "Browser"), (6.0, "Browser")], None);
        assert_eq!(finished[0].duration_secs, 3);
    }

    #[test]
    fn test_short_outgoing_dwell_is_debounced() {
        let origin = Instant::now();
        let wall = Utc::now();
        let mut detector = SwitchDetector::default();

        detector.observe(&ForegroundWindow::new("Editor", ""), origin, wall);
        let outcomes = detector.flush(origin + Duration::from_millis(1500), wall);
        assert!(matches!(outcomes.as_slice(), [SwitchOutcome::Debounced { .. }]));
    }

    #[test]
    fn test_blip_is_absorbed_into_current_dwell() {
        // Editor 10s, Browser 1s, Editor continues, then Terminal for good.
        let finished = replay(
            &[
                (0.0, "Editor"),
                (5.0, "Editor"),
                (10.0, "Browser"),
                (11.0, "Editor"),
                (15.0, "Editor"),
                (20.0, "Terminal"),
                (25.0, "Terminal"),
            ],
            None,
        );
        assert_eq!(summary(&finished), vec![("Editor", 20)]);
    }

    #[test]
    fn test_single_sample_dwell_is_recorded() {
        let finished = replay(
            &[
                (0.0, "Editor"),
                (5.0, "Browser"),
                (10.0, "Editor"),
                (15.0, "Editor"),
                (20.0, "Terminal"),
                (25.0, "Terminal"),
            ],
            None,
        );
        assert_eq!(
            summary(&finished),
            vec![("Editor", 5), ("Browser", 5), ("Editor", 10)]
        );
    }

    #[test]
    fn test_chain_of_single_samples_keeps_every_dwell() {
        let finished = replay(
            &[
                (0.0, "Editor"),
                (5.0, "Editor"),
                (10.0, "Browser"),
                (15.0, "Mail"),
                (20.0, "Slack"),
                (25.0, "Slack"),
            ],
            None,
        );
        assert_eq!(
            summary(&finished),
            vec![("Editor", 10), ("Browser", 5), ("Mail", 5)]
        );
    }

    #[test]
    fn test_short_candidate_replaced_without_record() {
        let finished = replay(
            &[(0.0, "Editor"), (4.0, "Browser"), (5.0, "Mail"), (9.0, "Mail")],
            None,
        );
        assert_eq!(summary(&finished), vec![("Editor", 5)]);
    }

    #[test]
    fn test_flush_finishes_pending_candidate() {
        let finished = replay(&[(0.0, "Editor"), (5.0, "Browser")], Some(9.0));
        assert_eq!(summary(&finished), vec![("Editor", 5), ("Browser", 4)]);
    }

    #[test]
    fn test_records_carry_finalization_time() {
        let origin = Instant::now();
        let start = Utc::now();
        let mut detector = SwitchDetector::default();

        detector.observe(&ForegroundWindow::new("Editor", ""), origin, start);
        detector.observe(
            &ForegroundWindow::new("Browser", ""),
            origin + Duration::from_secs(5),
            start + chrono::Duration::seconds(5),
        );
        let confirmed_at = start + chrono::Duration::seconds(10);
        let outcomes = detector.observe(
            &ForegroundWindow::new("Browser", ""),
            origin + Duration::from_secs(10),
            confirmed_at,
        );
        let [SwitchOutcome::Finished(dwell)] = outcomes.as_slice() else {
            panic!("expected one finished dwell, got {outcomes:?}");
        };
        assert_eq!(dwell.finished_at, confirmed_at);
    }

    #[test]
    fn test_empty_observation_is_ignored() {
        let origin = Instant::now();
        let wall = Utc::now();
        let mut detector = SwitchDetector::default();

        assert_eq!(
            detector.observe(&ForegroundWindow::unavailable(), origin, wall),
            vec![SwitchOutcome::NoObservation]
        );
        detector.observe(&ForegroundWindow::new("Editor", ""), origin, wall);
        assert_eq!(
            detector.observe(
                &ForegroundWindow::unavailable(),
                origin + Duration::from_secs(5),
                wall
            ),
            vec![SwitchOutcome::NoObservation]
        );
        assert_eq!(detector.current_application(), Some("Editor"));
    }

    #[test]
    fn test_flush_finishes_current_dwell() {
        let finished = replay(&[(0.0, "Editor"), (5.0, "Editor")], Some(12.5));
        assert_eq!(summary(&finished), vec![("Editor", 12)]);
    }

    #[test]
    fn test_window_title_follows_latest_sample() {
        let origin = Instant::now();
        let wall = Utc::now();
        let mut detector = SwitchDetector::default();

        detector.observe(&ForegroundWindow::new("Editor", "a.rs"), origin, wall);
        detector.observe(
            &ForegroundWindow::new("Editor", "b.rs"),
            origin + Duration::from_secs(3),
            wall,
        );
        let outcomes = detector.flush(origin + Duration::from_secs(6), wall);
        let [SwitchOutcome::Finished(dwell)] = outcomes.as_slice() else {
            panic!("expected a finished dwell");
        };
        assert_eq!(dwell.window_title, "b.rs");
    }
}
