//! Feature set assembly from a batch of activity records.

use super::time_patterns::{extract_time_patterns, TimePatternFeatures};
use super::usage::{extract_usage, UsageFeatures};
use super::workflow::{extract_workflows, WorkflowFeatures};
use super::FeatureError;
use crate::tracker::{ActivityRecord, HealthSample};
use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

/// Restricts which records of a mixed batch contribute to a feature set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionScope {
    pub device_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    /// Inclusive lower bound on record timestamps
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on record timestamps
    pub until: Option<DateTime<Utc>>,
}

impl ExtractionScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn session(device_id: Uuid, session_id: Uuid) -> Self {
        Self {
            device_id: Some(device_id),
            session_id: Some(session_id),
            ..Self::default()
        }
    }

    fn in_window(&self, timestamp: DateTime<Utc>) -> bool {
        self.since.map_or(true, |since| timestamp >= since)
            && self.until.map_or(true, |until| timestamp < until)
    }

    pub fn contains(&self, record: &ActivityRecord) -> bool {
        fn matches(want: Option<Uuid>, have: Option<Uuid>) -> bool {
            want.map_or(true, |id| have == Some(id))
        }

        matches(self.device_id, record.device_id)
            && matches(self.session_id, record.session_id)
            && self.in_window(record.timestamp)
    }

    fn contains_health(&self, sample: &HealthSample) -> bool {
        self.device_id.map_or(true, |id| sample.device_id == id) && self.in_window(sample.timestamp)
    }
}

/// Averages over the health samples in scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub samples: usize,
    pub cpu_mean: f64,
    pub memory_mean: f64,
    pub disk_mean: f64,
    pub battery_min: Option<f64>,
}

impl HealthSummary {
    fn from_samples(samples: &[&HealthSample]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let n = samples.len() as f64;
        let mean = |f: fn(&HealthSample) -> f64| samples.iter().map(|s| f(s)).sum::<f64>() / n;
        Self {
            samples: samples.len(),
            cpu_mean: mean(|s| s.cpu_percent),
            memory_mean: mean(|s| s.memory_percent),
            disk_mean: mean(|s| s.disk_percent),
            battery_min: samples
                .iter()
                .filter_map(|s| s.battery_percent)
                .min_by(f64::total_cmp),
        }
    }
}

/// Behavioral features for one batch of activity records.
///
/// Everything except `time_of_day`, `day_of_week` and `is_weekend` is a
/// function of the input records alone; those three describe the moment of
/// extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    /// `false` when no record fell inside the scope
    pub features_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    /// Local hour at extraction time
    pub time_of_day: u32,
    /// Local weekday at extraction time, 0 = Monday
    pub day_of_week: u32,
    pub is_weekend: bool,
    #[serde(default)]
    pub record_count: usize,
    #[serde(default)]
    pub usage: UsageFeatures,
    #[serde(default)]
    pub time_patterns: TimePatternFeatures,
    #[serde(default)]
    pub workflow: WorkflowFeatures,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_health: Option<HealthSummary>,
}

impl FeatureSet {
    /// Serialise as a JSON object.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Stateless feature extractor. Safe to share between threads.
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor {
    timezone: Tz,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl FeatureExtractor {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn extract(&self, records: &[ActivityRecord], scope: &ExtractionScope) -> FeatureSet {
        self.extract_at(records, scope, Utc::now())
    }

    /// Same as [`extract`](Self::extract) with an explicit extraction time.
    pub fn extract_at(
        &self,
        records: &[ActivityRecord],
        scope: &ExtractionScope,
        now: DateTime<Utc>,
    ) -> FeatureSet {
        let in_scope: Vec<&ActivityRecord> = records.iter().filter(|r| scope.contains(r)).collect();
        debug!(
            total = records.len(),
            in_scope = in_scope.len(),
            "extracting features"
        );

        let mut features = self.current_time(now);
        features.device_id = scope.device_id;
        features.session_id = scope.session_id;

        if in_scope.is_empty() {
            return features;
        }

        features.features_available = true;
        features.record_count = in_scope.len();
        features.usage = extract_usage(&in_scope).unwrap_or_else(|e| {
            warn!("usage extraction failed: {e}");
            UsageFeatures::default()
        });
        features.time_patterns = extract_time_patterns(&in_scope, self.timezone);
        features.workflow = extract_workflows(&in_scope);
        features
    }

    /// Extract features and summarise the health samples in the same scope.
    pub fn extract_with_health(
        &self,
        records: &[ActivityRecord],
        health: &[HealthSample],
        scope: &ExtractionScope,
        now: DateTime<Utc>,
    ) -> FeatureSet {
        let mut features = self.extract_at(records, scope, now);
        let samples: Vec<&HealthSample> =
            health.iter().filter(|s| scope.contains_health(s)).collect();
        features.system_health = Some(HealthSummary::from_samples(&samples));
        features
    }

    fn current_time(&self, now: DateTime<Utc>) -> FeatureSet {
        let local = now.with_timezone(&self.timezone);
        let weekday = local.weekday().num_days_from_monday();
        FeatureSet {
            time_of_day: local.hour(),
            day_of_week: weekday,
            is_weekend: weekday >= 5,
            ..FeatureSet::default()
        }
    }
}

/// Read activity records from a JSON array.
///
/// Anything other than an array is rejected. Elements that do not describe
/// a record (for example, missing a timestamp) are skipped.
pub fn parse_activity_batch(value: &Value) -> Result<Vec<ActivityRecord>, FeatureError> {
    let items = value.as_array().ok_or_else(|| {
        FeatureError::RejectedInput(format!("expected an array of records, got {}", kind(value)))
    })?;

    let mut records = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match serde_json::from_value::<ActivityRecord>(item.clone()) {
            Ok(record) => records.push(record),
            Err(e) => warn!(index = i, "skipping malformed activity record: {e}"),
        }
    }
    Ok(records)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn monday(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, hour, 0, 0).unwrap()
    }

    fn batch() -> Vec<ActivityRecord> {
        ["Editor", "Browser", "Editor", "Terminal"]
            .iter()
            .enumerate()
            .map(|(i, app)| {
                ActivityRecord::app_usage(*app, "", 300, monday(9) + Duration::minutes(10 * i as i64))
            })
            .collect()
    }

    #[test]
    fn test_empty_batch_is_flagged() {
        let features = FeatureExtractor::default().extract_at(&[], &ExtractionScope::all(), monday(10));
        assert!(!features.features_available);
        assert_eq!(features.time_of_day, 10);
        assert_eq!(features.day_of_week, 0);
        assert!(!features.is_weekend);
        assert!(features.usage.app_usage.is_empty());
        assert!(features.workflow.common_transitions.is_empty());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let extractor = FeatureExtractor::default();
        let records = batch();
        let now = monday(12);
        let a = extractor.extract_at(&records, &ExtractionScope::all(), now);
        let b = extractor.extract_at(&records, &ExtractionScope::all(), now);
        assert_eq!(a, b);
        assert_eq!(a.to_json(), b.to_json());
    }

    #[test]
    fn test_scope_filters_mixed_batch() {
        let device = Uuid::new_v4();
        let session = Uuid::new_v4();
        let mut records = batch();
        records[0] = records[0].clone().with_origin(device, session);
        records[1] = records[1].clone().with_origin(device, session);
        records[2] = records[2].clone().with_origin(device, Uuid::new_v4());

        let features = FeatureExtractor::default().extract_at(
            &records,
            &ExtractionScope::session(device, session),
            monday(12),
        );
        assert_eq!(features.record_count, 2);
        assert_eq!(features.session_id, Some(session));
        assert_eq!(features.usage.app_usage.len(), 2);
    }

    #[test]
    fn test_time_window_scope() {
        let scope = ExtractionScope {
            since: Some(monday(9) + Duration::minutes(10)),
            until: Some(monday(9) + Duration::minutes(30)),
            ..ExtractionScope::default()
        };
        let features = FeatureExtractor::default().extract_at(&batch(), &scope, monday(12));
        assert_eq!(features.record_count, 2);
    }

    #[test]
    fn test_weekend_flag() {
        let saturday = Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap();
        let features = FeatureExtractor::default().extract_at(&[], &ExtractionScope::all(), saturday);
        assert_eq!(features.day_of_week, 5);
        assert!(features.is_weekend);
    }

    #[test]
    fn test_overflowing_usage_falls_back_to_default() {
        let mut records = batch();
        records[0].duration_secs = u64::MAX;
        let features =
            FeatureExtractor::default().extract_at(&records, &ExtractionScope::all(), monday(12));
        assert!(features.features_available);
        assert!(features.usage.app_usage.is_empty());
        assert!(!features.workflow.common_transitions.is_empty());
    }

    #[test]
    fn test_health_summary() {
        let device = Uuid::new_v4();
        let sample = |cpu: f64, battery: Option<f64>| HealthSample {
            device_id: device,
            cpu_percent: cpu,
            memory_percent: 50.0,
            disk_percent: 10.0,
            network_in_bytes: 0,
            network_out_bytes: 0,
            battery_percent: battery,
            process_count: 100,
            timestamp: monday(9),
        };
        let health = [sample(20.0, Some(80.0)), sample(40.0, Some(60.0))];
        let features = FeatureExtractor::default().extract_with_health(
            &batch(),
            &health,
            &ExtractionScope::all(),
            monday(12),
        );
        let summary = features.system_health.unwrap();
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.cpu_mean, 30.0);
        assert_eq!(summary.battery_min, Some(60.0));
    }

    #[test]
    fn test_parse_batch_rejects_non_array() {
        let err = parse_activity_batch(&json!({"application_name": "Editor"})).unwrap_err();
        assert!(matches!(err, FeatureError::RejectedInput(_)));
    }

    #[test]
    fn test_parse_batch_skips_records_without_timestamp() {
        let records = parse_activity_batch(&json!([
            {"application_name": "Editor", "duration_secs": 30, "timestamp": "2024-03-04T09:00:00Z"},
            {"application_name": "Browser", "duration_secs": 10},
            42
        ]))
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].application_name, "Editor");
    }

    #[test]
    fn test_feature_set_json_shape() {
        let features =
            FeatureExtractor::default().extract_at(&batch(), &ExtractionScope::all(), monday(12));
        let json = features.to_json();
        assert!(json["usage"]["app_usage"].is_object());
        assert!(json["workflow"]["common_transitions"].is_array());
        assert_eq!(json["time_patterns"]["activity_hours"]["9"], 4);
        assert_eq!(json["features_available"], true);

        let back: FeatureSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, features);
    }
}
