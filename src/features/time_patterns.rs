//! Time-of-day and day-of-week distribution of activity.

use crate::tracker::ActivityRecord;
use chrono::{Datelike, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Part of the day a record falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPart {
    /// 05:00 to 11:59
    Morning,
    /// 12:00 to 17:59
    Afternoon,
    /// 18:00 to 23:59
    Evening,
    Night,
}

impl DayPart {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => DayPart::Morning,
            12..=17 => DayPart::Afternoon,
            18..=23 => DayPart::Evening,
            _ => DayPart::Night,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimePatternFeatures {
    pub morning_pct: f64,
    pub afternoon_pct: f64,
    pub evening_pct: f64,
    pub night_pct: f64,
    /// Record count per local hour (0-23)
    pub activity_hours: BTreeMap<u32, usize>,
    /// Record count per weekday (0 = Monday)
    pub activity_days: BTreeMap<u32, usize>,
    /// Records per hour spanned by the batch
    pub activity_density: f64,
}

pub(crate) fn extract_time_patterns(records: &[&ActivityRecord], tz: Tz) -> TimePatternFeatures {
    if records.is_empty() {
        return TimePatternFeatures::default();
    }

    let mut parts = [0usize; 4];
    let mut hours = BTreeMap::new();
    let mut days = BTreeMap::new();

    for record in records {
        let local = record.timestamp.with_timezone(&tz);
        *hours.entry(local.hour()).or_insert(0) += 1;
        *days
            .entry(local.weekday().num_days_from_monday())
            .or_insert(0) += 1;
        parts[DayPart::from_hour(local.hour()) as usize] += 1;
    }

    // Bounds are non-empty here.
    let first = records.iter().map(|r| r.timestamp).min().unwrap_or_default();
    let last = records.iter().map(|r| r.timestamp).max().unwrap_or_default();
    let span_secs = (last - first).num_milliseconds() as f64 / 1000.0;
    let activity_density = if span_secs > 0.0 {
        records.len() as f64 / (span_secs / 3600.0).max(1.0)
    } else {
        0.0
    };

    let total = records.len() as f64;
    let pct = |count: usize| count as f64 / total * 100.0;

    TimePatternFeatures {
        morning_pct: pct(parts[DayPart::Morning as usize]),
        afternoon_pct: pct(parts[DayPart::Afternoon as usize]),
        evening_pct: pct(parts[DayPart::Evening as usize]),
        night_pct: pct(parts[DayPart::Night as usize]),
        activity_hours: hours,
        activity_days: days,
        activity_density,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> ActivityRecord {
        // 2024-03-04 is a Monday
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, hour, minute, 0).unwrap();
        ActivityRecord::app_usage("Editor", "", 60, ts)
    }

    #[test]
    fn test_day_part_boundaries() {
        assert_eq!(DayPart::from_hour(4), DayPart::Night);
        assert_eq!(DayPart::from_hour(5), DayPart::Morning);
        assert_eq!(DayPart::from_hour(11), DayPart::Morning);
        assert_eq!(DayPart::from_hour(12), DayPart::Afternoon);
        assert_eq!(DayPart::from_hour(17), DayPart::Afternoon);
        assert_eq!(DayPart::from_hour(18), DayPart::Evening);
        assert_eq!(DayPart::from_hour(23), DayPart::Evening);
        assert_eq!(DayPart::from_hour(0), DayPart::Night);
    }

    #[test]
    fn test_buckets_and_histograms() {
        let records = [at(9, 0), at(10, 0), at(14, 0), at(20, 0)];
        let refs: Vec<&ActivityRecord> = records.iter().collect();
        let patterns = extract_time_patterns(&refs, Tz::UTC);

        assert_eq!(patterns.morning_pct, 50.0);
        assert_eq!(patterns.afternoon_pct, 25.0);
        assert_eq!(patterns.evening_pct, 25.0);
        assert_eq!(patterns.night_pct, 0.0);
        assert_eq!(patterns.activity_hours.get(&9), Some(&1));
        assert_eq!(patterns.activity_days.get(&0), Some(&4));
    }

    #[test]
    fn test_density_uses_at_least_one_hour() {
        let records = [at(9, 0), at(9, 30)];
        let refs: Vec<&ActivityRecord> = records.iter().collect();
        assert_eq!(extract_time_patterns(&refs, Tz::UTC).activity_density, 2.0);

        let records = [at(9, 0), at(13, 0)];
        let refs: Vec<&ActivityRecord> = records.iter().collect();
        assert_eq!(extract_time_patterns(&refs, Tz::UTC).activity_density, 0.5);
    }

    #[test]
    fn test_zero_span_density_is_zero() {
        let records = [at(9, 0), at(9, 0)];
        let refs: Vec<&ActivityRecord> = records.iter().collect();
        assert_eq!(extract_time_patterns(&refs, Tz::UTC).activity_density, 0.0);
    }

    #[test]
    fn test_timezone_shifts_buckets() {
        let records = [at(9, 0)];
        let refs: Vec<&ActivityRecord> = records.iter().collect();
        let tz: Tz = "America/New_York".parse().unwrap();
        let patterns = extract_time_patterns(&refs, tz);
        assert_eq!(patterns.night_pct, 100.0);
        assert_eq!(patterns.activity_hours.get(&4), Some(&1));
    }
}
