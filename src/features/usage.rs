//! Application usage shares and productivity tiers.

use super::FeatureError;
use crate::tracker::ActivityRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Coarse productivity classification of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductivityTier {
    High,
    Medium,
    Low,
}

impl ProductivityTier {
    /// Match order, which is also the tie-break precedence.
    pub const ALL: [ProductivityTier; 3] = [
        ProductivityTier::High,
        ProductivityTier::Medium,
        ProductivityTier::Low,
    ];

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            ProductivityTier::High => &[
                "code",
                "editor",
                "terminal",
                "office",
                "excel",
                "word",
                "powerpoint",
            ],
            ProductivityTier::Medium => &["browser", "mail", "outlook", "teams", "slack", "discord"],
            ProductivityTier::Low => &["games", "youtube", "netflix", "spotify", "music"],
        }
    }

    /// Case-insensitive substring match; the first tier with a hit wins.
    ///
    /// An app matching keywords of several tiers lands in the earliest one,
    /// e.g. "VS Code Music Player" is `High`.
    pub fn classify(application_name: &str) -> Option<ProductivityTier> {
        let lower = application_name.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|tier| tier.keywords().iter().any(|kw| lower.contains(kw)))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProductivityTier::High => "high",
            ProductivityTier::Medium => "medium",
            ProductivityTier::Low => "low",
        }
    }
}

/// Usage distribution over applications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageFeatures {
    /// Percent of tracked time per application (raw seconds if nothing was tracked)
    pub app_usage: BTreeMap<String, f64>,
    /// Sum of all durations, in seconds
    pub total_tracked_time: u64,
    pub high_productivity: f64,
    pub medium_productivity: f64,
    pub low_productivity: f64,
}

impl UsageFeatures {
    /// Applications ordered by share, largest first; ties by name.
    pub fn top_apps(&self, n: usize) -> Vec<&str> {
        let mut apps: Vec<(&String, &f64)> = self.app_usage.iter().collect();
        apps.sort_by(|a, b| b.1.total_cmp(a.1));
        apps.into_iter().take(n).map(|(name, _)| name.as_str()).collect()
    }

    pub fn tier_percent(&self, tier: ProductivityTier) -> f64 {
        match tier {
            ProductivityTier::High => self.high_productivity,
            ProductivityTier::Medium => self.medium_productivity,
            ProductivityTier::Low => self.low_productivity,
        }
    }
}

pub(crate) fn extract_usage(records: &[&ActivityRecord]) -> Result<UsageFeatures, FeatureError> {
    let mut per_app: BTreeMap<String, u64> = BTreeMap::new();
    for record in records {
        let slot = per_app.entry(record.application_name.clone()).or_default();
        *slot = slot
            .checked_add(record.duration_secs)
            .ok_or(FeatureError::Overflow("application duration"))?;
    }

    let total = per_app
        .values()
        .try_fold(0u64, |acc, secs| acc.checked_add(*secs))
        .ok_or(FeatureError::Overflow("total tracked time"))?;

    if total == 0 {
        return Ok(UsageFeatures {
            app_usage: per_app
                .into_iter()
                .map(|(app, secs)| (app, secs as f64))
                .collect(),
            ..UsageFeatures::default()
        });
    }

    let mut tier_secs = [0u64; 3];
    for (app, secs) in &per_app {
        if let Some(tier) = ProductivityTier::classify(app) {
            tier_secs[tier as usize] += secs;
        }
    }

    let pct = |secs: u64| secs as f64 / total as f64 * 100.0;
    Ok(UsageFeatures {
        app_usage: per_app
            .into_iter()
            .map(|(app, secs)| (app, pct(secs)))
            .collect(),
        total_tracked_time: total,
        high_productivity: pct(tier_secs[0]),
        medium_productivity: pct(tier_secs[1]),
        low_productivity: pct(tier_secs[2]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(app: &str, secs: u64) -> ActivityRecord {
        ActivityRecord::app_usage(app, "", secs, Utc::now())
    }

    #[test]
    fn test_classification_first_match_wins() {
        assert_eq!(ProductivityTier::classify("VS Code"), Some(ProductivityTier::High));
        assert_eq!(ProductivityTier::classify("Slack"), Some(ProductivityTier::Medium));
        assert_eq!(ProductivityTier::classify("Spotify"), Some(ProductivityTier::Low));
        assert_eq!(ProductivityTier::classify("Code Music"), Some(ProductivityTier::High));
        assert_eq!(ProductivityTier::classify("Finder"), None);
    }

    #[test]
    fn test_usage_percentages_sum_to_100() {
        let records = [record("Editor", 30), record("Browser", 50), record("Finder", 20)];
        let refs: Vec<&ActivityRecord> = records.iter().collect();
        let usage = extract_usage(&refs).unwrap();

        let sum: f64 = usage.app_usage.values().sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert_eq!(usage.total_tracked_time, 100);
        assert!((usage.high_productivity - 30.0).abs() < 1e-9);
        assert!((usage.medium_productivity - 50.0).abs() < 1e-9);
        assert_eq!(usage.low_productivity, 0.0);
    }

    #[test]
    fn test_zero_total_reports_raw_durations() {
        let records = [record("Editor", 0)];
        let refs: Vec<&ActivityRecord> = records.iter().collect();
        let usage = extract_usage(&refs).unwrap();

        assert_eq!(usage.app_usage.get("Editor"), Some(&0.0));
        assert_eq!(usage.high_productivity, 0.0);
    }

    #[test]
    fn test_overflow_is_an_error() {
        let records = [record("Editor", u64::MAX), record("Editor", 1)];
        let refs: Vec<&ActivityRecord> = records.iter().collect();
        assert!(matches!(extract_usage(&refs), Err(FeatureError::Overflow(_))));
    }

    #[test]
    fn test_top_apps_ordering() {
        let records = [record("A", 10), record("B", 30), record("C", 20)];
        let refs: Vec<&ActivityRecord> = records.iter().collect();
        let usage = extract_usage(&refs).unwrap();
        assert_eq!(usage.top_apps(2), vec!["B", "C"]);
    }
}
