//! Context keys: the value-table lookup derived from a feature set.

use super::templates::RenderContext;
use crate::features::{FeatureSet, ProductivityTier};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Time period used in context keys. Boundaries differ from the feature
/// extractor's day parts: evening ends at 22:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimePeriod {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimePeriod::Morning,
            12..=16 => TimePeriod::Afternoon,
            17..=21 => TimePeriod::Evening,
            _ => TimePeriod::Night,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimePeriod::Morning => "morning",
            TimePeriod::Afternoon => "afternoon",
            TimePeriod::Evening => "evening",
            TimePeriod::Night => "night",
        }
    }
}

/// `{period}_{weekday}_{weekend}_{tier}_{top_app}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextKey(String);

impl ContextKey {
    pub fn derive(features: &FeatureSet) -> Self {
        let period = TimePeriod::from_hour(features.time_of_day);
        let tier = dominant_tier(features);
        let top_app = features
            .usage
            .top_apps(1)
            .first()
            .map(|app| app.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Self(format!(
            "{}_{}_{}_{}_{}",
            period.as_str(),
            features.day_of_week,
            u8::from(features.is_weekend),
            tier.as_str(),
            top_app
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ContextKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for ContextKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Largest tier share. Equal shares go to the earlier tier, so an empty
/// feature set counts as `High`.
pub fn dominant_tier(features: &FeatureSet) -> ProductivityTier {
    let mut best = ProductivityTier::High;
    for tier in ProductivityTier::ALL {
        if features.usage.tier_percent(tier) > features.usage.tier_percent(best) {
            best = tier;
        }
    }
    best
}

/// Placeholder values for a feature set.
pub fn render_context(features: &FeatureSet) -> RenderContext {
    RenderContext {
        top_apps: features
            .usage
            .top_apps(3)
            .into_iter()
            .map(str::to_string)
            .collect(),
        activity_density: features
            .features_available
            .then_some(features.time_patterns.activity_density),
        hour: features.time_of_day,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(hour: u32, apps: &[(&str, f64)]) -> FeatureSet {
        let mut f = FeatureSet {
            features_available: !apps.is_empty(),
            time_of_day: hour,
            day_of_week: 2,
            ..FeatureSet::default()
        };
        for (app, pct) in apps {
            f.usage.app_usage.insert(app.to_string(), *pct);
        }
        f
    }

    #[test]
    fn test_key_for_empty_features() {
        let key = ContextKey::derive(&features(23, &[]));
        assert_eq!(key.as_str(), "night_2_0_high_unknown");
    }

    #[test]
    fn test_key_uses_top_app_and_dominant_tier() {
        let mut f = features(9, &[("Editor", 30.0), ("Browser", 70.0)]);
        f.usage.high_productivity = 30.0;
        f.usage.medium_productivity = 70.0;
        assert_eq!(ContextKey::derive(&f).as_str(), "morning_2_0_medium_Browser");
    }

    #[test]
    fn test_tier_ties_prefer_higher_tier() {
        let mut f = features(14, &[("A", 50.0)]);
        f.usage.medium_productivity = 40.0;
        f.usage.low_productivity = 40.0;
        assert_eq!(dominant_tier(&f), ProductivityTier::Medium);

        f.usage.high_productivity = 40.0;
        assert_eq!(dominant_tier(&f), ProductivityTier::High);
    }

    #[test]
    fn test_period_boundaries() {
        assert_eq!(TimePeriod::from_hour(16), TimePeriod::Afternoon);
        assert_eq!(TimePeriod::from_hour(17), TimePeriod::Evening);
        assert_eq!(TimePeriod::from_hour(22), TimePeriod::Night);
    }

    #[test]
    fn test_render_context_density_defaults_when_empty() {
        let ctx = render_context(&features(10, &[]));
        assert_eq!(ctx.activity_density, None);
        assert!(ctx.top_apps.is_empty());
    }
}
