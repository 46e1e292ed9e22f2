//! Suggestion categories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a suggestion is about. Declaration order is the argmax tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Productivity,
    Organization,
    TimeManagement,
    Ergonomics,
    BreakReminders,
    WorkflowOptimization,
    FocusSuggestions,
    AppConsolidation,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Productivity,
        Category::Organization,
        Category::TimeManagement,
        Category::Ergonomics,
        Category::BreakReminders,
        Category::WorkflowOptimization,
        Category::FocusSuggestions,
        Category::AppConsolidation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Productivity => "productivity",
            Category::Organization => "organization",
            Category::TimeManagement => "time_management",
            Category::Ergonomics => "ergonomics",
            Category::BreakReminders => "break_reminders",
            Category::WorkflowOptimization => "workflow_optimization",
            Category::FocusSuggestions => "focus_suggestions",
            Category::AppConsolidation => "app_consolidation",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
            assert_eq!(
                serde_json::to_value(category).unwrap(),
                serde_json::Value::String(category.as_str().to_string())
            );
        }
        assert!("nonsense".parse::<Category>().is_err());
    }
}
