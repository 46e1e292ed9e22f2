//! Feedback events and their rewards.

use super::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackLabel {
    Helpful,
    SomewhatHelpful,
    NotHelpful,
}

impl FeedbackLabel {
    pub fn reward(self) -> f64 {
        match self {
            FeedbackLabel::Helpful => 1.0,
            FeedbackLabel::SomewhatHelpful => 0.5,
            FeedbackLabel::NotHelpful => -0.2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackLabel::Helpful => "helpful",
            FeedbackLabel::SomewhatHelpful => "somewhat_helpful",
            FeedbackLabel::NotHelpful => "not_helpful",
        }
    }
}

impl FromStr for FeedbackLabel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "helpful" => Ok(FeedbackLabel::Helpful),
            "somewhat_helpful" | "somewhat helpful" | "somewhat" => {
                Ok(FeedbackLabel::SomewhatHelpful)
            }
            "not_helpful" | "not helpful" | "unhelpful" => Ok(FeedbackLabel::NotHelpful),
            other => Err(EngineError::RejectedInput(format!(
                "unknown feedback label: {other:?}"
            ))),
        }
    }
}

/// User feedback on one suggestion, identified by id or by content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub suggestion_id: Option<Uuid>,
    pub content: Option<String>,
    pub label: FeedbackLabel,
    pub timestamp: DateTime<Utc>,
}

impl FeedbackEvent {
    pub fn for_id(suggestion_id: Uuid, label: FeedbackLabel) -> Self {
        Self {
            suggestion_id: Some(suggestion_id),
            content: None,
            label,
            timestamp: Utc::now(),
        }
    }

    pub fn for_content(content: impl Into<String>, label: FeedbackLabel) -> Self {
        Self {
            suggestion_id: None,
            content: Some(content.into()),
            label,
            timestamp: Utc::now(),
        }
    }

    /// Parse a loosely shaped JSON payload.
    ///
    /// Accepts `suggestion_id`/`id`, `content`/`suggestion` and
    /// `label`/`feedback`; `timestamp` is optional. The payload must be an
    /// object naming the suggestion one way or the other.
    pub fn from_value(value: &Value) -> Result<Self, EngineError> {
        let obj = value
            .as_object()
            .ok_or_else(|| EngineError::RejectedInput("feedback must be an object".into()))?;

        let field = |names: &[&str]| names.iter().find_map(|n| obj.get(*n)).filter(|v| !v.is_null());

        let suggestion_id = match field(&["suggestion_id", "id"]) {
            None => None,
            Some(v) => {
                let raw = v.as_str().ok_or_else(|| {
                    EngineError::RejectedInput("suggestion id must be a string".into())
                })?;
                Some(Uuid::parse_str(raw).map_err(|e| {
                    EngineError::RejectedInput(format!("invalid suggestion id {raw:?}: {e}"))
                })?)
            }
        };

        let content = match field(&["content", "suggestion"]) {
            None => None,
            Some(v) => Some(
                v.as_str()
                    .ok_or_else(|| EngineError::RejectedInput("content must be a string".into()))?
                    .to_string(),
            ),
        }
        .filter(|c| !c.is_empty());

        if suggestion_id.is_none() && content.is_none() {
            return Err(EngineError::RejectedInput(
                "feedback names no suggestion id or content".into(),
            ));
        }

        let label = field(&["label", "feedback"])
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::RejectedInput("feedback label missing".into()))?
            .parse()?;

        let timestamp = match field(&["timestamp"]).and_then(Value::as_str) {
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map_err(|e| EngineError::RejectedInput(format!("invalid timestamp: {e}")))?
                .with_timezone(&Utc),
            None => Utc::now(),
        };

        Ok(Self {
            suggestion_id,
            content,
            label,
            timestamp,
        })
    }
}
