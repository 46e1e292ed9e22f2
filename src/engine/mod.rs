//! Workflow suggestion engine.
//!
//! ```text
//! FeatureSet ──► ContextKey ──► ValueTable ──► epsilon-greedy category
//!                    │                              │
//!                    └──► RenderContext ──► Template::render ──► 3 suggestions
//!                                                               │
//!        FeedbackEvent ──► history lookup ──► value += lr × reward
//! ```

pub mod category;
pub mod context;
pub mod feedback;
pub mod history;
pub mod suggestions;
pub mod templates;
pub mod value_table;

pub use category::Category;
pub use context::{dominant_tier, render_context, ContextKey, TimePeriod};
pub use feedback::{FeedbackEvent, FeedbackLabel};
pub use history::{HistoryEntry, SuggestionHistory, DEFAULT_HISTORY_CAPACITY};
pub use suggestions::{FeedbackOutcome, Suggestion, SuggestionBatch, SuggestionEngine, BATCH_SIZE};
pub use templates::{Placeholder, RenderContext, Template, TemplateCatalog};
pub use value_table::{ValueTable, DEFAULT_INITIAL_VALUE};

use serde::{Deserialize, Serialize};

/// Learning parameters for [`SuggestionEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Probability of picking a random category (0.0 to 1.0)
    pub exploration_rate: f64,
    /// Step size applied to feedback rewards
    pub learning_rate: f64,
    /// Starting estimate for unseen contexts
    pub initial_value: f64,
    /// Suggestions retained for feedback correlation
    pub history_capacity: usize,
    /// How many recent suggestions feedback is matched against
    pub feedback_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exploration_rate: 0.2,
            learning_rate: 0.1,
            initial_value: DEFAULT_INITIAL_VALUE,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            feedback_window: 10,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(0.0..=1.0).contains(&self.exploration_rate) {
            return Err(EngineError::InvalidConfig(format!(
                "exploration_rate must be within 0..=1, got {}",
                self.exploration_rate
            )));
        }
        if !self.learning_rate.is_finite() || !self.initial_value.is_finite() {
            return Err(EngineError::InvalidConfig(
                "learning_rate and initial_value must be finite".into(),
            ));
        }
        if self.history_capacity == 0 || self.feedback_window == 0 {
            return Err(EngineError::InvalidConfig(
                "history_capacity and feedback_window must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A template refers to a placeholder with no substitution rule.
    #[error("template {template} uses unknown placeholder {{{name}}}")]
    UnknownPlaceholder { template: String, name: String },

    /// Structurally invalid input from the caller.
    #[error("rejected input: {0}")]
    RejectedInput(String),

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("engine state lock poisoned")]
    Poisoned,

    #[error("internal engine error: {0}")]
    Internal(String),
}
