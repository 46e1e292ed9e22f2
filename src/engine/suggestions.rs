//! The contextual epsilon-greedy suggestion engine.

use super::category::Category;
use super::context::{render_context, ContextKey};
use super::feedback::{FeedbackEvent, FeedbackLabel};
use super::history::{HistoryEntry, SuggestionHistory};
use super::templates::TemplateCatalog;
use super::value_table::ValueTable;
use super::{EngineConfig, EngineError};
use crate::features::FeatureSet;
use crate::transparency::SharedTransparencyLog;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Suggestions per batch.
pub const BATCH_SIZE: usize = 3;

const PRIMARY_COUNT: usize = 2;
const SECONDARY_COUNT: usize = 1;

const PADDING_SUGGESTIONS: [&str; BATCH_SIZE] = [
    "Consider organizing your files into project-based folders for easier access.",
    "Take regular breaks to maintain productivity. Try the Pomodoro technique: 25 minutes of focus followed by a 5-minute break.",
    "Keep your workspace organized to improve focus and efficiency.",
];

const FALLBACK_SUGGESTIONS: [&str; BATCH_SIZE] = [
    "Consider organizing your files into project-based folders for easier access.",
    "Clean up your desktop and dock/taskbar to focus on applications you actually use.",
    "Take regular breaks to maintain productivity. Try the Pomodoro technique.",
];

/// One rendered suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: Uuid,
    pub content: String,
    /// `None` for generic padding and fallback text
    pub category: Option<Category>,
    pub context_key: String,
    pub generated_at: DateTime<Utc>,
}

impl Suggestion {
    fn generic(content: &str, context_key: &str, generated_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.to_string(),
            category: None,
            context_key: context_key.to_string(),
            generated_at,
        }
    }
}

/// Result of one generation call. Always holds exactly three suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionBatch {
    pub context_key: String,
    pub primary_category: Option<Category>,
    pub secondary_category: Option<Category>,
    pub suggestions: Vec<Suggestion>,
    pub generated_at: DateTime<Utc>,
    /// Set when generation failed and generic text was returned instead
    pub fallback: bool,
}

impl SuggestionBatch {
    pub fn contents(&self) -> Vec<&str> {
        self.suggestions.iter().map(|s| s.content.as_str()).collect()
    }

    fn fallback(context_key: String) -> Self {
        let generated_at = Utc::now();
        Self {
            suggestions: FALLBACK_SUGGESTIONS
                .iter()
                .map(|text| Suggestion::generic(text, &context_key, generated_at))
                .collect(),
            context_key,
            primary_category: None,
            secondary_category: None,
            generated_at,
            fallback: true,
        }
    }
}

/// What a feedback event did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FeedbackOutcome {
    Applied {
        context_key: String,
        category: Category,
        value: f64,
    },
    /// No retained suggestion matched; nothing changed
    Unmatched,
}

struct EngineState {
    values: ValueTable,
    history: SuggestionHistory,
    rng: StdRng,
}

/// Learns which suggestion categories help in which context.
///
/// All mutable state sits behind one mutex, so the engine can be shared
/// across threads in an `Arc`.
pub struct SuggestionEngine {
    config: EngineConfig,
    catalog: TemplateCatalog,
    state: Mutex<EngineState>,
    log: Option<SharedTransparencyLog>,
}

impl SuggestionEngine {
    /// Engine with the built-in templates and an entropy-seeded RNG.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_rng(config, TemplateCatalog::builtin()?, StdRng::from_entropy())
    }

    /// Engine with a deterministic RNG.
    pub fn with_seed(config: EngineConfig, seed: u64) -> Result<Self, EngineError> {
        Self::with_rng(config, TemplateCatalog::builtin()?, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(
        config: EngineConfig,
        catalog: TemplateCatalog,
        rng: StdRng,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            state: Mutex::new(EngineState {
                values: ValueTable::new(config.initial_value),
                history: SuggestionHistory::new(config.history_capacity),
                rng,
            }),
            config,
            catalog,
            log: None,
        })
    }

    pub fn with_transparency(mut self, log: SharedTransparencyLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generate exactly three suggestions for `features`.
    ///
    /// Never fails: internal errors produce the generic fallback batch.
    pub fn generate(&self, features: &FeatureSet) -> SuggestionBatch {
        let context_key = ContextKey::derive(features);
        let batch = self
            .try_generate(features, &context_key)
            .unwrap_or_else(|e| {
                error!(context = %context_key, "suggestion generation failed: {e}");
                SuggestionBatch::fallback(context_key.to_string())
            });

        if let Some(log) = &self.log {
            log.record_suggestions(batch.suggestions.len() as u64);
        }
        batch
    }

    fn try_generate(
        &self,
        features: &FeatureSet,
        context_key: &ContextKey,
    ) -> Result<SuggestionBatch, EngineError> {
        let mut state = self.lock()?;
        let EngineState {
            values,
            history,
            rng,
        } = &mut *state;
        let key = context_key.as_str();

        let primary = select(values, rng, key, self.config.exploration_rate);
        let secondary = Category::ALL
            .iter()
            .copied()
            .filter(|c| *c != primary)
            .collect::<Vec<_>>()
            .choose(rng)
            .copied()
            .ok_or_else(|| EngineError::Internal("no secondary category available".into()))?;
        debug!(context = key, %primary, %secondary, "categories selected");

        let ctx = render_context(features);
        let generated_at = Utc::now();
        let mut suggestions = Vec::with_capacity(BATCH_SIZE);
        for (category, count) in [(primary, PRIMARY_COUNT), (secondary, SECONDARY_COUNT)] {
            for template in self.catalog.templates(category).choose_multiple(rng, count) {
                let suggestion = Suggestion {
                    id: Uuid::new_v4(),
                    content: template.render(&ctx),
                    category: Some(category),
                    context_key: key.to_string(),
                    generated_at,
                };
                history.push(HistoryEntry {
                    suggestion_id: suggestion.id,
                    content: suggestion.content.clone(),
                    context_key: key.to_string(),
                    category,
                    generated_at,
                });
                suggestions.push(suggestion);
            }
        }

        suggestions.truncate(BATCH_SIZE);
        for text in PADDING_SUGGESTIONS {
            if suggestions.len() >= BATCH_SIZE {
                break;
            }
            suggestions.push(Suggestion::generic(text, key, generated_at));
        }

        Ok(SuggestionBatch {
            context_key: key.to_string(),
            primary_category: Some(primary),
            secondary_category: Some(secondary),
            suggestions,
            generated_at,
            fallback: false,
        })
    }

    /// Pick a category for `context_key` without generating text.
    pub fn select_category(&self, context_key: &str) -> Result<Category, EngineError> {
        let mut state = self.lock()?;
        let EngineState { values, rng, .. } = &mut *state;
        Ok(select(values, rng, context_key, self.config.exploration_rate))
    }

    /// Apply a feedback event to the suggestion it names.
    ///
    /// Only the most recent `feedback_window` suggestions are searched; a
    /// miss is reported as [`FeedbackOutcome::Unmatched`], not an error.
    pub fn feedback(&self, event: &FeedbackEvent) -> Result<FeedbackOutcome, EngineError> {
        if event.suggestion_id.is_none() && event.content.as_deref().map_or(true, str::is_empty) {
            return Err(EngineError::RejectedInput(
                "feedback names no suggestion id or content".into(),
            ));
        }

        let mut state = self.lock()?;
        let matched = state
            .history
            .find_recent(self.config.feedback_window, |entry| {
                event.suggestion_id == Some(entry.suggestion_id)
                    || event.content.as_deref() == Some(entry.content.as_str())
            })
            .map(|entry| (entry.context_key.clone(), entry.category));

        let Some((context_key, category)) = matched else {
            debug!(label = event.label.as_str(), "feedback matched no recent suggestion");
            if let Some(log) = &self.log {
                log.record_feedback_unmatched();
            }
            return Ok(FeedbackOutcome::Unmatched);
        };

        let value = self.update(&mut state.values, &context_key, category, event.label);
        Ok(FeedbackOutcome::Applied {
            context_key,
            category,
            value,
        })
    }

    /// Parse and apply a JSON feedback payload.
    pub fn feedback_value(&self, payload: &Value) -> Result<FeedbackOutcome, EngineError> {
        let event = FeedbackEvent::from_value(payload)?;
        self.feedback(&event)
    }

    /// Reward a context/category pair directly, bypassing history lookup.
    ///
    /// For callers that persisted suggestion metadata and replay feedback
    /// after the history window has moved on. Returns the new estimate.
    pub fn apply_reward(
        &self,
        context_key: &str,
        category: Category,
        label: FeedbackLabel,
    ) -> Result<f64, EngineError> {
        let mut state = self.lock()?;
        Ok(self.update(&mut state.values, context_key, category, label))
    }

    fn update(
        &self,
        values: &mut ValueTable,
        context_key: &str,
        category: Category,
        label: FeedbackLabel,
    ) -> f64 {
        let value = values.add(
            context_key,
            category,
            self.config.learning_rate * label.reward(),
        );
        info!(context = context_key, %category, label = label.as_str(), value, "value updated");
        if let Some(log) = &self.log {
            log.record_feedback_applied();
        }
        value
    }

    pub fn value(&self, context_key: &str, category: Category) -> Option<f64> {
        self.lock().ok()?.values.get(context_key, category)
    }

    /// Copy of the learned values, for the caller to persist.
    pub fn value_table_snapshot(&self) -> Result<ValueTable, EngineError> {
        Ok(self.lock()?.values.clone())
    }

    /// Replace the learned values with a previously saved table.
    pub fn restore_value_table(&self, mut table: ValueTable) -> Result<(), EngineError> {
        table.normalize();
        self.lock()?.values = table;
        Ok(())
    }

    pub fn history_len(&self) -> usize {
        self.lock().map(|s| s.history.len()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, EngineState>, EngineError> {
        self.state.lock().map_err(|_| EngineError::Poisoned)
    }
}

fn select(values: &mut ValueTable, rng: &mut StdRng, key: &str, epsilon: f64) -> Category {
    // Initialise before either branch so unseen contexts always get an entry.
    values.context_mut(key);
    if rng.gen::<f64>() < epsilon {
        if let Some(category) = Category::ALL.choose(rng) {
            return *category;
        }
    }
    values.best(key)
}
