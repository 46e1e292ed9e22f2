//! Feature extraction from activity records.
//!
//! [`FeatureExtractor`] turns a batch of [`ActivityRecord`](crate::tracker::ActivityRecord)s
//! into a [`FeatureSet`]: usage shares, time-of-day patterns and workflow
//! sequences. Extraction is a pure function of its input apart from the
//! current-time fields.

pub mod extractor;
pub mod time_patterns;
pub mod usage;
pub mod workflow;

pub use extractor::{
    parse_activity_batch, ExtractionScope, FeatureExtractor, FeatureSet, HealthSummary,
};
pub use time_patterns::{DayPart, TimePatternFeatures};
pub use usage::{ProductivityTier, UsageFeatures};
pub use workflow::{SequenceCount, WorkflowFeatures, TOP_TRANSITIONS, TOP_WORKFLOWS};

/// Errors raised by feature extraction.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    /// The caller passed something that is not a record batch at all.
    #[error("rejected input: {0}")]
    RejectedInput(String),
    #[error("arithmetic overflow while summing {0}")]
    Overflow(&'static str),
}
