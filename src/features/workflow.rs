//! Application transition and workflow sequence counting.

use crate::tracker::ActivityRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of pair transitions reported.
pub const TOP_TRANSITIONS: usize = 5;
/// Number of three-step workflows reported.
pub const TOP_WORKFLOWS: usize = 3;

/// A sequence such as `"Editor -> Browser"` and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceCount {
    pub sequence: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowFeatures {
    /// Most frequent adjacent pairs, most frequent first
    pub common_transitions: Vec<SequenceCount>,
    /// Most frequent consecutive triples, most frequent first
    pub workflows: Vec<SequenceCount>,
}

impl WorkflowFeatures {
    pub fn transition_count(&self, sequence: &str) -> Option<usize> {
        self.common_transitions
            .iter()
            .find(|s| s.sequence == sequence)
            .map(|s| s.count)
    }
}

pub(crate) fn extract_workflows(records: &[&ActivityRecord]) -> WorkflowFeatures {
    if records.len() < 2 {
        return WorkflowFeatures::default();
    }

    let mut ordered: Vec<&ActivityRecord> = records.to_vec();
    ordered.sort_by_key(|r| r.timestamp);
    let apps: Vec<&str> = ordered
        .iter()
        .map(|r| r.application_name.as_str())
        .collect();

    WorkflowFeatures {
        common_transitions: top_sequences(&apps, 2, TOP_TRANSITIONS),
        workflows: top_sequences(&apps, 3, TOP_WORKFLOWS),
    }
}

/// Count every run of `width` consecutive apps and keep the `limit` most
/// frequent. Equal counts keep first-seen order.
fn top_sequences(apps: &[&str], width: usize, limit: usize) -> Vec<SequenceCount> {
    let mut counts: Vec<SequenceCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for run in apps.windows(width) {
        let sequence = run.join(" -> ");
        match index.get(&sequence) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(sequence.clone(), counts.len());
                counts.push(SequenceCount { sequence, count: 1 });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}
