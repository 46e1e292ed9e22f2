//! Bounded record of generated suggestions, used to correlate feedback.

use super::category::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

pub const DEFAULT_HISTORY_CAPACITY: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub suggestion_id: Uuid,
    pub content: String,
    pub context_key: String,
    pub category: Category,
    pub generated_at: DateTime<Utc>,
}

/// FIFO of recent suggestions; the oldest entry is evicted at capacity.
#[derive(Debug, Clone)]
pub struct SuggestionHistory {
    capacity: usize,
    entries: VecDeque<HistoryEntry>,
}

impl SuggestionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Most recent entry among the last `window` that satisfies `pred`.
    pub fn find_recent<P>(&self, window: usize, mut pred: P) -> Option<&HistoryEntry>
    where
        P: FnMut(&HistoryEntry) -> bool,
    {
        self.entries.iter().rev().take(window).find(|e| pred(e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}

impl Default for SuggestionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
