//! Bounded per-chat record of media dispatch outcomes.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use super::media_type::MediaType;
use crate::domain::foundation::{ChatId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    pub media_type: MediaType,
    pub category: String,
    pub success: bool,
    pub at: Timestamp,
}

/// Keeps the last `capacity` outcomes for each chat; oldest entries are
/// evicted first.
#[derive(Debug)]
pub struct MediaHistory {
    capacity: usize,
    entries: HashMap<ChatId, VecDeque<DispatchRecord>>,
}

impl MediaHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
        }
    }

    pub fn record(&mut self, chat_id: &ChatId, record: DispatchRecord) {
        let log = self.entries.entry(chat_id.clone()).or_default();
        log.push_back(record);
        while log.len() > self.capacity {
            log.pop_front();
        }
    }

    /// True if this (type, category) was successfully sent to the chat,
    /// optionally only within the last `within`.
    pub fn has_been_sent(
        &self,
        chat_id: &ChatId,
        media_type: MediaType,
        category: &str,
        within: Option<Duration>,
        now: &Timestamp,
    ) -> bool {
        let Some(log) = self.entries.get(chat_id) else {
            return false;
        };
        log.iter().any(|r| {
            r.success
                && r.media_type == media_type
                && r.category == category
                && within.map_or(true, |w| !r.at.is_older_than(w, now))
        })
    }

    pub fn entries(&self, chat_id: &ChatId) -> Vec<DispatchRecord> {
        self.entries
            .get(chat_id)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn forget(&mut self, chat_id: &ChatId) {
        self.entries.remove(chat_id);
    }
}
