use std::collections::VecDeque;

use evsim_generator::{Event, Variant};
use serde::Serialize;

/// An event as held by the log, tagged with the id used to select it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedEvent {
    pub id: u64,
    #[serde(flatten)]
    pub event: Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOrder {
    NewestFirst,
    OldestFirst,
}

/// Bounded list of recent events. When full, a push drops the oldest entry.
/// `total` counts every push and survives eviction and clearing.
#[derive(Debug)]
pub struct EventLog {
    // oldest at the front
    entries: VecDeque<LoggedEvent>,
    capacity: usize,
    order: LogOrder,
    next_id: u64,
    total: u64,
}

impl EventLog {
    pub fn new(capacity: usize, order: LogOrder) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            order,
            next_id: 1,
            total: 0,
        }
    }

    pub fn for_variant(variant: Variant) -> Self {
        let order = if variant.newest_first() {
            LogOrder::NewestFirst
        } else {
            LogOrder::OldestFirst
        };
        Self::new(variant.log_capacity(), order)
    }

    pub fn push(&mut self, event: Event) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.total += 1;
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LoggedEvent { id, event });
        id
    }

    /// Empties the log and returns how many entries were dropped.
    pub fn clear(&mut self) -> usize {
        let cleared = self.entries.len();
        self.entries.clear();
        cleared
    }

    pub fn get(&self, id: u64) -> Option<&LoggedEvent> {
        // ids are increasing, so the deque is sorted by id
        self.entries
            .binary_search_by_key(&id, |entry| entry.id)
            .ok()
            .and_then(|idx| self.entries.get(idx))
    }

    /// Up to `limit` entries in display order.
    pub fn list(&self, limit: Option<usize>) -> Vec<LoggedEvent> {
        let limit = limit.unwrap_or(self.capacity);
        match self.order {
            LogOrder::NewestFirst => self.entries.iter().rev().take(limit).cloned().collect(),
            LogOrder::OldestFirst => self.entries.iter().take(limit).cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn order(&self) -> LogOrder {
        self.order
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}
