//! Memory Log — bounded, ordered history of notable companion events.
//!
//! Each entry records a short summary and the mood the companion was in
//! right after the event. The log keeps at most `capacity` entries (50 by
//! default); appending past the cap drops the oldest.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::mood::Mood;
use crate::types::MemoryId;

/// Default number of entries kept per companion.
pub const DEFAULT_MEMORY_CAPACITY: usize = 50;

/// Kind of event a memory records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryCategory {
    /// A verified eco-action.
    Action,
    /// A conversation turn.
    Chat,
    /// Quiz results and other achievements.
    Milestone,
    /// A stage advance.
    Evolution,
}

/// One remembered event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Unique ID.
    pub id: MemoryId,
    /// Event kind.
    pub category: MemoryCategory,
    /// Short human-readable summary.
    pub summary: String,
    /// When the event happened.
    pub created_at: DateTime<Utc>,
    /// Mood immediately after the event was applied.
    pub mood: Mood,
}

/// Bounded FIFO of [`MemoryEntry`]s, oldest first.
///
/// Loading clamps the capacity to at least 1 and keeps only the newest
/// `capacity` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MemoryLogRecord")]
pub struct MemoryLog {
    entries: VecDeque<MemoryEntry>,
    capacity: usize,
}

#[derive(Deserialize)]
struct MemoryLogRecord {
    #[serde(default)]
    entries: VecDeque<MemoryEntry>,
    #[serde(default = "default_capacity")]
    capacity: usize,
}

fn default_capacity() -> usize { DEFAULT_MEMORY_CAPACITY }

impl From<MemoryLogRecord> for MemoryLog {
    fn from(r: MemoryLogRecord) -> Self {
        let capacity = r.capacity.max(1);
        let mut entries = r.entries;
        let excess = entries.len().saturating_sub(capacity);
        entries.drain(..excess);
        Self { entries, capacity }
    }
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CAPACITY)
    }
}

impl MemoryLog {
    /// Create an empty log with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty log holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of retained entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an entry stamped with the current time.
    pub fn append(&mut self, category: MemoryCategory, summary: impl Into<String>, mood: Mood) -> MemoryId {
        self.append_at(category, summary, mood, Utc::now())
    }

    /// Append an entry with an explicit timestamp, evicting from the front
    /// when the log is over capacity.
    pub fn append_at(
        &mut self,
        category: MemoryCategory,
        summary: impl Into<String>,
        mood: Mood,
        at: DateTime<Utc>,
    ) -> MemoryId {
        let id = MemoryId::new();
        self.entries.push_back(MemoryEntry {
            id,
            category,
            summary: summary.into(),
            created_at: at,
            mood,
        });

        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                debug!(
                    memory = %evicted.id,
                    category = ?evicted.category,
                    "Evicted oldest memory"
                );
            }
        }
        id
    }

    /// The last `n` entries, oldest first. Fewer if the log is shorter.
    pub fn recent(&self, n: usize) -> impl DoubleEndedIterator<Item = &MemoryEntry> + ExactSizeIterator + Clone {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.range(skip..)
    }

    /// The most recent entry.
    #[must_use]
    pub fn latest(&self) -> Option<&MemoryEntry> {
        self.entries.back()
    }

    /// Look up an entry by ID.
    #[must_use]
    pub fn get(&self, id: MemoryId) -> Option<&MemoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// All entries, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &MemoryEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
