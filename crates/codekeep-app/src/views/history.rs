//! # Batch History View State
//!
//! Client-side mirror of the most recent recovery-code batches. The window is
//! bounded, most-recent-first, and never authoritative: the server owns the
//! real batch state and this view only reflects confirmed outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tokio::time::{Duration, Instant};
use uuid::Uuid;

// ============================================================================
// Batch Record
// ============================================================================

/// Lifecycle status of a displayed batch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BatchStatus {
    #[default]
    Active,
    Deleted,
}

impl BatchStatus {
    /// Server label for this status
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Deleted => "Deleted",
        }
    }
}

impl TryFrom<String> for BatchStatus {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        match raw.as_str() {
            "Active" => Ok(Self::Active),
            // Pending deletion and invalidation both read as gone for display
            "Deleted" | "Pending Delete" | "Invalidate" => Ok(Self::Deleted),
            other => Err(format!("unknown batch status '{other}'")),
        }
    }
}

impl From<BatchStatus> for String {
    fn from(status: BatchStatus) -> Self {
        status.label().to_string()
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Summary of one generated batch, as reported by the server
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct BatchRecord {
    pub id: Uuid,
    #[serde(default)]
    pub number_issued: u32,
    #[serde(default)]
    pub number_removed: u32,
    #[serde(default)]
    pub number_invalidated: u32,
    #[serde(default)]
    pub number_used: u32,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub modified_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub downloaded: bool,
    #[serde(default)]
    pub emailed: bool,
    #[serde(default)]
    pub viewed: bool,
    #[serde(default)]
    pub generated: bool,
    #[serde(default)]
    pub status: BatchStatus,
    #[serde(default)]
    pub username: Option<String>,
}

impl BatchRecord {
    /// Create an active batch with zeroed counters
    pub fn new(id: Uuid, number_issued: u32, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            number_issued,
            number_removed: 0,
            number_invalidated: 0,
            number_used: 0,
            created_at,
            modified_at: created_at,
            expiry_date: None,
            downloaded: false,
            emailed: false,
            viewed: false,
            generated: true,
            status: BatchStatus::Active,
            username: None,
        }
    }

    /// Set the expiry date.
    #[must_use]
    pub fn with_expiry(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry_date = Some(expiry);
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == BatchStatus::Active
    }

    /// Current value of a displayed counter
    pub fn counter(&self, field: CounterField) -> u32 {
        match field {
            CounterField::Invalidated => self.number_invalidated,
            CounterField::Removed => self.number_removed,
        }
    }

    fn counter_mut(&mut self, field: CounterField) -> &mut u32 {
        match field {
            CounterField::Invalidated => &mut self.number_invalidated,
            CounterField::Removed => &mut self.number_removed,
        }
    }
}

/// Counters the client bumps optimistically after a confirmed code operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CounterField {
    Invalidated,
    Removed,
}

/// Whether a deletion accompanying the insert was confirmed by the server.
///
/// Decides if the record about to roll off is marked deleted before it goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Retirement {
    Confirmed,
    Unconfirmed,
}

// ============================================================================
// History Window
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
struct Highlight {
    id: Uuid,
    field: CounterField,
    until: Instant,
}

/// Bounded, most-recent-first window of batch records
#[derive(Clone, Debug, Default)]
pub struct HistoryWindow {
    records: VecDeque<BatchRecord>,
    highlights: Vec<Highlight>,
}

impl HistoryWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record at the front and trim to `capacity`.
    ///
    /// The record at index `capacity - 1` is marked deleted first when it is
    /// still active and the retirement was confirmed. The inserted record
    /// itself is never marked. Returns the evicted records, oldest last.
    pub fn insert(
        &mut self,
        record: BatchRecord,
        capacity: usize,
        retirement: Retirement,
    ) -> Vec<BatchRecord> {
        self.records.push_front(record);

        if retirement == Retirement::Confirmed {
            if let Some(boundary) = capacity
                .checked_sub(1)
                .filter(|index| *index > 0)
                .and_then(|index| self.records.get_mut(index))
            {
                if boundary.is_active() {
                    tracing::debug!(batch = %boundary.id, "marking boundary batch deleted");
                    boundary.status = BatchStatus::Deleted;
                }
            }
        }

        let mut evicted = Vec::new();
        while self.records.len() > capacity {
            if let Some(tail) = self.records.pop_back() {
                self.highlights.retain(|h| h.id != tail.id);
                evicted.push(tail);
            }
        }
        evicted
    }

    /// Mark a displayed record deleted. Returns false when it is not shown.
    pub fn mark_deleted(&mut self, id: Uuid) -> bool {
        match self.find_mut(id) {
            Some(record) => {
                record.status = BatchStatus::Deleted;
                true
            }
            None => false,
        }
    }

    /// Add one to a counter and highlight it until `now + ttl`.
    ///
    /// Highlights already expired at `now` are dropped. Returns the new
    /// value, or `None` if the record is not displayed.
    pub fn increment(
        &mut self,
        id: Uuid,
        field: CounterField,
        now: Instant,
        ttl: Duration,
    ) -> Option<u32> {
        let record = self.find_mut(id)?;
        let counter = record.counter_mut(field);
        *counter = counter.saturating_add(1);
        let value = *counter;

        self.highlights
            .retain(|h| now < h.until && !(h.id == id && h.field == field));
        self.highlights.push(Highlight {
            id,
            field,
            until: now + ttl,
        });
        Some(value)
    }

    /// Whether a counter is still highlighted at `now`
    pub fn is_highlighted(&self, id: Uuid, field: CounterField, now: Instant) -> bool {
        self.highlights
            .iter()
            .any(|h| h.id == id && h.field == field && now < h.until)
    }

    pub fn get(&self, index: usize) -> Option<&BatchRecord> {
        self.records.get(index)
    }

    pub fn front(&self) -> Option<&BatchRecord> {
        self.records.front()
    }

    pub fn find(&self, id: Uuid) -> Option<&BatchRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    fn find_mut(&mut self, id: Uuid) -> Option<&mut BatchRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BatchRecord> {
        self.records.iter()
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.records.iter().map(|r| r.id).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Server timestamps arrive either as RFC 3339 or in the
/// `YYYY-MM-DD HH:MM:SS[.ffffff]+HH:MM` form.
pub(crate) mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer};

    const SPACED: &str = "%Y-%m-%d %H:%M:%S%.f%:z";

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_str(raw, SPACED))
            .map(|ts| ts.with_timezone(&Utc))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.is_empty() => parse(&raw).map(Some).map_err(de::Error::custom),
            _ => Ok(None),
        }
    }
}
