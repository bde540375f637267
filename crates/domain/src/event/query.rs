use serde::{Deserialize, Serialize};

use super::entity::AuditEvent;

/// Category-class filter the audit service applies server-side.
pub const FILTER_DATABASE: &str = "db";

const NS_PER_DAY: u64 = 86_400 * 1_000_000_000;

/// Inclusive time window for an event query.
///
/// Opaque to the feed beyond being passed through to the audit service.
/// Presets carry a name so a range picker can label them; the window
/// itself is always explicit nanosecond bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from_ns: u64,
    pub to_ns: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TimeRange {
    pub fn new(from_ns: u64, to_ns: u64) -> Self {
        Self {
            from_ns,
            to_ns,
            name: None,
        }
    }

    fn preset(name: &str, days: u64, now_ns: u64) -> Self {
        Self {
            from_ns: now_ns.saturating_sub(days * NS_PER_DAY),
            to_ns: now_ns,
            name: Some(name.to_string()),
        }
    }

    pub fn last_day(now_ns: u64) -> Self {
        Self::preset("Last 24 hours", 1, now_ns)
    }

    pub fn last_three_days(now_ns: u64) -> Self {
        Self::preset("Last 3 days", 3, now_ns)
    }

    pub fn last_week(now_ns: u64) -> Self {
        Self::preset("Last 7 days", 7, now_ns)
    }

    /// The selectable preset windows, narrowest first. `now_ns` is taken
    /// as a parameter so callers and tests control the clock.
    pub fn presets(now_ns: u64) -> Vec<TimeRange> {
        vec![
            Self::last_day(now_ns),
            Self::last_three_days(now_ns),
            Self::last_week(now_ns),
        ]
    }
}

/// One request to the audit service: window, category filter, cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventQuery {
    pub range: TimeRange,
    pub filter_by: String,
    /// Pagination cursor; `None` requests the first page.
    pub start_key: Option<String>,
    pub limit: usize,
}

impl EventQuery {
    /// First page of database events in a window.
    pub fn first_page(range: TimeRange, limit: usize) -> Self {
        Self {
            range,
            filter_by: FILTER_DATABASE.to_string(),
            start_key: None,
            limit,
        }
    }

    /// Continuation page resuming at `start_key`.
    pub fn next_page(range: TimeRange, start_key: String, limit: usize) -> Self {
        Self {
            range,
            filter_by: FILTER_DATABASE.to_string(),
            start_key: Some(start_key),
            limit,
        }
    }
}

/// One page of results from the audit service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPage {
    pub events: Vec<AuditEvent>,
    /// Cursor for the next page; empty means no further pages.
    #[serde(default)]
    pub start_key: String,
}

impl EventPage {
    pub fn is_last(&self) -> bool {
        self.start_key.is_empty()
    }
}
