use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use serde::Serialize;

use adapters::http::audit_api::HttpEventSource;
use application::event_feed_impl::{AttemptStatus, EventFeedService, FeedSnapshot, FetchState};
use domain::event::classify::EventDetails;
use domain::event::entity::AuditEvent;
use domain::event::query::TimeRange;

use crate::cli::OutputFormat;

const QUERY_SNIPPET_CHARS: usize = 80;

/// Wire an event feed to the audit service at `addr`.
pub fn build_feed(
    addr: &str,
    token: Option<String>,
    timeout_secs: u64,
    page_limit: usize,
) -> Result<EventFeedService> {
    let source = HttpEventSource::with_timeout(addr, token, Duration::from_secs(timeout_secs))?;
    Ok(EventFeedService::new(Arc::new(source)).with_page_limit(page_limit))
}

/// Fetch and print the first page of the window.
pub async fn cmd_events_list(
    feed: &EventFeedService,
    cluster: &str,
    range: TimeRange,
    output: OutputFormat,
) -> Result<()> {
    feed.bind(cluster, range).await;

    let snapshot = feed.snapshot();
    fail_on_error(&snapshot)?;
    print_events(&snapshot, output)?;

    if output == OutputFormat::Table && snapshot.fetch == FetchState::Ready {
        println!("\nMore events in this window; use `events dump` to page through all of them.");
    }
    Ok(())
}

/// Page through the whole window, then print everything.
pub async fn cmd_events_dump(
    feed: &EventFeedService,
    cluster: &str,
    range: TimeRange,
    output: OutputFormat,
) -> Result<()> {
    feed.bind(cluster, range).await;
    while feed.snapshot().fetch == FetchState::Ready {
        feed.fetch_more().await;
    }

    let snapshot = feed.snapshot();
    fail_on_error(&snapshot)?;
    print_events(&snapshot, output)
}

fn fail_on_error(snapshot: &FeedSnapshot) -> Result<()> {
    let attempt = snapshot.attempt();
    if attempt.status == AttemptStatus::Failed {
        bail!(
            "fetching audit events failed: {}",
            attempt.status_text.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct ClassifiedEventRow<'a> {
    id: &'a str,
    timestamp_ns: u64,
    code: &'a str,
    #[serde(flatten)]
    details: EventDetails,
}

impl<'a> ClassifiedEventRow<'a> {
    fn new(event: &'a AuditEvent) -> Self {
        Self {
            id: &event.id,
            timestamp_ns: event.timestamp_ns,
            code: event.code.as_str(),
            details: EventDetails::from_event(event),
        }
    }
}

fn print_events(snapshot: &FeedSnapshot, output: OutputFormat) -> Result<()> {
    if output == OutputFormat::Json {
        let rows: Vec<ClassifiedEventRow<'_>> =
            snapshot.events.iter().map(ClassifiedEventRow::new).collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if snapshot.events.is_empty() {
        println!("No database events in this window.");
        return Ok(());
    }

    println!(
        "{:<20} {:<10}  {:<3}  {}",
        "TIMESTAMP (ns)", "CATEGORY", "OK", "DESCRIPTION"
    );
    for event in &snapshot.events {
        let details = EventDetails::from_event(event);
        println!(
            "{:<20} {:<10}  {:<3}  {}",
            event.timestamp_ns,
            details.icon.as_str(),
            if details.success { "yes" } else { "no" },
            details.description,
        );
        if let Some(query) = details.query
            && !query.is_empty()
        {
            println!("{:<37}query: {}", "", snippet(&query, QUERY_SNIPPET_CHARS));
        }
    }

    println!("\n{} event(s) in {}.", snapshot.events.len(), range_label(snapshot));
    Ok(())
}

fn range_label(snapshot: &FeedSnapshot) -> String {
    match &snapshot.range.name {
        Some(name) => name.to_lowercase(),
        None => format!(
            "window {}..{}",
            snapshot.range.from_ns, snapshot.range.to_ns
        ),
    }
}

/// First `max` characters, with an ellipsis when shortened.
fn snippet(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::event::entity::EventCode;

    #[test]
    fn snippet_respects_char_boundaries() {
        assert_eq!(snippet("short", 10), "short");
        assert_eq!(snippet("sélect * from ünïcode", 6), "sélect…");
    }

    #[test]
    fn classified_row_serializes_flat() {
        let mut raw = serde_json::Map::new();
        raw.insert(
            "db_service".to_string(),
            serde_json::Value::String("orders-pg".to_string()),
        );
        let event = AuditEvent {
            id: "evt-1".to_string(),
            code: EventCode::DatabaseSessionQuery,
            timestamp_ns: 42,
            user: "alice".to_string(),
            raw,
        };

        let json = serde_json::to_value(ClassifiedEventRow::new(&event)).unwrap();
        assert_eq!(json["id"], "evt-1");
        assert_eq!(json["code"], "DATABASE_SESSION_QUERY");
        assert_eq!(json["icon"], "query");
        assert_eq!(json["service"], "orders-pg");
        assert_eq!(json["success"], true);
    }
}
