#![no_main]

use libfuzzer_sys::fuzz_target;

use domain::event::allowlist::is_database_event;
use domain::event::classify::{
    EventDetails, describe, icon_category, is_query_event, is_successful, query_text,
};
use domain::event::entity::{AuditEvent, EventCode};

// Fuzz the classifier: every function must be total over arbitrary
// code strings and payload bags — no panic, no error.
//
// Layout:
//   [0]    = payload shape selector
//   [1..n] = split into code name / user / field values
fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let selector = data[0];
    let split = 1 + (data[1] as usize % (data.len() - 2));
    let code_name = String::from_utf8_lossy(&data[2..=split]).into_owned();
    let field_value = String::from_utf8_lossy(&data[split..]).into_owned();

    let code = EventCode::parse_name(&code_name);
    // Parsing must round-trip whatever it produced.
    assert_eq!(EventCode::parse_name(code.as_str()), code);

    let mut raw = serde_json::Map::new();
    if selector & 1 != 0 {
        raw.insert(
            "db_service".to_string(),
            serde_json::Value::String(field_value.clone()),
        );
    }
    if selector & 2 != 0 {
        raw.insert(
            "db_query".to_string(),
            serde_json::Value::String(field_value.clone()),
        );
    }
    if selector & 4 != 0 {
        raw.insert("query".to_string(), serde_json::Value::Null);
    }
    if selector & 8 != 0 {
        raw.insert(
            "db_user".to_string(),
            serde_json::json!({"nested": field_value}),
        );
    }

    let event = AuditEvent {
        id: "fuzz".to_string(),
        code,
        timestamp_ns: u64::from(selector),
        user: field_value,
        raw,
    };

    let _ = is_database_event(&event.code);
    let _ = icon_category(&event.code);
    let description = describe(&event);
    assert!(!description.is_empty());
    let _ = is_successful(&event);

    // A query event reported by payload must yield query text.
    if query_text(&event).is_some() {
        assert!(is_query_event(&event));
    }

    let _ = EventDetails::from_event(&event);
});
