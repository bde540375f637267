use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;

use domain::event::entity::{AuditEvent, EventCode};
use domain::event::error::SourceError;
use domain::event::query::{EventPage, EventQuery};
use ports::secondary::event_source::EventSource;

/// Default request timeout for audit service calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP implementation of the [`EventSource`] port against the audit
/// service REST API.
///
/// Query parameters carry the window, category filter, and pagination
/// cursor; the response body is `{ "events": [...], "start_key": "..." }`.
/// Service-reported failures are decoded from the error envelope so the
/// message reaches the feed verbatim.
pub struct HttpEventSource {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

// ── Wire DTOs ──────────────────────────────────────────────────────

#[derive(Deserialize)]
struct EventPageDto {
    #[serde(default)]
    events: Vec<EventDto>,
    #[serde(default)]
    start_key: String,
}

#[derive(Deserialize)]
struct EventDto {
    id: String,
    code: String,
    #[serde(default)]
    timestamp_ns: u64,
    #[serde(default)]
    user: String,
    #[serde(default)]
    raw: serde_json::Map<String, serde_json::Value>,
}

impl From<EventDto> for AuditEvent {
    fn from(dto: EventDto) -> Self {
        Self {
            id: dto.id,
            code: EventCode::parse_name(&dto.code),
            timestamp_ns: dto.timestamp_ns,
            user: dto.user,
            raw: dto.raw,
        }
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl HttpEventSource {
    /// Create a source for the audit service at `base_url`, with an
    /// optional bearer token and the default request timeout.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, SourceError> {
        Self::with_timeout(base_url, token, REQUEST_TIMEOUT)
    }

    /// Create with an explicit request timeout.
    pub fn with_timeout(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dbaudit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Transport(format!("HTTP client init failed: {e}")))?;
        Ok(Self::with_client(client, base_url, token))
    }

    /// Create with a custom reqwest client (for testing or advanced config).
    pub fn with_client(client: reqwest::Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn do_fetch(
        &self,
        cluster_id: &str,
        query: &EventQuery,
    ) -> Result<EventPage, SourceError> {
        let url = format!("{}/v1/clusters/{cluster_id}/events", self.base_url);

        let mut request = self.client.get(&url).query(&[
            ("from_ns", query.range.from_ns.to_string()),
            ("to_ns", query.range.to_ns.to_string()),
            ("filter", query.filter_by.clone()),
            ("limit", query.limit.to_string()),
        ]);
        if let Some(ref key) = query.start_key
            && !key.is_empty()
        {
            request = request.query(&[("start_key", key.as_str())]);
        }
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(&self.base_url, &e))?;

        if !response.status().is_success() {
            let status = response.status();
            if let Ok(body) = response.json::<ApiErrorBody>().await {
                return Err(SourceError::Service(body.error.message));
            }
            return Err(SourceError::Service(format!(
                "audit service returned HTTP {status}"
            )));
        }

        let page = response
            .json::<EventPageDto>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        Ok(EventPage {
            events: page.events.into_iter().map(AuditEvent::from).collect(),
            start_key: page.start_key,
        })
    }
}

impl EventSource for HttpEventSource {
    fn fetch_events<'a>(
        &'a self,
        cluster_id: &'a str,
        query: &'a EventQuery,
    ) -> Pin<Box<dyn Future<Output = Result<EventPage, SourceError>> + Send + 'a>> {
        Box::pin(self.do_fetch(cluster_id, query))
    }
}

fn transport_error(base_url: &str, err: &reqwest::Error) -> SourceError {
    if err.is_connect() {
        SourceError::Transport(format!(
            "cannot connect to audit service at {base_url} — is it reachable?"
        ))
    } else if err.is_timeout() {
        SourceError::Transport(format!("request to audit service at {base_url} timed out"))
    } else {
        SourceError::Transport(format!("audit service request failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_event_source_is_send_sync() {
        fn _assert<T: Send + Sync>() {}
        _assert::<HttpEventSource>();
    }

    #[test]
    fn http_event_source_implements_event_source() {
        fn _assert<T: EventSource>() {}
        _assert::<HttpEventSource>();
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let source =
            HttpEventSource::with_client(reqwest::Client::new(), "https://proxy.example:3080/", None);
        assert_eq!(source.base_url, "https://proxy.example:3080");
    }

    #[test]
    fn page_dto_maps_to_domain_events() {
        let json = r#"{
            "events": [
                {
                    "id": "evt-1",
                    "code": "DATABASE_SESSION_STARTED",
                    "timestamp_ns": 1700000000000000000,
                    "user": "alice",
                    "raw": {"db_service": "orders-pg"}
                },
                {
                    "id": "evt-2",
                    "code": "SOMETHING_NEW",
                    "user": "bob"
                }
            ],
            "start_key": "k1"
        }"#;

        let dto: EventPageDto = serde_json::from_str(json).unwrap();
        let events: Vec<AuditEvent> = dto.events.into_iter().map(AuditEvent::from).collect();

        assert_eq!(events[0].code, EventCode::DatabaseSessionStarted);
        assert_eq!(events[0].raw_str("db_service"), Some("orders-pg"));
        // Unknown codes survive mapping instead of failing the page.
        assert_eq!(
            events[1].code,
            EventCode::Unrecognized("SOMETHING_NEW".to_string())
        );
        assert_eq!(events[1].timestamp_ns, 0);
        assert!(events[1].raw.is_empty());
        assert_eq!(dto.start_key, "k1");
    }

    #[test]
    fn missing_start_key_defaults_to_exhausted() {
        let dto: EventPageDto = serde_json::from_str(r#"{"events": []}"#).unwrap();
        assert!(dto.start_key.is_empty());
    }

    #[test]
    fn error_envelope_exposes_the_message() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"error": {"message": "cluster not found"}}"#).unwrap();
        assert_eq!(body.error.message, "cluster not found");
    }
}
