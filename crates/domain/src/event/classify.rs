use serde::{Deserialize, Serialize};

use super::entity::{AuditEvent, EventCode};

/// Placeholder rendered when a raw payload field is missing.
pub const UNKNOWN_FIELD: &str = "Unknown";

/// Raw payload keys that may carry the statement text.
const QUERY_KEYS: [&str; 2] = ["db_query", "query"];

/// Codes whose payload typically contains the statement text.
pub const QUERY_EVENT_CODES: &[EventCode] = &[
    EventCode::DatabaseSessionQuery,
    EventCode::DatabaseSessionQueryFailure,
    EventCode::PostgresParse,
    EventCode::MysqlStatementPrepare,
    EventCode::CassandraPrepareEvent,
    EventCode::ElasticsearchRequest,
    EventCode::OpensearchRequest,
    EventCode::DynamodbRequest,
];

/// Codes that represent an explicitly failed or denied operation.
pub const FAILURE_EVENT_CODES: &[EventCode] = &[
    EventCode::DatabaseSessionStartedFailure,
    EventCode::DatabaseSessionQueryFailure,
    EventCode::DatabaseSessionUserCreateFailure,
    EventCode::DatabaseSessionUserDeactivateFailure,
    EventCode::ElasticsearchRequestFailure,
    EventCode::OpensearchRequestFailure,
    EventCode::DynamodbRequestFailure,
    EventCode::SpannerRpcDenied,
];

/// Display category a code maps to. The presentation layer picks the
/// actual glyph; the core only decides which bucket applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconCategory {
    Query,
    Lifecycle,
    Failure,
    Warning,
    Generic,
}

impl IconCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Lifecycle => "lifecycle",
            Self::Failure => "failure",
            Self::Warning => "warning",
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for IconCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a code to its display category. Total: codes outside the table,
/// including `Unrecognized`, map to `Generic`.
pub fn icon_category(code: &EventCode) -> IconCategory {
    match code {
        EventCode::DatabaseSessionQuery
        | EventCode::PostgresExecute
        | EventCode::MysqlStatementExecute
        | EventCode::CassandraExecuteEvent
        | EventCode::ElasticsearchRequest
        | EventCode::OpensearchRequest
        | EventCode::DynamodbRequest
        | EventCode::SpannerRpc => IconCategory::Query,

        EventCode::DatabaseSessionStarted | EventCode::DatabaseSessionEnded => {
            IconCategory::Lifecycle
        }

        EventCode::DatabaseSessionStartedFailure
        | EventCode::DatabaseSessionQueryFailure
        | EventCode::ElasticsearchRequestFailure
        | EventCode::OpensearchRequestFailure
        | EventCode::DynamodbRequestFailure
        | EventCode::SpannerRpcDenied => IconCategory::Failure,

        EventCode::DatabaseSessionMalformedPacket
        | EventCode::DatabaseSessionUserCreateFailure
        | EventCode::DatabaseSessionUserDeactivateFailure => IconCategory::Warning,

        _ => IconCategory::Generic,
    }
}

/// Build a human-readable sentence for an event.
///
/// Total: missing payload fields render as [`UNKNOWN_FIELD`] and codes
/// without a template fall back to a generic sentence naming the service.
pub fn describe(event: &AuditEvent) -> String {
    let user = &event.user;
    let service = event.raw_str("db_service").unwrap_or(UNKNOWN_FIELD);
    let db_user = event.raw_str("db_user").unwrap_or(UNKNOWN_FIELD);

    match &event.code {
        EventCode::DatabaseSessionQuery => {
            format!("Database query executed by {user} on {service}")
        }
        EventCode::DatabaseSessionQueryFailure => {
            format!("Database query failed for {user} on {service}")
        }
        EventCode::DatabaseSessionStarted => {
            format!("Database session started by {user} on {service}")
        }
        EventCode::DatabaseSessionStartedFailure => {
            format!("Database session start failed for {user} on {service}")
        }
        EventCode::DatabaseSessionEnded => {
            format!("Database session ended by {user} on {service}")
        }
        EventCode::DatabaseSessionMalformedPacket => {
            format!("Malformed database packet detected on {service}")
        }
        EventCode::DatabaseSessionPermissionsUpdate => {
            format!("Database permissions updated for {user} on {service}")
        }
        EventCode::DatabaseSessionUserCreate => {
            format!("Database user created: {db_user}")
        }
        EventCode::DatabaseSessionUserCreateFailure => {
            format!("Failed to create database user: {db_user}")
        }
        EventCode::DatabaseSessionUserDeactivate => {
            format!("Database user deactivated: {db_user}")
        }
        EventCode::DatabaseSessionUserDeactivateFailure => {
            format!("Failed to deactivate database user: {db_user}")
        }
        EventCode::PostgresParse => format!("PostgreSQL query parsed on {service}"),
        EventCode::PostgresBind => format!("PostgreSQL query bound on {service}"),
        EventCode::PostgresExecute => format!("PostgreSQL query executed on {service}"),
        EventCode::PostgresClose => format!("PostgreSQL statement closed on {service}"),
        EventCode::PostgresFunctionCall => format!("PostgreSQL function called on {service}"),
        EventCode::MysqlStatementPrepare => format!("MySQL statement prepared on {service}"),
        EventCode::MysqlStatementExecute => format!("MySQL statement executed on {service}"),
        EventCode::MysqlStatementSendLongData => format!("MySQL long data sent on {service}"),
        EventCode::MysqlStatementClose => format!("MySQL statement closed on {service}"),
        EventCode::MysqlStatementReset => format!("MySQL statement reset on {service}"),
        EventCode::MysqlStatementFetch => format!("MySQL statement fetched on {service}"),
        EventCode::MysqlStatementBulkExecute => {
            format!("MySQL bulk statement executed on {service}")
        }
        EventCode::MysqlInitDb => format!("MySQL database initialized on {service}"),
        EventCode::MysqlCreateDb => format!("MySQL database created on {service}"),
        EventCode::MysqlDropDb => format!("MySQL database dropped on {service}"),
        EventCode::MysqlShutDown => format!("MySQL shutdown initiated on {service}"),
        EventCode::MysqlProcessKill => format!("MySQL process killed on {service}"),
        EventCode::MysqlDebug => format!("MySQL debug command executed on {service}"),
        EventCode::MysqlRefresh => format!("MySQL refresh command executed on {service}"),
        EventCode::SqlserverRpcRequest => format!("SQL Server RPC request on {service}"),
        EventCode::CassandraBatchEvent => format!("Cassandra batch operation on {service}"),
        EventCode::CassandraPrepareEvent => format!("Cassandra query prepared on {service}"),
        EventCode::CassandraExecuteEvent => format!("Cassandra query executed on {service}"),
        EventCode::CassandraRegisterEvent => format!("Cassandra query registered on {service}"),
        EventCode::ElasticsearchRequest => format!("Elasticsearch request on {service}"),
        EventCode::ElasticsearchRequestFailure => {
            format!("Elasticsearch request failed on {service}")
        }
        EventCode::OpensearchRequest => format!("OpenSearch request on {service}"),
        EventCode::OpensearchRequestFailure => format!("OpenSearch request failed on {service}"),
        EventCode::DynamodbRequest => format!("DynamoDB request on {service}"),
        EventCode::DynamodbRequestFailure => format!("DynamoDB request failed on {service}"),
        EventCode::SpannerRpc => format!("Cloud Spanner RPC on {service}"),
        EventCode::SpannerRpcDenied => format!("Cloud Spanner RPC denied on {service}"),
        _ => format!("Database event on {service}"),
    }
}

/// Whether the event carries (or is expected to carry) statement text.
pub fn is_query_event(event: &AuditEvent) -> bool {
    QUERY_EVENT_CODES.contains(&event.code) || query_text(event).is_some()
}

/// The statement text, if any payload field carries it.
///
/// Checks the known keys in order and returns the first *present* value;
/// an empty string is still "present".
pub fn query_text(event: &AuditEvent) -> Option<&str> {
    QUERY_KEYS.iter().find_map(|key| event.raw_str(key))
}

/// Whether the event represents a successful operation. Every code not
/// in the explicit failure set counts as successful, unknown codes
/// included.
pub fn is_successful(event: &AuditEvent) -> bool {
    !FAILURE_EVENT_CODES.contains(&event.code)
}

/// The fields a detail view needs, shaped from one event.
///
/// Pure data shaping: placeholders are substituted for missing fields,
/// nothing is formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDetails {
    pub description: String,
    pub icon: IconCategory,
    pub service: String,
    pub db_user: String,
    pub db_name: String,
    pub session_user: String,
    pub query: Option<String>,
    pub success: bool,
}

impl EventDetails {
    pub fn from_event(event: &AuditEvent) -> Self {
        Self {
            description: describe(event),
            icon: icon_category(&event.code),
            service: event
                .raw_str("db_service")
                .unwrap_or(UNKNOWN_FIELD)
                .to_string(),
            // Some protocols report the database account under `username`.
            db_user: event
                .raw_str("db_user")
                .or_else(|| event.raw_str("username"))
                .unwrap_or(UNKNOWN_FIELD)
                .to_string(),
            db_name: event
                .raw_str("db_name")
                .unwrap_or(UNKNOWN_FIELD)
                .to_string(),
            session_user: event.raw_str("user").unwrap_or(UNKNOWN_FIELD).to_string(),
            query: query_text(event).map(str::to_string),
            success: is_successful(event),
        }
    }
}
