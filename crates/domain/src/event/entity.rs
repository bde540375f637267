use serde::{Deserialize, Serialize};

/// Audit event category code as emitted by the audit service.
///
/// The known set covers database session lifecycle, query execution, and
/// the protocol-specific sub-events of each supported database engine.
/// Codes the server knows but this client does not are preserved in
/// `Unrecognized` so they survive a serialization round trip and degrade
/// to generic classification instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventCode {
    // Session lifecycle and generic query events
    DatabaseSessionQuery,              // TDB02I
    DatabaseSessionQueryFailure,       // TDB02W
    DatabaseSessionStarted,            // TDB00I
    DatabaseSessionStartedFailure,     // TDB00W
    DatabaseSessionEnded,              // TDB01I
    DatabaseSessionMalformedPacket,
    DatabaseSessionPermissionsUpdate,
    DatabaseSessionUserCreate,
    DatabaseSessionUserCreateFailure,
    DatabaseSessionUserDeactivate,
    DatabaseSessionUserDeactivateFailure,

    // PostgreSQL wire protocol
    PostgresParse,        // TPG00I
    PostgresBind,         // TPG01I
    PostgresExecute,      // TPG02I
    PostgresClose,        // TPG03I
    PostgresFunctionCall, // TPG04I

    // MySQL wire protocol
    MysqlStatementPrepare,      // TMY00I
    MysqlStatementExecute,      // TMY01I
    MysqlStatementSendLongData, // TMY02I
    MysqlStatementClose,        // TMY03I
    MysqlStatementReset,        // TMY04I
    MysqlStatementFetch,        // TMY05I
    MysqlStatementBulkExecute,  // TMY06I
    MysqlInitDb,                // TMY07I
    MysqlCreateDb,              // TMY08I
    MysqlDropDb,                // TMY09I
    MysqlShutDown,              // TMY10I
    MysqlProcessKill,           // TMY11I
    MysqlDebug,                 // TMY12I
    MysqlRefresh,               // TMY13I

    // Other engines
    SqlserverRpcRequest,          // TMS00I
    CassandraBatchEvent,          // TCA01I
    CassandraPrepareEvent,        // TCA02I
    CassandraExecuteEvent,        // TCA03I
    CassandraRegisterEvent,       // TCA04I
    ElasticsearchRequest,         // TES00I
    ElasticsearchRequestFailure,  // TES00E
    OpensearchRequest,            // TOS00I
    OpensearchRequestFailure,     // TOS00E
    DynamodbRequest,              // TDY01I
    DynamodbRequestFailure,       // TDY01E
    SpannerRpc,                   // TSPN001I
    SpannerRpcDenied,             // TSPN001W

    /// A code this client has no table entry for. Kept verbatim.
    Unrecognized(String),
}

impl EventCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::DatabaseSessionQuery => "DATABASE_SESSION_QUERY",
            Self::DatabaseSessionQueryFailure => "DATABASE_SESSION_QUERY_FAILURE",
            Self::DatabaseSessionStarted => "DATABASE_SESSION_STARTED",
            Self::DatabaseSessionStartedFailure => "DATABASE_SESSION_STARTED_FAILURE",
            Self::DatabaseSessionEnded => "DATABASE_SESSION_ENDED",
            Self::DatabaseSessionMalformedPacket => "DATABASE_SESSION_MALFORMED_PACKET",
            Self::DatabaseSessionPermissionsUpdate => "DATABASE_SESSION_PERMISSIONS_UPDATE",
            Self::DatabaseSessionUserCreate => "DATABASE_SESSION_USER_CREATE",
            Self::DatabaseSessionUserCreateFailure => "DATABASE_SESSION_USER_CREATE_FAILURE",
            Self::DatabaseSessionUserDeactivate => "DATABASE_SESSION_USER_DEACTIVATE",
            Self::DatabaseSessionUserDeactivateFailure => {
                "DATABASE_SESSION_USER_DEACTIVATE_FAILURE"
            }
            Self::PostgresParse => "POSTGRES_PARSE",
            Self::PostgresBind => "POSTGRES_BIND",
            Self::PostgresExecute => "POSTGRES_EXECUTE",
            Self::PostgresClose => "POSTGRES_CLOSE",
            Self::PostgresFunctionCall => "POSTGRES_FUNCTION_CALL",
            Self::MysqlStatementPrepare => "MYSQL_STATEMENT_PREPARE",
            Self::MysqlStatementExecute => "MYSQL_STATEMENT_EXECUTE",
            Self::MysqlStatementSendLongData => "MYSQL_STATEMENT_SEND_LONG_DATA",
            Self::MysqlStatementClose => "MYSQL_STATEMENT_CLOSE",
            Self::MysqlStatementReset => "MYSQL_STATEMENT_RESET",
            Self::MysqlStatementFetch => "MYSQL_STATEMENT_FETCH",
            Self::MysqlStatementBulkExecute => "MYSQL_STATEMENT_BULK_EXECUTE",
            Self::MysqlInitDb => "MYSQL_INIT_DB",
            Self::MysqlCreateDb => "MYSQL_CREATE_DB",
            Self::MysqlDropDb => "MYSQL_DROP_DB",
            Self::MysqlShutDown => "MYSQL_SHUT_DOWN",
            Self::MysqlProcessKill => "MYSQL_PROCESS_KILL",
            Self::MysqlDebug => "MYSQL_DEBUG",
            Self::MysqlRefresh => "MYSQL_REFRESH",
            Self::SqlserverRpcRequest => "SQLSERVER_RPC_REQUEST",
            Self::CassandraBatchEvent => "CASSANDRA_BATCH_EVENT",
            Self::CassandraPrepareEvent => "CASSANDRA_PREPARE_EVENT",
            Self::CassandraExecuteEvent => "CASSANDRA_EXECUTE_EVENT",
            Self::CassandraRegisterEvent => "CASSANDRA_REGISTER_EVENT",
            Self::ElasticsearchRequest => "ELASTICSEARCH_REQUEST",
            Self::ElasticsearchRequestFailure => "ELASTICSEARCH_REQUEST_FAILURE",
            Self::OpensearchRequest => "OPENSEARCH_REQUEST",
            Self::OpensearchRequestFailure => "OPENSEARCH_REQUEST_FAILURE",
            Self::DynamodbRequest => "DYNAMODB_REQUEST",
            Self::DynamodbRequestFailure => "DYNAMODB_REQUEST_FAILURE",
            Self::SpannerRpc => "SPANNER_RPC",
            Self::SpannerRpcDenied => "SPANNER_RPC_DENIED",
            Self::Unrecognized(code) => code,
        }
    }

    /// Parse a code name string. Unknown names are kept as `Unrecognized`.
    pub fn parse_name(s: &str) -> Self {
        match s {
            "DATABASE_SESSION_QUERY" => Self::DatabaseSessionQuery,
            "DATABASE_SESSION_QUERY_FAILURE" => Self::DatabaseSessionQueryFailure,
            "DATABASE_SESSION_STARTED" => Self::DatabaseSessionStarted,
            "DATABASE_SESSION_STARTED_FAILURE" => Self::DatabaseSessionStartedFailure,
            "DATABASE_SESSION_ENDED" => Self::DatabaseSessionEnded,
            "DATABASE_SESSION_MALFORMED_PACKET" => Self::DatabaseSessionMalformedPacket,
            "DATABASE_SESSION_PERMISSIONS_UPDATE" => Self::DatabaseSessionPermissionsUpdate,
            "DATABASE_SESSION_USER_CREATE" => Self::DatabaseSessionUserCreate,
            "DATABASE_SESSION_USER_CREATE_FAILURE" => Self::DatabaseSessionUserCreateFailure,
            "DATABASE_SESSION_USER_DEACTIVATE" => Self::DatabaseSessionUserDeactivate,
            "DATABASE_SESSION_USER_DEACTIVATE_FAILURE" => {
                Self::DatabaseSessionUserDeactivateFailure
            }
            "POSTGRES_PARSE" => Self::PostgresParse,
            "POSTGRES_BIND" => Self::PostgresBind,
            "POSTGRES_EXECUTE" => Self::PostgresExecute,
            "POSTGRES_CLOSE" => Self::PostgresClose,
            "POSTGRES_FUNCTION_CALL" => Self::PostgresFunctionCall,
            "MYSQL_STATEMENT_PREPARE" => Self::MysqlStatementPrepare,
            "MYSQL_STATEMENT_EXECUTE" => Self::MysqlStatementExecute,
            "MYSQL_STATEMENT_SEND_LONG_DATA" => Self::MysqlStatementSendLongData,
            "MYSQL_STATEMENT_CLOSE" => Self::MysqlStatementClose,
            "MYSQL_STATEMENT_RESET" => Self::MysqlStatementReset,
            "MYSQL_STATEMENT_FETCH" => Self::MysqlStatementFetch,
            "MYSQL_STATEMENT_BULK_EXECUTE" => Self::MysqlStatementBulkExecute,
            "MYSQL_INIT_DB" => Self::MysqlInitDb,
            "MYSQL_CREATE_DB" => Self::MysqlCreateDb,
            "MYSQL_DROP_DB" => Self::MysqlDropDb,
            "MYSQL_SHUT_DOWN" => Self::MysqlShutDown,
            "MYSQL_PROCESS_KILL" => Self::MysqlProcessKill,
            "MYSQL_DEBUG" => Self::MysqlDebug,
            "MYSQL_REFRESH" => Self::MysqlRefresh,
            "SQLSERVER_RPC_REQUEST" => Self::SqlserverRpcRequest,
            "CASSANDRA_BATCH_EVENT" => Self::CassandraBatchEvent,
            "CASSANDRA_PREPARE_EVENT" => Self::CassandraPrepareEvent,
            "CASSANDRA_EXECUTE_EVENT" => Self::CassandraExecuteEvent,
            "CASSANDRA_REGISTER_EVENT" => Self::CassandraRegisterEvent,
            "ELASTICSEARCH_REQUEST" => Self::ElasticsearchRequest,
            "ELASTICSEARCH_REQUEST_FAILURE" => Self::ElasticsearchRequestFailure,
            "OPENSEARCH_REQUEST" => Self::OpensearchRequest,
            "OPENSEARCH_REQUEST_FAILURE" => Self::OpensearchRequestFailure,
            "DYNAMODB_REQUEST" => Self::DynamodbRequest,
            "DYNAMODB_REQUEST_FAILURE" => Self::DynamodbRequestFailure,
            "SPANNER_RPC" => Self::SpannerRpc,
            "SPANNER_RPC_DENIED" => Self::SpannerRpcDenied,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for EventCode {
    fn from(s: String) -> Self {
        Self::parse_name(&s)
    }
}

impl From<EventCode> for String {
    fn from(code: EventCode) -> Self {
        code.as_str().to_string()
    }
}

impl std::fmt::Display for EventCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single immutable audit record describing one action taken against
/// a monitored database.
///
/// `raw` is the category-specific payload exactly as the audit service
/// returned it. Fields vary per code family (`db_service`, `db_user`,
/// `db_name`, `db_query`, ...); accessors return an explicit `None` for
/// absent fields rather than coercing, so "absent" and "present but
/// empty" stay distinguishable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,
    pub code: EventCode,
    /// Event time in nanoseconds since UNIX epoch.
    pub timestamp_ns: u64,
    /// The account that performed the action.
    pub user: String,
    #[serde(default)]
    pub raw: serde_json::Map<String, serde_json::Value>,
}

impl AuditEvent {
    /// Look up a string field in the raw payload.
    ///
    /// Returns `Some` for any present string value, including the empty
    /// string. Non-string values and missing keys return `None`.
    pub fn raw_str(&self, key: &str) -> Option<&str> {
        self.raw.get(key).and_then(serde_json::Value::as_str)
    }
}
