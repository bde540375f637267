use super::entity::EventCode;

/// The fixed set of event categories considered database-relevant.
///
/// Only events whose code appears here are ever retained by the event
/// feed. Membership is a compile-time constant, not configuration, so
/// filtering stays deterministic.
pub const DATABASE_EVENT_CODES: &[EventCode] = &[
    EventCode::DatabaseSessionQuery,
    EventCode::DatabaseSessionQueryFailure,
    EventCode::DatabaseSessionStarted,
    EventCode::DatabaseSessionStartedFailure,
    EventCode::DatabaseSessionEnded,
    EventCode::PostgresParse,
    EventCode::PostgresBind,
    EventCode::PostgresExecute,
    EventCode::PostgresClose,
    EventCode::PostgresFunctionCall,
    EventCode::MysqlStatementPrepare,
    EventCode::MysqlStatementExecute,
    EventCode::MysqlStatementSendLongData,
    EventCode::MysqlStatementClose,
    EventCode::MysqlStatementReset,
    EventCode::MysqlStatementFetch,
    EventCode::MysqlStatementBulkExecute,
    EventCode::MysqlInitDb,
    EventCode::MysqlCreateDb,
    EventCode::MysqlDropDb,
    EventCode::MysqlShutDown,
    EventCode::MysqlProcessKill,
    EventCode::MysqlDebug,
    EventCode::MysqlRefresh,
    EventCode::SqlserverRpcRequest,
    EventCode::CassandraBatchEvent,
    EventCode::CassandraPrepareEvent,
    EventCode::CassandraExecuteEvent,
    EventCode::CassandraRegisterEvent,
    EventCode::ElasticsearchRequest,
    EventCode::ElasticsearchRequestFailure,
    EventCode::OpensearchRequest,
    EventCode::OpensearchRequestFailure,
    EventCode::DynamodbRequest,
    EventCode::DynamodbRequestFailure,
    EventCode::SpannerRpc,
    EventCode::SpannerRpcDenied,
];

/// Whether a code belongs to the database allow-list.
pub fn is_database_event(code: &EventCode) -> bool {
    DATABASE_EVENT_CODES.contains(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_and_protocol_codes_are_allowed() {
        assert!(is_database_event(&EventCode::DatabaseSessionQuery));
        assert!(is_database_event(&EventCode::PostgresParse));
        assert!(is_database_event(&EventCode::MysqlRefresh));
        assert!(is_database_event(&EventCode::SpannerRpcDenied));
    }

    #[test]
    fn classifier_only_codes_are_not_allowed() {
        // These codes classify (icon, description) but never pass the
        // feed filter: the audit service delivers them on other views.
        assert!(!is_database_event(&EventCode::DatabaseSessionMalformedPacket));
        assert!(!is_database_event(&EventCode::DatabaseSessionPermissionsUpdate));
        assert!(!is_database_event(&EventCode::DatabaseSessionUserCreate));
    }

    #[test]
    fn unrecognized_codes_are_not_allowed() {
        let code = EventCode::Unrecognized("SSH_SESSION_STARTED".to_string());
        assert!(!is_database_event(&code));
    }

    #[test]
    fn allow_list_has_no_duplicates() {
        for (i, code) in DATABASE_EVENT_CODES.iter().enumerate() {
            assert!(
                !DATABASE_EVENT_CODES[i + 1..].contains(code),
                "duplicate allow-list entry: {code}"
            );
        }
    }
}
