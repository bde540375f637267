use thiserror::Error;

/// Failure fetching a page from the audit service.
///
/// `Service` displays the service-reported message verbatim: the feed
/// surfaces it to the user unchanged.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{0}")]
    Service(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Decode(String),
}
