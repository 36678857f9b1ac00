use thiserror::Error;

/// Errors raised while handing a sourcing request to the queue.
///
/// None of these are retried by the gateway itself.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The keyword was blank after trimming.
    #[error("keyword must not be blank")]
    EmptyKeyword,

    /// The HTTP backend was selected without an endpoint.
    #[error("queue endpoint is not configured")]
    MissingEndpoint,

    /// The configured endpoint could not be parsed as a URL.
    #[error("invalid queue endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The message envelope could not be encoded or decoded.
    #[error("queue message JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Network or TLS failure from the underlying HTTP client.
    #[error("queue transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The HTTP queue answered with a non-2xx status.
    #[error("queue rejected message with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Failure in the Postgres-backed queue table.
    #[error("queue database error: {0}")]
    Database(#[from] sqlx::Error),
}
