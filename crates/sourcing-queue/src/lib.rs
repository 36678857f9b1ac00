//! Queue gateway: hands sourcing requests to the external research worker.
//!
//! The gateway serialises `{"keyword": ...}` and submits it to one configured
//! queue. Delivery to the worker is asynchronous and at-least-once; `enqueue`
//! returns as soon as the queue has accepted the message. Failures are
//! reported, never retried here.

mod error;
mod http;
mod message;
mod postgres;

use sourcing_core::{AppConfig, QueueBackend};
use sqlx::PgPool;

pub use error::QueueError;
pub use http::HttpQueue;
pub use message::QueueMessage;
pub use postgres::{ClaimedMessage, PgQueue};

/// The configured queue transport. Built once at startup.
#[derive(Debug, Clone)]
pub enum QueueGateway {
    Http(HttpQueue),
    Postgres(PgQueue),
}

impl QueueGateway {
    /// Builds the gateway selected by `config.queue_backend`.
    ///
    /// `pool` backs the Postgres transport and is ignored for HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::MissingEndpoint`] if the HTTP backend has no
    /// endpoint, or any error from [`HttpQueue::new`].
    pub fn from_config(config: &AppConfig, pool: &PgPool) -> Result<Self, QueueError> {
        match config.queue_backend {
            QueueBackend::Http => {
                let endpoint = config
                    .queue_endpoint
                    .as_deref()
                    .ok_or(QueueError::MissingEndpoint)?;
                let queue = HttpQueue::new(
                    endpoint,
                    config.queue_auth_token.as_deref(),
                    config.queue_timeout_secs,
                )?;
                Ok(Self::Http(queue))
            }
            QueueBackend::Postgres => Ok(Self::Postgres(PgQueue::new(
                pool.clone(),
                config.queue_name.clone(),
            ))),
        }
    }

    #[must_use]
    pub fn backend(&self) -> QueueBackend {
        match self {
            Self::Http(_) => QueueBackend::Http,
            Self::Postgres(_) => QueueBackend::Postgres,
        }
    }

    /// Submits one `{"keyword": keyword}` message.
    ///
    /// Callers are expected to trim the keyword first; it is sent as given.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::EmptyKeyword`] for a blank keyword, otherwise any
    /// transport or serialisation error from the selected backend.
    pub async fn enqueue(&self, keyword: &str) -> Result<(), QueueError> {
        if keyword.trim().is_empty() {
            return Err(QueueError::EmptyKeyword);
        }

        let message = QueueMessage::new(keyword);
        tracing::info!(keyword, backend = %self.backend(), "sending sourcing request to queue");

        let result = match self {
            Self::Http(queue) => queue.send(&message).await,
            Self::Postgres(queue) => queue.send(&message).await.map(|id| {
                tracing::debug!(message_id = id, queue = queue.queue_name(), "queued row");
            }),
        };

        match &result {
            Ok(()) => tracing::info!(keyword, "sourcing request queued"),
            Err(e) => tracing::error!(keyword, error = %e, "failed to queue sourcing request"),
        }
        result
    }
}
