use sourcing_queue::QueueGateway;

use crate::ServiceError;

/// Acknowledgement that a keyword was handed to the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    /// The trimmed keyword that was enqueued.
    pub keyword: String,
}

/// Validates inbound keyword requests and forwards them to the queue.
#[derive(Debug, Clone)]
pub struct SourcingOrchestrator {
    gateway: QueueGateway,
}

impl SourcingOrchestrator {
    #[must_use]
    pub fn new(gateway: QueueGateway) -> Self {
        Self { gateway }
    }

    /// Dispatch a keyword for analysis without waiting for the worker.
    ///
    /// Identical keywords are not deduplicated; each call enqueues one message.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Validation`] if the keyword is missing or blank.
    /// - [`ServiceError::Queue`] if the queue does not accept the message.
    pub async fn request_sourcing(&self, keyword: Option<&str>) -> Result<Accepted, ServiceError> {
        let keyword = sourcing_core::validate_keyword(keyword).inspect_err(|e| {
            tracing::debug!(error = %e, "rejected sourcing request");
        })?;

        self.gateway.enqueue(keyword).await?;

        Ok(Accepted {
            keyword: keyword.to_owned(),
        })
    }
}
