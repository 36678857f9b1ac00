//! HTTP queue transport.
//!
//! POSTs each message envelope as a JSON body to a single configured endpoint.
//! Any 2xx response means the queue has accepted the message.

use std::time::Duration;

use reqwest::{header::CONTENT_TYPE, Client, Url};

use crate::{QueueError, QueueMessage};

/// Longest response body kept in [`QueueError::Rejected`].
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, Clone)]
pub struct HttpQueue {
    client: Client,
    endpoint: Url,
    auth_token: Option<String>,
}

impl HttpQueue {
    /// Creates a client bound to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidEndpoint`] if `endpoint` is not an absolute
    /// http(s) URL, or [`QueueError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        endpoint: &str,
        auth_token: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, QueueError> {
        let parsed = Url::parse(endpoint).map_err(|e| QueueError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(QueueError::InvalidEndpoint {
                endpoint: endpoint.to_owned(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent("sourcing/0.1 (queue-gateway)")
            .build()?;

        Ok(Self {
            client,
            endpoint: parsed,
            auth_token: auth_token.map(ToOwned::to_owned),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Submits one message. Returns once the queue has acknowledged receipt.
    ///
    /// # Errors
    ///
    /// - [`QueueError::Http`] on network failure or timeout.
    /// - [`QueueError::Rejected`] if the queue answers with a non-2xx status.
    pub async fn send(&self, message: &QueueMessage) -> Result<(), QueueError> {
        let body = message.to_json()?;

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueueError::Rejected {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        Ok(())
    }
}
