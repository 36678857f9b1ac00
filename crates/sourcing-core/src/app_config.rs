use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which transport the queue gateway submits sourcing requests to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueBackend {
    /// POST the message envelope to an HTTP queue endpoint.
    Http,
    /// Append the message to the `sourcing_queue` outbox table.
    Postgres,
}

impl std::fmt::Display for QueueBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueBackend::Http => write!(f, "http"),
            QueueBackend::Postgres => write!(f, "postgres"),
        }
    }
}

/// Process-wide settings, read once at startup and immutable afterwards.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub queue_backend: QueueBackend,
    /// Required for [`QueueBackend::Http`], ignored otherwise.
    pub queue_endpoint: Option<String>,
    pub queue_name: String,
    pub queue_auth_token: Option<String>,
    pub queue_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("queue_backend", &self.queue_backend)
            .field("queue_endpoint", &self.queue_endpoint)
            .field("queue_name", &self.queue_name)
            .field(
                "queue_auth_token",
                &self.queue_auth_token.as_ref().map(|_| "[redacted]"),
            )
            .field("queue_timeout_secs", &self.queue_timeout_secs)
            .finish()
    }
}
