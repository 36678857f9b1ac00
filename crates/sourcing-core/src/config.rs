use crate::app_config::{AppConfig, Environment, QueueBackend};
use crate::ConfigError;

const DEFAULT_QUEUE_NAME: &str = "smart-sourcing-queue";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key), QueueEndpoint::Required)
}

/// Load configuration for operator tooling that may never touch the queue.
///
/// Same as [`load_app_config`], except that a missing `SOURCING_QUEUE_ENDPOINT`
/// is tolerated under the HTTP backend. A present endpoint is still validated;
/// building a gateway from the result fails if the endpoint is absent.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_operator_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key), QueueEndpoint::Optional)
}

/// Whether the HTTP queue backend must have an endpoint configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueueEndpoint {
    Required,
    Optional,
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(
    lookup: F,
    endpoint_rule: QueueEndpoint,
) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("SOURCING_ENV", "development"))?;

    let bind_addr = or_default("SOURCING_BIND_ADDR", "0.0.0.0:8080")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("SOURCING_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("SOURCING_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("SOURCING_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("SOURCING_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("SOURCING_DB_ACQUIRE_TIMEOUT_SECS", "10")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "SOURCING_DB_MIN_CONNECTIONS",
            format!("must not exceed SOURCING_DB_MAX_CONNECTIONS ({db_max_connections})"),
        ));
    }

    let queue_backend = parse_queue_backend(&or_default("SOURCING_QUEUE_BACKEND", "http"))?;
    let queue_endpoint = optional("SOURCING_QUEUE_ENDPOINT");
    match (&queue_backend, &queue_endpoint) {
        (QueueBackend::Http, None) if endpoint_rule == QueueEndpoint::Required => {
            return Err(ConfigError::MissingEnvVar(
                "SOURCING_QUEUE_ENDPOINT".to_string(),
            ));
        }
        (QueueBackend::Http, Some(endpoint))
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) =>
        {
            return Err(invalid(
                "SOURCING_QUEUE_ENDPOINT",
                format!("expected an absolute http(s) URL, got '{endpoint}'"),
            ));
        }
        _ => {}
    }

    let queue_name = optional("SOURCING_QUEUE_NAME").unwrap_or_else(|| DEFAULT_QUEUE_NAME.into());
    let queue_auth_token = optional("SOURCING_QUEUE_AUTH_TOKEN");
    let queue_timeout_secs = parse_u64("SOURCING_QUEUE_TIMEOUT_SECS", "10")?;
    if queue_timeout_secs == 0 {
        return Err(invalid(
            "SOURCING_QUEUE_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        queue_backend,
        queue_endpoint,
        queue_name,
        queue_auth_token,
        queue_timeout_secs,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SOURCING_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

fn parse_queue_backend(s: &str) -> Result<QueueBackend, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "http" => Ok(QueueBackend::Http),
        "postgres" | "pg" => Ok(QueueBackend::Postgres),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SOURCING_QUEUE_BACKEND".to_string(),
            reason: format!("expected http or postgres; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
