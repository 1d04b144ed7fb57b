//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: PostgreSQL URL; when unset, in-memory backends are used
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `ORDER_EVENTS_QUEUE`: queue receiving published events (default: `"order-events"`)
/// - `PAYMENT_QUEUE`: queue carrying payment status updates (default: `"payment-status"`)
/// - `QUEUE_WAIT_SECS`: long-poll wait per receive (default: `10`)
/// - `QUEUE_BATCH_SIZE`: messages claimed per receive (default: `10`)
/// - `REQUEST_TIMEOUT_SECS`: HTTP request and message handling timeout (default: `30`)
/// - `MEMORY_QUEUE_CAPACITY`: messages kept per in-memory queue (default: `10000`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub order_events_queue: String,
    pub payment_queue: String,
    pub queue_wait: Duration,
    pub queue_batch_size: usize,
    pub request_timeout: Duration,
    pub memory_queue_capacity: usize,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// Unparseable numbers fall back to their defaults; an empty
    /// `DATABASE_URL` counts as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.log_format),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            database_max_connections: number("DATABASE_MAX_CONNECTIONS")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.database_max_connections),
            order_events_queue: lookup("ORDER_EVENTS_QUEUE").unwrap_or(defaults.order_events_queue),
            payment_queue: lookup("PAYMENT_QUEUE").unwrap_or(defaults.payment_queue),
            queue_wait: number("QUEUE_WAIT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.queue_wait),
            queue_batch_size: number("QUEUE_BATCH_SIZE")
                .and_then(|n| usize::try_from(n).ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.queue_batch_size),
            request_timeout: number("REQUEST_TIMEOUT_SECS")
                .filter(|n| *n > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            memory_queue_capacity: number("MEMORY_QUEUE_CAPACITY")
                .and_then(|n| usize::try_from(n).ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.memory_queue_capacity),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            database_max_connections: 5,
            order_events_queue: "order-events".to_string(),
            payment_queue: "payment-status".to_string(),
            queue_wait: Duration::from_secs(10),
            queue_batch_size: 10,
            request_timeout: Duration::from_secs(30),
            memory_queue_capacity: messaging::DEFAULT_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.database_url.is_none());
        assert_eq!(config.order_events_queue, "order-events");
        assert_eq!(config.payment_queue, "payment-status");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_empty_lookup_matches_defaults() {
        let config = Config::from_lookup(|_| None);
        let defaults = Config::default();
        assert_eq!(config.addr(), defaults.addr());
        assert_eq!(config.queue_wait, defaults.queue_wait);
        assert_eq!(config.queue_batch_size, defaults.queue_batch_size);
        assert_eq!(
            config.database_max_connections,
            defaults.database_max_connections
        );
    }

    #[test]
    fn test_values_are_read() {
        let config = Config::from_lookup(lookup_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("LOG_FORMAT", "JSON"),
            ("DATABASE_URL", "postgres://localhost/orders"),
            ("DATABASE_MAX_CONNECTIONS", "20"),
            ("PAYMENT_QUEUE", "pagamentos"),
            ("QUEUE_WAIT_SECS", "2"),
            ("QUEUE_BATCH_SIZE", "5"),
            ("REQUEST_TIMEOUT_SECS", "3"),
            ("MEMORY_QUEUE_CAPACITY", "500"),
        ]));

        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/orders")
        );
        assert_eq!(config.database_max_connections, 20);
        assert_eq!(config.payment_queue, "pagamentos");
        assert_eq!(config.queue_wait, Duration::from_secs(2));
        assert_eq!(config.queue_batch_size, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.memory_queue_capacity, 500);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "http"),
            ("DATABASE_URL", "  "),
            ("QUEUE_BATCH_SIZE", "0"),
            ("REQUEST_TIMEOUT_SECS", "-1"),
            ("LOG_FORMAT", "yaml"),
        ]));

        assert_eq!(config.port, 3000);
        assert!(config.database_url.is_none());
        assert_eq!(config.queue_batch_size, 10);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }
}
