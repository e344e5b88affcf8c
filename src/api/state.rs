//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::query::QueryService;
use crate::retention::RetentionPolicy;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Read-side facade over the segment store
    pub query: Arc<QueryService>,
    /// Promotion engine for keep requests
    pub policy: Arc<RetentionPolicy>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(query: Arc<QueryService>, policy: Arc<RetentionPolicy>, config: ApiConfig) -> Self {
        Self {
            query,
            policy,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8350,
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr_format() {
        let config = ApiConfig::new("0.0.0.0", 9000);
        assert_eq!(config.addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_default_binds_loopback() {
        let config = ApiConfig::default();
        assert_eq!(config.addr(), "127.0.0.1:8350");
    }
}
