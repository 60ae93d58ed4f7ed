//! Outbound connectivity probing via HTTP/HTTPS
//!
//! This module provides the `ConnectivityProbe` capability and `HttpProbe`,
//! which checks reachability of a well-known external endpoint.

use crate::config::validate_http_url;
use crate::error::ConfigError;
use crate::portal::auth::describe_transport_error;
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Result of a connectivity probe
#[derive(Debug, Clone)]
pub struct ConnectivityResult {
    reachable: bool,
    duration: Duration,
    error: Option<String>,
}

impl ConnectivityResult {
    /// Create a reachable result
    pub fn reachable(duration: Duration) -> Self {
        Self {
            reachable: true,
            duration,
            error: None,
        }
    }

    /// Create an unreachable result
    pub fn unreachable(duration: Duration, error: String) -> Self {
        Self {
            reachable: false,
            duration,
            error: Some(error),
        }
    }

    /// Check if the endpoint answered
    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    /// Get the duration of the probe
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Get the error message if the probe failed
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Performs one reachability check
///
/// A single check is one data point; implementations must not retry.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn check(&self) -> ConnectivityResult;
}

/// Checks reachability with a plain GET request
#[derive(Debug)]
pub struct HttpProbe {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpProbe {
    /// Create a new probe
    ///
    /// # Arguments
    /// * `endpoint` - HTTP/HTTPS URL to check
    /// * `timeout` - Maximum duration to wait for a response
    #[tracing::instrument(skip(timeout), fields(endpoint = %endpoint, timeout_ms = timeout.as_millis()))]
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, ConfigError> {
        validate_http_url("monitor.probe_endpoint", &endpoint)?;

        let client = Client::builder()
            .timeout(timeout)
            .use_rustls_tls()
            .build()
            .map_err(|e| ConfigError::InvalidUrl {
                field: "monitor.probe_endpoint".to_string(),
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    /// Any HTTP response counts as reachable, whatever its status code.
    /// Timeouts, refused connections and DNS failures count as unreachable.
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn check(&self) -> ConnectivityResult {
        let start = Instant::now();

        match self.client.get(&self.endpoint).send().await {
            Ok(response) => {
                let duration = start.elapsed();
                debug!(
                    status = %response.status(),
                    duration_ms = duration.as_millis(),
                    "Connectivity probe succeeded"
                );
                ConnectivityResult::reachable(duration)
            }
            Err(e) => {
                let duration = start.elapsed();
                let error_msg = describe_transport_error(e, self.timeout);

                warn!(
                    error = %error_msg,
                    duration_ms = duration.as_millis(),
                    "Connectivity probe failed"
                );

                ConnectivityResult::unreachable(duration, error_msg)
            }
        }
    }
}
